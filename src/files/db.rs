//! Database operations for shared file records.

use rusqlite::{Connection, Row};

use crate::{
    Error,
    database_id::DatabaseId,
    files::models::{FileRecord, NewFileRecord},
};

/// Create the file_record table.
pub fn create_file_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE file_record (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            category TEXT NOT NULL,
            file_name TEXT NOT NULL UNIQUE,
            uploaded_at TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

/// Insert a validated file record into the database.
pub fn create_file_record(
    record: NewFileRecord,
    connection: &Connection,
) -> Result<FileRecord, Error> {
    let record = connection
        .prepare(
            "INSERT INTO file_record (title, category, file_name, uploaded_at)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING id, title, category, file_name, uploaded_at",
        )?
        .query_row(
            (
                &record.title,
                &record.category,
                &record.file_name,
                record.uploaded_at,
            ),
            map_file_row,
        )?;

    Ok(record)
}

/// Retrieve a file record by its `id`.
///
/// # Errors
/// Returns an [Error::NotFound] if `id` does not refer to a file record.
pub fn get_file_by_id(id: DatabaseId, connection: &Connection) -> Result<FileRecord, Error> {
    connection
        .prepare(
            "SELECT id, title, category, file_name, uploaded_at
            FROM file_record WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_file_row)
        .map_err(|error| error.into())
}

/// Retrieve all file records, most recently uploaded first.
pub fn get_all_files(connection: &Connection) -> Result<Vec<FileRecord>, Error> {
    connection
        .prepare(
            "SELECT id, title, category, file_name, uploaded_at
            FROM file_record ORDER BY uploaded_at DESC, id DESC",
        )?
        .query_map([], map_file_row)?
        .map(|row| row.map_err(Error::from))
        .collect()
}

/// Delete the file record with `id`. The caller is responsible for removing
/// the file from disk afterwards.
///
/// # Errors
/// Returns:
/// - [Error::DeleteMissingFile] if `id` does not refer to a file record,
/// - [Error::SqlError] if there is some other SQL error.
pub fn delete_file_record(id: DatabaseId, connection: &Connection) -> Result<(), Error> {
    let rows_deleted = connection.execute("DELETE FROM file_record WHERE id = ?1", (id,))?;

    if rows_deleted == 0 {
        return Err(Error::DeleteMissingFile);
    }

    Ok(())
}

fn map_file_row(row: &Row) -> Result<FileRecord, rusqlite::Error> {
    Ok(FileRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        category: row.get(2)?,
        file_name: row.get(3)?,
        uploaded_at: row.get(4)?,
    })
}
