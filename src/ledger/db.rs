//! Database operations for ledger entries.

use rusqlite::{Connection, Row, types::Type};
use time::Date;

use crate::{
    Error,
    database_id::DatabaseId,
    ledger::models::{EntryKind, LedgerEntry, NewLedgerEntry},
};

/// Create the ledger_entry table.
pub fn create_ledger_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE ledger_entry (
            id INTEGER PRIMARY KEY,
            kind TEXT NOT NULL,
            description TEXT NOT NULL,
            unit_price REAL NOT NULL,
            quantity INTEGER NOT NULL,
            event_id INTEGER,
            activity TEXT,
            date TEXT NOT NULL
        );

        CREATE INDEX idx_ledger_entry_kind_date ON ledger_entry(kind, date);",
    )?;

    Ok(())
}

/// Insert a validated ledger entry into the database.
pub fn create_entry(entry: NewLedgerEntry, connection: &Connection) -> Result<LedgerEntry, Error> {
    let entry = connection
        .prepare(
            "INSERT INTO ledger_entry (kind, description, unit_price, quantity, event_id, activity, date)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING id, kind, description, unit_price, quantity, event_id, activity, date",
        )?
        .query_row(
            (
                entry.kind.as_str(),
                &entry.description,
                entry.unit_price,
                entry.quantity,
                entry.event_id,
                &entry.activity,
                entry.date,
            ),
            map_entry_row,
        )?;

    Ok(entry)
}

/// Retrieve a ledger entry by its `id`.
///
/// # Errors
/// Returns:
/// - [Error::NotFound] if `id` does not refer to a ledger entry,
/// - [Error::SqlError] if there is some other SQL error.
pub fn get_entry_by_id(id: DatabaseId, connection: &Connection) -> Result<LedgerEntry, Error> {
    let entry = connection
        .prepare(
            "SELECT id, kind, description, unit_price, quantity, event_id, activity, date
            FROM ledger_entry WHERE id = :id",
        )?
        .query_one(&[(":id", &id)], map_entry_row)?;

    Ok(entry)
}

/// Retrieve the entries of one kind within an inclusive date range, oldest
/// first. `None` bounds are unbounded.
pub fn get_entries_by_kind(
    kind: EntryKind,
    date_from: Option<Date>,
    date_to: Option<Date>,
    connection: &Connection,
) -> Result<Vec<LedgerEntry>, Error> {
    connection
        .prepare(
            "SELECT id, kind, description, unit_price, quantity, event_id, activity, date
            FROM ledger_entry
            WHERE kind = :kind
                AND (:date_from IS NULL OR date >= :date_from)
                AND (:date_to IS NULL OR date <= :date_to)
            ORDER BY date ASC, id ASC",
        )?
        .query_map(
            rusqlite::named_params! {
                ":kind": kind.as_str(),
                ":date_from": date_from,
                ":date_to": date_to,
            },
            map_entry_row,
        )?
        .map(|row| row.map_err(Error::from))
        .collect()
}

/// Overwrite the ledger entry with `id` with the validated fields in `entry`.
///
/// # Errors
/// Returns:
/// - [Error::UpdateMissingEntry] if `id` does not refer to a ledger entry,
/// - [Error::SqlError] if there is some other SQL error.
pub fn update_entry(
    id: DatabaseId,
    entry: NewLedgerEntry,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_updated = connection.execute(
        "UPDATE ledger_entry
        SET kind = ?1, description = ?2, unit_price = ?3, quantity = ?4,
            event_id = ?5, activity = ?6, date = ?7
        WHERE id = ?8",
        (
            entry.kind.as_str(),
            &entry.description,
            entry.unit_price,
            entry.quantity,
            entry.event_id,
            &entry.activity,
            entry.date,
            id,
        ),
    )?;

    if rows_updated == 0 {
        return Err(Error::UpdateMissingEntry);
    }

    Ok(())
}

/// Delete the ledger entry with `id`.
///
/// # Errors
/// Returns:
/// - [Error::DeleteMissingEntry] if `id` does not refer to a ledger entry,
/// - [Error::SqlError] if there is some other SQL error.
pub fn delete_entry(id: DatabaseId, connection: &Connection) -> Result<(), Error> {
    let rows_deleted = connection.execute("DELETE FROM ledger_entry WHERE id = ?1", (id,))?;

    if rows_deleted == 0 {
        return Err(Error::DeleteMissingEntry);
    }

    Ok(())
}

fn map_entry_row(row: &Row) -> Result<LedgerEntry, rusqlite::Error> {
    let kind: String = row.get(1)?;
    let kind = EntryKind::from_str(&kind).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            Type::Text,
            format!("unknown entry kind {kind:?}").into(),
        )
    })?;

    Ok(LedgerEntry {
        id: row.get(0)?,
        kind,
        description: row.get(2)?,
        unit_price: row.get(3)?,
        quantity: row.get(4)?,
        event_id: row.get(5)?,
        activity: row.get(6)?,
        date: row.get(7)?,
    })
}

#[cfg(test)]
mod ledger_query_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        ledger::models::{EntryKind, NewLedgerEntry},
    };

    use super::{
        create_entry, create_ledger_table, delete_entry, get_entries_by_kind, get_entry_by_id,
        update_entry,
    };

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        create_ledger_table(&connection).unwrap();
        connection
    }

    fn new_entry(kind: EntryKind, description: &str, date: time::Date) -> NewLedgerEntry {
        NewLedgerEntry::build(
            kind,
            description,
            5.0,
            2,
            None,
            Some("Bake Sale".to_owned()),
            date,
            date!(2024 - 12 - 31),
        )
        .unwrap()
    }

    #[test]
    fn create_and_get_entry() {
        let connection = get_test_connection();

        let created = create_entry(
            new_entry(EntryKind::Revenue, "tickets", date!(2024 - 06 - 01)),
            &connection,
        )
        .unwrap();
        let fetched = get_entry_by_id(created.id, &connection).unwrap();

        assert_eq!(created, fetched);
        assert_eq!(fetched.kind, EntryKind::Revenue);
        assert_eq!(fetched.amount(), 10.0);
    }

    #[test]
    fn get_missing_entry_is_not_found() {
        let connection = get_test_connection();

        let result = get_entry_by_id(42, &connection);

        assert!(matches!(result, Err(Error::NotFound)));
    }

    #[test]
    fn entries_are_filtered_by_kind() {
        let connection = get_test_connection();
        create_entry(
            new_entry(EntryKind::Revenue, "tickets", date!(2024 - 06 - 01)),
            &connection,
        )
        .unwrap();
        create_entry(
            new_entry(EntryKind::Expense, "flour", date!(2024 - 06 - 02)),
            &connection,
        )
        .unwrap();

        let revenues = get_entries_by_kind(EntryKind::Revenue, None, None, &connection).unwrap();

        assert_eq!(revenues.len(), 1);
        assert_eq!(revenues[0].description, "tickets");
    }

    #[test]
    fn date_bounds_are_inclusive() {
        let connection = get_test_connection();
        for (description, date) in [
            ("before", date!(2024 - 01 - 01)),
            ("start", date!(2024 - 02 - 01)),
            ("end", date!(2024 - 03 - 01)),
            ("after", date!(2024 - 04 - 01)),
        ] {
            create_entry(new_entry(EntryKind::Revenue, description, date), &connection).unwrap();
        }

        let entries = get_entries_by_kind(
            EntryKind::Revenue,
            Some(date!(2024 - 02 - 01)),
            Some(date!(2024 - 03 - 01)),
            &connection,
        )
        .unwrap();

        let descriptions: Vec<&str> = entries
            .iter()
            .map(|entry| entry.description.as_str())
            .collect();
        assert_eq!(descriptions, vec!["start", "end"]);
    }

    #[test]
    fn update_entry_overwrites_fields() {
        let connection = get_test_connection();
        let entry = create_entry(
            new_entry(EntryKind::Revenue, "tickets", date!(2024 - 06 - 01)),
            &connection,
        )
        .unwrap();

        update_entry(
            entry.id,
            new_entry(EntryKind::Expense, "refund", date!(2024 - 06 - 02)),
            &connection,
        )
        .unwrap();

        let updated = get_entry_by_id(entry.id, &connection).unwrap();
        assert_eq!(updated.kind, EntryKind::Expense);
        assert_eq!(updated.description, "refund");
    }

    #[test]
    fn update_missing_entry_fails() {
        let connection = get_test_connection();

        let result = update_entry(
            42,
            new_entry(EntryKind::Revenue, "ghost", date!(2024 - 06 - 01)),
            &connection,
        );

        assert!(matches!(result, Err(Error::UpdateMissingEntry)));
    }

    #[test]
    fn delete_entry_removes_row() {
        let connection = get_test_connection();
        let entry = create_entry(
            new_entry(EntryKind::Revenue, "tickets", date!(2024 - 06 - 01)),
            &connection,
        )
        .unwrap();

        delete_entry(entry.id, &connection).unwrap();

        assert!(matches!(
            get_entry_by_id(entry.id, &connection),
            Err(Error::NotFound)
        ));
    }

    #[test]
    fn delete_missing_entry_fails() {
        let connection = get_test_connection();

        let result = delete_entry(42, &connection);

        assert!(matches!(result, Err(Error::DeleteMissingEntry)));
    }
}
