//! Database operations for events.

use std::collections::HashMap;

use rusqlite::{Connection, Row};
use time::Date;

use crate::{
    Error,
    database_id::DatabaseId,
    event::{Event, NewEvent},
};

/// Create the event table.
pub fn create_event_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE event (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            location TEXT NOT NULL,
            description TEXT NOT NULL,
            date TEXT NOT NULL
        );

        CREATE INDEX idx_event_date ON event(date);",
    )?;

    Ok(())
}

/// Insert a new event into the database.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn create_event(event: NewEvent, connection: &Connection) -> Result<Event, Error> {
    let event = connection
        .prepare(
            "INSERT INTO event (name, location, description, date)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING id, name, location, description, date",
        )?
        .query_row(
            (&event.name, &event.location, &event.description, event.date),
            map_event_row,
        )?;

    Ok(event)
}

/// Retrieve an event by its `id`.
///
/// # Errors
/// Returns:
/// - [Error::NotFound] if `id` does not refer to an event,
/// - [Error::SqlError] if there is some other SQL error.
pub fn get_event_by_id(id: DatabaseId, connection: &Connection) -> Result<Event, Error> {
    let event = connection
        .prepare("SELECT id, name, location, description, date FROM event WHERE id = :id")?
        .query_one(&[(":id", &id)], map_event_row)?;

    Ok(event)
}

/// Retrieve all events, soonest first.
pub fn get_all_events(connection: &Connection) -> Result<Vec<Event>, Error> {
    connection
        .prepare("SELECT id, name, location, description, date FROM event ORDER BY date ASC, id ASC")?
        .query_map([], map_event_row)?
        .map(|row| row.map_err(Error::from))
        .collect()
}

/// Retrieve up to `limit` events dated today or later, soonest first.
pub fn get_upcoming_events(
    today: Date,
    limit: u32,
    connection: &Connection,
) -> Result<Vec<Event>, Error> {
    connection
        .prepare(
            "SELECT id, name, location, description, date FROM event
            WHERE date >= :today ORDER BY date ASC, id ASC LIMIT :limit",
        )?
        .query_map(
            rusqlite::named_params! {":today": today, ":limit": limit},
            map_event_row,
        )?
        .map(|row| row.map_err(Error::from))
        .collect()
}

/// Retrieve the id-to-name lookup used to label activity summaries.
pub fn get_event_names(connection: &Connection) -> Result<HashMap<DatabaseId, String>, Error> {
    connection
        .prepare("SELECT id, name FROM event")?
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .map(|row| row.map_err(Error::from))
        .collect()
}

/// Overwrite the event with `id` with the validated fields in `event`.
///
/// # Errors
/// Returns:
/// - [Error::UpdateMissingEvent] if `id` does not refer to an event,
/// - [Error::SqlError] if there is some other SQL error.
pub fn update_event(id: DatabaseId, event: NewEvent, connection: &Connection) -> Result<(), Error> {
    let rows_updated = connection.execute(
        "UPDATE event SET name = ?1, location = ?2, description = ?3, date = ?4 WHERE id = ?5",
        (&event.name, &event.location, &event.description, event.date, id),
    )?;

    if rows_updated == 0 {
        return Err(Error::UpdateMissingEvent);
    }

    Ok(())
}

/// Delete the event with `id`.
///
/// Ledger entries tied to the event keep their `event_id`; the finance page
/// labels them with the unknown-event placeholder once the event is gone.
///
/// # Errors
/// Returns:
/// - [Error::DeleteMissingEvent] if `id` does not refer to an event,
/// - [Error::SqlError] if there is some other SQL error.
pub fn delete_event(id: DatabaseId, connection: &Connection) -> Result<(), Error> {
    let rows_deleted = connection.execute("DELETE FROM event WHERE id = ?1", (id,))?;

    if rows_deleted == 0 {
        return Err(Error::DeleteMissingEvent);
    }

    Ok(())
}

fn map_event_row(row: &Row) -> Result<Event, rusqlite::Error> {
    Ok(Event {
        id: row.get(0)?,
        name: row.get(1)?,
        location: row.get(2)?,
        description: row.get(3)?,
        date: row.get(4)?,
    })
}
