/*! Creates the application's database schema. */

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{
    Error, event::create_event_table, files::create_file_table, ledger::create_ledger_table,
    member::create_member_table, payment::create_payment_tables,
    preferences::create_preference_table, story::create_story_table,
};

/// Create the tables for the application's domain models.
///
/// # Errors
/// Returns an error if a table already exists or if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_member_table(&transaction)?;
    create_event_table(&transaction)?;
    create_ledger_table(&transaction)?;
    create_payment_tables(&transaction)?;
    create_file_table(&transaction)?;
    create_story_table(&transaction)?;
    create_preference_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

#[cfg(test)]
mod initialize_tests {
    use rusqlite::Connection;

    use super::initialize;

    #[test]
    fn initialize_creates_all_tables() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).unwrap();

        let table_count: i64 = connection
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN \
                ('member', 'event', 'ledger_entry', 'payment', 'payment_charge', \
                'file_record', 'story', 'member_preference')",
                (),
                |row| row.get(0),
            )
            .unwrap();

        assert_eq!(table_count, 8);
    }

    #[test]
    fn initialize_fails_when_run_twice() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).unwrap();

        assert!(initialize(&connection).is_err());
    }
}
