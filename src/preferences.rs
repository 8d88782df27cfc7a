//! Per-member preferences stored as JSON values in SQLite.
//!
//! Preferences are a typed key-value store: each preference has a JSON value
//! under a string key, scoped to a member. Readers always get a usable value:
//! an absent or corrupt row falls back to the type's default rather than
//! failing the page.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{Error, member::MemberId};

const FINANCE_RANGE_KEY: &str = "finance_range";

/// Create the member_preference table.
pub fn create_preference_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE member_preference (
            member_id INTEGER NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            PRIMARY KEY (member_id, key),
            FOREIGN KEY (member_id) REFERENCES member(id) ON DELETE CASCADE
        )",
        (),
    )?;

    Ok(())
}

/// The date range the finance page aggregates over. `None` bounds mean
/// unbounded on that side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FinanceRange {
    pub date_from: Option<Date>,
    pub date_to: Option<Date>,
}

/// Save `range` as the member's finance date-range preference.
///
/// # Errors
/// Returns:
/// - [Error::JSONSerializationError] if the range cannot be serialized,
/// - [Error::PreferencesSaveError] if the row cannot be written.
pub fn save_finance_range(
    member_id: MemberId,
    range: FinanceRange,
    connection: &Connection,
) -> Result<(), Error> {
    let value = serde_json::to_string(&range)
        .map_err(|error| Error::JSONSerializationError(error.to_string()))?;

    connection
        .execute(
            "INSERT INTO member_preference (member_id, key, value) VALUES (?1, ?2, ?3)
            ON CONFLICT (member_id, key) DO UPDATE SET value = excluded.value",
            (member_id.as_i64(), FINANCE_RANGE_KEY, value),
        )
        .map_err(|error| {
            tracing::error!("could not save finance range preference: {error}");
            Error::PreferencesSaveError
        })?;

    Ok(())
}

/// Load the member's finance date-range preference.
///
/// An absent row yields the default range. A row that cannot be parsed also
/// yields the default; the corrupt value is logged and left in place to be
/// overwritten by the next save.
pub fn get_finance_range(
    member_id: MemberId,
    connection: &Connection,
) -> Result<FinanceRange, Error> {
    let raw: Option<String> = connection
        .prepare("SELECT value FROM member_preference WHERE member_id = :member_id AND key = :key")?
        .query_row(
            rusqlite::named_params! {":member_id": member_id.as_i64(), ":key": FINANCE_RANGE_KEY},
            |row| row.get(0),
        )
        .map(Some)
        .or_else(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            error => Err(Error::from(error)),
        })?;

    let Some(raw) = raw else {
        return Ok(FinanceRange::default());
    };

    match serde_json::from_str(&raw) {
        Ok(range) => Ok(range),
        Err(error) => {
            tracing::warn!("ignoring corrupt finance range preference {raw:?}: {error}");
            Ok(FinanceRange::default())
        }
    }
}

#[cfg(test)]
mod preference_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::member::{MemberId, PasswordHash, Role, create_member, create_member_table};

    use super::{FinanceRange, create_preference_table, get_finance_range, save_finance_range};

    fn get_test_connection() -> (Connection, MemberId) {
        let connection = Connection::open_in_memory().unwrap();
        connection.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        create_member_table(&connection).unwrap();
        create_preference_table(&connection).unwrap();

        let member = create_member(
            "treasurer@test.org",
            PasswordHash::new_unchecked("hash"),
            "The Treasurer",
            "Committee",
            Role::Officer,
            &connection,
        )
        .unwrap();

        (connection, member.id)
    }

    #[test]
    fn absent_preference_falls_back_to_default() {
        let (connection, member_id) = get_test_connection();

        let range = get_finance_range(member_id, &connection).unwrap();

        assert_eq!(range, FinanceRange::default());
    }

    #[test]
    fn save_and_load_round_trips() {
        let (connection, member_id) = get_test_connection();
        let range = FinanceRange {
            date_from: Some(date!(2024 - 01 - 01)),
            date_to: Some(date!(2024 - 06 - 30)),
        };

        save_finance_range(member_id, range, &connection).unwrap();

        assert_eq!(get_finance_range(member_id, &connection).unwrap(), range);
    }

    #[test]
    fn save_replaces_previous_value() {
        let (connection, member_id) = get_test_connection();
        save_finance_range(
            member_id,
            FinanceRange {
                date_from: Some(date!(2024 - 01 - 01)),
                date_to: None,
            },
            &connection,
        )
        .unwrap();

        let updated = FinanceRange {
            date_from: None,
            date_to: Some(date!(2024 - 12 - 31)),
        };
        save_finance_range(member_id, updated, &connection).unwrap();

        assert_eq!(get_finance_range(member_id, &connection).unwrap(), updated);
    }

    #[test]
    fn corrupt_preference_falls_back_to_default() {
        let (connection, member_id) = get_test_connection();
        connection
            .execute(
                "INSERT INTO member_preference (member_id, key, value)
                VALUES (?1, 'finance_range', 'not json')",
                (member_id.as_i64(),),
            )
            .unwrap();

        let range = get_finance_range(member_id, &connection).unwrap();

        assert_eq!(range, FinanceRange::default());
    }

    #[test]
    fn preferences_are_scoped_per_member() {
        let (connection, member_id) = get_test_connection();
        let other = create_member(
            "secretary@test.org",
            PasswordHash::new_unchecked("hash"),
            "The Secretary",
            "Committee",
            Role::Officer,
            &connection,
        )
        .unwrap();

        save_finance_range(
            member_id,
            FinanceRange {
                date_from: Some(date!(2024 - 01 - 01)),
                date_to: None,
            },
            &connection,
        )
        .unwrap();

        assert_eq!(
            get_finance_range(other.id, &connection).unwrap(),
            FinanceRange::default()
        );
    }
}
