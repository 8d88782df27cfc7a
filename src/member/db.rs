//! Database operations for members.

use rusqlite::{Connection, Row, types::Type};

use crate::{
    Error,
    member::{Member, MemberId, PasswordHash, Role},
};

/// Initialize the member table and indexes.
pub fn create_member_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE member (
            id INTEGER PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            password TEXT NOT NULL,
            full_name TEXT NOT NULL,
            section TEXT NOT NULL,
            role TEXT NOT NULL,
            verified INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX idx_member_email ON member(email);",
    )?;

    Ok(())
}

/// Create and insert a new member into the database.
///
/// New members start unverified regardless of role.
///
/// # Errors
///
/// Returns:
/// - [Error::EmptyField] if the email, name, or section is blank,
/// - [Error::DuplicateEmail] if the email already belongs to a member,
/// - [Error::SqlError] if any other SQL related error occurred.
pub fn create_member(
    email: &str,
    password_hash: PasswordHash,
    full_name: &str,
    section: &str,
    role: Role,
    connection: &Connection,
) -> Result<Member, Error> {
    let email = email.trim();
    let full_name = full_name.trim();
    let section = section.trim();

    if email.is_empty() {
        return Err(Error::EmptyField("Email"));
    }
    if full_name.is_empty() {
        return Err(Error::EmptyField("Name"));
    }
    if section.is_empty() {
        return Err(Error::EmptyField("Section"));
    }

    connection
        .execute(
            "INSERT INTO member (email, password, full_name, section, role, verified)
            VALUES (?1, ?2, ?3, ?4, ?5, 0)",
            (email, password_hash.as_ref(), full_name, section, role.as_str()),
        )
        .map_err(|error| match Error::from(error) {
            Error::DuplicateEmail(_) => Error::DuplicateEmail(email.to_owned()),
            other => other,
        })?;

    let id = MemberId::new(connection.last_insert_rowid());

    Ok(Member {
        id,
        email: email.to_owned(),
        password_hash,
        full_name: full_name.to_owned(),
        section: section.to_owned(),
        role,
        verified: false,
    })
}

/// Get the member with an ID equal to `member_id`.
///
/// # Errors
///
/// Returns an [Error::NotFound] if `member_id` does not belong to a member.
pub fn get_member_by_id(member_id: MemberId, connection: &Connection) -> Result<Member, Error> {
    connection
        .prepare(
            "SELECT id, email, password, full_name, section, role, verified
            FROM member WHERE id = :id",
        )?
        .query_row(&[(":id", &member_id.as_i64())], map_row)
        .map_err(|error| error.into())
}

/// Get the member with the given email address.
///
/// # Errors
///
/// Returns an [Error::NotFound] if no member has this email address.
pub fn get_member_by_email(email: &str, connection: &Connection) -> Result<Member, Error> {
    connection
        .prepare(
            "SELECT id, email, password, full_name, section, role, verified
            FROM member WHERE email = :email",
        )?
        .query_row(&[(":email", &email)], map_row)
        .map_err(|error| error.into())
}

/// Retrieve all members ordered alphabetically by name.
pub fn get_all_members(connection: &Connection) -> Result<Vec<Member>, Error> {
    connection
        .prepare(
            "SELECT id, email, password, full_name, section, role, verified
            FROM member ORDER BY full_name ASC",
        )?
        .query_map([], map_row)?
        .map(|maybe_member| maybe_member.map_err(|error| error.into()))
        .collect()
}

/// Retrieve the verified members, ordered alphabetically by name.
///
/// Used when charging the current membership for a payment.
pub fn get_verified_members(connection: &Connection) -> Result<Vec<Member>, Error> {
    connection
        .prepare(
            "SELECT id, email, password, full_name, section, role, verified
            FROM member WHERE verified = 1 ORDER BY full_name ASC",
        )?
        .query_map([], map_row)?
        .map(|maybe_member| maybe_member.map_err(|error| error.into()))
        .collect()
}

/// Mark a member as verified.
///
/// # Errors
///
/// Returns an [Error::UpdateMissingMember] if the member does not exist.
pub fn set_member_verified(member_id: MemberId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE member SET verified = 1 WHERE id = ?1",
        [member_id.as_i64()],
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingMember);
    }

    Ok(())
}

/// Change a member's role.
///
/// # Errors
///
/// Returns an [Error::UpdateMissingMember] if the member does not exist.
pub fn set_member_role(
    member_id: MemberId,
    role: Role,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE member SET role = ?1 WHERE id = ?2",
        (role.as_str(), member_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingMember);
    }

    Ok(())
}

/// Remove a member.
///
/// # Errors
///
/// Returns an [Error::DeleteMissingMember] if the member does not exist.
pub fn delete_member(member_id: MemberId, connection: &Connection) -> Result<(), Error> {
    let rows_affected =
        connection.execute("DELETE FROM member WHERE id = ?1", [member_id.as_i64()])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingMember);
    }

    Ok(())
}

/// Get the number of members in the database.
pub fn count_members(connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM member", [], |row| {
            row.get::<_, i64>(0).map(|count| count as usize)
        })
        .map_err(|error| error.into())
}

fn map_row(row: &Row) -> Result<Member, rusqlite::Error> {
    let raw_id = row.get(0)?;
    let email: String = row.get(1)?;
    let raw_password_hash: String = row.get(2)?;
    let full_name: String = row.get(3)?;
    let section: String = row.get(4)?;
    let raw_role: String = row.get(5)?;
    let verified: bool = row.get(6)?;

    let role = Role::from_str(&raw_role).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            Type::Text,
            format!("unknown role \"{raw_role}\"").into(),
        )
    })?;

    Ok(Member {
        id: MemberId::new(raw_id),
        email,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        full_name,
        section,
        role,
        verified,
    })
}
