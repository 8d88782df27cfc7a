//! Database operations for payments and their charges.

use rusqlite::{Connection, Row};

use crate::{
    Error,
    database_id::DatabaseId,
    member::MemberId,
    payment::models::{Charge, ChargeWithMember, MemberCharge, NewPayment, Payment},
};

/// Create the payment and payment_charge tables.
pub fn create_payment_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE payment (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            amount REAL NOT NULL,
            due_date TEXT NOT NULL
        );

        CREATE TABLE payment_charge (
            id INTEGER PRIMARY KEY,
            payment_id INTEGER NOT NULL,
            member_id INTEGER NOT NULL,
            paid INTEGER NOT NULL DEFAULT 0,
            UNIQUE (payment_id, member_id),
            FOREIGN KEY (payment_id) REFERENCES payment(id) ON DELETE CASCADE
        );

        CREATE INDEX idx_payment_charge_member ON payment_charge(member_id);",
    )?;

    Ok(())
}

/// Insert a validated payment into the database.
pub fn create_payment(payment: NewPayment, connection: &Connection) -> Result<Payment, Error> {
    let payment = connection
        .prepare(
            "INSERT INTO payment (title, amount, due_date) VALUES (?1, ?2, ?3)
            RETURNING id, title, amount, due_date",
        )?
        .query_row(
            (&payment.title, payment.amount, payment.due_date),
            map_payment_row,
        )?;

    Ok(payment)
}

/// Retrieve all payments, most recently due first.
pub fn get_all_payments(connection: &Connection) -> Result<Vec<Payment>, Error> {
    connection
        .prepare("SELECT id, title, amount, due_date FROM payment ORDER BY due_date DESC, id DESC")?
        .query_map([], map_payment_row)?
        .map(|row| row.map_err(Error::from))
        .collect()
}

/// Charge `member_id` for the payment `payment_id`. New charges start unpaid.
///
/// # Errors
/// Returns an [Error::SqlError] if the member is already charged for this
/// payment or on any other SQL error.
pub fn charge_member(
    payment_id: DatabaseId,
    member_id: MemberId,
    connection: &Connection,
) -> Result<Charge, Error> {
    let charge = connection
        .prepare(
            "INSERT INTO payment_charge (payment_id, member_id, paid) VALUES (?1, ?2, 0)
            RETURNING id, payment_id, member_id, paid",
        )?
        .query_row((payment_id, member_id.as_i64()), |row| {
            Ok(Charge {
                id: row.get(0)?,
                payment_id: row.get(1)?,
                member_id: MemberId::new(row.get(2)?),
                paid: row.get(3)?,
            })
        })?;

    Ok(charge)
}

/// Retrieve the charges for one payment with each member's name, ordered
/// alphabetically by member name.
///
/// Charges whose member has been removed are omitted by the join.
pub fn get_charges_for_payment(
    payment_id: DatabaseId,
    connection: &Connection,
) -> Result<Vec<ChargeWithMember>, Error> {
    connection
        .prepare(
            "SELECT payment_charge.id, payment_charge.member_id, member.full_name,
                payment_charge.paid
            FROM payment_charge
            INNER JOIN member ON member.id = payment_charge.member_id
            WHERE payment_charge.payment_id = :payment_id
            ORDER BY member.full_name ASC",
        )?
        .query_map(&[(":payment_id", &payment_id)], |row| {
            Ok(ChargeWithMember {
                id: row.get(0)?,
                member_id: MemberId::new(row.get(1)?),
                member_name: row.get(2)?,
                paid: row.get(3)?,
            })
        })?
        .map(|row| row.map_err(Error::from))
        .collect()
}

/// Retrieve one member's charges with their payment details, most recently
/// due first.
pub fn get_charges_for_member(
    member_id: MemberId,
    connection: &Connection,
) -> Result<Vec<MemberCharge>, Error> {
    connection
        .prepare(
            "SELECT payment_charge.id, payment.title, payment.amount, payment.due_date,
                payment_charge.paid
            FROM payment_charge
            INNER JOIN payment ON payment.id = payment_charge.payment_id
            WHERE payment_charge.member_id = :member_id
            ORDER BY payment.due_date DESC, payment_charge.id DESC",
        )?
        .query_map(&[(":member_id", &member_id.as_i64())], |row| {
            Ok(MemberCharge {
                charge_id: row.get(0)?,
                payment_title: row.get(1)?,
                amount: row.get(2)?,
                due_date: row.get(3)?,
                paid: row.get(4)?,
            })
        })?
        .map(|row| row.map_err(Error::from))
        .collect()
}

/// Flip the charge with `charge_id` between paid and unpaid, returning the
/// updated charge with its member's name.
///
/// # Errors
/// Returns:
/// - [Error::UpdateMissingCharge] if `charge_id` does not refer to a charge,
/// - [Error::SqlError] if there is some other SQL error.
pub fn toggle_charge(
    charge_id: DatabaseId,
    connection: &Connection,
) -> Result<ChargeWithMember, Error> {
    let rows_updated = connection.execute(
        "UPDATE payment_charge SET paid = 1 - paid WHERE id = ?1",
        (charge_id,),
    )?;

    if rows_updated == 0 {
        return Err(Error::UpdateMissingCharge);
    }

    let charge = connection
        .prepare(
            "SELECT payment_charge.id, payment_charge.member_id, member.full_name,
                payment_charge.paid
            FROM payment_charge
            INNER JOIN member ON member.id = payment_charge.member_id
            WHERE payment_charge.id = :id",
        )?
        .query_row(&[(":id", &charge_id)], |row| {
            Ok(ChargeWithMember {
                id: row.get(0)?,
                member_id: MemberId::new(row.get(1)?),
                member_name: row.get(2)?,
                paid: row.get(3)?,
            })
        })?;

    Ok(charge)
}

fn map_payment_row(row: &Row) -> Result<Payment, rusqlite::Error> {
    Ok(Payment {
        id: row.get(0)?,
        title: row.get(1)?,
        amount: row.get(2)?,
        due_date: row.get(3)?,
    })
}

#[cfg(test)]
mod payment_query_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        member::{MemberId, PasswordHash, Role, create_member, create_member_table},
        payment::models::NewPayment,
    };

    use super::{
        charge_member, create_payment, create_payment_tables, get_all_payments,
        get_charges_for_member, get_charges_for_payment, toggle_charge,
    };

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        create_member_table(&connection).unwrap();
        create_payment_tables(&connection).unwrap();
        connection
    }

    fn insert_member(email: &str, name: &str, connection: &Connection) -> MemberId {
        create_member(
            email,
            PasswordHash::new_unchecked("hunter2"),
            name,
            "Brass",
            Role::Member,
            connection,
        )
        .unwrap()
        .id
    }

    fn dues(connection: &Connection) -> i64 {
        create_payment(
            NewPayment::build("Annual Dues", 25.0, date!(2025 - 03 - 01)).unwrap(),
            connection,
        )
        .unwrap()
        .id
    }

    #[test]
    fn create_and_list_payments() {
        let connection = get_test_connection();
        create_payment(
            NewPayment::build("Camp Fee", 80.0, date!(2025 - 01 - 15)).unwrap(),
            &connection,
        )
        .unwrap();
        dues(&connection);

        let payments = get_all_payments(&connection).unwrap();

        let titles: Vec<&str> = payments.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Annual Dues", "Camp Fee"]);
    }

    #[test]
    fn charge_member_starts_unpaid() {
        let connection = get_test_connection();
        let payment_id = dues(&connection);
        let member_id = insert_member("anna@test.org", "Anna", &connection);

        let charge = charge_member(payment_id, member_id, &connection).unwrap();

        assert!(!charge.paid);
        assert_eq!(charge.payment_id, payment_id);
        assert_eq!(charge.member_id, member_id);
    }

    #[test]
    fn charging_a_member_twice_fails() {
        let connection = get_test_connection();
        let payment_id = dues(&connection);
        let member_id = insert_member("anna@test.org", "Anna", &connection);
        charge_member(payment_id, member_id, &connection).unwrap();

        let result = charge_member(payment_id, member_id, &connection);

        assert!(matches!(result, Err(Error::SqlError(_))));
    }

    #[test]
    fn charges_for_payment_are_ordered_by_member_name() {
        let connection = get_test_connection();
        let payment_id = dues(&connection);
        let zoe = insert_member("zoe@test.org", "Zoe", &connection);
        let anna = insert_member("anna@test.org", "Anna", &connection);
        charge_member(payment_id, zoe, &connection).unwrap();
        charge_member(payment_id, anna, &connection).unwrap();

        let charges = get_charges_for_payment(payment_id, &connection).unwrap();

        let names: Vec<&str> = charges.iter().map(|c| c.member_name.as_str()).collect();
        assert_eq!(names, vec!["Anna", "Zoe"]);
    }

    #[test]
    fn charges_for_member_include_payment_details() {
        let connection = get_test_connection();
        let payment_id = dues(&connection);
        let member_id = insert_member("anna@test.org", "Anna", &connection);
        charge_member(payment_id, member_id, &connection).unwrap();

        let charges = get_charges_for_member(member_id, &connection).unwrap();

        assert_eq!(charges.len(), 1);
        assert_eq!(charges[0].payment_title, "Annual Dues");
        assert_eq!(charges[0].amount, 25.0);
        assert_eq!(charges[0].due_date, date!(2025 - 03 - 01));
        assert!(!charges[0].paid);
    }

    #[test]
    fn charges_for_member_exclude_other_members() {
        let connection = get_test_connection();
        let payment_id = dues(&connection);
        let anna = insert_member("anna@test.org", "Anna", &connection);
        let zoe = insert_member("zoe@test.org", "Zoe", &connection);
        charge_member(payment_id, anna, &connection).unwrap();

        assert!(get_charges_for_member(zoe, &connection).unwrap().is_empty());
    }

    #[test]
    fn toggle_charge_flips_paid_both_ways() {
        let connection = get_test_connection();
        let payment_id = dues(&connection);
        let member_id = insert_member("anna@test.org", "Anna", &connection);
        let charge = charge_member(payment_id, member_id, &connection).unwrap();

        let toggled = toggle_charge(charge.id, &connection).unwrap();
        assert!(toggled.paid);
        assert_eq!(toggled.member_name, "Anna");

        let toggled_back = toggle_charge(charge.id, &connection).unwrap();
        assert!(!toggled_back.paid);
    }

    #[test]
    fn toggle_missing_charge_fails() {
        let connection = get_test_connection();

        let result = toggle_charge(42, &connection);

        assert!(matches!(result, Err(Error::UpdateMissingCharge)));
    }
}
