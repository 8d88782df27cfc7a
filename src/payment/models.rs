//! Core payment domain types.

use time::Date;

use crate::{Error, database_id::DatabaseId, listing::Filterable, member::MemberId};

/// A payment the organization collects from its members, e.g. annual dues or
/// a trip fee. Creating a payment charges every verified member.
#[derive(Debug, Clone, PartialEq)]
pub struct Payment {
    /// The payment's ID in the application database.
    pub id: DatabaseId,
    /// A short description of what the payment is for.
    pub title: String,
    /// The amount each member owes.
    pub amount: f64,
    /// When the payment is due. Due dates may be in the future.
    pub due_date: Date,
}

impl Filterable for Payment {
    fn matches_search(&self, term: &str) -> bool {
        self.title.to_lowercase().contains(term)
    }

    fn date(&self) -> Option<Date> {
        Some(self.due_date)
    }
}

/// The validated fields for a payment that has not been saved yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPayment {
    pub(crate) title: String,
    pub(crate) amount: f64,
    pub(crate) due_date: Date,
}

impl NewPayment {
    /// Validate the fields for a new payment.
    ///
    /// # Errors
    /// Returns:
    /// - [Error::EmptyField] if the title is blank,
    /// - [Error::NegativeAmount] if the amount is below zero.
    pub fn build(title: &str, amount: f64, due_date: Date) -> Result<Self, Error> {
        let title = title.trim();

        if title.is_empty() {
            return Err(Error::EmptyField("Title"));
        }

        if amount < 0.0 {
            return Err(Error::NegativeAmount(amount));
        }

        Ok(Self {
            title: title.to_owned(),
            amount,
            due_date,
        })
    }
}

/// One member's share of a payment.
#[derive(Debug, Clone, PartialEq)]
pub struct Charge {
    /// The charge's ID in the application database.
    pub id: DatabaseId,
    /// The payment this charge belongs to.
    pub payment_id: DatabaseId,
    /// The member who owes this charge.
    pub member_id: MemberId,
    /// Whether an officer has recorded this charge as paid.
    pub paid: bool,
}

/// A charge joined with the charged member's name, for the payments page.
#[derive(Debug, Clone, PartialEq)]
pub struct ChargeWithMember {
    /// The charge's ID in the application database.
    pub id: DatabaseId,
    /// The member who owes this charge.
    pub member_id: MemberId,
    /// The member's display name.
    pub member_name: String,
    /// Whether the charge has been recorded as paid.
    pub paid: bool,
}

/// A charge joined with its payment's details, for a member's own view.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberCharge {
    /// The charge's ID in the application database.
    pub charge_id: DatabaseId,
    /// What the payment is for.
    pub payment_title: String,
    /// The amount owed.
    pub amount: f64,
    /// When the payment is due.
    pub due_date: Date,
    /// Whether the charge has been recorded as paid.
    pub paid: bool,
}
