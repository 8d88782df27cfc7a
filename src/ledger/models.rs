//! The domain types for revenue and expense records.

use time::Date;

use crate::{Error, database_id::DatabaseId};

/// Whether a ledger entry records money coming in or going out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Money received, e.g. ticket sales or sponsorships.
    Revenue,
    /// Money spent, e.g. venue hire or supplies.
    Expense,
}

impl EntryKind {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            EntryKind::Revenue => "revenue",
            EntryKind::Expense => "expense",
        }
    }

    pub(crate) fn from_str(raw: &str) -> Option<Self> {
        match raw {
            "revenue" => Some(EntryKind::Revenue),
            "expense" => Some(EntryKind::Expense),
            _ => None,
        }
    }
}

/// The key that buckets ledger entries into an activity summary: the event's
/// row ID for event-tied entries, otherwise the free-text activity label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    /// The entry belongs to a scheduled organization event.
    Event(DatabaseId),
    /// The entry belongs to a free-text activity.
    Activity(String),
}

/// A single revenue or expense record.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    /// The entry's row ID.
    pub id: DatabaseId,
    /// Revenue or expense.
    pub kind: EntryKind,
    /// What the money was for.
    pub description: String,
    /// The price of one unit. Always >= 0 in valid data.
    pub unit_price: f64,
    /// How many units. Always >= 0 in valid data.
    pub quantity: i64,
    /// The event this entry is tied to, if any.
    pub event_id: Option<DatabaseId>,
    /// The free-text activity this entry is tied to, if not an event.
    pub activity: Option<String>,
    /// When the money moved.
    pub date: Date,
}

impl LedgerEntry {
    /// The entry's monetary value.
    pub fn amount(&self) -> f64 {
        self.unit_price * self.quantity as f64
    }

    /// The key this entry groups under, or `None` when the entry is tied to
    /// neither an event nor an activity and cannot be grouped.
    pub fn group_key(&self) -> Option<GroupKey> {
        if let Some(event_id) = self.event_id {
            return Some(GroupKey::Event(event_id));
        }

        self.activity
            .as_deref()
            .filter(|activity| !activity.trim().is_empty())
            .map(|activity| GroupKey::Activity(activity.to_owned()))
    }
}

/// A validated ledger entry that has not been saved yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLedgerEntry {
    pub(crate) kind: EntryKind,
    pub(crate) description: String,
    pub(crate) unit_price: f64,
    pub(crate) quantity: i64,
    pub(crate) event_id: Option<DatabaseId>,
    pub(crate) activity: Option<String>,
    pub(crate) date: Date,
}

impl NewLedgerEntry {
    /// Validate the fields for a new ledger entry.
    ///
    /// # Errors
    /// Returns:
    /// - [Error::EmptyField] if the description is blank,
    /// - [Error::NegativeAmount] if the unit price or quantity is negative,
    /// - [Error::FutureDate] if `date` is after `today`.
    pub fn build(
        kind: EntryKind,
        description: &str,
        unit_price: f64,
        quantity: i64,
        event_id: Option<DatabaseId>,
        activity: Option<String>,
        date: Date,
        today: Date,
    ) -> Result<Self, Error> {
        if description.trim().is_empty() {
            return Err(Error::EmptyField("Description"));
        }

        if unit_price < 0.0 {
            return Err(Error::NegativeAmount(unit_price));
        }

        if quantity < 0 {
            return Err(Error::NegativeAmount(quantity as f64));
        }

        if date > today {
            return Err(Error::FutureDate(date));
        }

        let activity = activity.filter(|activity| !activity.trim().is_empty());

        Ok(Self {
            kind,
            description: description.trim().to_owned(),
            unit_price,
            quantity,
            event_id,
            activity,
            date,
        })
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::Error;

    use super::{EntryKind, GroupKey, LedgerEntry, NewLedgerEntry};

    fn entry(event_id: Option<i64>, activity: Option<&str>) -> LedgerEntry {
        LedgerEntry {
            id: 1,
            kind: EntryKind::Revenue,
            description: "tickets".to_owned(),
            unit_price: 5.0,
            quantity: 4,
            event_id,
            activity: activity.map(str::to_owned),
            date: date!(2024 - 01 - 10),
        }
    }

    #[test]
    fn amount_is_price_times_quantity() {
        assert_eq!(entry(None, Some("bake sale")).amount(), 20.0);
    }

    #[test]
    fn group_key_prefers_event_id() {
        assert_eq!(
            entry(Some(7), Some("bake sale")).group_key(),
            Some(GroupKey::Event(7))
        );
    }

    #[test]
    fn group_key_falls_back_to_activity() {
        assert_eq!(
            entry(None, Some("bake sale")).group_key(),
            Some(GroupKey::Activity("bake sale".to_owned()))
        );
    }

    #[test]
    fn group_key_is_none_when_ungroupable() {
        assert_eq!(entry(None, None).group_key(), None);
        assert_eq!(entry(None, Some("  ")).group_key(), None);
    }

    #[test]
    fn build_rejects_blank_description() {
        let result = NewLedgerEntry::build(
            EntryKind::Expense,
            "  ",
            1.0,
            1,
            None,
            Some("supplies".to_owned()),
            date!(2024 - 01 - 10),
            date!(2024 - 01 - 10),
        );

        assert_eq!(result, Err(Error::EmptyField("Description")));
    }

    #[test]
    fn build_rejects_negative_price() {
        let result = NewLedgerEntry::build(
            EntryKind::Expense,
            "supplies",
            -1.0,
            1,
            None,
            Some("supplies".to_owned()),
            date!(2024 - 01 - 10),
            date!(2024 - 01 - 10),
        );

        assert_eq!(result, Err(Error::NegativeAmount(-1.0)));
    }

    #[test]
    fn build_rejects_future_date() {
        let result = NewLedgerEntry::build(
            EntryKind::Revenue,
            "tickets",
            1.0,
            1,
            None,
            Some("bake sale".to_owned()),
            date!(2024 - 01 - 11),
            date!(2024 - 01 - 10),
        );

        assert_eq!(result, Err(Error::FutureDate(date!(2024 - 01 - 11))));
    }

    #[test]
    fn build_blank_activity_becomes_none() {
        let entry = NewLedgerEntry::build(
            EntryKind::Revenue,
            "tickets",
            1.0,
            1,
            Some(3),
            Some("".to_owned()),
            date!(2024 - 01 - 10),
            date!(2024 - 01 - 10),
        )
        .unwrap();

        assert_eq!(entry.activity, None);
    }
}
