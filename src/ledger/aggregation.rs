//! Grouping of ledger entries into per-activity financial summaries.
//!
//! The finance page shows one row per event or free-text activity with its
//! total revenue, total expense, and the date of its most recent entry.

use std::collections::HashMap;

use time::Date;

use crate::{
    database_id::DatabaseId,
    ledger::models::{GroupKey, LedgerEntry},
};

/// The label shown for entries tied to an event that no longer exists.
pub const UNKNOWN_EVENT_LABEL: &str = "Unknown Event";

/// The combined revenue and expense totals for one event or activity.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivitySummary {
    /// The event ID or activity label the summary groups by.
    pub key: GroupKey,
    /// The display name: the event's name, the activity label, or
    /// [UNKNOWN_EVENT_LABEL] when the event cannot be resolved.
    pub name: String,
    /// The sum of all revenue entry amounts.
    pub total_revenue: f64,
    /// The sum of all expense entry amounts.
    pub total_expense: f64,
    /// The date of the most recent entry in the group.
    pub last_date: Date,
}

impl ActivitySummary {
    /// Revenue minus expense.
    pub fn net(&self) -> f64 {
        self.total_revenue - self.total_expense
    }
}

/// Group revenue and expense entries into per-activity summaries.
///
/// Summaries are ordered most recent first by [ActivitySummary::last_date].
/// Groups sharing a last date keep the order in which they were first seen,
/// scanning revenues before expenses. Entries tied to neither an event nor an
/// activity are skipped; their count is logged at debug level.
pub fn aggregate(
    revenues: &[LedgerEntry],
    expenses: &[LedgerEntry],
    event_names: &HashMap<DatabaseId, String>,
) -> Vec<ActivitySummary> {
    let mut summaries: Vec<ActivitySummary> = Vec::new();
    let mut index_by_key: HashMap<GroupKey, usize> = HashMap::new();
    let mut skipped = 0;

    let mut add = |entry: &LedgerEntry, is_revenue: bool, skipped: &mut usize| {
        let Some(key) = entry.group_key() else {
            *skipped += 1;
            return;
        };

        let index = *index_by_key.entry(key.clone()).or_insert_with(|| {
            let name = match &key {
                GroupKey::Event(event_id) => event_names
                    .get(event_id)
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN_EVENT_LABEL.to_owned()),
                GroupKey::Activity(activity) => activity.clone(),
            };

            summaries.push(ActivitySummary {
                key,
                name,
                total_revenue: 0.0,
                total_expense: 0.0,
                last_date: Date::MIN,
            });

            summaries.len() - 1
        });

        let summary = &mut summaries[index];

        if is_revenue {
            summary.total_revenue += entry.amount();
        } else {
            summary.total_expense += entry.amount();
        }

        if entry.date > summary.last_date {
            summary.last_date = entry.date;
        }
    };

    for entry in revenues {
        add(entry, true, &mut skipped);
    }

    for entry in expenses {
        add(entry, false, &mut skipped);
    }

    if skipped > 0 {
        tracing::debug!("skipped {skipped} ledger entries with no event or activity");
    }

    // Stable sort keeps first-seen order within a date.
    summaries.sort_by(|a, b| b.last_date.cmp(&a.last_date));

    summaries
}
