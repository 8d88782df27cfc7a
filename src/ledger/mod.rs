//! Ledger entries (revenue and expense) and the finance views built on them.

mod aggregation;
mod create;
mod db;
mod delete;
mod edit;
mod finance_page;
mod models;

pub use aggregation::{ActivitySummary, UNKNOWN_EVENT_LABEL, aggregate};
pub use create::{CreateEntryState, EntryForm, create_entry_endpoint, get_new_entry_page};
pub use delete::{DeleteEntryState, delete_entry_endpoint};
pub use edit::{EditEntryState, get_edit_entry_page, update_entry_endpoint};
pub use finance_page::{FinancePageState, get_finance_page, save_finance_range_endpoint};
pub use models::{EntryKind, GroupKey, LedgerEntry, NewLedgerEntry};

pub(crate) use db::{create_entry, create_ledger_table};
