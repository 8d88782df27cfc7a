//! The endpoint for deleting a ledger entry.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::Response,
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    alert::AlertTemplate,
    database_id::DatabaseId,
    ledger::db::delete_entry,
    shared_templates::render,
};

/// The state needed to delete a ledger entry.
#[derive(Debug, Clone)]
pub struct DeleteEntryState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteEntryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Delete the ledger entry with `entry_id`.
pub async fn delete_entry_endpoint(
    Path(entry_id): Path<DatabaseId>,
    State(state): State<DeleteEntryState>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_entry(entry_id, &connection) {
        Ok(_) => render(
            StatusCode::OK,
            AlertTemplate::success("Entry deleted", "The ledger entry has been removed."),
        ),
        Err(Error::DeleteMissingEntry) => Error::DeleteMissingEntry.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while deleting ledger entry {entry_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}
