//! The endpoint for toggling a payment charge between paid and unpaid.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::Response,
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    database_id::DatabaseId,
    payment::{db::toggle_charge, list::charge_row},
    shared_templates::render,
};

/// The state needed to toggle a payment charge.
#[derive(Debug, Clone)]
pub struct ToggleChargeState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ToggleChargeState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Flip the charge with `charge_id` between paid and unpaid, returning the
/// updated table row.
pub async fn toggle_charge_endpoint(
    Path(charge_id): Path<DatabaseId>,
    State(state): State<ToggleChargeState>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match toggle_charge(charge_id, &connection) {
        Ok(charge) => render(StatusCode::OK, charge_row(&charge)),
        Err(Error::UpdateMissingCharge) => Error::UpdateMissingCharge.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while toggling charge {charge_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}
