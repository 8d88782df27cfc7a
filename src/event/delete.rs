//! The endpoint for deleting an event.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    alert::AlertTemplate,
    database_id::DatabaseId,
    event::db::delete_event,
    shared_templates::render,
};

/// The state needed to delete an event.
#[derive(Debug, Clone)]
pub struct DeleteEventState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteEventState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Delete the event with `event_id`. Returns a success alert or an error
/// alert.
pub async fn delete_event_endpoint(
    Path(event_id): Path<DatabaseId>,
    State(state): State<DeleteEventState>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_event(event_id, &connection) {
        Ok(_) => render(
            StatusCode::OK,
            AlertTemplate::success("Event deleted", "The event has been deleted."),
        ),
        Err(Error::DeleteMissingEvent) => Error::DeleteMissingEvent.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while deleting event {event_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod delete_event_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, State},
        http::StatusCode,
    };
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        event::{NewEvent, create_event, create_event_table, get_event_by_id},
        test_utils::{assert_valid_html, parse_html_fragment},
    };

    use super::{DeleteEventState, delete_event_endpoint};

    fn get_test_state() -> DeleteEventState {
        let connection = Connection::open_in_memory().unwrap();
        create_event_table(&connection).unwrap();
        create_event(
            NewEvent::build("Spring Fest", "Main Quad", "details", date!(2024 - 06 - 01)).unwrap(),
            &connection,
        )
        .unwrap();

        DeleteEventState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn delete_event_removes_row() {
        let state = get_test_state();

        let response = delete_event_endpoint(Path(1), State(state.clone())).await;

        assert_eq!(response.status(), StatusCode::OK);
        let connection = state.db_connection.lock().unwrap();
        assert!(matches!(
            get_event_by_id(1, &connection),
            Err(Error::NotFound)
        ));
    }

    #[tokio::test]
    async fn delete_missing_event_returns_error_alert() {
        let state = get_test_state();

        let response = delete_event_endpoint(Path(42), State(state)).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let fragment = parse_html_fragment(response).await;
        assert_valid_html(&fragment);
    }
}
