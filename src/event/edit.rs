//! The page and endpoint for editing an existing event.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    database_id::DatabaseId,
    endpoints,
    event::{
        Event, NewEvent,
        create::{EventForm, event_form_fields},
        db::{get_event_by_id, update_event},
    },
    html::{BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, base, loading_spinner},
    member::Member,
    navigation::NavBar,
};

/// The state needed to edit an event.
#[derive(Debug, Clone)]
pub struct EditEventState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditEventState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

fn edit_event_view(event: &Event, viewer: &Member) -> Markup {
    let nav_bar = NavBar::new(endpoints::EVENTS_VIEW, viewer.role).into_html();
    let update_url = endpoints::format_endpoint(endpoints::PUT_EVENT, event.id);
    let spinner = loading_spinner();

    let content = html!(
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            form
                hx-put=(update_url)
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                h2 class="text-xl font-bold" { "Edit Event" }

                (event_form_fields(
                    &event.name,
                    &event.location,
                    &event.description,
                    Some(event.date),
                ))

                button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
                {
                    span id="indicator" class="inline htmx-indicator" { (spinner) }
                    " Save Event"
                }
            }
        }
    );

    base("Edit Event", &[], &content)
}

/// Render the page for editing the event with `event_id`.
pub async fn get_edit_event_page(
    Path(event_id): Path<DatabaseId>,
    State(state): State<EditEventState>,
    viewer: Extension<Member>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let event = get_event_by_id(event_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve event {event_id}: {error}"))?;

    Ok(edit_event_view(&event, &viewer.0).into_response())
}

/// Overwrite the event with `event_id`, redirecting to the events view on
/// success.
pub async fn update_event_endpoint(
    Path(event_id): Path<DatabaseId>,
    State(state): State<EditEventState>,
    Form(form): Form<EventForm>,
) -> Response {
    let event = match NewEvent::build(&form.name, &form.location, &form.description, form.date) {
        Ok(event) => event,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match update_event(event_id, event, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::EVENTS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(Error::UpdateMissingEvent) => Error::UpdateMissingEvent.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while updating event {event_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}
