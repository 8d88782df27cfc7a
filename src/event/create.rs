//! The page and endpoint for creating a new event.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error, endpoints,
    event::{NewEvent, create_event},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
        loading_spinner,
    },
    member::Member,
    navigation::NavBar,
};

/// The state needed to create an event.
#[derive(Debug, Clone)]
pub struct CreateEventState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateEventState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

pub(super) fn event_form_fields(
    name: &str,
    location: &str,
    description: &str,
    date: Option<Date>,
) -> Markup {
    html!(
        div
        {
            label for="name" class=(FORM_LABEL_STYLE) { "Name" }

            input
                name="name"
                id="name"
                type="text"
                value=(name)
                required
                autofocus
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="location" class=(FORM_LABEL_STYLE) { "Location" }

            input
                name="location"
                id="location"
                type="text"
                value=(location)
                required
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="description" class=(FORM_LABEL_STYLE) { "Description" }

            input
                name="description"
                id="description"
                type="text"
                value=(description)
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="date" class=(FORM_LABEL_STYLE) { "Date" }

            input
                name="date"
                id="date"
                type="date"
                value=[date]
                required
                class=(FORM_TEXT_INPUT_STYLE);
        }
    )
}

fn create_event_view(viewer: &Member) -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_EVENT_VIEW, viewer.role).into_html();
    let spinner = loading_spinner();

    let content = html!(
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            form
                hx-post=(endpoints::POST_EVENT)
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                h2 class="text-xl font-bold" { "New Event" }

                (event_form_fields("", "", "", None))

                button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
                {
                    span id="indicator" class="inline htmx-indicator" { (spinner) }
                    " Create Event"
                }
            }
        }
    );

    base("Create Event", &[], &content)
}

/// Render the page for creating an event.
pub async fn get_new_event_page(viewer: Extension<Member>) -> Response {
    create_event_view(&viewer.0).into_response()
}

/// The form data for creating or updating an event.
#[derive(Debug, Deserialize)]
pub struct EventForm {
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub description: String,
    pub date: Date,
}

/// Create a new event, redirecting to the events view on success.
pub async fn create_event_endpoint(
    State(state): State<CreateEventState>,
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

    if let Err(error) = create_event(event, &connection) {
        tracing::error!("could not create event: {error}");

        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::EVENTS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
