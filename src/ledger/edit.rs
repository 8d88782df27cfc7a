//! The page and endpoint for editing an existing ledger entry.

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
use time::{Date, OffsetDateTime};

use crate::{
    AppState, Error,
    database_id::DatabaseId,
    endpoints,
    event::{Event, get_all_events},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, base, dollar_input_styles, loading_spinner,
    },
    ledger::{
        create::{EntryForm, EntryFormValues, entry_form_fields, validate_entry_form},
        db::{get_entry_by_id, update_entry},
        models::LedgerEntry,
    },
    member::Member,
    navigation::NavBar,
    timezone::get_local_offset,
};

/// The state needed to edit a ledger entry.
#[derive(Debug, Clone)]
pub struct EditEntryState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditEntryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

fn edit_entry_view(
    entry: &LedgerEntry,
    max_date: Date,
    available_events: &[Event],
    viewer: &Member,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::FINANCE_VIEW, viewer.role).into_html();
    let update_url = endpoints::format_endpoint(endpoints::PUT_ENTRY, entry.id);
    let spinner = loading_spinner();

    let values = EntryFormValues {
        kind: Some(entry.kind),
        description: &entry.description,
        unit_price: Some(entry.unit_price),
        quantity: Some(entry.quantity),
        event_id: entry.event_id,
        activity: entry.activity.as_deref(),
        date: Some(entry.date),
    };

    let content = html!(
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            form
                hx-put=(update_url)
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                h2 class="text-xl font-bold" { "Edit Ledger Entry" }

                (entry_form_fields(&values, max_date, available_events))

                button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
                {
                    span id="indicator" class="inline htmx-indicator" { (spinner) }
                    " Save Entry"
                }
            }
        }
    );

    base("Edit Ledger Entry", &[dollar_input_styles()], &content)
}

/// Render the page for editing the ledger entry with `entry_id`.
pub async fn get_edit_entry_page(
    Path(entry_id): Path<DatabaseId>,
    State(state): State<EditEntryState>,
    viewer: Extension<Member>,
) -> Result<Response, Error> {
    let (entry, available_events) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        let entry = get_entry_by_id(entry_id, &connection).inspect_err(|error| {
            tracing::error!("Failed to retrieve ledger entry {entry_id}: {error}")
        })?;
        let events = get_all_events(&connection).inspect_err(|error| {
            tracing::error!("Failed to retrieve events for edit entry page: {error}")
        })?;

        (entry, events)
    };

    let local_timezone = get_local_offset(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone)
    })?;

    let max_date = OffsetDateTime::now_utc().to_offset(local_timezone).date();

    Ok(edit_entry_view(&entry, max_date, &available_events, &viewer.0).into_response())
}

/// Overwrite the ledger entry with `entry_id`, redirecting to the finance
/// view on success.
pub async fn update_entry_endpoint(
    Path(entry_id): Path<DatabaseId>,
    State(state): State<EditEntryState>,
    Form(form): Form<EntryForm>,
) -> Response {
    let Some(local_timezone) = get_local_offset(&state.local_timezone) else {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        return Error::InvalidTimezoneError(state.local_timezone).into_alert_response();
    };

    let today = OffsetDateTime::now_utc().to_offset(local_timezone).date();

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let entry = match validate_entry_form(form, today, &connection) {
        Ok(entry) => entry,
        Err(error) => return error.into_alert_response(),
    };

    match update_entry(entry_id, entry, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::FINANCE_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(Error::UpdateMissingEntry) => Error::UpdateMissingEntry.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while updating ledger entry {entry_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}
