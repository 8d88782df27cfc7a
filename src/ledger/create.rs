//! The page and endpoint for recording a new ledger entry.

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
use time::{Date, OffsetDateTime};

use crate::{
    AppState, Error,
    database_id::DatabaseId,
    endpoints,
    event::{Event, get_all_events, get_event_by_id},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_RADIO_INPUT_STYLE,
        FORM_RADIO_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base, dollar_input_styles, loading_spinner,
    },
    ledger::{
        db::create_entry,
        models::{EntryKind, NewLedgerEntry},
    },
    member::Member,
    navigation::NavBar,
    timezone::get_local_offset,
};

/// The state needed to show the new-entry form and create entries.
#[derive(Debug, Clone)]
pub struct CreateEntryState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateEntryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The prefill values for the ledger entry form.
#[derive(Debug, Default)]
pub(super) struct EntryFormValues<'a> {
    pub kind: Option<EntryKind>,
    pub description: &'a str,
    pub unit_price: Option<f64>,
    pub quantity: Option<i64>,
    pub event_id: Option<DatabaseId>,
    pub activity: Option<&'a str>,
    pub date: Option<Date>,
}

pub(super) fn entry_form_fields(
    values: &EntryFormValues<'_>,
    max_date: Date,
    available_events: &[Event],
) -> Markup {
    let kind = values.kind.unwrap_or(EntryKind::Revenue);

    html!(
        div
        {
            span class=(FORM_LABEL_STYLE) { "Kind" }

            div class="flex gap-x-6"
            {
                @for (entry_kind, label) in [
                    (EntryKind::Revenue, "Revenue"),
                    (EntryKind::Expense, "Expense"),
                ] {
                    label class=(FORM_RADIO_LABEL_STYLE)
                    {
                        input
                            type="radio"
                            name="kind"
                            value=(entry_kind.as_str())
                            checked[kind == entry_kind]
                            class=(FORM_RADIO_INPUT_STYLE);

                        (label)
                    }
                }
            }
        }

        div
        {
            label for="description" class=(FORM_LABEL_STYLE) { "Description" }

            input
                name="description"
                id="description"
                type="text"
                value=(values.description)
                required
                autofocus
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="unit_price" class=(FORM_LABEL_STYLE) { "Unit price" }

            // w-full needed to ensure input takes the full width when prefilled with a value
            div class="input-wrapper w-full"
            {
                input
                    name="unit_price"
                    id="unit_price"
                    type="number"
                    step="0.01"
                    min="0"
                    placeholder="0.00"
                    value=[values.unit_price]
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }
        }

        div
        {
            label for="quantity" class=(FORM_LABEL_STYLE) { "Quantity" }

            input
                name="quantity"
                id="quantity"
                type="number"
                min="0"
                step="1"
                value=[values.quantity]
                required
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="event_id" class=(FORM_LABEL_STYLE) { "Event" }

            select name="event_id" id="event_id" class=(FORM_TEXT_INPUT_STYLE)
            {
                option value="" { "No event" }

                @for event in available_events {
                    option value=(event.id) selected[values.event_id == Some(event.id)]
                    {
                        (event.name) " (" (event.date) ")"
                    }
                }
            }
        }

        div
        {
            label for="activity" class=(FORM_LABEL_STYLE) { "Activity" }

            input
                name="activity"
                id="activity"
                type="text"
                placeholder="e.g. Bake Sale"
                value=[values.activity]
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="date" class=(FORM_LABEL_STYLE) { "Date" }

            input
                name="date"
                id="date"
                type="date"
                max=(max_date)
                value=(values.date.unwrap_or(max_date))
                required
                class=(FORM_TEXT_INPUT_STYLE);
        }
    )
}

fn create_entry_view(max_date: Date, available_events: &[Event], viewer: &Member) -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_ENTRY_VIEW, viewer.role).into_html();
    let spinner = loading_spinner();

    let content = html!(
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            form
                hx-post=(endpoints::POST_ENTRY)
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                h2 class="text-xl font-bold" { "New Ledger Entry" }

                (entry_form_fields(&EntryFormValues::default(), max_date, available_events))

                button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
                {
                    span id="indicator" class="inline htmx-indicator" { (spinner) }
                    " Create Entry"
                }
            }
        }
    );

    base("Create Ledger Entry", &[dollar_input_styles()], &content)
}

/// Render the page for recording a ledger entry.
pub async fn get_new_entry_page(
    State(state): State<CreateEntryState>,
    viewer: Extension<Member>,
) -> Result<Response, Error> {
    let available_events = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_all_events(&connection).inspect_err(|error| {
            tracing::error!("Failed to retrieve events for new entry page: {error}")
        })?
    };

    let local_timezone = get_local_offset(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone)
    })?;

    let max_date = OffsetDateTime::now_utc().to_offset(local_timezone).date();

    Ok(create_entry_view(max_date, &available_events, &viewer.0).into_response())
}

/// The form data for creating or updating a ledger entry.
#[derive(Debug, Deserialize)]
pub struct EntryForm {
    pub kind: String,
    pub description: String,
    pub unit_price: f64,
    pub quantity: i64,
    #[serde(default)]
    pub event_id: Option<DatabaseId>,
    #[serde(default)]
    pub activity: Option<String>,
    pub date: Date,
}

/// Validate `form` into a [NewLedgerEntry], checking that any selected event
/// exists.
pub(super) fn validate_entry_form(
    form: EntryForm,
    today: Date,
    connection: &Connection,
) -> Result<NewLedgerEntry, Error> {
    let Some(kind) = EntryKind::from_str(&form.kind) else {
        return Err(Error::EmptyField("Kind"));
    };

    if let Some(event_id) = form.event_id {
        get_event_by_id(event_id, connection).map_err(|error| match error {
            Error::NotFound => Error::InvalidEvent,
            error => error,
        })?;
    }

    NewLedgerEntry::build(
        kind,
        &form.description,
        form.unit_price,
        form.quantity,
        form.event_id,
        form.activity,
        form.date,
        today,
    )
}

/// Create a new ledger entry, redirecting to the finance view on success.
pub async fn create_entry_endpoint(
    State(state): State<CreateEntryState>,
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

    if let Err(error) = create_entry(entry, &connection) {
        tracing::error!("could not create ledger entry: {error}");

        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::FINANCE_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
