//! The public landing page: upcoming events and approved stories, with links
//! to log in or register. No authentication is required.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    AppState, Error, endpoints,
    event::{Event, get_upcoming_events},
    html::{LINK_STYLE, PAGE_CONTAINER_STYLE, base},
    story::{Story, get_approved_stories},
    timezone::get_local_offset,
};

/// How many upcoming events and approved stories the landing page shows.
const LANDING_LIMIT: u32 = 5;

/// The state needed for the landing page.
#[derive(Debug, Clone)]
pub struct LandingState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LandingState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

fn landing_view(events: &[Event], stories: &[Story]) -> Markup {
    let content = html!(
        header class="flex justify-between flex-wrap items-center px-6 py-4
            border-b border-gray-200 dark:border-gray-700"
        {
            h1 class="text-xl font-bold" { "Orghub" }

            nav class="flex gap-4"
            {
                a href=(endpoints::LOG_IN_VIEW) class=(LINK_STYLE) { "Log in" }
                a href=(endpoints::REGISTER_VIEW) class=(LINK_STYLE) { "Register" }
            }
        }

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-8 lg:max-w-5xl lg:w-full lg:mx-auto"
            {
                section class="space-y-4"
                {
                    h2 class="text-lg font-bold" { "Upcoming Events" }

                    @if events.is_empty() {
                        p class="text-gray-500 dark:text-gray-400"
                        {
                            "No upcoming events are scheduled."
                        }
                    }

                    @for event in events {
                        article class="space-y-1"
                        {
                            h3 class="font-medium" { (event.name) }

                            p class="text-sm text-gray-500 dark:text-gray-400"
                            {
                                (event.date) " at " (event.location)
                            }

                            p { (event.description) }
                        }
                    }
                }

                section class="space-y-4"
                {
                    h2 class="text-lg font-bold" { "Stories" }

                    @if stories.is_empty() {
                        p class="text-gray-500 dark:text-gray-400"
                        {
                            "No stories have been published yet."
                        }
                    }

                    @for story in stories {
                        article class="space-y-1"
                        {
                            h3 class="font-medium" { (story.title) }

                            p class="text-sm text-gray-500 dark:text-gray-400"
                            {
                                (story.submitted_at)
                            }

                            p { (story.body) }
                        }
                    }
                }
            }
        }
    );

    base("Orghub", &[], &content)
}

/// Render the public landing page with the next few events and the most
/// recently approved stories.
pub async fn get_landing_page(State(state): State<LandingState>) -> Result<Response, Error> {
    let local_timezone = get_local_offset(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone.clone())
    })?;
    let today = OffsetDateTime::now_utc().to_offset(local_timezone).date();

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let events = get_upcoming_events(today, LANDING_LIMIT, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve upcoming events: {error}"))?;
    let stories = get_approved_stories(LANDING_LIMIT, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve approved stories: {error}"))?;
    drop(connection);

    Ok(landing_view(&events, &stories).into_response())
}
