//! The page and endpoint for submitting a story.

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
use time::OffsetDateTime;

use crate::{
    AppState, Error, endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
        loading_spinner,
    },
    member::Member,
    navigation::NavBar,
    story::{db::create_story, models::NewStory},
    timezone::get_local_offset,
};

/// The state needed to submit a story.
#[derive(Debug, Clone)]
pub struct SubmitStoryState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SubmitStoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

fn submit_story_view(viewer: &Member) -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_STORY_VIEW, viewer.role).into_html();
    let spinner = loading_spinner();

    let content = html!(
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            form
                hx-post=(endpoints::POST_STORY)
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                h2 class="text-xl font-bold" { "Submit Story" }

                p class="text-sm text-gray-500 dark:text-gray-400"
                {
                    "Approved stories appear on the public landing page."
                }

                div
                {
                    label for="title" class=(FORM_LABEL_STYLE) { "Title" }

                    input
                        name="title"
                        id="title"
                        type="text"
                        required
                        autofocus
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="body" class=(FORM_LABEL_STYLE) { "Story" }

                    textarea
                        name="body"
                        id="body"
                        rows="8"
                        required
                        class=(FORM_TEXT_INPUT_STYLE)
                    {}
                }

                button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
                {
                    span id="indicator" class="inline htmx-indicator" { (spinner) }
                    " Submit Story"
                }
            }
        }
    );

    base("Submit Story", &[], &content)
}

/// Render the page for submitting a story.
pub async fn get_new_story_page(viewer: Extension<Member>) -> Response {
    submit_story_view(&viewer.0).into_response()
}

/// The form data for submitting a story.
#[derive(Debug, Deserialize)]
pub struct StoryForm {
    pub title: String,
    pub body: String,
}

/// Submit a story for review, redirecting to the member's own stories on
/// success.
pub async fn submit_story_endpoint(
    State(state): State<SubmitStoryState>,
    viewer: Extension<Member>,
    Form(form): Form<StoryForm>,
) -> Response {
    let Some(local_timezone) = get_local_offset(&state.local_timezone) else {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        return Error::InvalidTimezoneError(state.local_timezone).into_alert_response();
    };
    let today = OffsetDateTime::now_utc().to_offset(local_timezone).date();

    let story = match NewStory::build(viewer.id, &form.title, &form.body, today) {
        Ok(story) => story,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    if let Err(error) = create_story(story, &connection) {
        tracing::error!("could not create story: {error}");

        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::MY_STORIES_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
