//! The officer review queue for submitted stories.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    alert::AlertTemplate,
    database_id::DatabaseId,
    endpoints,
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
    },
    listing::{ListFilter, ListOutcome, apply_filters},
    member::Member,
    navigation::NavBar,
    shared_templates::render,
    story::{
        db::{get_pending_stories, set_story_status},
        models::{PendingStory, StoryStatus},
    },
};

/// The state needed for the story review queue.
#[derive(Debug, Clone)]
pub struct ReviewStoriesState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ReviewStoriesState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query parameters for the review queue.
#[derive(Debug, Default, Deserialize)]
pub struct ReviewQuery {
    /// Case-insensitive search over titles, story text and author names.
    pub search: Option<String>,
}

fn story_row(story: &PendingStory) -> Markup {
    let approve_url = endpoints::format_endpoint(endpoints::APPROVE_STORY, story.id);
    let reject_url = endpoints::format_endpoint(endpoints::REJECT_STORY, story.id);

    html!(
        tr class=(TABLE_ROW_STYLE)
        {
            td class=(TABLE_CELL_STYLE) { (story.author_name) }
            td class=(TABLE_CELL_STYLE) { (story.title) }
            td class=(TABLE_CELL_STYLE) { (story.body) }
            td class=(TABLE_CELL_STYLE) { (story.submitted_at) }

            td class=(TABLE_CELL_STYLE)
            {
                div class="flex gap-4"
                {
                    button
                        type="button"
                        class=(LINK_STYLE)
                        hx-post=(approve_url)
                        hx-target="closest tr"
                        hx-swap="delete"
                    {
                        "Approve"
                    }

                    button
                        type="button"
                        class=(BUTTON_DELETE_STYLE)
                        hx-post=(reject_url)
                        hx-target="closest tr"
                        hx-swap="delete"
                    {
                        "Reject"
                    }
                }
            }
        }
    )
}

fn review_stories_view(
    stories: &[&PendingStory],
    outcome: ListOutcome,
    query: &ReviewQuery,
    viewer: &Member,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::REVIEW_STORIES_VIEW, viewer.role).into_html();
    let search = query.search.as_deref().unwrap_or_default();

    let empty_state = match outcome {
        ListOutcome::Populated => None,
        ListOutcome::EmptyFiltered => Some("No pending stories match your search."),
        ListOutcome::EmptyInitial => Some("No stories are waiting for review."),
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 lg:max-w-5xl lg:w-full lg:mx-auto"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Review Stories" }

                    p class="text-sm text-gray-500 dark:text-gray-400"
                    {
                        "Oldest submissions first."
                    }
                }

                form method="get" action=(endpoints::REVIEW_STORIES_VIEW)
                    class="flex flex-wrap gap-2 items-center"
                {
                    input
                        type="search"
                        name="search"
                        value=(search)
                        placeholder="Search stories"
                        class=(FORM_TEXT_INPUT_STYLE);

                    button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Filter" }
                }

                section class="dark:bg-gray-800"
                {
                    table class="w-full text-sm text-left rtl:text-right
                        text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Author" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Title" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Story" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Submitted" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for story in stories {
                                (story_row(story))
                            }

                            @if let Some(message) = empty_state {
                                tr
                                {
                                    td
                                        colspan="5"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        (message)
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Review Stories", &[], &content)
}

/// Render the pending story queue, narrowed by the query's search.
pub async fn get_review_stories_page(
    State(state): State<ReviewStoriesState>,
    Query(query): Query<ReviewQuery>,
    viewer: Extension<Member>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let stories = get_pending_stories(&connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve pending stories: {error}"))?;
    drop(connection);

    let filter = ListFilter {
        search: query.search.clone().unwrap_or_default(),
        ..Default::default()
    };
    let filtered = apply_filters(&stories, &filter);

    Ok(review_stories_view(&filtered.visible, filtered.outcome, &query, &viewer.0).into_response())
}

fn review_story(story_id: DatabaseId, status: StoryStatus, state: &ReviewStoriesState) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match set_story_status(story_id, status, &connection) {
        Ok(()) => {}
        Err(Error::UpdateMissingStory) => return Error::UpdateMissingStory.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while reviewing story {story_id}: {error}"
            );
            return error.into_alert_response();
        }
    }

    match status {
        StoryStatus::Approved => render(
            StatusCode::OK,
            AlertTemplate::success("Story approved", "The story will appear on the landing page."),
        ),
        _ => render(
            StatusCode::OK,
            AlertTemplate::success("Story rejected", "The story has been rejected."),
        ),
    }
}

/// Approve the story with `story_id` for the public landing page.
pub async fn approve_story_endpoint(
    Path(story_id): Path<DatabaseId>,
    State(state): State<ReviewStoriesState>,
) -> Response {
    review_story(story_id, StoryStatus::Approved, &state)
}

/// Reject the story with `story_id`.
pub async fn reject_story_endpoint(
    Path(story_id): Path<DatabaseId>,
    State(state): State<ReviewStoriesState>,
) -> Response {
    review_story(story_id, StoryStatus::Rejected, &state)
}
