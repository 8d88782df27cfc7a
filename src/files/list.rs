//! The shared files list page with search and category filtering.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error, endpoints,
    files::{db::get_all_files, models::FileRecord},
    html::{
        BADGE_STYLE, BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, link,
    },
    listing::{ListFilter, ListOutcome, apply_filters},
    member::{Member, Role},
    navigation::NavBar,
};

/// The state needed for the files list page.
#[derive(Debug, Clone)]
pub struct FilesPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for FilesPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query parameters for the files list page.
#[derive(Debug, Default, Deserialize)]
pub struct FilesQuery {
    /// Case-insensitive search over titles and file names.
    pub search: Option<String>,
    /// Exact-match category, where "all" or absent means every category.
    pub category: Option<String>,
}

/// Render the shared files list, narrowed by the query's search and category.
pub async fn get_files_page(
    State(state): State<FilesPageState>,
    Query(query): Query<FilesQuery>,
    viewer: Extension<Member>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let files = get_all_files(&connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve shared files: {error}"))?;
    drop(connection);

    let filter = ListFilter {
        search: query.search.clone().unwrap_or_default(),
        category: ListFilter::parse_category(query.category.clone()),
        ..Default::default()
    };
    let filtered = apply_filters(&files, &filter);

    let mut categories: Vec<&str> = files.iter().map(|file| file.category.as_str()).collect();
    categories.sort_unstable();
    categories.dedup();

    Ok(
        files_view(&filtered.visible, filtered.outcome, &categories, &query, &viewer.0)
            .into_response(),
    )
}

fn files_view(
    files: &[&FileRecord],
    outcome: ListOutcome,
    categories: &[&str],
    query: &FilesQuery,
    viewer: &Member,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::FILES_VIEW, viewer.role).into_html();
    let search = query.search.as_deref().unwrap_or_default();
    let selected_category = query.category.as_deref().unwrap_or("all");
    let is_officer = viewer.role >= Role::Officer;

    let table_row = |file: &FileRecord| {
        let download_url = format!("{}/{}", endpoints::DOWNLOADS, file.file_name);
        let delete_url = endpoints::format_endpoint(endpoints::DELETE_FILE, file.id);
        let confirm_message = format!("Are you sure you want to delete {}?", file.title);

        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE) { (file.title) }
                td class=(TABLE_CELL_STYLE) { span class=(BADGE_STYLE) { (file.category) } }
                td class=(TABLE_CELL_STYLE) { (file.uploaded_at) }

                td class=(TABLE_CELL_STYLE)
                {
                    a href=(download_url) download class=(LINK_STYLE) { "Download" }

                    @if is_officer {
                        " "
                        button
                            type="button"
                            class=(BUTTON_DELETE_STYLE)
                            hx-delete=(delete_url)
                            hx-confirm=(confirm_message)
                            hx-target="closest tr"
                            hx-swap="delete"
                        {
                            "Delete"
                        }
                    }
                }
            }
        )
    };

    let empty_state = match outcome {
        ListOutcome::Populated => None,
        ListOutcome::EmptyFiltered => {
            Some("No files match your filters. Try clearing the search or category.")
        }
        ListOutcome::EmptyInitial => Some("No files have been shared yet."),
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Shared Files" }

                    @if is_officer {
                        (link(endpoints::UPLOAD_FILE_VIEW, "Upload File"))
                    }
                }

                form method="get" action=(endpoints::FILES_VIEW)
                    class="flex flex-wrap gap-2 items-center"
                {
                    input
                        type="search"
                        name="search"
                        value=(search)
                        placeholder="Search files"
                        class=(FORM_TEXT_INPUT_STYLE);

                    select name="category" class=(FORM_TEXT_INPUT_STYLE)
                    {
                        option value="all" selected[selected_category == "all"]
                        {
                            "All categories"
                        }

                        @for category in categories {
                            option
                                value=(category)
                                selected[*category == selected_category]
                            {
                                (category)
                            }
                        }
                    }

                    button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Filter" }
                }

                section class="dark:bg-gray-800 lg:max-w-5xl lg:w-full lg:mx-auto"
                {
                    table class="w-full text-sm text-left rtl:text-right
                        text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Title" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Uploaded" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for file in files {
                                (table_row(file))
                            }

                            @if let Some(message) = empty_state {
                                tr
                                {
                                    td
                                        colspan="4"
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

    base("Shared Files", &[], &content)
}
