//! The member directory page.
//!
//! Every member can browse the directory, narrow it with a name/email search
//! and a section filter, and page through long member lists.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error, endpoints,
    html::{
        BADGE_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
    },
    listing::{Filterable, ListFilter, ListOutcome, apply_filters},
    member::{Member, get_all_members},
    navigation::NavBar,
    pagination::{PaginationConfig, PaginationIndicator, create_pagination_indicators, page_count},
};

impl Filterable for Member {
    fn matches_search(&self, term: &str) -> bool {
        self.full_name.to_lowercase().contains(term) || self.email.to_lowercase().contains(term)
    }

    fn category(&self) -> &str {
        &self.section
    }
}

/// The state needed for the member directory page.
#[derive(Debug, Clone)]
pub struct DirectoryState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for DirectoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// The query parameters for the directory page.
#[derive(Debug, Default, Deserialize)]
pub struct DirectoryQuery {
    /// Case-insensitive search over names and email addresses.
    pub search: Option<String>,
    /// Section to filter by; absent or "all" shows every section.
    pub section: Option<String>,
    /// The page of members to display, starting from 1.
    pub page: Option<u64>,
}

/// Render the member directory with search, section filter, and pagination.
pub async fn get_directory_page(
    State(state): State<DirectoryState>,
    Query(query): Query<DirectoryQuery>,
    member: axum::Extension<Member>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let members = get_all_members(&connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve members: {error}"))?;
    drop(connection);

    let mut sections: Vec<String> = members.iter().map(|member| member.section.clone()).collect();
    sections.sort();
    sections.dedup();

    let filter = ListFilter {
        search: query.search.clone().unwrap_or_default(),
        category: ListFilter::parse_category(query.section.clone()),
        ..Default::default()
    };
    let filtered = apply_filters(&members, &filter);

    let page_size = state.pagination_config.default_page_size;
    let page_count = page_count(filtered.visible.len() as u64, page_size);
    let curr_page = query
        .page
        .unwrap_or(state.pagination_config.default_page)
        .clamp(1, page_count);
    let visible_page: Vec<&Member> = filtered
        .visible
        .iter()
        .skip(((curr_page - 1) * page_size) as usize)
        .take(page_size as usize)
        .copied()
        .collect();

    let indicators =
        create_pagination_indicators(curr_page, page_count, state.pagination_config.max_pages);

    Ok(directory_view(
        &visible_page,
        filtered.outcome,
        &sections,
        &query,
        &indicators,
        &member.0,
    )
    .into_response())
}

fn directory_view(
    members: &[&Member],
    outcome: ListOutcome,
    sections: &[String],
    query: &DirectoryQuery,
    indicators: &[PaginationIndicator],
    viewer: &Member,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::DIRECTORY_VIEW, viewer.role).into_html();
    let search = query.search.as_deref().unwrap_or_default();
    let selected_section = query.section.as_deref().unwrap_or("all");

    let table_row = |member: &Member| {
        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE) { (member.full_name) }
                td class=(TABLE_CELL_STYLE) { (member.email) }
                td class=(TABLE_CELL_STYLE)
                {
                    span class=(BADGE_STYLE) { (member.section) }
                }
                td class=(TABLE_CELL_STYLE) { (member.role) }
            }
        )
    };

    let empty_state = match outcome {
        ListOutcome::Populated => None,
        ListOutcome::EmptyFiltered => {
            Some("No members match your filters. Try clearing the search or section.")
        }
        ListOutcome::EmptyInitial => Some("No members have registered yet."),
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Directory" }
                }

                form method="get" action=(endpoints::DIRECTORY_VIEW)
                    class="flex flex-wrap gap-2 items-center"
                {
                    input
                        type="search"
                        name="search"
                        value=(search)
                        placeholder="Search by name or email"
                        class=(FORM_TEXT_INPUT_STYLE);

                    select name="section" class=(FORM_TEXT_INPUT_STYLE)
                    {
                        option value="all" selected[selected_section == "all"] { "All sections" }

                        @for section in sections {
                            option value=(section) selected[selected_section == section]
                            {
                                (section)
                            }
                        }
                    }

                    button
                        type="submit"
                        class="px-4 py-2 bg-blue-500 dark:bg-blue-600 text-white rounded"
                    {
                        "Filter"
                    }
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
                                th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Email" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Section" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Role" }
                            }
                        }

                        tbody
                        {
                            @for member in members {
                                (table_row(member))
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

                (pagination_nav(indicators, search, selected_section))
            }
        }
    );

    base("Directory", &[], &content)
}

fn page_url(page: u64, search: &str, section: &str) -> String {
    let query = serde_urlencoded::to_string([
        ("search", search),
        ("section", section),
        ("page", &page.to_string()),
    ])
    .unwrap_or_default();

    format!("{}?{}", endpoints::DIRECTORY_VIEW, query)
}

fn pagination_nav(indicators: &[PaginationIndicator], search: &str, section: &str) -> Markup {
    html!(
        nav class="flex justify-center gap-2" aria-label="Pagination"
        {
            @for indicator in indicators {
                @match indicator {
                    PaginationIndicator::BackButton(page) => {
                        a href=(page_url(*page, search, section)) class=(LINK_STYLE) { "Back" }
                    }
                    PaginationIndicator::NextButton(page) => {
                        a href=(page_url(*page, search, section)) class=(LINK_STYLE) { "Next" }
                    }
                    PaginationIndicator::Page(page) => {
                        a href=(page_url(*page, search, section)) class=(LINK_STYLE) { (page) }
                    }
                    PaginationIndicator::CurrPage(page) => {
                        span class="font-bold" { (page) }
                    }
                    PaginationIndicator::Ellipsis => {
                        span { "…" }
                    }
                }
            }
        }
    )
}

#[cfg(test)]
mod directory_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Query, State},
    };
    use rusqlite::Connection;
    use scraper::Selector;

    use crate::{
        member::{Member, PasswordHash, Role, create_member, create_member_table},
        pagination::PaginationConfig,
        test_utils::{assert_valid_html, parse_html_document},
    };

    use super::{DirectoryQuery, DirectoryState, get_directory_page};

    fn get_test_state(member_count: usize) -> (DirectoryState, Member) {
        let connection =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");
        create_member_table(&connection).expect("Could not create member table");

        let mut viewer = None;
        for i in 0..member_count {
            let section = if i % 2 == 0 { "Brass" } else { "Percussion" };
            let member = create_member(
                &format!("member{i}@test.org"),
                PasswordHash::new_unchecked("hunter2"),
                &format!("Member {i:02}"),
                section,
                Role::Member,
                &connection,
            )
            .expect("Could not create test member");
            viewer.get_or_insert(member);
        }

        let viewer = viewer.unwrap_or_else(|| {
            create_member(
                "viewer@test.org",
                PasswordHash::new_unchecked("hunter2"),
                "The Viewer",
                "Brass",
                Role::Member,
                &connection,
            )
            .expect("Could not create viewer")
        });

        (
            DirectoryState {
                db_connection: Arc::new(Mutex::new(connection)),
                pagination_config: PaginationConfig {
                    default_page: 1,
                    default_page_size: 10,
                    max_pages: 5,
                },
            },
            viewer,
        )
    }

    async fn render(state: DirectoryState, viewer: Member, query: DirectoryQuery) -> scraper::Html {
        let response = get_directory_page(State(state), Query(query), Extension(viewer))
            .await
            .expect("Could not render directory page");

        parse_html_document(response).await
    }

    fn row_count(document: &scraper::Html) -> usize {
        let selector = Selector::parse("tbody tr").unwrap();
        document.select(&selector).count()
    }

    #[tokio::test]
    async fn directory_lists_members() {
        let (state, viewer) = get_test_state(3);

        let document = render(state, viewer, DirectoryQuery::default()).await;

        assert_valid_html(&document);
        assert_eq!(row_count(&document), 3);
    }

    #[tokio::test]
    async fn directory_filters_by_section() {
        let (state, viewer) = get_test_state(4);

        let document = render(
            state,
            viewer,
            DirectoryQuery {
                section: Some("Brass".to_owned()),
                ..Default::default()
            },
        )
        .await;

        assert_eq!(row_count(&document), 2);
    }

    #[tokio::test]
    async fn directory_search_narrows_by_name() {
        let (state, viewer) = get_test_state(5);

        let document = render(
            state,
            viewer,
            DirectoryQuery {
                search: Some("member 03".to_owned()),
                ..Default::default()
            },
        )
        .await;

        assert_eq!(row_count(&document), 1);
    }

    #[tokio::test]
    async fn directory_paginates_long_lists() {
        let (state, viewer) = get_test_state(25);

        let document = render(
            state.clone(),
            viewer.clone(),
            DirectoryQuery {
                page: Some(3),
                ..Default::default()
            },
        )
        .await;

        // 25 members at 10 per page leaves 5 on the third page.
        assert_eq!(row_count(&document), 5);
    }

    #[tokio::test]
    async fn directory_shows_no_match_empty_state() {
        let (state, viewer) = get_test_state(3);

        let document = render(
            state,
            viewer,
            DirectoryQuery {
                search: Some("nobody by this name".to_owned()),
                ..Default::default()
            },
        )
        .await;

        let selector = Selector::parse("tbody td").unwrap();
        let text = document
            .select(&selector)
            .next()
            .expect("expected empty state cell")
            .text()
            .collect::<String>();
        assert!(text.contains("No members match"), "got {text:?}");
    }
}
