//! The events list page with search and date-range filtering.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error, endpoints,
    event::{Event, get_all_events},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, edit_delete_action_links, link,
    },
    listing::{ListFilter, ListOutcome, apply_filters},
    member::{Member, Role},
    navigation::NavBar,
};

/// The state needed for the events list page.
#[derive(Debug, Clone)]
pub struct EventsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EventsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query parameters for the events list page.
#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    /// Case-insensitive search over names, locations, and descriptions.
    pub search: Option<String>,
    /// Inclusive lower bound on the event date.
    pub date_from: Option<Date>,
    /// Inclusive upper bound on the event date.
    pub date_to: Option<Date>,
}

/// Render the events list, narrowed by the query's search and date range.
pub async fn get_events_page(
    State(state): State<EventsPageState>,
    Query(query): Query<EventsQuery>,
    viewer: axum::Extension<Member>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let events = get_all_events(&connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve events: {error}"))?;
    drop(connection);

    let filter = ListFilter {
        search: query.search.clone().unwrap_or_default(),
        date_from: query.date_from,
        date_to: query.date_to,
        ..Default::default()
    };
    let filtered = apply_filters(&events, &filter);

    Ok(events_view(&filtered.visible, filtered.outcome, &query, &viewer.0).into_response())
}

fn events_view(
    events: &[&Event],
    outcome: ListOutcome,
    query: &EventsQuery,
    viewer: &Member,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::EVENTS_VIEW, viewer.role).into_html();
    let search = query.search.as_deref().unwrap_or_default();
    let is_officer = viewer.role >= Role::Officer;

    let table_row = |event: &Event| {
        let edit_url = endpoints::format_endpoint(endpoints::EDIT_EVENT_VIEW, event.id);
        let delete_url = endpoints::format_endpoint(endpoints::DELETE_EVENT, event.id);
        let confirm_message = format!("Are you sure you want to delete {}?", event.name);

        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE) { (event.date) }
                td class=(TABLE_CELL_STYLE) { (event.name) }
                td class=(TABLE_CELL_STYLE) { (event.location) }
                td class=(TABLE_CELL_STYLE) { (event.description) }

                @if is_officer {
                    td class=(TABLE_CELL_STYLE)
                    {
                        (edit_delete_action_links(
                            &edit_url,
                            &delete_url,
                            &confirm_message,
                            "closest tr",
                            "delete",
                        ))
                    }
                }
            }
        )
    };

    let empty_state = match outcome {
        ListOutcome::Populated => None,
        ListOutcome::EmptyFiltered => {
            Some("No events match your filters. Try clearing the search or date range.")
        }
        ListOutcome::EmptyInitial => Some("No events have been scheduled yet."),
    };
    let column_count = if is_officer { 5 } else { 4 };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Events" }

                    @if is_officer {
                        (link(endpoints::NEW_EVENT_VIEW, "New Event"))
                    }
                }

                form method="get" action=(endpoints::EVENTS_VIEW)
                    class="flex flex-wrap gap-2 items-center"
                {
                    input
                        type="search"
                        name="search"
                        value=(search)
                        placeholder="Search events"
                        class=(FORM_TEXT_INPUT_STYLE);

                    input
                        type="date"
                        name="date_from"
                        value=[query.date_from]
                        class=(FORM_TEXT_INPUT_STYLE);

                    input
                        type="date"
                        name="date_to"
                        value=[query.date_to]
                        class=(FORM_TEXT_INPUT_STYLE);

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
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Location" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Details" }

                                @if is_officer {
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                                }
                            }
                        }

                        tbody
                        {
                            @for event in events {
                                (table_row(event))
                            }

                            @if let Some(message) = empty_state {
                                tr
                                {
                                    td
                                        colspan=(column_count)
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

    base("Events", &[], &content)
}

#[cfg(test)]
mod events_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Query, State},
    };
    use rusqlite::Connection;
    use scraper::Selector;
    use time::macros::date;

    use crate::{
        event::{NewEvent, create_event, create_event_table},
        member::{Member, MemberId, PasswordHash, Role},
        test_utils::{assert_valid_html, parse_html_document},
    };

    use super::{EventsPageState, EventsQuery, get_events_page};

    fn viewer(role: Role) -> Member {
        Member {
            id: MemberId::new(1),
            email: "viewer@test.org".to_owned(),
            password_hash: PasswordHash::new_unchecked("hash"),
            full_name: "The Viewer".to_owned(),
            section: "Brass".to_owned(),
            role,
            verified: true,
        }
    }

    fn get_test_state() -> EventsPageState {
        let connection = Connection::open_in_memory().unwrap();
        create_event_table(&connection).unwrap();

        for (name, date) in [
            ("Spring Fest", date!(2024 - 06 - 01)),
            ("Winter Gala", date!(2024 - 12 - 01)),
        ] {
            create_event(
                NewEvent::build(name, "Main Quad", "details", date).unwrap(),
                &connection,
            )
            .unwrap();
        }

        EventsPageState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    async fn render(state: EventsPageState, viewer: Member, query: EventsQuery) -> scraper::Html {
        let response = get_events_page(State(state), Query(query), Extension(viewer))
            .await
            .expect("Could not render events page");

        parse_html_document(response).await
    }

    fn row_count(document: &scraper::Html) -> usize {
        let selector = Selector::parse("tbody tr").unwrap();
        document.select(&selector).count()
    }

    #[tokio::test]
    async fn events_page_lists_events() {
        let state = get_test_state();

        let document = render(state, viewer(Role::Member), EventsQuery::default()).await;

        assert_valid_html(&document);
        assert_eq!(row_count(&document), 2);
    }

    #[tokio::test]
    async fn search_narrows_events() {
        let state = get_test_state();

        let document = render(
            state,
            viewer(Role::Member),
            EventsQuery {
                search: Some("gala".to_owned()),
                ..Default::default()
            },
        )
        .await;

        assert_eq!(row_count(&document), 1);
    }

    #[tokio::test]
    async fn date_range_narrows_events() {
        let state = get_test_state();

        let document = render(
            state,
            viewer(Role::Member),
            EventsQuery {
                date_from: Some(date!(2024 - 11 - 01)),
                date_to: Some(date!(2024 - 12 - 31)),
                ..Default::default()
            },
        )
        .await;

        assert_eq!(row_count(&document), 1);
    }

    #[tokio::test]
    async fn members_do_not_see_action_links() {
        let state = get_test_state();

        let document = render(state, viewer(Role::Member), EventsQuery::default()).await;

        let delete_selector = Selector::parse("button[hx-delete]").unwrap();
        assert_eq!(document.select(&delete_selector).count(), 0);
    }

    #[tokio::test]
    async fn officers_see_action_links() {
        let state = get_test_state();

        let document = render(state, viewer(Role::Officer), EventsQuery::default()).await;

        let delete_selector = Selector::parse("button[hx-delete]").unwrap();
        assert_eq!(document.select(&delete_selector).count(), 2);
    }

    #[tokio::test]
    async fn filtered_out_everything_shows_no_match_message() {
        let state = get_test_state();

        let document = render(
            state,
            viewer(Role::Member),
            EventsQuery {
                search: Some("no such event".to_owned()),
                ..Default::default()
            },
        )
        .await;

        let cell_selector = Selector::parse("tbody td").unwrap();
        let text = document
            .select(&cell_selector)
            .next()
            .expect("expected empty state cell")
            .text()
            .collect::<String>();
        assert!(text.contains("No events match"), "got {text:?}");
    }
}
