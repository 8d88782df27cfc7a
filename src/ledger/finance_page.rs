//! The finance overview page: per-activity summaries, the full list of ledger
//! entries, and the member's saved date-range filter.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    database_id::DatabaseId,
    endpoints,
    event::get_event_names,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, edit_delete_action_links, format_currency, link,
    },
    ledger::{
        aggregation::{ActivitySummary, UNKNOWN_EVENT_LABEL, aggregate},
        db::get_entries_by_kind,
        models::{EntryKind, LedgerEntry},
    },
    member::Member,
    navigation::NavBar,
    preferences::{FinanceRange, get_finance_range, save_finance_range},
};

/// The state needed for the finance page.
#[derive(Debug, Clone)]
pub struct FinancePageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for FinancePageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the finance page for the signed-in officer.
///
/// Entries are narrowed to the member's saved date range before aggregation,
/// so the summary table and the entry list always agree.
pub async fn get_finance_page(
    State(state): State<FinancePageState>,
    viewer: Extension<Member>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let range = get_finance_range(viewer.id, &connection)
        .inspect_err(|error| tracing::error!("Failed to load finance range: {error}"))?;
    let revenues = get_entries_by_kind(EntryKind::Revenue, range.date_from, range.date_to, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve revenue entries: {error}"))?;
    let expenses = get_entries_by_kind(EntryKind::Expense, range.date_from, range.date_to, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve expense entries: {error}"))?;
    let event_names = get_event_names(&connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve event names: {error}"))?;
    drop(connection);

    let summaries = aggregate(&revenues, &expenses, &event_names);

    Ok(finance_view(&summaries, &revenues, &expenses, &event_names, range, &viewer.0)
        .into_response())
}

fn summary_table(summaries: &[ActivitySummary]) -> Markup {
    let total_revenue: f64 = summaries.iter().map(|s| s.total_revenue).sum();
    let total_expense: f64 = summaries.iter().map(|s| s.total_expense).sum();
    let net = total_revenue - total_expense;

    html!(
        table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
        {
            thead class=(TABLE_HEADER_STYLE)
            {
                tr
                {
                    th scope="col" class=(TABLE_CELL_STYLE) { "Activity" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Revenue" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Expense" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Net" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Last entry" }
                }
            }

            tbody
            {
                @for summary in summaries {
                    tr class=(TABLE_ROW_STYLE)
                    {
                        td class=(TABLE_CELL_STYLE) { (summary.name) }
                        td class=(TABLE_CELL_STYLE) { (format_currency(summary.total_revenue)) }
                        td class=(TABLE_CELL_STYLE) { (format_currency(summary.total_expense)) }
                        td class=(TABLE_CELL_STYLE) { (format_currency(summary.net())) }
                        td class=(TABLE_CELL_STYLE) { (summary.last_date) }
                    }
                }

                @if summaries.is_empty() {
                    tr
                    {
                        td
                            colspan="5"
                            class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                        {
                            "No entries in the selected range."
                        }
                    }
                } @else {
                    tr class="font-semibold text-gray-900 dark:text-white"
                    {
                        td class=(TABLE_CELL_STYLE) { "Total" }
                        td class=(TABLE_CELL_STYLE) { (format_currency(total_revenue)) }
                        td class=(TABLE_CELL_STYLE) { (format_currency(total_expense)) }
                        td class=(TABLE_CELL_STYLE) { (format_currency(net)) }
                        td class=(TABLE_CELL_STYLE) {}
                    }
                }
            }
        }
    )
}

fn entry_group_label(entry: &LedgerEntry, event_names: &HashMap<DatabaseId, String>) -> String {
    match (entry.event_id, entry.activity.as_deref()) {
        (Some(event_id), _) => event_names
            .get(&event_id)
            .cloned()
            .unwrap_or_else(|| UNKNOWN_EVENT_LABEL.to_owned()),
        (None, Some(activity)) => activity.to_owned(),
        (None, None) => String::new(),
    }
}

fn entries_table(entries: &[&LedgerEntry], event_names: &HashMap<DatabaseId, String>) -> Markup {
    let table_row = |entry: &LedgerEntry| {
        let edit_url = endpoints::format_endpoint(endpoints::EDIT_ENTRY_VIEW, entry.id);
        let delete_url = endpoints::format_endpoint(endpoints::DELETE_ENTRY, entry.id);
        let confirm_message = format!("Are you sure you want to delete {}?", entry.description);

        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE) { (entry.date) }
                td class=(TABLE_CELL_STYLE) { (entry.kind.as_str()) }
                td class=(TABLE_CELL_STYLE) { (entry.description) }
                td class=(TABLE_CELL_STYLE) { (format_currency(entry.amount())) }
                td class=(TABLE_CELL_STYLE) { (entry_group_label(entry, event_names)) }

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
        )
    };

    html!(
        table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
        {
            thead class=(TABLE_HEADER_STYLE)
            {
                tr
                {
                    th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Kind" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Event / Activity" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                }
            }

            tbody
            {
                @for entry in entries {
                    (table_row(entry))
                }

                @if entries.is_empty() {
                    tr
                    {
                        td
                            colspan="6"
                            class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                        {
                            "No entries in the selected range."
                        }
                    }
                }
            }
        }
    )
}

fn finance_view(
    summaries: &[ActivitySummary],
    revenues: &[LedgerEntry],
    expenses: &[LedgerEntry],
    event_names: &HashMap<DatabaseId, String>,
    range: FinanceRange,
    viewer: &Member,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::FINANCE_VIEW, viewer.role).into_html();

    // Merge the kinds back into one chronological list for the entry table.
    let mut entries: Vec<&LedgerEntry> = revenues.iter().chain(expenses.iter()).collect();
    entries.sort_by(|a, b| (a.date, a.id).cmp(&(b.date, b.id)));

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 lg:max-w-5xl lg:w-full lg:mx-auto"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Finance" }

                    (link(endpoints::NEW_ENTRY_VIEW, "New Entry"))
                }

                form
                    hx-post=(endpoints::POST_FINANCE_RANGE)
                    hx-target-error="#alert-container"
                    class="flex flex-wrap gap-2 items-center"
                {
                    label class="text-sm" for="date_from" { "From" }
                    input
                        type="date"
                        name="date_from"
                        id="date_from"
                        value=[range.date_from]
                        class=(FORM_TEXT_INPUT_STYLE);

                    label class="text-sm" for="date_to" { "To" }
                    input
                        type="date"
                        name="date_to"
                        id="date_to"
                        value=[range.date_to]
                        class=(FORM_TEXT_INPUT_STYLE);

                    button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Apply" }
                }

                h2 class="text-lg font-bold" { "By activity" }

                section class="dark:bg-gray-800"
                {
                    (summary_table(summaries))
                }

                h2 class="text-lg font-bold" { "Entries" }

                section class="dark:bg-gray-800"
                {
                    (entries_table(&entries, event_names))
                }
            }
        }
    );

    base("Finance", &[], &content)
}

/// The form data for saving the finance date range.
#[derive(Debug, Deserialize)]
pub struct FinanceRangeForm {
    #[serde(default)]
    pub date_from: Option<Date>,
    #[serde(default)]
    pub date_to: Option<Date>,
}

/// Save the date range as the member's preference and reload the finance page.
pub async fn save_finance_range_endpoint(
    State(state): State<FinancePageState>,
    viewer: Extension<Member>,
    // Must use axum_extra's Form since that parses an empty string as None
    // instead of crashing like axum::Form.
    axum_extra::extract::Form(form): axum_extra::extract::Form<FinanceRangeForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let range = FinanceRange {
        date_from: form.date_from,
        date_to: form.date_to,
    };

    match save_finance_range(viewer.id, range, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::FINANCE_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Failed to save finance range: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod finance_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use axum_extra::extract::Form;
    use axum_htmx::HX_REDIRECT;
    use rusqlite::Connection;
    use scraper::Selector;
    use time::macros::date;

    use crate::{
        endpoints,
        event::{NewEvent, create_event, create_event_table},
        ledger::{
            db::{create_entry, create_ledger_table},
            models::{EntryKind, NewLedgerEntry},
        },
        member::{Member, PasswordHash, Role, create_member, create_member_table},
        preferences::{FinanceRange, create_preference_table, get_finance_range},
        test_utils::{assert_valid_html, parse_html_document},
    };

    use super::{
        FinancePageState, FinanceRangeForm, get_finance_page, save_finance_range_endpoint,
    };

    fn entry(
        kind: EntryKind,
        description: &str,
        unit_price: f64,
        event_id: Option<i64>,
        activity: Option<&str>,
        date: time::Date,
    ) -> NewLedgerEntry {
        NewLedgerEntry::build(
            kind,
            description,
            unit_price,
            1,
            event_id,
            activity.map(str::to_owned),
            date,
            date!(2024 - 12 - 31),
        )
        .unwrap()
    }

    fn get_test_state() -> (FinancePageState, Member) {
        let connection = Connection::open_in_memory().unwrap();
        create_member_table(&connection).unwrap();
        create_preference_table(&connection).unwrap();
        create_event_table(&connection).unwrap();
        create_ledger_table(&connection).unwrap();

        let member = create_member(
            "treasurer@test.org",
            PasswordHash::new_unchecked("hash"),
            "The Treasurer",
            "Committee",
            Role::Officer,
            &connection,
        )
        .unwrap();

        let event = create_event(
            NewEvent::build("Spring Fest", "Main Quad", "", date!(2024 - 06 - 01)).unwrap(),
            &connection,
        )
        .unwrap();

        create_entry(
            entry(
                EntryKind::Revenue,
                "tickets",
                200.0,
                Some(event.id),
                None,
                date!(2024 - 06 - 01),
            ),
            &connection,
        )
        .unwrap();
        create_entry(
            entry(
                EntryKind::Expense,
                "venue hire",
                50.0,
                Some(event.id),
                None,
                date!(2024 - 05 - 20),
            ),
            &connection,
        )
        .unwrap();
        create_entry(
            entry(
                EntryKind::Revenue,
                "raffle",
                30.0,
                None,
                Some("Raffle"),
                date!(2024 - 07 - 01),
            ),
            &connection,
        )
        .unwrap();

        let state = FinancePageState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        (state, member)
    }

    #[tokio::test]
    async fn finance_page_shows_summaries_and_entries() {
        let (state, member) = get_test_state();

        let response = get_finance_page(State(state), Extension(member))
            .await
            .expect("Could not render finance page");
        let document = parse_html_document(response).await;

        assert_valid_html(&document);

        let text = document.root_element().text().collect::<String>();
        assert!(text.contains("Spring Fest"), "got {text:?}");
        assert!(text.contains("Raffle"), "got {text:?}");
        assert!(text.contains("$200.00"), "got {text:?}");
        assert!(text.contains("$150.00"), "expected event net, got {text:?}");

        // One row per entry in the entries table.
        let delete_selector = Selector::parse("button[hx-delete]").unwrap();
        assert_eq!(document.select(&delete_selector).count(), 3);
    }

    #[tokio::test]
    async fn saved_range_narrows_the_page() {
        let (state, member) = get_test_state();

        {
            let connection = state.db_connection.lock().unwrap();
            crate::preferences::save_finance_range(
                member.id,
                FinanceRange {
                    date_from: Some(date!(2024 - 07 - 01)),
                    date_to: None,
                },
                &connection,
            )
            .unwrap();
        }

        let response = get_finance_page(State(state), Extension(member))
            .await
            .expect("Could not render finance page");
        let document = parse_html_document(response).await;

        let text = document.root_element().text().collect::<String>();
        assert!(text.contains("Raffle"), "got {text:?}");
        assert!(!text.contains("Spring Fest"), "got {text:?}");
    }

    #[tokio::test]
    async fn empty_ledger_shows_empty_state() {
        let connection = Connection::open_in_memory().unwrap();
        create_member_table(&connection).unwrap();
        create_preference_table(&connection).unwrap();
        create_event_table(&connection).unwrap();
        create_ledger_table(&connection).unwrap();
        let member = create_member(
            "treasurer@test.org",
            PasswordHash::new_unchecked("hash"),
            "The Treasurer",
            "Committee",
            Role::Officer,
            &connection,
        )
        .unwrap();
        let state = FinancePageState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_finance_page(State(state), Extension(member))
            .await
            .expect("Could not render finance page");
        let document = parse_html_document(response).await;

        let text = document.root_element().text().collect::<String>();
        assert!(text.contains("No entries in the selected range."), "got {text:?}");
    }

    #[tokio::test]
    async fn save_range_persists_and_redirects() {
        let (state, member) = get_test_state();

        let response = save_finance_range_endpoint(
            State(state.clone()),
            Extension(member.clone()),
            Form(FinanceRangeForm {
                date_from: Some(date!(2024 - 01 - 01)),
                date_to: Some(date!(2024 - 06 - 30)),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(HX_REDIRECT).unwrap(),
            endpoints::FINANCE_VIEW
        );

        let connection = state.db_connection.lock().unwrap();
        let range = get_finance_range(member.id, &connection).unwrap();
        assert_eq!(range.date_from, Some(date!(2024 - 01 - 01)));
        assert_eq!(range.date_to, Some(date!(2024 - 06 - 30)));
    }

    #[tokio::test]
    async fn clearing_the_range_saves_unbounded_range() {
        let (state, member) = get_test_state();

        {
            let connection = state.db_connection.lock().unwrap();
            crate::preferences::save_finance_range(
                member.id,
                FinanceRange {
                    date_from: Some(date!(2024 - 01 - 01)),
                    date_to: None,
                },
                &connection,
            )
            .unwrap();
        }

        save_finance_range_endpoint(
            State(state.clone()),
            Extension(member.clone()),
            Form(FinanceRangeForm {
                date_from: None,
                date_to: None,
            }),
        )
        .await;

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(
            get_finance_range(member.id, &connection).unwrap(),
            FinanceRange::default()
        );
    }
}
