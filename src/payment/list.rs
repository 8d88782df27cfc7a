//! The payments page for officers: every payment with its member charges.

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
    html::{
        BADGE_STYLE, BUTTON_PRIMARY_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        format_currency, link,
    },
    listing::{ListFilter, ListOutcome, apply_filters},
    member::Member,
    navigation::NavBar,
    payment::{
        db::{get_all_payments, get_charges_for_payment},
        models::{ChargeWithMember, Payment},
    },
};

/// The state needed for the payments page.
#[derive(Debug, Clone)]
pub struct PaymentsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for PaymentsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query parameters for the payments page.
#[derive(Debug, Default, Deserialize)]
pub struct PaymentsQuery {
    /// Case-insensitive search over payment titles.
    pub search: Option<String>,
}

/// One charge as a table row, with a button to flip it between paid and
/// unpaid. The toggle endpoint returns the same markup so htmx can swap the
/// row in place.
pub(super) fn charge_row(charge: &ChargeWithMember) -> Markup {
    let toggle_url = endpoints::format_endpoint(endpoints::TOGGLE_CHARGE, charge.id);

    html!(
        tr class=(TABLE_ROW_STYLE)
        {
            td class=(TABLE_CELL_STYLE) { (charge.member_name) }

            td class=(TABLE_CELL_STYLE)
            {
                @if charge.paid {
                    span class=(BADGE_STYLE) { "Paid" }
                } @else {
                    "Unpaid"
                }
            }

            td class=(TABLE_CELL_STYLE)
            {
                button
                    type="button"
                    class=(LINK_STYLE)
                    hx-post=(toggle_url)
                    hx-target="closest tr"
                    hx-swap="outerHTML"
                {
                    @if charge.paid { "Mark unpaid" } @else { "Mark paid" }
                }
            }
        }
    )
}

fn payment_section(payment: &Payment, charges: &[ChargeWithMember]) -> Markup {
    let paid_count = charges.iter().filter(|charge| charge.paid).count();

    html!(
        section class="dark:bg-gray-800 space-y-2"
        {
            header class="flex justify-between flex-wrap items-end"
            {
                h2 class="text-lg font-bold" { (payment.title) }

                p class="text-sm text-gray-500 dark:text-gray-400"
                {
                    (format_currency(payment.amount))
                    " each, due " (payment.due_date)
                    " — " (paid_count) " of " (charges.len()) " paid"
                }
            }

            table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Member" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Status" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                    }
                }

                tbody
                {
                    @for charge in charges {
                        (charge_row(charge))
                    }

                    @if charges.is_empty() {
                        tr
                        {
                            td
                                colspan="3"
                                class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                            {
                                "No members were charged for this payment."
                            }
                        }
                    }
                }
            }
        }
    )
}

fn payments_view(
    payments: &[(&Payment, Vec<ChargeWithMember>)],
    outcome: ListOutcome,
    query: &PaymentsQuery,
    viewer: &Member,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::PAYMENTS_VIEW, viewer.role).into_html();
    let search = query.search.as_deref().unwrap_or_default();

    let empty_state = match outcome {
        ListOutcome::Populated => None,
        ListOutcome::EmptyFiltered => Some("No payments match your search."),
        ListOutcome::EmptyInitial => Some("No payments have been created yet."),
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 lg:max-w-5xl lg:w-full lg:mx-auto"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Payments" }

                    (link(endpoints::NEW_PAYMENT_VIEW, "New Payment"))
                }

                form method="get" action=(endpoints::PAYMENTS_VIEW)
                    class="flex flex-wrap gap-2 items-center"
                {
                    input
                        type="search"
                        name="search"
                        value=(search)
                        placeholder="Search payments"
                        class=(FORM_TEXT_INPUT_STYLE);

                    button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Filter" }
                }

                @for (payment, charges) in payments {
                    (payment_section(payment, charges))
                }

                @if let Some(message) = empty_state {
                    p class="text-center text-gray-500 dark:text-gray-400" { (message) }
                }
            }
        }
    );

    base("Payments", &[], &content)
}

/// Render the payments page, narrowed by the query's title search.
pub async fn get_payments_page(
    State(state): State<PaymentsPageState>,
    Query(query): Query<PaymentsQuery>,
    viewer: Extension<Member>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let payments = get_all_payments(&connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve payments: {error}"))?;

    let filter = ListFilter {
        search: query.search.clone().unwrap_or_default(),
        ..Default::default()
    };
    let filtered = apply_filters(&payments, &filter);

    let mut sections = Vec::with_capacity(filtered.visible.len());
    for payment in &filtered.visible {
        let charges = get_charges_for_payment(payment.id, &connection).inspect_err(|error| {
            tracing::error!("Failed to retrieve charges for payment {}: {error}", payment.id)
        })?;
        sections.push((*payment, charges));
    }
    drop(connection);

    Ok(payments_view(&sections, filtered.outcome, &query, &viewer.0).into_response())
}
