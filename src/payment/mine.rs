//! The page showing the signed-in member's own payment charges.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    html::{
        BADGE_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, format_currency,
    },
    member::Member,
    navigation::NavBar,
    payment::{db::get_charges_for_member, models::MemberCharge},
};

/// The state needed for a member's own payments page.
#[derive(Debug, Clone)]
pub struct MyPaymentsState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for MyPaymentsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

fn my_payments_view(charges: &[MemberCharge], viewer: &Member) -> Markup {
    let nav_bar = NavBar::new(endpoints::MY_PAYMENTS_VIEW, viewer.role).into_html();
    let total_owed: f64 = charges
        .iter()
        .filter(|charge| !charge.paid)
        .map(|charge| charge.amount)
        .sum();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 lg:max-w-5xl lg:w-full lg:mx-auto"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "My Payments" }

                    p class="text-sm text-gray-500 dark:text-gray-400"
                    {
                        "Outstanding: " (format_currency(total_owed))
                    }
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
                                th scope="col" class=(TABLE_CELL_STYLE) { "Payment" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Due" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Status" }
                            }
                        }

                        tbody
                        {
                            @for charge in charges {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    td class=(TABLE_CELL_STYLE) { (charge.payment_title) }
                                    td class=(TABLE_CELL_STYLE) { (format_currency(charge.amount)) }
                                    td class=(TABLE_CELL_STYLE) { (charge.due_date) }

                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        @if charge.paid {
                                            span class=(BADGE_STYLE) { "Paid" }
                                        } @else {
                                            "Unpaid"
                                        }
                                    }
                                }
                            }

                            @if charges.is_empty() {
                                tr
                                {
                                    td
                                        colspan="4"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "You have not been charged for any payments."
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("My Payments", &[], &content)
}

/// Render the signed-in member's charges, most recently due first.
pub async fn get_my_payments_page(
    State(state): State<MyPaymentsState>,
    viewer: Extension<Member>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let charges = get_charges_for_member(viewer.id, &connection).inspect_err(|error| {
        tracing::error!("Failed to retrieve charges for member {}: {error}", viewer.id)
    })?;
    drop(connection);

    Ok(my_payments_view(&charges, &viewer.0).into_response())
}
