//! The page and endpoint for creating a payment and charging the membership.

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
use time::Date;

use crate::{
    AppState, Error,
    alert::AlertTemplate,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
        dollar_input_styles, loading_spinner,
    },
    member::{Member, get_verified_members},
    navigation::NavBar,
    payment::{
        db::{charge_member, create_payment},
        models::NewPayment,
    },
    shared_templates::render,
};

/// The state needed to create a payment.
#[derive(Debug, Clone)]
pub struct CreatePaymentState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreatePaymentState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

fn create_payment_view(viewer: &Member) -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_PAYMENT_VIEW, viewer.role).into_html();
    let spinner = loading_spinner();

    let content = html!(
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            form
                hx-post=(endpoints::POST_PAYMENT)
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                h2 class="text-xl font-bold" { "New Payment" }

                p class="text-sm text-gray-500 dark:text-gray-400"
                {
                    "Creating a payment charges every verified member."
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
                    label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                    div class="input-wrapper w-full"
                    {
                        input
                            name="amount"
                            id="amount"
                            type="number"
                            min="0"
                            step="0.01"
                            required
                            class=(FORM_TEXT_INPUT_STYLE);
                    }
                }

                div
                {
                    label for="due_date" class=(FORM_LABEL_STYLE) { "Due date" }

                    input
                        name="due_date"
                        id="due_date"
                        type="date"
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
                {
                    span id="indicator" class="inline htmx-indicator" { (spinner) }
                    " Create Payment"
                }
            }
        }
    );

    base("Create Payment", &[dollar_input_styles()], &content)
}

/// Render the page for creating a payment.
pub async fn get_new_payment_page(viewer: Extension<Member>) -> Response {
    create_payment_view(&viewer.0).into_response()
}

/// The form data for creating a payment.
#[derive(Debug, Deserialize)]
pub struct PaymentForm {
    pub title: String,
    pub amount: f64,
    pub due_date: Date,
}

/// Create a payment and charge all currently verified members.
///
/// Charging is a batch: a failed charge is logged and reported, but charges
/// that already succeeded are kept, as is the payment itself.
pub async fn create_payment_endpoint(
    State(state): State<CreatePaymentState>,
    Form(form): Form<PaymentForm>,
) -> Response {
    let payment = match NewPayment::build(&form.title, form.amount, form.due_date) {
        Ok(payment) => payment,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let payment = match create_payment(payment, &connection) {
        Ok(payment) => payment,
        Err(error) => {
            tracing::error!("could not create payment: {error}");
            return error.into_alert_response();
        }
    };

    let members = match get_verified_members(&connection) {
        Ok(members) => members,
        Err(error) => {
            tracing::error!(
                "could not retrieve verified members to charge for payment {}: {error}",
                payment.id
            );
            return error.into_alert_response();
        }
    };

    let member_count = members.len();
    let mut failed = 0;

    for member in members {
        if let Err(error) = charge_member(payment.id, member.id, &connection) {
            tracing::error!(
                "could not charge member {} for payment {}: {error}",
                member.id,
                payment.id
            );
            failed += 1;
        }
    }

    if failed > 0 {
        return render(
            StatusCode::INTERNAL_SERVER_ERROR,
            AlertTemplate::error(
                "Some charges failed",
                &format!(
                    "Charged {} of {member_count} members. The payment and the successful \
                    charges were kept; check the server logs for the failures.",
                    member_count - failed
                ),
            ),
        );
    }

    (
        HxRedirect(endpoints::PAYMENTS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
