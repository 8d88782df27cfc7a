//! Payments: bulk charges against the membership and their paid status.

mod create;
mod db;
mod list;
mod mine;
mod models;
mod toggle;

pub use create::{CreatePaymentState, PaymentForm, create_payment_endpoint, get_new_payment_page};
pub use list::{PaymentsPageState, get_payments_page};
pub use mine::{MyPaymentsState, get_my_payments_page};
pub use models::{Charge, ChargeWithMember, MemberCharge, NewPayment, Payment};
pub use toggle::{ToggleChargeState, toggle_charge_endpoint};

pub(crate) use db::create_payment_tables;
