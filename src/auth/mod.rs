//! Cookie-based authentication: logging in and out, the session cookies
//! themselves, and the route guards that enforce member roles.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod pending;
mod redirect;

pub use cookie::{DEFAULT_COOKIE_DURATION, invalidate_auth_cookie, set_auth_cookie};
pub use log_in::{get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::{
    AuthState, admin_guard, admin_guard_hx, auth_guard, auth_guard_hx, auth_guard_unverified,
    officer_guard, officer_guard_hx,
};
pub use pending::get_pending_page;

#[cfg(test)]
pub use cookie::{COOKIE_EXPIRY, COOKIE_MEMBER_ID};
