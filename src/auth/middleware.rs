//! Authentication middleware that validates cookies, checks member roles,
//! extends sessions, and handles redirects.
//!
//! Each protected route group is layered with a guard for the minimum role
//! that may use it: members, officers, or admins. The guard looks up the
//! member on every request so role changes and removals take effect
//! immediately, and unverified members are diverted to the pending page.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{StatusCode, header::SET_COOKIE},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use time::Duration;

use crate::{
    AppState,
    auth::{
        cookie::{extend_auth_cookie_duration_if_needed, get_member_id_from_auth_cookie},
        redirect::{build_log_in_redirect_url, build_log_in_redirect_url_from_target},
    },
    endpoints,
    member::{Role, get_member_by_id},
    timezone::get_local_offset,
};

/// The state needed for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The database connection for looking up the logged-in member.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// Middleware function that checks for a valid authorization cookie and a
/// member with at least `min_role`.
///
/// The member is placed into the request and the request executed normally if
/// the checks pass. Otherwise:
/// - a missing or invalid cookie returns a redirect to the log-in page using
///   `get_redirect`,
/// - an unverified member (below admin) is redirected to the pending page when
///   `require_verified` is set,
/// - a member below `min_role` is redirected to their own home page.
///
/// **Note**: Route handlers can use the function argument
/// `Extension(member): Extension<Member>` to receive the logged-in member.
#[inline]
async fn auth_guard_internal(
    state: AuthState,
    request: Request,
    next: Next,
    min_role: Role,
    require_verified: bool,
    get_redirect: impl Fn(&str) -> Response,
) -> Response {
    let log_in_redirect_url = build_log_in_redirect_url(&request).unwrap_or_else(|| {
        if request.uri().path().starts_with("/api") {
            tracing::warn!(
                "Missing or invalid HTMX headers for /api request. Falling back to events page."
            );
        } else {
            tracing::warn!("Invalid redirect URL from request URI. Falling back to events page.");
        }

        build_log_in_redirect_url_from_target(endpoints::EVENTS_VIEW)
            .unwrap_or_else(|| endpoints::LOG_IN_VIEW.to_owned())
    });
    let local_offset = match get_local_offset(&state.local_timezone) {
        Some(offset) => offset,
        None => {
            tracing::error!("Error getting local timezone. Redirecting to log in page.");
            return get_redirect(&log_in_redirect_url);
        }
    };

    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(err) => {
            tracing::error!("Error getting cookie jar: {err:?}. Redirecting to log in page.");
            return get_redirect(&log_in_redirect_url);
        }
    };
    let member_id = match get_member_id_from_auth_cookie(&jar) {
        Ok(member_id) => member_id,
        Err(_) => return get_redirect(&log_in_redirect_url),
    };

    let member = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(err) => {
                tracing::error!("Could not acquire database lock: {err}.");
                return get_redirect(&log_in_redirect_url);
            }
        };

        get_member_by_id(member_id, &connection)
    };
    // A cookie for a member that no longer exists is treated the same as no
    // cookie at all.
    let member = match member {
        Ok(member) => member,
        Err(_) => return get_redirect(&log_in_redirect_url),
    };

    if require_verified && !member.verified && member.role < Role::Admin {
        return get_redirect(endpoints::PENDING_VIEW);
    }

    if member.role < min_role {
        return get_redirect(member.role.home_endpoint());
    }

    parts.extensions.insert(member);
    let request = Request::from_parts(parts, body);
    let response = next.run(request).await;

    let (mut parts, body) = response.into_parts();
    let jar = match extend_auth_cookie_duration_if_needed(
        jar.clone(),
        state.cookie_duration,
        local_offset,
    ) {
        Ok(updated_jar) => updated_jar,
        Err(err) => {
            tracing::error!("Error extending cookie duration: {err:?}. Rolling back cookie jar.");
            jar
        }
    };
    for (key, val) in jar.into_response().headers().iter() {
        if key != SET_COOKIE {
            continue;
        }

        parts.headers.append(key, val.to_owned());
    }

    Response::from_parts(parts, body)
}

fn plain_redirect(redirect_url: &str) -> Response {
    Redirect::to(redirect_url).into_response()
}

fn hx_redirect(redirect_url: &str) -> Response {
    (HxRedirect(redirect_url.to_owned()), StatusCode::OK).into_response()
}

/// Middleware that requires a logged-in, verified member.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    auth_guard_internal(state, request, next, Role::Member, true, plain_redirect).await
}

/// Middleware that requires a logged-in, verified member, responding to
/// unauthorized htmx requests with an `HX-Redirect` header.
pub async fn auth_guard_hx(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    auth_guard_internal(state, request, next, Role::Member, true, hx_redirect).await
}

/// Middleware that requires a logged-in member but allows unverified ones.
/// Used for the pending page and logging out.
pub async fn auth_guard_unverified(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    auth_guard_internal(state, request, next, Role::Member, false, plain_redirect).await
}

/// Middleware that requires a logged-in, verified member with at least the
/// officer role.
pub async fn officer_guard(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    auth_guard_internal(state, request, next, Role::Officer, true, plain_redirect).await
}

/// The htmx variant of [officer_guard].
pub async fn officer_guard_hx(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    auth_guard_internal(state, request, next, Role::Officer, true, hx_redirect).await
}

/// Middleware that requires a logged-in admin.
pub async fn admin_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    auth_guard_internal(state, request, next, Role::Admin, true, plain_redirect).await
}

/// The htmx variant of [admin_guard].
pub async fn admin_guard_hx(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    auth_guard_internal(state, request, next, Role::Admin, true, hx_redirect).await
}
