//! Orghub is a web dashboard for running a student organization: events,
//! shared files, finances, payments, a member directory, and a story approval
//! workflow, split across public, member, officer, and admin areas.
//!
//! This library provides a server that directly serves HTML pages.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use time::Date;
use tokio::signal;

mod alert;
mod app_state;
mod auth;
mod database_id;
mod db;
mod endpoints;
mod event;
mod files;
mod html;
mod internal_server_error;
mod landing;
mod ledger;
mod listing;
mod logging;
mod member;
mod navigation;
mod not_found;
mod pagination;
mod payment;
mod preferences;
mod routing;
mod shared_templates;
mod story;
mod timezone;

#[cfg(test)]
mod test_utils;

pub use app_state::{AppState, create_cookie_key};
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use member::{
    Member, MemberId, PasswordHash, Role, ValidatedPassword, create_member, get_member_by_email,
    set_member_verified,
};
pub use routing::build_router;

use crate::{
    alert::AlertTemplate,
    internal_server_error::{InternalServerErrorPageTemplate, render_internal_server_error},
    not_found::get_404_not_found_response,
    shared_templates::render,
};

/// An async task that waits for either the ctrl+c or terminate signal,
/// whichever comes first, and then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided an invalid email/password combination.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Either the member ID or expiry cookie is missing from the cookie jar
    /// in the request.
    #[error("no cookies in the cookie jar :(")]
    CookieMissing,

    /// There was an error parsing the date in the cookie or creating the new
    /// expiry date time.
    ///
    /// Callers should pass in the original error as a string and the date
    /// string that caused the error.
    #[error("could not format expiry cookie date-time string \"{1}\": {0}")]
    InvalidDateFormat(String, String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// An empty string was used where a name or title is required.
    #[error("{0} cannot be empty")]
    EmptyField(&'static str),

    /// A negative amount was used for a price or payment.
    #[error("{0} is negative, amounts must be zero or more")]
    NegativeAmount(f64),

    /// A date in the future was used to create a ledger entry.
    ///
    /// Ledger entries record money that has already moved, therefore future
    /// dates are not allowed.
    #[error("{0} is a date in the future, which is not allowed")]
    FutureDate(Date),

    /// The specified email address already belongs to a member.
    #[error("the email \"{0}\" is already registered")]
    DuplicateEmail(String),

    /// A ledger entry referenced an event that does not exist.
    #[error("the event ID does not refer to a valid event")]
    InvalidEvent,

    /// The multipart form could not be parsed as a file upload.
    #[error("Could not parse multipart form: {0}")]
    MultipartError(String),

    /// The multipart form did not contain a file.
    #[error("No file was attached to the upload")]
    EmptyUpload,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while saving a member preference.
    #[error("failed to save preferences")]
    PreferencesSaveError,

    /// An error occurred while getting the local timezone from a canonical
    /// timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An error occurred while serializing a struct as JSON.
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An error occurred while reading or writing an uploaded file.
    #[error("file storage error: {0}")]
    FileStorageError(String),

    /// Tried to delete a ledger entry that does not exist.
    #[error("tried to delete a ledger entry that is not in the database")]
    DeleteMissingEntry,

    /// Tried to update a ledger entry that does not exist.
    #[error("tried to update a ledger entry that is not in the database")]
    UpdateMissingEntry,

    /// Tried to delete an event that does not exist.
    #[error("tried to delete an event that is not in the database")]
    DeleteMissingEvent,

    /// Tried to update an event that does not exist.
    #[error("tried to update an event that is not in the database")]
    UpdateMissingEvent,

    /// Tried to update a member that does not exist.
    #[error("tried to update a member that is not in the database")]
    UpdateMissingMember,

    /// Tried to delete a member that does not exist.
    #[error("tried to delete a member that is not in the database")]
    DeleteMissingMember,

    /// Tried to update a payment charge that does not exist.
    #[error("tried to update a payment charge that is not in the database")]
    UpdateMissingCharge,

    /// Tried to delete a shared file that does not exist.
    #[error("tried to delete a file that is not in the database")]
    DeleteMissingFile,

    /// Tried to review a story that does not exist.
    #[error("tried to review a story that is not in the database")]
    UpdateMissingStory,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("member.email") =>
            {
                // The email is reported by the caller, which has the form data.
                Error::DuplicateEmail(String::new())
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            Error::PreferencesSaveError => {
                render_internal_server_error(InternalServerErrorPageTemplate {
                    description: "Save Failed",
                    fix: "Failed to save your preferences. Please try again.",
                })
            }
            Error::InvalidTimezoneError(timezone) => {
                render_internal_server_error(InternalServerErrorPageTemplate {
                    description: "Invalid Timezone Settings",
                    fix: &format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings \
                        and ensure the timezone has been set to a valid, canonical timezone string"
                    ),
                })
            }
            Error::DatabaseLockError => render_internal_server_error(Default::default()),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                render_internal_server_error(Default::default())
            }
        }
    }
}

impl Error {
    fn into_alert_response(self) -> Response {
        match self {
            Error::FutureDate(date) => render(
                StatusCode::BAD_REQUEST,
                AlertTemplate::error(
                    "Invalid entry date",
                    &format!(
                        "{date} is a date in the future, which is not allowed. Change the date to \
                        today or earlier."
                    ),
                ),
            ),
            Error::EmptyField(field) => render(
                StatusCode::BAD_REQUEST,
                AlertTemplate::error("Missing information", &format!("{field} cannot be empty.")),
            ),
            Error::NegativeAmount(amount) => render(
                StatusCode::BAD_REQUEST,
                AlertTemplate::error(
                    "Invalid amount",
                    &format!("{amount} is negative. Amounts must be zero or more."),
                ),
            ),
            Error::InvalidEvent => render(
                StatusCode::BAD_REQUEST,
                AlertTemplate::error(
                    "Invalid event",
                    "Could not find the selected event. It may have been deleted.",
                ),
            ),
            Error::DuplicateEmail(email) => render(
                StatusCode::BAD_REQUEST,
                AlertTemplate::error(
                    "Email already registered",
                    &format!(
                        "{email} already belongs to a member. Log in instead, or use a \
                        different email address."
                    ),
                ),
            ),
            Error::EmptyUpload => render(
                StatusCode::BAD_REQUEST,
                AlertTemplate::error("Empty upload", "Choose a file before uploading."),
            ),
            Error::UpdateMissingEntry => render(
                StatusCode::NOT_FOUND,
                AlertTemplate::error(
                    "Could not update ledger entry",
                    "The ledger entry could not be found.",
                ),
            ),
            Error::DeleteMissingEntry => render(
                StatusCode::NOT_FOUND,
                AlertTemplate::error(
                    "Could not delete ledger entry",
                    "The ledger entry could not be found. \
                    Try refreshing the page to see if the entry has already been deleted.",
                ),
            ),
            Error::UpdateMissingEvent => render(
                StatusCode::NOT_FOUND,
                AlertTemplate::error("Could not update event", "The event could not be found."),
            ),
            Error::DeleteMissingEvent => render(
                StatusCode::NOT_FOUND,
                AlertTemplate::error(
                    "Could not delete event",
                    "The event could not be found. \
                    Try refreshing the page to see if the event has already been deleted.",
                ),
            ),
            Error::UpdateMissingMember => render(
                StatusCode::NOT_FOUND,
                AlertTemplate::error("Could not update member", "The member could not be found."),
            ),
            Error::DeleteMissingMember => render(
                StatusCode::NOT_FOUND,
                AlertTemplate::error(
                    "Could not remove member",
                    "The member could not be found. \
                    Try refreshing the page to see if they have already been removed.",
                ),
            ),
            Error::UpdateMissingCharge => render(
                StatusCode::NOT_FOUND,
                AlertTemplate::error(
                    "Could not update payment",
                    "The payment charge could not be found.",
                ),
            ),
            Error::DeleteMissingFile => render(
                StatusCode::NOT_FOUND,
                AlertTemplate::error(
                    "Could not delete file",
                    "The file could not be found. \
                    Try refreshing the page to see if it has already been deleted.",
                ),
            ),
            Error::UpdateMissingStory => render(
                StatusCode::NOT_FOUND,
                AlertTemplate::error("Could not review story", "The story could not be found."),
            ),
            _ => render(
                StatusCode::INTERNAL_SERVER_ERROR,
                AlertTemplate::error(
                    "Something went wrong",
                    "An unexpected error occurred, check the server logs for more details.",
                ),
            ),
        }
    }
}
