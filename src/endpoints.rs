//! The application's URIs.
//!
//! For endpoints that take a parameter, e.g., '/events/{event_id}/edit', use
//! [format_endpoint].

/// The public landing page showing upcoming events and approved stories.
pub const ROOT: &str = "/";
/// The page for displaying the member directory.
pub const DIRECTORY_VIEW: &str = "/directory";
/// The page for listing the organization's events.
pub const EVENTS_VIEW: &str = "/events";
/// The page for creating a new event.
pub const NEW_EVENT_VIEW: &str = "/events/new";
/// The page for editing an existing event.
pub const EDIT_EVENT_VIEW: &str = "/events/{event_id}/edit";
/// The finance page showing per-activity summaries.
pub const FINANCE_VIEW: &str = "/finance";
/// The page for creating a new ledger entry.
pub const NEW_ENTRY_VIEW: &str = "/finance/entries/new";
/// The page for editing an existing ledger entry.
pub const EDIT_ENTRY_VIEW: &str = "/finance/entries/{entry_id}/edit";
/// The page for listing payments and their charges (officers).
pub const PAYMENTS_VIEW: &str = "/payments";
/// The page for creating a new payment.
pub const NEW_PAYMENT_VIEW: &str = "/payments/new";
/// The page showing the logged-in member's own charges.
pub const MY_PAYMENTS_VIEW: &str = "/payments/mine";
/// The page for listing shared files.
pub const FILES_VIEW: &str = "/files";
/// The page for uploading a new shared file.
pub const UPLOAD_FILE_VIEW: &str = "/files/upload";
/// The page for submitting a story.
pub const NEW_STORY_VIEW: &str = "/stories/new";
/// The page listing the logged-in member's own stories.
pub const MY_STORIES_VIEW: &str = "/stories/mine";
/// The page listing stories awaiting review (officers).
pub const REVIEW_STORIES_VIEW: &str = "/stories/review";
/// The page for managing members (admins).
pub const MEMBERS_VIEW: &str = "/members";
/// The page shown to members awaiting verification.
pub const PENDING_VIEW: &str = "/pending";
/// The route for getting the registration page.
pub const REGISTER_VIEW: &str = "/register";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";
/// The route serving uploaded shared files for download.
pub const DOWNLOADS: &str = "/downloads";

/// The route for logging in a member.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for the client to log out the current member.
pub const LOG_OUT: &str = "/api/log_out";
/// The route to register a member.
pub const REGISTER_API: &str = "/api/register";
/// The route to create an event.
pub const POST_EVENT: &str = "/api/events";
/// The route to update an event.
pub const PUT_EVENT: &str = "/api/events/{event_id}";
/// The route to delete an event.
pub const DELETE_EVENT: &str = "/api/events/{event_id}";
/// The route to create a ledger entry.
pub const POST_ENTRY: &str = "/api/entries";
/// The route to update a ledger entry.
pub const PUT_ENTRY: &str = "/api/entries/{entry_id}";
/// The route to delete a ledger entry.
pub const DELETE_ENTRY: &str = "/api/entries/{entry_id}";
/// The route to save the finance date-range preference.
pub const POST_FINANCE_RANGE: &str = "/api/finance/range";
/// The route to create a payment and charge all verified members.
pub const POST_PAYMENT: &str = "/api/payments";
/// The route to toggle a payment charge between paid and unpaid.
pub const TOGGLE_CHARGE: &str = "/api/charges/{charge_id}/toggle";
/// The route to upload a shared file.
pub const POST_FILE: &str = "/api/files";
/// The route to delete a shared file.
pub const DELETE_FILE: &str = "/api/files/{file_id}";
/// The route to submit a story.
pub const POST_STORY: &str = "/api/stories";
/// The route to approve a story.
pub const APPROVE_STORY: &str = "/api/stories/{story_id}/approve";
/// The route to reject a story.
pub const REJECT_STORY: &str = "/api/stories/{story_id}/reject";
/// The route to verify a member.
pub const VERIFY_MEMBER: &str = "/api/members/{member_id}/verify";
/// The route to change a member's role.
pub const PUT_MEMBER_ROLE: &str = "/api/members/{member_id}/role";
/// The route to remove a member.
pub const DELETE_MEMBER: &str = "/api/members/{member_id}";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/events/{event_id}/edit', '{event_id}'
/// is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::format_endpoint;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok());
    }

    #[test]
    fn endpoints_are_valid_uris() {
        assert_endpoint_is_valid_uri(endpoints::ROOT);
        assert_endpoint_is_valid_uri(endpoints::DIRECTORY_VIEW);
        assert_endpoint_is_valid_uri(endpoints::EVENTS_VIEW);
        assert_endpoint_is_valid_uri(endpoints::NEW_EVENT_VIEW);
        assert_endpoint_is_valid_uri(endpoints::EDIT_EVENT_VIEW);
        assert_endpoint_is_valid_uri(endpoints::FINANCE_VIEW);
        assert_endpoint_is_valid_uri(endpoints::NEW_ENTRY_VIEW);
        assert_endpoint_is_valid_uri(endpoints::EDIT_ENTRY_VIEW);
        assert_endpoint_is_valid_uri(endpoints::PAYMENTS_VIEW);
        assert_endpoint_is_valid_uri(endpoints::NEW_PAYMENT_VIEW);
        assert_endpoint_is_valid_uri(endpoints::MY_PAYMENTS_VIEW);
        assert_endpoint_is_valid_uri(endpoints::FILES_VIEW);
        assert_endpoint_is_valid_uri(endpoints::UPLOAD_FILE_VIEW);
        assert_endpoint_is_valid_uri(endpoints::NEW_STORY_VIEW);
        assert_endpoint_is_valid_uri(endpoints::MY_STORIES_VIEW);
        assert_endpoint_is_valid_uri(endpoints::REVIEW_STORIES_VIEW);
        assert_endpoint_is_valid_uri(endpoints::MEMBERS_VIEW);
        assert_endpoint_is_valid_uri(endpoints::PENDING_VIEW);
        assert_endpoint_is_valid_uri(endpoints::REGISTER_VIEW);
        assert_endpoint_is_valid_uri(endpoints::LOG_IN_VIEW);
        assert_endpoint_is_valid_uri(endpoints::INTERNAL_ERROR_VIEW);
        assert_endpoint_is_valid_uri(endpoints::STATIC);
        assert_endpoint_is_valid_uri(endpoints::DOWNLOADS);

        assert_endpoint_is_valid_uri(endpoints::LOG_IN_API);
        assert_endpoint_is_valid_uri(endpoints::LOG_OUT);
        assert_endpoint_is_valid_uri(endpoints::REGISTER_API);
        assert_endpoint_is_valid_uri(endpoints::POST_EVENT);
        assert_endpoint_is_valid_uri(endpoints::PUT_EVENT);
        assert_endpoint_is_valid_uri(endpoints::DELETE_EVENT);
        assert_endpoint_is_valid_uri(endpoints::POST_ENTRY);
        assert_endpoint_is_valid_uri(endpoints::PUT_ENTRY);
        assert_endpoint_is_valid_uri(endpoints::DELETE_ENTRY);
        assert_endpoint_is_valid_uri(endpoints::POST_FINANCE_RANGE);
        assert_endpoint_is_valid_uri(endpoints::POST_PAYMENT);
        assert_endpoint_is_valid_uri(endpoints::TOGGLE_CHARGE);
        assert_endpoint_is_valid_uri(endpoints::POST_FILE);
        assert_endpoint_is_valid_uri(endpoints::DELETE_FILE);
        assert_endpoint_is_valid_uri(endpoints::POST_STORY);
        assert_endpoint_is_valid_uri(endpoints::APPROVE_STORY);
        assert_endpoint_is_valid_uri(endpoints::REJECT_STORY);
        assert_endpoint_is_valid_uri(endpoints::VERIFY_MEMBER);
        assert_endpoint_is_valid_uri(endpoints::PUT_MEMBER_ROLE);
        assert_endpoint_is_valid_uri(endpoints::DELETE_MEMBER);
    }

    #[test]
    fn produces_valid_uri() {
        let formatted_path = format_endpoint("/hello/{world_id}", 1);

        assert_eq!(formatted_path, "/hello/1");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        let formatted_path = format_endpoint("/hello/world", 1);

        assert_eq!(formatted_path, "/hello/world");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn parameter_in_middle() {
        let formatted_path = format_endpoint("/hello/{world}/bye", 1);

        assert_eq!(formatted_path, "/hello/1/bye");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }
}
