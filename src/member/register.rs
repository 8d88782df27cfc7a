//! The registration page for joining the organization.
//!
//! New accounts start unverified: after registering, the member is logged in
//! and sent to the pending page until an officer verifies them.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error,
    app_state::create_cookie_key,
    auth::{DEFAULT_COOKIE_DURATION, set_auth_cookie},
    endpoints,
    html::{
        FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base, loading_spinner, log_in_register,
        password_input,
    },
    internal_server_error::get_internal_server_error_redirect,
    member::{PasswordHash, Role, ValidatedPassword, create_member},
    timezone::get_local_offset,
};

/// The minimum number of characters the password should have to be considered valid on the client side (server-side validation is done on top of this validation).
const PASSWORD_INPUT_MIN_LENGTH: u8 = 14;

fn text_input(
    label: &str,
    name: &str,
    input_type: &str,
    value: &str,
    error_message: Option<&str>,
) -> Markup {
    html! {
        div
        {
            label for=(name) class=(FORM_LABEL_STYLE) { (label) }

            input
                type=(input_type)
                name=(name)
                id=(name)
                value=(value)
                class=(FORM_TEXT_INPUT_STYLE)
                required
                autofocus[error_message.is_some()];

            @if let Some(error_message) = error_message
            {
                p class="text-red-500 text-base" { (error_message) }
            }
        }
    }
}

fn confirm_password_input(min_length: u8, error_message: Option<&str>) -> Markup {
    html! {
        div
        {
            label
                for="confirm-password"
                class=(FORM_LABEL_STYLE)
            {
                "Confirm Password"
            }

            input
                type="password"
                name="confirm_password"
                id="confirm-password"
                placeholder="••••••••"
                class=(FORM_TEXT_INPUT_STYLE)
                required
                minlength=(min_length)
                autofocus[error_message.is_some()]
            ;

            @if let Some(error_message) = error_message
            {
                p class="text-red-500 text-base" { (error_message) }
            }
        }
    }
}

/// Which error (if any) to display on the registration form, next to the
/// field that caused it.
#[derive(Default)]
struct RegistrationErrors<'a> {
    email: Option<&'a str>,
    password: Option<&'a str>,
    confirm_password: Option<&'a str>,
}

fn registration_form(data: &RegisterForm, errors: RegistrationErrors) -> Markup {
    html! {
        form
            hx-post=(endpoints::REGISTER_API)
            hx-indicator="#indicator"
            hx-disabled-elt="#password, #submit-button"
            class="space-y-4 md:space-y-6"
        {
            (text_input("Email", "email", "email", &data.email, errors.email))
            (text_input("Name", "full_name", "text", &data.full_name, None))
            (text_input("Section", "section", "text", &data.section, None))
            (password_input("", PASSWORD_INPUT_MIN_LENGTH, errors.password))
            (confirm_password_input(PASSWORD_INPUT_MIN_LENGTH, errors.confirm_password))

            button
                type="submit" id="submit-button" tabindex="0"
                class="w-full px-4 py-2 bg-blue-500 dark:bg-blue-600 disabled:bg-blue-700
                    hover:enabled:bg-blue-600 hover:enabled:dark:bg-blue-700 text-white rounded"
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Join"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already a member? "

                a
                    href=(endpoints::LOG_IN_VIEW) tabindex="0"
                    class="font-semibold leading-6 text-blue-600 hover:text-blue-500 dark:text-blue-500 dark:hover:text-blue-400"
                {
                  "Log in here"
                }
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let registration_form = registration_form(&RegisterForm::default(), Default::default());
    let content = log_in_register("Join the organization", &registration_form);
    base("Register", &[], &content).into_response()
}

/// The state needed for creating a new member.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl RegistrationState {
    /// Create the cookie key from a string and set the default cookie duration.
    pub fn new(
        cookie_secret: &str,
        local_timezone: &str,
        db_connection: Arc<Mutex<Connection>>,
    ) -> Self {
        Self {
            cookie_key: create_cookie_key(cookie_secret),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: local_timezone.to_owned(),
            db_connection: db_connection.clone(),
        }
    }
}

impl FromRef<AppState> for RegistrationState {
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
impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

/// The raw data entered in the registration form.
#[derive(Default, Serialize, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub full_name: String,
    pub section: String,
    pub password: String,
    pub confirm_password: String,
}

/// Handler for registration requests via the POST method.
///
/// On success the new member is logged in and the client redirected to the
/// pending page. Otherwise the form is returned with an error message next to
/// the field that caused it.
pub async fn register_member(
    State(state): State<RegistrationState>,
    jar: PrivateCookieJar,
    Form(member_data): Form<RegisterForm>,
) -> Response {
    let validated_password = match ValidatedPassword::new(&member_data.password) {
        Ok(password) => password,
        Err(error) => {
            return registration_form(
                &member_data,
                RegistrationErrors {
                    password: Some(error.to_string().as_ref()),
                    ..Default::default()
                },
            )
            .into_response();
        }
    };

    if member_data.password != member_data.confirm_password {
        return registration_form(
            &member_data,
            RegistrationErrors {
                confirm_password: Some("Passwords do not match"),
                ..Default::default()
            },
        )
        .into_response();
    }

    let password_hash = match PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("an error occurred while hashing a password: {e}");

            return get_internal_server_error_redirect();
        }
    };

    let local_timezone = match get_local_offset(&state.local_timezone) {
        Some(offset) => offset,
        None => return Error::InvalidTimezoneError(state.local_timezone).into_response(),
    };

    let member = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("Could not acquire database lock: {error}");
                return get_internal_server_error_redirect();
            }
        };

        create_member(
            &member_data.email,
            password_hash,
            &member_data.full_name,
            &member_data.section,
            Role::Member,
            &connection,
        )
    };

    let member = match member {
        Ok(member) => member,
        Err(error @ (Error::DuplicateEmail(_) | Error::EmptyField(_))) => {
            return registration_form(
                &member_data,
                RegistrationErrors {
                    email: Some(error.to_string().as_ref()),
                    ..Default::default()
                },
            )
            .into_response();
        }
        Err(error) => {
            tracing::error!("An unhandled error occurred while inserting a new member: {error}");

            return get_internal_server_error_redirect();
        }
    };

    match set_auth_cookie(jar, member.id, state.cookie_duration, local_timezone) {
        Ok(jar) => (
            StatusCode::SEE_OTHER,
            HxRedirect(endpoints::PENDING_VIEW.to_owned()),
            jar,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("An error occurred while setting the auth cookie: {e}");

            get_internal_server_error_redirect()
        }
    }
}


#[cfg(test)]
mod register_member_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, routing::post};
    use axum_test::TestServer;
    use rusqlite::Connection;

    use crate::{
        endpoints,
        member::{
            PasswordHash, Role, create_member, create_member_table,
            register::{RegisterForm, register_member},
        },
    };

    use super::RegistrationState;

    fn get_test_state() -> RegistrationState {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        create_member_table(&connection).expect("Could not create member table");

        RegistrationState::new("42", "Etc/UTC", Arc::new(Mutex::new(connection)))
    }

    fn get_test_server(state: RegistrationState) -> TestServer {
        let app = Router::new()
            .route(endpoints::REGISTER_API, post(register_member))
            .with_state(state);

        TestServer::new(app)
    }

    fn valid_form() -> RegisterForm {
        RegisterForm {
            email: "juan@test.org".to_string(),
            full_name: "Juan Perez".to_string(),
            section: "Brass".to_string(),
            password: "iamtestingwhethericanjoin".to_string(),
            confirm_password: "iamtestingwhethericanjoin".to_string(),
        }
    }

    #[tokio::test]
    async fn register_member_succeeds_and_redirects_to_pending() {
        let server = get_test_server(get_test_state());

        let response = server.post(endpoints::REGISTER_API).form(&valid_form()).await;

        response.assert_status_see_other();
        assert_eq!(response.header("hx-redirect"), endpoints::PENDING_VIEW);
    }

    #[tokio::test]
    async fn register_member_fails_with_weak_password() {
        let server = get_test_server(get_test_state());
        let form = RegisterForm {
            password: "foo".to_string(),
            confirm_password: "foo".to_string(),
            ..valid_form()
        };

        let response = server.post(endpoints::REGISTER_API).form(&form).await;

        let fragment = scraper::Html::parse_fragment(&response.text());
        let p_selector = scraper::Selector::parse("p.text-red-500").unwrap();
        let paragraphs = fragment.select(&p_selector).collect::<Vec<_>>();
        assert_eq!(paragraphs.len(), 1, "want 1 p, got {}", paragraphs.len());
        let paragraph_text = paragraphs[0].text().collect::<String>().to_lowercase();
        assert!(
            paragraph_text.contains("password is too weak"),
            "'{paragraph_text}' does not contain the text 'password is too weak'"
        );
    }

    #[tokio::test]
    async fn register_member_fails_when_passwords_do_not_match() {
        let server = get_test_server(get_test_state());
        let form = RegisterForm {
            confirm_password: "thisisadifferentpassword".to_string(),
            ..valid_form()
        };

        let response = server.post(endpoints::REGISTER_API).form(&form).await;

        let fragment = scraper::Html::parse_fragment(&response.text());
        let p_selector = scraper::Selector::parse("p.text-red-500").unwrap();
        let paragraphs = fragment.select(&p_selector).collect::<Vec<_>>();
        assert_eq!(paragraphs.len(), 1, "want 1 p, got {}", paragraphs.len());
        let paragraph_text = paragraphs[0].text().collect::<String>().to_lowercase();
        assert!(
            paragraph_text.contains("passwords do not match"),
            "'{paragraph_text}' does not contain the text 'passwords do not match'"
        );
    }

    #[tokio::test]
    async fn register_member_fails_with_duplicate_email() {
        let state = get_test_state();
        create_member(
            "juan@test.org",
            PasswordHash::new_unchecked("hunter2"),
            "Juan Perez",
            "Brass",
            Role::Member,
            &state
                .db_connection
                .lock()
                .expect("Could not acquire database lock"),
        )
        .expect("Could not create test member");
        let server = get_test_server(state);

        let response = server.post(endpoints::REGISTER_API).form(&valid_form()).await;

        let fragment = scraper::Html::parse_fragment(&response.text());
        let p_selector = scraper::Selector::parse("p.text-red-500").unwrap();
        let paragraphs = fragment.select(&p_selector).collect::<Vec<_>>();
        assert_eq!(paragraphs.len(), 1, "want 1 p, got {}", paragraphs.len());
        let paragraph_text = paragraphs[0].text().collect::<String>().to_lowercase();
        assert!(
            paragraph_text.contains("already registered"),
            "'{paragraph_text}' does not contain the text 'already registered'"
        );
    }
}
