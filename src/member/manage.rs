//! The page for managing members: verifying new registrations, changing
//! roles, and removing members.
//!
//! Officers can verify registrations. Changing roles and removing members is
//! admin-only, so those controls are only rendered for admins and their
//! endpoints sit behind the admin guard.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    alert::AlertTemplate,
    database_id::DatabaseId,
    endpoints,
    html::{
        BADGE_STYLE, BUTTON_DELETE_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
    },
    member::{Member, MemberId, Role, delete_member, get_all_members, get_member_by_id,
        set_member_role, set_member_verified},
    navigation::NavBar,
    shared_templates::render,
};

/// The state needed for the member management page and endpoints.
#[derive(Debug, Clone)]
pub struct ManageMembersState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ManageMembersState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the member management page.
pub async fn get_members_page(
    State(state): State<ManageMembersState>,
    viewer: axum::Extension<Member>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let members = get_all_members(&connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve members: {error}"))?;

    Ok(members_view(&members, &viewer.0).into_response())
}

/// One row of the management table. Returned by the verify and role change
/// endpoints so htmx can swap the updated row in place.
///
/// The role select and remove button are only rendered when the viewer is an
/// admin; officers see the role as plain text and no remove button.
fn member_row(member: &Member, viewer_role: Role) -> Markup {
    let verify_url = endpoints::format_endpoint(endpoints::VERIFY_MEMBER, member.id.as_i64());
    let role_url = endpoints::format_endpoint(endpoints::PUT_MEMBER_ROLE, member.id.as_i64());
    let delete_url = endpoints::format_endpoint(endpoints::DELETE_MEMBER, member.id.as_i64());
    let confirm_message = format!(
        "Are you sure you want to remove {}? This cannot be undone.",
        member.full_name
    );

    html!(
        tr class=(TABLE_ROW_STYLE)
        {
            td class=(TABLE_CELL_STYLE) { (member.full_name) }
            td class=(TABLE_CELL_STYLE) { (member.email) }
            td class=(TABLE_CELL_STYLE)
            {
                span class=(BADGE_STYLE) { (member.section) }
            }

            td class=(TABLE_CELL_STYLE)
            {
                @if viewer_role == Role::Admin {
                    select
                        name="role"
                        class=(FORM_TEXT_INPUT_STYLE)
                        hx-put=(role_url)
                        hx-trigger="change"
                        hx-target="closest tr"
                        hx-swap="outerHTML"
                    {
                        @for role in [Role::Member, Role::Officer, Role::Admin] {
                            option value=(role.as_str()) selected[member.role == role]
                            {
                                (role)
                            }
                        }
                    }
                } @else {
                    (member.role)
                }
            }

            td class=(TABLE_CELL_STYLE)
            {
                @if member.verified {
                    span class=(BADGE_STYLE) { "Verified" }
                } @else {
                    button
                        type="button"
                        class="text-blue-600 hover:text-blue-500 dark:text-blue-500"
                        hx-post=(verify_url)
                        hx-target="closest tr"
                        hx-swap="outerHTML"
                    {
                        "Verify"
                    }
                }
            }

            td class=(TABLE_CELL_STYLE)
            {
                @if viewer_role == Role::Admin {
                    button
                        type="button"
                        class=(BUTTON_DELETE_STYLE)
                        hx-delete=(delete_url)
                        hx-confirm=(confirm_message)
                        hx-target="closest tr"
                        hx-swap="delete"
                    {
                        "Remove"
                    }
                }
            }
        }
    )
}

fn members_view(members: &[Member], viewer: &Member) -> Markup {
    let nav_bar = NavBar::new(endpoints::MEMBERS_VIEW, viewer.role).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Members" }
                }

                section class="dark:bg-gray-800 lg:max-w-5xl lg:w-full lg:mx-auto"
                {
                    table class="w-full text-sm text-left rtl:text-right
                        text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Email" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Section" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Role" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Status" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for member in members {
                                (member_row(member, viewer.role))
                            }

                            @if members.is_empty() {
                                tr
                                {
                                    td
                                        colspan="6"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No members have registered yet."
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Members", &[], &content)
}

/// Mark a member as verified and return their updated table row.
pub async fn verify_member_endpoint(
    Path(member_id): Path<DatabaseId>,
    State(state): State<ManageMembersState>,
    viewer: axum::Extension<Member>,
) -> Response {
    let member_id = MemberId::new(member_id);
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match set_member_verified(member_id, &connection).and_then(|_| {
        get_member_by_id(member_id, &connection)
    }) {
        Ok(member) => render(StatusCode::OK, member_row(&member, viewer.role)),
        Err(Error::UpdateMissingMember) => Error::UpdateMissingMember.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while verifying member {member_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

/// The form data for changing a member's role.
#[derive(Debug, Serialize, Deserialize)]
pub struct RoleFormData {
    pub role: String,
}

/// Change a member's role and return their updated table row.
pub async fn update_member_role_endpoint(
    Path(member_id): Path<DatabaseId>,
    State(state): State<ManageMembersState>,
    viewer: axum::Extension<Member>,
    Form(form_data): Form<RoleFormData>,
) -> Response {
    let member_id = MemberId::new(member_id);
    let role = match Role::from_str(&form_data.role) {
        Some(role) => role,
        None => {
            return render(
                StatusCode::BAD_REQUEST,
                AlertTemplate::error(
                    "Unknown role",
                    &format!("\"{}\" is not a valid role.", form_data.role),
                ),
            );
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match set_member_role(member_id, role, &connection)
        .and_then(|_| get_member_by_id(member_id, &connection))
    {
        Ok(member) => render(StatusCode::OK, member_row(&member, viewer.role)),
        Err(Error::UpdateMissingMember) => Error::UpdateMissingMember.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while changing the role of member {member_id}: \
                {error}"
            );
            error.into_alert_response()
        }
    }
}

/// Remove a member. Returns a success alert or an error alert.
pub async fn delete_member_endpoint(
    Path(member_id): Path<DatabaseId>,
    State(state): State<ManageMembersState>,
) -> Response {
    let member_id = MemberId::new(member_id);
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_member(member_id, &connection) {
        Ok(_) => render(
            StatusCode::OK,
            AlertTemplate::success("Member removed", "The member has been removed."),
        ),
        Err(Error::DeleteMissingMember) => Error::DeleteMissingMember.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while removing member {member_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod manage_members_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension, Form,
        extract::{Path, State},
        http::StatusCode,
    };
    use rusqlite::Connection;
    use scraper::Selector;

    use crate::{
        member::{
            Member, MemberId, PasswordHash, Role, create_member, create_member_table,
            get_member_by_id,
        },
        test_utils::{assert_valid_html, parse_html_document, parse_html_fragment},
    };

    use super::{
        ManageMembersState, RoleFormData, delete_member_endpoint, get_members_page,
        update_member_role_endpoint, verify_member_endpoint,
    };

    fn get_test_state() -> (ManageMembersState, Member) {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        create_member_table(&connection).expect("Could not create member table");

        let admin = create_member(
            "admin@test.org",
            PasswordHash::new_unchecked("hunter2"),
            "The Admin",
            "Committee",
            Role::Admin,
            &connection,
        )
        .expect("Could not create test admin");

        (
            ManageMembersState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            admin,
        )
    }

    fn insert_member(state: &ManageMembersState, email: &str) -> Member {
        create_member(
            email,
            PasswordHash::new_unchecked("hunter2"),
            "Test Member",
            "Brass",
            Role::Member,
            &state.db_connection.lock().unwrap(),
        )
        .expect("Could not create test member")
    }

    #[tokio::test]
    async fn members_page_lists_members_with_actions() {
        let (state, admin) = get_test_state();
        insert_member(&state, "juan@test.org");

        let response = get_members_page(State(state), Extension(admin))
            .await
            .expect("Could not render members page");
        let document = parse_html_document(response).await;

        assert_valid_html(&document);
        let row_selector = Selector::parse("tbody tr").unwrap();
        assert_eq!(document.select(&row_selector).count(), 2);
        let verify_selector = Selector::parse("button[hx-post]").unwrap();
        assert_eq!(document.select(&verify_selector).count(), 2);
    }

    #[tokio::test]
    async fn members_page_hides_admin_controls_from_officers() {
        let (state, _) = get_test_state();
        let officer = create_member(
            "officer@test.org",
            PasswordHash::new_unchecked("hunter2"),
            "The Officer",
            "Committee",
            Role::Officer,
            &state.db_connection.lock().unwrap(),
        )
        .expect("Could not create test officer");

        let response = get_members_page(State(state), Extension(officer))
            .await
            .expect("Could not render members page");
        let document = parse_html_document(response).await;

        let role_selector = Selector::parse("select[hx-put]").unwrap();
        assert_eq!(document.select(&role_selector).count(), 0);
        let delete_selector = Selector::parse("button[hx-delete]").unwrap();
        assert_eq!(document.select(&delete_selector).count(), 0);
        let verify_selector = Selector::parse("button[hx-post]").unwrap();
        assert_eq!(document.select(&verify_selector).count(), 2);
    }

    #[tokio::test]
    async fn verify_member_returns_updated_row() {
        let (state, admin) = get_test_state();
        let member = insert_member(&state, "juan@test.org");

        let response = verify_member_endpoint(
            Path(member.id.as_i64()),
            State(state.clone()),
            Extension(admin),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let fragment = parse_html_fragment(response).await;
        let badge_text = fragment
            .select(&Selector::parse("span").unwrap())
            .map(|span| span.text().collect::<String>())
            .collect::<String>();
        assert!(badge_text.contains("Verified"), "got {badge_text:?}");

        let updated = get_member_by_id(member.id, &state.db_connection.lock().unwrap()).unwrap();
        assert!(updated.verified);
    }

    #[tokio::test]
    async fn verify_missing_member_returns_error_alert() {
        let (state, admin) = get_test_state();

        let response = verify_member_endpoint(Path(999), State(state), Extension(admin)).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn update_member_role_promotes_member() {
        let (state, admin) = get_test_state();
        let member = insert_member(&state, "juan@test.org");

        let response = update_member_role_endpoint(
            Path(member.id.as_i64()),
            State(state.clone()),
            Extension(admin),
            Form(RoleFormData {
                role: "officer".to_owned(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let updated = get_member_by_id(member.id, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(updated.role, Role::Officer);
    }

    #[tokio::test]
    async fn update_member_role_rejects_unknown_role() {
        let (state, admin) = get_test_state();
        let member = insert_member(&state, "juan@test.org");

        let response = update_member_role_endpoint(
            Path(member.id.as_i64()),
            State(state),
            Extension(admin),
            Form(RoleFormData {
                role: "president".to_owned(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn delete_member_endpoint_removes_member() {
        let (state, _) = get_test_state();
        let member = insert_member(&state, "juan@test.org");

        let response = delete_member_endpoint(Path(member.id.as_i64()), State(state.clone())).await;

        assert_eq!(response.status(), StatusCode::OK);
        let result = get_member_by_id(member.id, &state.db_connection.lock().unwrap());
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn delete_missing_member_returns_error_alert() {
        let (state, _) = get_test_state();

        let response = delete_member_endpoint(Path(999), State(state)).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let fragment = parse_html_fragment(response).await;
        assert_valid_html(&fragment);
    }

    #[tokio::test]
    async fn member_id_is_stable_across_lookups() {
        let (state, admin) = get_test_state();

        let looked_up =
            get_member_by_id(admin.id, &state.db_connection.lock().unwrap()).unwrap();

        assert_eq!(looked_up.id, MemberId::new(admin.id.as_i64()));
    }
}
