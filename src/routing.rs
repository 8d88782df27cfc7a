//! Application router configuration with the public, member, officer, and
//! admin route groups.

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::{
        admin_guard_hx, auth_guard, auth_guard_hx, auth_guard_unverified, get_log_in_page,
        get_log_out, get_pending_page, officer_guard, officer_guard_hx, post_log_in,
    },
    endpoints,
    event::{
        create_event_endpoint, delete_event_endpoint, get_edit_event_page, get_events_page,
        get_new_event_page, update_event_endpoint,
    },
    files::{delete_file_endpoint, get_files_page, get_upload_file_page, upload_file_endpoint},
    internal_server_error::get_internal_server_error_page,
    landing::get_landing_page,
    ledger::{
        create_entry_endpoint, delete_entry_endpoint, get_edit_entry_page, get_finance_page,
        get_new_entry_page, save_finance_range_endpoint, update_entry_endpoint,
    },
    member::{
        delete_member_endpoint, get_directory_page, get_members_page, get_register_page,
        register_member, update_member_role_endpoint, verify_member_endpoint,
    },
    not_found::get_404_not_found,
    payment::{
        create_payment_endpoint, get_my_payments_page, get_new_payment_page, get_payments_page,
        toggle_charge_endpoint,
    },
    story::{
        approve_story_endpoint, get_my_stories_page, get_new_story_page, get_review_stories_page,
        reject_story_endpoint, submit_story_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route(endpoints::ROOT, get(get_landing_page))
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::REGISTER_VIEW, get(get_register_page))
        .route(endpoints::REGISTER_API, post(register_member))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    // Logged-in but not necessarily verified: the pending page and logging
    // out must stay reachable for members awaiting verification.
    let unverified_routes = Router::new()
        .route(endpoints::PENDING_VIEW, get(get_pending_page))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_guard_unverified,
        ));

    let member_routes = Router::new()
        .route(endpoints::EVENTS_VIEW, get(get_events_page))
        .route(endpoints::DIRECTORY_VIEW, get(get_directory_page))
        .route(endpoints::FILES_VIEW, get(get_files_page))
        .route(endpoints::MY_PAYMENTS_VIEW, get(get_my_payments_page))
        .route(endpoints::MY_STORIES_VIEW, get(get_my_stories_page))
        .route(endpoints::NEW_STORY_VIEW, get(get_new_story_page))
        .nest_service(
            endpoints::DOWNLOADS,
            ServeDir::new(state.upload_dir.clone()),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These POST/PUT/DELETE routes need to use the HX-REDIRECT header for
    // auth redirects to work properly for HTMX requests.
    let member_routes = member_routes.merge(
        Router::new()
            .route(endpoints::POST_STORY, post(submit_story_endpoint))
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    let officer_routes = Router::new()
        .route(endpoints::FINANCE_VIEW, get(get_finance_page))
        .route(endpoints::NEW_ENTRY_VIEW, get(get_new_entry_page))
        .route(endpoints::EDIT_ENTRY_VIEW, get(get_edit_entry_page))
        .route(endpoints::NEW_EVENT_VIEW, get(get_new_event_page))
        .route(endpoints::EDIT_EVENT_VIEW, get(get_edit_event_page))
        .route(endpoints::PAYMENTS_VIEW, get(get_payments_page))
        .route(endpoints::NEW_PAYMENT_VIEW, get(get_new_payment_page))
        .route(endpoints::UPLOAD_FILE_VIEW, get(get_upload_file_page))
        .route(endpoints::REVIEW_STORIES_VIEW, get(get_review_stories_page))
        .route(endpoints::MEMBERS_VIEW, get(get_members_page))
        .layer(middleware::from_fn_with_state(state.clone(), officer_guard));

    let officer_routes = officer_routes.merge(
        Router::new()
            .route(endpoints::POST_ENTRY, post(create_entry_endpoint))
            .route(endpoints::PUT_ENTRY, put(update_entry_endpoint))
            .route(endpoints::DELETE_ENTRY, delete(delete_entry_endpoint))
            .route(
                endpoints::POST_FINANCE_RANGE,
                post(save_finance_range_endpoint),
            )
            .route(endpoints::POST_EVENT, post(create_event_endpoint))
            .route(endpoints::PUT_EVENT, put(update_event_endpoint))
            .route(endpoints::DELETE_EVENT, delete(delete_event_endpoint))
            .route(endpoints::POST_PAYMENT, post(create_payment_endpoint))
            .route(endpoints::TOGGLE_CHARGE, post(toggle_charge_endpoint))
            .route(endpoints::POST_FILE, post(upload_file_endpoint))
            .route(endpoints::DELETE_FILE, delete(delete_file_endpoint))
            .route(endpoints::APPROVE_STORY, post(approve_story_endpoint))
            .route(endpoints::REJECT_STORY, post(reject_story_endpoint))
            .route(endpoints::VERIFY_MEMBER, post(verify_member_endpoint))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                officer_guard_hx,
            )),
    );

    let admin_routes = Router::new()
        .route(
            endpoints::PUT_MEMBER_ROLE,
            put(update_member_role_endpoint),
        )
        .route(endpoints::DELETE_MEMBER, delete(delete_member_endpoint))
        .layer(middleware::from_fn_with_state(state.clone(), admin_guard_hx));

    public_routes
        .merge(unverified_routes)
        .merge(member_routes)
        .merge(officer_routes)
        .merge(admin_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}
