//! The holding page shown to members whose registration has not been verified
//! by an admin yet.

use axum::response::{IntoResponse, Response};
use maud::html;

use crate::{
    endpoints,
    html::{LINK_STYLE, PAGE_CONTAINER_STYLE, base},
};

/// Display the page telling an unverified member to wait for an admin.
pub async fn get_pending_page() -> Response {
    let content = html!(
        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 max-w-lg mx-auto text-center"
            {
                h1 class="text-xl font-bold" { "Thanks for registering!" }

                p class="text-gray-500 dark:text-gray-400"
                {
                    "Your account is waiting for an admin to verify it. You will be able to \
                    see events, files, and the member directory once that happens. Check \
                    back later, or ask one of the officers to give an admin a nudge."
                }

                a href=(endpoints::LOG_OUT) class=(LINK_STYLE) { "Log out" }
            }
        }
    );

    base("Pending Verification", &[], &content).into_response()
}
