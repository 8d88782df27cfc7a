//! Alert system for displaying success and error messages to users.
//!
//! Alerts are swapped into the `#alert-container` element that the base page
//! layout renders at the bottom of every page, either as the response target
//! of a failed htmx request or as an out-of-band swap on success.

use maud::{Markup, html};

/// Alert message types for styling
#[derive(Debug, Clone, Copy)]
enum AlertType {
    Success,
    Error,
}

/// Renders alert messages with appropriate styling
pub struct AlertTemplate;

impl AlertTemplate {
    /// Create a new success alert
    pub fn success(message: &str, details: &str) -> Markup {
        alert(AlertType::Success, message, details)
    }

    /// Create a new error alert
    pub fn error(message: &str, details: &str) -> Markup {
        alert(AlertType::Error, message, details)
    }
}

fn alert(alert_type: AlertType, message: &str, details: &str) -> Markup {
    let (container_style, icon) = match alert_type {
        AlertType::Success => (
            "flex items-start gap-3 p-4 mb-4 rounded-lg border \
            text-green-800 border-green-300 bg-green-50 \
            dark:bg-gray-800 dark:text-green-400 dark:border-green-800",
            "✓",
        ),
        AlertType::Error => (
            "flex items-start gap-3 p-4 mb-4 rounded-lg border \
            text-red-800 border-red-300 bg-red-50 \
            dark:bg-gray-800 dark:text-red-400 dark:border-red-800",
            "✗",
        ),
    };

    html! {
        div
            id="alert-container"
            hx-swap-oob="true"
            class="w-full max-w-md px-4"
            style="position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
        {
            div class=(container_style) role="alert"
            {
                span aria-hidden="true" class="font-bold" { (icon) }

                div class="flex-1 text-sm"
                {
                    p class="font-medium" { (message) }

                    @if !details.is_empty()
                    {
                        p { (details) }
                    }
                }

                button
                    type="button"
                    class="ms-auto -mx-1.5 -my-1.5 rounded-lg p-1.5 inline-flex h-8 w-8 \
                        items-center justify-center hover:bg-gray-100 dark:hover:bg-gray-700"
                    aria-label="Close"
                    onclick="this.closest('[role=alert]').remove()"
                {
                    "×"
                }
            }
        }
    }
}

#[cfg(test)]
mod alert_tests {
    use super::AlertTemplate;

    #[test]
    fn success_alert_contains_message_and_details() {
        let markup = AlertTemplate::success("Saved", "The event was saved.").into_string();

        assert!(markup.contains("Saved"));
        assert!(markup.contains("The event was saved."));
        assert!(markup.contains("alert-container"));
    }

    #[test]
    fn error_alert_omits_empty_details() {
        let markup = AlertTemplate::error("Something went wrong", "").into_string();

        assert!(markup.contains("Something went wrong"));
        assert_eq!(markup.matches("<p").count(), 1);
    }
}
