/*! Helpers for turning markup into HTTP responses. */

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use maud::Markup;

#[inline]
pub fn render(status_code: StatusCode, markup: Markup) -> Response {
    (status_code, Html(markup.into_string())).into_response()
}
