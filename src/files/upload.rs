//! The page and endpoint for uploading a shared file.
//!
//! Uploads are two steps with no transaction across them: the file is written
//! to the upload directory first, then the database row is created. If the
//! row cannot be created the file is left behind and the orphan is logged.

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use axum::{
    Extension,
    extract::{FromRef, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    AppState, Error, endpoints,
    files::{db::create_file_record, models::NewFileRecord},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
        loading_spinner,
    },
    member::Member,
    navigation::NavBar,
    timezone::get_local_offset,
};

/// The state needed to upload a shared file.
#[derive(Debug, Clone)]
pub struct UploadFileState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The directory where uploaded files are written.
    pub upload_dir: PathBuf,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UploadFileState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            upload_dir: state.upload_dir.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

fn upload_file_view(viewer: &Member) -> Markup {
    let nav_bar = NavBar::new(endpoints::UPLOAD_FILE_VIEW, viewer.role).into_html();
    let spinner = loading_spinner();

    let content = html!(
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            form
                hx-post=(endpoints::POST_FILE)
                hx-encoding="multipart/form-data"
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                h2 class="text-xl font-bold" { "Upload File" }

                div
                {
                    label for="title" class=(FORM_LABEL_STYLE) { "Title" }

                    input
                        name="title"
                        id="title"
                        type="text"
                        required
                        autofocus
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="category" class=(FORM_LABEL_STYLE) { "Category" }

                    input
                        name="category"
                        id="category"
                        type="text"
                        placeholder="e.g. Schedules"
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="file" class=(FORM_LABEL_STYLE) { "File" }

                    input
                        name="file"
                        id="file"
                        type="file"
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
                {
                    span id="indicator" class="inline htmx-indicator" { (spinner) }
                    " Upload"
                }
            }
        }
    );

    base("Upload File", &[], &content)
}

/// Render the page for uploading a shared file.
pub async fn get_upload_file_page(viewer: Extension<Member>) -> Response {
    upload_file_view(&viewer.0).into_response()
}

/// Replace any character that is not safe in a file name with an underscore.
fn sanitize_file_name(raw: &str) -> String {
    raw.chars()
        .map(|character| {
            if character.is_ascii_alphanumeric() || matches!(character, '.' | '-' | '_') {
                character
            } else {
                '_'
            }
        })
        .collect()
}

struct UploadForm {
    title: String,
    category: String,
    file_name: Option<String>,
    data: Vec<u8>,
}

async fn parse_upload_form(mut multipart: Multipart) -> Result<UploadForm, Error> {
    let mut form = UploadForm {
        title: String::new(),
        category: String::new(),
        file_name: None,
        data: Vec::new(),
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| Error::MultipartError(error.to_string()))?
    {
        match field.name() {
            Some("title") => {
                form.title = field
                    .text()
                    .await
                    .map_err(|error| Error::MultipartError(error.to_string()))?;
            }
            Some("category") => {
                form.category = field
                    .text()
                    .await
                    .map_err(|error| Error::MultipartError(error.to_string()))?;
            }
            Some("file") => {
                form.file_name = field.file_name().map(str::to_owned);
                form.data = field
                    .bytes()
                    .await
                    .map_err(|error| Error::MultipartError(error.to_string()))?
                    .to_vec();
            }
            name => {
                tracing::debug!("ignoring unexpected multipart field {name:?}");
            }
        }
    }

    Ok(form)
}

/// Store an uploaded file and create its database record.
pub async fn upload_file_endpoint(
    State(state): State<UploadFileState>,
    multipart: Multipart,
) -> Response {
    let form = match parse_upload_form(multipart).await {
        Ok(form) => form,
        Err(error) => {
            tracing::error!("could not parse upload form: {error}");
            return error.into_alert_response();
        }
    };

    let Some(file_name) = form.file_name.filter(|name| !name.is_empty()) else {
        return Error::EmptyUpload.into_alert_response();
    };

    if form.data.is_empty() {
        return Error::EmptyUpload.into_alert_response();
    }

    let Some(local_timezone) = get_local_offset(&state.local_timezone) else {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        return Error::InvalidTimezoneError(state.local_timezone).into_alert_response();
    };
    let today = OffsetDateTime::now_utc().to_offset(local_timezone).date();

    // Prefix with a timestamp so repeat uploads of the same file do not clash.
    let stored_name = format!(
        "{}-{}",
        OffsetDateTime::now_utc().unix_timestamp_nanos(),
        sanitize_file_name(&file_name)
    );

    let record = match NewFileRecord::build(&form.title, &form.category, &stored_name, today) {
        Ok(record) => record,
        Err(error) => return error.into_alert_response(),
    };

    if let Err(error) = tokio::fs::create_dir_all(&state.upload_dir).await {
        tracing::error!("could not create upload directory: {error}");
        return Error::FileStorageError(error.to_string()).into_alert_response();
    }

    let path = state.upload_dir.join(&stored_name);
    if let Err(error) = tokio::fs::write(&path, &form.data).await {
        tracing::error!("could not write uploaded file {}: {error}", path.display());
        return Error::FileStorageError(error.to_string()).into_alert_response();
    }

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!(
                "could not acquire database lock, file {stored_name} is orphaned: {error}"
            );
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    if let Err(error) = create_file_record(record, &connection) {
        // The file stays on disk; the gap is logged rather than compensated.
        tracing::error!(
            "could not save record for uploaded file {stored_name}, \
            the file is orphaned in the upload directory: {error}"
        );
        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::FILES_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
