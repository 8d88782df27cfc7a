//! The endpoint for deleting a shared file.
//!
//! Deletion is row-first: the database record goes, then the file on disk. A
//! failed unlink leaves the file behind and is logged, not compensated, so
//! the list never shows a file that cannot be downloaded.

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::Response,
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    alert::AlertTemplate,
    database_id::DatabaseId,
    files::db::{delete_file_record, get_file_by_id},
    shared_templates::render,
};

/// The state needed to delete a shared file.
#[derive(Debug, Clone)]
pub struct DeleteFileState {
    /// The directory where uploaded files are stored.
    pub upload_dir: PathBuf,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteFileState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            upload_dir: state.upload_dir.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Delete the shared file with `file_id`: the database record first, then the
/// file in the upload directory.
pub async fn delete_file_endpoint(
    Path(file_id): Path<DatabaseId>,
    State(state): State<DeleteFileState>,
) -> Response {
    let file_name = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return Error::DatabaseLockError.into_alert_response();
            }
        };

        let record = match get_file_by_id(file_id, &connection) {
            Ok(record) => record,
            Err(Error::NotFound) => return Error::DeleteMissingFile.into_alert_response(),
            Err(error) => {
                tracing::error!("could not retrieve file record {file_id}: {error}");
                return error.into_alert_response();
            }
        };

        match delete_file_record(file_id, &connection) {
            Ok(_) => {}
            Err(Error::DeleteMissingFile) => {
                return Error::DeleteMissingFile.into_alert_response();
            }
            Err(error) => {
                tracing::error!(
                    "An unexpected error occurred while deleting file record {file_id}: {error}"
                );
                return error.into_alert_response();
            }
        }

        record.file_name
    };

    if let Err(error) = tokio::fs::remove_file(state.upload_dir.join(&file_name)).await {
        // The record is already gone; the orphaned file is logged, not restored.
        tracing::error!(
            "deleted record for file {file_name} but could not remove it from disk: {error}"
        );
    }

    render(
        StatusCode::OK,
        AlertTemplate::success("File deleted", "The file has been deleted."),
    )
}
