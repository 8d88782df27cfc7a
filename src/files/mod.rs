//! Shared files: uploads, the filtered file list, and downloads.

mod db;
mod delete;
mod list;
mod models;
mod upload;

pub use delete::{DeleteFileState, delete_file_endpoint};
pub use list::{FilesPageState, get_files_page};
pub use models::{FileRecord, NewFileRecord};
pub use upload::{UploadFileState, get_upload_file_page, upload_file_endpoint};

pub(crate) use db::create_file_table;
