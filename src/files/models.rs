//! Core shared-file domain types.

use time::Date;

use crate::{Error, database_id::DatabaseId, listing::Filterable};

/// A shared document: the database row describing a file in the upload
/// directory.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRecord {
    /// The file's ID in the application database.
    pub id: DatabaseId,
    /// The display title shown in the file list.
    pub title: String,
    /// The category used for filtering, e.g. "Sheet Music".
    pub category: String,
    /// The name of the file on disk, unique within the upload directory.
    pub file_name: String,
    /// The local date the file was uploaded.
    pub uploaded_at: Date,
}

impl Filterable for FileRecord {
    fn matches_search(&self, term: &str) -> bool {
        self.title.to_lowercase().contains(term) || self.file_name.to_lowercase().contains(term)
    }

    fn category(&self) -> &str {
        &self.category
    }

    fn date(&self) -> Option<Date> {
        Some(self.uploaded_at)
    }
}

/// The validated fields for a file record that has not been saved yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFileRecord {
    pub(crate) title: String,
    pub(crate) category: String,
    pub(crate) file_name: String,
    pub(crate) uploaded_at: Date,
}

impl NewFileRecord {
    /// Validate the fields for a new file record.
    ///
    /// # Errors
    /// Returns an [Error::EmptyField] if the title or category is blank.
    pub fn build(
        title: &str,
        category: &str,
        file_name: &str,
        uploaded_at: Date,
    ) -> Result<Self, Error> {
        let title = title.trim();
        let category = category.trim();

        if title.is_empty() {
            return Err(Error::EmptyField("Title"));
        }

        if category.is_empty() {
            return Err(Error::EmptyField("Category"));
        }

        Ok(Self {
            title: title.to_owned(),
            category: category.to_owned(),
            file_name: file_name.to_owned(),
            uploaded_at,
        })
    }
}
