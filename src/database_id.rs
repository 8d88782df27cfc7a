//! The integer type used for SQLite row IDs throughout the application.

/// Alias for SQLite integer primary keys.
pub type DatabaseId = i64;
