//! Error types for book store operations.

use thiserror::Error;

use crate::record::ValidationError;

/// Errors that can occur during book store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// No book row with the given id.
    #[error("book not found: id {0}\n  Suggestion: Run 'bookmatch list' to see stored ids")]
    BookNotFound(i64),

    /// The record cannot be persisted.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A stored JSON column no longer parses.
    #[error("book {id}: column '{column}' holds invalid JSON: {source}")]
    Decode {
        /// Row id.
        id: i64,
        /// Offending column.
        column: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    /// Returns true when the record itself was rejected, not the database.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
