use thiserror::Error;

use crate::{DocumentKey, Version};

/// Errors that can occur when interacting with the document store.
#[derive(Debug, Error)]
pub enum DocumentStoreError {
    /// A concurrency conflict occurred when writing a document.
    /// The expected version did not match the stored version.
    #[error(
        "Concurrency conflict for {collection}/{key}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        collection: String,
        key: DocumentKey,
        expected: Version,
        actual: Version,
    },

    /// The document was not found.
    #[error("Document not found: {collection}/{key}")]
    NotFound { collection: String, key: DocumentKey },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DocumentStoreError {
    /// Returns true if this error is an optimistic concurrency conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, DocumentStoreError::ConcurrencyConflict { .. })
    }
}

/// Result type for document store operations.
pub type Result<T> = std::result::Result<T, DocumentStoreError>;
