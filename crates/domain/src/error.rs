//! Domain error types.

use document_store::DocumentStoreError;
use thiserror::Error;

use crate::cart::CartError;
use crate::catalog::CatalogError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the document store.
    #[error("Document store error: {0}")]
    DocumentStore(#[from] DocumentStoreError),

    /// The catalog could not be read.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// A cart operation was rejected.
    #[error("Cart error: {0}")]
    Cart(CartError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    /// Returns true if the error is an optimistic concurrency conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, DomainError::DocumentStore(e) if e.is_conflict())
    }

    /// Returns the cart error, if this is one.
    pub fn as_cart_error(&self) -> Option<&CartError> {
        match self {
            DomainError::Cart(e) => Some(e),
            _ => None,
        }
    }
}
