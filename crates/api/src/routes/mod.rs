//! HTTP handlers.

pub mod cart;
pub mod catalog;
pub mod ops;

use document_store::DocumentStore;
use domain::{CartService, Catalog};

/// Shared application state accessible from all handlers.
pub struct AppState<S: DocumentStore, C: Catalog> {
    pub cart_service: CartService<S, C>,
}

impl<S: DocumentStore, C: Catalog> AppState<S, C> {
    pub fn catalog(&self) -> &C {
        self.cart_service.catalog()
    }
}
