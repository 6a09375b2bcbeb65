//! Cart aggregate, option selection and pricing.

mod aggregate;
mod commands;
mod events;
pub mod options;
pub mod pricing;
mod service;
mod state;
pub mod totals;
mod value_objects;

pub use aggregate::Cart;
pub use commands::*;
pub use events::{
    AddressChangedData, CartClearedData, CartCreatedData, CartEvent, ProductAddedData,
    ProductRemovedData,
};
pub use service::CartService;
pub use state::OrderState;
pub use value_objects::{
    Address, CartOrder, Coordinates, OptionSelection, ProductInstance, ResolvedOptionGroup,
    SelectedElement,
};

use common::{OptionGroupId, ProductId};
use thiserror::Error;

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The user has no cart yet.
    #[error("User doesn't have a cart")]
    CartNotFound,

    /// The cart was already created.
    #[error("Cart already created")]
    AlreadyCreated,

    /// The catalog has no such product.
    #[error("Product not found: {product_id}")]
    ProductNotFound { product_id: ProductId },

    /// Subproducts are only sold as options of another product.
    #[error("Product {product_id} cannot be purchased on its own")]
    ProductNotPurchasable { product_id: ProductId },

    /// Invalid quantity.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    /// A required option group has no selection.
    #[error("Option '{label}' ({group_id}) is required")]
    MissingRequiredOption {
        group_id: OptionGroupId,
        label: String,
    },

    /// The selected quantity is outside the group's bounds.
    #[error("Option '{label}' ({group_id}) allows between {min} and {max} selections, got {actual}")]
    OptionQuantityOutOfBounds {
        group_id: OptionGroupId,
        label: String,
        min: u32,
        max: u32,
        actual: u32,
    },

    /// A selection names an element the group doesn't offer.
    #[error("Option {group_id} has no element {element_id}")]
    UnknownOptionElement {
        group_id: OptionGroupId,
        element_id: ProductId,
    },

    /// The priced line is too large to represent.
    #[error("Price is out of range for the requested quantity")]
    PriceOutOfRange,

    /// A stored selection names an element its group doesn't hold.
    #[error("Selected element {element_id} is missing from option {group_id}")]
    UnresolvedOptionElement {
        group_id: OptionGroupId,
        element_id: ProductId,
    },
}

impl CartError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            CartError::CartNotFound => "CART_NOT_FOUND",
            CartError::AlreadyCreated => "CART_ALREADY_CREATED",
            CartError::ProductNotFound { .. } => "PRODUCT_NOT_FOUND",
            CartError::ProductNotPurchasable { .. } => "PRODUCT_NOT_PURCHASABLE",
            CartError::InvalidQuantity { .. } => "INVALID_QUANTITY",
            CartError::MissingRequiredOption { .. } => "MISSING_REQUIRED_OPTION",
            CartError::OptionQuantityOutOfBounds { .. } => "OPTION_QUANTITY_OUT_OF_BOUNDS",
            CartError::UnknownOptionElement { .. } => "UNKNOWN_OPTION_ELEMENT",
            CartError::PriceOutOfRange => "PRICE_OUT_OF_RANGE",
            CartError::UnresolvedOptionElement { .. } => "UNRESOLVED_OPTION_ELEMENT",
        }
    }

    /// Returns true if the caller can fix the request.
    ///
    /// `UnresolvedOptionElement` points at inconsistent stored data instead.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, CartError::UnresolvedOptionElement { .. })
    }
}
