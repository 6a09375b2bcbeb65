//! Cart domain events.

use chrono::{DateTime, Utc};
use common::{MarketId, ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

use super::{Address, ProductInstance};

/// Events that can occur on a cart aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CartEvent {
    /// Cart was created for a user.
    CartCreated(CartCreatedData),

    /// A product instance was added or replaced.
    ProductAdded(ProductAddedData),

    /// A product instance was removed.
    ProductRemoved(ProductRemovedData),

    /// The delivery address was set.
    AddressChanged(AddressChangedData),

    /// All orders were removed.
    CartCleared(CartClearedData),
}

impl DomainEvent for CartEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CartEvent::CartCreated(_) => "CartCreated",
            CartEvent::ProductAdded(_) => "ProductAdded",
            CartEvent::ProductRemoved(_) => "ProductRemoved",
            CartEvent::AddressChanged(_) => "AddressChanged",
            CartEvent::CartCleared(_) => "CartCleared",
        }
    }
}

/// Data for CartCreated event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartCreatedData {
    /// The owner of the cart.
    pub user: UserId,

    /// When the cart was created.
    pub created_at: DateTime<Utc>,
}

/// Data for ProductAdded event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductAddedData {
    /// The priced instance, already at its final quantity.
    pub product: ProductInstance,
}

/// Data for ProductRemoved event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRemovedData {
    /// Market of the order holding the product.
    pub market: MarketId,

    /// The removed product.
    pub product_id: ProductId,
}

/// Data for AddressChanged event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressChangedData {
    pub address: Address,
}

/// Data for CartCleared event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartClearedData {
    pub cleared_at: DateTime<Utc>,
}
