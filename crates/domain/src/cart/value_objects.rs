//! Value objects owned by the cart.

use common::{MarketId, OptionGroupId, ProductId};
use serde::{Deserialize, Serialize};

use crate::catalog::{OptionGroup, Product};
use crate::money::Money;

use super::CartError;
use super::pricing;

/// Geographic position of a delivery address.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Delivery address stored on the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub name: String,
    pub coordinates: Coordinates,
    pub phone_number: String,
    pub person_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub address_reference: Option<String>,
}

/// One picked element of an option group and how many of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedElement {
    pub element_id: ProductId,
    pub quantity: u32,
}

impl SelectedElement {
    pub fn new(element_id: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            element_id: element_id.into(),
            quantity,
        }
    }
}

/// The user's request for one option group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSelection {
    pub group_id: OptionGroupId,
    pub selected: Vec<SelectedElement>,
}

impl OptionSelection {
    pub fn new(group_id: impl Into<OptionGroupId>, selected: Vec<SelectedElement>) -> Self {
        Self {
            group_id: group_id.into(),
            selected,
        }
    }

    /// Sum of the quantities over all selected elements.
    pub fn total_quantity(&self) -> u32 {
        self.selected
            .iter()
            .fold(0u32, |acc, s| acc.saturating_add(s.quantity))
    }
}

/// An option group annotated with what was picked from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedOptionGroup {
    #[serde(flatten)]
    pub group: OptionGroup,
    /// Empty when the group was skipped.
    pub selected: Vec<SelectedElement>,
}

impl ResolvedOptionGroup {
    pub fn skipped(group: OptionGroup) -> Self {
        Self {
            group,
            selected: vec![],
        }
    }
}

/// Priced, quantity-applied copy of a catalog product held by a cart order.
///
/// Fields are copied at pick time, so later catalog changes don't affect it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductInstance {
    pub product_id: ProductId,
    pub external_id: Option<String>,
    pub name: String,
    pub market: MarketId,
    pub base_price: Money,
    /// Base price plus priced option surcharges.
    pub unit_price: Money,
    pub quantity: u32,
    /// Always `unit_price * quantity`.
    pub total: Money,
    pub options: Vec<ResolvedOptionGroup>,
}

impl ProductInstance {
    /// Snapshots a product with its resolved options at quantity 1.
    pub fn from_product(
        product: &Product,
        options: Vec<ResolvedOptionGroup>,
    ) -> Result<Self, CartError> {
        let unit_price = pricing::price(product.price, 1, &options)?;

        Ok(Self {
            product_id: product.id.clone(),
            external_id: product.external_id.clone(),
            name: product.name.clone(),
            market: product.market.clone(),
            base_price: product.price,
            unit_price,
            quantity: 1,
            total: unit_price,
            options,
        })
    }

    /// Re-prices the instance for `quantity` units.
    pub fn with_quantity(self, quantity: u32) -> Result<Self, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity { quantity });
        }

        let unit_price = pricing::price(self.base_price, 1, &self.options)?;
        let total = pricing::price(self.base_price, quantity, &self.options)?;

        Ok(Self {
            unit_price,
            quantity,
            total,
            ..self
        })
    }
}

/// The part of a cart belonging to one market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartOrder {
    pub market: MarketId,
    pub subtotal: Money,
    /// Delivery pricing is not implemented; always zero.
    pub delivery: Money,
    pub total: Money,
    pub products: Vec<ProductInstance>,
}

impl CartOrder {
    /// Creates an empty order for a market.
    pub fn new(market: MarketId) -> Self {
        Self {
            market,
            subtotal: Money::zero(),
            delivery: Money::zero(),
            total: Money::zero(),
            products: vec![],
        }
    }

    /// Finds a product instance by product id.
    pub fn product(&self, product_id: &ProductId) -> Option<&ProductInstance> {
        self.products.iter().find(|p| &p.product_id == product_id)
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
