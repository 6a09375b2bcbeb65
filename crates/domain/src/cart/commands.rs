//! Cart commands.

use common::{DocumentKey, MarketId, ProductId, UserId};

use crate::command::Command;

use super::{Address, Cart, OptionSelection, ProductInstance};

/// Request to price a product with its option picks.
///
/// Not a cart command: picking only reads the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickProduct {
    /// Internal or external product id.
    pub product_id: ProductId,

    /// Number of units wanted.
    pub quantity: u32,

    /// Picks per option group.
    pub options: Vec<OptionSelection>,
}

impl PickProduct {
    /// Creates a pick without option selections.
    pub fn new(product_id: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
            options: vec![],
        }
    }

    /// Adds the picks for one option group.
    pub fn with_option(mut self, selection: OptionSelection) -> Self {
        self.options.push(selection);
        self
    }
}

/// Command to create a user's cart if it doesn't exist yet.
#[derive(Debug, Clone)]
pub struct CreateCart {
    pub user: UserId,
}

impl CreateCart {
    pub fn new(user: UserId) -> Self {
        Self { user }
    }
}

impl Command for CreateCart {
    type Aggregate = Cart;

    fn document_key(&self) -> DocumentKey {
        DocumentKey::from(&self.user)
    }
}

/// Command to add a priced product instance to a cart.
#[derive(Debug, Clone)]
pub struct AddProduct {
    /// The cart owner.
    pub user: UserId,

    /// The picked product.
    pub product: ProductInstance,

    /// Number of units.
    pub quantity: u32,
}

impl AddProduct {
    pub fn new(user: UserId, product: ProductInstance, quantity: u32) -> Self {
        Self {
            user,
            product,
            quantity,
        }
    }
}

impl Command for AddProduct {
    type Aggregate = Cart;

    fn document_key(&self) -> DocumentKey {
        DocumentKey::from(&self.user)
    }
}

/// Command to remove a product from a cart.
#[derive(Debug, Clone)]
pub struct RemoveProduct {
    pub user: UserId,
    pub product_id: ProductId,
    /// Market of the order holding the product.
    pub market: MarketId,
}

impl RemoveProduct {
    pub fn new(user: UserId, product_id: ProductId, market: MarketId) -> Self {
        Self {
            user,
            product_id,
            market,
        }
    }
}

impl Command for RemoveProduct {
    type Aggregate = Cart;

    fn document_key(&self) -> DocumentKey {
        DocumentKey::from(&self.user)
    }
}

/// Command to set the delivery address.
#[derive(Debug, Clone)]
pub struct SetAddress {
    pub user: UserId,
    pub address: Address,
}

impl SetAddress {
    pub fn new(user: UserId, address: Address) -> Self {
        Self { user, address }
    }
}

impl Command for SetAddress {
    type Aggregate = Cart;

    fn document_key(&self) -> DocumentKey {
        DocumentKey::from(&self.user)
    }
}

/// Command to empty a cart.
#[derive(Debug, Clone)]
pub struct ClearCart {
    pub user: UserId,
}

impl ClearCart {
    pub fn new(user: UserId) -> Self {
        Self { user }
    }
}

impl Command for ClearCart {
    type Aggregate = Cart;

    fn document_key(&self) -> DocumentKey {
        DocumentKey::from(&self.user)
    }
}
