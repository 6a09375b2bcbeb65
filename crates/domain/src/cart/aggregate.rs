//! Cart aggregate implementation.

use chrono::{DateTime, Utc};
use common::{MarketId, ProductId, UserId};
use document_store::Version;
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;
use crate::money::Money;

use super::events::{
    AddressChangedData, CartClearedData, CartCreatedData, ProductAddedData, ProductRemovedData,
};
use super::{Address, CartError, CartEvent, CartOrder, OrderState, ProductInstance, totals};

/// Cart aggregate root.
///
/// One cart per user. Products are grouped into one order per market; an
/// order is opened by the first product of its market and dropped with its
/// last product. Order and cart totals are rebuilt after every change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    /// Owner of the cart.
    user: Option<UserId>,

    /// Delivery address, if set.
    #[serde(default)]
    address: Option<Address>,

    /// Sum of the order totals.
    total: Money,

    /// One order per market, in the order they were opened.
    orders: Vec<CartOrder>,

    /// When the cart was created.
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,

    /// Stored version, kept outside the document body.
    #[serde(skip)]
    version: Version,
}

impl Aggregate for Cart {
    type Event = CartEvent;
    type Error = CartError;

    fn aggregate_type() -> &'static str {
        "Cart"
    }

    fn collection() -> &'static str {
        "carts"
    }

    fn is_created(&self) -> bool {
        self.user.is_some()
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            CartEvent::CartCreated(data) => self.apply_cart_created(data),
            CartEvent::ProductAdded(data) => self.apply_product_added(data),
            CartEvent::ProductRemoved(data) => self.apply_product_removed(data),
            CartEvent::AddressChanged(data) => self.address = Some(data.address),
            CartEvent::CartCleared(_) => {
                self.orders.clear();
                self.refresh_totals();
            }
        }
    }
}

// Query methods
impl Cart {
    /// Returns the owner.
    pub fn user(&self) -> Option<&UserId> {
        self.user.as_ref()
    }

    /// Returns the delivery address.
    pub fn address(&self) -> Option<&Address> {
        self.address.as_ref()
    }

    /// Returns the cart total.
    pub fn total(&self) -> Money {
        self.total
    }

    /// Returns the per-market orders.
    pub fn orders(&self) -> &[CartOrder] {
        &self.orders
    }

    /// Returns the order for a market.
    pub fn order(&self, market: &MarketId) -> Option<&CartOrder> {
        self.orders.iter().find(|o| &o.market == market)
    }

    /// Returns where the market's order stands.
    pub fn order_state(&self, market: &MarketId) -> OrderState {
        match self.order(market) {
            None => OrderState::Absent,
            Some(order) if order.is_empty() => OrderState::Created,
            Some(_) => OrderState::Populated,
        }
    }

    /// Returns the number of product instances across all orders.
    pub fn product_count(&self) -> usize {
        self.orders.iter().map(|o| o.products.len()).sum()
    }

    /// Returns true if the cart holds no orders.
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Returns when the cart was created.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}

// Command methods (return events, don't mutate)
impl Cart {
    /// Creates the cart for a user.
    pub fn create(&self, user: UserId) -> Result<Vec<CartEvent>, CartError> {
        if self.is_created() {
            return Err(CartError::AlreadyCreated);
        }

        Ok(vec![CartEvent::CartCreated(CartCreatedData {
            user,
            created_at: Utc::now(),
        })])
    }

    /// Adds a picked product at `quantity`, replacing any earlier instance of
    /// the same product in its market's order.
    pub fn add_product(
        &self,
        product: ProductInstance,
        quantity: u32,
    ) -> Result<Vec<CartEvent>, CartError> {
        self.ensure_created()?;

        let product = product.with_quantity(quantity)?;

        Ok(vec![CartEvent::ProductAdded(ProductAddedData { product })])
    }

    /// Removes a product from its market's order.
    ///
    /// Removing something the cart doesn't hold is a no-op.
    pub fn remove_product(
        &self,
        product_id: &ProductId,
        market: &MarketId,
    ) -> Result<Vec<CartEvent>, CartError> {
        self.ensure_created()?;

        let Some(order) = self.order(market) else {
            return Ok(vec![]);
        };
        if order.product(product_id).is_none() {
            return Ok(vec![]);
        }

        Ok(vec![CartEvent::ProductRemoved(ProductRemovedData {
            market: market.clone(),
            product_id: product_id.clone(),
        })])
    }

    /// Sets the delivery address.
    pub fn change_address(&self, address: Address) -> Result<Vec<CartEvent>, CartError> {
        self.ensure_created()?;

        if self.address.as_ref() == Some(&address) {
            return Ok(vec![]);
        }

        Ok(vec![CartEvent::AddressChanged(AddressChangedData {
            address,
        })])
    }

    /// Removes every order.
    pub fn clear(&self) -> Result<Vec<CartEvent>, CartError> {
        self.ensure_created()?;

        if self.orders.is_empty() {
            return Ok(vec![]);
        }

        Ok(vec![CartEvent::CartCleared(CartClearedData {
            cleared_at: Utc::now(),
        })])
    }

    fn ensure_created(&self) -> Result<(), CartError> {
        if !self.is_created() {
            return Err(CartError::CartNotFound);
        }
        Ok(())
    }
}

// Event application (private)
impl Cart {
    fn apply_cart_created(&mut self, data: CartCreatedData) {
        self.user = Some(data.user);
        self.created_at = Some(data.created_at);
        self.orders.clear();
        self.total = Money::zero();
    }

    fn apply_product_added(&mut self, data: ProductAddedData) {
        let product = data.product;

        let index = match self.orders.iter().position(|o| o.market == product.market) {
            Some(index) => index,
            None => {
                self.orders.push(CartOrder::new(product.market.clone()));
                self.orders.len() - 1
            }
        };

        let order = &mut self.orders[index];
        match order
            .products
            .iter_mut()
            .find(|p| p.product_id == product.product_id)
        {
            Some(existing) => *existing = product,
            None => order.products.push(product),
        }

        self.refresh_totals();
    }

    fn apply_product_removed(&mut self, data: ProductRemovedData) {
        if let Some(index) = self.orders.iter().position(|o| o.market == data.market) {
            let order = &mut self.orders[index];
            order.products.retain(|p| p.product_id != data.product_id);
            if order.is_empty() {
                self.orders.remove(index);
            }
        }

        self.refresh_totals();
    }

    fn refresh_totals(&mut self) {
        for order in &mut self.orders {
            totals::refresh_order(order);
        }
        self.total = totals::cart_total(&self.orders);
    }
}
