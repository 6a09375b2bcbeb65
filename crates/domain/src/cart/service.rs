//! Cart service wiring the catalog, option selection and the cart aggregate.

use common::{DocumentKey, ProductId, UserId};
use document_store::DocumentStore;

use crate::aggregate::Aggregate;
use crate::catalog::Catalog;
use crate::command::{Command, CommandHandler, CommandResult};
use crate::error::DomainError;

use super::options::resolve_selections;
use super::{
    AddProduct, Cart, CartError, CartEvent, ClearCart, CreateCart, PickProduct, ProductInstance,
    RemoveProduct, SetAddress,
};

impl From<CartError> for DomainError {
    fn from(e: CartError) -> Self {
        DomainError::Cart(e)
    }
}

/// Service for managing carts.
///
/// Provides a high-level API for cart operations: it resolves products
/// through the catalog, prices them, and runs the cart commands through the
/// command handler.
pub struct CartService<S: DocumentStore, C: Catalog> {
    handler: CommandHandler<S, Cart>,
    catalog: C,
}

impl<S: DocumentStore, C: Catalog> CartService<S, C> {
    /// Creates a new cart service.
    pub fn new(store: S, catalog: C) -> Self {
        Self {
            handler: CommandHandler::new(store),
            catalog,
        }
    }

    /// Sets how many times a command is re-run after a write conflict.
    pub fn with_max_conflict_retries(self, retries: u32) -> Self {
        Self {
            handler: self.handler.with_max_conflict_retries(retries),
            catalog: self.catalog,
        }
    }

    /// Returns the catalog products are resolved from.
    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Reads a user's cart without creating it.
    #[tracing::instrument(skip(self), fields(user_id = %user))]
    pub async fn get_cart(&self, user: &UserId) -> Result<Option<Cart>, DomainError> {
        self.handler.load(&DocumentKey::from(user)).await
    }

    /// Returns the user's cart, creating an empty one on first access.
    #[tracing::instrument(skip(self), fields(user_id = %user))]
    pub async fn get_or_create(&self, user: &UserId) -> Result<Cart, DomainError> {
        let cmd = CreateCart::new(user.clone());
        let owner = cmd.user.clone();

        let result = self
            .run("create_cart", &cmd, |cart| {
                if cart.is_created() {
                    return Ok(vec![]);
                }
                cart.create(owner.clone())
            })
            .await?;

        if !result.events.is_empty() {
            tracing::info!(user_id = %user, "Cart created");
        }
        Ok(result.aggregate)
    }

    /// Resolves a product and its option picks into a priced instance at
    /// quantity 1.
    #[tracing::instrument(skip(self, cmd), fields(product_id = %cmd.product_id, quantity = cmd.quantity))]
    pub async fn pick_product(&self, cmd: &PickProduct) -> Result<ProductInstance, DomainError> {
        let result = self.pick(cmd).await;
        if let Err(e) = &result {
            observe_failure("pick_product", e);
        }
        result
    }

    async fn pick(&self, cmd: &PickProduct) -> Result<ProductInstance, DomainError> {
        if cmd.quantity == 0 {
            return Err(CartError::InvalidQuantity {
                quantity: cmd.quantity,
            }
            .into());
        }

        let product = self
            .catalog
            .find_product_by_id(&cmd.product_id)
            .await?
            .ok_or_else(|| CartError::ProductNotFound {
                product_id: cmd.product_id.clone(),
            })?;

        if product.is_subproduct {
            return Err(CartError::ProductNotPurchasable {
                product_id: product.id,
            }
            .into());
        }

        let options = resolve_selections(&product.options, &cmd.options)?;
        let instance = ProductInstance::from_product(&product, options)?;

        tracing::debug!(
            product_id = %instance.product_id,
            market_id = %instance.market,
            unit_price = %instance.unit_price,
            "Product picked"
        );
        Ok(instance)
    }

    /// Adds a priced product instance to the user's cart.
    #[tracing::instrument(skip(self, cmd), fields(user_id = %cmd.user, product_id = %cmd.product.product_id, market_id = %cmd.product.market))]
    pub async fn add_product(&self, cmd: AddProduct) -> Result<CommandResult<Cart>, DomainError> {
        let product = cmd.product.clone();
        let quantity = cmd.quantity;

        self.run("add_product", &cmd, |cart| {
            cart.add_product(product.clone(), quantity)
        })
        .await
    }

    /// Picks a product and adds it to the user's cart at the requested
    /// quantity.
    #[tracing::instrument(skip(self, cmd), fields(user_id = %user, product_id = %cmd.product_id))]
    pub async fn add_to_cart(
        &self,
        user: &UserId,
        cmd: PickProduct,
    ) -> Result<CommandResult<Cart>, DomainError> {
        let product = self.pick_product(&cmd).await?;
        self.add_product(AddProduct::new(user.clone(), product, cmd.quantity))
            .await
    }

    /// Removes a product from the user's cart.
    #[tracing::instrument(skip(self))]
    pub async fn remove_product(
        &self,
        cmd: RemoveProduct,
    ) -> Result<CommandResult<Cart>, DomainError> {
        let product_id = cmd.product_id.clone();
        let market = cmd.market.clone();

        self.run("remove_product", &cmd, |cart| {
            cart.remove_product(&product_id, &market)
        })
        .await
    }

    /// Resolves a product through the catalog and removes it from the
    /// user's cart.
    #[tracing::instrument(skip(self), fields(user_id = %user, product_id = %product_id))]
    pub async fn remove_from_cart(
        &self,
        user: &UserId,
        product_id: &ProductId,
    ) -> Result<CommandResult<Cart>, DomainError> {
        let product = match self.catalog.find_product_by_id(product_id).await? {
            Some(product) => product,
            None => {
                let e = DomainError::from(CartError::ProductNotFound {
                    product_id: product_id.clone(),
                });
                observe_failure("remove_product", &e);
                return Err(e);
            }
        };

        self.remove_product(RemoveProduct::new(user.clone(), product.id, product.market))
            .await
    }

    /// Sets the delivery address of the user's cart.
    #[tracing::instrument(skip(self, cmd), fields(user_id = %cmd.user))]
    pub async fn set_address(&self, cmd: SetAddress) -> Result<CommandResult<Cart>, DomainError> {
        let address = cmd.address.clone();

        self.run("set_address", &cmd, |cart| {
            cart.change_address(address.clone())
        })
        .await
    }

    /// Empties the user's cart.
    #[tracing::instrument(skip(self))]
    pub async fn clear_cart(&self, cmd: ClearCart) -> Result<CommandResult<Cart>, DomainError> {
        self.run("clear_cart", &cmd, |cart| cart.clear()).await
    }

    async fn run<K, F>(
        &self,
        command: &'static str,
        cmd: &K,
        command_fn: F,
    ) -> Result<CommandResult<Cart>, DomainError>
    where
        K: Command<Aggregate = Cart>,
        F: Fn(&Cart) -> Result<Vec<CartEvent>, CartError> + Send + Sync,
    {
        metrics::counter!("cart_commands_total", "command" => command).increment(1);

        let result = self.handler.execute(&cmd.document_key(), command_fn).await;

        match &result {
            Ok(outcome) if outcome.events.is_empty() => {
                tracing::debug!(command, "Command made no change");
            }
            Ok(outcome) => {
                tracing::debug!(
                    command,
                    version = %outcome.new_version,
                    total = %outcome.aggregate.total(),
                    "Cart updated"
                );
            }
            Err(e) => observe_failure(command, e),
        }

        result
    }
}

fn observe_failure(command: &'static str, error: &DomainError) {
    match error {
        DomainError::Cart(e) if e.is_client_error() => {
            metrics::counter!("cart_validation_failures_total", "code" => e.code()).increment(1);
            tracing::info!(command, code = e.code(), error = %e, "Cart command rejected");
        }
        e if e.is_conflict() => {
            tracing::warn!(command, error = %e, "Cart command lost write race");
        }
        e => {
            tracing::error!(command, error = %e, "Cart command failed");
        }
    }
}
