//! Domain layer for the marketplace cart.
//!
//! This crate provides:
//! - Aggregate and DomainEvent traits for document-backed aggregates
//! - Command trait and CommandHandler with optimistic concurrency retries
//! - The catalog read model and the Catalog accessor trait
//! - Option selection, line pricing and total recomputation
//! - The Cart aggregate and CartService

pub mod aggregate;
pub mod cart;
pub mod catalog;
pub mod command;
pub mod error;
pub mod money;

pub use aggregate::{Aggregate, DomainEvent};
pub use cart::{
    AddProduct, Address, Cart, CartError, CartEvent, CartOrder, CartService, ClearCart,
    Coordinates, CreateCart, OptionSelection, OrderState, PickProduct, ProductInstance,
    RemoveProduct, ResolvedOptionGroup, SelectedElement, SetAddress,
};
pub use catalog::{
    Catalog, CatalogError, Category, DocumentCatalog, InMemoryCatalog, Market, OptionElement,
    OptionGroup, OptionGroupRecord, Product, ProductRecord,
};
pub use command::{Command, CommandHandler, CommandResult, DEFAULT_MAX_CONFLICT_RETRIES};
pub use error::DomainError;
pub use money::Money;
