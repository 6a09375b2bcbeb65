//! Read model over markets, categories and products.
//!
//! Products are stored as [`ProductRecord`]s whose option groups reference
//! their elements by product id. Lookups through a [`Catalog`] return the
//! populated [`Product`] view, where each element id has been replaced by a
//! snapshot of the element product.

mod memory;
mod store;

use std::collections::HashMap;

use async_trait::async_trait;
use common::{CategoryId, MarketId, OptionGroupId, ProductId};
use document_store::DocumentStoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::money::Money;

pub use memory::InMemoryCatalog;
pub use store::{CATEGORIES, DocumentCatalog, MARKETS, PRODUCTS};

/// Errors raised while reading or writing the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The backing store failed.
    #[error("Catalog store error: {0}")]
    Store(#[from] DocumentStoreError),

    /// A stored record could not be decoded.
    #[error("Catalog record is malformed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A store selling products on the marketplace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    pub id: MarketId,
    pub name: String,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub has_free_delivery: bool,
    /// Estimated delivery time in minutes.
    #[serde(default)]
    pub estimated_time: Option<u32>,
    #[serde(default)]
    pub categories: Vec<CategoryId>,
}

/// A product category inside a market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub market: Option<MarketId>,
    #[serde(default)]
    pub parent: Option<CategoryId>,
}

/// Stored definition of an option group. Elements are product ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionGroupRecord {
    pub id: OptionGroupId,
    /// Opaque control tag such as `checkbox` or `radio`.
    #[serde(rename = "type")]
    pub control_type: String,
    pub label: String,
    #[serde(default)]
    pub iterable: bool,
    pub min: u32,
    pub max: u32,
    #[serde(default)]
    pub uses_price: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub elements: Vec<ProductId>,
}

/// A product as stored in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: ProductId,
    /// Identifier in the external marketplace the product was imported from.
    #[serde(default)]
    pub external_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Money,
    #[serde(default)]
    pub stock: u32,
    #[serde(default = "default_available")]
    pub is_available: bool,
    #[serde(default)]
    pub is_subproduct: bool,
    pub market: MarketId,
    #[serde(default)]
    pub categories: Vec<CategoryId>,
    #[serde(default)]
    pub options: Vec<OptionGroupRecord>,
}

fn default_available() -> bool {
    true
}

impl ProductRecord {
    /// Returns every element id referenced by the option groups, deduplicated.
    pub fn element_ids(&self) -> Vec<ProductId> {
        let mut ids: Vec<ProductId> = self
            .options
            .iter()
            .flat_map(|group| group.elements.iter().cloned())
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// Replaces element ids by element snapshots.
    ///
    /// Ids missing from `elements` are dropped with a warning.
    pub fn populate(self, elements: &HashMap<ProductId, OptionElement>) -> Product {
        let options = self
            .options
            .into_iter()
            .map(|group| {
                let resolved = group
                    .elements
                    .iter()
                    .filter_map(|element_id| {
                        let element = elements.get(element_id).cloned();
                        if element.is_none() {
                            tracing::warn!(
                                product_id = %self.id,
                                group_id = %group.id,
                                element_id = %element_id,
                                "Option element does not resolve to a product, dropping it"
                            );
                        }
                        element
                    })
                    .collect();

                OptionGroup {
                    id: group.id,
                    control_type: group.control_type,
                    label: group.label,
                    iterable: group.iterable,
                    min: group.min,
                    max: group.max,
                    uses_price: group.uses_price,
                    required: group.required,
                    elements: resolved,
                }
            })
            .collect();

        Product {
            id: self.id,
            external_id: self.external_id,
            name: self.name,
            description: self.description,
            price: self.price,
            stock: self.stock,
            is_available: self.is_available,
            is_subproduct: self.is_subproduct,
            market: self.market,
            categories: self.categories,
            options,
        }
    }
}

/// Snapshot of a subproduct offered inside an option group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionElement {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub is_available: bool,
}

impl From<&ProductRecord> for OptionElement {
    fn from(record: &ProductRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            price: record.price,
            is_available: record.is_available,
        }
    }
}

/// An option group with its elements resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionGroup {
    pub id: OptionGroupId,
    #[serde(rename = "type")]
    pub control_type: String,
    pub label: String,
    pub iterable: bool,
    pub min: u32,
    pub max: u32,
    pub uses_price: bool,
    pub required: bool,
    pub elements: Vec<OptionElement>,
}

impl OptionGroup {
    /// Finds an element by id.
    pub fn element(&self, element_id: &ProductId) -> Option<&OptionElement> {
        self.elements.iter().find(|e| &e.id == element_id)
    }
}

/// A product with its option groups populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub external_id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub stock: u32,
    pub is_available: bool,
    pub is_subproduct: bool,
    pub market: MarketId,
    pub categories: Vec<CategoryId>,
    pub options: Vec<OptionGroup>,
}

/// Read access to the catalog.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Finds a product by internal id, falling back to its external id.
    async fn find_product_by_id(&self, id: &ProductId) -> Result<Option<Product>, CatalogError>;

    /// Finds a market by id.
    async fn find_market_by_id(&self, id: &MarketId) -> Result<Option<Market>, CatalogError>;

    /// Finds a category by id.
    async fn find_category_by_id(&self, id: &CategoryId)
    -> Result<Option<Category>, CatalogError>;

    /// Lists the products of a market. Subproducts are only included on request.
    async fn list_products(
        &self,
        market: &MarketId,
        include_subproducts: bool,
    ) -> Result<Vec<ProductRecord>, CatalogError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheese() -> ProductRecord {
        ProductRecord {
            id: ProductId::new("cheese"),
            external_id: None,
            name: "Extra cheese".to_string(),
            description: None,
            price: Money::from_cents(99),
            stock: 10,
            is_available: true,
            is_subproduct: true,
            market: MarketId::new("m1"),
            categories: vec![],
            options: vec![],
        }
    }

    fn pizza() -> ProductRecord {
        ProductRecord {
            id: ProductId::new("pizza"),
            external_id: Some("Q-100".to_string()),
            name: "Pizza".to_string(),
            description: Some("Large".to_string()),
            price: Money::from_cents(499),
            stock: 5,
            is_available: true,
            is_subproduct: false,
            market: MarketId::new("m1"),
            categories: vec![CategoryId::new("c1")],
            options: vec![
                OptionGroupRecord {
                    id: OptionGroupId::new("toppings"),
                    control_type: "checkbox".to_string(),
                    label: "Toppings".to_string(),
                    iterable: true,
                    min: 1,
                    max: 2,
                    uses_price: true,
                    required: false,
                    elements: vec![ProductId::new("cheese"), ProductId::new("ghost")],
                },
                OptionGroupRecord {
                    id: OptionGroupId::new("extras"),
                    control_type: "radio".to_string(),
                    label: "Extras".to_string(),
                    iterable: false,
                    min: 0,
                    max: 1,
                    uses_price: false,
                    required: false,
                    elements: vec![ProductId::new("cheese")],
                },
            ],
        }
    }

    #[test]
    fn test_element_ids_are_deduplicated() {
        let ids = pizza().element_ids();
        assert_eq!(ids, vec![ProductId::new("cheese"), ProductId::new("ghost")]);
    }

    #[test]
    fn test_populate_resolves_and_drops_missing_elements() {
        let cheese = cheese();
        let elements = HashMap::from([(cheese.id.clone(), OptionElement::from(&cheese))]);

        let product = pizza().populate(&elements);

        assert_eq!(product.options.len(), 2);
        let toppings = &product.options[0];
        assert_eq!(toppings.elements.len(), 1);
        assert_eq!(toppings.elements[0].name, "Extra cheese");
        assert_eq!(toppings.elements[0].price.cents(), 99);
        assert!(toppings.element(&ProductId::new("ghost")).is_none());
        assert!(toppings.element(&ProductId::new("cheese")).is_some());
    }

    #[test]
    fn test_record_defaults_when_fields_missing() {
        let json = serde_json::json!({
            "id": "p1",
            "name": "Soda",
            "price": 250,
            "market": "m1",
            "options": [{ "id": "g1", "type": "radio", "label": "Size", "min": 1, "max": 1 }]
        });

        let record: ProductRecord = serde_json::from_value(json).unwrap();

        assert!(record.is_available);
        assert!(!record.is_subproduct);
        assert_eq!(record.stock, 0);
        assert!(!record.options[0].required);
        assert!(record.options[0].elements.is_empty());
    }
}
