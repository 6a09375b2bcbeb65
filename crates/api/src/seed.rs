//! Catalog seeding from a JSON file.
//!
//! The file holds the markets, categories and products to write through
//! [`DocumentCatalog`]. Prices are integer cents, the same representation the
//! catalog stores:
//!
//! ```json
//! {
//!   "markets": [{ "id": "m1", "name": "Corner Market" }],
//!   "categories": [{ "id": "c1", "name": "Drinks", "market": "m1" }],
//!   "products": [{ "id": "soda", "name": "Soda", "price": 250, "market": "m1" }]
//! }
//! ```
//!
//! Writes are unconditional, so loading the same file twice leaves the
//! catalog as it was after the first load.

use std::path::{Path, PathBuf};

use document_store::DocumentStore;
use domain::{CatalogError, Category, DocumentCatalog, Market, ProductRecord};
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Failed to read seed file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Seed data is malformed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to write seed data: {0}")]
    Catalog(#[from] CatalogError),
}

/// Catalog content to load at start-up.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogSeed {
    #[serde(default)]
    pub markets: Vec<Market>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub products: Vec<ProductRecord>,
}

/// How many records of each kind were written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeedSummary {
    pub markets: usize,
    pub categories: usize,
    pub products: usize,
}

impl CatalogSeed {
    pub fn from_json(json: &str) -> Result<Self, SeedError> {
        Ok(serde_json::from_str(json)?)
    }

    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, SeedError> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| SeedError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_json(&json)
    }

    /// Writes every record. Elements are written with the products that
    /// use them, so the order inside `products` doesn't matter.
    #[tracing::instrument(skip_all)]
    pub async fn apply<S: DocumentStore>(
        &self,
        catalog: &DocumentCatalog<S>,
    ) -> Result<SeedSummary, SeedError> {
        for market in &self.markets {
            catalog.save_market(market).await?;
        }
        for category in &self.categories {
            catalog.save_category(category).await?;
        }
        for product in &self.products {
            catalog.save_product(product).await?;
        }

        let summary = SeedSummary {
            markets: self.markets.len(),
            categories: self.categories.len(),
            products: self.products.len(),
        };
        tracing::info!(
            markets = summary.markets,
            categories = summary.categories,
            products = summary.products,
            "Catalog seeded"
        );
        Ok(summary)
    }
}
