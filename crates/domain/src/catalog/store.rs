use std::collections::HashMap;

use async_trait::async_trait;
use common::{CategoryId, DocumentKey, MarketId, ProductId};
use document_store::{DocumentQuery, DocumentStore, DocumentStoreExt, PutOptions, Version};

use super::{Catalog, CatalogError, Category, Market, OptionElement, Product, ProductRecord};

/// Collection holding [`ProductRecord`]s.
pub const PRODUCTS: &str = "products";
/// Collection holding [`Market`]s.
pub const MARKETS: &str = "markets";
/// Collection holding [`Category`]s.
pub const CATEGORIES: &str = "categories";

/// Catalog backed by a document store.
///
/// Writes are unconditional: catalog documents are owned by the import
/// pipeline and the last import wins.
#[derive(Debug, Clone)]
pub struct DocumentCatalog<S> {
    store: S,
}

impl<S: DocumentStore> DocumentCatalog<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn save_product(&self, product: &ProductRecord) -> Result<Version, CatalogError> {
        let key = DocumentKey::from(&product.id);
        Ok(self
            .store
            .put_json(PRODUCTS, &key, product, PutOptions::new())
            .await?)
    }

    pub async fn save_market(&self, market: &Market) -> Result<Version, CatalogError> {
        let key = DocumentKey::from(&market.id);
        Ok(self
            .store
            .put_json(MARKETS, &key, market, PutOptions::new())
            .await?)
    }

    pub async fn save_category(&self, category: &Category) -> Result<Version, CatalogError> {
        let key = DocumentKey::from(&category.id);
        Ok(self
            .store
            .put_json(CATEGORIES, &key, category, PutOptions::new())
            .await?)
    }

    async fn record_by_id(&self, id: &ProductId) -> Result<Option<ProductRecord>, CatalogError> {
        if let Some((record, _)) = self
            .store
            .get_json::<ProductRecord>(PRODUCTS, &DocumentKey::from(id))
            .await?
        {
            return Ok(Some(record));
        }

        let query = DocumentQuery::collection(PRODUCTS)
            .field_equals("external_id", id.as_str())
            .limit(1);

        match self.store.query(query).await?.into_iter().next() {
            Some(document) => Ok(Some(document.into_value()?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl<S: DocumentStore> Catalog for DocumentCatalog<S> {
    #[tracing::instrument(skip(self))]
    async fn find_product_by_id(&self, id: &ProductId) -> Result<Option<Product>, CatalogError> {
        let Some(record) = self.record_by_id(id).await? else {
            return Ok(None);
        };

        let mut elements = HashMap::new();
        for element_id in record.element_ids() {
            if let Some((element, _)) = self
                .store
                .get_json::<ProductRecord>(PRODUCTS, &DocumentKey::from(&element_id))
                .await?
            {
                elements.insert(element_id, OptionElement::from(&element));
            }
        }

        Ok(Some(record.populate(&elements)))
    }

    async fn find_market_by_id(&self, id: &MarketId) -> Result<Option<Market>, CatalogError> {
        Ok(self
            .store
            .get_json::<Market>(MARKETS, &DocumentKey::from(id))
            .await?
            .map(|(market, _)| market))
    }

    async fn find_category_by_id(
        &self,
        id: &CategoryId,
    ) -> Result<Option<Category>, CatalogError> {
        Ok(self
            .store
            .get_json::<Category>(CATEGORIES, &DocumentKey::from(id))
            .await?
            .map(|(category, _)| category))
    }

    async fn list_products(
        &self,
        market: &MarketId,
        include_subproducts: bool,
    ) -> Result<Vec<ProductRecord>, CatalogError> {
        let query = DocumentQuery::collection(PRODUCTS).field_equals("market", market.as_str());

        let mut products = Vec::new();
        for document in self.store.query(query).await? {
            let record: ProductRecord = document.into_value()?;
            if include_subproducts || !record.is_subproduct {
                products.push(record);
            }
        }
        Ok(products)
    }
}

#[cfg(test)]
mod tests {
    use common::OptionGroupId;
    use document_store::InMemoryDocumentStore;

    use super::*;
    use crate::catalog::OptionGroupRecord;
    use crate::money::Money;

    fn record(id: &str, market: &str, subproduct: bool) -> ProductRecord {
        ProductRecord {
            id: ProductId::new(id),
            external_id: None,
            name: id.to_uppercase(),
            description: None,
            price: Money::from_cents(300),
            stock: 3,
            is_available: true,
            is_subproduct: subproduct,
            market: MarketId::new(market),
            categories: vec![],
            options: vec![],
        }
    }

    #[tokio::test]
    async fn test_saved_product_is_found_populated() {
        let catalog = DocumentCatalog::new(InMemoryDocumentStore::new());
        catalog.save_product(&record("sauce", "m1", true)).await.unwrap();

        let mut wings = record("wings", "m1", false);
        wings.external_id = Some("Q-9".to_string());
        wings.options.push(OptionGroupRecord {
            id: OptionGroupId::new("sauces"),
            control_type: "radio".to_string(),
            label: "Sauce".to_string(),
            iterable: false,
            min: 1,
            max: 1,
            uses_price: false,
            required: true,
            elements: vec![ProductId::new("sauce"), ProductId::new("missing")],
        });
        catalog.save_product(&wings).await.unwrap();

        let by_id = catalog
            .find_product_by_id(&ProductId::new("wings"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_id.options[0].elements.len(), 1);
        assert_eq!(by_id.options[0].elements[0].name, "SAUCE");

        let by_external = catalog
            .find_product_by_id(&ProductId::new("Q-9"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_external.id, ProductId::new("wings"));
    }

    #[tokio::test]
    async fn test_missing_product_is_none() {
        let catalog = DocumentCatalog::new(InMemoryDocumentStore::new());
        let found = catalog
            .find_product_by_id(&ProductId::new("ghost"))
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_list_products_by_market() {
        let catalog = DocumentCatalog::new(InMemoryDocumentStore::new());
        catalog.save_product(&record("a", "m1", false)).await.unwrap();
        catalog.save_product(&record("b", "m2", false)).await.unwrap();
        catalog.save_product(&record("c", "m1", true)).await.unwrap();

        let products = catalog
            .list_products(&MarketId::new("m1"), false)
            .await
            .unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id, ProductId::new("a"));

        let products = catalog
            .list_products(&MarketId::new("m1"), true)
            .await
            .unwrap();
        assert_eq!(products.len(), 2);
    }

    #[tokio::test]
    async fn test_save_and_find_market() {
        let catalog = DocumentCatalog::new(InMemoryDocumentStore::new());
        let market = Market {
            id: MarketId::new("m1"),
            name: "Bakery".to_string(),
            logo: Some("bakery.png".to_string()),
            address: None,
            has_free_delivery: false,
            estimated_time: None,
            categories: vec![],
        };
        catalog.save_market(&market).await.unwrap();

        let found = catalog
            .find_market_by_id(&MarketId::new("m1"))
            .await
            .unwrap();
        assert_eq!(found, Some(market));
    }
}
