use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{CategoryId, MarketId, ProductId};
use tokio::sync::RwLock;

use super::{Catalog, CatalogError, Category, Market, OptionElement, Product, ProductRecord};

#[derive(Debug, Default)]
struct Inner {
    products: HashMap<ProductId, ProductRecord>,
    markets: HashMap<MarketId, Market>,
    categories: HashMap<CategoryId, Category>,
}

/// Catalog held in memory, for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_product(&self, product: ProductRecord) {
        self.inner
            .write()
            .await
            .products
            .insert(product.id.clone(), product);
    }

    pub async fn insert_market(&self, market: Market) {
        self.inner
            .write()
            .await
            .markets
            .insert(market.id.clone(), market);
    }

    pub async fn insert_category(&self, category: Category) {
        self.inner
            .write()
            .await
            .categories
            .insert(category.id.clone(), category);
    }

    fn lookup(inner: &Inner, id: &ProductId) -> Option<Product> {
        let record = inner.products.get(id).or_else(|| {
            inner
                .products
                .values()
                .find(|p| p.external_id.as_deref() == Some(id.as_str()))
        })?;

        let elements = record
            .element_ids()
            .into_iter()
            .filter_map(|element_id| {
                inner
                    .products
                    .get(&element_id)
                    .map(|element| (element_id, OptionElement::from(element)))
            })
            .collect();

        Some(record.clone().populate(&elements))
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn find_product_by_id(&self, id: &ProductId) -> Result<Option<Product>, CatalogError> {
        let inner = self.inner.read().await;
        Ok(Self::lookup(&inner, id))
    }

    async fn find_market_by_id(&self, id: &MarketId) -> Result<Option<Market>, CatalogError> {
        Ok(self.inner.read().await.markets.get(id).cloned())
    }

    async fn find_category_by_id(
        &self,
        id: &CategoryId,
    ) -> Result<Option<Category>, CatalogError> {
        Ok(self.inner.read().await.categories.get(id).cloned())
    }

    async fn list_products(
        &self,
        market: &MarketId,
        include_subproducts: bool,
    ) -> Result<Vec<ProductRecord>, CatalogError> {
        let inner = self.inner.read().await;

        let mut products: Vec<ProductRecord> = inner
            .products
            .values()
            .filter(|p| &p.market == market && (include_subproducts || !p.is_subproduct))
            .cloned()
            .collect();
        products.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(products)
    }
}

#[cfg(test)]
mod tests {
    use common::OptionGroupId;

    use super::*;
    use crate::catalog::OptionGroupRecord;
    use crate::money::Money;

    fn record(id: &str, price: i64, subproduct: bool) -> ProductRecord {
        ProductRecord {
            id: ProductId::new(id),
            external_id: None,
            name: id.to_string(),
            description: None,
            price: Money::from_cents(price),
            stock: 1,
            is_available: true,
            is_subproduct: subproduct,
            market: MarketId::new("m1"),
            categories: vec![],
            options: vec![],
        }
    }

    #[tokio::test]
    async fn test_find_product_populates_elements() {
        let catalog = InMemoryCatalog::new();
        catalog.insert_product(record("bacon", 150, true)).await;
        let mut burger = record("burger", 800, false);
        burger.options.push(OptionGroupRecord {
            id: OptionGroupId::new("extras"),
            control_type: "checkbox".to_string(),
            label: "Extras".to_string(),
            iterable: true,
            min: 0,
            max: 3,
            uses_price: true,
            required: false,
            elements: vec![ProductId::new("bacon")],
        });
        catalog.insert_product(burger).await;

        let product = catalog
            .find_product_by_id(&ProductId::new("burger"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(product.options[0].elements[0].price.cents(), 150);
    }

    #[tokio::test]
    async fn test_find_product_falls_back_to_external_id() {
        let catalog = InMemoryCatalog::new();
        let mut soda = record("soda", 250, false);
        soda.external_id = Some("Q-77".to_string());
        catalog.insert_product(soda).await;

        let product = catalog
            .find_product_by_id(&ProductId::new("Q-77"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(product.id, ProductId::new("soda"));

        assert!(
            catalog
                .find_product_by_id(&ProductId::new("nope"))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_list_products_hides_subproducts() {
        let catalog = InMemoryCatalog::new();
        catalog.insert_product(record("b", 100, false)).await;
        catalog.insert_product(record("a", 100, false)).await;
        catalog.insert_product(record("topping", 50, true)).await;

        let visible = catalog
            .list_products(&MarketId::new("m1"), false)
            .await
            .unwrap();
        let ids: Vec<&str> = visible.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);

        let all = catalog
            .list_products(&MarketId::new("m1"), true)
            .await
            .unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_markets_and_categories() {
        let catalog = InMemoryCatalog::new();
        catalog.insert_market(Market {
            id: MarketId::new("m1"),
            name: "Corner Store".to_string(),
            logo: None,
            address: None,
            has_free_delivery: true,
            estimated_time: Some(30),
            categories: vec![CategoryId::new("c1")],
        })
        .await;
        catalog.insert_category(Category {
            id: CategoryId::new("c1"),
            name: "Drinks".to_string(),
            market: Some(MarketId::new("m1")),
            parent: None,
        })
        .await;

        let market = catalog
            .find_market_by_id(&MarketId::new("m1"))
            .await
            .unwrap()
            .unwrap();
        assert!(market.has_free_delivery);

        let category = catalog
            .find_category_by_id(&CategoryId::new("c1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(category.name, "Drinks");

        assert!(
            catalog
                .find_market_by_id(&MarketId::new("m2"))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_inserts_are_all_visible() {
        let catalog = InMemoryCatalog::new();

        let mut handles = Vec::new();
        for i in 0..16 {
            let catalog = catalog.clone();
            handles.push(tokio::spawn(async move {
                catalog
                    .insert_product(record(&format!("p{i:02}"), 100, false))
                    .await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let products = catalog
            .list_products(&MarketId::new("m1"), false)
            .await
            .unwrap();
        assert_eq!(products.len(), 16);
        assert!(
            catalog
                .find_product_by_id(&ProductId::new("p15"))
                .await
                .unwrap()
                .is_some()
        );
    }
}
