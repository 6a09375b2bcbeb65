use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    Document, DocumentKey, DocumentQuery, Result, Version,
    store::{DocumentStore, PutOptions, check_expected_version},
};

type CollectionMap = BTreeMap<DocumentKey, Document>;

/// In-memory document store implementation.
///
/// Stores documents in ordered maps per collection and provides the same
/// interface and concurrency semantics as the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    collections: Arc<RwLock<BTreeMap<String, CollectionMap>>>,
}

impl InMemoryDocumentStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of documents stored in a collection.
    pub async fn document_count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, BTreeMap::len)
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn put(&self, mut document: Document, options: PutOptions) -> Result<Version> {
        let mut collections = self.collections.write().await;
        let collection = collections.entry(document.collection.clone()).or_default();

        let current = collection
            .get(&document.key)
            .map(|d| d.version)
            .unwrap_or(Version::initial());
        check_expected_version(&document.collection, &document.key, &options, current)?;

        let version = current.next();
        document.version = version;
        document.updated_at = Utc::now();
        collection.insert(document.key.clone(), document);

        Ok(version)
    }

    async fn get(&self, collection: &str, key: &DocumentKey) -> Result<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).and_then(|c| c.get(key)).cloned())
    }

    async fn delete(
        &self,
        collection: &str,
        key: &DocumentKey,
        options: PutOptions,
    ) -> Result<bool> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            check_expected_version(collection, key, &options, Version::initial())?;
            return Ok(false);
        };

        let current = docs
            .get(key)
            .map(|d| d.version)
            .unwrap_or(Version::initial());
        check_expected_version(collection, key, &options, current)?;

        Ok(docs.remove(key).is_some())
    }

    async fn query(&self, query: DocumentQuery) -> Result<Vec<Document>> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(&query.collection) else {
            return Ok(vec![]);
        };

        let documents = docs
            .values()
            .filter(|d| match &query.field_equals {
                Some((field, value)) => d.field_text(field).as_deref() == Some(value.as_str()),
                None => true,
            })
            .skip(query.offset.unwrap_or(0))
            .take(query.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();

        Ok(documents)
    }

    async fn get_version(&self, collection: &str, key: &DocumentKey) -> Result<Option<Version>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|c| c.get(key))
            .map(|d| d.version))
    }
}
