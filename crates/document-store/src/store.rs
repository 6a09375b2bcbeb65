use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

use crate::{Document, DocumentKey, DocumentQuery, DocumentStoreError, Result, Version};

/// Options for writing a document.
#[derive(Debug, Clone, Default)]
pub struct PutOptions {
    /// Expected stored version for optimistic concurrency control.
    /// If None, the write is unconditional (use with caution).
    pub expected_version: Option<Version>,
}

impl PutOptions {
    /// Creates options with no version check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options expecting the document to be at a specific version.
    pub fn expect_version(version: Version) -> Self {
        Self {
            expected_version: Some(version),
        }
    }

    /// Creates options expecting the document to not exist yet.
    pub fn expect_new() -> Self {
        Self {
            expected_version: Some(Version::initial()),
        }
    }
}

/// Checks an expected version against the stored one.
pub(crate) fn check_expected_version(
    collection: &str,
    key: &DocumentKey,
    options: &PutOptions,
    actual: Version,
) -> Result<()> {
    if let Some(expected) = options.expected_version
        && expected != actual
    {
        metrics::counter!("document_store_conflicts_total", "collection" => collection.to_string())
            .increment(1);
        return Err(DocumentStoreError::ConcurrencyConflict {
            collection: collection.to_string(),
            key: key.clone(),
            expected,
            actual,
        });
    }
    Ok(())
}

/// Core trait for document store implementations.
///
/// A document store persists whole JSON documents grouped in collections.
/// Every write replaces the full body and bumps the document version.
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Writes a whole document.
    ///
    /// If `options.expected_version` is set, the write fails with
    /// `ConcurrencyConflict` when the stored version differs, and nothing
    /// is written. The `version` field of `document` is ignored.
    ///
    /// Returns the new version of the document.
    async fn put(&self, document: Document, options: PutOptions) -> Result<Version>;

    /// Retrieves a document by key.
    async fn get(&self, collection: &str, key: &DocumentKey) -> Result<Option<Document>>;

    /// Deletes a document.
    ///
    /// Returns true if a document was removed.
    async fn delete(&self, collection: &str, key: &DocumentKey, options: PutOptions)
    -> Result<bool>;

    /// Lists documents matching a query, ordered by key.
    async fn query(&self, query: DocumentQuery) -> Result<Vec<Document>>;

    /// Gets the current version of a document.
    ///
    /// Returns None if the document doesn't exist.
    async fn get_version(&self, collection: &str, key: &DocumentKey) -> Result<Option<Version>>;
}

/// Extension trait providing typed convenience methods for document stores.
#[async_trait]
pub trait DocumentStoreExt: DocumentStore {
    /// Serializes and writes a value.
    async fn put_json<T: Serialize + Sync>(
        &self,
        collection: &str,
        key: &DocumentKey,
        value: &T,
        options: PutOptions,
    ) -> Result<Version> {
        let document = Document::from_value(collection, key.clone(), value)?;
        self.put(document, options).await
    }

    /// Reads and deserializes a value together with its version.
    async fn get_json<T: DeserializeOwned + Send>(
        &self,
        collection: &str,
        key: &DocumentKey,
    ) -> Result<Option<(T, Version)>> {
        match self.get(collection, key).await? {
            Some(document) => {
                let version = document.version;
                Ok(Some((document.into_value()?, version)))
            }
            None => Ok(None),
        }
    }

    /// Checks if a document exists.
    async fn exists(&self, collection: &str, key: &DocumentKey) -> Result<bool> {
        Ok(self.get_version(collection, key).await?.is_some())
    }
}

// Blanket implementation for all DocumentStore implementations
impl<T: DocumentStore + ?Sized> DocumentStoreExt for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_options_constructors() {
        assert_eq!(PutOptions::new().expected_version, None);
        assert_eq!(
            PutOptions::expect_new().expected_version,
            Some(Version::initial())
        );
        assert_eq!(
            PutOptions::expect_version(Version::new(3)).expected_version,
            Some(Version::new(3))
        );
    }

    #[test]
    fn check_expected_version_accepts_match_and_unconditional() {
        let key = DocumentKey::new("k");
        assert!(
            check_expected_version("c", &key, &PutOptions::new(), Version::new(7)).is_ok()
        );
        assert!(
            check_expected_version(
                "c",
                &key,
                &PutOptions::expect_version(Version::new(7)),
                Version::new(7)
            )
            .is_ok()
        );
    }

    #[test]
    fn check_expected_version_reports_conflict() {
        let key = DocumentKey::new("k");
        let err = check_expected_version("carts", &key, &PutOptions::expect_new(), Version::first())
            .unwrap_err();

        match err {
            DocumentStoreError::ConcurrencyConflict {
                collection,
                expected,
                actual,
                ..
            } => {
                assert_eq!(collection, "carts");
                assert_eq!(expected, Version::initial());
                assert_eq!(actual, Version::first());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
