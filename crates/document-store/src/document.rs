use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::DocumentKey;

/// Version number of a stored document, used for optimistic concurrency control.
///
/// Version 0 means the document does not exist yet. The first write stores
/// version 1 and every later write increments it by one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    /// Creates a new version from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the initial version (0) of a document that was never written.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the version (1) of a freshly created document.
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Version {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Version> for i64 {
    fn from(version: Version) -> Self {
        version.0
    }
}

/// A whole JSON document stored under `(collection, key)`.
///
/// Writes always replace the full body; there are no partial updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Collection the document belongs to (e.g. "carts", "products").
    pub collection: String,

    /// Key of the document inside its collection.
    pub key: DocumentKey,

    /// Version of the stored document.
    pub version: Version,

    /// When the document was last written.
    pub updated_at: DateTime<Utc>,

    /// The document body.
    pub body: serde_json::Value,
}

impl Document {
    /// Creates a document that has not been stored yet.
    pub fn new(
        collection: impl Into<String>,
        key: impl Into<DocumentKey>,
        body: serde_json::Value,
    ) -> Self {
        Self {
            collection: collection.into(),
            key: key.into(),
            version: Version::initial(),
            updated_at: Utc::now(),
            body,
        }
    }

    /// Creates a document from a serializable value.
    pub fn from_value<T: Serialize>(
        collection: impl Into<String>,
        key: impl Into<DocumentKey>,
        value: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::new(collection, key, serde_json::to_value(value)?))
    }

    /// Deserializes the body into a concrete type.
    pub fn into_value<T: DeserializeOwned>(self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.body)
    }

    /// Returns the value of a top-level body field rendered as text.
    ///
    /// Strings are returned without quotes; other JSON values use their
    /// JSON representation. Returns None if the field is absent or null.
    pub fn field_text(&self, field: &str) -> Option<String> {
        match self.body.get(field)? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct TestBody {
        value: i32,
        name: String,
    }

    #[test]
    fn version_ordering() {
        let v1 = Version::new(1);
        let v2 = Version::new(2);
        assert!(v1 < v2);
        assert_eq!(v1.next(), v2);
    }

    #[test]
    fn version_initial_and_first() {
        assert_eq!(Version::initial().as_i64(), 0);
        assert_eq!(Version::first().as_i64(), 1);
        assert_eq!(Version::initial().next(), Version::first());
    }

    #[test]
    fn new_document_starts_at_initial_version() {
        let doc = Document::new("carts", "user-1", serde_json::json!({"total": 0}));
        assert_eq!(doc.collection, "carts");
        assert_eq!(doc.key.as_str(), "user-1");
        assert_eq!(doc.version, Version::initial());
    }

    #[test]
    fn from_value_and_into_value() {
        let original = TestBody {
            value: 42,
            name: "test".to_string(),
        };

        let doc = Document::from_value("tests", "k", &original).unwrap();
        let restored: TestBody = doc.into_value().unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn field_text_renders_strings_and_scalars() {
        let doc = Document::new(
            "products",
            "p1",
            serde_json::json!({"market": "m1", "stock": 3, "gone": null}),
        );

        assert_eq!(doc.field_text("market").as_deref(), Some("m1"));
        assert_eq!(doc.field_text("stock").as_deref(), Some("3"));
        assert_eq!(doc.field_text("gone"), None);
        assert_eq!(doc.field_text("missing"), None);
    }
}
