use serde::{Deserialize, Serialize};

/// Declares a string-backed identifier.
///
/// Identifiers in this system come from the document store or from the
/// authentication layer as opaque strings, so each kind gets its own
/// newtype to keep a market id from being passed where a product id is
/// expected.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an identifier from any string-like value.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Authenticated user identifier, as issued by the auth layer.
    UserId
);

string_id!(
    /// Catalog product identifier. Option elements (subproducts) share this id space.
    ProductId
);

string_id!(
    /// Market (store) identifier.
    MarketId
);

string_id!(
    /// Catalog category identifier.
    CategoryId
);

string_id!(
    /// Identifier of an option group within a product.
    OptionGroupId
);

string_id!(
    /// Key of a document within a collection of the document store.
    DocumentKey
);

impl From<&UserId> for DocumentKey {
    fn from(id: &UserId) -> Self {
        Self(id.0.clone())
    }
}

impl From<&ProductId> for DocumentKey {
    fn from(id: &ProductId) -> Self {
        Self(id.0.clone())
    }
}

impl From<&MarketId> for DocumentKey {
    fn from(id: &MarketId) -> Self {
        Self(id.0.clone())
    }
}

impl From<&CategoryId> for DocumentKey {
    fn from(id: &CategoryId) -> Self {
        Self(id.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_conversion_preserves_value() {
        let id = MarketId::new("market-1");
        assert_eq!(id.as_str(), "market-1");

        let id2: MarketId = "market-2".into();
        assert_eq!(id2.to_string(), "market-2");
    }

    #[test]
    fn document_key_from_user_id() {
        let user = UserId::new("5f1d7c");
        let key = DocumentKey::from(&user);
        assert_eq!(key.as_str(), "5f1d7c");
    }

    #[test]
    fn ids_serialize_transparently() {
        let id = OptionGroupId::new("toppings");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"toppings\"");

        let deserialized: OptionGroupId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }
}
