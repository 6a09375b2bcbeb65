/// Builder for listing documents of one collection.
///
/// Supports an equality filter on a single top-level body field plus
/// pagination. Results are ordered by document key.
#[derive(Debug, Clone, Default)]
pub struct DocumentQuery {
    /// Collection to list.
    pub collection: String,

    /// Top-level body field and the text value it must equal.
    pub field_equals: Option<(String, String)>,

    /// Maximum number of documents to return.
    pub limit: Option<usize>,

    /// Number of documents to skip.
    pub offset: Option<usize>,
}

impl DocumentQuery {
    /// Creates a query listing every document of a collection.
    pub fn collection(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            ..Default::default()
        }
    }

    /// Keeps only documents whose `field` renders as `value`.
    pub fn field_equals(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.field_equals = Some((field.into(), value.into()));
        self
    }

    /// Limits the number of results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips the first `offset` results.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }
}
