use crate::{Document, DocumentId};

/// Builder for constructing document queries.
///
/// `ids` and `keys` are alternatives: a document matches when its id is in
/// `ids` OR its key is in `keys`. Field filters are ANDed on top.
#[derive(Debug, Clone, Default)]
pub struct DocumentQuery {
    /// Collection to search.
    pub collection: String,

    /// Match any of these internal ids.
    pub ids: Option<Vec<DocumentId>>,

    /// Match any of these keys.
    pub keys: Option<Vec<String>>,

    /// Top-level body field that must equal the given value.
    pub field_equals: Option<(String, serde_json::Value)>,

    /// Maximum number of documents to return.
    pub limit: Option<usize>,

    /// Number of documents to skip.
    pub offset: Option<usize>,

    /// Order by creation time descending instead of ascending.
    pub newest_first: bool,
}

impl DocumentQuery {
    /// Creates a query over a whole collection.
    pub fn collection(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            ..Default::default()
        }
    }

    /// Creates a query matching references that may be ids or keys.
    ///
    /// References that parse as a [`DocumentId`] match either field; anything
    /// else only matches keys.
    pub fn by_refs<S: AsRef<str>>(collection: impl Into<String>, refs: &[S]) -> Self {
        let ids: Vec<DocumentId> = refs
            .iter()
            .filter_map(|r| DocumentId::try_parse(r.as_ref()))
            .collect();
        let keys: Vec<String> = refs.iter().map(|r| r.as_ref().to_string()).collect();
        Self {
            collection: collection.into(),
            ids: Some(ids),
            keys: Some(keys),
            ..Default::default()
        }
    }

    /// Filters by a single key.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.keys = Some(vec![key.into()]);
        self
    }

    /// Filters by a top-level field value.
    pub fn field_equals(mut self, field: impl Into<String>, value: serde_json::Value) -> Self {
        self.field_equals = Some((field.into(), value));
        self
    }

    /// Limits the number of results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips a number of results.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Returns newest documents first.
    pub fn newest_first(mut self) -> Self {
        self.newest_first = true;
        self
    }

    /// Returns true if the query restricts by id or key.
    pub fn has_ref_filter(&self) -> bool {
        self.ids.is_some() || self.keys.is_some()
    }

    /// Evaluates the filter part of the query against a document.
    ///
    /// Ordering, limit and offset are applied by the store.
    pub fn matches(&self, doc: &Document) -> bool {
        if doc.collection != self.collection {
            return false;
        }

        if self.has_ref_filter() {
            let by_id = self
                .ids
                .as_ref()
                .is_some_and(|ids| ids.contains(&doc.id));
            let by_key = self
                .keys
                .as_ref()
                .is_some_and(|keys| keys.contains(&doc.key));
            if !by_id && !by_key {
                return false;
            }
        }

        if let Some((ref field, ref value)) = self.field_equals
            && doc.body.get(field) != Some(value)
        {
            return false;
        }

        true
    }
}
