//! Document-store seam. The service talks to any backend implementing
//! [`DocumentStore`]; records travel as plain JSON objects keyed by a
//! store-generated UUID under [`ID_FIELD`].

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

/// A stored record: a JSON object carrying the store-managed [`ID_FIELD`].
pub type Document = Map<String, Value>;

/// Internal identifier field name on persisted documents.
pub const ID_FIELD: &str = "_id";

/// Identifier field name in externally visible representations.
pub const EXPOSED_ID_FIELD: &str = "id";

/// The store's native identifier form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(Uuid);

impl DocumentId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an opaque identifier from a path, query, or payload field.
    pub fn parse(raw: &str) -> Result<Self, MalformedIdentifier> {
        Uuid::parse_str(raw.trim())
            .map(Self)
            .map_err(|_| MalformedIdentifier {
                raw: raw.to_string(),
            })
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("'{raw}' is not a valid document identifier")]
pub struct MalformedIdentifier {
    pub raw: String,
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("document store unavailable: {0}")]
    Unavailable(String),
    #[error("record could not be serialized: {0}")]
    Serialization(String),
}

/// Exact-match query with optional lower bounds, compared lexicographically
/// on string fields (canonical ISO dates sort correctly this way).
#[derive(Debug, Clone, Default)]
pub struct Filter {
    equals: BTreeMap<String, Value>,
    at_least: BTreeMap<String, String>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn equals(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.equals.insert(field.to_string(), value.into());
        self
    }

    pub fn at_least(mut self, field: &str, bound: impl Into<String>) -> Self {
        self.at_least.insert(field.to_string(), bound.into());
        self
    }

    pub fn matches(&self, document: &Document) -> bool {
        let equals_hold = self
            .equals
            .iter()
            .all(|(field, expected)| document.get(field) == Some(expected));
        let bounds_hold = self.at_least.iter().all(|(field, bound)| {
            document
                .get(field)
                .and_then(Value::as_str)
                .is_some_and(|value| value >= bound.as_str())
        });
        equals_hold && bounds_hold
    }
}

/// Storage abstraction so the service can be exercised against any backend.
/// Implementations must preserve insertion order within a collection.
pub trait DocumentStore: Send + Sync {
    fn insert(&self, collection: &str, document: Document) -> Result<DocumentId, StoreError>;
    fn find(
        &self,
        collection: &str,
        filter: &Filter,
        limit: Option<usize>,
    ) -> Result<Vec<Document>, StoreError>;
    fn find_one(&self, collection: &str, id: &DocumentId)
        -> Result<Option<Document>, StoreError>;
    /// Merge `changes` into the matching document, returning the match count.
    fn update_one(
        &self,
        collection: &str,
        id: &DocumentId,
        changes: Document,
    ) -> Result<u64, StoreError>;
    fn delete_one(&self, collection: &str, id: &DocumentId) -> Result<u64, StoreError>;
    fn collection_names(&self) -> Result<Vec<String>, StoreError>;
}

/// Serialize a typed record to its document form and insert it. Dates and
/// enumerations land in their canonical string forms.
pub fn create<S, T>(store: &S, collection: &str, record: &T) -> Result<DocumentId, StoreError>
where
    S: DocumentStore + ?Sized,
    T: Serialize,
{
    let value = serde_json::to_value(record)
        .map_err(|err| StoreError::Serialization(err.to_string()))?;
    match value {
        Value::Object(document) => store.insert(collection, document),
        other => Err(StoreError::Serialization(format!(
            "expected an object, got {other}"
        ))),
    }
}

/// Fetch matching documents converted for external representation: the
/// internal identifier is exposed as `id`.
pub fn list<S>(
    store: &S,
    collection: &str,
    filter: &Filter,
    limit: Option<usize>,
) -> Result<Vec<Document>, StoreError>
where
    S: DocumentStore + ?Sized,
{
    let documents = store.find(collection, filter, limit)?;
    Ok(documents.into_iter().map(expose).collect())
}

/// Rename the internal `_id` to the externally visible `id`.
pub fn expose(mut document: Document) -> Document {
    if let Some(id) = document.remove(ID_FIELD) {
        document.insert(EXPOSED_ID_FIELD.to_string(), id);
    }
    document
}
