use serde_json::Value as JsonValue;
use thiserror::Error;

use lendr_core::Document;
use std::sync::Arc;

/// Address of one document: `(collection, id)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentKey {
    pub collection: String,
    pub id: String,
}

impl DocumentKey {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Key of a typed document.
    pub fn of<D: Document>(id: &D::Id) -> Self {
        Self::new(D::COLLECTION, id.to_string())
    }
}

impl core::fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// A stored document body and the commit version that last wrote it.
///
/// Versions come from the store's commit sequence, so they only ever grow and
/// two reads of the same version saw the same body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedDocument {
    pub version: u64,
    pub data: JsonValue,
}

/// What a transaction observed for one key; re-checked at commit.
///
/// `version: None` records that the document was absent when read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Precondition {
    pub key: DocumentKey,
    pub version: Option<u64>,
}

/// A buffered write, applied only at commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
    /// Insert a new document; fails if the key is taken.
    Create { key: DocumentKey, data: JsonValue },
    /// Replace an existing document; fails if it is gone.
    Update { key: DocumentKey, data: JsonValue },
    /// Remove a document (no-op if already absent).
    Delete { key: DocumentKey },
}

impl Write {
    pub fn key(&self) -> &DocumentKey {
        match self {
            Write::Create { key, .. } | Write::Update { key, .. } | Write::Delete { key } => key,
        }
    }
}

/// Document store operation error.
///
/// These are storage failures (conflicts, misuse of a transaction, encoding)
/// as opposed to domain errors (validation, stock, state).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A document read by the transaction changed before commit.
    #[error("write conflict: {0}")]
    Conflict(String),

    /// Every attempt of an atomic unit hit a write conflict.
    #[error("transaction aborted after {attempts} attempt(s): {last}")]
    Aborted { attempts: u32, last: String },

    /// The unit tried to read after it had started writing.
    #[error("read of {0} after the first write; all reads must precede writes")]
    ReadAfterWrite(String),

    #[error("document {0} does not exist")]
    MissingDocument(String),

    #[error("document {0} already exists")]
    AlreadyExists(String),

    #[error("document serialization failed: {0}")]
    Serialization(String),

    #[error("store lock poisoned")]
    Poisoned,
}

/// Key/value document store with optimistic multi-document commits.
///
/// ## Commit semantics
///
/// `commit()` applies all writes atomically if, and only if, every
/// precondition still holds (each read document is at the version the
/// transaction saw, or still absent). Otherwise nothing is applied and
/// `StoreError::Conflict` is returned; the caller re-runs its unit with fresh
/// reads. Successful commits return a strictly increasing commit sequence.
///
/// Reads outside a transaction (`get`, `list`) are point-in-time snapshots
/// with no isolation guarantees across calls.
pub trait DocumentStore: Send + Sync {
    fn get(&self, key: &DocumentKey) -> Result<Option<VersionedDocument>, StoreError>;

    /// Read several keys at once. Results are in `keys` order.
    fn get_many(&self, keys: &[DocumentKey]) -> Result<Vec<Option<VersionedDocument>>, StoreError> {
        keys.iter().map(|k| self.get(k)).collect()
    }

    fn commit(&self, preconditions: &[Precondition], writes: &[Write]) -> Result<u64, StoreError>;

    /// All documents of a collection, ordered by id.
    fn list(&self, collection: &str) -> Result<Vec<(DocumentKey, VersionedDocument)>, StoreError>;
}

impl<S> DocumentStore for Arc<S>
where
    S: DocumentStore + ?Sized,
{
    fn get(&self, key: &DocumentKey) -> Result<Option<VersionedDocument>, StoreError> {
        (**self).get(key)
    }

    fn get_many(&self, keys: &[DocumentKey]) -> Result<Vec<Option<VersionedDocument>>, StoreError> {
        (**self).get_many(keys)
    }

    fn commit(&self, preconditions: &[Precondition], writes: &[Write]) -> Result<u64, StoreError> {
        (**self).commit(preconditions, writes)
    }

    fn list(&self, collection: &str) -> Result<Vec<(DocumentKey, VersionedDocument)>, StoreError> {
        (**self).list(collection)
    }
}

/// Decode a stored body into a typed document.
pub fn decode<D: Document>(key: &DocumentKey, doc: &VersionedDocument) -> Result<D, StoreError> {
    serde_json::from_value(doc.data.clone())
        .map_err(|e| StoreError::Serialization(format!("{key}: {e}")))
}

/// Encode a typed document into a stored body.
pub fn encode<D: Document>(doc: &D) -> Result<JsonValue, StoreError> {
    serde_json::to_value(doc)
        .map_err(|e| StoreError::Serialization(format!("{}/{}: {e}", D::COLLECTION, doc.id())))
}

/// List and decode a whole collection.
pub fn list_typed<D, S>(store: &S) -> Result<Vec<D>, StoreError>
where
    D: Document,
    S: DocumentStore + ?Sized,
{
    store
        .list(D::COLLECTION)?
        .iter()
        .map(|(key, doc)| decode::<D>(key, doc))
        .collect()
}

/// Point-read and decode one typed document.
pub fn get_typed<D, S>(store: &S, id: &D::Id) -> Result<Option<D>, StoreError>
where
    D: Document,
    S: DocumentStore + ?Sized,
{
    let key = DocumentKey::of::<D>(id);
    store.get(&key)?.map(|doc| decode::<D>(&key, &doc)).transpose()
}
