//! Versioned document store boundary.
//!
//! Documents are JSON bodies addressed by `(collection, id)`. Multi-document
//! changes go through [`with_atomic_unit`], which gives each unit all-or-nothing
//! commits under optimistic concurrency control.

pub mod in_memory;
pub mod r#trait;
pub mod transaction;

pub use in_memory::InMemoryDocumentStore;
pub use r#trait::{
    DocumentKey, DocumentStore, Precondition, StoreError, VersionedDocument, Write, decode,
    encode, get_typed, list_typed,
};
pub use transaction::{
    Committed, DEFAULT_MAX_ATTEMPTS, RetryPolicy, Transaction, with_atomic_unit,
};
