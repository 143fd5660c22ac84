//! Infrastructure layer: document store, lending service, workers, config.

pub mod config;
pub mod document_store;
pub mod notifications;
pub mod queries;
pub mod service;
pub mod workers;


pub use config::LendrConfig;
pub use document_store::{
    Committed, DocumentStore, InMemoryDocumentStore, RetryPolicy, StoreError, Transaction,
    with_atomic_unit,
};
pub use queries::{LedgerDiscrepancy, LendingQueries};
pub use service::{ErrorKind, LendingError, LendingService, LendingSettings, ReturnOutcome};
