//! Document trait: identity + collection placement in the document store.

use serde::Serialize;
use serde::de::DeserializeOwned;

/// A record persisted as one document in a named collection.
///
/// The store is keyed by `(COLLECTION, id)`; the document body is the serde
/// representation of the implementing type.
pub trait Document: Serialize + DeserializeOwned + Clone + core::fmt::Debug {
    /// Strongly-typed document identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    /// Collection the document lives in (e.g. `"devices"`).
    const COLLECTION: &'static str;

    /// Returns the document identifier.
    fn id(&self) -> &Self::Id;
}
