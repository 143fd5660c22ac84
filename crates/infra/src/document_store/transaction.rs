//! Atomic units of work over a [`DocumentStore`].
//!
//! A unit reads everything it needs first, then buffers writes. On commit the
//! store re-checks every read; if any document moved, the whole unit is re-run
//! against fresh state, up to the retry budget.

use std::collections::HashMap;

use tracing::{debug, warn};

use lendr_core::Document;

use super::r#trait::{
    DocumentKey, DocumentStore, Precondition, StoreError, VersionedDocument, Write, decode,
    encode,
};

/// Attempts made before a conflicting unit gives up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

/// Result of a committed unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed<T> {
    pub value: T,
    /// Commit sequence; `None` when the unit wrote nothing.
    pub sequence: Option<u64>,
    /// 1 when the first attempt committed.
    pub attempts: u32,
}

/// One attempt of an atomic unit: tracked reads plus buffered writes.
pub struct Transaction<'s, S: ?Sized> {
    store: &'s S,
    reads: HashMap<DocumentKey, Option<VersionedDocument>>,
    writes: Vec<Write>,
}

impl<'s, S> Transaction<'s, S>
where
    S: DocumentStore + ?Sized,
{
    fn new(store: &'s S) -> Self {
        Self {
            store,
            reads: HashMap::new(),
            writes: Vec::new(),
        }
    }

    fn ensure_reading(&self, key: &DocumentKey) -> Result<(), StoreError> {
        if !self.writes.is_empty() {
            return Err(StoreError::ReadAfterWrite(key.to_string()));
        }
        Ok(())
    }

    /// Read one document. Repeated reads of a key return the first result.
    pub fn get<D: Document>(&mut self, id: &D::Id) -> Result<Option<D>, StoreError> {
        let key = DocumentKey::of::<D>(id);
        self.ensure_reading(&key)?;

        let doc = match self.reads.get(&key) {
            Some(cached) => cached.clone(),
            None => {
                let fetched = self.store.get(&key)?;
                self.reads.insert(key.clone(), fetched.clone());
                fetched
            }
        };
        doc.map(|d| decode::<D>(&key, &d)).transpose()
    }

    /// Read several documents in one batch. Results are in `ids` order.
    pub fn get_all<D: Document>(&mut self, ids: &[D::Id]) -> Result<Vec<Option<D>>, StoreError> {
        let keys: Vec<DocumentKey> = ids.iter().map(DocumentKey::of::<D>).collect();
        if let Some(first) = keys.first() {
            self.ensure_reading(first)?;
        }

        let missing: Vec<DocumentKey> = keys
            .iter()
            .filter(|k| !self.reads.contains_key(*k))
            .cloned()
            .collect();
        if !missing.is_empty() {
            let fetched = self.store.get_many(&missing)?;
            self.reads.extend(missing.into_iter().zip(fetched));
        }

        keys.iter()
            .map(|key| match self.reads.get(key) {
                Some(Some(doc)) => decode::<D>(key, doc).map(Some),
                _ => Ok(None),
            })
            .collect()
    }

    /// Buffer insertion of a new document.
    pub fn create<D: Document>(&mut self, doc: &D) -> Result<(), StoreError> {
        let data = encode(doc)?;
        self.writes.push(Write::Create {
            key: DocumentKey::of::<D>(doc.id()),
            data,
        });
        Ok(())
    }

    /// Buffer replacement of an existing document.
    pub fn update<D: Document>(&mut self, doc: &D) -> Result<(), StoreError> {
        let data = encode(doc)?;
        self.writes.push(Write::Update {
            key: DocumentKey::of::<D>(doc.id()),
            data,
        });
        Ok(())
    }

    pub fn delete<D: Document>(&mut self, id: &D::Id) {
        self.writes.push(Write::Delete {
            key: DocumentKey::of::<D>(id),
        });
    }

    pub fn has_writes(&self) -> bool {
        !self.writes.is_empty()
    }

    fn commit(self) -> Result<Option<u64>, StoreError> {
        if self.writes.is_empty() {
            return Ok(None);
        }
        let preconditions: Vec<Precondition> = self
            .reads
            .into_iter()
            .map(|(key, doc)| Precondition {
                key,
                version: doc.map(|d| d.version),
            })
            .collect();
        self.store.commit(&preconditions, &self.writes).map(Some)
    }
}

/// Run `unit` as one atomic, retried unit of work.
///
/// `unit` may run several times and must not have side effects outside the
/// transaction it is given. A domain error from `unit` aborts immediately with
/// nothing written. Write conflicts re-run the unit; once `policy.max_attempts`
/// attempts have conflicted the result is `StoreError::Aborted`.
pub fn with_atomic_unit<S, T, E, F>(
    store: &S,
    policy: RetryPolicy,
    mut unit: F,
) -> Result<Committed<T>, E>
where
    S: DocumentStore + ?Sized,
    E: From<StoreError>,
    F: FnMut(&mut Transaction<'_, S>) -> Result<T, E>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut last_conflict = String::new();

    for attempt in 1..=max_attempts {
        let mut tx = Transaction::new(store);
        let value = unit(&mut tx)?;

        match tx.commit() {
            Ok(sequence) => {
                return Ok(Committed {
                    value,
                    sequence,
                    attempts: attempt,
                });
            }
            Err(StoreError::Conflict(reason)) => {
                debug!(attempt, max_attempts, %reason, "atomic unit conflicted; retrying");
                last_conflict = reason;
            }
            Err(e) => return Err(e.into()),
        }
    }

    warn!(attempts = max_attempts, reason = %last_conflict, "atomic unit aborted");
    Err(StoreError::Aborted {
        attempts: max_attempts,
        last: last_conflict,
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document_store::InMemoryDocumentStore;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Counter {
        id: String,
        value: u32,
    }

    impl Document for Counter {
        type Id = String;
        const COLLECTION: &'static str = "counters";

        fn id(&self) -> &Self::Id {
            &self.id
        }
    }

    fn counter(id: &str, value: u32) -> Counter {
        Counter {
            id: id.to_string(),
            value,
        }
    }

    fn seed(store: &InMemoryDocumentStore, docs: &[Counter]) {
        with_atomic_unit(store, RetryPolicy::default(), |tx| {
            for doc in docs {
                tx.create(doc)?;
            }
            Ok::<_, StoreError>(())
        })
        .unwrap();
    }

    fn increment(tx: &mut Transaction<'_, InMemoryDocumentStore>) -> Result<u32, StoreError> {
        let current = tx.get::<Counter>(&"c".to_string())?.unwrap();
        let next = counter("c", current.value + 1);
        tx.update(&next)?;
        Ok(next.value)
    }

    #[test]
    fn unit_commits_on_first_attempt_without_contention() {
        let store = InMemoryDocumentStore::new();
        seed(&store, &[counter("c", 0)]);

        let committed = with_atomic_unit(&store, RetryPolicy::default(), increment).unwrap();
        assert_eq!(committed.value, 1);
        assert_eq!(committed.attempts, 1);
        assert!(committed.sequence.is_some());
    }

    #[test]
    fn conflicts_are_retried_with_fresh_reads() {
        let store = InMemoryDocumentStore::new();
        seed(&store, &[counter("c", 0)]);
        store.fail_next_commits(2);

        let committed = with_atomic_unit(&store, RetryPolicy::default(), increment).unwrap();
        assert_eq!(committed.attempts, 3);
        assert_eq!(committed.value, 1);
    }

    #[test]
    fn exhausted_retries_abort_without_writing() {
        let store = InMemoryDocumentStore::new();
        seed(&store, &[counter("c", 0)]);
        store.fail_next_commits(5);

        let err = with_atomic_unit(&store, RetryPolicy::default(), increment).unwrap_err();
        assert!(matches!(err, StoreError::Aborted { attempts: 5, .. }));

        let stored = crate::document_store::get_typed::<Counter, _>(&store, &"c".to_string())
            .unwrap()
            .unwrap();
        assert_eq!(stored.value, 0);
    }

    #[test]
    fn reading_after_writing_is_refused() {
        let store = InMemoryDocumentStore::new();
        seed(&store, &[counter("c", 0)]);

        let err = with_atomic_unit(&store, RetryPolicy::default(), |tx| {
            tx.update(&counter("c", 9))?;
            tx.get::<Counter>(&"c".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, StoreError::ReadAfterWrite(_)));
    }

    #[test]
    fn batch_read_preserves_order_and_absences() {
        let store = InMemoryDocumentStore::new();
        seed(&store, &[counter("a", 1), counter("b", 2)]);

        let committed = with_atomic_unit(&store, RetryPolicy::default(), |tx| {
            tx.get_all::<Counter>(&["b".to_string(), "zz".to_string(), "a".to_string()])
        })
        .unwrap();

        let values: Vec<Option<u32>> = committed.value.iter().map(|c| c.as_ref().map(|c| c.value)).collect();
        assert_eq!(values, vec![Some(2), None, Some(1)]);
        assert_eq!(committed.sequence, None);
    }

    #[test]
    fn domain_errors_abort_without_retry() {
        #[derive(Debug)]
        enum UnitError {
            Store(StoreError),
            Refused,
        }
        impl From<StoreError> for UnitError {
            fn from(e: StoreError) -> Self {
                UnitError::Store(e)
            }
        }

        let store = InMemoryDocumentStore::new();
        let mut runs = 0;
        let err = with_atomic_unit(&store, RetryPolicy::default(), |tx| {
            runs += 1;
            tx.create(&counter("x", 0))?;
            Err::<(), _>(UnitError::Refused)
        })
        .unwrap_err();

        assert!(matches!(err, UnitError::Refused));
        assert_eq!(runs, 1);
        assert_eq!(store.commit_count(), 0);
    }

    #[test]
    fn concurrent_increments_all_land() {
        let store = std::sync::Arc::new(InMemoryDocumentStore::new());
        seed(&store, &[counter("c", 0)]);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    let mut landed = 0;
                    for _ in 0..10 {
                        if with_atomic_unit(&*store, RetryPolicy::new(50), increment).is_ok() {
                            landed += 1;
                        }
                    }
                    landed
                })
            })
            .collect();
        let landed: u32 = handles.into_iter().map(|h| h.join().unwrap()).sum();

        let stored = crate::document_store::get_typed::<Counter, _>(&*store, &"c".to_string())
            .unwrap()
            .unwrap();
        assert_eq!(stored.value, landed);
    }
}
