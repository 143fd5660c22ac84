use std::collections::BTreeMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use super::r#trait::{
    DocumentKey, DocumentStore, Precondition, StoreError, VersionedDocument, Write,
};

#[derive(Debug, Default)]
struct State {
    documents: BTreeMap<DocumentKey, VersionedDocument>,
    sequence: u64,
}

/// In-memory document store with optimistic multi-document commits.
///
/// Intended for tests/dev. Commits are serialized behind one write lock.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    state: RwLock<State>,
    injected_conflicts: AtomicU32,
    commits: AtomicU64,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` commits fail with `StoreError::Conflict` before
    /// checking anything.
    pub fn fail_next_commits(&self, n: u32) {
        self.injected_conflicts.store(n, Ordering::SeqCst);
    }

    /// Number of successful commits so far.
    pub fn commit_count(&self) -> u64 {
        self.commits.load(Ordering::SeqCst)
    }

    /// Current commit sequence (0 before the first commit).
    pub fn sequence(&self) -> Result<u64, StoreError> {
        Ok(self.state.read().map_err(|_| StoreError::Poisoned)?.sequence)
    }

    fn take_injected_conflict(&self) -> bool {
        self.injected_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn get(&self, key: &DocumentKey) -> Result<Option<VersionedDocument>, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::Poisoned)?;
        Ok(state.documents.get(key).cloned())
    }

    fn get_many(&self, keys: &[DocumentKey]) -> Result<Vec<Option<VersionedDocument>>, StoreError> {
        // One lock for the whole batch so the reads are mutually consistent.
        let state = self.state.read().map_err(|_| StoreError::Poisoned)?;
        Ok(keys.iter().map(|k| state.documents.get(k).cloned()).collect())
    }

    fn commit(&self, preconditions: &[Precondition], writes: &[Write]) -> Result<u64, StoreError> {
        if self.take_injected_conflict() {
            return Err(StoreError::Conflict("injected conflict".to_string()));
        }

        let mut state = self.state.write().map_err(|_| StoreError::Poisoned)?;

        for pre in preconditions {
            let found = state.documents.get(&pre.key).map(|d| d.version);
            if found != pre.version {
                return Err(StoreError::Conflict(format!(
                    "{} read at {:?}, now {:?}",
                    pre.key, pre.version, found
                )));
            }
        }

        // Validate every write before applying any of them.
        for write in writes {
            match write {
                Write::Create { key, .. } if state.documents.contains_key(key) => {
                    return Err(StoreError::AlreadyExists(key.to_string()));
                }
                Write::Update { key, .. } if !state.documents.contains_key(key) => {
                    return Err(StoreError::MissingDocument(key.to_string()));
                }
                _ => {}
            }
        }

        state.sequence += 1;
        let version = state.sequence;
        for write in writes {
            match write {
                Write::Create { key, data } | Write::Update { key, data } => {
                    state.documents.insert(
                        key.clone(),
                        VersionedDocument {
                            version,
                            data: data.clone(),
                        },
                    );
                }
                Write::Delete { key } => {
                    state.documents.remove(key);
                }
            }
        }

        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(version)
    }

    fn list(&self, collection: &str) -> Result<Vec<(DocumentKey, VersionedDocument)>, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::Poisoned)?;
        Ok(state
            .documents
            .iter()
            .filter(|(k, _)| k.collection == collection)
            .map(|(k, d)| (k.clone(), d.clone()))
            .collect())
    }
}
