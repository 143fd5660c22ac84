//! Lending operations (application-level orchestration).
//!
//! Every state-changing operation follows the same pipeline:
//!
//! ```text
//! Command
//!   ↓
//! 1. Validate input (no store access)
//!   ↓
//! 2. Atomic unit: read request/log, batch-read devices, decide, buffer writes
//!   ↓
//! 3. Commit (retried with fresh reads on conflict)
//!   ↓
//! 4. Publish LendingEvents to the bus (after commit, best effort)
//! ```
//!
//! All decisions are made from values read inside the unit, so a decision
//! based on stale stock can never commit.

mod catalog;
mod loans;
mod requests;

use std::collections::HashMap;

use chrono::Duration;
use thiserror::Error;
use tracing::warn;

use lendr_core::{DeviceId, DomainError};
use lendr_events::{Event, EventBus, EventEnvelope};
use lendr_lending::{Device, FinePolicy, LendingEvent, LineItem};

use crate::document_store::{
    Committed, DocumentStore, RetryPolicy, StoreError, Transaction, with_atomic_unit,
};

pub use loans::ReturnOutcome;

/// Caller-facing error of a lending operation.
#[derive(Debug, Error)]
pub enum LendingError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Coarse error classification for callers (UI messages, HTTP status, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidState,
    InsufficientStock,
    Validation,
    /// Conflict retries exhausted or another store failure.
    Storage,
}

impl LendingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LendingError::Domain(DomainError::NotFound(_)) => ErrorKind::NotFound,
            LendingError::Domain(DomainError::InvalidState(_)) => ErrorKind::InvalidState,
            LendingError::Domain(DomainError::InsufficientStock { .. }) => {
                ErrorKind::InsufficientStock
            }
            LendingError::Domain(DomainError::Validation(_) | DomainError::InvalidId(_)) => {
                ErrorKind::Validation
            }
            LendingError::Store(_) => ErrorKind::Storage,
        }
    }

    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            LendingError::Domain(e) => Some(e),
            LendingError::Store(_) => None,
        }
    }
}

/// Tunables of the lending service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LendingSettings {
    pub retry: RetryPolicy,
    /// Applied to manual lends that carry no expected return date.
    pub default_loan_period: Duration,
    pub fine_policy: FinePolicy,
}

impl LendingSettings {
    pub const DEFAULT_LOAN_DAYS: i64 = 14;
    /// Upper bound accepted from configuration (one hundred years).
    pub const MAX_LOAN_DAYS: i64 = 36_500;
}

impl Default for LendingSettings {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            default_loan_period: Duration::days(Self::DEFAULT_LOAN_DAYS),
            fine_policy: FinePolicy::default(),
        }
    }
}

/// Transaction core of the lending platform.
///
/// Stateless apart from its collaborators: all shared state lives in the
/// document store, so one service may be shared across threads.
#[derive(Debug)]
pub struct LendingService<S, B> {
    store: S,
    bus: B,
    settings: LendingSettings,
}

impl<S, B> LendingService<S, B> {
    pub fn new(store: S, bus: B, settings: LendingSettings) -> Self {
        Self {
            store,
            bus,
            settings,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn settings(&self) -> &LendingSettings {
        &self.settings
    }

    pub fn into_parts(self) -> (S, B) {
        (self.store, self.bus)
    }
}

impl<S, B> LendingService<S, B>
where
    S: DocumentStore,
    B: EventBus<EventEnvelope<LendingEvent>>,
{
    fn run<T>(
        &self,
        unit: impl FnMut(&mut Transaction<'_, S>) -> Result<T, LendingError>,
    ) -> Result<Committed<T>, LendingError> {
        with_atomic_unit(&self.store, self.settings.retry, unit)
    }

    /// Publish events for a committed unit. Failures are logged only; the
    /// state change is already durable.
    fn publish(&self, sequence: Option<u64>, events: impl IntoIterator<Item = LendingEvent>) {
        let sequence = sequence.unwrap_or_default();
        for event in events {
            let event_type = event.event_type();
            let envelope = EventEnvelope::wrap(sequence, event);
            if let Err(err) = self.bus.publish(envelope) {
                warn!(event_type, sequence, error = ?err, "event publish failed after commit");
            }
        }
    }
}

/// Batch-read every device a line-item set touches. Missing devices are
/// simply absent from the map.
fn read_devices<S>(
    tx: &mut Transaction<'_, S>,
    items: &[LineItem],
) -> Result<HashMap<DeviceId, Device>, StoreError>
where
    S: DocumentStore + ?Sized,
{
    let ids: Vec<DeviceId> = items.iter().map(|i| i.device_id).collect();
    Ok(tx
        .get_all::<Device>(&ids)?
        .into_iter()
        .flatten()
        .map(|d| (d.id_typed(), d))
        .collect())
}
