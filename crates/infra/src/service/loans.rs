use chrono::{DateTime, Utc};
use tracing::{info, warn};

use lendr_core::{BorrowLogId, DeviceId, DomainError, UserId};
use lendr_events::{EventBus, EventEnvelope};
use lendr_lending::{
    BorrowLog, ItemsLent, LendingEvent, LineItemInput, LoanReturned, ManualLend, MarkReturned,
    normalize_items, plan_checkout, plan_restock,
};

use crate::document_store::DocumentStore;

use super::{LendingError, LendingService, read_devices};

/// Result of closing a loan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnOutcome {
    pub log: BorrowLog,
    /// Returned devices that no longer exist in the catalog; their stock was
    /// not restored.
    pub skipped_devices: Vec<DeviceId>,
}

impl<S, B> LendingService<S, B>
where
    S: DocumentStore,
    B: EventBus<EventEnvelope<LendingEvent>>,
{
    /// Lend devices directly, without a prior request.
    ///
    /// When `expected_return_date` is absent the configured loan period
    /// applies; a period that overflows the calendar is a `Validation`
    /// error. Stock checks are identical to request acceptance.
    pub fn manual_lend(&self, cmd: &ManualLend) -> Result<BorrowLogId, LendingError> {
        cmd.borrower.validated()?;
        let items = normalize_items(&cmd.items)?;
        let expected = match cmd.expected_return_date {
            Some(date) => date,
            None => cmd
                .occurred_at
                .checked_add_signed(self.settings.default_loan_period)
                .ok_or_else(|| {
                    DomainError::validation("default loan period overflows the return date")
                })?,
        };
        let log_id = BorrowLogId::new();

        let committed = self.run(|tx| {
            let devices = read_devices(tx, &items)?;
            let changes = plan_checkout(&items, &devices)?;
            let log = BorrowLog::open_manual(
                log_id,
                &cmd.admin_id,
                &cmd.borrower,
                items.clone(),
                expected,
                cmd.occurred_at,
            )?;

            for change in &changes {
                tx.update(&change.device)?;
            }
            tx.create(&log)?;
            Ok(log)
        })?;

        let log = committed.value;
        info!(
            log_id = %log_id,
            admin_id = %cmd.admin_id,
            borrower = %log.borrower().email,
            attempts = committed.attempts,
            "manual lend recorded"
        );
        self.publish(
            committed.sequence,
            [LendingEvent::ItemsLent(ItemsLent {
                log_id,
                request_id: None,
                admin_id: cmd.admin_id.clone(),
                items: log.items().to_vec(),
                expected_return_date: log.expected_return_date(),
                occurred_at: cmd.occurred_at,
            })],
        );
        Ok(log_id)
    }

    /// Close a loan with the caller-supplied fine.
    ///
    /// Returned units go back to their devices; devices removed from the
    /// catalog are skipped. Units left off a partial return set are written
    /// off.
    pub fn mark_returned(&self, cmd: &MarkReturned) -> Result<ReturnOutcome, LendingError> {
        self.close_loan(
            cmd.log_id,
            &cmd.returned_items,
            &cmd.returned_by,
            cmd.occurred_at,
            |_| cmd.fine_amount,
        )
    }

    /// Close a loan, charging the configured [`FinePolicy`] fine if it is
    /// overdue at `occurred_at`.
    ///
    /// [`FinePolicy`]: lendr_lending::FinePolicy
    pub fn mark_returned_with_policy(
        &self,
        log_id: BorrowLogId,
        returned_items: &[LineItemInput],
        returned_by: &UserId,
        occurred_at: DateTime<Utc>,
    ) -> Result<ReturnOutcome, LendingError> {
        let policy = self.settings.fine_policy;
        self.close_loan(log_id, returned_items, returned_by, occurred_at, |log| {
            policy.fine_for(log, occurred_at)
        })
    }

    fn close_loan(
        &self,
        log_id: BorrowLogId,
        returned_items: &[LineItemInput],
        returned_by: &UserId,
        occurred_at: DateTime<Utc>,
        fine: impl Fn(&BorrowLog) -> u64,
    ) -> Result<ReturnOutcome, LendingError> {
        let committed = self.run(|tx| {
            let log = tx
                .get::<BorrowLog>(&log_id)?
                .ok_or_else(|| DomainError::not_found(format!("borrow log {log_id}")))?;
            let returned = log.validate_return(returned_items)?;

            let devices = read_devices(tx, &returned)?;
            let changes = plan_restock(&returned, &devices)?;
            let skipped_devices: Vec<DeviceId> = returned
                .iter()
                .map(|i| i.device_id)
                .filter(|id| !devices.contains_key(id))
                .collect();
            let closed = log.close(returned, returned_by, fine(&log), occurred_at)?;

            for change in &changes {
                tx.update(&change.device)?;
            }
            tx.update(&closed)?;
            Ok(ReturnOutcome {
                log: closed,
                skipped_devices,
            })
        })?;

        let outcome = committed.value;
        if !outcome.skipped_devices.is_empty() {
            warn!(
                log_id = %log_id,
                skipped = ?outcome.skipped_devices,
                "returned devices no longer in catalog; stock not restored"
            );
        }
        let written_off = outcome.log.unreturned_items();
        info!(
            log_id = %log_id,
            returned_by = %returned_by,
            fine_amount = outcome.log.fine_amount(),
            written_off_lines = written_off.len(),
            attempts = committed.attempts,
            "loan returned"
        );
        self.publish(
            committed.sequence,
            [LendingEvent::LoanReturned(LoanReturned {
                log_id,
                returned_by: returned_by.clone(),
                returned_items: outcome.log.returned_items().unwrap_or_default().to_vec(),
                skipped_devices: outcome.skipped_devices.clone(),
                fine_amount: outcome.log.fine_amount(),
                occurred_at,
            })],
        );
        Ok(outcome)
    }
}
