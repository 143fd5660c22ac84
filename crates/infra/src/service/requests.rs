use tracing::info;

use lendr_core::{BorrowLogId, DomainError, RequestId};
use lendr_events::{EventBus, EventEnvelope};
use lendr_lending::{
    AcceptRequest, BorrowLog, ItemsLent, LendRequest, LendingEvent, RejectRequest,
    RequestAccepted, RequestRejected, RequestSubmitted, SubmitRequest, plan_checkout,
};

use crate::document_store::{DocumentStore, Transaction};

use super::{LendingError, LendingService, read_devices};

fn read_request<S>(
    tx: &mut Transaction<'_, S>,
    request_id: RequestId,
) -> Result<LendRequest, LendingError>
where
    S: DocumentStore + ?Sized,
{
    tx.get::<LendRequest>(&request_id)?.ok_or_else(|| {
        DomainError::invalid_state(format!("request {request_id} does not exist")).into()
    })
}

impl<S, B> LendingService<S, B>
where
    S: DocumentStore,
    B: EventBus<EventEnvelope<LendingEvent>>,
{
    /// Record a new pending request. No stock is checked or reserved.
    pub fn submit_request(&self, cmd: &SubmitRequest) -> Result<RequestId, LendingError> {
        let request = LendRequest::submit(RequestId::new(), cmd)?;

        let committed = self.run(|tx| {
            tx.create(&request)?;
            Ok(())
        })?;

        info!(
            request_id = %request.id_typed(),
            requested_by = %request.requested_by(),
            items = request.items().len(),
            "lend request submitted"
        );
        self.publish(
            committed.sequence,
            [LendingEvent::RequestSubmitted(RequestSubmitted {
                request_id: request.id_typed(),
                requested_by: request.requested_by().clone(),
                items: request.items().to_vec(),
                occurred_at: cmd.occurred_at,
            })],
        );
        Ok(request.id_typed())
    }

    /// Accept a pending request: withdraw stock for every line, open a
    /// borrow log and mark the request accepted, all in one unit.
    ///
    /// Fails with `InvalidState` if the request is missing or not pending,
    /// `NotFound` if a device is gone, `InsufficientStock` if a device
    /// cannot cover its line and `Validation` if the expected return date
    /// precedes `occurred_at`. Nothing is written on failure.
    pub fn accept_request(&self, cmd: &AcceptRequest) -> Result<BorrowLogId, LendingError> {
        let log_id = BorrowLogId::new();

        let committed = self.run(|tx| {
            let request = read_request(tx, cmd.request_id)?;
            let accepted = request.accept(&cmd.admin_id, cmd.pickup_date, cmd.occurred_at)?;

            let devices = read_devices(tx, request.items())?;
            let changes = plan_checkout(request.items(), &devices)?;
            let log = BorrowLog::open_for_request(
                log_id,
                &request,
                &cmd.admin_id,
                cmd.expected_return_date,
                cmd.occurred_at,
            )?;

            for change in &changes {
                tx.update(&change.device)?;
            }
            tx.create(&log)?;
            tx.update(&accepted)?;
            Ok(log)
        })?;

        let log = committed.value;
        info!(
            request_id = %cmd.request_id,
            log_id = %log_id,
            admin_id = %cmd.admin_id,
            attempts = committed.attempts,
            "lend request accepted"
        );
        self.publish(
            committed.sequence,
            [
                LendingEvent::RequestAccepted(RequestAccepted {
                    request_id: cmd.request_id,
                    log_id,
                    admin_id: cmd.admin_id.clone(),
                    pickup_date: cmd.pickup_date,
                    occurred_at: cmd.occurred_at,
                }),
                LendingEvent::ItemsLent(ItemsLent {
                    log_id,
                    request_id: Some(cmd.request_id),
                    admin_id: cmd.admin_id.clone(),
                    items: log.items().to_vec(),
                    expected_return_date: log.expected_return_date(),
                    occurred_at: cmd.occurred_at,
                }),
            ],
        );
        Ok(log_id)
    }

    /// Reject a pending request. No ledger side effect.
    pub fn reject_request(&self, cmd: &RejectRequest) -> Result<(), LendingError> {
        let committed = self.run(|tx| {
            let request = read_request(tx, cmd.request_id)?;
            let rejected = request.reject(&cmd.admin_id, cmd.occurred_at)?;
            tx.update(&rejected)?;
            Ok(())
        })?;

        info!(
            request_id = %cmd.request_id,
            admin_id = %cmd.admin_id,
            "lend request rejected"
        );
        self.publish(
            committed.sequence,
            [LendingEvent::RequestRejected(RequestRejected {
                request_id: cmd.request_id,
                admin_id: cmd.admin_id.clone(),
                occurred_at: cmd.occurred_at,
            })],
        );
        Ok(())
    }
}
