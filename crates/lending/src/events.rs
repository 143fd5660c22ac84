use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use lendr_core::{BorrowLogId, DeviceId, RequestId, UserId};
use lendr_events::Event;

use crate::line_item::LineItem;

/// Event: RequestSubmitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSubmitted {
    pub request_id: RequestId,
    pub requested_by: UserId,
    pub items: Vec<LineItem>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: RequestAccepted. Always committed together with an `ItemsLent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestAccepted {
    pub request_id: RequestId,
    pub log_id: BorrowLogId,
    pub admin_id: UserId,
    pub pickup_date: DateTime<Utc>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: RequestRejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestRejected {
    pub request_id: RequestId,
    pub admin_id: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemsLent (a borrow log was opened and stock withdrawn).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemsLent {
    pub log_id: BorrowLogId,
    pub request_id: Option<RequestId>,
    pub admin_id: UserId,
    pub items: Vec<LineItem>,
    pub expected_return_date: DateTime<Utc>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LoanReturned (a borrow log was closed and stock restored).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanReturned {
    pub log_id: BorrowLogId,
    pub returned_by: UserId,
    pub returned_items: Vec<LineItem>,
    /// Devices whose stock restoration was skipped because they no longer exist.
    pub skipped_devices: Vec<DeviceId>,
    pub fine_amount: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: DeviceAdded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceAdded {
    pub device_id: DeviceId,
    pub name: String,
    pub total_stock: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Event: DeviceRemoved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRemoved {
    pub device_id: DeviceId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LendingEvent {
    RequestSubmitted(RequestSubmitted),
    RequestAccepted(RequestAccepted),
    RequestRejected(RequestRejected),
    ItemsLent(ItemsLent),
    LoanReturned(LoanReturned),
    DeviceAdded(DeviceAdded),
    DeviceRemoved(DeviceRemoved),
}

impl Event for LendingEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LendingEvent::RequestSubmitted(_) => "lending.request.submitted",
            LendingEvent::RequestAccepted(_) => "lending.request.accepted",
            LendingEvent::RequestRejected(_) => "lending.request.rejected",
            LendingEvent::ItemsLent(_) => "lending.loan.lent",
            LendingEvent::LoanReturned(_) => "lending.loan.returned",
            LendingEvent::DeviceAdded(_) => "lending.device.added",
            LendingEvent::DeviceRemoved(_) => "lending.device.removed",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            LendingEvent::RequestSubmitted(e) => e.occurred_at,
            LendingEvent::RequestAccepted(e) => e.occurred_at,
            LendingEvent::RequestRejected(e) => e.occurred_at,
            LendingEvent::ItemsLent(e) => e.occurred_at,
            LendingEvent::LoanReturned(e) => e.occurred_at,
            LendingEvent::DeviceAdded(e) => e.occurred_at,
            LendingEvent::DeviceRemoved(e) => e.occurred_at,
        }
    }

    /// The document this event is about (request, borrow log or device).
    fn subject_id(&self) -> Uuid {
        match self {
            LendingEvent::RequestSubmitted(e) => *e.request_id.as_uuid(),
            LendingEvent::RequestAccepted(e) => *e.request_id.as_uuid(),
            LendingEvent::RequestRejected(e) => *e.request_id.as_uuid(),
            LendingEvent::ItemsLent(e) => *e.log_id.as_uuid(),
            LendingEvent::LoanReturned(e) => *e.log_id.as_uuid(),
            LendingEvent::DeviceAdded(e) => *e.device_id.as_uuid(),
            LendingEvent::DeviceRemoved(e) => *e.device_id.as_uuid(),
        }
    }
}
