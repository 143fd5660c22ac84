//! Inputs to the lending operations.
//!
//! Commands carry raw caller input plus the business time (`occurred_at`) at
//! which the caller issued them; validation happens in the domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lendr_core::{BorrowLogId, DeviceId, RequestId, UserId};

use crate::borrower::BorrowerInfo;
use crate::line_item::LineItemInput;

/// Command: SubmitRequest (borrower).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub requested_by: UserId,
    pub borrower: BorrowerInfo,
    pub items: Vec<LineItemInput>,
    pub message: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AcceptRequest (admin).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptRequest {
    pub request_id: RequestId,
    pub admin_id: UserId,
    pub pickup_date: DateTime<Utc>,
    pub expected_return_date: DateTime<Utc>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RejectRequest (admin).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectRequest {
    pub request_id: RequestId,
    pub admin_id: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ManualLend (admin, no prior request).
///
/// `expected_return_date` falls back to the configured loan period when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualLend {
    pub admin_id: UserId,
    pub borrower: BorrowerInfo,
    pub items: Vec<LineItemInput>,
    pub expected_return_date: Option<DateTime<Utc>>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: MarkReturned.
///
/// `fine_amount` is in the smallest currency unit; callers compute it (see
/// `FinePolicy`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkReturned {
    pub log_id: BorrowLogId,
    pub returned_items: Vec<LineItemInput>,
    pub returned_by: UserId,
    pub fine_amount: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AddDevice (catalog admin).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddDevice {
    pub name: String,
    pub model: String,
    pub category: String,
    pub description: String,
    pub image_url: Option<String>,
    pub total_stock: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RemoveDevice (catalog admin).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveDevice {
    pub device_id: DeviceId,
    pub occurred_at: DateTime<Utc>,
}
