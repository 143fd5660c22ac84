//! Read side for the admin UI.
//!
//! Point reads and listings outside any atomic unit. Results are snapshots:
//! a listing may interleave with concurrent commits.

use chrono::{DateTime, Utc};

use lendr_core::{BorrowLogId, DeviceId, RequestId, UserId};
use lendr_lending::{BorrowLog, Device, LendRequest};

use crate::document_store::{DocumentStore, StoreError, get_typed, list_typed};

/// A device whose availability disagrees with the loans on record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerDiscrepancy {
    pub device_id: DeviceId,
    pub device_name: String,
    pub total_stock: u32,
    pub available_stock: u32,
    /// `total_stock` minus units held by open loans and write-offs.
    pub expected_available: i64,
}

#[derive(Debug, Clone)]
pub struct LendingQueries<S> {
    store: S,
}

impl<S: DocumentStore> LendingQueries<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn device(&self, id: DeviceId) -> Result<Option<Device>, StoreError> {
        get_typed::<Device, _>(&self.store, &id)
    }

    pub fn request(&self, id: RequestId) -> Result<Option<LendRequest>, StoreError> {
        get_typed::<LendRequest, _>(&self.store, &id)
    }

    pub fn borrow_log(&self, id: BorrowLogId) -> Result<Option<BorrowLog>, StoreError> {
        get_typed::<BorrowLog, _>(&self.store, &id)
    }

    /// Catalog sorted by name.
    pub fn devices(&self) -> Result<Vec<Device>, StoreError> {
        let mut devices = list_typed::<Device, _>(&self.store)?;
        devices.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(devices)
    }

    /// Pending requests, oldest first.
    pub fn pending_requests(&self) -> Result<Vec<LendRequest>, StoreError> {
        let mut pending: Vec<LendRequest> = list_typed::<LendRequest, _>(&self.store)?
            .into_iter()
            .filter(LendRequest::is_pending)
            .collect();
        pending.sort_by_key(LendRequest::created_at);
        Ok(pending)
    }

    pub fn open_loans(&self) -> Result<Vec<BorrowLog>, StoreError> {
        let mut open: Vec<BorrowLog> = list_typed::<BorrowLog, _>(&self.store)?
            .into_iter()
            .filter(BorrowLog::is_open)
            .collect();
        open.sort_by_key(BorrowLog::date_borrowed);
        Ok(open)
    }

    /// Open loans past their expected return date at `at`, most overdue first.
    pub fn overdue_loans(&self, at: DateTime<Utc>) -> Result<Vec<BorrowLog>, StoreError> {
        let mut overdue: Vec<BorrowLog> = list_typed::<BorrowLog, _>(&self.store)?
            .into_iter()
            .filter(|log| log.is_overdue(at))
            .collect();
        overdue.sort_by_key(BorrowLog::expected_return_date);
        Ok(overdue)
    }

    /// Every log opened for requests made by `uid`, newest first.
    pub fn loans_for_borrower(&self, uid: &UserId) -> Result<Vec<BorrowLog>, StoreError> {
        let mut logs: Vec<BorrowLog> = list_typed::<BorrowLog, _>(&self.store)?
            .into_iter()
            .filter(|log| log.borrower_uid() == Some(uid))
            .collect();
        logs.sort_by_key(|log| std::cmp::Reverse(log.date_borrowed()));
        Ok(logs)
    }

    /// Recompute `available = total - held` for every device and report the
    /// ones that disagree. Empty when the ledger is consistent.
    pub fn ledger_discrepancies(&self) -> Result<Vec<LedgerDiscrepancy>, StoreError> {
        let logs = list_typed::<BorrowLog, _>(&self.store)?;
        let devices = list_typed::<Device, _>(&self.store)?;

        Ok(devices
            .into_iter()
            .filter_map(|device| {
                let held: i64 = logs
                    .iter()
                    .map(|log| i64::from(log.units_held(device.id_typed())))
                    .sum();
                let expected_available = i64::from(device.total_stock()) - held;
                (expected_available != i64::from(device.available_stock())).then(|| {
                    LedgerDiscrepancy {
                        device_id: device.id_typed(),
                        device_name: device.name().to_string(),
                        total_stock: device.total_stock(),
                        available_stock: device.available_stock(),
                        expected_available,
                    }
                })
            })
            .collect())
    }
}
