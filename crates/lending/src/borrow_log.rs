use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lendr_core::{BorrowLogId, DeviceId, Document, DomainError, DomainResult, RequestId, UserId};

use crate::borrower::BorrowerInfo;
use crate::line_item::{LineItem, LineItemInput, normalize_items};
use crate::request::LendRequest;

/// Loan status lifecycle. A log is closed exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanStatus {
    Borrowed,
    Returned,
}

/// System of record for one loan, from grant to return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowLog {
    id: BorrowLogId,
    /// `None` for manual lends.
    request_id: Option<RequestId>,
    borrower_uid: Option<UserId>,
    borrower: BorrowerInfo,
    items: Vec<LineItem>,
    date_borrowed: DateTime<Utc>,
    expected_return_date: DateTime<Utc>,
    date_returned: Option<DateTime<Utc>>,
    status: LoanStatus,
    admin_id: UserId,
    returned_by: Option<UserId>,
    fine_amount: u64,
    returned_items: Option<Vec<LineItem>>,
}

impl BorrowLog {
    /// Open a loan for an accepted request, snapshotting its borrower and items.
    pub fn open_for_request(
        id: BorrowLogId,
        request: &LendRequest,
        admin_id: &UserId,
        expected_return_date: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        Self::open(
            id,
            Some(request.id_typed()),
            Some(request.requested_by().clone()),
            request.borrower().clone(),
            request.items().to_vec(),
            admin_id,
            expected_return_date,
            at,
        )
    }

    /// Open a loan recorded directly by an admin (no prior request).
    pub fn open_manual(
        id: BorrowLogId,
        admin_id: &UserId,
        borrower: &BorrowerInfo,
        items: Vec<LineItem>,
        expected_return_date: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let borrower = borrower.validated()?;
        Self::open(id, None, None, borrower, items, admin_id, expected_return_date, at)
    }

    #[allow(clippy::too_many_arguments)]
    fn open(
        id: BorrowLogId,
        request_id: Option<RequestId>,
        borrower_uid: Option<UserId>,
        borrower: BorrowerInfo,
        items: Vec<LineItem>,
        admin_id: &UserId,
        expected_return_date: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if items.is_empty() {
            return Err(DomainError::validation("a loan needs at least one item"));
        }
        if expected_return_date < at {
            return Err(DomainError::validation(
                "expected return date cannot precede the borrow date",
            ));
        }

        Ok(Self {
            id,
            request_id,
            borrower_uid,
            borrower,
            items,
            date_borrowed: at,
            expected_return_date,
            date_returned: None,
            status: LoanStatus::Borrowed,
            admin_id: admin_id.clone(),
            returned_by: None,
            fine_amount: 0,
            returned_items: None,
        })
    }

    pub fn id_typed(&self) -> BorrowLogId {
        self.id
    }

    pub fn request_id(&self) -> Option<RequestId> {
        self.request_id
    }

    pub fn borrower_uid(&self) -> Option<&UserId> {
        self.borrower_uid.as_ref()
    }

    pub fn borrower(&self) -> &BorrowerInfo {
        &self.borrower
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn date_borrowed(&self) -> DateTime<Utc> {
        self.date_borrowed
    }

    pub fn expected_return_date(&self) -> DateTime<Utc> {
        self.expected_return_date
    }

    pub fn date_returned(&self) -> Option<DateTime<Utc>> {
        self.date_returned
    }

    pub fn status(&self) -> LoanStatus {
        self.status
    }

    pub fn admin_id(&self) -> &UserId {
        &self.admin_id
    }

    pub fn returned_by(&self) -> Option<&UserId> {
        self.returned_by.as_ref()
    }

    pub fn fine_amount(&self) -> u64 {
        self.fine_amount
    }

    pub fn returned_items(&self) -> Option<&[LineItem]> {
        self.returned_items.as_deref()
    }

    pub fn is_open(&self) -> bool {
        matches!(self.status, LoanStatus::Borrowed)
    }

    /// Open and past its expected return date at `at`.
    pub fn is_overdue(&self, at: DateTime<Utc>) -> bool {
        self.is_open() && at > self.expected_return_date
    }

    /// Units of `device_id` on this loan.
    pub fn borrowed_quantity(&self, device_id: DeviceId) -> u32 {
        quantity_of(&self.items, device_id)
    }

    /// Units of `device_id` this loan still keeps out of the available pool:
    /// everything while open, the written-off remainder once closed.
    pub fn units_held(&self, device_id: DeviceId) -> u32 {
        let borrowed = self.borrowed_quantity(device_id);
        match &self.returned_items {
            None => borrowed,
            Some(returned) => borrowed.saturating_sub(quantity_of(returned, device_id)),
        }
    }

    /// Lines that were not checked back in when the loan was closed.
    pub fn unreturned_items(&self) -> Vec<LineItem> {
        let Some(returned) = &self.returned_items else {
            return Vec::new();
        };
        self.items
            .iter()
            .filter_map(|item| {
                let missing = item
                    .quantity
                    .get()
                    .saturating_sub(quantity_of(returned, item.device_id));
                lendr_core::Quantity::new(i64::from(missing))
                    .ok()
                    .map(|quantity| LineItem { quantity, ..item.clone() })
            })
            .collect()
    }

    /// Check that a return set is legal for this log and normalize it.
    ///
    /// Every returned device must be on the loan, with no more units than were
    /// borrowed. Partial sets are allowed; an empty set writes off the whole
    /// loan.
    pub fn validate_return(&self, returned: &[LineItemInput]) -> DomainResult<Vec<LineItem>> {
        if !self.is_open() {
            return Err(DomainError::invalid_state(format!(
                "borrow log {} is already returned",
                self.id
            )));
        }
        if returned.is_empty() {
            return Ok(Vec::new());
        }

        let items = normalize_items(returned)?;
        for item in &items {
            let borrowed = self.borrowed_quantity(item.device_id);
            if borrowed == 0 {
                return Err(DomainError::validation(format!(
                    "{} is not part of borrow log {}",
                    item.device_name, self.id
                )));
            }
            if item.quantity.get() > borrowed {
                return Err(DomainError::validation(format!(
                    "cannot return {} unit(s) of {}: only {} borrowed",
                    item.quantity, item.device_name, borrowed
                )));
            }
        }
        Ok(items)
    }

    /// Transition Borrowed → Returned. `returned_items` must come from
    /// [`BorrowLog::validate_return`].
    pub fn close(
        &self,
        returned_items: Vec<LineItem>,
        returned_by: &UserId,
        fine_amount: u64,
        at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if !self.is_open() {
            return Err(DomainError::invalid_state(format!(
                "borrow log {} is already returned",
                self.id
            )));
        }
        let mut next = self.clone();
        next.status = LoanStatus::Returned;
        next.date_returned = Some(at);
        next.returned_by = Some(returned_by.clone());
        next.fine_amount = fine_amount;
        next.returned_items = Some(returned_items);
        Ok(next)
    }
}

fn quantity_of(items: &[LineItem], device_id: DeviceId) -> u32 {
    items
        .iter()
        .filter(|i| i.device_id == device_id)
        .map(|i| i.quantity.get())
        .sum()
}

impl Document for BorrowLog {
    type Id = BorrowLogId;
    const COLLECTION: &'static str = "borrowLogs";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
