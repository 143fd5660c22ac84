use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lendr_core::{Document, DomainError, DomainResult, RequestId, UserId};

use crate::borrower::BorrowerInfo;
use crate::commands::SubmitRequest;
use crate::line_item::{LineItem, normalize_items};

/// Lend request status lifecycle. Leaves `Pending` exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

/// A borrower's request for devices, awaiting admin action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LendRequest {
    id: RequestId,
    requested_by: UserId,
    borrower: BorrowerInfo,
    items: Vec<LineItem>,
    message: String,
    status: RequestStatus,
    created_at: DateTime<Utc>,
    admin_id: Option<UserId>,
    pickup_date: Option<DateTime<Utc>>,
    decided_at: Option<DateTime<Utc>>,
}

impl LendRequest {
    /// Validate a submission into a new pending request.
    ///
    /// No stock check happens here; availability is decided at acceptance.
    pub fn submit(id: RequestId, cmd: &SubmitRequest) -> DomainResult<Self> {
        let borrower = cmd.borrower.validated()?;
        let items = normalize_items(&cmd.items)?;

        Ok(Self {
            id,
            requested_by: cmd.requested_by.clone(),
            borrower,
            items,
            message: cmd.message.clone().unwrap_or_default(),
            status: RequestStatus::Pending,
            created_at: cmd.occurred_at,
            admin_id: None,
            pickup_date: None,
            decided_at: None,
        })
    }

    pub fn id_typed(&self) -> RequestId {
        self.id
    }

    pub fn requested_by(&self) -> &UserId {
        &self.requested_by
    }

    pub fn borrower(&self) -> &BorrowerInfo {
        &self.borrower
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> RequestStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn admin_id(&self) -> Option<&UserId> {
        self.admin_id.as_ref()
    }

    pub fn pickup_date(&self) -> Option<DateTime<Utc>> {
        self.pickup_date
    }

    pub fn decided_at(&self) -> Option<DateTime<Utc>> {
        self.decided_at
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.status, RequestStatus::Pending)
    }

    fn ensure_pending(&self) -> DomainResult<()> {
        if !self.is_pending() {
            return Err(DomainError::invalid_state(format!(
                "request {} is {:?}, not Pending",
                self.id, self.status
            )));
        }
        Ok(())
    }

    /// Transition Pending → Accepted.
    pub fn accept(
        &self,
        admin_id: &UserId,
        pickup_date: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        self.ensure_pending()?;
        let mut next = self.clone();
        next.status = RequestStatus::Accepted;
        next.admin_id = Some(admin_id.clone());
        next.pickup_date = Some(pickup_date);
        next.decided_at = Some(at);
        Ok(next)
    }

    /// Transition Pending → Rejected.
    pub fn reject(&self, admin_id: &UserId, at: DateTime<Utc>) -> DomainResult<Self> {
        self.ensure_pending()?;
        let mut next = self.clone();
        next.status = RequestStatus::Rejected;
        next.admin_id = Some(admin_id.clone());
        next.decided_at = Some(at);
        Ok(next)
    }
}

impl Document for LendRequest {
    type Id = RequestId;
    const COLLECTION: &'static str = "lendRequests";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line_item::LineItemInput;
    use lendr_core::DeviceId;

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn admin() -> UserId {
        UserId::new("admin-1").unwrap()
    }

    fn submit(quantity: i64) -> DomainResult<LendRequest> {
        LendRequest::submit(
            RequestId::new(),
            &SubmitRequest {
                requested_by: UserId::new("student-7").unwrap(),
                borrower: BorrowerInfo::new("Asha", "asha@example.com"),
                items: vec![LineItemInput::new(DeviceId::new(), "Arduino Uno R3", quantity)],
                message: None,
                occurred_at: test_time(),
            },
        )
    }

    #[test]
    fn submission_creates_pending_request() {
        let request = submit(2).unwrap();
        assert_eq!(request.status(), RequestStatus::Pending);
        assert_eq!(request.message(), "");
        assert!(request.admin_id().is_none());
        assert!(request.pickup_date().is_none());
    }

    #[test]
    fn submission_with_non_positive_quantity_is_rejected() {
        assert!(matches!(submit(0), Err(DomainError::Validation(_))));
        assert!(matches!(submit(-1), Err(DomainError::Validation(_))));
    }

    #[test]
    fn accept_sets_admin_and_pickup_date() {
        let pickup = test_time();
        let accepted = submit(1).unwrap().accept(&admin(), pickup, test_time()).unwrap();
        assert_eq!(accepted.status(), RequestStatus::Accepted);
        assert_eq!(accepted.admin_id(), Some(&admin()));
        assert_eq!(accepted.pickup_date(), Some(pickup));
    }

    #[test]
    fn request_leaves_pending_only_once() {
        let accepted = submit(1).unwrap().accept(&admin(), test_time(), test_time()).unwrap();
        assert!(matches!(
            accepted.accept(&admin(), test_time(), test_time()),
            Err(DomainError::InvalidState(_))
        ));
        assert!(matches!(
            accepted.reject(&admin(), test_time()),
            Err(DomainError::InvalidState(_))
        ));

        let rejected = submit(1).unwrap().reject(&admin(), test_time()).unwrap();
        assert_eq!(rejected.status(), RequestStatus::Rejected);
        assert!(rejected.pickup_date().is_none());
    }
}
