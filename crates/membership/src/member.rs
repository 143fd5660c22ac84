use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use lendr_core::MemberId;
use lendr_events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    Pending,
    Approved,
    Rejected,
}

/// The fields of a member record the notification needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub full_name: String,
    pub email: String,
    /// Club-issued membership number shown to the member.
    pub membership_id: String,
    pub status: MembershipStatus,
}

/// A committed update of a member record, before and after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipStatusChanged {
    pub before: MembershipStatus,
    pub member: Member,
    pub occurred_at: DateTime<Utc>,
}

impl MembershipStatusChanged {
    /// `Some` exactly when the update moved the member into `Approved`.
    ///
    /// Re-saving an already approved member yields nothing, so one member is
    /// welcomed once.
    pub fn approval(&self) -> Option<MembershipEvent> {
        let entered_approved = self.member.status == MembershipStatus::Approved
            && self.before != MembershipStatus::Approved;
        entered_approved.then(|| {
            MembershipEvent::MembershipApproved(MembershipApproved {
                member_id: self.member.id,
                full_name: self.member.full_name.clone(),
                email: self.member.email.clone(),
                membership_id: self.member.membership_id.clone(),
                occurred_at: self.occurred_at,
            })
        })
    }
}

/// Event: MembershipApproved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipApproved {
    pub member_id: MemberId,
    pub full_name: String,
    pub email: String,
    pub membership_id: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MembershipEvent {
    MembershipApproved(MembershipApproved),
}

impl Event for MembershipEvent {
    fn event_type(&self) -> &'static str {
        match self {
            MembershipEvent::MembershipApproved(_) => "membership.approved",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            MembershipEvent::MembershipApproved(e) => e.occurred_at,
        }
    }

    fn subject_id(&self) -> Uuid {
        match self {
            MembershipEvent::MembershipApproved(e) => *e.member_id.as_uuid(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(status: MembershipStatus) -> Member {
        Member {
            id: MemberId::new(),
            full_name: "Nila K".to_string(),
            email: "nila@example.com".to_string(),
            membership_id: "IOT-2026-041".to_string(),
            status,
        }
    }

    fn change(before: MembershipStatus, after: MembershipStatus) -> MembershipStatusChanged {
        MembershipStatusChanged {
            before,
            member: member(after),
            occurred_at: Utc::now(),
        }
    }

    #[test]
    fn pending_to_approved_emits_approval() {
        let event = change(MembershipStatus::Pending, MembershipStatus::Approved)
            .approval()
            .unwrap();
        let MembershipEvent::MembershipApproved(approved) = event;
        assert_eq!(approved.membership_id, "IOT-2026-041");
    }

    #[test]
    fn other_transitions_are_ignored() {
        assert!(change(MembershipStatus::Approved, MembershipStatus::Approved).approval().is_none());
        assert!(change(MembershipStatus::Pending, MembershipStatus::Rejected).approval().is_none());
        assert!(change(MembershipStatus::Approved, MembershipStatus::Rejected).approval().is_none());
    }
}
