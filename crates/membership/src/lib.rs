//! Membership approval notifications.
//!
//! Membership registration itself lives outside the lending core. This crate
//! only turns a member's status change into a `MembershipApproved` event and
//! reacts to it by sending a welcome message through a pluggable `Mailer`.

pub mod member;
pub mod notifier;

pub use member::{Member, MembershipApproved, MembershipEvent, MembershipStatus, MembershipStatusChanged};
pub use notifier::{Mailer, NotifyError, WelcomeEmail, WelcomeNotifier};
