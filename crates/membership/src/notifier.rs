use thiserror::Error;
use tracing::info;

use lendr_events::EventHandler;

use crate::member::{MembershipApproved, MembershipEvent};

/// A rendered welcome message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WelcomeEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

impl WelcomeEmail {
    pub const SUBJECT: &'static str = "Welcome to IoT Club - Membership Approved!";

    pub fn for_member(from: &str, approved: &MembershipApproved) -> Self {
        let html = format!(
            "<p>Hi <strong>{name}</strong>,</p>\
             <p>Your membership is approved.</p>\
             <p><strong>Membership ID:</strong> {id}</p>\
             <p>You can now log in to the lending platform.</p>",
            name = approved.full_name,
            id = approved.membership_id,
        );
        Self {
            from: from.to_string(),
            to: approved.email.clone(),
            subject: Self::SUBJECT.to_string(),
            html,
        }
    }
}

/// Outbound mail transport (SMTP or a provider API), supplied by the host.
pub trait Mailer: Send + Sync {
    type Error: core::fmt::Display + core::fmt::Debug + Send + Sync + 'static;

    fn send(&self, email: &WelcomeEmail) -> Result<(), Self::Error>;
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("sending welcome mail to {to} failed: {reason}")]
    Mail { to: String, reason: String },
}

/// Sends one welcome mail per `MembershipApproved` event.
#[derive(Debug)]
pub struct WelcomeNotifier<M> {
    from: String,
    mailer: M,
}

impl<M: Mailer> WelcomeNotifier<M> {
    pub fn new(from: impl Into<String>, mailer: M) -> Self {
        Self {
            from: from.into(),
            mailer,
        }
    }

    pub fn mailer(&self) -> &M {
        &self.mailer
    }
}

impl<M: Mailer> EventHandler<MembershipEvent> for WelcomeNotifier<M> {
    type Error = NotifyError;

    fn handle(&mut self, event: &MembershipEvent) -> Result<(), Self::Error> {
        let MembershipEvent::MembershipApproved(approved) = event;
        let email = WelcomeEmail::for_member(&self.from, approved);

        self.mailer.send(&email).map_err(|e| NotifyError::Mail {
            to: email.to.clone(),
            reason: e.to_string(),
        })?;

        info!(member_id = %approved.member_id, to = %email.to, "welcome mail sent");
        Ok(())
    }
}
