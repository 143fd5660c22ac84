//! Membership approval wiring: publish approvals, run the welcome mailer.

use std::io;

use tracing::{info, warn};

use lendr_events::{EventBus, EventEnvelope};
use lendr_membership::{Mailer, MembershipEvent, MembershipStatusChanged, WelcomeNotifier};

use crate::config::NotificationsConfig;
use crate::workers::{SubscriberWorker, WorkerHandle};

/// Publish a `MembershipApproved` event if `change` moved the member into
/// `Approved`. Returns whether an event was published.
///
/// Called after the member record update has committed; a failed publish is
/// logged and reported as `false`.
pub fn announce_status_change<B>(bus: &B, change: &MembershipStatusChanged, sequence: u64) -> bool
where
    B: EventBus<EventEnvelope<MembershipEvent>> + ?Sized,
{
    let Some(event) = change.approval() else {
        return false;
    };

    let member_id = change.member.id;
    match bus.publish(EventEnvelope::wrap(sequence, event)) {
        Ok(()) => {
            info!(member_id = %member_id, "membership approval announced");
            true
        }
        Err(err) => {
            warn!(member_id = %member_id, error = ?err, "membership approval publish failed");
            false
        }
    }
}

/// Start the welcome-mail subscriber on `bus`, sending from the configured
/// address.
pub fn spawn_welcome_notifier<B, M>(
    bus: &B,
    config: &NotificationsConfig,
    mailer: M,
) -> io::Result<WorkerHandle>
where
    B: EventBus<EventEnvelope<MembershipEvent>> + ?Sized,
    M: Mailer + 'static,
{
    let notifier = WelcomeNotifier::new(config.from.as_str(), mailer);
    SubscriberWorker::spawn_handler("welcome-notifier", bus, notifier)
}
