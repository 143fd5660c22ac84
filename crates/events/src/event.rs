use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A committed change, announced to subscribers.
///
/// Every event names the document it is about, so subscribers can re-read
/// that document when they need more than the payload carries.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Dotted type name, e.g. "lending.request.accepted".
    fn event_type(&self) -> &'static str;

    /// Payload schema version for this event type.
    fn schema_version(&self) -> u32 {
        1
    }

    /// Business time of the change.
    fn occurred_at(&self) -> DateTime<Utc>;

    /// Id of the request, borrow log, device or member the event is about.
    fn subject_id(&self) -> Uuid;
}
