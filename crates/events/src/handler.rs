use crate::Event;

/// Reacts to published events (subscriber abstraction).
///
/// Handlers run downstream of a committed change, so they must never try to
/// undo it; failures are reported to the worker driving them, which logs and
/// moves on. Delivery is at-least-once, so handlers should tolerate duplicates.
pub trait EventHandler<E: Event> {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn handle(&mut self, event: &E) -> Result<(), Self::Error>;
}
