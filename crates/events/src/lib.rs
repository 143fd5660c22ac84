//! Change notifications: events, envelopes and the pub/sub bus.
//!
//! Committed state changes in the lending core and membership status changes
//! are announced here; consumers (UI refresh, notification senders) subscribe.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod handler;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use handler::EventHandler;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
