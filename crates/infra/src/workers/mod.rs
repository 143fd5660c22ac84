//! Background workers driven by bus subscriptions.

pub mod subscriber_worker;

pub use subscriber_worker::{SubscriberWorker, WorkerHandle};
