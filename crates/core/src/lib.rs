//! `lendr-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod document;
pub mod error;
pub mod id;
pub mod value_object;

pub use document::Document;
pub use error::{DomainError, DomainResult};
pub use id::{BorrowLogId, DeviceId, MemberId, RequestId, UserId};
pub use value_object::{Quantity, ValueObject};
