//! Equipment lending domain.
//!
//! Business rules for the inventory ledger, lend requests and borrow logs,
//! implemented as deterministic domain logic (no IO, no storage). Every
//! transition returns the next version of a document; the infrastructure layer
//! decides how and when those versions are committed.

pub mod borrow_log;
pub mod borrower;
pub mod commands;
pub mod device;
pub mod events;
pub mod fine;
pub mod line_item;
pub mod request;
pub mod stock;

pub use borrow_log::{BorrowLog, LoanStatus};
pub use borrower::BorrowerInfo;
pub use commands::{
    AcceptRequest, AddDevice, ManualLend, MarkReturned, RejectRequest, RemoveDevice,
    SubmitRequest,
};
pub use device::Device;
pub use events::{
    DeviceAdded, DeviceRemoved, ItemsLent, LendingEvent, LoanReturned, RequestAccepted,
    RequestRejected, RequestSubmitted,
};
pub use fine::FinePolicy;
pub use line_item::{LineItem, LineItemInput, normalize_items};
pub use request::{LendRequest, RequestStatus};
pub use stock::{StockChange, plan_checkout, plan_restock};
