use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::borrow_log::BorrowLog;

/// Overdue fine rule applied by callers before marking a loan returned.
///
/// A flat charge per overdue loan, regardless of how late or how many items.
/// Amounts are in the smallest currency unit.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinePolicy {
    pub overdue_fine: u64,
}

impl FinePolicy {
    /// ₹2 per overdue loan, expressed in paise.
    pub const DEFAULT_OVERDUE_FINE: u64 = 200;

    pub fn new(overdue_fine: u64) -> Self {
        Self { overdue_fine }
    }

    /// Fine owed if `log` is returned at `returned_at`.
    pub fn fine_for(&self, log: &BorrowLog, returned_at: DateTime<Utc>) -> u64 {
        if log.is_overdue(returned_at) {
            self.overdue_fine
        } else {
            0
        }
    }
}

impl Default for FinePolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_OVERDUE_FINE)
    }
}
