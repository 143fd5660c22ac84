//! Tracing and logging (shared setup).

/// Initialize process-wide tracing with defaults (`info`, JSON).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

pub use tracing::{LogFormat, init_for_tests, init_with};

/// Tracing configuration (filters, layers).
pub mod tracing;
