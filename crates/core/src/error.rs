//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// missing records, illegal state transitions, stock shortfalls). Storage
/// concerns such as write conflicts belong to the infrastructure layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed input (empty item list, non-positive quantity, missing borrower fields).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced device, request or borrow log does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A record is not in the state the operation requires (e.g. request not pending).
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Requested quantity exceeds the device's current availability.
    #[error("insufficient stock for {device_name}: available {available}, requested {requested}")]
    InsufficientStock {
        device_id: String,
        device_name: String,
        available: u32,
        requested: u32,
    },

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn insufficient_stock(
        device_id: impl Into<String>,
        device_name: impl Into<String>,
        available: u32,
        requested: u32,
    ) -> Self {
        Self::InsufficientStock {
            device_id: device_id.into(),
            device_name: device_name.into(),
            available,
            requested,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_stock_message_names_device_and_availability() {
        let err = DomainError::insufficient_stock("d-1", "Arduino Uno R3", 0, 1);
        assert_eq!(
            err.to_string(),
            "insufficient stock for Arduino Uno R3: available 0, requested 1"
        );
    }

    #[test]
    fn constructors_build_matching_variants() {
        assert!(matches!(DomainError::validation("x"), DomainError::Validation(m) if m == "x"));
        assert!(matches!(DomainError::not_found("device"), DomainError::NotFound(m) if m == "device"));
        assert!(matches!(DomainError::invalid_state("s"), DomainError::InvalidState(_)));
    }
}
