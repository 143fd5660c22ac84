//! Value object trait: equality by value, not identity.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values; two
/// quantities of `3` are the same quantity.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

/// A strictly positive unit count on a request or loan line.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    /// Validate raw caller input (which may be zero or negative).
    pub fn new(raw: i64) -> DomainResult<Self> {
        if raw < 1 {
            return Err(DomainError::validation(format!(
                "quantity must be at least 1 (got {raw})"
            )));
        }
        let value = u32::try_from(raw)
            .map_err(|_| DomainError::validation(format!("quantity {raw} is too large")))?;
        Ok(Self(value))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Sum two quantities, failing instead of wrapping.
    pub fn checked_add(self, other: Quantity) -> DomainResult<Self> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or_else(|| DomainError::validation("quantity overflow"))
    }
}

impl ValueObject for Quantity {}

impl TryFrom<i64> for Quantity {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for u32 {
    fn from(value: Quantity) -> Self {
        value.0
    }
}

impl core::fmt::Display for Quantity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn zero_and_negative_are_rejected() {
        assert!(matches!(Quantity::new(0), Err(DomainError::Validation(_))));
        assert!(matches!(Quantity::new(-3), Err(DomainError::Validation(_))));
    }

    #[test]
    fn deserializing_a_non_positive_quantity_fails() {
        let parsed: Result<Quantity, _> = serde_json::from_str("0");
        assert!(parsed.is_err());
        let parsed: Quantity = serde_json::from_str("4").unwrap();
        assert_eq!(parsed.get(), 4);
    }

    proptest! {
        #[test]
        fn any_positive_u32_is_accepted(raw in 1i64..=(u32::MAX as i64)) {
            let q = Quantity::new(raw).unwrap();
            prop_assert_eq!(q.get() as i64, raw);
        }
    }
}
