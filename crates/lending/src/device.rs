use serde::{Deserialize, Serialize};

use lendr_core::{DeviceId, Document, DomainError, DomainResult, Quantity};

use crate::commands::AddDevice;

/// Inventory ledger entry: one lendable item type with bounded stock.
///
/// Invariant: `0 <= available_stock <= total_stock`. `total_stock` is fixed at
/// creation; only checkout and restock move `available_stock`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    id: DeviceId,
    name: String,
    model: String,
    category: String,
    description: String,
    image_url: Option<String>,
    total_stock: u32,
    available_stock: u32,
}

impl Device {
    /// Create a fully-stocked device from an admin command.
    pub fn create(id: DeviceId, cmd: &AddDevice) -> DomainResult<Self> {
        if cmd.name.trim().is_empty() {
            return Err(DomainError::validation("device name cannot be empty"));
        }
        Ok(Self {
            id,
            name: cmd.name.trim().to_string(),
            model: cmd.model.trim().to_string(),
            category: cmd.category.trim().to_string(),
            description: cmd.description.clone(),
            image_url: cmd.image_url.clone(),
            total_stock: cmd.total_stock,
            available_stock: cmd.total_stock,
        })
    }

    pub fn id_typed(&self) -> DeviceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn total_stock(&self) -> u32 {
        self.total_stock
    }

    pub fn available_stock(&self) -> u32 {
        self.available_stock
    }

    /// Units currently out on loan (or written off).
    pub fn units_out(&self) -> u32 {
        self.total_stock - self.available_stock
    }

    pub fn is_fully_stocked(&self) -> bool {
        self.available_stock == self.total_stock
    }

    /// Take `quantity` units out of the available pool.
    pub fn withdraw(&self, quantity: Quantity) -> DomainResult<Self> {
        if self.available_stock < quantity.get() {
            return Err(DomainError::insufficient_stock(
                self.id.to_string(),
                self.name.clone(),
                self.available_stock,
                quantity.get(),
            ));
        }
        let mut next = self.clone();
        next.available_stock -= quantity.get();
        Ok(next)
    }

    /// Put `quantity` units back into the available pool.
    pub fn restock(&self, quantity: Quantity) -> DomainResult<Self> {
        let restored = self.available_stock.saturating_add(quantity.get());
        if restored > self.total_stock {
            return Err(DomainError::invalid_state(format!(
                "restocking {} unit(s) of {} would exceed total stock {} (available {})",
                quantity, self.name, self.total_stock, self.available_stock
            )));
        }
        let mut next = self.clone();
        next.available_stock = restored;
        Ok(next)
    }
}

impl Document for Device {
    type Id = DeviceId;
    const COLLECTION: &'static str = "devices";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_device(total: u32) -> Device {
        Device::create(
            DeviceId::new(),
            &AddDevice {
                name: "Ultrasonic Sensor".to_string(),
                model: "HC-SR04".to_string(),
                category: "Sensor".to_string(),
                description: "Distance measurement sensor".to_string(),
                image_url: None,
                total_stock: total,
                occurred_at: chrono::Utc::now(),
            },
        )
        .unwrap()
    }

    fn qty(n: i64) -> Quantity {
        Quantity::new(n).unwrap()
    }

    #[test]
    fn new_device_starts_fully_stocked() {
        let device = test_device(20);
        assert_eq!(device.available_stock(), 20);
        assert!(device.is_fully_stocked());
    }

    #[test]
    fn blank_name_is_rejected() {
        let err = Device::create(
            DeviceId::new(),
            &AddDevice {
                name: "   ".to_string(),
                model: String::new(),
                category: String::new(),
                description: String::new(),
                image_url: None,
                total_stock: 1,
                occurred_at: chrono::Utc::now(),
            },
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn withdraw_beyond_availability_reports_current_count() {
        let device = test_device(2).withdraw(qty(2)).unwrap();
        assert_eq!(device.available_stock(), 0);

        match device.withdraw(qty(1)).unwrap_err() {
            DomainError::InsufficientStock { available, requested, device_name, .. } => {
                assert_eq!(available, 0);
                assert_eq!(requested, 1);
                assert_eq!(device_name, "Ultrasonic Sensor");
            }
            other => panic!("expected insufficient stock, got {other:?}"),
        }
    }

    #[test]
    fn restock_cannot_exceed_total() {
        let device = test_device(3).withdraw(qty(1)).unwrap();
        assert!(matches!(device.restock(qty(2)), Err(DomainError::InvalidState(_))));
        assert_eq!(device.restock(qty(1)).unwrap().available_stock(), 3);
    }

    #[test]
    fn document_body_uses_snake_case_stock_fields() {
        let json = serde_json::to_value(test_device(5)).unwrap();
        assert_eq!(json["total_stock"], 5);
        assert_eq!(json["available_stock"], 5);
    }

    proptest! {
        /// Property: any sequence of withdraw/restock attempts keeps
        /// `0 <= available <= total`.
        #[test]
        fn stock_stays_within_bounds(
            total in 0u32..50,
            ops in prop::collection::vec((any::<bool>(), 1i64..10), 0..40)
        ) {
            let mut device = test_device(total);
            for (take, n) in ops {
                let next = if take { device.withdraw(qty(n)) } else { device.restock(qty(n)) };
                if let Ok(d) = next {
                    device = d;
                }
                prop_assert!(device.available_stock() <= device.total_stock());
            }
        }
    }
}
