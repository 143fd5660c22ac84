//! Stock planning over a snapshot of device documents.
//!
//! Callers read every device a line-item set touches, then ask these functions
//! for the resulting device versions. Nothing here writes; a failed plan means
//! nothing is written at all.

use std::collections::HashMap;

use lendr_core::{DeviceId, DomainError, DomainResult};

use crate::device::Device;
use crate::line_item::LineItem;

/// The next version of one device, plus its availability before the change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockChange {
    pub available_before: u32,
    pub device: Device,
}

impl StockChange {
    pub fn device_id(&self) -> DeviceId {
        self.device.id_typed()
    }

    /// Signed change in `available_stock`.
    pub fn delta(&self) -> i64 {
        i64::from(self.device.available_stock()) - i64::from(self.available_before)
    }
}

/// Plan a checkout of `items` against the devices read in the same unit.
///
/// Every device must exist (`NotFound`) and cover the requested quantity
/// (`InsufficientStock`, reporting the availability that was read). Repeated
/// lines for one device draw on the same running balance.
pub fn plan_checkout(
    items: &[LineItem],
    devices: &HashMap<DeviceId, Device>,
) -> DomainResult<Vec<StockChange>> {
    let mut changes: Vec<StockChange> = Vec::with_capacity(items.len());

    for item in items {
        let current = match changes.iter().position(|c| c.device_id() == item.device_id) {
            Some(idx) => changes[idx].device.clone(),
            None => devices
                .get(&item.device_id)
                .cloned()
                .ok_or_else(|| DomainError::not_found(format!("device {}", item.device_name)))?,
        };

        let next = current.withdraw(item.quantity)?;
        match changes.iter_mut().find(|c| c.device_id() == item.device_id) {
            Some(existing) => existing.device = next,
            None => changes.push(StockChange {
                available_before: current.available_stock(),
                device: next,
            }),
        }
    }

    Ok(changes)
}

/// Plan restoring `items` to the devices that still exist.
///
/// Devices removed from the catalog after being lent are skipped.
pub fn plan_restock(
    items: &[LineItem],
    devices: &HashMap<DeviceId, Device>,
) -> DomainResult<Vec<StockChange>> {
    let mut changes: Vec<StockChange> = Vec::with_capacity(items.len());

    for item in items {
        let current = match changes.iter().position(|c| c.device_id() == item.device_id) {
            Some(idx) => changes[idx].device.clone(),
            None => match devices.get(&item.device_id) {
                Some(device) => device.clone(),
                None => continue,
            },
        };

        let next = current.restock(item.quantity)?;
        match changes.iter_mut().find(|c| c.device_id() == item.device_id) {
            Some(existing) => existing.device = next,
            None => changes.push(StockChange {
                available_before: current.available_stock(),
                device: next,
            }),
        }
    }

    Ok(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::AddDevice;
    use lendr_core::Quantity;

    fn device(name: &str, total: u32) -> Device {
        Device::create(
            DeviceId::new(),
            &AddDevice {
                name: name.to_string(),
                model: String::new(),
                category: "Microcontroller".to_string(),
                description: String::new(),
                image_url: None,
                total_stock: total,
                occurred_at: chrono::Utc::now(),
            },
        )
        .unwrap()
    }

    fn line(device: &Device, n: i64) -> LineItem {
        LineItem {
            device_id: device.id_typed(),
            device_name: device.name().to_string(),
            quantity: Quantity::new(n).unwrap(),
        }
    }

    fn snapshot(devices: &[&Device]) -> HashMap<DeviceId, Device> {
        devices.iter().map(|d| (d.id_typed(), (*d).clone())).collect()
    }

    #[test]
    fn checkout_decrements_each_device() {
        let uno = device("Arduino Uno R3", 10);
        let pi = device("Raspberry Pi 4 Model B", 5);
        let changes = plan_checkout(&[line(&uno, 3), line(&pi, 5)], &snapshot(&[&uno, &pi])).unwrap();

        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].device.available_stock(), 7);
        assert_eq!(changes[0].delta(), -3);
        assert_eq!(changes[1].device.available_stock(), 0);
    }

    #[test]
    fn missing_device_fails_with_not_found() {
        let uno = device("Arduino Uno R3", 10);
        let gone = device("Relay Module", 4);
        let err = plan_checkout(&[line(&uno, 1), line(&gone, 1)], &snapshot(&[&uno])).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(msg) if msg.contains("Relay Module")));
    }

    #[test]
    fn repeated_lines_share_one_balance() {
        let uno = device("Arduino Uno R3", 3);
        let err = plan_checkout(&[line(&uno, 2), line(&uno, 2)], &snapshot(&[&uno])).unwrap_err();
        assert!(matches!(err, DomainError::InsufficientStock { available: 1, requested: 2, .. }));
    }

    #[test]
    fn restock_skips_removed_devices() {
        let uno = device("Arduino Uno R3", 3).withdraw(Quantity::new(2).unwrap()).unwrap();
        let gone = device("Relay Module", 4);
        let changes = plan_restock(&[line(&gone, 1), line(&uno, 2)], &snapshot(&[&uno])).unwrap();

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].device.available_stock(), 3);
        assert_eq!(changes[0].delta(), 2);
    }
}
