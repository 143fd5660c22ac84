use serde::{Deserialize, Serialize};

use lendr_core::{DeviceId, DomainError, DomainResult, Quantity};

/// One line of a request or loan: a device and how many units of it.
///
/// `device_name` is a snapshot taken when the line was written so that
/// history stays readable after catalog edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub device_id: DeviceId,
    pub device_name: String,
    pub quantity: Quantity,
}

/// Raw caller input for a line item; `quantity` is unchecked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemInput {
    pub device_id: DeviceId,
    pub device_name: String,
    pub quantity: i64,
}

impl LineItemInput {
    pub fn new(device_id: DeviceId, device_name: impl Into<String>, quantity: i64) -> Self {
        Self {
            device_id,
            device_name: device_name.into(),
            quantity,
        }
    }
}

/// Validate caller input into line items.
///
/// Fails on an empty list or any non-positive quantity. Lines naming the same
/// device are merged into the first occurrence so stock checks see the full
/// demand for that device.
pub fn normalize_items(inputs: &[LineItemInput]) -> DomainResult<Vec<LineItem>> {
    if inputs.is_empty() {
        return Err(DomainError::validation("at least one item is required"));
    }

    let mut items: Vec<LineItem> = Vec::with_capacity(inputs.len());
    for input in inputs {
        let quantity = Quantity::new(input.quantity).map_err(|e| match e {
            DomainError::Validation(msg) => {
                DomainError::validation(format!("{}: {msg}", input.device_name))
            }
            other => other,
        })?;

        match items.iter_mut().find(|i| i.device_id == input.device_id) {
            Some(existing) => existing.quantity = existing.quantity.checked_add(quantity)?,
            None => items.push(LineItem {
                device_id: input.device_id,
                device_name: input.device_name.trim().to_string(),
                quantity,
            }),
        }
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_is_rejected() {
        assert!(matches!(normalize_items(&[]), Err(DomainError::Validation(_))));
    }

    #[test]
    fn non_positive_quantity_names_the_line() {
        let inputs = [LineItemInput::new(DeviceId::new(), "Servo Motor", 0)];
        match normalize_items(&inputs).unwrap_err() {
            DomainError::Validation(msg) => assert!(msg.starts_with("Servo Motor")),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn duplicate_devices_are_merged_in_order() {
        let a = DeviceId::new();
        let b = DeviceId::new();
        let inputs = [
            LineItemInput::new(a, "Arduino Uno R3", 1),
            LineItemInput::new(b, "DHT11 Sensor", 2),
            LineItemInput::new(a, "Arduino Uno R3", 3),
        ];

        let items = normalize_items(&inputs).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].device_id, a);
        assert_eq!(items[0].quantity.get(), 4);
        assert_eq!(items[1].device_id, b);
    }
}
