use tracing::info;

use lendr_core::{DeviceId, DomainError};
use lendr_events::{EventBus, EventEnvelope};
use lendr_lending::{AddDevice, Device, DeviceAdded, DeviceRemoved, LendingEvent, RemoveDevice};

use crate::document_store::DocumentStore;

use super::{LendingError, LendingService};

impl<S, B> LendingService<S, B>
where
    S: DocumentStore,
    B: EventBus<EventEnvelope<LendingEvent>>,
{
    /// Add a fully stocked device to the catalog.
    pub fn add_device(&self, cmd: &AddDevice) -> Result<DeviceId, LendingError> {
        let device = Device::create(DeviceId::new(), cmd)?;

        let committed = self.run(|tx| {
            tx.create(&device)?;
            Ok(())
        })?;

        info!(
            device_id = %device.id_typed(),
            name = device.name(),
            total_stock = device.total_stock(),
            "device added"
        );
        self.publish(
            committed.sequence,
            [LendingEvent::DeviceAdded(DeviceAdded {
                device_id: device.id_typed(),
                name: device.name().to_string(),
                total_stock: device.total_stock(),
                occurred_at: cmd.occurred_at,
            })],
        );
        Ok(device.id_typed())
    }

    /// Remove a device. Refused while any of its units are out on loan.
    pub fn remove_device(&self, cmd: &RemoveDevice) -> Result<(), LendingError> {
        let committed = self.run(|tx| {
            let device = tx
                .get::<Device>(&cmd.device_id)?
                .ok_or_else(|| DomainError::not_found(format!("device {}", cmd.device_id)))?;
            if !device.is_fully_stocked() {
                return Err(DomainError::invalid_state(format!(
                    "{} has {} unit(s) out on loan",
                    device.name(),
                    device.units_out()
                ))
                .into());
            }
            tx.delete::<Device>(&cmd.device_id);
            Ok(())
        })?;

        info!(device_id = %cmd.device_id, "device removed");
        self.publish(
            committed.sequence,
            [LendingEvent::DeviceRemoved(DeviceRemoved {
                device_id: cmd.device_id,
                occurred_at: cmd.occurred_at,
            })],
        );
        Ok(())
    }
}
