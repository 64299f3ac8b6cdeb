//! RegisterDeviceHandler - Registers a kiosk device.

use std::sync::Arc;

use crate::domain::device::Device;
use crate::domain::foundation::{DomainError, OrganizationId, Timestamp};
use crate::ports::DeviceRepository;

/// Command to register a new kiosk device.
#[derive(Debug, Clone)]
pub struct RegisterDeviceCommand {
    pub organization_id: OrganizationId,
    pub name: String,
    pub platform: String,
    pub app_version: String,
}

/// Handler that validates and stores a device registration.
pub struct RegisterDeviceHandler {
    devices: Arc<dyn DeviceRepository>,
}

impl RegisterDeviceHandler {
    pub fn new(devices: Arc<dyn DeviceRepository>) -> Self {
        Self { devices }
    }

    pub async fn handle(&self, cmd: RegisterDeviceCommand) -> Result<Device, DomainError> {
        let device = Device::register(
            cmd.organization_id,
            &cmd.name,
            &cmd.platform,
            &cmd.app_version,
            Timestamp::now(),
        )?;
        self.devices.save(&device).await?;

        tracing::info!(
            organization_id = %cmd.organization_id,
            device_id = %device.id,
            name = %device.name,
            "Device registered"
        );
        Ok(device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::InMemoryDeviceRepository;
    use crate::domain::device::DeviceStatus;
    use crate::domain::foundation::ErrorCode;

    #[tokio::test]
    async fn registers_device() {
        let devices = InMemoryDeviceRepository::new();
        let handler = RegisterDeviceHandler::new(devices.clone());
        let org = OrganizationId::new();

        let device = handler
            .handle(RegisterDeviceCommand {
                organization_id: org,
                name: "Front counter".to_string(),
                platform: "iOS".to_string(),
                app_version: "2.4.1".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(device.status, DeviceStatus::Active);
        assert_eq!(devices.devices.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let handler = RegisterDeviceHandler::new(InMemoryDeviceRepository::new());

        let err = handler
            .handle(RegisterDeviceCommand {
                organization_id: OrganizationId::new(),
                name: "  ".to_string(),
                platform: "ios".to_string(),
                app_version: "2.4.1".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }
}
