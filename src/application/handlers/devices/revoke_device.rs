//! RevokeDeviceHandler - Revokes a kiosk device.

use std::sync::Arc;

use crate::domain::foundation::{DeviceId, DomainError, ErrorCode, OrganizationId};
use crate::ports::DeviceRepository;

/// Command to revoke a device.
#[derive(Debug, Clone)]
pub struct RevokeDeviceCommand {
    pub organization_id: OrganizationId,
    pub device_id: DeviceId,
}

/// Handler that marks a device revoked.
pub struct RevokeDeviceHandler {
    devices: Arc<dyn DeviceRepository>,
}

impl RevokeDeviceHandler {
    pub fn new(devices: Arc<dyn DeviceRepository>) -> Self {
        Self { devices }
    }

    pub async fn handle(&self, cmd: RevokeDeviceCommand) -> Result<(), DomainError> {
        let mut device = self
            .devices
            .find_by_id(&cmd.device_id)
            .await?
            .filter(|d| d.organization_id == cmd.organization_id)
            .ok_or_else(|| DomainError::not_found(ErrorCode::DeviceNotFound, "Device"))?;

        device.revoke();
        self.devices.update(&device).await?;

        tracing::info!(device_id = %cmd.device_id, "Device revoked");
        Ok(())
    }
}
