//! HeartbeatDeviceHandler - Records a device check-in.

use std::sync::Arc;

use crate::domain::device::Device;
use crate::domain::foundation::{DeviceId, DomainError, ErrorCode, OrganizationId, Timestamp};
use crate::ports::DeviceRepository;

/// Command carrying one device heartbeat.
#[derive(Debug, Clone)]
pub struct HeartbeatDeviceCommand {
    pub organization_id: OrganizationId,
    pub device_id: DeviceId,
    pub app_version: Option<String>,
}

/// Handler that bumps a device's last-seen marker.
pub struct HeartbeatDeviceHandler {
    devices: Arc<dyn DeviceRepository>,
}

impl HeartbeatDeviceHandler {
    pub fn new(devices: Arc<dyn DeviceRepository>) -> Self {
        Self { devices }
    }

    pub async fn handle(&self, cmd: HeartbeatDeviceCommand) -> Result<Device, DomainError> {
        let mut device = self
            .devices
            .find_by_id(&cmd.device_id)
            .await?
            .filter(|d| d.organization_id == cmd.organization_id)
            .ok_or_else(|| DomainError::not_found(ErrorCode::DeviceNotFound, "Device"))?;

        device.heartbeat(cmd.app_version.as_deref(), Timestamp::now())?;
        self.devices.update(&device).await?;
        Ok(device)
    }
}
