//! ListDevicesHandler - Lists an organization's kiosk devices.

use std::sync::Arc;

use crate::domain::device::Device;
use crate::domain::foundation::{DomainError, OrganizationId};
use crate::ports::DeviceRepository;

/// Query for an organization's devices.
#[derive(Debug, Clone)]
pub struct ListDevicesQuery {
    pub organization_id: OrganizationId,
}

/// Handler listing devices, most recently seen first.
pub struct ListDevicesHandler {
    devices: Arc<dyn DeviceRepository>,
}

impl ListDevicesHandler {
    pub fn new(devices: Arc<dyn DeviceRepository>) -> Self {
        Self { devices }
    }

    pub async fn handle(&self, query: ListDevicesQuery) -> Result<Vec<Device>, DomainError> {
        self.devices
            .list_by_organization(&query.organization_id)
            .await
    }
}
