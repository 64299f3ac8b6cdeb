//! DeviceRepository port - Kiosk device registration storage.

use async_trait::async_trait;

use crate::domain::device::Device;
use crate::domain::foundation::{DeviceId, DomainError, OrganizationId};

/// Port for persisting device registrations.
#[async_trait]
pub trait DeviceRepository: Send + Sync {
    /// Inserts a new device.
    async fn save(&self, device: &Device) -> Result<(), DomainError>;

    /// Updates an existing device by id.
    async fn update(&self, device: &Device) -> Result<(), DomainError>;

    /// Finds a device by id.
    async fn find_by_id(&self, id: &DeviceId) -> Result<Option<Device>, DomainError>;

    /// Lists an organization's devices, most recently seen first.
    async fn list_by_organization(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<Device>, DomainError>;
}
