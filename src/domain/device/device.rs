//! Registered kiosk device.
//!
//! A lightweight registration record per physical kiosk. Devices report a
//! heartbeat so operators can spot kiosks that have gone dark; revoked
//! devices are refused further heartbeats.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    DeviceId, DomainError, ErrorCode, OrganizationId, Timestamp, ValidationError,
};

/// Device lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    Active,
    Revoked,
}

/// A kiosk device registered to an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub organization_id: OrganizationId,
    pub name: String,
    /// Client platform string as reported, e.g. "ios".
    pub platform: String,
    pub app_version: String,
    pub status: DeviceStatus,
    pub registered_at: Timestamp,
    pub last_seen_at: Timestamp,
}

impl Device {
    /// Registers a new device.
    pub fn register(
        organization_id: OrganizationId,
        name: &str,
        platform: &str,
        app_version: &str,
        now: Timestamp,
    ) -> Result<Self, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::empty_field("name"));
        }
        if name.len() > 80 {
            return Err(ValidationError::out_of_range(
                "name_length",
                1,
                80,
                name.len() as i64,
            ));
        }

        Ok(Self {
            id: DeviceId::new(),
            organization_id,
            name: name.to_string(),
            platform: platform.trim().to_lowercase(),
            app_version: app_version.trim().to_string(),
            status: DeviceStatus::Active,
            registered_at: now,
            last_seen_at: now,
        })
    }

    /// Records a heartbeat, optionally updating the reported app version.
    pub fn heartbeat(
        &mut self,
        app_version: Option<&str>,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        if self.status == DeviceStatus::Revoked {
            return Err(DomainError::new(
                ErrorCode::DeviceRevoked,
                format!("Device {} is revoked", self.id),
            ));
        }
        if let Some(version) = app_version {
            self.app_version = version.trim().to_string();
        }
        self.last_seen_at = now;
        Ok(())
    }

    /// Revokes the device. Revoking twice is a no-op.
    pub fn revoke(&mut self) {
        self.status = DeviceStatus::Revoked;
    }
}
