//! Request/response DTOs for the device endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::device::{Device, DeviceStatus};
use crate::domain::foundation::Timestamp;

/// Request body for device registration.
#[derive(Debug, Deserialize)]
pub struct RegisterDeviceBody {
    pub name: String,
    pub platform: String,
    pub app_version: String,
}

/// Request body for a heartbeat.
#[derive(Debug, Default, Deserialize)]
pub struct HeartbeatBody {
    pub app_version: Option<String>,
}

/// Device as exposed to the kiosk app.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceResponse {
    pub id: String,
    pub name: String,
    pub platform: String,
    pub app_version: String,
    pub status: String,
    pub registered_at: Timestamp,
    pub last_seen_at: Timestamp,
}

impl From<&Device> for DeviceResponse {
    fn from(device: &Device) -> Self {
        Self {
            id: device.id.to_string(),
            name: device.name.clone(),
            platform: device.platform.clone(),
            app_version: device.app_version.clone(),
            status: match device.status {
                DeviceStatus::Active => "active",
                DeviceStatus::Revoked => "revoked",
            }
            .to_string(),
            registered_at: device.registered_at,
            last_seen_at: device.last_seen_at,
        }
    }
}

/// Device list envelope.
#[derive(Debug, Serialize)]
pub struct DeviceListResponse {
    pub devices: Vec<DeviceResponse>,
}
