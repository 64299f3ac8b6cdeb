//! Device handlers - Kiosk registration and lifecycle.

mod heartbeat_device;
mod list_devices;
mod register_device;
mod revoke_device;

pub use heartbeat_device::{HeartbeatDeviceCommand, HeartbeatDeviceHandler};
pub use list_devices::{ListDevicesHandler, ListDevicesQuery};
pub use register_device::{RegisterDeviceCommand, RegisterDeviceHandler};
pub use revoke_device::{RevokeDeviceCommand, RevokeDeviceHandler};
