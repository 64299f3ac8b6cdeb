//! Device module - Registered kiosk devices.

mod device;

pub use device::{Device, DeviceStatus};
