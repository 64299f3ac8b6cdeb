//! Devices HTTP module - Kiosk device registry endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::DeviceResponse;
pub use routes::routes;
