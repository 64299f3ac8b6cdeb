//! Axum router for the device endpoints.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{heartbeat, list, register, revoke};
use crate::adapters::http::AppState;

/// Device routes, mounted at `/api/devices`.
///
/// - `POST /register` - register a kiosk device
/// - `GET  /` - list the organization's devices
/// - `POST /:id/heartbeat` - record a check-in
/// - `POST /:id/revoke` - revoke a device
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/register", post(register))
        .route("/:id/heartbeat", post(heartbeat))
        .route("/:id/revoke", post(revoke))
}
