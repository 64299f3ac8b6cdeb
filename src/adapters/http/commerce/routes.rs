//! Axum router for the commerce endpoints.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{create_order, create_payment, list_catalog};
use crate::adapters::http::AppState;

/// Commerce routes, mounted at `/api/commerce`.
///
/// - `GET  /catalog` - list catalog items (cursor passthrough)
/// - `POST /orders` - create an order
/// - `POST /payments` - take a payment
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/catalog", get(list_catalog))
        .route("/orders", post(create_order))
        .route("/payments", post(create_payment))
}
