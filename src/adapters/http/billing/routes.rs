//! Axum router for the billing endpoints.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{
    cancel_subscription, create_checkout, get_portal, get_subscription,
    list_subscription_events, validate_promo,
};
use crate::adapters::http::AppState;

/// Billing routes, mounted at `/api/billing`.
///
/// - `GET  /subscription` - local subscription record + access flag
/// - `GET  /subscription/events` - billing history, newest first
/// - `POST /checkout` - start hosted checkout
/// - `GET  /portal` - hosted billing portal URL
/// - `POST /cancel` - cancel at period end
/// - `POST /promo/validate` - promo code terms
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/subscription", get(get_subscription))
        .route("/subscription/events", get(list_subscription_events))
        .route("/checkout", post(create_checkout))
        .route("/portal", get(get_portal))
        .route("/cancel", post(cancel_subscription))
        .route("/promo/validate", post(validate_promo))
}
