//! Axum router for the webhook endpoints.

use axum::routing::post;
use axum::Router;

use super::handlers::{square, stripe};
use crate::adapters::http::AppState;

/// Webhook routes, mounted at `/api/webhooks`.
///
/// No authentication; deliveries are trusted by signature alone.
///
/// - `POST /square` - Square event intake
/// - `POST /stripe` - Stripe event intake
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/square", post(square))
        .route("/stripe", post(stripe))
}
