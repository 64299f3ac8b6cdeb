//! HTTP adapters - REST API surface.
//!
//! Each module owns its DTOs, handlers, and routes; this module holds the
//! shared application state, the error envelope, the organization-context
//! extractor, and the assembled router.

pub mod billing;
pub mod commerce;
pub mod context;
pub mod devices;
pub mod error;
pub mod oauth;
pub mod webhooks;

mod state;

use axum::extract::State;
use axum::routing::get;
use axum::Router;
use sqlx::PgPool;

pub use context::OrganizationContext;
pub use error::{ApiError, ErrorResponse};
pub use state::AppState;

/// Builds the API router.
///
/// Routes:
/// - `/health` - liveness
/// - `/api/oauth/square/*` - merchant OAuth lifecycle
/// - `/api/commerce/*` - catalog/order/payment passthrough
/// - `/api/billing/*` - platform subscription
/// - `/api/devices/*` - kiosk device registry
/// - `/api/webhooks/*` - provider webhooks (signature-verified, no auth)
///
/// The readiness probe needs the database pool and is merged in by
/// [`readiness_router`] so this router stays database-free in tests.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .nest("/api/oauth/square", oauth::routes())
        .nest("/api/commerce", commerce::routes())
        .nest("/api/billing", billing::routes())
        .nest("/api/devices", devices::routes())
        .nest("/api/webhooks", webhooks::routes())
        .with_state(state)
}

/// Builds the readiness probe router backed by a database ping.
pub fn readiness_router(pool: PgPool) -> Router {
    Router::new()
        .route("/health/ready", get(ready))
        .with_state(pool)
}

async fn ready(State(pool): State<PgPool>) -> Result<&'static str, ApiError> {
    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .map_err(|e| ApiError::from(crate::domain::foundation::DomainError::database(e)))?;
    Ok("READY")
}
