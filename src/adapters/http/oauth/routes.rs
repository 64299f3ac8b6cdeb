//! Axum router for the OAuth endpoints.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{authorize, callback, connection_status, disconnect, refresh};
use crate::adapters::http::AppState;

/// OAuth routes, mounted at `/api/oauth/square`.
///
/// - `GET  /authorize` - browser entry, redirects to Square
/// - `GET  /callback` - Square redirect target, redirects into the app
/// - `POST /refresh` - force-refresh the token pair
/// - `POST /disconnect` - revoke the connection
/// - `GET  /connection` - connection status (no token material)
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/authorize", get(authorize))
        .route("/callback", get(callback))
        .route("/refresh", post(refresh))
        .route("/disconnect", post(disconnect))
        .route("/connection", get(connection_status))
}
