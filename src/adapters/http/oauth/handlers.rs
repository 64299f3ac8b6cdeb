//! HTTP handlers for the OAuth endpoints.
//!
//! The authorize and callback endpoints run in a browser the kiosk app
//! opens; both end in redirects. The callback always redirects back into
//! the app through its custom URL scheme, carrying the outcome as query
//! parameters, so the app owns all error UX.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Redirect;
use axum::Json;

use super::dto::{AuthorizeParams, CallbackParams, ConnectionResponse};
use crate::adapters::http::{ApiError, AppState, OrganizationContext};
use crate::application::handlers::oauth::{
    BeginConnectCommand, CompleteConnectCommand, DisconnectCommand, RefreshConnectionCommand,
};
use crate::domain::foundation::{DomainError, ErrorCode, OrganizationId};

/// `GET /api/oauth/square/authorize?organization_id=...`
pub async fn authorize(
    State(state): State<AppState>,
    Query(params): Query<AuthorizeParams>,
) -> Result<Redirect, ApiError> {
    let organization_id: OrganizationId = params.organization_id.parse().map_err(|_| {
        DomainError::validation("organization_id", "organization_id must be a UUID")
    })?;

    let url = state
        .begin_connect_handler()
        .handle(BeginConnectCommand { organization_id })
        .await?;

    Ok(Redirect::temporary(&url))
}

/// `GET /api/oauth/square/callback?code=...&state=...`
///
/// Always redirects to the mobile deep link; never renders an error page.
pub async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Redirect {
    if let Some(error) = params.error {
        tracing::info!(error = %error, "OAuth callback carried a provider error");
        let status = if error == "access_denied" {
            "denied"
        } else {
            "error"
        };
        return deep_link(&state, &format!("status={}", status));
    }

    let (code, state_token) = match (params.code, params.state) {
        (Some(code), Some(state_token)) => (code, state_token),
        _ => {
            return deep_link(&state, "status=error&reason=missing_parameters");
        }
    };

    match state
        .complete_connect_handler()
        .handle(CompleteConnectCommand { code, state_token })
        .await
    {
        Ok(connection) => deep_link(
            &state,
            &format!("status=connected&merchant_id={}", connection.merchant_id),
        ),
        Err(err) => {
            tracing::warn!(error = %err, "OAuth callback failed");
            deep_link(
                &state,
                &format!("status=error&reason={}", err.code.to_string().to_lowercase()),
            )
        }
    }
}

fn deep_link(state: &AppState, query: &str) -> Redirect {
    Redirect::temporary(&state.mobile.deep_link("oauth/complete", query))
}

/// `POST /api/oauth/square/refresh`
pub async fn refresh(
    State(state): State<AppState>,
    context: OrganizationContext,
) -> Result<Json<ConnectionResponse>, ApiError> {
    let connection = state
        .refresh_connection_handler()
        .handle(RefreshConnectionCommand {
            organization_id: context.organization_id,
        })
        .await?;

    Ok(Json(ConnectionResponse::from(&connection)))
}

/// `POST /api/oauth/square/disconnect`
pub async fn disconnect(
    State(state): State<AppState>,
    context: OrganizationContext,
) -> Result<StatusCode, ApiError> {
    state
        .disconnect_handler()
        .handle(DisconnectCommand {
            organization_id: context.organization_id,
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/oauth/square/connection`
pub async fn connection_status(
    State(state): State<AppState>,
    context: OrganizationContext,
) -> Result<Json<ConnectionResponse>, ApiError> {
    let connection = state
        .connections
        .find_by_organization(&context.organization_id)
        .await?
        .ok_or_else(|| DomainError::not_found(ErrorCode::ConnectionNotFound, "Connection"))?;

    Ok(Json(ConnectionResponse::from(&connection)))
}
