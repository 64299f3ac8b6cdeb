//! Organization context extraction.
//!
//! The kiosk app identifies its organization with the `X-Organization-Id`
//! header on every API call. Full authentication is out of scope for this
//! service; the header is the contract with the mobile client.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use super::error::ErrorResponse;
use crate::domain::foundation::OrganizationId;

/// Header carrying the caller's organization id.
pub const ORGANIZATION_HEADER: &str = "x-organization-id";

/// Authenticated organization context extracted from the request.
#[derive(Debug, Clone, Copy)]
pub struct OrganizationContext {
    pub organization_id: OrganizationId,
}

/// Rejection for a missing or malformed organization header.
pub struct OrganizationRequired;

impl IntoResponse for OrganizationRequired {
    fn into_response(self) -> axum::response::Response {
        let error = ErrorResponse::new(
            "ORGANIZATION_REQUIRED",
            "X-Organization-Id header is required",
        );
        (StatusCode::UNAUTHORIZED, Json(error)).into_response()
    }
}

impl<S> axum::extract::FromRequestParts<S> for OrganizationContext
where
    S: Send + Sync,
{
    type Rejection = OrganizationRequired;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut axum::http::request::Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let organization_id = parts
                .headers
                .get(ORGANIZATION_HEADER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<OrganizationId>().ok())
                .ok_or(OrganizationRequired)?;

            Ok(OrganizationContext { organization_id })
        })
    }
}
