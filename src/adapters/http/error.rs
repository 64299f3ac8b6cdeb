//! API error envelope.
//!
//! Every failing endpoint returns `{ "error": { "code", "message" } }`
//! with a status derived from the domain error code. Internal detail
//! (database messages, provider payloads) stays in the logs.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, ErrorCode};

/// JSON error envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error payload carried in the envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    /// Creates an envelope from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}

/// Domain error adapted to an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError(err)
    }
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::ValidationFailed
        | ErrorCode::InvalidFormat
        | ErrorCode::OAuthStateNotFound
        | ErrorCode::OAuthStateConsumed
        | ErrorCode::OAuthStateExpired
        | ErrorCode::InvalidWebhookSignature => StatusCode::BAD_REQUEST,

        ErrorCode::ConnectionNotFound
        | ErrorCode::SubscriptionNotFound
        | ErrorCode::DeviceNotFound
        | ErrorCode::PromoCodeNotFound => StatusCode::NOT_FOUND,

        ErrorCode::InvalidStateTransition
        | ErrorCode::ConnectionRevoked
        | ErrorCode::ConnectionExpired
        | ErrorCode::DeviceRevoked
        | ErrorCode::SubscriptionExists
        | ErrorCode::PromoCodeExhausted
        | ErrorCode::PromoCodeExpired => StatusCode::CONFLICT,

        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,

        ErrorCode::ExternalServiceError => StatusCode::BAD_GATEWAY,

        ErrorCode::DatabaseError | ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(self.0.code);

        // Never leak storage/internal messages to clients
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "Request failed");
            "Internal server error".to_string()
        } else {
            self.0.message.clone()
        };

        let body = ErrorResponse::new(self.0.code.to_string(), message);
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_spot_checks() {
        assert_eq!(
            status_for(ErrorCode::ValidationFailed),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(ErrorCode::ConnectionNotFound),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(ErrorCode::SubscriptionExists),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(ErrorCode::ExternalServiceError),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(ErrorCode::DatabaseError),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn envelope_shape() {
        let body = ErrorResponse::new("CONNECTION_NOT_FOUND", "Connection not found");
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["error"]["code"], "CONNECTION_NOT_FOUND");
        assert_eq!(json["error"]["message"], "Connection not found");
    }
}
