//! Shared error shape for payment platform gateways.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, ErrorCode};

/// Errors from Square or Stripe API calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayError {
    /// Error category.
    pub code: GatewayErrorCode,

    /// Human-readable message.
    pub message: String,

    /// Provider's own error code, when it sent one.
    pub provider_code: Option<String>,

    /// Whether the operation can be retried as-is.
    pub retryable: bool,
}

impl GatewayError {
    /// Creates a new gateway error.
    pub fn new(code: GatewayErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
            retryable: code.is_retryable(),
        }
    }

    /// Attaches the provider's error code.
    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    /// Network or transport failure.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::NetworkError, message)
    }

    /// Credentials rejected by the provider.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::AuthenticationError, message)
    }

    /// OAuth grant rejected (bad code, expired refresh token).
    pub fn grant_rejected(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::GrantRejected, message)
    }

    /// Resource missing at the provider.
    pub fn not_found(resource: &str) -> Self {
        Self::new(GatewayErrorCode::NotFound, format!("{} not found", resource))
    }

    /// Provider rejected the request payload.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::InvalidRequest, message)
    }

    /// Provider-side failure.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::ProviderError, message)
    }

    /// Maps an HTTP status from a provider response to an error.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let message = body.into();
        match status {
            401 | 403 => Self::authentication(message),
            404 => Self::new(GatewayErrorCode::NotFound, message),
            429 => Self::new(GatewayErrorCode::RateLimited, message),
            400..=499 => Self::invalid_request(message),
            _ => Self::provider(message),
        }
    }
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for GatewayError {}

impl From<GatewayError> for DomainError {
    fn from(err: GatewayError) -> Self {
        let code = match err.code {
            GatewayErrorCode::NotFound => ErrorCode::ConnectionNotFound,
            GatewayErrorCode::AuthenticationError | GatewayErrorCode::GrantRejected => {
                ErrorCode::Unauthorized
            }
            _ => ErrorCode::ExternalServiceError,
        };
        DomainError::new(code, err.message)
    }
}

/// Gateway error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayErrorCode {
    /// Network connectivity issue or timeout.
    NetworkError,

    /// API credentials rejected.
    AuthenticationError,

    /// OAuth code exchange or refresh grant rejected.
    GrantRejected,

    /// Resource not found at the provider.
    NotFound,

    /// Request payload rejected by the provider.
    InvalidRequest,

    /// Rate limit exceeded.
    RateLimited,

    /// Provider-side error (5xx).
    ProviderError,

    /// Unclassified failure.
    Unknown,
}

impl GatewayErrorCode {
    /// Check if this error type is typically retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GatewayErrorCode::NetworkError
                | GatewayErrorCode::RateLimited
                | GatewayErrorCode::ProviderError
        )
    }
}

impl std::fmt::Display for GatewayErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GatewayErrorCode::NetworkError => "network_error",
            GatewayErrorCode::AuthenticationError => "authentication_error",
            GatewayErrorCode::GrantRejected => "grant_rejected",
            GatewayErrorCode::NotFound => "not_found",
            GatewayErrorCode::InvalidRequest => "invalid_request",
            GatewayErrorCode::RateLimited => "rate_limited",
            GatewayErrorCode::ProviderError => "provider_error",
            GatewayErrorCode::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_follows_code() {
        assert!(GatewayError::network("timeout").retryable);
        assert!(GatewayError::provider("500").retryable);
        assert!(!GatewayError::grant_rejected("expired").retryable);
        assert!(!GatewayError::invalid_request("bad amount").retryable);
    }

    #[test]
    fn from_status_buckets() {
        assert_eq!(
            GatewayError::from_status(401, "no").code,
            GatewayErrorCode::AuthenticationError
        );
        assert_eq!(
            GatewayError::from_status(404, "no").code,
            GatewayErrorCode::NotFound
        );
        assert_eq!(
            GatewayError::from_status(429, "slow down").code,
            GatewayErrorCode::RateLimited
        );
        assert_eq!(
            GatewayError::from_status(422, "bad").code,
            GatewayErrorCode::InvalidRequest
        );
        assert_eq!(
            GatewayError::from_status(503, "down").code,
            GatewayErrorCode::ProviderError
        );
    }

    #[test]
    fn display_includes_code_and_message() {
        let err = GatewayError::grant_rejected("refresh token expired");
        assert!(err.to_string().contains("grant_rejected"));
        assert!(err.to_string().contains("refresh token expired"));
    }

    #[test]
    fn converts_to_domain_error() {
        let err: DomainError = GatewayError::grant_rejected("expired").into();
        assert_eq!(err.code, ErrorCode::Unauthorized);

        let err: DomainError = GatewayError::provider("boom").into();
        assert_eq!(err.code, ErrorCode::ExternalServiceError);
    }
}
