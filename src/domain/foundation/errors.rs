//! Error types for the domain layer.

use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Errors that occur during value object construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' must be between {min} and {max}, got {actual}")]
    OutOfRange {
        field: String,
        min: i64,
        max: i64,
        actual: i64,
    },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField {
            field: field.into(),
        }
    }

    /// Creates an out of range validation error.
    pub fn out_of_range(field: impl Into<String>, min: i64, max: i64, actual: i64) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            min,
            max,
            actual,
        }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Error codes organized by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Validation errors
    ValidationFailed,
    InvalidFormat,

    // Not found errors
    ConnectionNotFound,
    SubscriptionNotFound,
    DeviceNotFound,
    PromoCodeNotFound,
    OAuthStateNotFound,

    // State errors
    InvalidStateTransition,
    ConnectionRevoked,
    ConnectionExpired,
    OAuthStateConsumed,
    OAuthStateExpired,
    DeviceRevoked,
    SubscriptionExists,
    PromoCodeExhausted,
    PromoCodeExpired,

    // Authorization errors
    Unauthorized,
    Forbidden,

    // External collaborator errors
    ExternalServiceError,
    InvalidWebhookSignature,

    // Infrastructure errors
    DatabaseError,
    InternalError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::InvalidFormat => "INVALID_FORMAT",
            ErrorCode::ConnectionNotFound => "CONNECTION_NOT_FOUND",
            ErrorCode::SubscriptionNotFound => "SUBSCRIPTION_NOT_FOUND",
            ErrorCode::DeviceNotFound => "DEVICE_NOT_FOUND",
            ErrorCode::PromoCodeNotFound => "PROMO_CODE_NOT_FOUND",
            ErrorCode::OAuthStateNotFound => "OAUTH_STATE_NOT_FOUND",
            ErrorCode::InvalidStateTransition => "INVALID_STATE_TRANSITION",
            ErrorCode::ConnectionRevoked => "CONNECTION_REVOKED",
            ErrorCode::ConnectionExpired => "CONNECTION_EXPIRED",
            ErrorCode::OAuthStateConsumed => "OAUTH_STATE_CONSUMED",
            ErrorCode::OAuthStateExpired => "OAUTH_STATE_EXPIRED",
            ErrorCode::DeviceRevoked => "DEVICE_REVOKED",
            ErrorCode::SubscriptionExists => "SUBSCRIPTION_EXISTS",
            ErrorCode::PromoCodeExhausted => "PROMO_CODE_EXHAUSTED",
            ErrorCode::PromoCodeExpired => "PROMO_CODE_EXPIRED",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::ExternalServiceError => "EXTERNAL_SERVICE_ERROR",
            ErrorCode::InvalidWebhookSignature => "INVALID_WEBHOOK_SIGNATURE",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", s)
    }
}

/// Standard domain error with code, message, and optional details.
#[derive(Debug, Clone)]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    pub details: HashMap<String, String>,
}

impl DomainError {
    /// Creates a new domain error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: HashMap::new(),
        }
    }

    /// Creates a validation error for a specific field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::ValidationFailed,
            message: message.into(),
            details: HashMap::new(),
        }
        .with_detail("field", field.into())
    }

    /// Creates a not-found error with the given code.
    pub fn not_found(code: ErrorCode, what: impl fmt::Display) -> Self {
        Self::new(code, format!("{} not found", what))
    }

    /// Creates a database error wrapping an underlying failure.
    pub fn database(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::DatabaseError, err.to_string())
    }

    /// Adds a detail to the error.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for DomainError {}

impl From<ValidationError> for DomainError {
    fn from(err: ValidationError) -> Self {
        let code = match &err {
            ValidationError::InvalidFormat { .. } => ErrorCode::InvalidFormat,
            _ => ErrorCode::ValidationFailed,
        };
        DomainError::new(code, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_messages_name_the_field() {
        let err = ValidationError::empty_field("state_token");
        assert!(err.to_string().contains("state_token"));

        let err = ValidationError::out_of_range("percent_off", 1, 100, 250);
        assert!(err.to_string().contains("250"));
    }

    #[test]
    fn domain_error_display_includes_code() {
        let err = DomainError::new(ErrorCode::ConnectionNotFound, "no connection for org");
        assert_eq!(err.to_string(), "[CONNECTION_NOT_FOUND] no connection for org");
    }

    #[test]
    fn with_detail_accumulates() {
        let err = DomainError::validation("plan", "unknown plan")
            .with_detail("value", "weekly");
        assert_eq!(err.details.get("field").map(String::as_str), Some("plan"));
        assert_eq!(err.details.get("value").map(String::as_str), Some("weekly"));
    }

    #[test]
    fn validation_error_converts_with_matching_code() {
        let err: DomainError = ValidationError::invalid_format("code", "bad chars").into();
        assert_eq!(err.code, ErrorCode::InvalidFormat);

        let err: DomainError = ValidationError::empty_field("code").into();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }
}
