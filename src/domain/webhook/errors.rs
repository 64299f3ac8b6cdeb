//! Webhook processing errors.

use thiserror::Error;

use crate::domain::foundation::DomainError;

/// Errors raised while verifying or processing a webhook delivery.
#[derive(Debug, Clone, Error)]
pub enum WebhookError {
    /// Signature did not match the shared secret.
    #[error("invalid webhook signature")]
    InvalidSignature,

    /// Event timestamp fell outside the replay-protection window.
    #[error("event timestamp outside acceptance window")]
    TimestampOutOfRange,

    /// Payload or signature header could not be parsed.
    #[error("failed to parse webhook payload: {0}")]
    ParseError(String),

    /// Event recognized but intentionally not acted on.
    ///
    /// Ignored events are acknowledged to the provider and recorded in the
    /// dedupe store so redeliveries short-circuit.
    #[error("event ignored: {0}")]
    Ignored(String),

    /// Event references a subscription or connection this service has no
    /// record of.
    #[error("no local record for event: {0}")]
    UnknownSubject(String),

    /// Storage failure while processing.
    #[error("database failure: {0}")]
    Database(String),

    /// Any other processing failure; the provider should retry.
    #[error("processing failed: {0}")]
    Processing(String),
}

impl WebhookError {
    /// True when returning a 5xx is appropriate so the provider retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WebhookError::Database(_) | WebhookError::Processing(_))
    }
}

impl From<DomainError> for WebhookError {
    fn from(err: DomainError) -> Self {
        WebhookError::Database(err.to_string())
    }
}
