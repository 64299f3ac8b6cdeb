//! WebhookEventRepository port - Processed-webhook dedupe store.
//!
//! Both providers deliver at-least-once: timeouts, 5xx responses, and
//! slow 200s all trigger redelivery. Every processed event leaves a record
//! keyed by `provider:event_id`; the record is what makes the webhook
//! handlers idempotent.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, Timestamp};

/// Record of a processed webhook event.
#[derive(Debug, Clone)]
pub struct WebhookEventRecord {
    /// Provider-scoped event id (`square:...` / `stripe:...`).
    pub dedupe_key: String,

    /// Raw provider event type (e.g. "invoice.payment_failed").
    pub event_type: String,

    /// When the event was processed.
    pub processed_at: Timestamp,

    /// Result of processing: "success", "ignored", or "failed".
    pub result: String,

    /// Reason or error message for ignored/failed results.
    pub error_message: Option<String>,

    /// Original event payload for debugging.
    pub payload: serde_json::Value,
}

impl WebhookEventRecord {
    /// Creates a new success record.
    pub fn success(
        dedupe_key: impl Into<String>,
        event_type: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            dedupe_key: dedupe_key.into(),
            event_type: event_type.into(),
            processed_at: Timestamp::now(),
            result: "success".to_string(),
            error_message: None,
            payload,
        }
    }

    /// Creates a new ignored record.
    pub fn ignored(
        dedupe_key: impl Into<String>,
        event_type: impl Into<String>,
        reason: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            dedupe_key: dedupe_key.into(),
            event_type: event_type.into(),
            processed_at: Timestamp::now(),
            result: "ignored".to_string(),
            error_message: Some(reason.into()),
            payload,
        }
    }

    /// Creates a new failure record.
    pub fn failed(
        dedupe_key: impl Into<String>,
        event_type: impl Into<String>,
        error: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            dedupe_key: dedupe_key.into(),
            event_type: event_type.into(),
            processed_at: Timestamp::now(),
            result: "failed".to_string(),
            error_message: Some(error.into()),
            payload,
        }
    }
}

/// Result of attempting to save a webhook event record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    /// Record was inserted (first time seeing this event).
    Inserted,
    /// Record already exists (duplicate event).
    AlreadyExists,
}

/// Outcome of processing one webhook delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookResult {
    /// Event was processed (or deliberately ignored) by this delivery.
    Processed,
    /// Event had already been processed by an earlier delivery.
    AlreadyProcessed,
}

/// Port for storing and retrieving processed webhook events.
///
/// Implementations must use an insert-once primary key on the dedupe key
/// so concurrent deliveries resolve to a single winner.
#[async_trait]
pub trait WebhookEventRepository: Send + Sync {
    /// Finds a previously processed event by its dedupe key.
    async fn find_by_key(&self, key: &str) -> Result<Option<WebhookEventRecord>, DomainError>;

    /// Attempts to save a record; `AlreadyExists` on a duplicate key.
    async fn save(&self, record: WebhookEventRecord) -> Result<SaveResult, DomainError>;

    /// Deletes records processed before the cutoff; returns the count.
    ///
    /// Used by the retention sweep. Deleting a record re-opens the dedupe
    /// window for that event id, so the cutoff stays far beyond any
    /// provider's redelivery horizon.
    async fn delete_before(&self, cutoff: Timestamp) -> Result<u64, DomainError>;
}

#[async_trait]
impl<T: WebhookEventRepository + ?Sized> WebhookEventRepository for std::sync::Arc<T> {
    async fn find_by_key(&self, key: &str) -> Result<Option<WebhookEventRecord>, DomainError> {
        (**self).find_by_key(key).await
    }

    async fn save(&self, record: WebhookEventRecord) -> Result<SaveResult, DomainError> {
        (**self).save(record).await
    }

    async fn delete_before(&self, cutoff: Timestamp) -> Result<u64, DomainError> {
        (**self).delete_before(cutoff).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_constructors_set_result() {
        let ok = WebhookEventRecord::success("stripe:evt_1", "invoice.paid", serde_json::json!({}));
        assert_eq!(ok.result, "success");
        assert!(ok.error_message.is_none());

        let ignored = WebhookEventRecord::ignored(
            "stripe:evt_2",
            "customer.created",
            "no handler",
            serde_json::json!({}),
        );
        assert_eq!(ignored.result, "ignored");
        assert_eq!(ignored.error_message.as_deref(), Some("no handler"));

        let failed = WebhookEventRecord::failed(
            "square:evt_3",
            "subscription.updated",
            "no local record",
            serde_json::json!({}),
        );
        assert_eq!(failed.result, "failed");
    }
}
