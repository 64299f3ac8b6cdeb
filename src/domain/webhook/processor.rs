//! Idempotent webhook processing.
//!
//! Coordinates between the dedupe store and the event handlers so each
//! provider event changes local state at most once.
//!
//! ## Race Condition Handling
//!
//! When the same event is delivered concurrently:
//! - First to save its record wins (primary key on the dedupe key)
//! - Others get `AlreadyExists` from the store and report `AlreadyProcessed`

use async_trait::async_trait;

use super::errors::WebhookError;
use super::event::{EventKind, ProviderEvent};
use crate::ports::{SaveResult, WebhookEventRecord, WebhookEventRepository, WebhookResult};

/// Handler for a set of webhook event kinds.
///
/// Implementations should be stateless with respect to the event stream:
/// the processor, not the handler, owns idempotency.
#[async_trait]
pub trait WebhookEventHandler: Send + Sync {
    /// Event kinds this handler processes.
    fn handles(&self) -> Vec<EventKind>;

    /// Handles one event.
    ///
    /// Returns `Err(WebhookError::Ignored(_))` when the event should be
    /// acknowledged without action; other errors mean processing failed.
    async fn handle(&self, event: &ProviderEvent) -> Result<(), WebhookError>;
}

/// Routes events to a handler by kind.
#[async_trait]
pub trait WebhookDispatcher: Send + Sync {
    /// Finds a handler for the given kind, if one is registered.
    fn get_handler(&self, kind: &EventKind) -> Option<&dyn WebhookEventHandler>;

    /// Dispatches an event to its handler.
    ///
    /// Unhandled kinds come back as `Ignored` so they are acknowledged and
    /// recorded rather than retried forever.
    async fn dispatch(&self, event: &ProviderEvent) -> Result<(), WebhookError> {
        match self.get_handler(&event.kind) {
            Some(handler) => handler.handle(event).await,
            None => Err(WebhookError::Ignored(format!(
                "no handler for event kind {:?}",
                event.kind
            ))),
        }
    }
}

/// Processes webhook events exactly once.
pub struct IdempotentWebhookProcessor<R: WebhookEventRepository, D: WebhookDispatcher> {
    repository: R,
    dispatcher: D,
}

impl<R: WebhookEventRepository, D: WebhookDispatcher> IdempotentWebhookProcessor<R, D> {
    pub fn new(repository: R, dispatcher: D) -> Self {
        Self {
            repository,
            dispatcher,
        }
    }

    /// Processes one event.
    ///
    /// # Returns
    ///
    /// - `Ok(WebhookResult::Processed)` - handled (or deliberately ignored)
    /// - `Ok(WebhookResult::AlreadyProcessed)` - duplicate delivery
    /// - `Err(_)` - processing failed; no dedupe record blocks the retry
    pub async fn process(&self, event: ProviderEvent) -> Result<WebhookResult, WebhookError> {
        let dedupe_key = event.dedupe_key();

        // 1. Short-circuit known events
        if self.repository.find_by_key(&dedupe_key).await?.is_some() {
            tracing::debug!(key = %dedupe_key, "duplicate webhook delivery skipped");
            return Ok(WebhookResult::AlreadyProcessed);
        }

        // 2. Dispatch
        let outcome = self.dispatcher.dispatch(&event).await;

        // 3. Build the record for the outcome
        let record = match &outcome {
            Ok(()) => WebhookEventRecord::success(&dedupe_key, &event.event_type, event.payload.clone()),
            Err(WebhookError::Ignored(reason)) => WebhookEventRecord::ignored(
                &dedupe_key,
                &event.event_type,
                reason,
                event.payload.clone(),
            ),
            Err(err) if err.is_retryable() => {
                // No record: the provider must retry and a future delivery
                // should run the handler again.
                return Err(err.clone());
            }
            Err(err) => WebhookEventRecord::failed(
                &dedupe_key,
                &event.event_type,
                err.to_string(),
                event.payload.clone(),
            ),
        };

        // 4. Save; the store resolves concurrent duplicates
        match self.repository.save(record).await? {
            SaveResult::Inserted => match outcome {
                Ok(()) | Err(WebhookError::Ignored(_)) => Ok(WebhookResult::Processed),
                Err(err) => Err(err),
            },
            SaveResult::AlreadyExists => {
                tracing::debug!(key = %dedupe_key, "lost webhook processing race");
                Ok(WebhookResult::AlreadyProcessed)
            }
        }
    }
}
