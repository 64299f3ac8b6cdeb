//! SubscriptionEventLog port - Append-only billing audit log.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, SubscriptionId};
use crate::domain::subscription::SubscriptionEvent;

/// Port for the subscription event log.
///
/// Appends are best-effort: callers log and continue when an append fails,
/// because the dedupe record (not the log) carries correctness.
#[async_trait]
pub trait SubscriptionEventLog: Send + Sync {
    /// Appends one entry.
    async fn append(&self, event: &SubscriptionEvent) -> Result<(), DomainError>;

    /// Lists entries for a subscription, newest first.
    async fn list_for_subscription(
        &self,
        subscription_id: &SubscriptionId,
        limit: i64,
    ) -> Result<Vec<SubscriptionEvent>, DomainError>;
}
