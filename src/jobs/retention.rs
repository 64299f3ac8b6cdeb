//! Scheduled row retention sweep.
//!
//! Clears consumed/expired OAuth states and webhook dedupe records past
//! their retention horizon. The webhook horizon stays far beyond any
//! provider's redelivery window; deleting a record re-opens dedupe for
//! that event id.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::ports::{OAuthStateRepository, WebhookEventRepository};

/// Days webhook dedupe records are kept.
pub const WEBHOOK_RETENTION_DAYS: i64 = 30;

/// Outcome counters for one sweep.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RetentionStats {
    pub oauth_states_deleted: u64,
    pub webhook_events_deleted: u64,
}

/// Runs one retention sweep.
pub async fn sweep(
    oauth_states: Arc<dyn OAuthStateRepository>,
    webhook_events: Arc<dyn WebhookEventRepository>,
) -> Result<RetentionStats, DomainError> {
    let now = Timestamp::now();

    let stats = RetentionStats {
        oauth_states_deleted: oauth_states.delete_stale(now).await?,
        webhook_events_deleted: webhook_events
            .delete_before(now.add_days(-WEBHOOK_RETENTION_DAYS))
            .await?,
    };

    tracing::info!(?stats, "Retention sweep completed");
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryOAuthStateRepository, InMemoryWebhookEventRepository};
    use crate::domain::connection::OAuthState;
    use crate::domain::foundation::OrganizationId;
    use crate::ports::WebhookEventRecord;

    #[tokio::test]
    async fn sweep_removes_stale_rows_only() {
        let oauth_states = InMemoryOAuthStateRepository::new();
        let now = Timestamp::now();

        // Fresh, consumed, and expired states
        let fresh = OAuthState::issue(OrganizationId::new(), now);
        let mut consumed = OAuthState::issue(OrganizationId::new(), now);
        consumed.consume(now).unwrap();
        let mut expired = OAuthState::issue(OrganizationId::new(), now);
        expired.expires_at = now.add_minutes(-1);
        for state in [&fresh, &consumed, &expired] {
            oauth_states.save(state).await.unwrap();
        }

        let webhook_events = InMemoryWebhookEventRepository::new();
        let mut old = WebhookEventRecord::success("stripe:evt_old", "invoice.paid", serde_json::json!({}));
        old.processed_at = now.add_days(-40);
        webhook_events.save(old).await.unwrap();
        webhook_events
            .save(WebhookEventRecord::success(
                "stripe:evt_new",
                "invoice.paid",
                serde_json::json!({}),
            ))
            .await
            .unwrap();

        let stats = sweep(oauth_states.clone(), webhook_events.clone())
            .await
            .unwrap();

        assert_eq!(stats.oauth_states_deleted, 2);
        assert_eq!(stats.webhook_events_deleted, 1);
        assert_eq!(oauth_states.states.lock().unwrap().len(), 1);
        assert!(webhook_events.record("stripe:evt_new").is_some());
        assert!(webhook_events.record("stripe:evt_old").is_none());
    }
}
