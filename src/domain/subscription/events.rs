//! Subscription event log entries.
//!
//! Every status change appends a row describing what moved the record and
//! which provider event (if any) drove it. The log is append-only and
//! best-effort: processing continues when an append fails.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::status::SubscriptionStatus;
use crate::domain::foundation::{SubscriptionId, Timestamp};

/// One entry in the subscription event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionEvent {
    pub id: Uuid,
    pub subscription_id: SubscriptionId,
    /// Provider event id when a webhook drove the change.
    pub provider_event_id: Option<String>,
    /// What happened, e.g. "checkout_completed", "status_reconciled".
    pub kind: String,
    pub old_status: Option<SubscriptionStatus>,
    pub new_status: SubscriptionStatus,
    pub recorded_at: Timestamp,
}

impl SubscriptionEvent {
    /// Records a status change.
    pub fn status_change(
        subscription_id: SubscriptionId,
        kind: impl Into<String>,
        provider_event_id: Option<String>,
        old_status: Option<SubscriptionStatus>,
        new_status: SubscriptionStatus,
        now: Timestamp,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            subscription_id,
            provider_event_id,
            kind: kind.into(),
            old_status,
            new_status,
            recorded_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_change_captures_both_sides() {
        let event = SubscriptionEvent::status_change(
            SubscriptionId::new(),
            "status_reconciled",
            Some("evt_42".to_string()),
            Some(SubscriptionStatus::Active),
            SubscriptionStatus::PendingCancellation,
            Timestamp::now(),
        );

        assert_eq!(event.kind, "status_reconciled");
        assert_eq!(event.old_status, Some(SubscriptionStatus::Active));
        assert_eq!(event.new_status, SubscriptionStatus::PendingCancellation);
        assert_eq!(event.provider_event_id.as_deref(), Some("evt_42"));
    }

    #[test]
    fn initial_events_have_no_old_status() {
        let event = SubscriptionEvent::status_change(
            SubscriptionId::new(),
            "checkout_started",
            None,
            None,
            SubscriptionStatus::Pending,
            Timestamp::now(),
        );
        assert!(event.old_status.is_none());
    }
}
