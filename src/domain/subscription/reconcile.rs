//! Provider-to-local status reconciliation.
//!
//! Square and Stripe describe subscriptions with different vocabularies and
//! different cancellation signals. Both are normalized into a
//! [`RemoteSnapshot`] by the gateway adapters, and a single [`reconcile`]
//! function maps the snapshot onto the local [`SubscriptionStatus`].
//!
//! The subtle case is pending cancellation: neither provider has a status
//! for it. An organization that cancels keeps an *active* remote
//! subscription until the period ends; the only signal is a cancel
//! timestamp (Square `canceled_date`, Stripe `canceled_at`) or Stripe's
//! `cancel_at_period_end` flag set on an otherwise-active object.

use serde::{Deserialize, Serialize};

use super::status::SubscriptionStatus;
use crate::domain::foundation::Timestamp;

/// Provider-neutral subscription status.
///
/// Square: `PENDING`, `ACTIVE`, `CANCELED`, `DEACTIVATED`, `PAUSED`.
/// Stripe: `incomplete`, `incomplete_expired`, `trialing`, `active`,
/// `past_due`, `unpaid`, `canceled`, `paused`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteStatus {
    /// Square `PENDING`, Stripe `incomplete`.
    Incomplete,
    /// Stripe `trialing`. Treated as paid for access purposes.
    Trialing,
    /// Square `ACTIVE`, Stripe `active`.
    Active,
    /// Stripe `past_due`.
    PastDue,
    /// Stripe `unpaid` (retries exhausted, invoice left open).
    Unpaid,
    /// Square `PAUSED`, Stripe `paused`.
    Paused,
    /// Square `CANCELED`, Stripe `canceled`.
    Canceled,
    /// Square `DEACTIVATED`, Stripe `incomplete_expired`.
    Deactivated,
    /// Anything the adapter did not recognize.
    Unknown,
}

/// A provider's view of one subscription at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSnapshot {
    /// Normalized provider status.
    pub status: RemoteStatus,

    /// Cancel timestamp, when the provider reports one. Present on an
    /// otherwise-active object this means cancellation at period end.
    pub cancel_at: Option<Timestamp>,

    /// Stripe's explicit cancel-at-period-end flag. Always false for Square.
    pub cancel_at_period_end: bool,

    /// End of the current paid period, when reported.
    pub current_period_end: Option<Timestamp>,
}

impl RemoteSnapshot {
    /// Snapshot with just a status, no cancellation signals.
    pub fn of(status: RemoteStatus) -> Self {
        Self {
            status,
            cancel_at: None,
            cancel_at_period_end: false,
            current_period_end: None,
        }
    }

    fn cancellation_requested(&self) -> bool {
        self.cancel_at_period_end || self.cancel_at.is_some()
    }
}

/// Maps a provider snapshot to the local status.
///
/// Unknown remote statuses map to the local `Pending` bucket rather than
/// guessing at access; the webhook log keeps the raw payload for follow-up.
pub fn reconcile(remote: &RemoteSnapshot) -> SubscriptionStatus {
    match remote.status {
        RemoteStatus::Active | RemoteStatus::Trialing => {
            if remote.cancellation_requested() {
                SubscriptionStatus::PendingCancellation
            } else {
                SubscriptionStatus::Active
            }
        }
        RemoteStatus::PastDue | RemoteStatus::Unpaid => SubscriptionStatus::PastDue,
        RemoteStatus::Paused => SubscriptionStatus::Paused,
        RemoteStatus::Incomplete | RemoteStatus::Unknown => SubscriptionStatus::Pending,
        RemoteStatus::Canceled | RemoteStatus::Deactivated => SubscriptionStatus::Canceled,
    }
}
