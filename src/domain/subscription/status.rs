//! Subscription status state machine.
//!
//! Defines all possible local subscription states and valid transitions
//! across the billing lifecycle.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Local subscription status.
///
/// The local record never invents state: every transition is driven by a
/// provider snapshot (webhook or fetch) or by an operator action that the
/// provider has already acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Checkout started, first payment not yet confirmed. No access.
    Pending,

    /// Paid and current. Full access.
    Active,

    /// Payment failed, provider is retrying. Access continues in grace.
    PastDue,

    /// Cancellation requested; the remote object is still active with a
    /// cancel timestamp set. Access continues until the period ends.
    PendingCancellation,

    /// Paused at the provider. No access until resumed.
    Paused,

    /// Subscription ended. Resubscribing starts a new pending record.
    Canceled,
}

impl SubscriptionStatus {
    /// Returns true if this status grants the kiosk app access.
    ///
    /// Access is granted for:
    /// - Active: paid and current
    /// - PastDue: grace period during payment retry
    /// - PendingCancellation: until the paid period ends
    pub fn has_access(&self) -> bool {
        matches!(
            self,
            SubscriptionStatus::Active
                | SubscriptionStatus::PastDue
                | SubscriptionStatus::PendingCancellation
        )
    }

    /// Stable string form used in database rows and API payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Pending => "pending",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::PendingCancellation => "pending_cancellation",
            SubscriptionStatus::Paused => "paused",
            SubscriptionStatus::Canceled => "canceled",
        }
    }
}

impl StateMachine for SubscriptionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SubscriptionStatus::*;
        matches!(
            (self, target),
            // From PENDING
            (Pending, Active)
                | (Pending, Canceled)
            // From ACTIVE
                | (Active, Active) // Renewal
                | (Active, PastDue)
                | (Active, PendingCancellation)
                | (Active, Paused)
                | (Active, Canceled)
            // From PAST_DUE
                | (PastDue, Active)
                | (PastDue, PendingCancellation)
                | (PastDue, Canceled)
            // From PENDING_CANCELLATION
                | (PendingCancellation, Active) // Reactivation
                | (PendingCancellation, Canceled)
            // From PAUSED
                | (Paused, Active)
                | (Paused, Canceled)
            // From CANCELED
                | (Canceled, Pending) // Resubscribe creates new cycle
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SubscriptionStatus::*;
        match self {
            Pending => vec![Active, Canceled],
            Active => vec![Active, PastDue, PendingCancellation, Paused, Canceled],
            PastDue => vec![Active, PendingCancellation, Canceled],
            PendingCancellation => vec![Active, Canceled],
            Paused => vec![Active, Canceled],
            Canceled => vec![Pending],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [SubscriptionStatus; 6] = [
        SubscriptionStatus::Pending,
        SubscriptionStatus::Active,
        SubscriptionStatus::PastDue,
        SubscriptionStatus::PendingCancellation,
        SubscriptionStatus::Paused,
        SubscriptionStatus::Canceled,
    ];

    #[test]
    fn pending_activates_on_first_payment() {
        let result = SubscriptionStatus::Pending.transition_to(SubscriptionStatus::Active);
        assert_eq!(result, Ok(SubscriptionStatus::Active));
    }

    #[test]
    fn pending_cannot_go_past_due() {
        assert!(!SubscriptionStatus::Pending.can_transition_to(&SubscriptionStatus::PastDue));
    }

    #[test]
    fn active_can_renew_to_active() {
        assert!(SubscriptionStatus::Active.can_transition_to(&SubscriptionStatus::Active));
    }

    #[test]
    fn active_enters_pending_cancellation() {
        let result =
            SubscriptionStatus::Active.transition_to(SubscriptionStatus::PendingCancellation);
        assert_eq!(result, Ok(SubscriptionStatus::PendingCancellation));
    }

    #[test]
    fn pending_cancellation_can_reactivate() {
        assert!(
            SubscriptionStatus::PendingCancellation.can_transition_to(&SubscriptionStatus::Active)
        );
    }

    #[test]
    fn past_due_recovers_or_cancels() {
        assert!(SubscriptionStatus::PastDue.can_transition_to(&SubscriptionStatus::Active));
        assert!(SubscriptionStatus::PastDue.can_transition_to(&SubscriptionStatus::Canceled));
        assert!(!SubscriptionStatus::PastDue.can_transition_to(&SubscriptionStatus::Paused));
    }

    #[test]
    fn canceled_only_restarts_through_pending() {
        assert_eq!(
            SubscriptionStatus::Canceled.valid_transitions(),
            vec![SubscriptionStatus::Pending]
        );
        assert!(!SubscriptionStatus::Canceled.can_transition_to(&SubscriptionStatus::Active));
    }

    #[test]
    fn no_status_is_terminal() {
        for status in ALL {
            assert!(!status.is_terminal(), "{:?} should allow a way out", status);
        }
    }

    #[test]
    fn access_matches_lifecycle() {
        assert!(SubscriptionStatus::Active.has_access());
        assert!(SubscriptionStatus::PastDue.has_access());
        assert!(SubscriptionStatus::PendingCancellation.has_access());

        assert!(!SubscriptionStatus::Pending.has_access());
        assert!(!SubscriptionStatus::Paused.has_access());
        assert!(!SubscriptionStatus::Canceled.has_access());
    }

    #[test]
    fn valid_transitions_are_consistent_with_can_transition_to() {
        for status in ALL {
            for target in status.valid_transitions() {
                assert!(
                    status.can_transition_to(&target),
                    "can_transition_to should return true for {:?} -> {:?}",
                    status,
                    target
                );
            }
        }
    }

    #[test]
    fn as_str_matches_serde_rename() {
        for status in ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }
}
