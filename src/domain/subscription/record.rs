//! Subscription aggregate.
//!
//! One billing subscription per organization. The record stores which
//! provider bills it, the provider-side identifiers needed to correlate
//! webhooks, and the local status derived through reconciliation.

use serde::{Deserialize, Serialize};

use super::plan::BillingPlan;
use super::reconcile::{reconcile, RemoteSnapshot};
use super::status::SubscriptionStatus;
use crate::domain::foundation::{
    OrganizationId, StateMachine, SubscriptionId, Timestamp, ValidationError,
};

/// Payment platform billing a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingProvider {
    Square,
    Stripe,
}

impl BillingProvider {
    /// Stable string form used in database rows and dedupe keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingProvider::Square => "square",
            BillingProvider::Stripe => "stripe",
        }
    }

    /// Parses the stable string form.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "square" => Ok(BillingProvider::Square),
            "stripe" => Ok(BillingProvider::Stripe),
            other => Err(ValidationError::invalid_format(
                "provider",
                format!("unknown provider '{}'", other),
            )),
        }
    }
}

impl std::fmt::Display for BillingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An organization's platform billing subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub organization_id: OrganizationId,
    pub provider: BillingProvider,
    /// Provider subscription id; absent until checkout completes.
    pub provider_subscription_id: Option<String>,
    /// Provider customer id; absent until checkout completes.
    pub provider_customer_id: Option<String>,
    pub plan: BillingPlan,
    pub status: SubscriptionStatus,
    pub current_period_end: Option<Timestamp>,
    pub promo_code: Option<String>,
    pub canceled_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Subscription {
    /// Creates a pending subscription when checkout starts.
    pub fn start_checkout(
        organization_id: OrganizationId,
        provider: BillingProvider,
        plan: BillingPlan,
        promo_code: Option<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            id: SubscriptionId::new(),
            organization_id,
            provider,
            provider_subscription_id: None,
            provider_customer_id: None,
            plan,
            status: SubscriptionStatus::Pending,
            current_period_end: None,
            promo_code,
            canceled_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Activates the subscription once checkout completes.
    ///
    /// Attaches the provider identifiers reported by the checkout event
    /// so later webhooks can be correlated.
    pub fn activate(
        &mut self,
        provider_subscription_id: String,
        provider_customer_id: String,
        period_end: Timestamp,
        now: Timestamp,
    ) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(SubscriptionStatus::Active)?;
        self.provider_subscription_id = Some(provider_subscription_id);
        self.provider_customer_id = Some(provider_customer_id);
        self.current_period_end = Some(period_end);
        self.canceled_at = None;
        self.updated_at = now;
        Ok(())
    }

    /// Extends the paid period after a successful invoice.
    ///
    /// Also recovers a past-due subscription back to active.
    pub fn renew(&mut self, period_end: Timestamp, now: Timestamp) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(SubscriptionStatus::Active)?;
        self.current_period_end = Some(period_end);
        self.updated_at = now;
        Ok(())
    }

    /// Marks the subscription past due after a failed invoice.
    pub fn mark_past_due(&mut self, now: Timestamp) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(SubscriptionStatus::PastDue)?;
        self.updated_at = now;
        Ok(())
    }

    /// Records an operator-requested cancellation at period end.
    pub fn request_cancellation(&mut self, now: Timestamp) -> Result<(), ValidationError> {
        self.status = self
            .status
            .transition_to(SubscriptionStatus::PendingCancellation)?;
        self.canceled_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Applies a reconciled provider snapshot.
    ///
    /// Returns the previous status when the snapshot changed the record,
    /// `None` when it confirmed what was already stored. Period end and
    /// cancel timestamps are refreshed either way.
    pub fn apply_snapshot(
        &mut self,
        remote: &RemoteSnapshot,
        now: Timestamp,
    ) -> Result<Option<SubscriptionStatus>, ValidationError> {
        if let Some(period_end) = remote.current_period_end {
            self.current_period_end = Some(period_end);
        }
        if remote.cancel_at.is_some() {
            self.canceled_at = remote.cancel_at;
        }

        let target = reconcile(remote);
        if target == self.status {
            self.updated_at = now;
            return Ok(None);
        }

        let previous = self.status;
        self.status = self.status.transition_to(target)?;
        if self.status == SubscriptionStatus::Active {
            self.canceled_at = None;
        }
        self.updated_at = now;
        Ok(Some(previous))
    }

    /// True if the subscription currently grants access.
    pub fn has_access(&self) -> bool {
        self.status.has_access()
    }
}
