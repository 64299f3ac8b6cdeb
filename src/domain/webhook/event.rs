//! Provider-neutral webhook events.
//!
//! The Square and Stripe adapters parse their own wire formats and emit
//! this shared shape. Only the fields the handlers act on are carried;
//! the raw payload rides along for the dedupe record.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;
use crate::domain::subscription::{BillingProvider, RemoteSnapshot};

/// Normalized webhook event kinds this service acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Hosted checkout completed (Stripe `checkout.session.completed`).
    CheckoutCompleted,
    /// Subscription object created.
    SubscriptionCreated,
    /// Subscription object changed (status, cancel timestamp, period).
    SubscriptionUpdated,
    /// Subscription ended at the provider.
    SubscriptionCanceled,
    /// Recurring invoice paid.
    InvoicePaid,
    /// Recurring invoice payment failed.
    InvoicePaymentFailed,
    /// Recognized provider event with no local action.
    Unknown,
}

/// A verified, normalized webhook delivery.
#[derive(Debug, Clone)]
pub struct ProviderEvent {
    pub provider: BillingProvider,
    /// Provider event id; the dedupe key together with `provider`.
    pub event_id: String,
    /// Raw provider event type string, kept for the audit record.
    pub event_type: String,
    pub kind: EventKind,
    /// Organization reference carried through checkout metadata.
    pub organization_ref: Option<String>,
    pub provider_customer_id: Option<String>,
    pub provider_subscription_id: Option<String>,
    /// Subscription snapshot, when the event carries one.
    pub snapshot: Option<RemoteSnapshot>,
    pub created_at: Timestamp,
    /// Raw payload stored with the dedupe record.
    pub payload: serde_json::Value,
}

impl ProviderEvent {
    /// Dedupe key: provider-scoped event id.
    ///
    /// Square and Stripe draw ids from unrelated namespaces; scoping by
    /// provider keeps an id collision from suppressing a real event.
    pub fn dedupe_key(&self) -> String {
        format!("{}:{}", self.provider.as_str(), self.event_id)
    }
}
