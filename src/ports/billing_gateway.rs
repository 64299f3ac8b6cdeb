//! Billing gateway port - Stripe platform billing operations.
//!
//! The service bills organizations for the kiosk platform itself through
//! Stripe's hosted surfaces: Checkout for signup, the billing portal for
//! self-service, and subscription mutation for cancellation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::gateway::GatewayError;
use crate::domain::foundation::{OrganizationId, Timestamp};
use crate::domain::subscription::{BillingPlan, RemoteSnapshot};

/// Port for the Stripe billing API.
#[async_trait]
pub trait BillingGateway: Send + Sync {
    /// Creates a hosted checkout session for a plan.
    ///
    /// The organization id travels as the session's client reference so
    /// the completion webhook can be correlated.
    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, GatewayError>;

    /// Creates a billing portal session for an existing customer.
    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<PortalSession, GatewayError>;

    /// Requests cancellation at period end; returns the updated snapshot.
    async fn cancel_at_period_end(
        &self,
        subscription_id: &str,
    ) -> Result<RemoteSnapshot, GatewayError>;

    /// Fetches the provider's current view of a subscription.
    async fn fetch_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<RemoteSnapshot>, GatewayError>;
}

/// Request to create a checkout session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCheckoutRequest {
    pub organization_id: OrganizationId,
    pub plan: BillingPlan,
    /// Already-normalized promo code, validated upstream.
    pub promo_code: Option<String>,
    /// URL to land on after successful checkout.
    pub success_url: String,
    /// URL to land on after abandoning checkout.
    pub cancel_url: String,
}

/// Hosted checkout session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
    pub expires_at: Timestamp,
}

/// Hosted billing portal session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalSession {
    pub id: String,
    pub url: String,
}
