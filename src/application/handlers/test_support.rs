//! Shared fixtures for handler tests.
//!
//! The port implementations live in the adapters: in-memory repositories
//! under `adapters::memory`, mock gateways next to the real Square and
//! Stripe clients.

use crate::domain::connection::{MerchantConnection, TokenGrant};
use crate::domain::foundation::{OrganizationId, Timestamp};
use crate::domain::subscription::{BillingPlan, BillingProvider, PromoCode, Subscription};

pub(crate) use crate::adapters::memory::{
    InMemoryConnectionRepository, InMemoryDeviceRepository, InMemoryOAuthStateRepository,
    InMemoryPromoCodeRepository, InMemorySubscriptionEventLog, InMemorySubscriptionRepository,
};
pub(crate) use crate::adapters::square::MockMerchantGateway;
pub(crate) use crate::adapters::stripe::MockBillingGateway;

pub fn token_grant() -> TokenGrant {
    crate::adapters::square::mock_token_grant()
}

/// A freshly established connection for an organization.
pub fn connected(organization_id: OrganizationId) -> MerchantConnection {
    MerchantConnection::establish(organization_id, token_grant(), Timestamp::now())
}

/// A pending (pre-checkout) Stripe subscription.
pub fn pending_subscription(organization_id: OrganizationId) -> Subscription {
    Subscription::start_checkout(
        organization_id,
        BillingProvider::Stripe,
        BillingPlan::Monthly,
        None,
        Timestamp::now(),
    )
}

/// An activated Stripe subscription with provider ids attached.
pub fn active_subscription(organization_id: OrganizationId) -> Subscription {
    let mut sub = pending_subscription(organization_id);
    sub.activate(
        "sub_123".to_string(),
        "cus_123".to_string(),
        Timestamp::now().add_days(30),
        Timestamp::now(),
    )
    .unwrap();
    sub
}

/// A redeemable 20%-off promo code.
pub fn promo(code: &str) -> PromoCode {
    PromoCode {
        code: code.to_string(),
        percent_off: Some(20),
        trial_days: None,
        max_redemptions: Some(10),
        redemption_count: 0,
        expires_at: None,
        created_at: Timestamp::now(),
    }
}
