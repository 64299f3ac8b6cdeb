//! Request/response DTOs for the billing endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;
use crate::domain::subscription::{BillingPlan, PromoCode, Subscription};
use crate::ports::{CheckoutSession, PortalSession};

/// Subscription state as exposed to the kiosk app.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionResponse {
    pub provider: String,
    pub plan: String,
    pub status: String,
    pub has_access: bool,
    pub current_period_end: Option<Timestamp>,
    pub canceled_at: Option<Timestamp>,
    pub promo_code: Option<String>,
}

impl From<&Subscription> for SubscriptionResponse {
    fn from(subscription: &Subscription) -> Self {
        Self {
            provider: subscription.provider.as_str().to_string(),
            plan: subscription.plan.as_str().to_string(),
            status: subscription.status.as_str().to_string(),
            has_access: subscription.has_access(),
            current_period_end: subscription.current_period_end,
            canceled_at: subscription.canceled_at,
            promo_code: subscription.promo_code.clone(),
        }
    }
}

/// Request body for starting checkout.
#[derive(Debug, Deserialize)]
pub struct CheckoutBody {
    pub plan: String,
    pub promo_code: Option<String>,
}

impl CheckoutBody {
    pub fn parse_plan(&self) -> Result<BillingPlan, crate::domain::foundation::ValidationError> {
        BillingPlan::parse(&self.plan)
    }
}

/// Response carrying the hosted checkout URL.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub session_id: String,
    pub url: String,
    pub expires_at: Timestamp,
}

impl From<CheckoutSession> for CheckoutResponse {
    fn from(session: CheckoutSession) -> Self {
        Self {
            session_id: session.id,
            url: session.url,
            expires_at: session.expires_at,
        }
    }
}

/// Response carrying the hosted portal URL.
#[derive(Debug, Serialize)]
pub struct PortalResponse {
    pub url: String,
}

impl From<PortalSession> for PortalResponse {
    fn from(session: PortalSession) -> Self {
        Self { url: session.url }
    }
}

/// One billing history entry.
#[derive(Debug, Serialize)]
pub struct SubscriptionEventDto {
    pub kind: String,
    pub old_status: Option<String>,
    pub new_status: String,
    pub provider_event_id: Option<String>,
    pub recorded_at: Timestamp,
}

impl From<crate::domain::subscription::SubscriptionEvent> for SubscriptionEventDto {
    fn from(event: crate::domain::subscription::SubscriptionEvent) -> Self {
        Self {
            kind: event.kind,
            old_status: event.old_status.map(|s| s.as_str().to_string()),
            new_status: event.new_status.as_str().to_string(),
            provider_event_id: event.provider_event_id,
            recorded_at: event.recorded_at,
        }
    }
}

/// Billing history envelope.
#[derive(Debug, Serialize)]
pub struct SubscriptionEventsResponse {
    pub events: Vec<SubscriptionEventDto>,
}

/// Request body for promo validation.
#[derive(Debug, Deserialize)]
pub struct PromoBody {
    pub code: String,
}

/// Promo terms returned on successful validation.
#[derive(Debug, Serialize)]
pub struct PromoResponse {
    pub code: String,
    pub percent_off: Option<u8>,
    pub trial_days: Option<u16>,
    pub expires_at: Option<Timestamp>,
}

impl From<PromoCode> for PromoResponse {
    fn from(promo: PromoCode) -> Self {
        Self {
            code: promo.code,
            percent_off: promo.percent_off,
            trial_days: promo.trial_days,
            expires_at: promo.expires_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::OrganizationId;
    use crate::domain::subscription::BillingProvider;

    #[test]
    fn subscription_response_carries_access_flag() {
        let mut subscription = Subscription::start_checkout(
            OrganizationId::new(),
            BillingProvider::Stripe,
            BillingPlan::Monthly,
            None,
            Timestamp::now(),
        );
        assert!(!SubscriptionResponse::from(&subscription).has_access);

        subscription
            .activate(
                "sub_1".to_string(),
                "cus_1".to_string(),
                Timestamp::now().add_days(30),
                Timestamp::now(),
            )
            .unwrap();
        let response = SubscriptionResponse::from(&subscription);
        assert!(response.has_access);
        assert_eq!(response.status, "active");
        assert_eq!(response.plan, "monthly");
    }
}
