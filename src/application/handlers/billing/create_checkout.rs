//! CreateCheckoutHandler - Starts a hosted checkout for a plan.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, OrganizationId, StateMachine, Timestamp};
use crate::domain::subscription::{
    BillingPlan, BillingProvider, PromoCode, Subscription, SubscriptionStatus,
};
use crate::ports::{
    BillingGateway, CheckoutSession, CreateCheckoutRequest, PromoCodeRepository,
    SubscriptionRepository,
};

/// Command to start checkout for an organization.
#[derive(Debug, Clone)]
pub struct CreateCheckoutCommand {
    pub organization_id: OrganizationId,
    pub plan: BillingPlan,
    pub promo_code: Option<String>,
}

/// Handler that validates the promo code, prepares the local pending
/// record, and creates the hosted checkout session.
///
/// The promo code is only *validated* here; its redemption is consumed
/// when the checkout-completed webhook activates the subscription.
pub struct CreateCheckoutHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    promo_codes: Arc<dyn PromoCodeRepository>,
    gateway: Arc<dyn BillingGateway>,
    success_url: String,
    cancel_url: String,
}

impl CreateCheckoutHandler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        promo_codes: Arc<dyn PromoCodeRepository>,
        gateway: Arc<dyn BillingGateway>,
        success_url: impl Into<String>,
        cancel_url: impl Into<String>,
    ) -> Self {
        Self {
            subscriptions,
            promo_codes,
            gateway,
            success_url: success_url.into(),
            cancel_url: cancel_url.into(),
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateCheckoutCommand,
    ) -> Result<CheckoutSession, DomainError> {
        let now = Timestamp::now();

        // 1. Validate the promo code up front
        let promo_code = match cmd.promo_code.as_deref() {
            Some(raw) => {
                let code = PromoCode::normalize(raw)?;
                let promo = self
                    .promo_codes
                    .find_by_code(&code)
                    .await?
                    .ok_or_else(|| {
                        DomainError::not_found(ErrorCode::PromoCodeNotFound, "Promo code")
                    })?;
                promo.check_redeemable(now)?;
                Some(code)
            }
            None => None,
        };

        // 2. Prepare the local record
        match self
            .subscriptions
            .find_by_organization(&cmd.organization_id)
            .await?
        {
            None => {
                let subscription = Subscription::start_checkout(
                    cmd.organization_id,
                    BillingProvider::Stripe,
                    cmd.plan,
                    promo_code.clone(),
                    now,
                );
                self.subscriptions.save(&subscription).await?;
            }
            Some(mut subscription) if subscription.status == SubscriptionStatus::Pending => {
                // Abandoned checkout re-run: refresh plan and promo choice
                subscription.plan = cmd.plan;
                subscription.promo_code = promo_code.clone();
                subscription.updated_at = now;
                self.subscriptions.update(&subscription).await?;
            }
            Some(mut subscription) if subscription.status == SubscriptionStatus::Canceled => {
                // Resubscribe: the canceled record restarts its cycle
                subscription.status = subscription
                    .status
                    .transition_to(SubscriptionStatus::Pending)?;
                subscription.provider = BillingProvider::Stripe;
                subscription.provider_subscription_id = None;
                subscription.provider_customer_id = None;
                subscription.plan = cmd.plan;
                subscription.promo_code = promo_code.clone();
                subscription.current_period_end = None;
                subscription.canceled_at = None;
                subscription.updated_at = now;
                self.subscriptions.update(&subscription).await?;
            }
            Some(subscription) => {
                return Err(DomainError::new(
                    ErrorCode::SubscriptionExists,
                    format!(
                        "Organization already has a {} subscription",
                        subscription.status.as_str()
                    ),
                ));
            }
        }

        // 3. Create the hosted session
        let session = self
            .gateway
            .create_checkout_session(CreateCheckoutRequest {
                organization_id: cmd.organization_id,
                plan: cmd.plan,
                promo_code,
                success_url: self.success_url.clone(),
                cancel_url: self.cancel_url.clone(),
            })
            .await?;

        tracing::info!(
            organization_id = %cmd.organization_id,
            plan = cmd.plan.as_str(),
            session_id = %session.id,
            "Checkout session created"
        );
        Ok(session)
    }
}
