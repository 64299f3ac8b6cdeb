//! CancelSubscriptionHandler - Requests cancellation at period end.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, OrganizationId, Timestamp};
use crate::domain::subscription::{BillingProvider, Subscription, SubscriptionEvent};
use crate::ports::{BillingGateway, SubscriptionEventLog, SubscriptionRepository};

/// Command to cancel an organization's subscription at period end.
#[derive(Debug, Clone)]
pub struct CancelSubscriptionCommand {
    pub organization_id: OrganizationId,
}

/// Handler that requests cancel-at-period-end at the provider and applies
/// the returned snapshot to the local record.
///
/// Square-billed subscriptions are cancelled merchant-side (in the Square
/// dashboard); that change arrives through the webhook instead.
pub struct CancelSubscriptionHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    gateway: Arc<dyn BillingGateway>,
    event_log: Arc<dyn SubscriptionEventLog>,
}

impl CancelSubscriptionHandler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        gateway: Arc<dyn BillingGateway>,
        event_log: Arc<dyn SubscriptionEventLog>,
    ) -> Self {
        Self {
            subscriptions,
            gateway,
            event_log,
        }
    }

    pub async fn handle(
        &self,
        cmd: CancelSubscriptionCommand,
    ) -> Result<Subscription, DomainError> {
        let mut subscription = self
            .subscriptions
            .find_by_organization(&cmd.organization_id)
            .await?
            .ok_or_else(|| {
                DomainError::not_found(ErrorCode::SubscriptionNotFound, "Subscription")
            })?;

        if subscription.provider != BillingProvider::Stripe {
            return Err(DomainError::validation(
                "provider",
                "Square-billed subscriptions are cancelled from the Square dashboard",
            ));
        }

        let provider_subscription_id = subscription
            .provider_subscription_id
            .clone()
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::InvalidStateTransition,
                    "Subscription has not completed checkout",
                )
            })?;

        let snapshot = self
            .gateway
            .cancel_at_period_end(&provider_subscription_id)
            .await?;

        let previous = subscription.status;
        if subscription
            .apply_snapshot(&snapshot, Timestamp::now())?
            .is_some()
        {
            self.subscriptions.update(&subscription).await?;
            let entry = SubscriptionEvent::status_change(
                subscription.id,
                "cancellation_requested",
                None,
                Some(previous),
                subscription.status,
                Timestamp::now(),
            );
            if let Err(err) = self.event_log.append(&entry).await {
                tracing::warn!(
                    subscription_id = %subscription.id,
                    error = %err,
                    "Event log append failed, continuing"
                );
            }
        } else {
            self.subscriptions.update(&subscription).await?;
        }

        tracing::info!(
            organization_id = %cmd.organization_id,
            subscription_id = %subscription.id,
            "Cancellation requested"
        );
        Ok(subscription)
    }
}
