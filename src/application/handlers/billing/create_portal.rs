//! CreatePortalHandler - Opens a billing portal session.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, OrganizationId};
use crate::ports::{BillingGateway, PortalSession, SubscriptionRepository};

/// Command to open the billing portal for an organization.
#[derive(Debug, Clone)]
pub struct CreatePortalCommand {
    pub organization_id: OrganizationId,
}

/// Handler returning a hosted billing-portal URL.
pub struct CreatePortalHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    gateway: Arc<dyn BillingGateway>,
    return_url: String,
}

impl CreatePortalHandler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        gateway: Arc<dyn BillingGateway>,
        return_url: impl Into<String>,
    ) -> Self {
        Self {
            subscriptions,
            gateway,
            return_url: return_url.into(),
        }
    }

    pub async fn handle(&self, cmd: CreatePortalCommand) -> Result<PortalSession, DomainError> {
        let subscription = self
            .subscriptions
            .find_by_organization(&cmd.organization_id)
            .await?
            .ok_or_else(|| {
                DomainError::not_found(ErrorCode::SubscriptionNotFound, "Subscription")
            })?;

        let customer_id = subscription.provider_customer_id.as_deref().ok_or_else(|| {
            DomainError::new(
                ErrorCode::SubscriptionNotFound,
                "Subscription has no billing customer yet",
            )
        })?;

        let session = self
            .gateway
            .create_portal_session(customer_id, &self.return_url)
            .await?;
        Ok(session)
    }
}
