//! GetSubscriptionHandler - Reads an organization's subscription.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, OrganizationId};
use crate::domain::subscription::Subscription;
use crate::ports::SubscriptionRepository;

/// Query for an organization's subscription.
#[derive(Debug, Clone)]
pub struct GetSubscriptionQuery {
    pub organization_id: OrganizationId,
}

/// Handler returning the local subscription record, if any.
pub struct GetSubscriptionHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
}

impl GetSubscriptionHandler {
    pub fn new(subscriptions: Arc<dyn SubscriptionRepository>) -> Self {
        Self { subscriptions }
    }

    pub async fn handle(
        &self,
        query: GetSubscriptionQuery,
    ) -> Result<Option<Subscription>, DomainError> {
        self.subscriptions
            .find_by_organization(&query.organization_id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::{
        active_subscription, InMemorySubscriptionRepository,
    };

    #[tokio::test]
    async fn returns_subscription_when_present() {
        let org = OrganizationId::new();
        let subscriptions = InMemorySubscriptionRepository::with(active_subscription(org));
        let handler = GetSubscriptionHandler::new(subscriptions);

        let found = handler
            .handle(GetSubscriptionQuery {
                organization_id: org,
            })
            .await
            .unwrap();

        assert!(found.is_some());
        assert!(found.unwrap().has_access());
    }

    #[tokio::test]
    async fn returns_none_when_absent() {
        let handler = GetSubscriptionHandler::new(InMemorySubscriptionRepository::new());

        let found = handler
            .handle(GetSubscriptionQuery {
                organization_id: OrganizationId::new(),
            })
            .await
            .unwrap();

        assert!(found.is_none());
    }
}
