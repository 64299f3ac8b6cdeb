//! SubscriptionRepository port - Platform subscription storage.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, OrganizationId};
use crate::domain::subscription::{BillingProvider, Subscription};

/// Port for persisting subscriptions.
///
/// One subscription per organization, enforced by a unique constraint.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Inserts a new subscription.
    async fn save(&self, subscription: &Subscription) -> Result<(), DomainError>;

    /// Updates an existing subscription by id.
    async fn update(&self, subscription: &Subscription) -> Result<(), DomainError>;

    /// Finds the subscription for an organization.
    async fn find_by_organization(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Option<Subscription>, DomainError>;

    /// Finds a subscription by its provider-side subscription id.
    async fn find_by_provider_subscription(
        &self,
        provider: BillingProvider,
        provider_subscription_id: &str,
    ) -> Result<Option<Subscription>, DomainError>;

    /// Finds a subscription by its provider-side customer id.
    async fn find_by_provider_customer(
        &self,
        provider: BillingProvider,
        provider_customer_id: &str,
    ) -> Result<Option<Subscription>, DomainError>;
}
