//! ConnectionRepository port - Merchant OAuth connection storage.

use async_trait::async_trait;

use crate::domain::connection::MerchantConnection;
use crate::domain::foundation::{DomainError, OrganizationId};

/// Port for persisting merchant connections.
///
/// One connection per organization, enforced by a unique constraint.
#[async_trait]
pub trait ConnectionRepository: Send + Sync {
    /// Inserts a new connection, or replaces the organization's previous
    /// one when the flow is re-run (upsert on organization id).
    async fn upsert(&self, connection: &MerchantConnection) -> Result<(), DomainError>;

    /// Updates an existing connection by id.
    async fn update(&self, connection: &MerchantConnection) -> Result<(), DomainError>;

    /// Finds the connection for an organization.
    async fn find_by_organization(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Option<MerchantConnection>, DomainError>;

    /// Finds connections whose access token expires within the window.
    ///
    /// Only usable (connected) rows are returned; the refresh job renews
    /// them ahead of expiry.
    async fn find_expiring_within_hours(
        &self,
        hours: i64,
    ) -> Result<Vec<MerchantConnection>, DomainError>;
}
