//! Shared merchant-token access for the passthrough handlers.
//!
//! Every commerce call needs a live access token for the caller's
//! organization. An expired token is refreshed inline before the
//! passthrough call; a rejected refresh marks the connection expired so
//! the kiosk is told to re-authorize rather than retried forever.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, OrganizationId, Timestamp};
use crate::ports::{ConnectionRepository, GatewayErrorCode, MerchantGateway};

/// Resolves a usable access token for an organization.
pub struct MerchantAccess {
    connections: Arc<dyn ConnectionRepository>,
    gateway: Arc<dyn MerchantGateway>,
}

impl MerchantAccess {
    pub fn new(
        connections: Arc<dyn ConnectionRepository>,
        gateway: Arc<dyn MerchantGateway>,
    ) -> Self {
        Self {
            connections,
            gateway,
        }
    }

    /// Returns a currently-valid access token, refreshing inline if needed.
    pub async fn access_token(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<String, DomainError> {
        let mut connection = self
            .connections
            .find_by_organization(organization_id)
            .await?
            .ok_or_else(|| DomainError::not_found(ErrorCode::ConnectionNotFound, "Connection"))?;

        if !connection.is_usable() {
            return Err(DomainError::new(
                ErrorCode::ConnectionRevoked,
                "Merchant connection is not usable; re-authorization required",
            ));
        }

        let now = Timestamp::now();
        if !connection.token_expired(now) {
            return Ok(connection.access_token);
        }

        tracing::info!(
            organization_id = %organization_id,
            "Access token expired, refreshing inline"
        );

        let refresh_token = connection.refresh_token.clone().ok_or_else(|| {
            DomainError::new(
                ErrorCode::ConnectionExpired,
                "Connection has no refresh token; re-authorization required",
            )
        })?;

        match self.gateway.refresh_tokens(&refresh_token).await {
            Ok(grant) => {
                connection.apply_refresh(grant, now)?;
                self.connections.update(&connection).await?;
                Ok(connection.access_token)
            }
            Err(err) if err.code == GatewayErrorCode::GrantRejected => {
                connection.mark_expired()?;
                self.connections.update(&connection).await?;
                Err(DomainError::new(
                    ErrorCode::ConnectionExpired,
                    "Refresh grant rejected; re-authorization required",
                ))
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::{
        connected, token_grant, InMemoryConnectionRepository, MockMerchantGateway,
    };
    use crate::domain::connection::ConnectionStatus;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn fresh_token_is_returned_without_refresh() {
        let org = OrganizationId::new();
        let gateway = MockMerchantGateway::new();
        let access = MerchantAccess::new(
            InMemoryConnectionRepository::with(connected(org)),
            gateway.clone(),
        );

        let token = access.access_token(&org).await.unwrap();
        assert_eq!(token, "sq0atp-access");
        assert_eq!(gateway.refresh_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn expired_token_refreshes_inline() {
        let org = OrganizationId::new();
        let mut connection = connected(org);
        connection.token_expires_at = Timestamp::now().add_hours(-1);
        let connections = InMemoryConnectionRepository::with(connection);
        let gateway = MockMerchantGateway::new();
        let mut grant = token_grant();
        grant.access_token = "sq0atp-fresh".to_string();
        gateway.next_grant(grant);

        let access = MerchantAccess::new(connections.clone(), gateway.clone());
        let token = access.access_token(&org).await.unwrap();

        assert_eq!(token, "sq0atp-fresh");
        assert_eq!(gateway.refresh_calls.load(Ordering::SeqCst), 1);
        assert_eq!(connections.get(&org).unwrap().access_token, "sq0atp-fresh");
    }

    #[tokio::test]
    async fn missing_connection_is_reported() {
        let access = MerchantAccess::new(
            InMemoryConnectionRepository::new(),
            MockMerchantGateway::new(),
        );

        let err = access.access_token(&OrganizationId::new()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ConnectionNotFound);
    }

    #[tokio::test]
    async fn revoked_connection_is_unusable() {
        let org = OrganizationId::new();
        let mut connection = connected(org);
        connection.revoke().unwrap();
        let access = MerchantAccess::new(
            InMemoryConnectionRepository::with(connection),
            MockMerchantGateway::new(),
        );

        let err = access.access_token(&org).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ConnectionRevoked);
    }

    #[tokio::test]
    async fn rejected_inline_refresh_marks_expired() {
        let org = OrganizationId::new();
        let mut connection = connected(org);
        connection.token_expires_at = Timestamp::now().add_hours(-1);
        let connections = InMemoryConnectionRepository::with(connection);
        let gateway = MockMerchantGateway::new();
        gateway.reject_refresh.store(true, Ordering::SeqCst);

        let access = MerchantAccess::new(connections.clone(), gateway);
        let err = access.access_token(&org).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::ConnectionExpired);
        assert_eq!(
            connections.get(&org).unwrap().status,
            ConnectionStatus::Expired
        );
    }
}
