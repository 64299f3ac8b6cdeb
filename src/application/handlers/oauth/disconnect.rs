//! DisconnectHandler - Revokes a merchant connection.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, OrganizationId};
use crate::ports::{ConnectionRepository, MerchantGateway};

/// Command to disconnect an organization from its merchant account.
#[derive(Debug, Clone)]
pub struct DisconnectCommand {
    pub organization_id: OrganizationId,
}

/// Handler that revokes tokens at Square and marks the row revoked.
///
/// The local row is the source of truth for the app: revocation proceeds
/// even when the provider-side revoke call fails, so a Square outage can't
/// leave the kiosk believing it is still connected.
pub struct DisconnectHandler {
    connections: Arc<dyn ConnectionRepository>,
    gateway: Arc<dyn MerchantGateway>,
}

impl DisconnectHandler {
    pub fn new(
        connections: Arc<dyn ConnectionRepository>,
        gateway: Arc<dyn MerchantGateway>,
    ) -> Self {
        Self {
            connections,
            gateway,
        }
    }

    pub async fn handle(&self, cmd: DisconnectCommand) -> Result<(), DomainError> {
        let mut connection = self
            .connections
            .find_by_organization(&cmd.organization_id)
            .await?
            .ok_or_else(|| DomainError::not_found(ErrorCode::ConnectionNotFound, "Connection"))?;

        if let Err(err) = self.gateway.revoke_access(&connection.merchant_id).await {
            tracing::warn!(
                organization_id = %cmd.organization_id,
                error = %err,
                "Provider-side revoke failed, revoking locally anyway"
            );
        }

        connection.revoke()?;
        self.connections.update(&connection).await?;

        tracing::info!(
            organization_id = %cmd.organization_id,
            "Merchant connection revoked"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::{
        connected, InMemoryConnectionRepository, MockMerchantGateway,
    };
    use crate::domain::connection::ConnectionStatus;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn disconnect_revokes_remotely_and_locally() {
        let org = OrganizationId::new();
        let connections = InMemoryConnectionRepository::with(connected(org));
        let gateway = MockMerchantGateway::new();

        let handler = DisconnectHandler::new(connections.clone(), gateway.clone());
        handler
            .handle(DisconnectCommand {
                organization_id: org,
            })
            .await
            .unwrap();

        assert_eq!(gateway.revoke_calls.load(Ordering::SeqCst), 1);
        let stored = connections.get(&org).unwrap();
        assert_eq!(stored.status, ConnectionStatus::Revoked);
        assert!(stored.access_token.is_empty());
    }

    #[tokio::test]
    async fn provider_failure_still_revokes_locally() {
        let org = OrganizationId::new();
        let connections = InMemoryConnectionRepository::with(connected(org));
        let gateway = MockMerchantGateway::new();
        gateway.fail_revoke.store(true, Ordering::SeqCst);

        let handler = DisconnectHandler::new(connections.clone(), gateway);
        handler
            .handle(DisconnectCommand {
                organization_id: org,
            })
            .await
            .unwrap();

        assert_eq!(
            connections.get(&org).unwrap().status,
            ConnectionStatus::Revoked
        );
    }

    #[tokio::test]
    async fn disconnect_without_connection_errors() {
        let connections = InMemoryConnectionRepository::new();
        let gateway = MockMerchantGateway::new();
        let handler = DisconnectHandler::new(connections, gateway);

        let err = handler
            .handle(DisconnectCommand {
                organization_id: OrganizationId::new(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::ConnectionNotFound);
    }

    #[tokio::test]
    async fn double_disconnect_fails_on_terminal_state() {
        let org = OrganizationId::new();
        let connections = InMemoryConnectionRepository::with(connected(org));
        let gateway = MockMerchantGateway::new();
        let handler = DisconnectHandler::new(connections, gateway);

        let cmd = DisconnectCommand {
            organization_id: org,
        };
        handler.handle(cmd.clone()).await.unwrap();
        let err = handler.handle(cmd).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::InvalidFormat);
    }
}
