//! RefreshConnectionHandler - Renews a connection's token pair.
//!
//! Used by the explicit refresh endpoint and by the scheduled refresh job.

use std::sync::Arc;

use crate::domain::connection::MerchantConnection;
use crate::domain::foundation::{DomainError, ErrorCode, OrganizationId, Timestamp};
use crate::ports::{ConnectionRepository, GatewayErrorCode, MerchantGateway};

/// Command to refresh an organization's connection.
#[derive(Debug, Clone)]
pub struct RefreshConnectionCommand {
    pub organization_id: OrganizationId,
}

/// Handler that refreshes the token pair through the merchant gateway.
pub struct RefreshConnectionHandler {
    connections: Arc<dyn ConnectionRepository>,
    gateway: Arc<dyn MerchantGateway>,
}

impl RefreshConnectionHandler {
    pub fn new(
        connections: Arc<dyn ConnectionRepository>,
        gateway: Arc<dyn MerchantGateway>,
    ) -> Self {
        Self {
            connections,
            gateway,
        }
    }

    pub async fn handle(
        &self,
        cmd: RefreshConnectionCommand,
    ) -> Result<MerchantConnection, DomainError> {
        let connection = self
            .connections
            .find_by_organization(&cmd.organization_id)
            .await?
            .ok_or_else(|| DomainError::not_found(ErrorCode::ConnectionNotFound, "Connection"))?;

        self.refresh(connection).await
    }

    /// Refreshes an already-loaded connection; shared with the cron job.
    pub async fn refresh(
        &self,
        mut connection: MerchantConnection,
    ) -> Result<MerchantConnection, DomainError> {
        let refresh_token = connection.refresh_token.clone().ok_or_else(|| {
            DomainError::new(
                ErrorCode::ConnectionExpired,
                "Connection has no refresh token; re-authorization required",
            )
        })?;

        match self.gateway.refresh_tokens(&refresh_token).await {
            Ok(grant) => {
                connection.apply_refresh(grant, Timestamp::now())?;
                self.connections.update(&connection).await?;
                tracing::info!(
                    organization_id = %connection.organization_id,
                    token_expires_at = %connection.token_expires_at,
                    "Merchant tokens refreshed"
                );
                Ok(connection)
            }
            Err(err) if err.code == GatewayErrorCode::GrantRejected => {
                // The refresh grant is dead; only re-authorization helps
                connection.mark_expired()?;
                self.connections.update(&connection).await?;
                tracing::warn!(
                    organization_id = %connection.organization_id,
                    "Refresh grant rejected, connection marked expired"
                );
                Err(DomainError::new(
                    ErrorCode::ConnectionExpired,
                    "Refresh grant rejected; re-authorization required",
                ))
            }
            Err(err) => Err(err.into()),
        }
    }
}
