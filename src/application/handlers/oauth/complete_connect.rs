//! CompleteConnectHandler - Finishes the Square OAuth flow.

use std::sync::Arc;

use crate::domain::connection::MerchantConnection;
use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};
use crate::ports::{ConnectionRepository, MerchantGateway, OAuthStateRepository};

/// Command carrying the provider callback parameters.
#[derive(Debug, Clone)]
pub struct CompleteConnectCommand {
    pub code: String,
    pub state_token: String,
}

/// Handler that validates the OAuth state, exchanges the code, and stores
/// the resulting merchant connection.
pub struct CompleteConnectHandler {
    states: Arc<dyn OAuthStateRepository>,
    connections: Arc<dyn ConnectionRepository>,
    gateway: Arc<dyn MerchantGateway>,
}

impl CompleteConnectHandler {
    pub fn new(
        states: Arc<dyn OAuthStateRepository>,
        connections: Arc<dyn ConnectionRepository>,
        gateway: Arc<dyn MerchantGateway>,
    ) -> Self {
        Self {
            states,
            connections,
            gateway,
        }
    }

    pub async fn handle(
        &self,
        cmd: CompleteConnectCommand,
    ) -> Result<MerchantConnection, DomainError> {
        let now = Timestamp::now();

        // 1. Validate and consume the state (single use)
        let mut state = self
            .states
            .find_by_token(&cmd.state_token)
            .await?
            .ok_or_else(|| {
                DomainError::new(ErrorCode::OAuthStateNotFound, "Unknown OAuth state")
            })?;
        state.consume(now)?;
        self.states.mark_consumed(&state).await?;

        // 2. Exchange the code for tokens
        let grant = self.gateway.exchange_code(&cmd.code).await?;

        // 3. Store the connection (replaces any previous one for the org)
        let connection = MerchantConnection::establish(state.organization_id, grant, now);
        self.connections.upsert(&connection).await?;

        tracing::info!(
            organization_id = %connection.organization_id,
            merchant_id = %connection.merchant_id,
            "Merchant connection established"
        );
        Ok(connection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::{
        InMemoryConnectionRepository, MockMerchantGateway, InMemoryOAuthStateRepository,
    };
    use crate::domain::connection::{ConnectionStatus, OAuthState};
    use crate::domain::foundation::OrganizationId;
    use std::sync::atomic::Ordering;

    fn issued_state(org: OrganizationId) -> OAuthState {
        OAuthState::issue(org, Timestamp::now())
    }

    #[tokio::test]
    async fn callback_establishes_connection() {
        let org = OrganizationId::new();
        let state = issued_state(org);
        let token = state.state_token.clone();

        let states = InMemoryOAuthStateRepository::with(state);
        let connections = InMemoryConnectionRepository::new();
        let gateway = MockMerchantGateway::new();
        let handler = CompleteConnectHandler::new(states.clone(), connections.clone(), gateway);

        let connection = handler
            .handle(CompleteConnectCommand {
                code: "auth-code".to_string(),
                state_token: token,
            })
            .await
            .unwrap();

        assert_eq!(connection.organization_id, org);
        assert_eq!(connection.status, ConnectionStatus::Connected);
        assert!(connections.get(&org).is_some());

        // State is consumed
        let stored = states.states.lock().unwrap();
        assert!(stored[0].consumed_at.is_some());
    }

    #[tokio::test]
    async fn unknown_state_is_rejected() {
        let states = InMemoryOAuthStateRepository::new();
        let connections = InMemoryConnectionRepository::new();
        let gateway = MockMerchantGateway::new();
        let handler =
            CompleteConnectHandler::new(states, connections, gateway.clone());

        let err = handler
            .handle(CompleteConnectCommand {
                code: "auth-code".to_string(),
                state_token: "forged".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::OAuthStateNotFound);
        assert_eq!(gateway.exchange_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn replayed_state_is_rejected() {
        let org = OrganizationId::new();
        let state = issued_state(org);
        let token = state.state_token.clone();

        let states = InMemoryOAuthStateRepository::with(state);
        let connections = InMemoryConnectionRepository::new();
        let gateway = MockMerchantGateway::new();
        let handler =
            CompleteConnectHandler::new(states, connections, gateway.clone());

        let cmd = CompleteConnectCommand {
            code: "auth-code".to_string(),
            state_token: token,
        };
        handler.handle(cmd.clone()).await.unwrap();
        let err = handler.handle(cmd).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::OAuthStateConsumed);
        assert_eq!(gateway.exchange_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_state_is_rejected() {
        let org = OrganizationId::new();
        let mut state = issued_state(org);
        state.expires_at = Timestamp::now().add_minutes(-1);

        let states = InMemoryOAuthStateRepository::with(state.clone());
        let connections = InMemoryConnectionRepository::new();
        let gateway = MockMerchantGateway::new();
        let handler = CompleteConnectHandler::new(states, connections, gateway);

        let err = handler
            .handle(CompleteConnectCommand {
                code: "auth-code".to_string(),
                state_token: state.state_token,
            })
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::OAuthStateExpired);
    }

    #[tokio::test]
    async fn rejected_code_exchange_propagates() {
        let org = OrganizationId::new();
        let state = issued_state(org);
        let token = state.state_token.clone();

        let states = InMemoryOAuthStateRepository::with(state);
        let connections = InMemoryConnectionRepository::new();
        let gateway = MockMerchantGateway::new();
        gateway.fail_exchange.store(true, Ordering::SeqCst);
        let handler = CompleteConnectHandler::new(states, connections.clone(), gateway);

        let err = handler
            .handle(CompleteConnectCommand {
                code: "bad-code".to_string(),
                state_token: token,
            })
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::Unauthorized);
        assert!(connections.get(&org).is_none());
    }

    #[tokio::test]
    async fn reconnect_replaces_previous_connection() {
        let org = OrganizationId::new();
        let first_state = issued_state(org);
        let second_state = issued_state(org);

        let states = InMemoryOAuthStateRepository::with(first_state.clone());
        states.save(&second_state).await.unwrap();
        let connections = InMemoryConnectionRepository::new();
        let gateway = MockMerchantGateway::new();
        let handler = CompleteConnectHandler::new(states, connections.clone(), gateway);

        handler
            .handle(CompleteConnectCommand {
                code: "code-1".to_string(),
                state_token: first_state.state_token,
            })
            .await
            .unwrap();
        handler
            .handle(CompleteConnectCommand {
                code: "code-2".to_string(),
                state_token: second_state.state_token,
            })
            .await
            .unwrap();

        assert_eq!(connections.connections.lock().unwrap().len(), 1);
    }
}
