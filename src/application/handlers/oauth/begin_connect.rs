//! BeginConnectHandler - Starts the Square OAuth flow.

use std::sync::Arc;

use crate::domain::connection::OAuthState;
use crate::domain::foundation::{DomainError, OrganizationId, Timestamp};
use crate::ports::{MerchantGateway, OAuthStateRepository};

/// Command to start the OAuth flow for an organization.
#[derive(Debug, Clone)]
pub struct BeginConnectCommand {
    pub organization_id: OrganizationId,
}

/// Handler that issues a pending OAuth state and builds the authorize URL.
pub struct BeginConnectHandler {
    states: Arc<dyn OAuthStateRepository>,
    gateway: Arc<dyn MerchantGateway>,
}

impl BeginConnectHandler {
    pub fn new(states: Arc<dyn OAuthStateRepository>, gateway: Arc<dyn MerchantGateway>) -> Self {
        Self { states, gateway }
    }

    /// Returns the provider authorize URL the client should be redirected to.
    pub async fn handle(&self, cmd: BeginConnectCommand) -> Result<String, DomainError> {
        let state = OAuthState::issue(cmd.organization_id, Timestamp::now());
        self.states.save(&state).await?;

        let url = self.gateway.authorize_url(&state.state_token);
        tracing::info!(
            organization_id = %cmd.organization_id,
            "OAuth flow started"
        );
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::{
        MockMerchantGateway, InMemoryOAuthStateRepository,
    };

    #[tokio::test]
    async fn issues_state_and_builds_url() {
        let states = InMemoryOAuthStateRepository::new();
        let gateway = MockMerchantGateway::new();
        let handler = BeginConnectHandler::new(states.clone(), gateway);

        let org = OrganizationId::new();
        let url = handler
            .handle(BeginConnectCommand {
                organization_id: org,
            })
            .await
            .unwrap();

        let saved = states.states.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].organization_id, org);
        assert!(url.contains(&saved[0].state_token));
    }

    #[tokio::test]
    async fn repeated_starts_issue_distinct_states() {
        let states = InMemoryOAuthStateRepository::new();
        let gateway = MockMerchantGateway::new();
        let handler = BeginConnectHandler::new(states.clone(), gateway);

        let org = OrganizationId::new();
        let cmd = BeginConnectCommand {
            organization_id: org,
        };
        handler.handle(cmd.clone()).await.unwrap();
        handler.handle(cmd).await.unwrap();

        let saved = states.states.lock().unwrap();
        assert_eq!(saved.len(), 2);
        assert_ne!(saved[0].state_token, saved[1].state_token);
    }
}
