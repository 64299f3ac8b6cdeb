//! OAuthStateRepository port - Pending OAuth state storage.

use async_trait::async_trait;

use crate::domain::connection::OAuthState;
use crate::domain::foundation::{DomainError, Timestamp};

/// Port for persisting pending OAuth round-trips.
#[async_trait]
pub trait OAuthStateRepository: Send + Sync {
    /// Stores a freshly issued state.
    async fn save(&self, state: &OAuthState) -> Result<(), DomainError>;

    /// Finds a state by its token.
    async fn find_by_token(&self, state_token: &str) -> Result<Option<OAuthState>, DomainError>;

    /// Persists the consumed marker after a successful callback.
    async fn mark_consumed(&self, state: &OAuthState) -> Result<(), DomainError>;

    /// Deletes consumed states and states that expired before the cutoff.
    async fn delete_stale(&self, cutoff: Timestamp) -> Result<u64, DomainError>;
}
