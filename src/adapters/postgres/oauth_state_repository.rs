//! PostgreSQL implementation of OAuthStateRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::connection::OAuthState;
use crate::domain::foundation::{DomainError, ErrorCode, OrganizationId, Timestamp};
use crate::ports::OAuthStateRepository;

/// PostgreSQL implementation of the OAuthStateRepository port.
pub struct PostgresOAuthStateRepository {
    pool: PgPool,
}

impl PostgresOAuthStateRepository {
    /// Creates a repository over the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OAuthStateRow {
    state_token: String,
    organization_id: Uuid,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    consumed_at: Option<DateTime<Utc>>,
}

impl From<OAuthStateRow> for OAuthState {
    fn from(row: OAuthStateRow) -> Self {
        OAuthState {
            state_token: row.state_token,
            organization_id: OrganizationId::from_uuid(row.organization_id),
            created_at: Timestamp::from_datetime(row.created_at),
            expires_at: Timestamp::from_datetime(row.expires_at),
            consumed_at: row.consumed_at.map(Timestamp::from_datetime),
        }
    }
}

#[async_trait]
impl OAuthStateRepository for PostgresOAuthStateRepository {
    async fn save(&self, state: &OAuthState) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO oauth_states (state_token, organization_id, created_at, expires_at, consumed_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&state.state_token)
        .bind(state.organization_id.as_uuid())
        .bind(state.created_at.as_datetime())
        .bind(state.expires_at.as_datetime())
        .bind(state.consumed_at.as_ref().map(Timestamp::as_datetime))
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to save oauth state: {}", e)))?;

        Ok(())
    }

    async fn find_by_token(&self, state_token: &str) -> Result<Option<OAuthState>, DomainError> {
        let row: Option<OAuthStateRow> = sqlx::query_as(
            r#"
            SELECT state_token, organization_id, created_at, expires_at, consumed_at
            FROM oauth_states
            WHERE state_token = $1
            "#,
        )
        .bind(state_token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find oauth state: {}", e)))?;

        Ok(row.map(OAuthState::from))
    }

    async fn mark_consumed(&self, state: &OAuthState) -> Result<(), DomainError> {
        // Guard on consumed_at IS NULL so two racing callbacks cannot both
        // consume the same state.
        let result = sqlx::query(
            r#"
            UPDATE oauth_states SET consumed_at = $2
            WHERE state_token = $1 AND consumed_at IS NULL
            "#,
        )
        .bind(&state.state_token)
        .bind(state.consumed_at.as_ref().map(Timestamp::as_datetime))
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to consume oauth state: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::OAuthStateConsumed,
                "OAuth state was already used",
            ));
        }
        Ok(())
    }

    async fn delete_stale(&self, cutoff: Timestamp) -> Result<u64, DomainError> {
        let result = sqlx::query(
            "DELETE FROM oauth_states WHERE consumed_at IS NOT NULL OR expires_at < $1",
        )
        .bind(cutoff.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to delete stale oauth states: {}", e)))?;

        Ok(result.rows_affected())
    }
}
