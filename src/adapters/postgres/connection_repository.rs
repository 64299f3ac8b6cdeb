//! PostgreSQL implementation of ConnectionRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::connection::{ConnectionStatus, MerchantConnection};
use crate::domain::foundation::{
    ConnectionId, DomainError, ErrorCode, OrganizationId, Timestamp,
};
use crate::ports::ConnectionRepository;

/// PostgreSQL implementation of the ConnectionRepository port.
pub struct PostgresConnectionRepository {
    pool: PgPool,
}

impl PostgresConnectionRepository {
    /// Creates a repository over the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ConnectionRow {
    id: Uuid,
    organization_id: Uuid,
    merchant_id: String,
    access_token: String,
    refresh_token: Option<String>,
    scopes: String,
    status: String,
    token_expires_at: DateTime<Utc>,
    connected_at: DateTime<Utc>,
    last_refreshed_at: Option<DateTime<Utc>>,
}

impl TryFrom<ConnectionRow> for MerchantConnection {
    type Error = DomainError;

    fn try_from(row: ConnectionRow) -> Result<Self, Self::Error> {
        Ok(MerchantConnection {
            id: ConnectionId::from_uuid(row.id),
            organization_id: OrganizationId::from_uuid(row.organization_id),
            merchant_id: row.merchant_id,
            access_token: row.access_token,
            refresh_token: row.refresh_token,
            scopes: row
                .scopes
                .split(' ')
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            status: parse_status(&row.status)?,
            token_expires_at: Timestamp::from_datetime(row.token_expires_at),
            connected_at: Timestamp::from_datetime(row.connected_at),
            last_refreshed_at: row.last_refreshed_at.map(Timestamp::from_datetime),
        })
    }
}

fn parse_status(s: &str) -> Result<ConnectionStatus, DomainError> {
    match s {
        "connected" => Ok(ConnectionStatus::Connected),
        "expired" => Ok(ConnectionStatus::Expired),
        "revoked" => Ok(ConnectionStatus::Revoked),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid connection status value: {}", s),
        )),
    }
}

fn status_to_string(status: &ConnectionStatus) -> &'static str {
    match status {
        ConnectionStatus::Connected => "connected",
        ConnectionStatus::Expired => "expired",
        ConnectionStatus::Revoked => "revoked",
    }
}

const SELECT_COLUMNS: &str = "id, organization_id, merchant_id, access_token, refresh_token, \
     scopes, status, token_expires_at, connected_at, last_refreshed_at";

#[async_trait]
impl ConnectionRepository for PostgresConnectionRepository {
    async fn upsert(&self, connection: &MerchantConnection) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO merchant_connections (
                id, organization_id, merchant_id, access_token, refresh_token,
                scopes, status, token_expires_at, connected_at, last_refreshed_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (organization_id) DO UPDATE SET
                id = EXCLUDED.id,
                merchant_id = EXCLUDED.merchant_id,
                access_token = EXCLUDED.access_token,
                refresh_token = EXCLUDED.refresh_token,
                scopes = EXCLUDED.scopes,
                status = EXCLUDED.status,
                token_expires_at = EXCLUDED.token_expires_at,
                connected_at = EXCLUDED.connected_at,
                last_refreshed_at = EXCLUDED.last_refreshed_at
            "#,
        )
        .bind(connection.id.as_uuid())
        .bind(connection.organization_id.as_uuid())
        .bind(&connection.merchant_id)
        .bind(&connection.access_token)
        .bind(&connection.refresh_token)
        .bind(connection.scopes.join(" "))
        .bind(status_to_string(&connection.status))
        .bind(connection.token_expires_at.as_datetime())
        .bind(connection.connected_at.as_datetime())
        .bind(connection.last_refreshed_at.as_ref().map(Timestamp::as_datetime))
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to upsert connection: {}", e)))?;

        Ok(())
    }

    async fn update(&self, connection: &MerchantConnection) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE merchant_connections SET
                access_token = $2,
                refresh_token = $3,
                scopes = $4,
                status = $5,
                token_expires_at = $6,
                last_refreshed_at = $7
            WHERE id = $1
            "#,
        )
        .bind(connection.id.as_uuid())
        .bind(&connection.access_token)
        .bind(&connection.refresh_token)
        .bind(connection.scopes.join(" "))
        .bind(status_to_string(&connection.status))
        .bind(connection.token_expires_at.as_datetime())
        .bind(connection.last_refreshed_at.as_ref().map(Timestamp::as_datetime))
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to update connection: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(
                ErrorCode::ConnectionNotFound,
                "Connection",
            ));
        }
        Ok(())
    }

    async fn find_by_organization(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Option<MerchantConnection>, DomainError> {
        let row: Option<ConnectionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM merchant_connections WHERE organization_id = $1",
            SELECT_COLUMNS
        ))
        .bind(organization_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find connection: {}", e)))?;

        row.map(MerchantConnection::try_from).transpose()
    }

    async fn find_expiring_within_hours(
        &self,
        hours: i64,
    ) -> Result<Vec<MerchantConnection>, DomainError> {
        let threshold = Utc::now() + chrono::Duration::hours(hours);

        let rows: Vec<ConnectionRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM merchant_connections
            WHERE status = 'connected' AND token_expires_at <= $1
            ORDER BY token_expires_at ASC
            "#,
            SELECT_COLUMNS
        ))
        .bind(threshold)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DomainError::database(format!("Failed to find expiring connections: {}", e))
        })?;

        rows.into_iter().map(MerchantConnection::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_roundtrip() {
        for status in [
            ConnectionStatus::Connected,
            ConnectionStatus::Expired,
            ConnectionStatus::Revoked,
        ] {
            assert_eq!(parse_status(status_to_string(&status)).unwrap(), status);
        }
    }

    #[test]
    fn parse_status_rejects_unknown() {
        assert!(parse_status("linked").is_err());
        assert!(parse_status("").is_err());
    }

    #[test]
    fn scopes_roundtrip_through_space_join() {
        let row = ConnectionRow {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            merchant_id: "M1".to_string(),
            access_token: "tok".to_string(),
            refresh_token: None,
            scopes: "ITEMS_READ PAYMENTS_WRITE".to_string(),
            status: "connected".to_string(),
            token_expires_at: Utc::now(),
            connected_at: Utc::now(),
            last_refreshed_at: None,
        };

        let connection = MerchantConnection::try_from(row).unwrap();
        assert_eq!(connection.scopes, vec!["ITEMS_READ", "PAYMENTS_WRITE"]);
    }

    #[test]
    fn empty_scopes_become_empty_list() {
        let row = ConnectionRow {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            merchant_id: "M1".to_string(),
            access_token: "tok".to_string(),
            refresh_token: None,
            scopes: String::new(),
            status: "connected".to_string(),
            token_expires_at: Utc::now(),
            connected_at: Utc::now(),
            last_refreshed_at: None,
        };

        let connection = MerchantConnection::try_from(row).unwrap();
        assert!(connection.scopes.is_empty());
    }
}
