//! PostgreSQL implementation of WebhookEventRepository.
//!
//! The primary key on `dedupe_key` plus `ON CONFLICT DO NOTHING` gives the
//! insert-once semantics the idempotent processor relies on.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::ports::{SaveResult, WebhookEventRecord, WebhookEventRepository};

/// PostgreSQL implementation of the WebhookEventRepository port.
pub struct PostgresWebhookEventRepository {
    pool: PgPool,
}

impl PostgresWebhookEventRepository {
    /// Creates a repository over the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WebhookEventRow {
    dedupe_key: String,
    event_type: String,
    result: String,
    error_message: Option<String>,
    payload: serde_json::Value,
    processed_at: DateTime<Utc>,
}

impl From<WebhookEventRow> for WebhookEventRecord {
    fn from(row: WebhookEventRow) -> Self {
        WebhookEventRecord {
            dedupe_key: row.dedupe_key,
            event_type: row.event_type,
            processed_at: Timestamp::from_datetime(row.processed_at),
            result: row.result,
            error_message: row.error_message,
            payload: row.payload,
        }
    }
}

#[async_trait]
impl WebhookEventRepository for PostgresWebhookEventRepository {
    async fn find_by_key(&self, key: &str) -> Result<Option<WebhookEventRecord>, DomainError> {
        let row: Option<WebhookEventRow> = sqlx::query_as(
            r#"
            SELECT dedupe_key, event_type, result, error_message, payload, processed_at
            FROM webhook_events
            WHERE dedupe_key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find webhook event: {}", e)))?;

        Ok(row.map(WebhookEventRecord::from))
    }

    async fn save(&self, record: WebhookEventRecord) -> Result<SaveResult, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO webhook_events (
                dedupe_key, event_type, result, error_message, payload, processed_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (dedupe_key) DO NOTHING
            "#,
        )
        .bind(&record.dedupe_key)
        .bind(&record.event_type)
        .bind(&record.result)
        .bind(&record.error_message)
        .bind(&record.payload)
        .bind(record.processed_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to save webhook event: {}", e)))?;

        if result.rows_affected() == 0 {
            Ok(SaveResult::AlreadyExists)
        } else {
            Ok(SaveResult::Inserted)
        }
    }

    async fn delete_before(&self, cutoff: Timestamp) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM webhook_events WHERE processed_at < $1")
            .bind(cutoff.as_datetime())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DomainError::database(format!("Failed to delete webhook events: {}", e))
            })?;

        Ok(result.rows_affected())
    }
}
