//! PostgreSQL implementation of SubscriptionEventLog.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, SubscriptionId, Timestamp};
use crate::domain::subscription::{SubscriptionEvent, SubscriptionStatus};
use crate::ports::SubscriptionEventLog;

/// PostgreSQL implementation of the SubscriptionEventLog port.
pub struct PostgresSubscriptionEventLog {
    pool: PgPool,
}

impl PostgresSubscriptionEventLog {
    /// Creates a log over the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    id: Uuid,
    subscription_id: Uuid,
    provider_event_id: Option<String>,
    kind: String,
    old_status: Option<String>,
    new_status: String,
    recorded_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for SubscriptionEvent {
    type Error = DomainError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        Ok(SubscriptionEvent {
            id: row.id,
            subscription_id: SubscriptionId::from_uuid(row.subscription_id),
            provider_event_id: row.provider_event_id,
            kind: row.kind,
            old_status: row.old_status.as_deref().map(parse_status).transpose()?,
            new_status: parse_status(&row.new_status)?,
            recorded_at: Timestamp::from_datetime(row.recorded_at),
        })
    }
}

fn parse_status(s: &str) -> Result<SubscriptionStatus, DomainError> {
    match s {
        "pending" => Ok(SubscriptionStatus::Pending),
        "active" => Ok(SubscriptionStatus::Active),
        "past_due" => Ok(SubscriptionStatus::PastDue),
        "pending_cancellation" => Ok(SubscriptionStatus::PendingCancellation),
        "paused" => Ok(SubscriptionStatus::Paused),
        "canceled" => Ok(SubscriptionStatus::Canceled),
        _ => Err(DomainError::database(format!(
            "Invalid status value in event log: {}",
            s
        ))),
    }
}

#[async_trait]
impl SubscriptionEventLog for PostgresSubscriptionEventLog {
    async fn append(&self, event: &SubscriptionEvent) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO subscription_events (
                id, subscription_id, provider_event_id, kind, old_status, new_status, recorded_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(event.id)
        .bind(event.subscription_id.as_uuid())
        .bind(&event.provider_event_id)
        .bind(&event.kind)
        .bind(event.old_status.map(|s| s.as_str()))
        .bind(event.new_status.as_str())
        .bind(event.recorded_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to append subscription event: {}", e)))?;

        Ok(())
    }

    async fn list_for_subscription(
        &self,
        subscription_id: &SubscriptionId,
        limit: i64,
    ) -> Result<Vec<SubscriptionEvent>, DomainError> {
        let rows: Vec<EventRow> = sqlx::query_as(
            r#"
            SELECT id, subscription_id, provider_event_id, kind, old_status, new_status, recorded_at
            FROM subscription_events
            WHERE subscription_id = $1
            ORDER BY recorded_at DESC
            LIMIT $2
            "#,
        )
        .bind(subscription_id.as_uuid())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to list subscription events: {}", e)))?;

        rows.into_iter().map(SubscriptionEvent::try_from).collect()
    }
}
