//! PostgreSQL implementation of SubscriptionRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{
    DomainError, ErrorCode, OrganizationId, SubscriptionId, Timestamp,
};
use crate::domain::subscription::{BillingPlan, BillingProvider, Subscription, SubscriptionStatus};
use crate::ports::SubscriptionRepository;

/// PostgreSQL implementation of the SubscriptionRepository port.
pub struct PostgresSubscriptionRepository {
    pool: PgPool,
}

impl PostgresSubscriptionRepository {
    /// Creates a repository over the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    organization_id: Uuid,
    provider: String,
    provider_subscription_id: Option<String>,
    provider_customer_id: Option<String>,
    plan: String,
    status: String,
    current_period_end: Option<DateTime<Utc>>,
    promo_code: Option<String>,
    canceled_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(Subscription {
            id: SubscriptionId::from_uuid(row.id),
            organization_id: OrganizationId::from_uuid(row.organization_id),
            provider: BillingProvider::parse(&row.provider)
                .map_err(|e| DomainError::new(ErrorCode::DatabaseError, e.to_string()))?,
            provider_subscription_id: row.provider_subscription_id,
            provider_customer_id: row.provider_customer_id,
            plan: BillingPlan::parse(&row.plan)
                .map_err(|e| DomainError::new(ErrorCode::DatabaseError, e.to_string()))?,
            status: parse_status(&row.status)?,
            current_period_end: row.current_period_end.map(Timestamp::from_datetime),
            promo_code: row.promo_code,
            canceled_at: row.canceled_at.map(Timestamp::from_datetime),
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
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
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid subscription status value: {}", s),
        )),
    }
}

const SELECT_COLUMNS: &str = "id, organization_id, provider, provider_subscription_id, \
     provider_customer_id, plan, status, current_period_end, promo_code, canceled_at, \
     created_at, updated_at";

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn save(&self, subscription: &Subscription) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO subscriptions (
                id, organization_id, provider, provider_subscription_id, provider_customer_id,
                plan, status, current_period_end, promo_code, canceled_at, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(subscription.id.as_uuid())
        .bind(subscription.organization_id.as_uuid())
        .bind(subscription.provider.as_str())
        .bind(&subscription.provider_subscription_id)
        .bind(&subscription.provider_customer_id)
        .bind(subscription.plan.as_str())
        .bind(subscription.status.as_str())
        .bind(subscription.current_period_end.as_ref().map(Timestamp::as_datetime))
        .bind(&subscription.promo_code)
        .bind(subscription.canceled_at.as_ref().map(Timestamp::as_datetime))
        .bind(subscription.created_at.as_datetime())
        .bind(subscription.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("subscriptions_organization_id_key") {
                    return DomainError::new(
                        ErrorCode::SubscriptionExists,
                        "Organization already has a subscription",
                    );
                }
            }
            DomainError::database(format!("Failed to save subscription: {}", e))
        })?;

        Ok(())
    }

    async fn update(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions SET
                provider = $2,
                provider_subscription_id = $3,
                provider_customer_id = $4,
                plan = $5,
                status = $6,
                current_period_end = $7,
                promo_code = $8,
                canceled_at = $9,
                updated_at = $10
            WHERE id = $1
            "#,
        )
        .bind(subscription.id.as_uuid())
        .bind(subscription.provider.as_str())
        .bind(&subscription.provider_subscription_id)
        .bind(&subscription.provider_customer_id)
        .bind(subscription.plan.as_str())
        .bind(subscription.status.as_str())
        .bind(subscription.current_period_end.as_ref().map(Timestamp::as_datetime))
        .bind(&subscription.promo_code)
        .bind(subscription.canceled_at.as_ref().map(Timestamp::as_datetime))
        .bind(subscription.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to update subscription: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(
                ErrorCode::SubscriptionNotFound,
                "Subscription",
            ));
        }
        Ok(())
    }

    async fn find_by_organization(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Option<Subscription>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM subscriptions WHERE organization_id = $1",
            SELECT_COLUMNS
        ))
        .bind(organization_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find subscription: {}", e)))?;

        row.map(Subscription::try_from).transpose()
    }

    async fn find_by_provider_subscription(
        &self,
        provider: BillingProvider,
        provider_subscription_id: &str,
    ) -> Result<Option<Subscription>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM subscriptions WHERE provider = $1 AND provider_subscription_id = $2",
            SELECT_COLUMNS
        ))
        .bind(provider.as_str())
        .bind(provider_subscription_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find subscription: {}", e)))?;

        row.map(Subscription::try_from).transpose()
    }

    async fn find_by_provider_customer(
        &self,
        provider: BillingProvider,
        provider_customer_id: &str,
    ) -> Result<Option<Subscription>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM subscriptions WHERE provider = $1 AND provider_customer_id = $2",
            SELECT_COLUMNS
        ))
        .bind(provider.as_str())
        .bind(provider_customer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find subscription: {}", e)))?;

        row.map(Subscription::try_from).transpose()
    }
}
