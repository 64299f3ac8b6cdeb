//! PostgreSQL implementation of PromoCodeRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};
use crate::domain::subscription::PromoCode;
use crate::ports::PromoCodeRepository;

/// PostgreSQL implementation of the PromoCodeRepository port.
pub struct PostgresPromoCodeRepository {
    pool: PgPool,
}

impl PostgresPromoCodeRepository {
    /// Creates a repository over the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PromoCodeRow {
    code: String,
    percent_off: Option<i16>,
    trial_days: Option<i32>,
    max_redemptions: Option<i32>,
    redemption_count: i32,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<PromoCodeRow> for PromoCode {
    type Error = DomainError;

    fn try_from(row: PromoCodeRow) -> Result<Self, Self::Error> {
        Ok(PromoCode {
            code: row.code,
            percent_off: row
                .percent_off
                .map(|p| {
                    u8::try_from(p).map_err(|_| {
                        DomainError::database(format!("percent_off out of range: {}", p))
                    })
                })
                .transpose()?,
            trial_days: row
                .trial_days
                .map(|d| {
                    u16::try_from(d).map_err(|_| {
                        DomainError::database(format!("trial_days out of range: {}", d))
                    })
                })
                .transpose()?,
            max_redemptions: row.max_redemptions,
            redemption_count: row.redemption_count,
            expires_at: row.expires_at.map(Timestamp::from_datetime),
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

const SELECT_COLUMNS: &str =
    "code, percent_off, trial_days, max_redemptions, redemption_count, expires_at, created_at";

#[async_trait]
impl PromoCodeRepository for PostgresPromoCodeRepository {
    async fn find_by_code(&self, code: &str) -> Result<Option<PromoCode>, DomainError> {
        let row: Option<PromoCodeRow> = sqlx::query_as(&format!(
            "SELECT {} FROM promo_codes WHERE code = $1",
            SELECT_COLUMNS
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find promo code: {}", e)))?;

        row.map(PromoCode::try_from).transpose()
    }

    async fn redeem(&self, code: &str) -> Result<PromoCode, DomainError> {
        // Check-and-increment in one statement so concurrent checkouts
        // cannot overspend the redemption budget.
        let row: Option<PromoCodeRow> = sqlx::query_as(&format!(
            r#"
            UPDATE promo_codes
            SET redemption_count = redemption_count + 1
            WHERE code = $1
              AND (expires_at IS NULL OR expires_at > NOW())
              AND (max_redemptions IS NULL OR redemption_count < max_redemptions)
            RETURNING {}
            "#,
            SELECT_COLUMNS
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to redeem promo code: {}", e)))?;

        if let Some(row) = row {
            return PromoCode::try_from(row);
        }

        // Distinguish why the guarded update matched nothing
        match self.find_by_code(code).await? {
            None => Err(DomainError::not_found(
                ErrorCode::PromoCodeNotFound,
                "Promo code",
            )),
            Some(promo) => {
                promo.check_redeemable(Timestamp::now())?;
                // Redeemable but the update missed: another transaction
                // consumed the last redemption between our two statements.
                Err(DomainError::new(
                    ErrorCode::PromoCodeExhausted,
                    format!("Promo code {} has no redemptions left", promo.code),
                ))
            }
        }
    }
}
