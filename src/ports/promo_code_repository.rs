//! PromoCodeRepository port - Promo code storage.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::subscription::PromoCode;

/// Port for persisting promo codes.
#[async_trait]
pub trait PromoCodeRepository: Send + Sync {
    /// Finds a code by its normalized string.
    async fn find_by_code(&self, code: &str) -> Result<Option<PromoCode>, DomainError>;

    /// Atomically consumes one redemption.
    ///
    /// Returns the updated code, or an error when the code is missing,
    /// expired, or exhausted; the check-and-increment happens in one
    /// statement so concurrent checkouts cannot overspend the budget.
    async fn redeem(&self, code: &str) -> Result<PromoCode, DomainError>;
}
