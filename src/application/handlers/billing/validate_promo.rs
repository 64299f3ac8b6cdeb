//! ValidatePromoHandler - Checks a promo code before checkout.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};
use crate::domain::subscription::PromoCode;
use crate::ports::PromoCodeRepository;

/// Query to validate a raw promo code string.
#[derive(Debug, Clone)]
pub struct ValidatePromoQuery {
    pub code: String,
}

/// Handler returning the promo terms when the code is redeemable.
pub struct ValidatePromoHandler {
    promo_codes: Arc<dyn PromoCodeRepository>,
}

impl ValidatePromoHandler {
    pub fn new(promo_codes: Arc<dyn PromoCodeRepository>) -> Self {
        Self { promo_codes }
    }

    pub async fn handle(&self, query: ValidatePromoQuery) -> Result<PromoCode, DomainError> {
        let code = PromoCode::normalize(&query.code)?;
        let promo = self
            .promo_codes
            .find_by_code(&code)
            .await?
            .ok_or_else(|| DomainError::not_found(ErrorCode::PromoCodeNotFound, "Promo code"))?;

        promo.check_redeemable(Timestamp::now())?;
        Ok(promo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::{promo, InMemoryPromoCodeRepository};

    #[tokio::test]
    async fn valid_code_returns_terms() {
        let handler = ValidatePromoHandler::new(InMemoryPromoCodeRepository::with(promo(
            "LAUNCH2026-K7M3QA",
        )));

        let result = handler
            .handle(ValidatePromoQuery {
                code: "launch2026-k7m3qa".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(result.percent_off, Some(20));
    }

    #[tokio::test]
    async fn malformed_code_fails_validation() {
        let handler = ValidatePromoHandler::new(InMemoryPromoCodeRepository::new());

        let err = handler
            .handle(ValidatePromoQuery {
                code: "garbage".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::InvalidFormat);
    }

    #[tokio::test]
    async fn expired_code_is_rejected() {
        let mut expired = promo("LAUNCH2026-K7M3QA");
        expired.expires_at = Some(Timestamp::now().add_days(-1));
        let handler = ValidatePromoHandler::new(InMemoryPromoCodeRepository::with(expired));

        let err = handler
            .handle(ValidatePromoQuery {
                code: "LAUNCH2026-K7M3QA".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::PromoCodeExpired);
    }
}
