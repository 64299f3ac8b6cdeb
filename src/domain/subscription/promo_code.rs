//! Promo code entity.
//!
//! Codes are distributed in campaigns and entered in the kiosk app during
//! checkout. Format: PREFIX-SUFFIX (e.g. LAUNCH2026-K7M3QA).
//!
//! # Validation Rules
//!
//! - PREFIX: 4-20 uppercase alphanumeric characters
//! - SUFFIX: 6 uppercase alphanumeric characters
//! - Codes normalize to uppercase before lookup

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, ValidationError};

/// A promotional code with its discount terms and redemption budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromoCode {
    /// The normalized code string (uppercase, PREFIX-SUFFIX).
    pub code: String,
    /// Percentage discount applied to the subscription price.
    pub percent_off: Option<u8>,
    /// Free trial days granted before the first charge.
    pub trial_days: Option<u16>,
    /// Redemption ceiling; `None` means unlimited.
    pub max_redemptions: Option<i32>,
    /// Redemptions so far.
    pub redemption_count: i32,
    /// Last moment the code can be redeemed; `None` means no deadline.
    pub expires_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl PromoCode {
    /// Normalizes and validates a raw code string.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the code is empty, lacks exactly one
    /// hyphen, has an out-of-size prefix or suffix, or contains
    /// non-alphanumeric characters.
    pub fn normalize(raw: &str) -> Result<String, ValidationError> {
        if raw.is_empty() {
            return Err(ValidationError::empty_field("promo_code"));
        }

        let normalized = raw.trim().to_uppercase();
        let (prefix, suffix) = normalized.split_once('-').ok_or_else(|| {
            ValidationError::invalid_format(
                "promo_code",
                format!("expected format PREFIX-SUFFIX, got '{}'", normalized),
            )
        })?;

        if suffix.contains('-') {
            return Err(ValidationError::invalid_format(
                "promo_code",
                "expected exactly one hyphen",
            ));
        }

        if prefix.len() < 4 || prefix.len() > 20 {
            return Err(ValidationError::out_of_range(
                "promo_code_prefix_length",
                4,
                20,
                prefix.len() as i64,
            ));
        }

        if suffix.len() != 6 {
            return Err(ValidationError::out_of_range(
                "promo_code_suffix_length",
                6,
                6,
                suffix.len() as i64,
            ));
        }

        if !prefix.chars().all(|c| c.is_ascii_alphanumeric())
            || !suffix.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(ValidationError::invalid_format(
                "promo_code",
                "alphanumeric characters only",
            ));
        }

        Ok(normalized)
    }

    /// Checks whether the code can be redeemed right now.
    pub fn check_redeemable(&self, now: Timestamp) -> Result<(), DomainError> {
        if let Some(expires_at) = self.expires_at {
            if !expires_at.is_after(&now) {
                return Err(DomainError::new(
                    ErrorCode::PromoCodeExpired,
                    format!("Promo code {} expired", self.code),
                ));
            }
        }
        if let Some(max) = self.max_redemptions {
            if self.redemption_count >= max {
                return Err(DomainError::new(
                    ErrorCode::PromoCodeExhausted,
                    format!("Promo code {} has no redemptions left", self.code),
                ));
            }
        }
        Ok(())
    }

    /// Consumes one redemption.
    pub fn redeem(&mut self, now: Timestamp) -> Result<(), DomainError> {
        self.check_redeemable(now)?;
        self.redemption_count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn code() -> PromoCode {
        PromoCode {
            code: "LAUNCH2026-K7M3QA".to_string(),
            percent_off: Some(20),
            trial_days: None,
            max_redemptions: Some(2),
            redemption_count: 0,
            expires_at: Some(Timestamp::now().add_days(30)),
            created_at: Timestamp::now(),
        }
    }

    #[test]
    fn normalize_uppercases_and_trims() {
        assert_eq!(
            PromoCode::normalize(" launch2026-k7m3qa ").unwrap(),
            "LAUNCH2026-K7M3QA"
        );
    }

    #[test]
    fn normalize_rejects_bad_shapes() {
        assert!(PromoCode::normalize("").is_err());
        assert!(PromoCode::normalize("NOHYPHEN").is_err());
        assert!(PromoCode::normalize("TWO-HY-PHENS1").is_err());
        assert!(PromoCode::normalize("ABC-K7M3QA").is_err()); // prefix too short
        assert!(PromoCode::normalize("LAUNCH2026-K7M3").is_err()); // suffix too short
        assert!(PromoCode::normalize("LAUNCH 26-K7M3QA").is_err()); // space in prefix
    }

    #[test]
    fn redeem_counts_down_budget() {
        let now = Timestamp::now();
        let mut promo = code();

        promo.redeem(now).unwrap();
        promo.redeem(now).unwrap();
        assert_eq!(promo.redemption_count, 2);

        let err = promo.redeem(now).unwrap_err();
        assert_eq!(err.code, ErrorCode::PromoCodeExhausted);
        assert_eq!(promo.redemption_count, 2);
    }

    #[test]
    fn expired_code_cannot_redeem() {
        let now = Timestamp::now();
        let mut promo = code();
        promo.expires_at = Some(now.add_days(-1));

        let err = promo.redeem(now).unwrap_err();
        assert_eq!(err.code, ErrorCode::PromoCodeExpired);
    }

    #[test]
    fn unlimited_code_keeps_redeeming() {
        let now = Timestamp::now();
        let mut promo = code();
        promo.max_redemptions = None;
        promo.expires_at = None;

        for _ in 0..100 {
            promo.redeem(now).unwrap();
        }
        assert_eq!(promo.redemption_count, 100);
    }

    proptest! {
        /// Normalization is idempotent: a normalized code normalizes to itself.
        #[test]
        fn normalize_is_idempotent(
            prefix in "[A-Z0-9]{4,20}",
            suffix in "[A-Z0-9]{6}",
        ) {
            let raw = format!("{}-{}", prefix, suffix);
            let once = PromoCode::normalize(&raw).unwrap();
            let twice = PromoCode::normalize(&once).unwrap();
            prop_assert_eq!(once, twice);
        }
    }
}
