//! Stripe configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

/// Stripe configuration (platform billing)
#[derive(Debug, Clone, Deserialize)]
pub struct StripeConfig {
    /// Stripe secret API key (sk_test_... or sk_live_...)
    pub api_key: SecretString,

    /// Stripe webhook signing secret (whsec_...)
    pub webhook_secret: SecretString,

    /// Price id for the monthly plan
    pub monthly_price_id: String,

    /// Price id for the annual plan
    pub annual_price_id: String,

    /// URL the hosted checkout returns to on success
    #[serde(default = "default_checkout_return_url")]
    pub checkout_return_url: String,

    /// URL the billing portal returns to
    #[serde(default = "default_portal_return_url")]
    pub portal_return_url: String,
}

impl StripeConfig {
    /// Check if using Stripe test mode
    pub fn is_test_mode(&self) -> bool {
        self.api_key.expose_secret().starts_with("sk_test_")
    }

    /// Validate Stripe configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        let api_key = self.api_key.expose_secret();
        if api_key.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_API_KEY"));
        }
        if !api_key.starts_with("sk_") {
            return Err(ValidationError::InvalidStripeKey);
        }

        let webhook_secret = self.webhook_secret.expose_secret();
        if webhook_secret.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_WEBHOOK_SECRET"));
        }
        if !webhook_secret.starts_with("whsec_") {
            return Err(ValidationError::InvalidStripeWebhookSecret);
        }

        if self.monthly_price_id.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_MONTHLY_PRICE_ID"));
        }
        if self.annual_price_id.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_ANNUAL_PRICE_ID"));
        }
        Ok(())
    }
}

fn default_checkout_return_url() -> String {
    "https://billing.tillbridge.app/checkout/done".to_string()
}

fn default_portal_return_url() -> String {
    "https://billing.tillbridge.app/portal/done".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> StripeConfig {
        StripeConfig {
            api_key: SecretString::new("sk_test_abcd1234".to_string()),
            webhook_secret: SecretString::new("whsec_xyz789".to_string()),
            monthly_price_id: "price_monthly".to_string(),
            annual_price_id: "price_annual".to_string(),
            checkout_return_url: default_checkout_return_url(),
            portal_return_url: default_portal_return_url(),
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(config().validate().is_ok());
        assert!(config().is_test_mode());
    }

    #[test]
    fn wrong_key_prefix_rejected() {
        let mut config = config();
        config.api_key = SecretString::new("pk_test_abcd".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn wrong_webhook_secret_prefix_rejected() {
        let mut config = config();
        config.webhook_secret = SecretString::new("secret_xyz".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_price_ids_rejected() {
        let mut config = config();
        config.monthly_price_id = String::new();
        assert!(config.validate().is_err());
    }
}
