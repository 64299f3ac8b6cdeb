//! Square configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;
use super::server::Environment;

/// Square configuration (merchant OAuth + commerce APIs)
#[derive(Debug, Clone, Deserialize)]
pub struct SquareConfig {
    /// Square application id
    pub application_id: String,

    /// Square application secret (OAuth client secret)
    pub application_secret: SecretString,

    /// Webhook signature key from the Square developer dashboard
    pub webhook_signature_key: SecretString,

    /// OAuth redirect URL registered with the application
    pub redirect_url: String,

    /// Public webhook URL exactly as registered in the Square dashboard.
    /// The signature covers this URL, so a mismatch fails verification.
    pub webhook_notification_url: String,

    /// Square environment: "sandbox" or "production"
    #[serde(default = "default_environment")]
    pub environment: String,

    /// OAuth scopes requested during authorization
    #[serde(default = "default_scopes")]
    pub scopes: String,
}

impl SquareConfig {
    /// Base URL for the Square API in the configured environment
    pub fn api_base_url(&self) -> &'static str {
        if self.is_sandbox() {
            "https://connect.squareupsandbox.com"
        } else {
            "https://connect.squareup.com"
        }
    }

    /// Check if pointed at the sandbox environment
    pub fn is_sandbox(&self) -> bool {
        self.environment == "sandbox"
    }

    /// OAuth scopes as a list
    pub fn scope_list(&self) -> Vec<String> {
        self.scopes
            .split(' ')
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect()
    }

    /// Validate Square configuration
    pub fn validate(&self, server_env: &Environment) -> Result<(), ValidationError> {
        if self.application_id.is_empty() {
            return Err(ValidationError::MissingRequired("SQUARE_APPLICATION_ID"));
        }
        if self.application_secret.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("SQUARE_APPLICATION_SECRET"));
        }
        if self.webhook_signature_key.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired(
                "SQUARE_WEBHOOK_SIGNATURE_KEY",
            ));
        }
        if self.environment != "sandbox" && self.environment != "production" {
            return Err(ValidationError::InvalidSquareEnvironment);
        }
        if self.redirect_url.is_empty() {
            return Err(ValidationError::MissingRequired("SQUARE_REDIRECT_URL"));
        }
        if self.webhook_notification_url.is_empty() {
            return Err(ValidationError::MissingRequired(
                "SQUARE_WEBHOOK_NOTIFICATION_URL",
            ));
        }
        if *server_env == Environment::Production && !self.redirect_url.starts_with("https://") {
            return Err(ValidationError::RedirectUrlMustBeHttps);
        }
        Ok(())
    }
}

fn default_environment() -> String {
    "sandbox".to_string()
}

fn default_scopes() -> String {
    "MERCHANT_PROFILE_READ ITEMS_READ ORDERS_WRITE PAYMENTS_WRITE SUBSCRIPTIONS_READ".to_string()
}
