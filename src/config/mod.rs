//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Values are read with the `TILLBRIDGE`
//! prefix and `__` (double underscore) separating nested sections.
//!
//! # Example
//!
//! ```no_run
//! use tillbridge::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {}", config.server.socket_addr());
//! ```

mod database;
mod error;
mod mobile;
mod server;
mod square;
mod stripe;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use mobile::MobileConfig;
pub use server::{Environment, ServerConfig};
pub use square::SquareConfig;
pub use stripe::StripeConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Contains all configuration sections for the Tillbridge service.
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    pub database: DatabaseConfig,

    /// Square configuration (merchant OAuth + commerce APIs)
    pub square: SquareConfig,

    /// Stripe configuration (platform billing)
    pub stripe: StripeConfig,

    /// Mobile app configuration (URL-scheme redirects)
    #[serde(default)]
    pub mobile: MobileConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with the `TILLBRIDGE` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `TILLBRIDGE__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `TILLBRIDGE__DATABASE__URL=...` -> `database.url = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("TILLBRIDGE")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.square.validate(&self.server.environment)?;
        self.stripe.validate()?;
        self.mobile.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
