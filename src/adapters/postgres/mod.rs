//! PostgreSQL adapters - sqlx implementations of the repository ports.
//!
//! Each repository wraps the shared `PgPool` and maps rows to domain
//! types through private row structs.

mod connection_repository;
mod device_repository;
mod oauth_state_repository;
mod promo_code_repository;
mod subscription_event_log;
mod subscription_repository;
mod webhook_event_repository;

pub use connection_repository::PostgresConnectionRepository;
pub use device_repository::PostgresDeviceRepository;
pub use oauth_state_repository::PostgresOAuthStateRepository;
pub use promo_code_repository::PostgresPromoCodeRepository;
pub use subscription_event_log::PostgresSubscriptionEventLog;
pub use subscription_repository::PostgresSubscriptionRepository;
pub use webhook_event_repository::PostgresWebhookEventRepository;
