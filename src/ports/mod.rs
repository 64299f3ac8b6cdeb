//! Ports - Interfaces between the application core and the outside world.
//!
//! Repositories persist domain state; gateways reach the two payment
//! platforms. Adapters provide the implementations.

mod billing_gateway;
mod connection_repository;
mod device_repository;
mod gateway;
mod merchant_gateway;
mod oauth_state_repository;
mod promo_code_repository;
mod subscription_event_log;
mod subscription_repository;
mod webhook_event_repository;

pub use billing_gateway::{
    BillingGateway, CheckoutSession, CreateCheckoutRequest, PortalSession,
};
pub use connection_repository::ConnectionRepository;
pub use device_repository::DeviceRepository;
pub use gateway::{GatewayError, GatewayErrorCode};
pub use merchant_gateway::{
    CatalogItem, CatalogPage, CatalogVariation, CreateOrderRequest, CreatePaymentRequest,
    MerchantGateway, Money, Order, OrderLineItem, Payment,
};
pub use oauth_state_repository::OAuthStateRepository;
pub use promo_code_repository::PromoCodeRepository;
pub use subscription_event_log::SubscriptionEventLog;
pub use subscription_repository::SubscriptionRepository;
pub use webhook_event_repository::{
    SaveResult, WebhookEventRecord, WebhookEventRepository, WebhookResult,
};
