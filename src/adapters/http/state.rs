//! Shared application state for the HTTP layer.

use std::sync::Arc;

use crate::adapters::square::SquareWebhookVerifier;
use crate::adapters::stripe::StripeWebhookVerifier;
use crate::application::handlers::billing::{
    BillingWebhookDispatcher, BillingWebhookHandler, CancelSubscriptionHandler,
    CreateCheckoutHandler, CreatePortalHandler, GetSubscriptionHandler, ValidatePromoHandler,
};
use crate::application::handlers::commerce::{
    CreateOrderHandler, ListCatalogHandler, MerchantAccess, TakePaymentHandler,
};
use crate::application::handlers::devices::{
    HeartbeatDeviceHandler, ListDevicesHandler, RegisterDeviceHandler, RevokeDeviceHandler,
};
use crate::application::handlers::oauth::{
    BeginConnectHandler, CompleteConnectHandler, DisconnectHandler, RefreshConnectionHandler,
};
use crate::config::MobileConfig;
use crate::domain::webhook::IdempotentWebhookProcessor;
use crate::ports::{
    BillingGateway, ConnectionRepository, DeviceRepository, MerchantGateway,
    OAuthStateRepository, PromoCodeRepository, SubscriptionEventLog, SubscriptionRepository,
    WebhookEventRepository,
};

/// Shared application state containing all dependencies.
///
/// Cloned per request; every dependency is Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub connections: Arc<dyn ConnectionRepository>,
    pub oauth_states: Arc<dyn OAuthStateRepository>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub subscription_events: Arc<dyn SubscriptionEventLog>,
    pub promo_codes: Arc<dyn PromoCodeRepository>,
    pub devices: Arc<dyn DeviceRepository>,
    pub webhook_events: Arc<dyn WebhookEventRepository>,
    pub merchant_gateway: Arc<dyn MerchantGateway>,
    pub billing_gateway: Arc<dyn BillingGateway>,
    pub square_verifier: Arc<SquareWebhookVerifier>,
    pub stripe_verifier: Arc<StripeWebhookVerifier>,
    pub mobile: MobileConfig,
    pub checkout_success_url: String,
    pub checkout_cancel_url: String,
    pub portal_return_url: String,
}

impl AppState {
    // Handlers are constructed on demand from the shared state.

    pub fn begin_connect_handler(&self) -> BeginConnectHandler {
        BeginConnectHandler::new(self.oauth_states.clone(), self.merchant_gateway.clone())
    }

    pub fn complete_connect_handler(&self) -> CompleteConnectHandler {
        CompleteConnectHandler::new(
            self.oauth_states.clone(),
            self.connections.clone(),
            self.merchant_gateway.clone(),
        )
    }

    pub fn refresh_connection_handler(&self) -> RefreshConnectionHandler {
        RefreshConnectionHandler::new(self.connections.clone(), self.merchant_gateway.clone())
    }

    pub fn disconnect_handler(&self) -> DisconnectHandler {
        DisconnectHandler::new(self.connections.clone(), self.merchant_gateway.clone())
    }

    pub fn merchant_access(&self) -> Arc<MerchantAccess> {
        Arc::new(MerchantAccess::new(
            self.connections.clone(),
            self.merchant_gateway.clone(),
        ))
    }

    pub fn list_catalog_handler(&self) -> ListCatalogHandler {
        ListCatalogHandler::new(self.merchant_access(), self.merchant_gateway.clone())
    }

    pub fn create_order_handler(&self) -> CreateOrderHandler {
        CreateOrderHandler::new(self.merchant_access(), self.merchant_gateway.clone())
    }

    pub fn take_payment_handler(&self) -> TakePaymentHandler {
        TakePaymentHandler::new(self.merchant_access(), self.merchant_gateway.clone())
    }

    pub fn get_subscription_handler(&self) -> GetSubscriptionHandler {
        GetSubscriptionHandler::new(self.subscriptions.clone())
    }

    pub fn create_checkout_handler(&self) -> CreateCheckoutHandler {
        CreateCheckoutHandler::new(
            self.subscriptions.clone(),
            self.promo_codes.clone(),
            self.billing_gateway.clone(),
            self.checkout_success_url.clone(),
            self.checkout_cancel_url.clone(),
        )
    }

    pub fn create_portal_handler(&self) -> CreatePortalHandler {
        CreatePortalHandler::new(
            self.subscriptions.clone(),
            self.billing_gateway.clone(),
            self.portal_return_url.clone(),
        )
    }

    pub fn cancel_subscription_handler(&self) -> CancelSubscriptionHandler {
        CancelSubscriptionHandler::new(
            self.subscriptions.clone(),
            self.billing_gateway.clone(),
            self.subscription_events.clone(),
        )
    }

    pub fn validate_promo_handler(&self) -> ValidatePromoHandler {
        ValidatePromoHandler::new(self.promo_codes.clone())
    }

    pub fn register_device_handler(&self) -> RegisterDeviceHandler {
        RegisterDeviceHandler::new(self.devices.clone())
    }

    pub fn list_devices_handler(&self) -> ListDevicesHandler {
        ListDevicesHandler::new(self.devices.clone())
    }

    pub fn heartbeat_device_handler(&self) -> HeartbeatDeviceHandler {
        HeartbeatDeviceHandler::new(self.devices.clone())
    }

    pub fn revoke_device_handler(&self) -> RevokeDeviceHandler {
        RevokeDeviceHandler::new(self.devices.clone())
    }

    /// Builds the idempotent processor feeding the billing webhook handler.
    pub fn webhook_processor(
        &self,
    ) -> IdempotentWebhookProcessor<Arc<dyn WebhookEventRepository>, BillingWebhookDispatcher>
    {
        let handler = BillingWebhookHandler::new(
            self.subscriptions.clone(),
            self.promo_codes.clone(),
            self.subscription_events.clone(),
        );
        IdempotentWebhookProcessor::new(
            self.webhook_events.clone(),
            BillingWebhookDispatcher::new(handler),
        )
    }
}
