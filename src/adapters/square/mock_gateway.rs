//! Mock merchant gateway for tests and local development.
//!
//! Behavior is steered through atomic flags; call counters let tests
//! assert how often the gateway was reached.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::connection::TokenGrant;
use crate::domain::foundation::Timestamp;
use crate::ports::{
    CatalogItem, CatalogPage, CreateOrderRequest, CreatePaymentRequest, GatewayError,
    GatewayErrorCode, MerchantGateway, Money, Order, Payment,
};

/// Configurable mock for the [`MerchantGateway`] port.
pub struct MockMerchantGateway {
    pub exchange_calls: AtomicU32,
    pub refresh_calls: AtomicU32,
    pub revoke_calls: AtomicU32,
    pub fail_exchange: AtomicBool,
    pub reject_refresh: AtomicBool,
    pub fail_revoke: AtomicBool,
    pub grant: Mutex<TokenGrant>,
}

impl MockMerchantGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            exchange_calls: AtomicU32::new(0),
            refresh_calls: AtomicU32::new(0),
            revoke_calls: AtomicU32::new(0),
            fail_exchange: AtomicBool::new(false),
            reject_refresh: AtomicBool::new(false),
            fail_revoke: AtomicBool::new(false),
            grant: Mutex::new(mock_token_grant()),
        })
    }

    /// Sets the grant returned by the next exchange/refresh.
    pub fn next_grant(&self, grant: TokenGrant) {
        *self.grant.lock().unwrap() = grant;
    }
}

/// The grant handed out unless overridden with [`MockMerchantGateway::next_grant`].
pub fn mock_token_grant() -> TokenGrant {
    TokenGrant {
        access_token: "sq0atp-access".to_string(),
        refresh_token: Some("sq0rtp-refresh".to_string()),
        expires_at: Timestamp::now().add_days(30),
        merchant_id: "ML4S1X".to_string(),
        scopes: vec!["ITEMS_READ".to_string(), "PAYMENTS_WRITE".to_string()],
    }
}

#[async_trait]
impl MerchantGateway for MockMerchantGateway {
    fn authorize_url(&self, state_token: &str) -> String {
        format!(
            "https://connect.squareupsandbox.com/oauth2/authorize?client_id=sq0idp-app&state={}",
            state_token
        )
    }

    async fn exchange_code(&self, _code: &str) -> Result<TokenGrant, GatewayError> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_exchange.load(Ordering::SeqCst) {
            return Err(GatewayError::grant_rejected("code rejected"));
        }
        Ok(self.grant.lock().unwrap().clone())
    }

    async fn refresh_tokens(&self, _refresh_token: &str) -> Result<TokenGrant, GatewayError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_refresh.load(Ordering::SeqCst) {
            return Err(GatewayError::grant_rejected("refresh token revoked"));
        }
        Ok(self.grant.lock().unwrap().clone())
    }

    async fn revoke_access(&self, _merchant_id: &str) -> Result<(), GatewayError> {
        self.revoke_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_revoke.load(Ordering::SeqCst) {
            return Err(GatewayError::new(
                GatewayErrorCode::ProviderError,
                "revoke failed",
            ));
        }
        Ok(())
    }

    async fn list_catalog(
        &self,
        _access_token: &str,
        cursor: Option<&str>,
    ) -> Result<CatalogPage, GatewayError> {
        Ok(CatalogPage {
            items: vec![CatalogItem {
                id: "ITEM1".to_string(),
                name: "Espresso".to_string(),
                description: None,
                variations: vec![],
            }],
            cursor: cursor.map(|_| "next".to_string()),
        })
    }

    async fn create_order(
        &self,
        _access_token: &str,
        request: CreateOrderRequest,
    ) -> Result<Order, GatewayError> {
        Ok(Order {
            id: "ORDER1".to_string(),
            location_id: request.location_id,
            state: "OPEN".to_string(),
            total: Money::new(700, "USD").expect("static currency"),
        })
    }

    async fn create_payment(
        &self,
        _access_token: &str,
        request: CreatePaymentRequest,
    ) -> Result<Payment, GatewayError> {
        Ok(Payment {
            id: "PAY1".to_string(),
            status: "COMPLETED".to_string(),
            amount: request.amount,
            order_id: request.order_id,
            receipt_url: None,
        })
    }
}
