//! Merchant gateway port - Square API operations.
//!
//! Covers the OAuth token lifecycle for merchant connections and the
//! commerce passthrough calls the kiosk app makes with a merchant's token.
//! All amounts are integer minor units, as on the wire.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::gateway::GatewayError;
use crate::domain::connection::TokenGrant;

/// Port for the Square merchant API.
#[async_trait]
pub trait MerchantGateway: Send + Sync {
    /// Builds the hosted authorize URL carrying the given state token.
    fn authorize_url(&self, state_token: &str) -> String;

    /// Exchanges an authorization code for a token grant.
    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, GatewayError>;

    /// Obtains a fresh token grant from a refresh token.
    async fn refresh_tokens(&self, refresh_token: &str) -> Result<TokenGrant, GatewayError>;

    /// Revokes all tokens for a merchant.
    async fn revoke_access(&self, merchant_id: &str) -> Result<(), GatewayError>;

    /// Lists catalog items, one page per call.
    async fn list_catalog(
        &self,
        access_token: &str,
        cursor: Option<&str>,
    ) -> Result<CatalogPage, GatewayError>;

    /// Creates an order.
    async fn create_order(
        &self,
        access_token: &str,
        request: CreateOrderRequest,
    ) -> Result<Order, GatewayError>;

    /// Creates (and completes) a payment.
    async fn create_payment(
        &self,
        access_token: &str,
        request: CreatePaymentRequest,
    ) -> Result<Payment, GatewayError>;
}

/// Monetary amount in minor units with an ISO currency code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub amount: i64,
    pub currency: String,
}

impl Money {
    /// Creates an amount; the currency code is uppercased ASCII, 3 letters.
    pub fn new(amount: i64, currency: &str) -> Option<Self> {
        if currency.len() != 3 || !currency.bytes().all(|b| b.is_ascii_alphabetic()) {
            return None;
        }
        Some(Self {
            amount,
            currency: currency.to_ascii_uppercase(),
        })
    }
}

/// One page of catalog items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogPage {
    pub items: Vec<CatalogItem>,
    /// Opaque pagination cursor; absent on the last page.
    pub cursor: Option<String>,
}

/// A sellable catalog item with its variations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub variations: Vec<CatalogVariation>,
}

/// A purchasable variation of a catalog item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogVariation {
    pub id: String,
    pub name: String,
    pub price: Option<Money>,
}

/// Request to create an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub location_id: String,
    /// Kiosk-side reference for correlation.
    pub reference_id: Option<String>,
    pub line_items: Vec<OrderLineItem>,
}

/// One order line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLineItem {
    /// Catalog variation to sell; ad-hoc lines carry a name and price.
    pub catalog_object_id: Option<String>,
    pub name: Option<String>,
    pub quantity: u32,
    pub base_price: Option<Money>,
}

/// An order at the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub location_id: String,
    pub state: String,
    pub total: Money,
}

/// Request to create a payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePaymentRequest {
    /// Tokenized payment source from the client SDK.
    pub source_id: String,
    /// Client-supplied idempotency key; the handler generates one if absent.
    pub idempotency_key: String,
    pub amount: Money,
    pub order_id: Option<String>,
}

/// A payment at the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub status: String,
    pub amount: Money,
    pub order_id: Option<String>,
    pub receipt_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merchant_gateway_is_object_safe() {
        fn _accepts_dyn(_gateway: &dyn MerchantGateway) {}
    }

    #[test]
    fn money_normalizes_currency() {
        let money = Money::new(1250, "usd").unwrap();
        assert_eq!(money.amount, 1250);
        assert_eq!(money.currency, "USD");
    }

    #[test]
    fn money_rejects_bad_currency_codes() {
        assert!(Money::new(100, "US").is_none());
        assert!(Money::new(100, "USDC").is_none());
        assert!(Money::new(100, "U5D").is_none());
    }

    #[test]
    fn money_serde_roundtrip() {
        let money = Money::new(995, "EUR").unwrap();
        let json = serde_json::to_string(&money).unwrap();
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(money, back);
    }
}
