//! Square REST client.
//!
//! Covers the OAuth token lifecycle (`/oauth2/*`) and the commerce calls
//! the kiosk passthrough endpoints forward (`/v2/catalog`, `/v2/orders`,
//! `/v2/payments`). OAuth calls authenticate with the application secret;
//! commerce calls carry the merchant's access token.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::config::SquareConfig;
use crate::domain::connection::TokenGrant;
use crate::domain::foundation::Timestamp;
use crate::ports::{
    CatalogItem, CatalogPage, CatalogVariation, CreateOrderRequest, CreatePaymentRequest,
    GatewayError, MerchantGateway, Money, Order, Payment,
};

/// Square implementation of the merchant gateway.
pub struct SquareMerchantGateway {
    config: SquareConfig,
    api_base_url: String,
    http: reqwest::Client,
}

impl SquareMerchantGateway {
    /// Creates a gateway from configuration.
    pub fn new(config: SquareConfig) -> Self {
        let api_base_url = config.api_base_url().to_string();
        Self {
            config,
            api_base_url,
            http: reqwest::Client::new(),
        }
    }

    /// Overrides the API base URL (for tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    async fn obtain_token(&self, body: ObtainTokenRequest<'_>) -> Result<TokenGrant, GatewayError> {
        let response = self
            .http
            .post(format!("{}/oauth2/token", self.api_base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = decode_error(status.as_u16(), &body);
            // Rejected grants are terminal for this token pair
            if status.as_u16() == 400 || status.as_u16() == 401 {
                return Err(GatewayError::grant_rejected(err.message)
                    .with_provider_code(err.provider_code.unwrap_or_default()));
            }
            return Err(err);
        }

        let token: ObtainTokenResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::provider(format!("malformed token response: {}", e)))?;

        let expires_at = DateTime::parse_from_rfc3339(&token.expires_at)
            .map_err(|e| GatewayError::provider(format!("bad expires_at: {}", e)))?
            .with_timezone(&Utc);

        Ok(TokenGrant {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at: Timestamp::from_datetime(expires_at),
            merchant_id: token.merchant_id,
            scopes: self.config.scope_list(),
        })
    }

    async fn send_json<B: Serialize, T: serde::de::DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        access_token: &str,
        body: Option<&B>,
    ) -> Result<T, GatewayError> {
        let mut request = self
            .http
            .request(method, format!("{}{}", self.api_base_url, path))
            .bearer_auth(access_token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, path, "Square API error");
            return Err(decode_error(status.as_u16(), &body));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| GatewayError::provider(format!("malformed response: {}", e)))
    }
}

#[async_trait]
impl MerchantGateway for SquareMerchantGateway {
    fn authorize_url(&self, state_token: &str) -> String {
        format!(
            "{}/oauth2/authorize?client_id={}&scope={}&session=false&state={}",
            self.api_base_url,
            self.config.application_id,
            self.config.scope_list().join("+"),
            state_token,
        )
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, GatewayError> {
        self.obtain_token(ObtainTokenRequest {
            client_id: &self.config.application_id,
            client_secret: self.config.application_secret.expose_secret(),
            grant_type: "authorization_code",
            code: Some(code),
            refresh_token: None,
            redirect_uri: Some(&self.config.redirect_url),
        })
        .await
    }

    async fn refresh_tokens(&self, refresh_token: &str) -> Result<TokenGrant, GatewayError> {
        self.obtain_token(ObtainTokenRequest {
            client_id: &self.config.application_id,
            client_secret: self.config.application_secret.expose_secret(),
            grant_type: "refresh_token",
            code: None,
            refresh_token: Some(refresh_token),
            redirect_uri: None,
        })
        .await
    }

    async fn revoke_access(&self, merchant_id: &str) -> Result<(), GatewayError> {
        let response = self
            .http
            .post(format!("{}/oauth2/revoke", self.api_base_url))
            .header(
                "Authorization",
                format!("Client {}", self.config.application_secret.expose_secret()),
            )
            .json(&serde_json::json!({
                "client_id": self.config.application_id,
                "merchant_id": merchant_id,
            }))
            .send()
            .await
            .map_err(|e| GatewayError::network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(decode_error(status.as_u16(), &body));
        }
        Ok(())
    }

    async fn list_catalog(
        &self,
        access_token: &str,
        cursor: Option<&str>,
    ) -> Result<CatalogPage, GatewayError> {
        let mut path = "/v2/catalog/list?types=ITEM".to_string();
        if let Some(cursor) = cursor {
            path.push_str("&cursor=");
            path.push_str(cursor);
        }

        let response: ListCatalogResponse = self
            .send_json::<(), _>(reqwest::Method::GET, &path, access_token, None)
            .await?;

        let items = response
            .objects
            .unwrap_or_default()
            .into_iter()
            .filter_map(catalog_object_to_item)
            .collect();

        Ok(CatalogPage {
            items,
            cursor: response.cursor,
        })
    }

    async fn create_order(
        &self,
        access_token: &str,
        request: CreateOrderRequest,
    ) -> Result<Order, GatewayError> {
        let body = serde_json::json!({
            "idempotency_key": uuid::Uuid::new_v4().to_string(),
            "order": {
                "location_id": request.location_id,
                "reference_id": request.reference_id,
                "line_items": request
                    .line_items
                    .iter()
                    .map(|line| {
                        serde_json::json!({
                            "catalog_object_id": line.catalog_object_id,
                            "name": line.name,
                            "quantity": line.quantity.to_string(),
                            "base_price_money": line.base_price.as_ref().map(money_to_wire),
                        })
                    })
                    .collect::<Vec<_>>(),
            },
        });

        let response: OrderEnvelope = self
            .send_json(reqwest::Method::POST, "/v2/orders", access_token, Some(&body))
            .await?;

        let order = response.order;
        Ok(Order {
            id: order.id,
            location_id: order.location_id,
            state: order.state.unwrap_or_else(|| "OPEN".to_string()),
            total: wire_to_money(order.total_money)?,
        })
    }

    async fn create_payment(
        &self,
        access_token: &str,
        request: CreatePaymentRequest,
    ) -> Result<Payment, GatewayError> {
        let body = serde_json::json!({
            "source_id": request.source_id,
            "idempotency_key": request.idempotency_key,
            "amount_money": money_to_wire(&request.amount),
            "order_id": request.order_id,
        });

        let response: PaymentEnvelope = self
            .send_json(reqwest::Method::POST, "/v2/payments", access_token, Some(&body))
            .await?;

        let payment = response.payment;
        Ok(Payment {
            id: payment.id,
            status: payment.status,
            amount: wire_to_money(payment.amount_money)?,
            order_id: payment.order_id,
            receipt_url: payment.receipt_url,
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Wire types
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
struct ObtainTokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect_uri: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ObtainTokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    /// RFC 3339 timestamp, per Square's OAuth API.
    expires_at: String,
    merchant_id: String,
}

#[derive(Debug, Deserialize)]
struct ListCatalogResponse {
    objects: Option<Vec<CatalogObjectWire>>,
    cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CatalogObjectWire {
    id: String,
    #[serde(rename = "type")]
    object_type: String,
    item_data: Option<ItemDataWire>,
}

#[derive(Debug, Deserialize)]
struct ItemDataWire {
    name: String,
    description: Option<String>,
    #[serde(default)]
    variations: Vec<CatalogObjectVariationWire>,
}

#[derive(Debug, Deserialize)]
struct CatalogObjectVariationWire {
    id: String,
    item_variation_data: Option<ItemVariationDataWire>,
}

#[derive(Debug, Deserialize)]
struct ItemVariationDataWire {
    name: Option<String>,
    price_money: Option<MoneyWire>,
}

#[derive(Debug, Serialize, Deserialize)]
struct MoneyWire {
    amount: i64,
    currency: String,
}

#[derive(Debug, Deserialize)]
struct OrderEnvelope {
    order: OrderWire,
}

#[derive(Debug, Deserialize)]
struct OrderWire {
    id: String,
    location_id: String,
    state: Option<String>,
    total_money: Option<MoneyWire>,
}

#[derive(Debug, Deserialize)]
struct PaymentEnvelope {
    payment: PaymentWire,
}

#[derive(Debug, Deserialize)]
struct PaymentWire {
    id: String,
    status: String,
    amount_money: Option<MoneyWire>,
    order_id: Option<String>,
    receipt_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    errors: Vec<ErrorWire>,
}

#[derive(Debug, Deserialize)]
struct ErrorWire {
    code: Option<String>,
    detail: Option<String>,
}

fn decode_error(status: u16, body: &str) -> GatewayError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) if !envelope.errors.is_empty() => {
            let first = &envelope.errors[0];
            let mut err = GatewayError::from_status(
                status,
                first.detail.clone().unwrap_or_else(|| "Square API error".to_string()),
            );
            if let Some(code) = &first.code {
                err = err.with_provider_code(code.clone());
            }
            err
        }
        _ => GatewayError::from_status(status, body.to_string()),
    }
}

fn money_to_wire(money: &Money) -> MoneyWire {
    MoneyWire {
        amount: money.amount,
        currency: money.currency.clone(),
    }
}

fn wire_to_money(wire: Option<MoneyWire>) -> Result<Money, GatewayError> {
    let wire = wire.ok_or_else(|| GatewayError::provider("response missing amount"))?;
    Money::new(wire.amount, &wire.currency)
        .ok_or_else(|| GatewayError::provider(format!("bad currency '{}'", wire.currency)))
}

fn catalog_object_to_item(object: CatalogObjectWire) -> Option<CatalogItem> {
    if object.object_type != "ITEM" {
        return None;
    }
    let item_data = object.item_data?;
    Some(CatalogItem {
        id: object.id,
        name: item_data.name,
        description: item_data.description,
        variations: item_data
            .variations
            .into_iter()
            .map(|variation| {
                let data = variation.item_variation_data;
                CatalogVariation {
                    id: variation.id,
                    name: data
                        .as_ref()
                        .and_then(|d| d.name.clone())
                        .unwrap_or_else(|| "Regular".to_string()),
                    price: data
                        .and_then(|d| d.price_money)
                        .and_then(|m| Money::new(m.amount, &m.currency)),
                }
            })
            .collect(),
    })
}
