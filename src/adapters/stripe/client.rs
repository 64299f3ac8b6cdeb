//! Stripe REST client.
//!
//! Talks to the hosted-surface endpoints the billing flows need: Checkout
//! sessions, billing portal sessions, and subscription reads/cancellation.
//! Requests are form-encoded per Stripe's API conventions; the secret key
//! never leaves the `SecretString` except at the auth header.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Deserialize;

use crate::config::StripeConfig;
use crate::domain::foundation::Timestamp;
use crate::domain::subscription::{BillingPlan, RemoteSnapshot, RemoteStatus};
use crate::ports::{
    BillingGateway, CheckoutSession, CreateCheckoutRequest, GatewayError, PortalSession,
};

const DEFAULT_API_BASE: &str = "https://api.stripe.com";

/// Stripe implementation of the billing gateway.
pub struct StripeBillingGateway {
    config: StripeConfig,
    api_base_url: String,
    http: reqwest::Client,
}

impl StripeBillingGateway {
    /// Creates a gateway from configuration.
    pub fn new(config: StripeConfig) -> Self {
        Self {
            config,
            api_base_url: DEFAULT_API_BASE.to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Overrides the API base URL (for tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    fn price_id(&self, plan: BillingPlan) -> &str {
        match plan {
            BillingPlan::Monthly => &self.config.monthly_price_id,
            BillingPlan::Annual => &self.config.annual_price_id,
        }
    }

    async fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, String)],
    ) -> Result<T, GatewayError> {
        let response = self
            .http
            .post(format!("{}{}", self.api_base_url, path))
            .bearer_auth(self.config.api_key.expose_secret())
            .form(form)
            .send()
            .await
            .map_err(|e| GatewayError::network(e.to_string()))?;

        Self::decode(response).await
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        let response = self
            .http
            .get(format!("{}{}", self.api_base_url, path))
            .bearer_auth(self.config.api_key.expose_secret())
            .send()
            .await
            .map_err(|e| GatewayError::network(e.to_string()))?;

        Self::decode(response).await
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| GatewayError::provider(format!("malformed response: {}", e)));
        }

        let body = response.text().await.unwrap_or_default();
        let (message, provider_code) = match serde_json::from_str::<StripeErrorEnvelope>(&body) {
            Ok(envelope) => (envelope.error.message, envelope.error.code),
            Err(_) => (body, None),
        };

        tracing::warn!(status = %status, code = ?provider_code, "Stripe API error");

        let mut err = GatewayError::from_status(status.as_u16(), message);
        if let Some(code) = provider_code {
            err = err.with_provider_code(code);
        }
        Err(err)
    }
}

#[async_trait]
impl BillingGateway for StripeBillingGateway {
    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, GatewayError> {
        let mut form: Vec<(&str, String)> = vec![
            ("mode", "subscription".to_string()),
            ("line_items[0][price]", self.price_id(request.plan).to_string()),
            ("line_items[0][quantity]", "1".to_string()),
            ("client_reference_id", request.organization_id.to_string()),
            ("success_url", request.success_url),
            ("cancel_url", request.cancel_url),
        ];
        if let Some(code) = request.promo_code {
            // Campaign codes are mirrored as Stripe coupons with the same id
            form.push(("discounts[0][coupon]", code));
        }

        let session: StripeCheckoutSession =
            self.post_form("/v1/checkout/sessions", &form).await?;

        Ok(CheckoutSession {
            id: session.id,
            url: session.url.ok_or_else(|| {
                GatewayError::provider("checkout session missing redirect URL")
            })?,
            expires_at: Timestamp::from_unix(session.expires_at),
        })
    }

    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<PortalSession, GatewayError> {
        let form = [
            ("customer", customer_id.to_string()),
            ("return_url", return_url.to_string()),
        ];
        let session: StripePortalSession =
            self.post_form("/v1/billing_portal/sessions", &form).await?;

        Ok(PortalSession {
            id: session.id,
            url: session.url,
        })
    }

    async fn cancel_at_period_end(
        &self,
        subscription_id: &str,
    ) -> Result<RemoteSnapshot, GatewayError> {
        let form = [("cancel_at_period_end", "true".to_string())];
        let subscription: StripeSubscription = self
            .post_form(&format!("/v1/subscriptions/{}", subscription_id), &form)
            .await?;

        Ok(subscription.into_snapshot())
    }

    async fn fetch_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<RemoteSnapshot>, GatewayError> {
        match self
            .get::<StripeSubscription>(&format!("/v1/subscriptions/{}", subscription_id))
            .await
        {
            Ok(subscription) => Ok(Some(subscription.into_snapshot())),
            Err(err) if err.code == crate::ports::GatewayErrorCode::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Wire types
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
struct StripeCheckoutSession {
    id: String,
    url: Option<String>,
    expires_at: i64,
}

#[derive(Debug, Deserialize)]
struct StripePortalSession {
    id: String,
    url: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct StripeSubscription {
    pub id: String,
    pub customer: String,
    pub status: String,
    #[serde(default)]
    pub cancel_at_period_end: bool,
    pub canceled_at: Option<i64>,
    pub current_period_end: Option<i64>,
}

impl StripeSubscription {
    /// Maps Stripe's status vocabulary onto the provider-neutral one.
    pub fn into_snapshot(self) -> RemoteSnapshot {
        let status = match self.status.as_str() {
            "incomplete" => RemoteStatus::Incomplete,
            "incomplete_expired" => RemoteStatus::Deactivated,
            "trialing" => RemoteStatus::Trialing,
            "active" => RemoteStatus::Active,
            "past_due" => RemoteStatus::PastDue,
            "unpaid" => RemoteStatus::Unpaid,
            "paused" => RemoteStatus::Paused,
            "canceled" => RemoteStatus::Canceled,
            other => {
                tracing::warn!(status = other, "unrecognized Stripe subscription status");
                RemoteStatus::Unknown
            }
        };

        RemoteSnapshot {
            status,
            cancel_at: self.canceled_at.map(Timestamp::from_unix),
            cancel_at_period_end: self.cancel_at_period_end,
            current_period_end: self.current_period_end.map(Timestamp::from_unix),
        }
    }
}

#[derive(Debug, Deserialize)]
struct StripeErrorEnvelope {
    error: StripeErrorBody,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    message: String,
    code: Option<String>,
}
