//! Stripe webhook verification and normalization.
//!
//! Verifies the `Stripe-Signature` header (HMAC-SHA256 over
//! `"{timestamp}.{body}"`, hex-encoded, constant-time compared, with a
//! replay window) and normalizes the event into a [`ProviderEvent`].

use hmac::{Hmac, Mac};
use secrecy::ExposeSecret;
use serde::Deserialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::client::StripeSubscription;
use crate::config::StripeConfig;
use crate::domain::foundation::Timestamp;
use crate::domain::subscription::BillingProvider;
use crate::domain::webhook::{EventKind, ProviderEvent, WebhookError};

type HmacSha256 = Hmac<Sha256>;

/// Maximum allowed age for webhook events (5 minutes).
const MAX_EVENT_AGE_SECS: i64 = 300;

/// Maximum allowed clock skew for future events (1 minute).
const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// Parsed components from the Stripe-Signature header.
///
/// Format: `t=<timestamp>,v1=<signature>[,v0=<legacy>]`. Unknown fields
/// are ignored for forward compatibility.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SignatureHeader {
    timestamp: i64,
    v1_signature: Vec<u8>,
}

impl SignatureHeader {
    fn parse(header: &str) -> Result<Self, WebhookError> {
        let mut timestamp: Option<i64> = None;
        let mut v1_signature: Option<Vec<u8>> = None;

        for part in header.split(',') {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| WebhookError::ParseError("invalid header format".to_string()))?;

            match key {
                "t" => {
                    timestamp = Some(value.parse().map_err(|_| {
                        WebhookError::ParseError("invalid timestamp".to_string())
                    })?);
                }
                "v1" => {
                    v1_signature = Some(hex::decode(value).map_err(|_| {
                        WebhookError::ParseError("invalid v1 signature hex".to_string())
                    })?);
                }
                _ => {}
            }
        }

        Ok(SignatureHeader {
            timestamp: timestamp
                .ok_or_else(|| WebhookError::ParseError("missing timestamp".to_string()))?,
            v1_signature: v1_signature
                .ok_or_else(|| WebhookError::ParseError("missing v1 signature".to_string()))?,
        })
    }
}

/// Verifier for Stripe webhook deliveries.
pub struct StripeWebhookVerifier {
    config: StripeConfig,
}

impl StripeWebhookVerifier {
    /// Creates a verifier from configuration.
    pub fn new(config: StripeConfig) -> Self {
        Self { config }
    }

    /// Verifies the signature and normalizes the event.
    ///
    /// # Verification Steps
    ///
    /// 1. Parse the signature header
    /// 2. Validate the timestamp window (replay protection)
    /// 3. Compute the expected HMAC and compare constant-time
    /// 4. Parse and normalize the JSON payload
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<ProviderEvent, WebhookError> {
        let header = SignatureHeader::parse(signature_header)?;

        self.validate_timestamp(header.timestamp)?;

        let expected = self.compute_signature(header.timestamp, payload);
        if expected.len() != header.v1_signature.len()
            || expected.ct_eq(&header.v1_signature).unwrap_u8() != 1
        {
            tracing::warn!("Stripe webhook signature mismatch");
            return Err(WebhookError::InvalidSignature);
        }

        let event: StripeEvent = serde_json::from_slice(payload)
            .map_err(|e| WebhookError::ParseError(e.to_string()))?;

        normalize(event)
    }

    fn validate_timestamp(&self, timestamp: i64) -> Result<(), WebhookError> {
        let now = chrono::Utc::now().timestamp();
        let age = now - timestamp;

        if age > MAX_EVENT_AGE_SECS || age < -MAX_CLOCK_SKEW_SECS {
            tracing::warn!(
                event_timestamp = timestamp,
                current_time = now,
                "Stripe webhook timestamp outside acceptance window"
            );
            return Err(WebhookError::TimestampOutOfRange);
        }
        Ok(())
    }

    fn compute_signature(&self, timestamp: i64, payload: &[u8]) -> Vec<u8> {
        let signed_payload = format!("{}.{}", timestamp, String::from_utf8_lossy(payload));

        let mut mac = HmacSha256::new_from_slice(
            self.config.webhook_secret.expose_secret().as_bytes(),
        )
        .expect("HMAC accepts any key size");
        mac.update(signed_payload.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Wire types and normalization
// ════════════════════════════════════════════════════════════════════════════

/// Stripe webhook event (only the fields we act on).
#[derive(Debug, Deserialize)]
struct StripeEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    created: i64,
    data: StripeEventData,
}

#[derive(Debug, Deserialize)]
struct StripeEventData {
    object: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct CheckoutSessionObject {
    customer: Option<String>,
    subscription: Option<String>,
    client_reference_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InvoiceObject {
    customer: Option<String>,
    subscription: Option<String>,
}

fn normalize(event: StripeEvent) -> Result<ProviderEvent, WebhookError> {
    let payload = serde_json::json!({
        "id": event.id.clone(),
        "type": event.event_type.clone(),
        "created": event.created,
        "data": { "object": event.data.object.clone() },
    });

    let kind = match event.event_type.as_str() {
        "checkout.session.completed" => EventKind::CheckoutCompleted,
        "customer.subscription.created" => EventKind::SubscriptionCreated,
        "customer.subscription.updated"
        | "customer.subscription.paused"
        | "customer.subscription.resumed" => EventKind::SubscriptionUpdated,
        "customer.subscription.deleted" => EventKind::SubscriptionCanceled,
        "invoice.paid" | "invoice.payment_succeeded" => EventKind::InvoicePaid,
        "invoice.payment_failed" => EventKind::InvoicePaymentFailed,
        _ => EventKind::Unknown,
    };

    let mut normalized = ProviderEvent {
        provider: BillingProvider::Stripe,
        event_id: event.id,
        event_type: event.event_type,
        kind,
        organization_ref: None,
        provider_customer_id: None,
        provider_subscription_id: None,
        snapshot: None,
        created_at: Timestamp::from_unix(event.created),
        payload,
    };

    match kind {
        EventKind::CheckoutCompleted => {
            let session: CheckoutSessionObject =
                serde_json::from_value(event.data.object).map_err(|e| {
                    WebhookError::ParseError(format!("checkout session object: {}", e))
                })?;
            normalized.organization_ref = session.client_reference_id;
            normalized.provider_customer_id = session.customer;
            normalized.provider_subscription_id = session.subscription;
        }
        EventKind::SubscriptionCreated
        | EventKind::SubscriptionUpdated
        | EventKind::SubscriptionCanceled => {
            let subscription: StripeSubscription = serde_json::from_value(event.data.object)
                .map_err(|e| {
                    WebhookError::ParseError(format!("subscription object: {}", e))
                })?;
            normalized.provider_subscription_id = Some(subscription.id.clone());
            normalized.provider_customer_id = Some(subscription.customer.clone());
            normalized.snapshot = Some(subscription.into_snapshot());
        }
        EventKind::InvoicePaid | EventKind::InvoicePaymentFailed => {
            let invoice: InvoiceObject = serde_json::from_value(event.data.object)
                .map_err(|e| WebhookError::ParseError(format!("invoice object: {}", e)))?;
            normalized.provider_customer_id = invoice.customer;
            normalized.provider_subscription_id = invoice.subscription;
        }
        EventKind::Unknown => {}
    }

    Ok(normalized)
}

#[cfg(test)]
pub(crate) fn compute_test_signature(secret: &str, timestamp: i64, payload: &str) -> String {
    let signed_payload = format!("{}.{}", timestamp, payload);
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key size");
    mac.update(signed_payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
