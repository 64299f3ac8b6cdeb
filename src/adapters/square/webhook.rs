//! Square webhook verification and normalization.
//!
//! Square signs deliveries with HMAC-SHA256 over the notification URL
//! concatenated with the raw body, base64-encoded in the
//! `x-square-hmacsha256-signature` header. The scheme has no timestamp
//! component, so there is no replay window to enforce here; the dedupe
//! store absorbs replays instead.

use base64::Engine;
use chrono::{DateTime, NaiveDate, Utc};
use hmac::{Hmac, Mac};
use secrecy::ExposeSecret;
use serde::Deserialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::config::SquareConfig;
use crate::domain::foundation::Timestamp;
use crate::domain::subscription::{BillingProvider, RemoteSnapshot, RemoteStatus};
use crate::domain::webhook::{EventKind, ProviderEvent, WebhookError};

type HmacSha256 = Hmac<Sha256>;

/// Verifier for Square webhook deliveries.
pub struct SquareWebhookVerifier {
    config: SquareConfig,
}

impl SquareWebhookVerifier {
    /// Creates a verifier from configuration.
    pub fn new(config: SquareConfig) -> Self {
        Self { config }
    }

    /// Verifies the signature and normalizes the event.
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<ProviderEvent, WebhookError> {
        let provided = base64::engine::general_purpose::STANDARD
            .decode(signature_header.trim())
            .map_err(|_| WebhookError::ParseError("signature is not valid base64".to_string()))?;

        let expected = self.compute_signature(payload);
        if expected.len() != provided.len() || expected.ct_eq(&provided).unwrap_u8() != 1 {
            tracing::warn!("Square webhook signature mismatch");
            return Err(WebhookError::InvalidSignature);
        }

        let event: SquareEvent = serde_json::from_slice(payload)
            .map_err(|e| WebhookError::ParseError(e.to_string()))?;

        normalize(event)
    }

    /// HMAC-SHA256 over notification URL + body, per Square's scheme.
    fn compute_signature(&self, payload: &[u8]) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(
            self.config.webhook_signature_key.expose_secret().as_bytes(),
        )
        .expect("HMAC accepts any key size");
        mac.update(self.config.webhook_notification_url.as_bytes());
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Wire types and normalization
// ════════════════════════════════════════════════════════════════════════════

/// Square webhook event (only the fields we act on).
#[derive(Debug, Deserialize)]
struct SquareEvent {
    event_id: String,
    #[serde(rename = "type")]
    event_type: String,
    created_at: String,
    data: SquareEventData,
}

#[derive(Debug, Deserialize)]
struct SquareEventData {
    object: serde_json::Value,
}

/// Square subscription object, as embedded in webhook payloads.
#[derive(Debug, Deserialize)]
struct SquareSubscription {
    id: String,
    customer_id: Option<String>,
    status: String,
    /// Date-only string (YYYY-MM-DD) set when cancellation is scheduled.
    canceled_date: Option<String>,
    /// Date-only string; the end of the paid-through period.
    charged_through_date: Option<String>,
}

impl SquareSubscription {
    /// Maps Square's status vocabulary onto the provider-neutral one.
    fn snapshot(&self) -> RemoteSnapshot {
        let status = match self.status.as_str() {
            "PENDING" => RemoteStatus::Incomplete,
            "ACTIVE" => RemoteStatus::Active,
            "PAUSED" => RemoteStatus::Paused,
            "CANCELED" => RemoteStatus::Canceled,
            "DEACTIVATED" => RemoteStatus::Deactivated,
            other => {
                tracing::warn!(status = other, "unrecognized Square subscription status");
                RemoteStatus::Unknown
            }
        };

        RemoteSnapshot {
            status,
            cancel_at: self.canceled_date.as_deref().and_then(parse_date),
            cancel_at_period_end: false,
            current_period_end: self.charged_through_date.as_deref().and_then(parse_date),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SquareInvoice {
    subscription_id: Option<String>,
    primary_recipient: Option<SquareInvoiceRecipient>,
}

#[derive(Debug, Deserialize)]
struct SquareInvoiceRecipient {
    customer_id: Option<String>,
}

/// Parses Square's date-only fields to midnight UTC.
fn parse_date(date: &str) -> Option<Timestamp> {
    let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    let datetime = parsed.and_hms_opt(0, 0, 0)?.and_utc();
    Some(Timestamp::from_datetime(datetime))
}

fn normalize(event: SquareEvent) -> Result<ProviderEvent, WebhookError> {
    let created_at = DateTime::parse_from_rfc3339(&event.created_at)
        .map(|dt| Timestamp::from_datetime(dt.with_timezone(&Utc)))
        .map_err(|e| WebhookError::ParseError(format!("bad created_at: {}", e)))?;

    let payload = serde_json::json!({
        "event_id": event.event_id.clone(),
        "type": event.event_type.clone(),
        "created_at": event.created_at.clone(),
        "data": { "object": event.data.object.clone() },
    });

    let kind = match event.event_type.as_str() {
        "subscription.created" => EventKind::SubscriptionCreated,
        "subscription.updated" => EventKind::SubscriptionUpdated,
        "invoice.payment_made" => EventKind::InvoicePaid,
        "invoice.scheduled_charge_failed" => EventKind::InvoicePaymentFailed,
        _ => EventKind::Unknown,
    };

    let mut normalized = ProviderEvent {
        provider: BillingProvider::Square,
        event_id: event.event_id,
        event_type: event.event_type,
        kind,
        organization_ref: None,
        provider_customer_id: None,
        provider_subscription_id: None,
        snapshot: None,
        created_at,
        payload,
    };

    match kind {
        EventKind::SubscriptionCreated | EventKind::SubscriptionUpdated => {
            let subscription: SquareSubscription =
                serde_json::from_value(event.data.object["subscription"].clone()).map_err(|e| {
                    WebhookError::ParseError(format!("subscription object: {}", e))
                })?;
            normalized.snapshot = Some(subscription.snapshot());
            normalized.provider_customer_id = subscription.customer_id;
            normalized.provider_subscription_id = Some(subscription.id);
        }
        EventKind::InvoicePaid | EventKind::InvoicePaymentFailed => {
            let invoice: SquareInvoice =
                serde_json::from_value(event.data.object["invoice"].clone())
                    .map_err(|e| WebhookError::ParseError(format!("invoice object: {}", e)))?;
            normalized.provider_subscription_id = invoice.subscription_id;
            normalized.provider_customer_id =
                invoice.primary_recipient.and_then(|r| r.customer_id);
        }
        _ => {}
    }

    Ok(normalized)
}

#[cfg(test)]
pub(crate) fn compute_test_signature(key: &str, notification_url: &str, payload: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(key.as_bytes()).expect("HMAC accepts any key size");
    mac.update(notification_url.as_bytes());
    mac.update(payload.as_bytes());
    base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    const SIGNATURE_KEY: &str = "test-signature-key";
    const NOTIFICATION_URL: &str = "https://api.example.com/api/webhooks/square";

    fn verifier() -> SquareWebhookVerifier {
        SquareWebhookVerifier::new(SquareConfig {
            application_id: "sq0idp-app".to_string(),
            application_secret: SecretString::new("sq0csp-secret".to_string()),
            webhook_signature_key: SecretString::new(SIGNATURE_KEY.to_string()),
            redirect_url: "https://api.example.com/api/oauth/square/callback".to_string(),
            webhook_notification_url: NOTIFICATION_URL.to_string(),
            environment: "sandbox".to_string(),
            scopes: "ITEMS_READ".to_string(),
        })
    }

    fn sign(payload: &str) -> String {
        compute_test_signature(SIGNATURE_KEY, NOTIFICATION_URL, payload)
    }

    fn subscription_event(status: &str, canceled_date: Option<&str>) -> String {
        serde_json::json!({
            "merchant_id": "ML4S1X",
            "type": "subscription.updated",
            "event_id": "73f3f5a8-2a32-4a2b-9b45-0e1f3f1a2b3c",
            "created_at": "2026-02-06T21:27:34Z",
            "data": {
                "type": "subscription",
                "id": "sub-data-id",
                "object": {
                    "subscription": {
                        "id": "sq-sub-1",
                        "customer_id": "CUST1",
                        "status": status,
                        "canceled_date": canceled_date,
                        "charged_through_date": "2026-03-06"
                    }
                }
            }
        })
        .to_string()
    }

    // ══════════════════════════════════════════════════════════════
    // Signature Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn valid_signature_verifies() {
        let payload = subscription_event("ACTIVE", None);
        let result = verifier().verify_and_parse(payload.as_bytes(), &sign(&payload));
        assert!(result.is_ok());
    }

    #[test]
    fn wrong_key_fails() {
        let payload = subscription_event("ACTIVE", None);
        let signature = compute_test_signature("other-key", NOTIFICATION_URL, &payload);

        let result = verifier().verify_and_parse(payload.as_bytes(), &signature);
        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }

    #[test]
    fn wrong_notification_url_fails() {
        // Signature computed over a different URL than the one registered
        let payload = subscription_event("ACTIVE", None);
        let signature =
            compute_test_signature(SIGNATURE_KEY, "https://evil.example.com/hook", &payload);

        let result = verifier().verify_and_parse(payload.as_bytes(), &signature);
        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }

    #[test]
    fn tampered_payload_fails() {
        let payload = subscription_event("ACTIVE", None);
        let signature = sign(&payload);
        let tampered = payload.replace("ACTIVE", "CANCELED");

        let result = verifier().verify_and_parse(tampered.as_bytes(), &signature);
        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }

    #[test]
    fn garbage_signature_is_parse_error() {
        let payload = subscription_event("ACTIVE", None);
        let result = verifier().verify_and_parse(payload.as_bytes(), "!!not-base64!!");
        assert!(matches!(result, Err(WebhookError::ParseError(_))));
    }

    // ══════════════════════════════════════════════════════════════
    // Normalization Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn subscription_update_normalizes_snapshot() {
        let payload = subscription_event("ACTIVE", None);
        let event = verifier()
            .verify_and_parse(payload.as_bytes(), &sign(&payload))
            .unwrap();

        assert_eq!(event.provider, BillingProvider::Square);
        assert_eq!(event.kind, EventKind::SubscriptionUpdated);
        assert_eq!(event.provider_subscription_id.as_deref(), Some("sq-sub-1"));
        assert_eq!(event.provider_customer_id.as_deref(), Some("CUST1"));

        let snapshot = event.snapshot.unwrap();
        assert_eq!(snapshot.status, RemoteStatus::Active);
        assert!(snapshot.cancel_at.is_none());
        assert!(snapshot.current_period_end.is_some());
    }

    #[test]
    fn canceled_date_on_active_subscription_survives_normalization() {
        // The pending-cancellation signal: ACTIVE status + canceled_date
        let payload = subscription_event("ACTIVE", Some("2026-03-06"));
        let event = verifier()
            .verify_and_parse(payload.as_bytes(), &sign(&payload))
            .unwrap();

        let snapshot = event.snapshot.unwrap();
        assert_eq!(snapshot.status, RemoteStatus::Active);
        assert!(snapshot.cancel_at.is_some());
    }

    #[test]
    fn status_vocabulary_maps() {
        for (wire, expected) in [
            ("PENDING", RemoteStatus::Incomplete),
            ("ACTIVE", RemoteStatus::Active),
            ("PAUSED", RemoteStatus::Paused),
            ("CANCELED", RemoteStatus::Canceled),
            ("DEACTIVATED", RemoteStatus::Deactivated),
            ("SOMETHING_ELSE", RemoteStatus::Unknown),
        ] {
            let payload = subscription_event(wire, None);
            let event = verifier()
                .verify_and_parse(payload.as_bytes(), &sign(&payload))
                .unwrap();
            assert_eq!(event.snapshot.unwrap().status, expected, "for {}", wire);
        }
    }

    #[test]
    fn invoice_payment_made_normalizes() {
        let payload = serde_json::json!({
            "merchant_id": "ML4S1X",
            "type": "invoice.payment_made",
            "event_id": "9d1ab33e-0000-4a2b-9b45-0e1f3f1a2b3c",
            "created_at": "2026-02-06T21:27:34Z",
            "data": {
                "type": "invoice",
                "id": "inv-1",
                "object": {
                    "invoice": {
                        "id": "inv-1",
                        "subscription_id": "sq-sub-1",
                        "primary_recipient": {"customer_id": "CUST1"}
                    }
                }
            }
        })
        .to_string();

        let event = verifier()
            .verify_and_parse(payload.as_bytes(), &sign(&payload))
            .unwrap();

        assert_eq!(event.kind, EventKind::InvoicePaid);
        assert_eq!(event.provider_subscription_id.as_deref(), Some("sq-sub-1"));
    }

    #[test]
    fn unrecognized_type_is_unknown() {
        let payload = serde_json::json!({
            "merchant_id": "ML4S1X",
            "type": "catalog.version.updated",
            "event_id": "11111111-0000-4a2b-9b45-0e1f3f1a2b3c",
            "created_at": "2026-02-06T21:27:34Z",
            "data": {"type": "catalog", "id": "x", "object": {}}
        })
        .to_string();

        let event = verifier()
            .verify_and_parse(payload.as_bytes(), &sign(&payload))
            .unwrap();
        assert_eq!(event.kind, EventKind::Unknown);
    }

    #[test]
    fn date_parsing_handles_bad_input() {
        assert!(parse_date("2026-03-06").is_some());
        assert!(parse_date("not-a-date").is_none());
        assert!(parse_date("").is_none());
    }
}
