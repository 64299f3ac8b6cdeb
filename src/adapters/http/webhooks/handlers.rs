//! HTTP handlers for the webhook endpoints.
//!
//! Both endpoints are unauthenticated; the signature check is the trust
//! boundary. Response codes steer provider retry behavior:
//!
//! - 200: processed, duplicate, ignored, or permanently failed (retrying
//!   cannot fix it; the failure is recorded for audit)
//! - 400: bad signature or unparseable payload
//! - 500: transient processing failure; the provider should retry

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::adapters::http::{AppState, ErrorResponse};
use crate::domain::webhook::{ProviderEvent, WebhookError};
use crate::ports::WebhookResult;

/// Square signature header.
const SQUARE_SIGNATURE_HEADER: &str = "x-square-hmacsha256-signature";

/// Stripe signature header.
const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";

/// Acknowledgement body returned to the provider.
#[derive(Debug, Serialize)]
struct WebhookAck {
    received: bool,
    status: &'static str,
}

/// `POST /api/webhooks/square`
pub async fn square(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = match header_value(&headers, SQUARE_SIGNATURE_HEADER) {
        Ok(signature) => signature,
        Err(response) => return response,
    };

    let event = match state.square_verifier.verify_and_parse(&body, &signature) {
        Ok(event) => event,
        Err(err) => return verification_failure(err),
    };

    process(&state, event).await
}

/// `POST /api/webhooks/stripe`
pub async fn stripe(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = match header_value(&headers, STRIPE_SIGNATURE_HEADER) {
        Ok(signature) => signature,
        Err(response) => return response,
    };

    let event = match state.stripe_verifier.verify_and_parse(&body, &signature) {
        Ok(event) => event,
        Err(err) => return verification_failure(err),
    };

    process(&state, event).await
}

fn header_value(headers: &HeaderMap, name: &str) -> Result<String, Response> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(
                    "MISSING_SIGNATURE",
                    format!("{} header is required", name),
                )),
            )
                .into_response()
        })
}

fn verification_failure(err: WebhookError) -> Response {
    tracing::warn!(error = %err, "Webhook verification failed");
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new(
            "INVALID_WEBHOOK",
            "Webhook verification failed",
        )),
    )
        .into_response()
}

async fn process(state: &AppState, event: ProviderEvent) -> Response {
    let provider = event.provider;
    let event_type = event.event_type.clone();

    match state.webhook_processor().process(event).await {
        Ok(WebhookResult::Processed) => {
            tracing::info!(provider = %provider, event_type = %event_type, "Webhook processed");
            ack("processed")
        }
        Ok(WebhookResult::AlreadyProcessed) => ack("duplicate"),
        Err(err) if err.is_retryable() => {
            tracing::error!(
                provider = %provider,
                event_type = %event_type,
                error = %err,
                "Webhook processing failed, provider will retry"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("WEBHOOK_PROCESSING_FAILED", "Processing failed")),
            )
                .into_response()
        }
        Err(err) => {
            // Recorded as failed; acknowledged so the provider stops
            // redelivering an event we can never apply.
            tracing::warn!(
                provider = %provider,
                event_type = %event_type,
                error = %err,
                "Webhook permanently failed"
            );
            ack("failed")
        }
    }
}

fn ack(status: &'static str) -> Response {
    (
        StatusCode::OK,
        Json(WebhookAck {
            received: true,
            status,
        }),
    )
        .into_response()
}
