//! HTTP handlers for the billing endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use super::dto::{
    CheckoutBody, CheckoutResponse, PortalResponse, PromoBody, PromoResponse,
    SubscriptionEventDto, SubscriptionEventsResponse, SubscriptionResponse,
};
use crate::adapters::http::{ApiError, AppState, OrganizationContext};
use crate::application::handlers::billing::{
    CancelSubscriptionCommand, CreateCheckoutCommand, CreatePortalCommand, GetSubscriptionQuery,
    ValidatePromoQuery,
};

/// `GET /api/billing/subscription`
///
/// Returns 404 when the organization never started checkout.
pub async fn get_subscription(
    State(state): State<AppState>,
    context: OrganizationContext,
) -> Result<Json<SubscriptionResponse>, ApiError> {
    let subscription = state
        .get_subscription_handler()
        .handle(GetSubscriptionQuery {
            organization_id: context.organization_id,
        })
        .await?
        .ok_or_else(|| {
            crate::domain::foundation::DomainError::not_found(
                crate::domain::foundation::ErrorCode::SubscriptionNotFound,
                "Subscription",
            )
        })?;

    Ok(Json(SubscriptionResponse::from(&subscription)))
}

/// Default page size for the billing history.
const EVENT_LOG_LIMIT: i64 = 50;

/// `GET /api/billing/subscription/events`
///
/// Billing history for the organization's subscription, newest first.
pub async fn list_subscription_events(
    State(state): State<AppState>,
    context: OrganizationContext,
) -> Result<Json<SubscriptionEventsResponse>, ApiError> {
    let subscription = state
        .get_subscription_handler()
        .handle(GetSubscriptionQuery {
            organization_id: context.organization_id,
        })
        .await?
        .ok_or_else(|| {
            crate::domain::foundation::DomainError::not_found(
                crate::domain::foundation::ErrorCode::SubscriptionNotFound,
                "Subscription",
            )
        })?;

    let events = state
        .subscription_events
        .list_for_subscription(&subscription.id, EVENT_LOG_LIMIT)
        .await?;

    Ok(Json(SubscriptionEventsResponse {
        events: events.into_iter().map(SubscriptionEventDto::from).collect(),
    }))
}

/// `POST /api/billing/checkout`
pub async fn create_checkout(
    State(state): State<AppState>,
    context: OrganizationContext,
    Json(body): Json<CheckoutBody>,
) -> Result<(StatusCode, Json<CheckoutResponse>), ApiError> {
    let plan = body
        .parse_plan()
        .map_err(crate::domain::foundation::DomainError::from)?;

    let session = state
        .create_checkout_handler()
        .handle(CreateCheckoutCommand {
            organization_id: context.organization_id,
            plan,
            promo_code: body.promo_code,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(session.into())))
}

/// `GET /api/billing/portal`
pub async fn get_portal(
    State(state): State<AppState>,
    context: OrganizationContext,
) -> Result<Json<PortalResponse>, ApiError> {
    let session = state
        .create_portal_handler()
        .handle(CreatePortalCommand {
            organization_id: context.organization_id,
        })
        .await?;

    Ok(Json(session.into()))
}

/// `POST /api/billing/cancel`
pub async fn cancel_subscription(
    State(state): State<AppState>,
    context: OrganizationContext,
) -> Result<Json<SubscriptionResponse>, ApiError> {
    let subscription = state
        .cancel_subscription_handler()
        .handle(CancelSubscriptionCommand {
            organization_id: context.organization_id,
        })
        .await?;

    Ok(Json(SubscriptionResponse::from(&subscription)))
}

/// `POST /api/billing/promo/validate`
pub async fn validate_promo(
    State(state): State<AppState>,
    _context: OrganizationContext,
    Json(body): Json<PromoBody>,
) -> Result<Json<PromoResponse>, ApiError> {
    let promo = state
        .validate_promo_handler()
        .handle(ValidatePromoQuery { code: body.code })
        .await?;

    Ok(Json(promo.into()))
}
