//! HTTP handlers for the commerce passthrough endpoints.

use axum::extract::{Query, State};
use axum::Json;

use super::dto::{
    CatalogPageResponse, CatalogQuery, CreateOrderBody, CreatePaymentBody, OrderResponse,
    PaymentResponse,
};
use crate::adapters::http::{ApiError, AppState, OrganizationContext};
use crate::application::handlers::commerce::{
    CreateOrderCommand, ListCatalogQuery, TakePaymentCommand,
};

/// `GET /api/commerce/catalog`
pub async fn list_catalog(
    State(state): State<AppState>,
    context: OrganizationContext,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<CatalogPageResponse>, ApiError> {
    let page = state
        .list_catalog_handler()
        .handle(ListCatalogQuery {
            organization_id: context.organization_id,
            cursor: query.cursor,
        })
        .await?;

    Ok(Json(page.into()))
}

/// `POST /api/commerce/orders`
pub async fn create_order(
    State(state): State<AppState>,
    context: OrganizationContext,
    Json(body): Json<CreateOrderBody>,
) -> Result<Json<OrderResponse>, ApiError> {
    let request = body.into_request()?;
    let order = state
        .create_order_handler()
        .handle(CreateOrderCommand {
            organization_id: context.organization_id,
            request,
        })
        .await?;

    Ok(Json(order.into()))
}

/// `POST /api/commerce/payments`
pub async fn create_payment(
    State(state): State<AppState>,
    context: OrganizationContext,
    Json(body): Json<CreatePaymentBody>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let payment = state
        .take_payment_handler()
        .handle(TakePaymentCommand {
            organization_id: context.organization_id,
            source_id: body.source_id,
            amount: body.amount.into_money()?,
            order_id: body.order_id,
            idempotency_key: body.idempotency_key,
        })
        .await?;

    Ok(Json(payment.into()))
}
