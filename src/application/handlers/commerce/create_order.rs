//! CreateOrderHandler - Order passthrough.

use std::sync::Arc;

use super::access::MerchantAccess;
use crate::domain::foundation::{DomainError, ErrorCode, OrganizationId};
use crate::ports::{CreateOrderRequest, MerchantGateway, Order};

/// Command to create an order for the caller's merchant.
#[derive(Debug, Clone)]
pub struct CreateOrderCommand {
    pub organization_id: OrganizationId,
    pub request: CreateOrderRequest,
}

/// Handler forwarding order creation to the merchant gateway.
pub struct CreateOrderHandler {
    access: Arc<MerchantAccess>,
    gateway: Arc<dyn MerchantGateway>,
}

impl CreateOrderHandler {
    pub fn new(access: Arc<MerchantAccess>, gateway: Arc<dyn MerchantGateway>) -> Self {
        Self { access, gateway }
    }

    pub async fn handle(&self, cmd: CreateOrderCommand) -> Result<Order, DomainError> {
        if cmd.request.location_id.is_empty() {
            return Err(DomainError::validation("location_id", "location_id is required"));
        }
        if cmd.request.line_items.is_empty() {
            return Err(DomainError::validation(
                "line_items",
                "order needs at least one line item",
            ));
        }
        if cmd.request.line_items.iter().any(|line| line.quantity == 0) {
            return Err(DomainError::new(
                ErrorCode::ValidationFailed,
                "line item quantity must be positive",
            ));
        }

        let token = self.access.access_token(&cmd.organization_id).await?;
        let order = self.gateway.create_order(&token, cmd.request).await?;

        tracing::info!(
            organization_id = %cmd.organization_id,
            order_id = %order.id,
            "Order created"
        );
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::{
        connected, InMemoryConnectionRepository, MockMerchantGateway,
    };
    use crate::ports::OrderLineItem;

    fn handler(org: OrganizationId) -> CreateOrderHandler {
        let gateway = MockMerchantGateway::new();
        let access = Arc::new(MerchantAccess::new(
            InMemoryConnectionRepository::with(connected(org)),
            gateway.clone(),
        ));
        CreateOrderHandler::new(access, gateway)
    }

    fn request() -> CreateOrderRequest {
        CreateOrderRequest {
            location_id: "LOC1".to_string(),
            reference_id: None,
            line_items: vec![OrderLineItem {
                catalog_object_id: Some("VAR1".to_string()),
                name: None,
                quantity: 1,
                base_price: None,
            }],
        }
    }

    #[tokio::test]
    async fn creates_order() {
        let org = OrganizationId::new();
        let order = handler(org)
            .handle(CreateOrderCommand {
                organization_id: org,
                request: request(),
            })
            .await
            .unwrap();

        assert_eq!(order.id, "ORDER1");
        assert_eq!(order.location_id, "LOC1");
    }

    #[tokio::test]
    async fn empty_order_is_rejected() {
        let org = OrganizationId::new();
        let mut bad = request();
        bad.line_items.clear();

        let err = handler(org)
            .handle(CreateOrderCommand {
                organization_id: org,
                request: bad,
            })
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[tokio::test]
    async fn zero_quantity_is_rejected() {
        let org = OrganizationId::new();
        let mut bad = request();
        bad.line_items[0].quantity = 0;

        let err = handler(org)
            .handle(CreateOrderCommand {
                organization_id: org,
                request: bad,
            })
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[tokio::test]
    async fn missing_location_is_rejected() {
        let org = OrganizationId::new();
        let mut bad = request();
        bad.location_id.clear();

        let err = handler(org)
            .handle(CreateOrderCommand {
                organization_id: org,
                request: bad,
            })
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }
}
