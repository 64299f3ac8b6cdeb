//! TakePaymentHandler - Payment passthrough.

use std::sync::Arc;

use uuid::Uuid;

use super::access::MerchantAccess;
use crate::domain::foundation::{DomainError, OrganizationId};
use crate::ports::{CreatePaymentRequest, MerchantGateway, Money, Payment};

/// Command to take a payment with a tokenized source.
#[derive(Debug, Clone)]
pub struct TakePaymentCommand {
    pub organization_id: OrganizationId,
    pub source_id: String,
    pub amount: Money,
    pub order_id: Option<String>,
    /// Client-supplied idempotency key; generated when absent so a kiosk
    /// retry after a timeout cannot double-charge.
    pub idempotency_key: Option<String>,
}

/// Handler forwarding payment creation to the merchant gateway.
pub struct TakePaymentHandler {
    access: Arc<MerchantAccess>,
    gateway: Arc<dyn MerchantGateway>,
}

impl TakePaymentHandler {
    pub fn new(access: Arc<MerchantAccess>, gateway: Arc<dyn MerchantGateway>) -> Self {
        Self { access, gateway }
    }

    pub async fn handle(&self, cmd: TakePaymentCommand) -> Result<Payment, DomainError> {
        if cmd.source_id.is_empty() {
            return Err(DomainError::validation("source_id", "source_id is required"));
        }
        if cmd.amount.amount <= 0 {
            return Err(DomainError::validation(
                "amount",
                "payment amount must be positive",
            ));
        }

        let token = self.access.access_token(&cmd.organization_id).await?;
        let idempotency_key = cmd
            .idempotency_key
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let payment = self
            .gateway
            .create_payment(
                &token,
                CreatePaymentRequest {
                    source_id: cmd.source_id,
                    idempotency_key,
                    amount: cmd.amount,
                    order_id: cmd.order_id,
                },
            )
            .await?;

        tracing::info!(
            organization_id = %cmd.organization_id,
            payment_id = %payment.id,
            status = %payment.status,
            "Payment created"
        );
        Ok(payment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::{
        connected, InMemoryConnectionRepository, MockMerchantGateway,
    };
    use crate::domain::foundation::ErrorCode;

    fn handler(org: OrganizationId) -> TakePaymentHandler {
        let gateway = MockMerchantGateway::new();
        let access = Arc::new(MerchantAccess::new(
            InMemoryConnectionRepository::with(connected(org)),
            gateway.clone(),
        ));
        TakePaymentHandler::new(access, gateway)
    }

    fn command(org: OrganizationId) -> TakePaymentCommand {
        TakePaymentCommand {
            organization_id: org,
            source_id: "cnon:card-nonce".to_string(),
            amount: Money::new(700, "USD").unwrap(),
            order_id: Some("ORDER1".to_string()),
            idempotency_key: None,
        }
    }

    #[tokio::test]
    async fn takes_payment_with_generated_idempotency_key() {
        let org = OrganizationId::new();
        let payment = handler(org).handle(command(org)).await.unwrap();

        assert_eq!(payment.id, "PAY1");
        assert_eq!(payment.amount.amount, 700);
    }

    #[tokio::test]
    async fn zero_amount_is_rejected() {
        let org = OrganizationId::new();
        let mut cmd = command(org);
        cmd.amount = Money::new(0, "USD").unwrap();

        let err = handler(org).handle(cmd).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[tokio::test]
    async fn missing_source_is_rejected() {
        let org = OrganizationId::new();
        let mut cmd = command(org);
        cmd.source_id.clear();

        let err = handler(org).handle(cmd).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }
}
