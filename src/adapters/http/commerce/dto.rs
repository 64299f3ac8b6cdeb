//! Request/response DTOs for the commerce endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::DomainError;
use crate::ports::{
    CatalogPage, CreateOrderRequest, Money, Order, OrderLineItem, Payment,
};

/// Query parameters for catalog listing.
#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub cursor: Option<String>,
}

/// Amount in minor units with an ISO currency code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoneyDto {
    pub amount: i64,
    pub currency: String,
}

impl MoneyDto {
    pub fn into_money(self) -> Result<Money, DomainError> {
        Money::new(self.amount, &self.currency).ok_or_else(|| {
            DomainError::validation("currency", "currency must be a 3-letter ISO code")
        })
    }
}

impl From<Money> for MoneyDto {
    fn from(money: Money) -> Self {
        Self {
            amount: money.amount,
            currency: money.currency,
        }
    }
}

/// Request body for order creation.
#[derive(Debug, Deserialize)]
pub struct CreateOrderBody {
    pub location_id: String,
    pub reference_id: Option<String>,
    pub line_items: Vec<OrderLineBody>,
}

/// One requested order line.
#[derive(Debug, Deserialize)]
pub struct OrderLineBody {
    pub catalog_object_id: Option<String>,
    pub name: Option<String>,
    pub quantity: u32,
    pub base_price: Option<MoneyDto>,
}

impl CreateOrderBody {
    pub fn into_request(self) -> Result<CreateOrderRequest, DomainError> {
        let line_items = self
            .line_items
            .into_iter()
            .map(|line| {
                Ok(OrderLineItem {
                    catalog_object_id: line.catalog_object_id,
                    name: line.name,
                    quantity: line.quantity,
                    base_price: line.base_price.map(MoneyDto::into_money).transpose()?,
                })
            })
            .collect::<Result<Vec<_>, DomainError>>()?;

        Ok(CreateOrderRequest {
            location_id: self.location_id,
            reference_id: self.reference_id,
            line_items,
        })
    }
}

/// Request body for taking a payment.
#[derive(Debug, Deserialize)]
pub struct CreatePaymentBody {
    pub source_id: String,
    pub amount: MoneyDto,
    pub order_id: Option<String>,
    pub idempotency_key: Option<String>,
}

/// Order as returned to the kiosk.
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub location_id: String,
    pub state: String,
    pub total: MoneyDto,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            location_id: order.location_id,
            state: order.state,
            total: order.total.into(),
        }
    }
}

/// Payment as returned to the kiosk.
#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub id: String,
    pub status: String,
    pub amount: MoneyDto,
    pub order_id: Option<String>,
    pub receipt_url: Option<String>,
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        Self {
            id: payment.id,
            status: payment.status,
            amount: payment.amount.into(),
            order_id: payment.order_id,
            receipt_url: payment.receipt_url,
        }
    }
}

/// One catalog page as returned to the kiosk.
#[derive(Debug, Serialize)]
pub struct CatalogPageResponse {
    pub items: Vec<CatalogItemDto>,
    pub cursor: Option<String>,
}

/// A catalog item flattened for the kiosk UI.
#[derive(Debug, Serialize)]
pub struct CatalogItemDto {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub variations: Vec<CatalogVariationDto>,
}

/// A purchasable variation.
#[derive(Debug, Serialize)]
pub struct CatalogVariationDto {
    pub id: String,
    pub name: String,
    pub price: Option<MoneyDto>,
}

impl From<CatalogPage> for CatalogPageResponse {
    fn from(page: CatalogPage) -> Self {
        Self {
            items: page
                .items
                .into_iter()
                .map(|item| CatalogItemDto {
                    id: item.id,
                    name: item.name,
                    description: item.description,
                    variations: item
                        .variations
                        .into_iter()
                        .map(|variation| CatalogVariationDto {
                            id: variation.id,
                            name: variation.name,
                            price: variation.price.map(MoneyDto::from),
                        })
                        .collect(),
                })
                .collect(),
            cursor: page.cursor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_dto_validates_currency() {
        let good = MoneyDto {
            amount: 500,
            currency: "usd".to_string(),
        };
        assert_eq!(good.into_money().unwrap().currency, "USD");

        let bad = MoneyDto {
            amount: 500,
            currency: "DOLLARS".to_string(),
        };
        assert!(bad.into_money().is_err());
    }

    #[test]
    fn order_body_converts_lines() {
        let body = CreateOrderBody {
            location_id: "LOC1".to_string(),
            reference_id: None,
            line_items: vec![OrderLineBody {
                catalog_object_id: None,
                name: Some("Day pass".to_string()),
                quantity: 2,
                base_price: Some(MoneyDto {
                    amount: 1500,
                    currency: "usd".to_string(),
                }),
            }],
        };

        let request = body.into_request().unwrap();
        assert_eq!(request.line_items.len(), 1);
        assert_eq!(request.line_items[0].base_price.as_ref().unwrap().amount, 1500);
    }
}
