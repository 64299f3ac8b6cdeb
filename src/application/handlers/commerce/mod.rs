//! Commerce handlers - Square passthrough with the stored merchant token.

mod access;
mod create_order;
mod list_catalog;
mod take_payment;

pub use access::MerchantAccess;
pub use create_order::{CreateOrderCommand, CreateOrderHandler};
pub use list_catalog::{ListCatalogHandler, ListCatalogQuery};
pub use take_payment::{TakePaymentCommand, TakePaymentHandler};
