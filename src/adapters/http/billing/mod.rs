//! Billing HTTP module - Platform subscription endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::SubscriptionResponse;
pub use routes::routes;
