//! Webhooks HTTP module - Provider event intake.

mod handlers;
mod routes;

pub use routes::routes;
