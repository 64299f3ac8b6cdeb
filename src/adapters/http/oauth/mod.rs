//! OAuth HTTP module - Square merchant connection endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::ConnectionResponse;
pub use routes::routes;
