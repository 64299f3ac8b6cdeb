//! Commerce HTTP module - Square passthrough endpoints.

mod dto;
mod handlers;
mod routes;

pub use routes::routes;
