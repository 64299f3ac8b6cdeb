//! Square adapter - Merchant OAuth and commerce via the Square REST API.
//!
//! Implements the [`MerchantGateway`](crate::ports::MerchantGateway) port
//! and verifies/normalizes Square webhook deliveries.

mod client;
mod mock_gateway;
mod webhook;

pub use client::SquareMerchantGateway;
pub use mock_gateway::{mock_token_grant, MockMerchantGateway};
pub use webhook::SquareWebhookVerifier;
