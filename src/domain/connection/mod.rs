//! Connection module - Organization to merchant OAuth connections.
//!
//! Models the OAuth link between a kiosk operator's organization and its
//! Square merchant account: the stored token pair, its lifecycle, and the
//! short-lived state rows that protect the authorize round-trip.

mod merchant_connection;
mod oauth_state;

pub use merchant_connection::{ConnectionStatus, MerchantConnection, TokenGrant};
pub use oauth_state::OAuthState;
