//! Request/response DTOs for the OAuth endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::connection::MerchantConnection;
use crate::domain::foundation::Timestamp;

/// Query parameters for the authorize entry point.
///
/// The authorize URL is opened in a browser, so the organization travels
/// as a query parameter instead of the API header.
#[derive(Debug, Deserialize)]
pub struct AuthorizeParams {
    pub organization_id: String,
}

/// Query parameters Square sends to the callback.
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Connection status as exposed to the kiosk app. Never carries tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionResponse {
    pub merchant_id: String,
    pub status: String,
    pub scopes: Vec<String>,
    pub connected_at: Timestamp,
    pub token_expires_at: Timestamp,
    pub last_refreshed_at: Option<Timestamp>,
}

impl From<&MerchantConnection> for ConnectionResponse {
    fn from(connection: &MerchantConnection) -> Self {
        Self {
            merchant_id: connection.merchant_id.clone(),
            status: match connection.status {
                crate::domain::connection::ConnectionStatus::Connected => "connected",
                crate::domain::connection::ConnectionStatus::Expired => "expired",
                crate::domain::connection::ConnectionStatus::Revoked => "revoked",
            }
            .to_string(),
            scopes: connection.scopes.clone(),
            connected_at: connection.connected_at,
            token_expires_at: connection.token_expires_at,
            last_refreshed_at: connection.last_refreshed_at,
        }
    }
}
