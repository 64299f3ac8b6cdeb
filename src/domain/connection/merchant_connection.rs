//! Merchant OAuth connection aggregate.
//!
//! One row per organization: the Square merchant it is linked to, the token
//! pair obtained through OAuth, and the connection lifecycle. Tokens are
//! stored as opaque strings; the Debug impl redacts them so request traces
//! never carry token material.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{
    ConnectionId, OrganizationId, StateMachine, Timestamp, ValidationError,
};

/// Lifecycle status of a merchant connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// Token pair is on file and the merchant grant is believed valid.
    Connected,

    /// The refresh grant was rejected; the organization must re-authorize.
    Expired,

    /// Disconnected by the organization or by Square.
    Revoked,
}

impl StateMachine for ConnectionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ConnectionStatus::*;
        matches!(
            (self, target),
            (Connected, Expired) | (Connected, Revoked) | (Expired, Connected) | (Expired, Revoked)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ConnectionStatus::*;
        match self {
            Connected => vec![Expired, Revoked],
            Expired => vec![Connected, Revoked],
            Revoked => vec![],
        }
    }
}

/// Token material returned by an OAuth code exchange or refresh.
#[derive(Clone)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Timestamp,
    pub merchant_id: String,
    pub scopes: Vec<String>,
}

impl fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenGrant")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_at", &self.expires_at)
            .field("merchant_id", &self.merchant_id)
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// An organization's OAuth connection to its Square merchant account.
#[derive(Clone)]
pub struct MerchantConnection {
    pub id: ConnectionId,
    pub organization_id: OrganizationId,
    pub merchant_id: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub scopes: Vec<String>,
    pub status: ConnectionStatus,
    pub token_expires_at: Timestamp,
    pub connected_at: Timestamp,
    pub last_refreshed_at: Option<Timestamp>,
}

impl MerchantConnection {
    /// Creates a connection from a completed OAuth code exchange.
    pub fn establish(organization_id: OrganizationId, grant: TokenGrant, now: Timestamp) -> Self {
        Self {
            id: ConnectionId::new(),
            organization_id,
            merchant_id: grant.merchant_id,
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            scopes: grant.scopes,
            status: ConnectionStatus::Connected,
            token_expires_at: grant.expires_at,
            connected_at: now,
            last_refreshed_at: None,
        }
    }

    /// True when the connection can serve passthrough calls, possibly after
    /// an inline token refresh.
    pub fn is_usable(&self) -> bool {
        matches!(self.status, ConnectionStatus::Connected)
    }

    /// True when the access token has passed its expiry.
    pub fn token_expired(&self, now: Timestamp) -> bool {
        !self.token_expires_at.is_after(&now)
    }

    /// True when the access token expires within the given number of hours.
    ///
    /// The refresh job uses this to renew tokens ahead of expiry.
    pub fn needs_refresh(&self, now: Timestamp, within_hours: i64) -> bool {
        self.is_usable() && !self.token_expires_at.is_after(&now.add_hours(within_hours))
    }

    /// Applies a successful token refresh.
    ///
    /// Square rotates the refresh token on some grants; absent means keep
    /// the existing one. An `Expired` connection recovers to `Connected`.
    pub fn apply_refresh(&mut self, grant: TokenGrant, now: Timestamp) -> Result<(), ValidationError> {
        if self.status == ConnectionStatus::Expired {
            self.status = self.status.transition_to(ConnectionStatus::Connected)?;
        }
        self.access_token = grant.access_token;
        if grant.refresh_token.is_some() {
            self.refresh_token = grant.refresh_token;
        }
        self.token_expires_at = grant.expires_at;
        self.last_refreshed_at = Some(now);
        Ok(())
    }

    /// Marks the connection expired after a rejected refresh grant.
    pub fn mark_expired(&mut self) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(ConnectionStatus::Expired)?;
        Ok(())
    }

    /// Revokes the connection and drops the stored token material.
    pub fn revoke(&mut self) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(ConnectionStatus::Revoked)?;
        self.access_token.clear();
        self.refresh_token = None;
        Ok(())
    }
}

impl fmt::Debug for MerchantConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MerchantConnection")
            .field("id", &self.id)
            .field("organization_id", &self.organization_id)
            .field("merchant_id", &self.merchant_id)
            .field("status", &self.status)
            .field("token_expires_at", &self.token_expires_at)
            .field("scopes", &self.scopes)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grant(expires_at: Timestamp) -> TokenGrant {
        TokenGrant {
            access_token: "sq0atp-access".to_string(),
            refresh_token: Some("sq0rtp-refresh".to_string()),
            expires_at,
            merchant_id: "ML4S1X".to_string(),
            scopes: vec!["ITEMS_READ".to_string(), "PAYMENTS_WRITE".to_string()],
        }
    }

    fn connection() -> MerchantConnection {
        MerchantConnection::establish(
            OrganizationId::new(),
            grant(Timestamp::now().add_days(30)),
            Timestamp::now(),
        )
    }

    #[test]
    fn establish_starts_connected() {
        let conn = connection();
        assert_eq!(conn.status, ConnectionStatus::Connected);
        assert!(conn.is_usable());
        assert!(conn.last_refreshed_at.is_none());
    }

    #[test]
    fn needs_refresh_inside_window_only() {
        let now = Timestamp::now();
        let mut conn = connection();

        conn.token_expires_at = now.add_hours(12);
        assert!(conn.needs_refresh(now, 24));

        conn.token_expires_at = now.add_days(20);
        assert!(!conn.needs_refresh(now, 24));
    }

    #[test]
    fn needs_refresh_false_for_revoked() {
        let now = Timestamp::now();
        let mut conn = connection();
        conn.token_expires_at = now.add_hours(1);
        conn.revoke().unwrap();
        assert!(!conn.needs_refresh(now, 24));
    }

    #[test]
    fn apply_refresh_rotates_tokens_and_recovers_expired() {
        let now = Timestamp::now();
        let mut conn = connection();
        conn.mark_expired().unwrap();

        let mut new_grant = grant(now.add_days(30));
        new_grant.access_token = "sq0atp-next".to_string();
        new_grant.refresh_token = None;

        conn.apply_refresh(new_grant, now).unwrap();

        assert_eq!(conn.status, ConnectionStatus::Connected);
        assert_eq!(conn.access_token, "sq0atp-next");
        // Absent refresh token keeps the previous one
        assert_eq!(conn.refresh_token.as_deref(), Some("sq0rtp-refresh"));
        assert_eq!(conn.last_refreshed_at, Some(now));
    }

    #[test]
    fn revoke_clears_token_material() {
        let mut conn = connection();
        conn.revoke().unwrap();
        assert_eq!(conn.status, ConnectionStatus::Revoked);
        assert!(conn.access_token.is_empty());
        assert!(conn.refresh_token.is_none());
    }

    #[test]
    fn revoked_is_terminal() {
        let mut conn = connection();
        conn.revoke().unwrap();
        assert!(conn.status.is_terminal());
        assert!(conn.mark_expired().is_err());
    }

    #[test]
    fn token_expired_at_boundary() {
        let now = Timestamp::now();
        let mut conn = connection();
        conn.token_expires_at = now;
        assert!(conn.token_expired(now));
        conn.token_expires_at = now.add_minutes(1);
        assert!(!conn.token_expired(now));
    }

    #[test]
    fn debug_redacts_tokens() {
        let conn = connection();
        let rendered = format!("{:?}", conn);
        assert!(!rendered.contains("sq0atp-access"));
        assert!(!rendered.contains("sq0rtp-refresh"));

        let rendered = format!("{:?}", grant(Timestamp::now()));
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("sq0atp-access"));
    }
}
