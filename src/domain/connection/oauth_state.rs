//! Pending OAuth state.
//!
//! A short-lived row created when the authorize redirect is issued and
//! consumed exactly once by the callback. Unknown, expired, or re-used
//! state tokens abort the callback.

use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode, OrganizationId, Timestamp};

/// Lifetime of a pending OAuth round-trip.
const STATE_TTL_MINUTES: i64 = 10;

/// A pending OAuth authorize round-trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthState {
    /// Opaque token carried through the provider redirect.
    pub state_token: String,
    pub organization_id: OrganizationId,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub consumed_at: Option<Timestamp>,
}

impl OAuthState {
    /// Issues a fresh state for an organization starting the OAuth flow.
    pub fn issue(organization_id: OrganizationId, now: Timestamp) -> Self {
        Self {
            state_token: Uuid::new_v4().simple().to_string(),
            organization_id,
            created_at: now,
            expires_at: now.add_minutes(STATE_TTL_MINUTES),
            consumed_at: None,
        }
    }

    /// True once the state has passed its expiry.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        !self.expires_at.is_after(&now)
    }

    /// Consumes the state for a callback.
    ///
    /// Fails if the state was already consumed (replayed callback) or has
    /// expired. On success the state is marked consumed at `now`.
    pub fn consume(&mut self, now: Timestamp) -> Result<(), DomainError> {
        if self.consumed_at.is_some() {
            return Err(DomainError::new(
                ErrorCode::OAuthStateConsumed,
                "OAuth state was already used",
            ));
        }
        if self.is_expired(now) {
            return Err(DomainError::new(
                ErrorCode::OAuthStateExpired,
                "OAuth state has expired",
            ));
        }
        self.consumed_at = Some(now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_generates_distinct_tokens() {
        let now = Timestamp::now();
        let org = OrganizationId::new();
        let a = OAuthState::issue(org, now);
        let b = OAuthState::issue(org, now);
        assert_ne!(a.state_token, b.state_token);
        assert_eq!(a.expires_at, now.add_minutes(10));
    }

    #[test]
    fn consume_succeeds_once() {
        let now = Timestamp::now();
        let mut state = OAuthState::issue(OrganizationId::new(), now);

        assert!(state.consume(now.add_minutes(1)).is_ok());
        assert_eq!(state.consumed_at, Some(now.add_minutes(1)));

        let err = state.consume(now.add_minutes(2)).unwrap_err();
        assert_eq!(err.code, ErrorCode::OAuthStateConsumed);
    }

    #[test]
    fn consume_rejects_expired_state() {
        let now = Timestamp::now();
        let mut state = OAuthState::issue(OrganizationId::new(), now);

        let err = state.consume(now.add_minutes(11)).unwrap_err();
        assert_eq!(err.code, ErrorCode::OAuthStateExpired);
        assert!(state.consumed_at.is_none());
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let now = Timestamp::now();
        let state = OAuthState::issue(OrganizationId::new(), now);
        assert!(state.is_expired(now.add_minutes(10)));
        assert!(!state.is_expired(now.add_minutes(9)));
    }
}
