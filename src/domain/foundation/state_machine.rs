//! State machine trait for status enums.
//!
//! Provides a consistent interface for validating and performing state
//! transitions across entity lifecycle statuses (subscriptions, merchant
//! connections, devices).

use super::ValidationError;

/// Trait for status enums that represent state machines.
///
/// Implementors define valid state transitions and get validated
/// transition methods for free.
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Performs transition with validation, returning error if invalid.
    ///
    /// This is the preferred way to change state, as it ensures
    /// the transition is valid according to the state machine rules.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_format(
                "state_transition",
                format!("Cannot transition from {:?} to {:?}", self, target),
            ))
        }
    }

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum TokenState {
        Fresh,
        Stale,
        Revoked,
    }

    impl StateMachine for TokenState {
        fn can_transition_to(&self, target: &Self) -> bool {
            use TokenState::*;
            matches!(
                (self, target),
                (Fresh, Stale) | (Stale, Fresh) | (Fresh, Revoked) | (Stale, Revoked)
            )
        }

        fn valid_transitions(&self) -> Vec<Self> {
            use TokenState::*;
            match self {
                Fresh => vec![Stale, Revoked],
                Stale => vec![Fresh, Revoked],
                Revoked => vec![],
            }
        }
    }

    #[test]
    fn transition_to_succeeds_for_valid_transition() {
        let result = TokenState::Fresh.transition_to(TokenState::Stale);
        assert_eq!(result, Ok(TokenState::Stale));
    }

    #[test]
    fn transition_to_fails_for_invalid_transition() {
        let result = TokenState::Revoked.transition_to(TokenState::Fresh);
        assert!(result.is_err());
    }

    #[test]
    fn is_terminal_matches_empty_transitions() {
        assert!(TokenState::Revoked.is_terminal());
        assert!(!TokenState::Fresh.is_terminal());
    }

    #[test]
    fn can_transition_to_is_consistent_with_valid_transitions() {
        for state in [TokenState::Fresh, TokenState::Stale, TokenState::Revoked] {
            for target in state.valid_transitions() {
                assert!(
                    state.can_transition_to(&target),
                    "expected {:?} -> {:?} to be valid",
                    state,
                    target
                );
            }
        }
    }
}
