// SPDX-License-Identifier: Apache-2.0
//! Session state machine (§4.6): `New -> Handshaking -> Active ->
//! Closing -> Closed`. Transitions are one-directional; there is no
//! path back to an earlier state.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    New,
    Handshaking,
    Active,
    Closing,
    Closed,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("invalid session transition from {from:?} to {to:?}")]
pub struct InvalidTransition {
    pub from: SessionState,
    pub to: SessionState,
}

impl SessionState {
    /// Whether moving from `self` to `next` is a legal transition.
    #[must_use]
    pub fn can_transition_to(self, next: SessionState) -> bool {
        matches!(
            (self, next),
            (SessionState::New, SessionState::Handshaking)
                | (SessionState::Handshaking, SessionState::Active)
                | (SessionState::Handshaking, SessionState::Closing)
                | (SessionState::Active, SessionState::Closing)
                | (SessionState::Closing, SessionState::Closed)
        )
    }

    /// Attempts the transition, returning the new state or a typed
    /// error describing the illegal move (§7).
    pub fn transition(self, next: SessionState) -> Result<SessionState, InvalidTransition> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(InvalidTransition { from: self, to: next })
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_can_only_advance_to_handshaking() {
        assert!(SessionState::New.can_transition_to(SessionState::Handshaking));
        assert!(!SessionState::New.can_transition_to(SessionState::Active));
    }

    #[test]
    fn closing_can_only_advance_to_closed() {
        assert!(SessionState::Closing.can_transition_to(SessionState::Closed));
        assert!(!SessionState::Closing.can_transition_to(SessionState::Active));
    }

    #[test]
    fn closed_is_terminal() {
        assert!(SessionState::Closed.is_terminal());
        assert!(!SessionState::Closed.can_transition_to(SessionState::New));
    }

    #[test]
    fn illegal_transition_reports_both_states() {
        let err = SessionState::New.transition(SessionState::Closed).unwrap_err();
        assert_eq!(err.from, SessionState::New);
        assert_eq!(err.to, SessionState::Closed);
    }
}
