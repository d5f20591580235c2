//! Session state management
//!
//! This module implements the state machine for a session's lifecycle:
//! `Disconnected -> Connected(ascii) -> Connected(negotiated) -> Disconnected`.

use crate::protocol::codec::TextEncoding;
use std::fmt;

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No transport
    Disconnected,
    /// Transport open, exchanging text in the given encoding
    Connected(TextEncoding),
}

impl SessionState {
    /// Encoding in use, if connected
    pub fn encoding(&self) -> Option<TextEncoding> {
        match self {
            SessionState::Connected(encoding) => Some(*encoding),
            SessionState::Disconnected => None,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Disconnected => write!(f, "Disconnected"),
            SessionState::Connected(encoding) => write!(f, "Connected ({encoding})"),
        }
    }
}

/// State transition validator
pub struct StateTransition {
    from: SessionState,
    to: SessionState,
}

impl StateTransition {
    /// Create a new state transition
    pub fn new(from: SessionState, to: SessionState) -> Self {
        Self { from, to }
    }

    /// Check if the transition is valid according to the state machine rules
    pub fn is_valid(&self) -> bool {
        use SessionState::*;

        match (self.from, self.to) {
            // A fresh session always starts in ASCII
            (Disconnected, Connected(TextEncoding::Ascii)) => true,
            (Disconnected, Connected(_)) => false,

            // Login negotiates the encoding once
            (Connected(TextEncoding::Ascii), Connected(_)) => true,
            (Connected(from), Connected(to)) => from == to,

            (Connected(_), Disconnected) => true,
            (Disconnected, Disconnected) => false,
        }
    }
}
