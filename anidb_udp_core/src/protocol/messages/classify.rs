//! Response classification
//!
//! Codes shared by every verb are resolved here first; everything else goes
//! to the verb's own dispatch table through [`AniDBCommand::classify`].
//! Classification is a pure function of the request and the framed text.
//! The resulting state changes are applied by the engine.

use super::{AniDBCommand, DomainOutcome, Payload, Reply, Request};
use log::warn;

/// Outcome plus any parsed payload
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub outcome: DomainOutcome,
    pub payload: Option<Payload>,
}

impl Classification {
    /// Outcome without payload
    pub fn bare(outcome: DomainOutcome) -> Self {
        Self {
            outcome,
            payload: None,
        }
    }

    /// Outcome with payload
    pub fn with(outcome: DomainOutcome, payload: Payload) -> Self {
        Self {
            outcome,
            payload: Some(payload),
        }
    }
}

/// Outcome for codes that mean the same thing for every verb
pub fn shared_outcome(code: u16) -> Option<DomainOutcome> {
    match code {
        555 => Some(DomainOutcome::Banned),
        598 => Some(DomainOutcome::UnknownCommand),
        501 => Some(DomainOutcome::LoginRequired),
        502 => Some(DomainOutcome::LoginFailed),
        506 => Some(DomainOutcome::InvalidSession),
        600 | 601 | 602 | 604 => Some(DomainOutcome::TemporaryServerError),
        _ => None,
    }
}

/// Classify a framed reply for `request`
pub fn classify(request: &Request, framed: &str, code: u16) -> Classification {
    if let Some(outcome) = shared_outcome(code) {
        warn!("{} received {outcome} ({code})", request.name());
        return Classification::bare(outcome);
    }

    let reply = Reply::parse(framed, code);
    request.classify(&reply)
}
