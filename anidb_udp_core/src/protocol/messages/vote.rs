//! VOTE command

use crate::protocol::error::{ProtocolError, Result};
use crate::protocol::messages::{
    AniDBCommand, ActivityKind, Classification, DomainOutcome, Payload, Reply, field, text_field,
    validate_nonzero,
};
use serde::Serialize;
use std::fmt;

/// Value that asks for the current vote instead of casting one
pub const VOTE_QUERY: i32 = 0;

/// Value that revokes a vote
pub const VOTE_REVOKE: i32 = -1;

/// Lowest and highest vote, AniDB's 1.00 to 10.00 scale
pub const VOTE_MIN: i32 = 100;
pub const VOTE_MAX: i32 = 1000;

/// What is being voted on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteType {
    Anime,
    /// Temporary vote for an anime still airing
    AnimeTemporary,
    Group,
    Episode,
}

impl VoteType {
    pub fn code(self) -> u8 {
        match self {
            Self::Anime => 1,
            Self::AnimeTemporary => 2,
            Self::Group => 3,
            Self::Episode => 6,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Anime),
            2 => Some(Self::AnimeTemporary),
            3 => Some(Self::Group),
            6 => Some(Self::Episode),
            _ => None,
        }
    }
}

impl fmt::Display for VoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// VOTE command
#[derive(Debug, Clone)]
pub struct VoteCommand {
    vote_type: VoteType,
    id: u64,
    value: i32,
}

impl VoteCommand {
    /// Cast a vote of `value` (100..=1000)
    pub fn new(vote_type: VoteType, id: u64, value: i32) -> Result<Self> {
        if value != VOTE_QUERY && value != VOTE_REVOKE && !(VOTE_MIN..=VOTE_MAX).contains(&value) {
            return Err(ProtocolError::invalid_parameter(
                "value",
                format!("must be within {VOTE_MIN}..={VOTE_MAX}, got {value}"),
            ));
        }
        Ok(Self {
            vote_type,
            id: validate_nonzero("id", id)?,
            value,
        })
    }

    /// Ask for the current vote
    pub fn query(vote_type: VoteType, id: u64) -> Result<Self> {
        Self::new(vote_type, id, VOTE_QUERY)
    }

    /// Revoke the current vote
    pub fn revoke(vote_type: VoteType, id: u64) -> Result<Self> {
        Self::new(vote_type, id, VOTE_REVOKE)
    }

    pub fn vote_type(&self) -> VoteType {
        self.vote_type
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn value(&self) -> i32 {
        self.value
    }
}

impl AniDBCommand for VoteCommand {
    fn name(&self) -> &'static str {
        "VOTE"
    }

    fn parameters(&self) -> Vec<(&'static str, String)> {
        vec![
            ("type", self.vote_type.to_string()),
            ("id", self.id.to_string()),
            ("value", self.value.to_string()),
        ]
    }

    fn key(&self) -> String {
        format!("Vote_{}_{}", self.id, self.vote_type)
    }

    fn activity(&self) -> ActivityKind {
        ActivityKind::Voting
    }

    fn classify(&self, reply: &Reply<'_>) -> Classification {
        let outcome = match reply.code {
            260 => DomainOutcome::Voted,
            261 => DomainOutcome::VoteFound,
            262 => DomainOutcome::VoteUpdated,
            263 => DomainOutcome::VoteRevoked,
            361 => DomainOutcome::InvalidVoteType,
            362 => DomainOutcome::InvalidVoteValue,
            363 => DomainOutcome::PermVoteNotAllowed,
            364 => DomainOutcome::AlreadyPermVoted,
            _ => DomainOutcome::NoSuchVote,
        };

        if outcome.is_success() {
            Classification::with(outcome, Payload::Vote(VoteInfo::parse(self, reply)))
        } else {
            Classification::bare(outcome)
        }
    }
}

/// Vote state reported by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoteInfo {
    /// Name of the voted entity, when the server sends it
    pub name: Option<String>,
    pub value: Option<i32>,
    pub vote_type: VoteType,
    pub id: u64,
}

impl VoteInfo {
    /// Accepts `name|value|type|id`, `id|value` and a bare `value`
    fn parse(command: &VoteCommand, reply: &Reply<'_>) -> Self {
        let fields = reply.fields(0);
        let (name, value, vote_type, id) = match fields.len() {
            n if n >= 4 => (
                text_field(&fields, 0),
                field(&fields, 1),
                field::<u8>(&fields, 2).and_then(VoteType::from_code),
                field(&fields, 3),
            ),
            2 => (None, field(&fields, 1), None, field(&fields, 0)),
            _ => (None, field(&fields, 0), None, None),
        };

        Self {
            name,
            value,
            vote_type: vote_type.unwrap_or(command.vote_type),
            id: id.unwrap_or(command.id),
        }
    }
}
