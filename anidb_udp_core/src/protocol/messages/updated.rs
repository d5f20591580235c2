//! UPDATED command

use crate::protocol::error::{ProtocolError, Result};
use crate::protocol::messages::{
    AniDBCommand, ActivityKind, Classification, DomainOutcome, Payload, Reply, field, list_field,
    timestamp_field,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Entity code for anime, the only one the server supports
pub const ENTITY_ANIME: u8 = 1;

/// UPDATED command: anime changed since a point in time
#[derive(Debug, Clone)]
pub struct UpdatedCommand {
    since: DateTime<Utc>,
}

impl UpdatedCommand {
    pub fn new(since: DateTime<Utc>) -> Result<Self> {
        if since.timestamp() <= 0 {
            return Err(ProtocolError::invalid_parameter(
                "time",
                "must be after the Unix epoch",
            ));
        }
        Ok(Self { since })
    }

    pub fn since(&self) -> DateTime<Utc> {
        self.since
    }
}

impl AniDBCommand for UpdatedCommand {
    fn name(&self) -> &'static str {
        "UPDATED"
    }

    fn parameters(&self) -> Vec<(&'static str, String)> {
        vec![
            ("entity", ENTITY_ANIME.to_string()),
            ("time", self.since.timestamp().to_string()),
        ]
    }

    fn key(&self) -> String {
        format!("GetUpdated_{}", self.since.timestamp())
    }

    fn activity(&self) -> ActivityKind {
        ActivityKind::GettingUpdated
    }

    fn classify(&self, reply: &Reply<'_>) -> Classification {
        match reply.code {
            243 => Classification::with(
                DomainOutcome::GotUpdated,
                Payload::Updated(UpdatedAnime::parse(&reply.fields(0))),
            ),
            _ => Classification::bare(DomainOutcome::NoUpdates),
        }
    }
}

/// Page of updated anime ids
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdatedAnime {
    pub entity: u8,
    /// Total number of updated records, may exceed `aids.len()`
    pub count: u32,
    /// Update time of the newest record on this page
    pub last_update: Option<DateTime<Utc>>,
    pub aids: Vec<u64>,
}

impl UpdatedAnime {
    fn parse(fields: &[String]) -> Self {
        Self {
            entity: field(fields, 0).unwrap_or(ENTITY_ANIME),
            count: field(fields, 1).unwrap_or_default(),
            last_update: timestamp_field(fields, 2),
            aids: list_field(fields, 3),
        }
    }
}
