//! EPISODE command

use crate::protocol::error::Result;
use crate::protocol::messages::{
    AniDBCommand, ActivityKind, Classification, DomainOutcome, Payload, Reply, field, text_field,
    timestamp_field, validate_nonzero,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// EPISODE command
#[derive(Debug, Clone)]
pub struct EpisodeCommand {
    eid: u64,
}

impl EpisodeCommand {
    pub fn new(eid: u64) -> Result<Self> {
        Ok(Self {
            eid: validate_nonzero("eid", eid)?,
        })
    }
}

impl AniDBCommand for EpisodeCommand {
    fn name(&self) -> &'static str {
        "EPISODE"
    }

    fn parameters(&self) -> Vec<(&'static str, String)> {
        vec![("eid", self.eid.to_string())]
    }

    fn key(&self) -> String {
        format!("GetEpisode_{}", self.eid)
    }

    fn activity(&self) -> ActivityKind {
        ActivityKind::GettingEpisode
    }

    fn classify(&self, reply: &Reply<'_>) -> Classification {
        match reply.code {
            240 => match EpisodeInfo::parse(&reply.fields(0)) {
                Some(info) => {
                    Classification::with(DomainOutcome::GotEpisode, Payload::Episode(info))
                }
                None => Classification::bare(DomainOutcome::NoSuchEpisode),
            },
            _ => Classification::bare(DomainOutcome::NoSuchEpisode),
        }
    }
}

/// Episode data from a 240 reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EpisodeInfo {
    pub eid: u64,
    pub aid: Option<u64>,
    /// Length in minutes
    pub length: Option<u32>,
    /// Rating times 100
    pub rating: Option<u32>,
    pub votes: Option<u32>,
    /// Episode number with type prefix (`S1`, `C2`, ...)
    pub episode_number: Option<String>,
    pub english_name: Option<String>,
    pub romaji_name: Option<String>,
    pub kanji_name: Option<String>,
    pub aired: Option<DateTime<Utc>>,
    /// 1 regular, 2 special, 3 credit, 4 trailer, 5 parody, 6 other
    pub episode_type: Option<u8>,
}

impl EpisodeInfo {
    fn parse(fields: &[String]) -> Option<Self> {
        Some(Self {
            eid: field::<u64>(fields, 0).filter(|v| *v != 0)?,
            aid: field(fields, 1),
            length: field(fields, 2),
            rating: field(fields, 3),
            votes: field(fields, 4),
            episode_number: text_field(fields, 5),
            english_name: text_field(fields, 6),
            romaji_name: text_field(fields, 7),
            kanji_name: text_field(fields, 8),
            aired: timestamp_field(fields, 9),
            episode_type: field(fields, 10),
        })
    }
}
