//! CREATOR command

use crate::protocol::error::Result;
use crate::protocol::messages::{
    AniDBCommand, ActivityKind, Classification, DomainOutcome, Payload, Reply, field, text_field,
    timestamp_field, validate_nonzero,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// CREATOR command
#[derive(Debug, Clone)]
pub struct CreatorCommand {
    creator_id: u64,
}

impl CreatorCommand {
    pub fn new(creator_id: u64) -> Result<Self> {
        Ok(Self {
            creator_id: validate_nonzero("creatorid", creator_id)?,
        })
    }
}

impl AniDBCommand for CreatorCommand {
    fn name(&self) -> &'static str {
        "CREATOR"
    }

    fn parameters(&self) -> Vec<(&'static str, String)> {
        vec![("creatorid", self.creator_id.to_string())]
    }

    fn key(&self) -> String {
        format!("GetCreator_{}", self.creator_id)
    }

    fn activity(&self) -> ActivityKind {
        ActivityKind::GettingCreator
    }

    fn classify(&self, reply: &Reply<'_>) -> Classification {
        match reply.code {
            245 => match CreatorInfo::parse(&reply.fields(0)) {
                Some(info) => {
                    Classification::with(DomainOutcome::GotCreator, Payload::Creator(info))
                }
                None => Classification::bare(DomainOutcome::NoSuchCreator),
            },
            _ => Classification::bare(DomainOutcome::NoSuchCreator),
        }
    }
}

/// Person or company credited on anime
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatorInfo {
    pub creator_id: u64,
    pub kanji_name: Option<String>,
    pub transcription_name: Option<String>,
    /// 1 person, 2 company, 3 collaboration
    pub creator_type: Option<u8>,
    pub picture: Option<String>,
    pub url_english: Option<String>,
    pub url_japanese: Option<String>,
    pub wiki_english: Option<String>,
    pub wiki_japanese: Option<String>,
    pub last_update: Option<DateTime<Utc>>,
}

impl CreatorInfo {
    fn parse(fields: &[String]) -> Option<Self> {
        Some(Self {
            creator_id: field::<u64>(fields, 0).filter(|v| *v != 0)?,
            kanji_name: text_field(fields, 1),
            transcription_name: text_field(fields, 2),
            creator_type: field(fields, 3),
            picture: text_field(fields, 4),
            url_english: text_field(fields, 5),
            url_japanese: text_field(fields, 6),
            wiki_english: text_field(fields, 7),
            wiki_japanese: text_field(fields, 8),
            last_update: timestamp_field(fields, 9),
        })
    }
}
