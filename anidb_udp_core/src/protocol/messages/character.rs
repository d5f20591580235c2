//! CHARACTER command

use crate::protocol::error::Result;
use crate::protocol::messages::{
    AniDBCommand, ActivityKind, Classification, DomainOutcome, Payload, Reply, field, list_field,
    text_field, timestamp_field, validate_nonzero,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// CHARACTER command
#[derive(Debug, Clone)]
pub struct CharacterCommand {
    char_id: u64,
}

impl CharacterCommand {
    pub fn new(char_id: u64) -> Result<Self> {
        Ok(Self {
            char_id: validate_nonzero("charid", char_id)?,
        })
    }
}

impl AniDBCommand for CharacterCommand {
    fn name(&self) -> &'static str {
        "CHARACTER"
    }

    fn parameters(&self) -> Vec<(&'static str, String)> {
        vec![("charid", self.char_id.to_string())]
    }

    fn key(&self) -> String {
        format!("GetCharacter_{}", self.char_id)
    }

    fn activity(&self) -> ActivityKind {
        ActivityKind::GettingCharacter
    }

    fn classify(&self, reply: &Reply<'_>) -> Classification {
        match reply.code {
            235 => match CharacterInfo::parse(&reply.fields(0)) {
                Some(info) => {
                    Classification::with(DomainOutcome::GotCharacter, Payload::Character(info))
                }
                None => Classification::bare(DomainOutcome::NoSuchCharacter),
            },
            _ => Classification::bare(DomainOutcome::NoSuchCharacter),
        }
    }
}

/// Appearance of a character in one anime
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CharacterAppearance {
    pub aid: u64,
    /// 0 appears in, 1 cameo, 2 main, 3 secondary
    pub appearance: u8,
    /// Voice actor
    pub creator_id: Option<u64>,
    pub main_seiyuu: bool,
}

/// Character data from a 235 reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CharacterInfo {
    pub char_id: u64,
    pub kanji_name: Option<String>,
    pub transcription_name: Option<String>,
    pub picture: Option<String>,
    pub appearances: Vec<CharacterAppearance>,
    pub episode_ids: Vec<u64>,
    pub last_update: Option<DateTime<Utc>>,
    pub character_type: Option<u8>,
    pub gender: Option<String>,
}

impl CharacterInfo {
    fn parse(fields: &[String]) -> Option<Self> {
        Some(Self {
            char_id: field::<u64>(fields, 0).filter(|v| *v != 0)?,
            kanji_name: text_field(fields, 1),
            transcription_name: text_field(fields, 2),
            picture: text_field(fields, 3),
            appearances: fields
                .get(4)
                .map(|raw| parse_appearances(raw))
                .unwrap_or_default(),
            episode_ids: list_field(fields, 5),
            last_update: timestamp_field(fields, 6),
            character_type: field(fields, 7),
            gender: text_field(fields, 8),
        })
    }
}

/// `aid,appearance,creatorid,is_main'...`
fn parse_appearances(raw: &str) -> Vec<CharacterAppearance> {
    raw.split('\'')
        .filter_map(|block| {
            let parts: Vec<&str> = block.split(',').map(str::trim).collect();
            Some(CharacterAppearance {
                aid: parts.first()?.parse().ok()?,
                appearance: parts.get(1).and_then(|p| p.parse().ok()).unwrap_or_default(),
                creator_id: parts
                    .get(2)
                    .and_then(|p| p.parse().ok())
                    .filter(|id: &u64| *id != 0),
                main_seiyuu: parts.get(3).is_some_and(|p| *p == "1"),
            })
        })
        .collect()
}
