//! ANIMEDESC command

use crate::protocol::codec::MultipartKind;
use crate::protocol::error::Result;
use crate::protocol::messages::{
    AniDBCommand, ActivityKind, Classification, DomainOutcome, Payload, Reply, multipart_text,
    validate_nonzero,
};
use serde::Serialize;

/// ANIMEDESC command, fetched part by part
#[derive(Debug, Clone)]
pub struct AnimeDescriptionCommand {
    aid: u64,
}

impl AnimeDescriptionCommand {
    pub fn new(aid: u64) -> Result<Self> {
        Ok(Self {
            aid: validate_nonzero("aid", aid)?,
        })
    }

    pub fn aid(&self) -> u64 {
        self.aid
    }
}

impl AniDBCommand for AnimeDescriptionCommand {
    fn name(&self) -> &'static str {
        "ANIMEDESC"
    }

    fn parameters(&self) -> Vec<(&'static str, String)> {
        vec![("aid", self.aid.to_string()), ("part", "0".to_string())]
    }

    fn key(&self) -> String {
        format!("GetAnimeDescription_{}", self.aid)
    }

    fn activity(&self) -> ActivityKind {
        ActivityKind::GettingAnimeDescription
    }

    fn classify(&self, reply: &Reply<'_>) -> Classification {
        match reply.code {
            233 => match multipart_text(reply) {
                Some(description) => Classification::with(
                    DomainOutcome::GotAnimeDescription,
                    Payload::AnimeDescription(AnimeDescription {
                        aid: self.aid,
                        description,
                    }),
                ),
                None => Classification::bare(DomainOutcome::NoSuchDescription),
            },
            330 => Classification::bare(DomainOutcome::NoSuchAnime),
            _ => Classification::bare(DomainOutcome::NoSuchDescription),
        }
    }

    fn multipart(&self) -> Option<MultipartKind> {
        Some(MultipartKind::AnimeDescription)
    }
}

/// Full anime description, reassembled from all parts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnimeDescription {
    pub aid: u64,
    pub description: String,
}
