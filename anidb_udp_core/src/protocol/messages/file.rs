//! FILE command and file information

use crate::protocol::error::Result;
use crate::protocol::messages::{
    AniDBCommand, ActivityKind, Classification, DomainOutcome, Payload, Reply, field, text_field,
    validate_ed2k, validate_nonzero,
};
use serde::Serialize;

/// File fields requested from the server
pub const FILE_FMASK: &str = "79F8CAE100";

/// Anime fields requested alongside file fields
pub const FILE_AMASK: &str = "B0E0E0C0";

/// How a file is identified on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileLookup {
    /// Size plus lowercase ED2K digest
    Hash { size: u64, ed2k: String },
    /// AniDB file id
    Fid(u64),
}

impl FileLookup {
    /// Validated size and ED2K pair
    pub fn hash(size: u64, ed2k: &str) -> Result<Self> {
        Ok(Self::Hash {
            size: validate_nonzero("size", size)?,
            ed2k: validate_ed2k(ed2k)?,
        })
    }

    /// Validated file id
    pub fn fid(fid: u64) -> Result<Self> {
        Ok(Self::Fid(validate_nonzero("fid", fid)?))
    }

    /// Key suffix: the digest or the id
    pub fn key_part(&self) -> String {
        match self {
            Self::Hash { ed2k, .. } => ed2k.clone(),
            Self::Fid(fid) => fid.to_string(),
        }
    }

    pub(crate) fn parameters(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Hash { size, ed2k } => vec![("size", size.to_string()), ("ed2k", ed2k.clone())],
            Self::Fid(fid) => vec![("fid", fid.to_string())],
        }
    }
}

/// FILE command
#[derive(Debug, Clone)]
pub struct FileCommand {
    lookup: FileLookup,
}

impl FileCommand {
    /// Look a file up by size and ED2K digest
    pub fn by_hash(size: u64, ed2k: &str) -> Result<Self> {
        Ok(Self {
            lookup: FileLookup::hash(size, ed2k)?,
        })
    }

    /// Look a file up by id
    pub fn by_id(fid: u64) -> Result<Self> {
        Ok(Self {
            lookup: FileLookup::fid(fid)?,
        })
    }

    pub fn lookup(&self) -> &FileLookup {
        &self.lookup
    }
}

impl AniDBCommand for FileCommand {
    fn name(&self) -> &'static str {
        "FILE"
    }

    fn parameters(&self) -> Vec<(&'static str, String)> {
        let mut params = self.lookup.parameters();
        params.push(("fmask", FILE_FMASK.to_string()));
        params.push(("amask", FILE_AMASK.to_string()));
        params
    }

    fn key(&self) -> String {
        format!("GetFileInfo_{}", self.lookup.key_part())
    }

    fn activity(&self) -> ActivityKind {
        ActivityKind::GettingFileInfo
    }

    fn classify(&self, reply: &Reply<'_>) -> Classification {
        match reply.code {
            220 => match FileInfo::parse(&reply.fields(0)) {
                Some(info) => {
                    Classification::with(DomainOutcome::GotFileInfo, Payload::File(Box::new(info)))
                }
                None => Classification::bare(DomainOutcome::NoSuchFile),
            },
            322 => Classification::bare(DomainOutcome::MultipleFilesFound),
            _ => Classification::bare(DomainOutcome::NoSuchFile),
        }
    }
}

/// File and anime data returned for [`FILE_FMASK`] and [`FILE_AMASK`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FileInfo {
    pub fid: u64,
    pub aid: Option<u64>,
    pub eid: Option<u64>,
    pub gid: Option<u64>,
    /// Present when the file is in the user's mylist
    pub lid: Option<u64>,
    pub state: Option<u16>,
    pub size: Option<u64>,
    pub ed2k: Option<String>,
    pub md5: Option<String>,
    pub sha1: Option<String>,
    pub crc32: Option<String>,
    pub quality: Option<String>,
    pub source: Option<String>,
    pub video_codec: Option<String>,
    pub video_resolution: Option<String>,
    pub dub_language: Option<String>,
    pub sub_language: Option<String>,
    /// Length in seconds
    pub length: Option<u32>,
    pub anidb_filename: Option<String>,

    pub total_episodes: Option<u32>,
    pub year: Option<String>,
    pub anime_type: Option<String>,
    pub romaji_name: Option<String>,
    pub kanji_name: Option<String>,
    pub english_name: Option<String>,
    pub episode_number: Option<String>,
    pub episode_name: Option<String>,
    pub episode_romaji_name: Option<String>,
    pub group_name: Option<String>,
    pub group_short_name: Option<String>,
}

impl FileInfo {
    fn parse(fields: &[String]) -> Option<Self> {
        let id = |index: usize| field::<u64>(fields, index).filter(|v| *v != 0);

        Some(Self {
            fid: id(0)?,
            aid: id(1),
            eid: id(2),
            gid: id(3),
            lid: id(4),
            state: field(fields, 5),
            size: field(fields, 6),
            ed2k: text_field(fields, 7),
            md5: text_field(fields, 8),
            sha1: text_field(fields, 9),
            crc32: text_field(fields, 10),
            quality: text_field(fields, 11),
            source: text_field(fields, 12),
            video_codec: text_field(fields, 13),
            video_resolution: text_field(fields, 14),
            dub_language: text_field(fields, 15),
            sub_language: text_field(fields, 16),
            length: field(fields, 17),
            anidb_filename: text_field(fields, 18),
            total_episodes: field(fields, 19),
            year: text_field(fields, 20),
            anime_type: text_field(fields, 21),
            romaji_name: text_field(fields, 22),
            kanji_name: text_field(fields, 23),
            english_name: text_field(fields, 24),
            episode_number: text_field(fields, 25),
            episode_name: text_field(fields, 26),
            episode_romaji_name: text_field(fields, 27),
            group_name: text_field(fields, 28),
            group_short_name: text_field(fields, 29),
        })
    }
}
