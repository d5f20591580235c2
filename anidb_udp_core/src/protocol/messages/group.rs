//! GROUP and GROUPSTATUS commands

use crate::protocol::error::Result;
use crate::protocol::messages::{
    AniDBCommand, ActivityKind, Classification, DomainOutcome, Payload, Reply, field, text_field,
    timestamp_field, validate_nonzero,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// GROUP command
#[derive(Debug, Clone)]
pub struct GroupCommand {
    gid: u64,
}

impl GroupCommand {
    pub fn new(gid: u64) -> Result<Self> {
        Ok(Self {
            gid: validate_nonzero("gid", gid)?,
        })
    }
}

impl AniDBCommand for GroupCommand {
    fn name(&self) -> &'static str {
        "GROUP"
    }

    fn parameters(&self) -> Vec<(&'static str, String)> {
        vec![("gid", self.gid.to_string())]
    }

    fn key(&self) -> String {
        format!("GetGroup_{}", self.gid)
    }

    fn activity(&self) -> ActivityKind {
        ActivityKind::GettingGroup
    }

    fn classify(&self, reply: &Reply<'_>) -> Classification {
        match reply.code {
            250 => match GroupInfo::parse(&reply.fields(0)) {
                Some(info) => Classification::with(DomainOutcome::GotGroup, Payload::Group(info)),
                None => Classification::bare(DomainOutcome::NoSuchGroup),
            },
            _ => Classification::bare(DomainOutcome::NoSuchGroup),
        }
    }
}

/// Relation between two release groups
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupRelation {
    pub gid: u64,
    /// 1 participant in, 2 parent of, 4 merged from, 5 now known as, 6 other
    pub relation_type: u8,
}

/// Release group data from a 250 reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupInfo {
    pub gid: u64,
    /// Rating times 100
    pub rating: Option<u32>,
    pub votes: Option<u32>,
    pub anime_count: Option<u32>,
    pub file_count: Option<u32>,
    pub name: Option<String>,
    pub short_name: Option<String>,
    pub irc_channel: Option<String>,
    pub irc_server: Option<String>,
    pub url: Option<String>,
    pub picture: Option<String>,
    pub founded: Option<DateTime<Utc>>,
    pub disbanded: Option<DateTime<Utc>>,
    pub date_flags: Option<u16>,
    pub last_release: Option<DateTime<Utc>>,
    pub last_activity: Option<DateTime<Utc>>,
    pub relations: Vec<GroupRelation>,
}

impl GroupInfo {
    fn parse(fields: &[String]) -> Option<Self> {
        Some(Self {
            gid: field::<u64>(fields, 0).filter(|v| *v != 0)?,
            rating: field(fields, 1),
            votes: field(fields, 2),
            anime_count: field(fields, 3),
            file_count: field(fields, 4),
            name: text_field(fields, 5),
            short_name: text_field(fields, 6),
            irc_channel: text_field(fields, 7),
            irc_server: text_field(fields, 8),
            url: text_field(fields, 9),
            picture: text_field(fields, 10),
            founded: timestamp_field(fields, 11),
            disbanded: timestamp_field(fields, 12),
            date_flags: field(fields, 13),
            last_release: timestamp_field(fields, 14),
            last_activity: timestamp_field(fields, 15),
            relations: fields
                .get(16)
                .map(|raw| parse_relations(raw))
                .unwrap_or_default(),
        })
    }
}

/// `gid,type'gid,type...`
fn parse_relations(raw: &str) -> Vec<GroupRelation> {
    raw.split('\'')
        .filter_map(|pair| {
            let (gid, kind) = pair.split_once(',')?;
            Some(GroupRelation {
                gid: gid.trim().parse().ok()?,
                relation_type: kind.trim().parse().ok()?,
            })
        })
        .collect()
}

/// GROUPSTATUS command
#[derive(Debug, Clone)]
pub struct GroupStatusCommand {
    aid: u64,
}

impl GroupStatusCommand {
    pub fn new(aid: u64) -> Result<Self> {
        Ok(Self {
            aid: validate_nonzero("aid", aid)?,
        })
    }
}

impl AniDBCommand for GroupStatusCommand {
    fn name(&self) -> &'static str {
        "GROUPSTATUS"
    }

    fn parameters(&self) -> Vec<(&'static str, String)> {
        vec![("aid", self.aid.to_string())]
    }

    fn key(&self) -> String {
        format!("GetGroupStatus_{}", self.aid)
    }

    fn activity(&self) -> ActivityKind {
        ActivityKind::GettingGroupStatus
    }

    fn classify(&self, reply: &Reply<'_>) -> Classification {
        match reply.code {
            225 => {
                let entries: Vec<_> = reply
                    .rows()
                    .filter_map(|row| GroupStatusEntry::parse(&row))
                    .collect();
                Classification::with(DomainOutcome::GotGroupStatus, Payload::GroupStatus(entries))
            }
            330 => Classification::bare(DomainOutcome::NoSuchAnime),
            _ => Classification::bare(DomainOutcome::NoGroupsFound),
        }
    }
}

/// Release progress of one group for an anime
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupStatusEntry {
    pub gid: u64,
    pub name: Option<String>,
    /// Completion state code
    pub state: Option<u8>,
    pub last_episode: Option<u32>,
    pub rating: Option<u32>,
    pub votes: Option<u32>,
    /// Released episode ranges, e.g. `1-12`
    pub episode_range: Option<String>,
}

impl GroupStatusEntry {
    fn parse(fields: &[String]) -> Option<Self> {
        Some(Self {
            gid: field::<u64>(fields, 0).filter(|v| *v != 0)?,
            name: text_field(fields, 1),
            state: field(fields, 2),
            last_episode: field(fields, 3),
            rating: field(fields, 4),
            votes: field(fields, 5),
            episode_range: text_field(fields, 6),
        })
    }
}
