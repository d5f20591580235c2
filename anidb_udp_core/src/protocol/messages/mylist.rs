//! MyList verbs: MYLIST, MYLISTSTATS, MYLISTADD and MYLISTDEL

use crate::protocol::error::{ProtocolError, Result};
use crate::protocol::messages::file::FileLookup;
use crate::protocol::messages::{
    AniDBCommand, ActivityKind, Classification, DomainOutcome, Payload, Reply, SessionSuffix,
    field, text_field, timestamp_field, validate_nonzero,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Storage state of a mylist entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileState {
    #[default]
    Unknown,
    /// On a local hard drive
    Internal,
    /// On removable media
    External,
    Deleted,
    /// On a network share or remote storage
    Remote,
}

impl FileState {
    pub fn code(self) -> u8 {
        match self {
            Self::Unknown => 0,
            Self::Internal => 1,
            Self::External => 2,
            Self::Deleted => 3,
            Self::Remote => 4,
        }
    }

    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Self::Internal,
            2 => Self::External,
            3 => Self::Deleted,
            4 => Self::Remote,
            _ => Self::Unknown,
        }
    }
}

/// Watched flag, storage state and view date sent with MYLISTADD
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct EntryFields {
    viewed: bool,
    state: FileState,
    view_date: Option<DateTime<Utc>>,
}

impl EntryFields {
    fn parameters(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("viewed", u8::from(self.viewed).to_string()),
            ("state", self.state.code().to_string()),
        ];
        if let Some(date) = self.view_date {
            params.push(("viewdate", date.timestamp().to_string()));
        }
        params
    }
}

/// MYLIST command
#[derive(Debug, Clone)]
pub struct MyListFileCommand {
    lookup: FileLookup,
}

impl MyListFileCommand {
    pub fn by_id(fid: u64) -> Result<Self> {
        Ok(Self {
            lookup: FileLookup::fid(fid)?,
        })
    }

    pub fn by_hash(size: u64, ed2k: &str) -> Result<Self> {
        Ok(Self {
            lookup: FileLookup::hash(size, ed2k)?,
        })
    }
}

impl AniDBCommand for MyListFileCommand {
    fn name(&self) -> &'static str {
        "MYLIST"
    }

    fn parameters(&self) -> Vec<(&'static str, String)> {
        self.lookup.parameters()
    }

    fn key(&self) -> String {
        format!("GetMyListFile_{}", self.lookup.key_part())
    }

    fn activity(&self) -> ActivityKind {
        ActivityKind::GettingMyListFile
    }

    fn classify(&self, reply: &Reply<'_>) -> Classification {
        match reply.code {
            221 => match MyListEntry::parse(&reply.fields(0)) {
                Some(entry) => Classification::with(
                    DomainOutcome::GotMyListFile,
                    Payload::MyListEntry(entry),
                ),
                None => Classification::bare(DomainOutcome::NoSuchMyListFile),
            },
            312 => Classification::bare(DomainOutcome::MultipleMyListEntries),
            _ => Classification::bare(DomainOutcome::NoSuchMyListFile),
        }
    }
}

/// One mylist entry as returned by 221 and 310 replies
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MyListEntry {
    pub lid: u64,
    pub fid: Option<u64>,
    pub eid: Option<u64>,
    pub aid: Option<u64>,
    pub gid: Option<u64>,
    pub added: Option<DateTime<Utc>>,
    pub state: FileState,
    pub viewed_at: Option<DateTime<Utc>>,
    pub storage: Option<String>,
    pub source: Option<String>,
    pub other: Option<String>,
    pub file_state: Option<u16>,
}

impl MyListEntry {
    fn parse(fields: &[String]) -> Option<Self> {
        let id = |index: usize| field::<u64>(fields, index).filter(|v| *v != 0);
        Some(Self {
            lid: id(0)?,
            fid: id(1),
            eid: id(2),
            aid: id(3),
            gid: id(4),
            added: timestamp_field(fields, 5),
            state: FileState::from_code(field(fields, 6).unwrap_or_default()),
            viewed_at: timestamp_field(fields, 7),
            storage: text_field(fields, 8),
            source: text_field(fields, 9),
            other: text_field(fields, 10),
            file_state: field(fields, 11),
        })
    }

    /// Check if the entry has been watched
    pub fn is_viewed(&self) -> bool {
        self.viewed_at.is_some()
    }
}

/// MYLISTSTATS command
#[derive(Debug, Clone, Default)]
pub struct MyListStatsCommand;

impl MyListStatsCommand {
    pub fn new() -> Self {
        Self
    }
}

impl AniDBCommand for MyListStatsCommand {
    fn name(&self) -> &'static str {
        "MYLISTSTATS"
    }

    fn parameters(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    fn key(&self) -> String {
        "GetMyListStats".to_string()
    }

    fn activity(&self) -> ActivityKind {
        ActivityKind::GettingMyListStats
    }

    fn classify(&self, reply: &Reply<'_>) -> Classification {
        match reply.code {
            222 => Classification::with(
                DomainOutcome::GotMyListStats,
                Payload::MyListStats(MyListStats::parse(&reply.fields(0))),
            ),
            _ => Classification::bare(DomainOutcome::NoSuchMyListFile),
        }
    }

    fn session_suffix(&self) -> SessionSuffix {
        SessionSuffix::Bare
    }
}

/// Account-wide mylist statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MyListStats {
    pub anime: u64,
    pub episodes: u64,
    pub files: u64,
    /// Total size in MiB
    pub size_mib: u64,
    pub added_anime: u64,
    pub added_episodes: u64,
    pub added_files: u64,
    pub added_groups: u64,
    pub leech_percent: u64,
    pub glory_percent: u64,
    pub viewed_percent_of_db: u64,
    pub mylist_percent_of_db: u64,
    pub viewed_percent_of_mylist: u64,
    pub viewed_episodes: u64,
    pub votes: u64,
    pub reviews: u64,
    /// Viewed length in minutes
    pub viewed_minutes: u64,
}

impl MyListStats {
    fn parse(fields: &[String]) -> Self {
        let n = |index: usize| field::<u64>(fields, index).unwrap_or_default();
        Self {
            anime: n(0),
            episodes: n(1),
            files: n(2),
            size_mib: n(3),
            added_anime: n(4),
            added_episodes: n(5),
            added_files: n(6),
            added_groups: n(7),
            leech_percent: n(8),
            glory_percent: n(9),
            viewed_percent_of_db: n(10),
            mylist_percent_of_db: n(11),
            viewed_percent_of_mylist: n(12),
            viewed_episodes: n(13),
            votes: n(14),
            reviews: n(15),
            viewed_minutes: n(16),
        }
    }
}

/// What a MYLISTADD adds
#[derive(Debug, Clone, PartialEq, Eq)]
enum AddTarget {
    File(FileLookup),
    /// Generic entry for an episode of an anime
    Episode { aid: u64, epno: String },
}

/// MYLISTADD command
#[derive(Debug, Clone)]
pub struct MyListAddCommand {
    target: AddTarget,
    fields: EntryFields,
}

impl MyListAddCommand {
    /// Add a hashed file
    pub fn by_hash(size: u64, ed2k: &str) -> Result<Self> {
        Ok(Self {
            target: AddTarget::File(FileLookup::hash(size, ed2k)?),
            fields: EntryFields::default(),
        })
    }

    /// Add a generic entry for episode `epno` of anime `aid`
    pub fn generic(aid: u64, epno: impl Into<String>) -> Result<Self> {
        let epno = epno.into();
        if epno.trim().is_empty() {
            return Err(ProtocolError::invalid_parameter(
                "epno",
                "must not be empty",
            ));
        }
        Ok(Self {
            target: AddTarget::Episode {
                aid: validate_nonzero("aid", aid)?,
                epno,
            },
            fields: EntryFields::default(),
        })
    }

    pub fn viewed(mut self, viewed: bool) -> Self {
        self.fields.viewed = viewed;
        self
    }

    pub fn state(mut self, state: FileState) -> Self {
        self.fields.state = state;
        self
    }

    /// Mark as viewed at the given time
    pub fn viewed_at(mut self, date: DateTime<Utc>) -> Self {
        self.fields.viewed = true;
        self.fields.view_date = Some(date);
        self
    }
}

impl AniDBCommand for MyListAddCommand {
    fn name(&self) -> &'static str {
        "MYLISTADD"
    }

    fn parameters(&self) -> Vec<(&'static str, String)> {
        let mut params = match &self.target {
            AddTarget::File(lookup) => lookup.parameters(),
            AddTarget::Episode { aid, epno } => vec![
                ("aid", aid.to_string()),
                ("epno", epno.clone()),
                ("generic", "1".to_string()),
            ],
        };
        params.extend(self.fields.parameters());
        params
    }

    fn key(&self) -> String {
        match &self.target {
            AddTarget::File(lookup) => format!("AddFile_{}", lookup.key_part()),
            AddTarget::Episode { aid, epno } => format!("AddFile_{aid}_{epno}"),
        }
    }

    fn activity(&self) -> ActivityKind {
        ActivityKind::AddingFile
    }

    fn classify(&self, reply: &Reply<'_>) -> Classification {
        match reply.code {
            210 => Classification::with(
                DomainOutcome::MyListAdded,
                Payload::MyListAdd(MyListAddResult::added(reply)),
            ),
            310 => Classification::with(
                DomainOutcome::FileAlreadyInMyList,
                Payload::MyListAdd(MyListAddResult::existing(reply)),
            ),
            330 => Classification::bare(DomainOutcome::NoSuchAnime),
            350 => Classification::bare(DomainOutcome::NoSuchGroup),
            _ => Classification::bare(DomainOutcome::NoSuchFile),
        }
    }
}

/// MYLISTADD with `edit=1`
#[derive(Debug, Clone)]
pub struct MyListUpdateCommand {
    target: UpdateTarget,
    fields: EntryFields,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum UpdateTarget {
    Lid(u64),
    File(FileLookup),
}

impl MyListUpdateCommand {
    /// Edit the entry with mylist id `lid`
    pub fn by_lid(lid: u64) -> Result<Self> {
        Ok(Self {
            target: UpdateTarget::Lid(validate_nonzero("lid", lid)?),
            fields: EntryFields::default(),
        })
    }

    /// Edit the entry for a hashed file
    pub fn by_hash(size: u64, ed2k: &str) -> Result<Self> {
        Ok(Self {
            target: UpdateTarget::File(FileLookup::hash(size, ed2k)?),
            fields: EntryFields::default(),
        })
    }

    pub fn viewed(mut self, viewed: bool) -> Self {
        self.fields.viewed = viewed;
        self
    }

    pub fn state(mut self, state: FileState) -> Self {
        self.fields.state = state;
        self
    }

    pub fn viewed_at(mut self, date: DateTime<Utc>) -> Self {
        self.fields.viewed = true;
        self.fields.view_date = Some(date);
        self
    }
}

impl AniDBCommand for MyListUpdateCommand {
    fn name(&self) -> &'static str {
        "MYLISTADD"
    }

    fn parameters(&self) -> Vec<(&'static str, String)> {
        let mut params = match &self.target {
            UpdateTarget::Lid(lid) => vec![("lid", lid.to_string())],
            UpdateTarget::File(lookup) => lookup.parameters(),
        };
        params.push(("edit", "1".to_string()));
        params.extend(self.fields.parameters());
        params
    }

    fn key(&self) -> String {
        match &self.target {
            UpdateTarget::Lid(lid) => format!("UpdateFile_{lid}"),
            UpdateTarget::File(lookup) => format!("UpdateFile_{}", lookup.key_part()),
        }
    }

    fn activity(&self) -> ActivityKind {
        ActivityKind::UpdatingFile
    }

    fn classify(&self, reply: &Reply<'_>) -> Classification {
        match reply.code {
            311 => Classification::with(
                DomainOutcome::MyListEdited,
                Payload::MyListAdd(MyListAddResult::edited(reply)),
            ),
            210 => Classification::with(
                DomainOutcome::MyListAdded,
                Payload::MyListAdd(MyListAddResult::added(reply)),
            ),
            320 => Classification::bare(DomainOutcome::NoSuchFile),
            _ => Classification::bare(DomainOutcome::NoSuchMyListEntry),
        }
    }
}

/// Result of MYLISTADD
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MyListAddResult {
    /// Id of the new entry (210)
    pub lid: Option<u64>,
    /// Number of edited entries (311)
    pub edited: Option<u32>,
    /// Entry already present (310)
    pub existing: Option<MyListEntry>,
}

impl MyListAddResult {
    fn added(reply: &Reply<'_>) -> Self {
        Self {
            lid: field(&reply.fields(0), 0),
            ..Self::default()
        }
    }

    fn edited(reply: &Reply<'_>) -> Self {
        Self {
            edited: field(&reply.fields(0), 0),
            ..Self::default()
        }
    }

    fn existing(reply: &Reply<'_>) -> Self {
        let existing = MyListEntry::parse(&reply.fields(0));
        Self {
            lid: existing.as_ref().map(|e| e.lid),
            existing,
            ..Self::default()
        }
    }
}

/// MYLISTDEL command
#[derive(Debug, Clone)]
pub struct MyListDelCommand {
    target: UpdateTarget,
}

impl MyListDelCommand {
    pub fn by_hash(size: u64, ed2k: &str) -> Result<Self> {
        Ok(Self {
            target: UpdateTarget::File(FileLookup::hash(size, ed2k)?),
        })
    }

    pub fn by_lid(lid: u64) -> Result<Self> {
        Ok(Self {
            target: UpdateTarget::Lid(validate_nonzero("lid", lid)?),
        })
    }
}

impl AniDBCommand for MyListDelCommand {
    fn name(&self) -> &'static str {
        "MYLISTDEL"
    }

    fn parameters(&self) -> Vec<(&'static str, String)> {
        match &self.target {
            UpdateTarget::Lid(lid) => vec![("lid", lid.to_string())],
            UpdateTarget::File(lookup) => lookup.parameters(),
        }
    }

    fn key(&self) -> String {
        match &self.target {
            UpdateTarget::Lid(lid) => format!("DeleteFile_{lid}"),
            UpdateTarget::File(lookup) => format!("DeleteFile_{}", lookup.key_part()),
        }
    }

    fn activity(&self) -> ActivityKind {
        ActivityKind::DeletingFile
    }

    fn classify(&self, reply: &Reply<'_>) -> Classification {
        match reply.code {
            211 => Classification::with(
                DomainOutcome::MyListDeleted,
                Payload::MyListDeleted {
                    count: field(&reply.fields(0), 0).unwrap_or(1),
                },
            ),
            _ => Classification::bare(DomainOutcome::NoSuchMyListEntry),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ED2K: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn test_mylist_file_encode() {
        let cmd = MyListFileCommand::by_id(42).unwrap();
        assert_eq!(cmd.encode(), "MYLIST fid=42");
        assert_eq!(cmd.key(), "GetMyListFile_42");

        let cmd = MyListFileCommand::by_hash(1000, ED2K).unwrap();
        assert_eq!(cmd.encode(), format!("MYLIST size=1000&ed2k={ED2K}"));
        assert_eq!(cmd.key(), format!("GetMyListFile_{ED2K}"));
    }

    #[test]
    fn test_mylist_entry_reply() {
        let cmd = MyListFileCommand::by_id(42).unwrap();
        let text = "221 MYLIST\n900|42|7|3|11|1262304000|1|1262390400|shelf 2|||1\n";
        let result = cmd.classify(&Reply::parse(text, 221));
        assert_eq!(result.outcome, DomainOutcome::GotMyListFile);
        let Some(Payload::MyListEntry(entry)) = result.payload else {
            panic!("expected mylist payload");
        };
        assert_eq!(entry.lid, 900);
        assert_eq!(entry.fid, Some(42));
        assert_eq!(entry.state, FileState::Internal);
        assert!(entry.is_viewed());
        assert_eq!(entry.storage.as_deref(), Some("shelf 2"));
        assert_eq!(entry.source, None);
        assert_eq!(entry.file_state, Some(1));

        let reply = Reply::parse("312 MULTIPLE MYLIST ENTRIES\n", 312);
        assert_eq!(
            cmd.classify(&reply).outcome,
            DomainOutcome::MultipleMyListEntries
        );
        let reply = Reply::parse("321 NO SUCH ENTRY\n", 321);
        assert_eq!(cmd.classify(&reply).outcome, DomainOutcome::NoSuchMyListFile);
    }

    #[test]
    fn test_mylist_stats() {
        let cmd = MyListStatsCommand::new();
        assert_eq!(cmd.encode(), "MYLISTSTATS ");
        assert_eq!(cmd.session_suffix(), SessionSuffix::Bare);

        let text = "222 MYLIST STATS\n120|1500|1600|512000|3|4|5|6|10|20|1|2|80|1200|50|2|36000\n";
        let result = cmd.classify(&Reply::parse(text, 222));
        let Some(Payload::MyListStats(stats)) = result.payload else {
            panic!("expected stats payload");
        };
        assert_eq!(stats.anime, 120);
        assert_eq!(stats.size_mib, 512000);
        assert_eq!(stats.viewed_percent_of_mylist, 80);
        assert_eq!(stats.viewed_minutes, 36000);

        let reply = Reply::parse("999 ?\n", 999);
        assert_eq!(cmd.classify(&reply).outcome, DomainOutcome::NoSuchMyListFile);
    }

    #[test]
    fn test_mylist_add_encode() {
        let cmd = MyListAddCommand::by_hash(1000, ED2K)
            .unwrap()
            .state(FileState::Internal)
            .viewed(true);
        assert_eq!(
            cmd.encode(),
            format!("MYLISTADD size=1000&ed2k={ED2K}&viewed=1&state=1")
        );
        assert_eq!(cmd.key(), format!("AddFile_{ED2K}"));

        let date = DateTime::from_timestamp(1262304000, 0).unwrap();
        let cmd = MyListAddCommand::generic(17, "5").unwrap().viewed_at(date);
        assert_eq!(
            cmd.encode(),
            "MYLISTADD aid=17&epno=5&generic=1&viewed=1&state=0&viewdate=1262304000"
        );
        assert!(MyListAddCommand::generic(0, "5").is_err());
        assert!(MyListAddCommand::generic(17, "").is_err());
    }

    #[test]
    fn test_mylist_add_replies() {
        let cmd = MyListAddCommand::by_hash(1000, ED2K).unwrap();

        let result = cmd.classify(&Reply::parse("210 MYLIST ENTRY ADDED\n12345\n", 210));
        assert_eq!(result.outcome, DomainOutcome::MyListAdded);
        assert_eq!(
            result.payload,
            Some(Payload::MyListAdd(MyListAddResult {
                lid: Some(12345),
                ..MyListAddResult::default()
            }))
        );

        let text = "310 FILE ALREADY IN MYLIST\n900|42|7|3|11|1262304000|1|0||||1\n";
        let result = cmd.classify(&Reply::parse(text, 310));
        assert_eq!(result.outcome, DomainOutcome::FileAlreadyInMyList);
        let Some(Payload::MyListAdd(added)) = result.payload else {
            panic!("expected add payload");
        };
        assert_eq!(added.lid, Some(900));
        assert!(!added.existing.unwrap().is_viewed());

        for (code, expected) in [
            (320, DomainOutcome::NoSuchFile),
            (330, DomainOutcome::NoSuchAnime),
            (350, DomainOutcome::NoSuchGroup),
        ] {
            let text = format!("{code} X\n");
            assert_eq!(cmd.classify(&Reply::parse(&text, code)).outcome, expected);
        }
    }

    #[test]
    fn test_mylist_update() {
        let cmd = MyListUpdateCommand::by_lid(900)
            .unwrap()
            .state(FileState::Deleted);
        assert_eq!(
            cmd.encode(),
            "MYLISTADD lid=900&edit=1&viewed=0&state=3"
        );
        assert_eq!(cmd.key(), "UpdateFile_900");

        let result = cmd.classify(&Reply::parse("311 MYLIST ENTRY EDITED\n1\n", 311));
        assert_eq!(result.outcome, DomainOutcome::MyListEdited);
        assert_eq!(
            result.payload,
            Some(Payload::MyListAdd(MyListAddResult {
                edited: Some(1),
                ..MyListAddResult::default()
            }))
        );

        let reply = Reply::parse("411 NO SUCH MYLIST ENTRY\n", 411);
        assert_eq!(cmd.classify(&reply).outcome, DomainOutcome::NoSuchMyListEntry);

        let cmd = MyListUpdateCommand::by_hash(1000, ED2K).unwrap();
        assert_eq!(cmd.key(), format!("UpdateFile_{ED2K}"));
        assert!(cmd.encode().contains("&edit=1&"));
    }

    #[test]
    fn test_mylist_del() {
        let cmd = MyListDelCommand::by_lid(900).unwrap();
        assert_eq!(cmd.encode(), "MYLISTDEL lid=900");
        assert_eq!(cmd.key(), "DeleteFile_900");

        let result = cmd.classify(&Reply::parse("211 MYLIST ENTRY DELETED\n1\n", 211));
        assert_eq!(result.outcome, DomainOutcome::MyListDeleted);
        assert_eq!(result.payload, Some(Payload::MyListDeleted { count: 1 }));

        let reply = Reply::parse("411 NO SUCH MYLIST ENTRY\n", 411);
        assert_eq!(cmd.classify(&reply).outcome, DomainOutcome::NoSuchMyListEntry);

        let cmd = MyListDelCommand::by_hash(1000, ED2K).unwrap();
        assert_eq!(cmd.key(), format!("DeleteFile_{ED2K}"));
        assert!(MyListDelCommand::by_lid(0).is_err());
    }

    #[test]
    fn test_file_state_codes() {
        for code in 0..=4 {
            assert_eq!(FileState::from_code(code).code(), code);
        }
        assert_eq!(FileState::from_code(9), FileState::Unknown);
    }
}
