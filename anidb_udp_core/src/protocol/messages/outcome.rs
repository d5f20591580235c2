//! Domain outcomes and parsed payloads of classified replies

use super::{
    AnimeDescription, CalendarEntry, CharacterInfo, CreatorInfo, EpisodeInfo, FileInfo,
    GroupInfo, GroupStatusEntry, MyListAddResult, MyListEntry, MyListStats, NotifyEntry,
    NotifyMessage, NotifyNotification, PongInfo, ReviewInfo, SessionInfo, UpdatedAnime, VoteInfo,
};
use serde::Serialize;
use std::fmt;

/// Result of one processed command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DomainOutcome {
    // Session
    LoggedIn,
    LoginFailed,
    LoginRequired,
    ClientVersionOutdated,
    ClientBanned,
    IllegalInput,
    LoggedOut,
    NotLoggedIn,
    Pong,

    // Files and mylist
    GotFileInfo,
    NoSuchFile,
    MultipleFilesFound,
    GotMyListFile,
    NoSuchMyListFile,
    MultipleMyListEntries,
    GotMyListStats,
    MyListAdded,
    FileAlreadyInMyList,
    MyListEdited,
    MyListDeleted,
    NoSuchMyListEntry,

    // Votes
    Voted,
    VoteFound,
    VoteUpdated,
    VoteRevoked,
    NoSuchVote,
    InvalidVoteType,
    InvalidVoteValue,
    PermVoteNotAllowed,
    AlreadyPermVoted,

    // Metadata lookups
    NoSuchAnime,
    GotGroup,
    NoSuchGroup,
    GotGroupStatus,
    NoGroupsFound,
    GotCreator,
    NoSuchCreator,
    GotCharacter,
    NoSuchCharacter,
    GotEpisode,
    NoSuchEpisode,
    GotAnimeDescription,
    NoSuchDescription,
    GotReview,
    NoSuchReview,
    GotCalendar,
    CalendarEmpty,
    GotUpdated,
    NoUpdates,
    GotNotifyList,
    GotNotification,
    GotNotifyMessage,
    NoSuchNotification,

    // Shared across verbs
    Banned,
    UnknownCommand,
    InvalidSession,
    TemporaryServerError,
    TransportError,
}

impl DomainOutcome {
    /// Check if the server accepted the command
    pub fn is_success(&self) -> bool {
        use DomainOutcome::*;
        matches!(
            self,
            LoggedIn
                | LoggedOut
                | Pong
                | GotFileInfo
                | GotMyListFile
                | GotMyListStats
                | MyListAdded
                | FileAlreadyInMyList
                | MyListEdited
                | MyListDeleted
                | Voted
                | VoteFound
                | VoteUpdated
                | VoteRevoked
                | GotGroup
                | GotGroupStatus
                | GotCreator
                | GotCharacter
                | GotEpisode
                | GotAnimeDescription
                | GotReview
                | GotCalendar
                | GotUpdated
                | GotNotifyList
                | GotNotification
                | GotNotifyMessage
        )
    }

    /// Check if this outcome tears down the session
    pub fn triggers_reconnect(&self) -> bool {
        matches!(
            self,
            DomainOutcome::UnknownCommand | DomainOutcome::InvalidSession
        )
    }
}

impl fmt::Display for DomainOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Data parsed from a successful reply
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Payload {
    Session(SessionInfo),
    Pong(PongInfo),
    File(Box<FileInfo>),
    MyListEntry(MyListEntry),
    MyListStats(MyListStats),
    MyListAdd(MyListAddResult),
    MyListDeleted { count: u32 },
    Vote(VoteInfo),
    Group(GroupInfo),
    GroupStatus(Vec<GroupStatusEntry>),
    Creator(CreatorInfo),
    Character(CharacterInfo),
    Episode(EpisodeInfo),
    AnimeDescription(AnimeDescription),
    Review(ReviewInfo),
    Calendar(Vec<CalendarEntry>),
    Updated(UpdatedAnime),
    NotifyList(Vec<NotifyEntry>),
    Notification(NotifyNotification),
    NotifyMessage(NotifyMessage),
}
