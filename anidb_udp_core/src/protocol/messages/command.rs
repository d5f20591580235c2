//! Command enumeration and per-exchange state
//!
//! [`Request`] closes the set of supported verbs; [`Command`] wraps one
//! request together with the reply data recorded by the engine.

use crate::protocol::codec::{MultipartKind, TextEncoding};
use crate::protocol::error::ProtocolError;
use crate::protocol::messages::{
    AniDBCommand, Classification, DomainOutcome, Payload, Reply,
    anime::AnimeDescriptionCommand,
    auth::{LoginCommand, LogoutCommand, PingCommand},
    calendar::CalendarCommand,
    character::CharacterCommand,
    creator::CreatorCommand,
    episode::EpisodeCommand,
    file::FileCommand,
    group::{GroupCommand, GroupStatusCommand},
    mylist::{
        MyListAddCommand, MyListDelCommand, MyListFileCommand, MyListStatsCommand,
        MyListUpdateCommand,
    },
    notify::{NotificationCommand, NotifyListCommand},
    review::ReviewCommand,
    updated::UpdatedCommand,
    vote::VoteCommand,
};
use serde::Serialize;

/// Activity reported to progress displays when a command starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ActivityKind {
    Login,
    Logout,
    Ping,
    GettingFileInfo,
    GettingMyListFile,
    GettingMyListStats,
    AddingFile,
    UpdatingFile,
    DeletingFile,
    Voting,
    GettingGroup,
    GettingGroupStatus,
    GettingCreator,
    GettingCharacter,
    GettingEpisode,
    GettingAnimeDescription,
    GettingReview,
    GettingCalendar,
    GettingUpdated,
    GettingNotifications,
}

/// How the engine attaches the session to a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSuffix {
    /// `&s={token}`
    Session,
    /// `s={token}` directly after the verb's trailing space
    Bare,
    /// `&enc={encoding}` instead of a session
    Encoding,
    /// Nothing
    None,
}

/// Enumeration of all supported AniDB commands
#[derive(Debug, Clone)]
pub enum Request {
    Login(LoginCommand),
    Logout(LogoutCommand),
    Ping(PingCommand),
    File(FileCommand),
    MyListFile(MyListFileCommand),
    MyListStats(MyListStatsCommand),
    MyListAdd(MyListAddCommand),
    MyListUpdate(MyListUpdateCommand),
    MyListDel(MyListDelCommand),
    Vote(VoteCommand),
    Group(GroupCommand),
    GroupStatus(GroupStatusCommand),
    Creator(CreatorCommand),
    Character(CharacterCommand),
    Episode(EpisodeCommand),
    AnimeDescription(AnimeDescriptionCommand),
    Review(ReviewCommand),
    Calendar(CalendarCommand),
    Updated(UpdatedCommand),
    NotifyList(NotifyListCommand),
    Notification(NotificationCommand),
}

impl Request {
    fn inner(&self) -> &dyn AniDBCommand {
        match self {
            Request::Login(cmd) => cmd,
            Request::Logout(cmd) => cmd,
            Request::Ping(cmd) => cmd,
            Request::File(cmd) => cmd,
            Request::MyListFile(cmd) => cmd,
            Request::MyListStats(cmd) => cmd,
            Request::MyListAdd(cmd) => cmd,
            Request::MyListUpdate(cmd) => cmd,
            Request::MyListDel(cmd) => cmd,
            Request::Vote(cmd) => cmd,
            Request::Group(cmd) => cmd,
            Request::GroupStatus(cmd) => cmd,
            Request::Creator(cmd) => cmd,
            Request::Character(cmd) => cmd,
            Request::Episode(cmd) => cmd,
            Request::AnimeDescription(cmd) => cmd,
            Request::Review(cmd) => cmd,
            Request::Calendar(cmd) => cmd,
            Request::Updated(cmd) => cmd,
            Request::NotifyList(cmd) => cmd,
            Request::Notification(cmd) => cmd,
        }
    }

    /// Check if this is the login handshake
    pub fn is_login(&self) -> bool {
        matches!(self, Request::Login(_))
    }

    /// Check if this is a keepalive ping
    pub fn is_ping(&self) -> bool {
        matches!(self, Request::Ping(_))
    }
}

impl AniDBCommand for Request {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn parameters(&self) -> Vec<(&'static str, String)> {
        self.inner().parameters()
    }

    fn encode(&self) -> String {
        self.inner().encode()
    }

    fn key(&self) -> String {
        self.inner().key()
    }

    fn activity(&self) -> ActivityKind {
        self.inner().activity()
    }

    fn classify(&self, reply: &Reply<'_>) -> Classification {
        self.inner().classify(reply)
    }

    fn session_suffix(&self) -> SessionSuffix {
        self.inner().session_suffix()
    }

    fn multipart(&self) -> Option<MultipartKind> {
        self.inner().multipart()
    }
}

macro_rules! impl_from_command {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for Request {
                fn from(cmd: $ty) -> Self {
                    Request::$variant(cmd)
                }
            }
        )*
    };
}

impl_from_command!(
    Login(LoginCommand),
    Logout(LogoutCommand),
    Ping(PingCommand),
    File(FileCommand),
    MyListFile(MyListFileCommand),
    MyListStats(MyListStatsCommand),
    MyListAdd(MyListAddCommand),
    MyListUpdate(MyListUpdateCommand),
    MyListDel(MyListDelCommand),
    Vote(VoteCommand),
    Group(GroupCommand),
    GroupStatus(GroupStatusCommand),
    Creator(CreatorCommand),
    Character(CharacterCommand),
    Episode(EpisodeCommand),
    AnimeDescription(AnimeDescriptionCommand),
    Review(ReviewCommand),
    Calendar(CalendarCommand),
    Updated(UpdatedCommand),
    NotifyList(NotifyListCommand),
    Notification(NotificationCommand),
);

/// Build the full wire text for a request
///
/// `requested` is the encoding announced by the login handshake.
pub fn build_wire_request(
    request: &Request,
    token: Option<&str>,
    requested: TextEncoding,
) -> String {
    let mut text = request.encode();
    match request.session_suffix() {
        SessionSuffix::Session => {
            text.push_str("&s=");
            text.push_str(token.unwrap_or_default());
        }
        SessionSuffix::Bare => {
            text.push_str("s=");
            text.push_str(token.unwrap_or_default());
        }
        SessionSuffix::Encoding => {
            text.push_str("&enc=");
            text.push_str(requested.wire_name());
        }
        SessionSuffix::None => {}
    }
    text
}

/// One request and the reply recorded for it
#[derive(Debug, Clone)]
pub struct Command {
    request: Request,
    raw_response: String,
    response_code: u16,
    error: Option<String>,
    result: Option<Classification>,
}

impl Command {
    /// Wrap a request
    pub fn new(request: impl Into<Request>) -> Self {
        Self {
            request: request.into(),
            raw_response: String::new(),
            response_code: 0,
            error: None,
            result: None,
        }
    }

    /// The wrapped request
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Identity key of the request
    pub fn key(&self) -> String {
        self.request.key()
    }

    /// Framed (or reassembled) reply text
    pub fn raw_response(&self) -> &str {
        &self.raw_response
    }

    /// Response code of the reply, `0` before processing
    pub fn response_code(&self) -> u16 {
        self.response_code
    }

    /// Check if the exchange failed below the protocol level
    pub fn error_occurred(&self) -> bool {
        self.error.is_some()
    }

    /// Description of the failure, if any
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Outcome, once processed
    pub fn outcome(&self) -> Option<DomainOutcome> {
        self.result.as_ref().map(|r| r.outcome)
    }

    /// Parsed payload, once processed
    pub fn payload(&self) -> Option<&Payload> {
        self.result.as_ref().and_then(|r| r.payload.as_ref())
    }

    /// Take the parsed payload
    pub fn into_payload(self) -> Option<Payload> {
        self.result.and_then(|r| r.payload)
    }

    pub(crate) fn reset(&mut self) {
        self.raw_response.clear();
        self.response_code = 0;
        self.error = None;
        self.result = None;
    }

    pub(crate) fn record_response(
        &mut self,
        raw_response: String,
        response_code: u16,
        classification: Classification,
    ) -> DomainOutcome {
        let outcome = classification.outcome;
        self.raw_response = raw_response;
        self.response_code = response_code;
        self.result = Some(classification);
        outcome
    }

    pub(crate) fn record_error(&mut self, error: &ProtocolError) -> DomainOutcome {
        self.error = Some(error.to_string());
        self.result = Some(Classification::bare(DomainOutcome::TransportError));
        DomainOutcome::TransportError
    }
}
