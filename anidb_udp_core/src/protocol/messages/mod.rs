//! Type-safe message definitions for the AniDB UDP protocol
//!
//! Every AniDB verb has a command struct implementing [`AniDBCommand`]:
//! it builds its request text, names its identity key, and owns the
//! dispatch table from verb-specific response codes to a
//! [`DomainOutcome`] plus parsed payload. [`Request`] closes the set of
//! verbs into one enum; [`Command`] carries a request through one exchange.

pub mod anime;
pub mod auth;
pub mod calendar;
pub mod character;
pub mod classify;
pub mod command;
pub mod creator;
pub mod episode;
pub mod file;
pub mod group;
pub mod mylist;
pub mod notify;
pub mod outcome;
pub mod review;
pub mod updated;
pub mod vote;

pub use anime::{AnimeDescriptionCommand, AnimeDescription};
pub use auth::{LoginCommand, LogoutCommand, PingCommand, PongInfo, SessionInfo};
pub use calendar::{CalendarCommand, CalendarEntry};
pub use character::{CharacterCommand, CharacterInfo};
pub use classify::{Classification, classify, shared_outcome};
pub use command::{ActivityKind, Command, Request, SessionSuffix, build_wire_request};
pub use creator::{CreatorCommand, CreatorInfo};
pub use episode::{EpisodeCommand, EpisodeInfo};
pub use file::{FileCommand, FileInfo};
pub use group::{GroupCommand, GroupInfo, GroupStatusCommand, GroupStatusEntry};
pub use mylist::{
    FileState, MyListAddCommand, MyListAddResult, MyListDelCommand, MyListEntry, MyListFileCommand,
    MyListStats, MyListStatsCommand, MyListUpdateCommand,
};
pub use notify::{
    NotificationCommand, NotificationKind, NotifyEntry, NotifyListCommand, NotifyMessage,
    NotifyNotification,
};
pub use outcome::{DomainOutcome, Payload};
pub use review::{ReviewCommand, ReviewInfo};
pub use updated::{UpdatedAnime, UpdatedCommand};
pub use vote::{VoteCommand, VoteInfo, VoteType};

use crate::protocol::codec::MultipartKind;
use crate::protocol::error::{ProtocolError, Result};
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

/// Field separator within a data line
pub const PARAM_SEPARATOR: char = '|';

/// Separator of list values inside a field
pub const LIST_SEPARATOR: char = ',';

/// Newline encoding for multiline values
pub const ENCODED_NEWLINE: &str = "<br />";

/// Quote encoding
pub const ENCODED_QUOTE: &str = "`";

/// Base trait for all AniDB commands
pub trait AniDBCommand: fmt::Debug + Send + Sync {
    /// Get the verb
    fn name(&self) -> &'static str;

    /// Get command parameters in wire order
    fn parameters(&self) -> Vec<(&'static str, String)>;

    /// Build the request text, without any session suffix
    fn encode(&self) -> String {
        let params = self
            .parameters()
            .into_iter()
            .map(|(key, value)| format!("{key}={}", encode_value(&value)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{} {params}", self.name())
    }

    /// Identity key used by schedulers to deduplicate work
    fn key(&self) -> String;

    /// Activity reported when the command starts
    fn activity(&self) -> ActivityKind;

    /// Map a verb-specific reply to an outcome
    fn classify(&self, reply: &Reply<'_>) -> Classification;

    /// How the session token is attached to this verb
    fn session_suffix(&self) -> SessionSuffix {
        SessionSuffix::Session
    }

    /// Multi-part reply kind, for verbs whose replies may be split
    fn multipart(&self) -> Option<MultipartKind> {
        None
    }
}

/// A framed reply split into status line and data lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply<'a> {
    /// Response code
    pub code: u16,
    /// First line, code included
    pub status: &'a str,
    /// Non-empty data lines
    pub lines: Vec<&'a str>,
}

impl<'a> Reply<'a> {
    /// Split framed text into lines
    pub fn parse(text: &'a str, code: u16) -> Self {
        let mut lines = text.split('\n').filter(|line| !line.is_empty());
        let status = lines.next().unwrap_or_default();
        Self {
            code,
            status,
            lines: lines.collect(),
        }
    }

    /// Status line without the code
    pub fn message(&self) -> &'a str {
        self.status.get(4..).unwrap_or_default()
    }

    /// Decoded fields of data line `index`
    pub fn fields(&self, index: usize) -> Vec<String> {
        self.lines
            .get(index)
            .map(|line| split_fields(line))
            .unwrap_or_default()
    }

    /// Decoded fields of every data line
    pub fn rows(&self) -> impl Iterator<Item = Vec<String>> + '_ {
        self.lines.iter().map(|line| split_fields(line))
    }
}

/// Text of a reassembled `0|1|{text}` multi-part line, pipes kept
pub(crate) fn multipart_text(reply: &Reply<'_>) -> Option<String> {
    let text = reply.lines.first()?.splitn(3, PARAM_SEPARATOR).nth(2)?;
    Some(decode_value(text)).filter(|t| !t.is_empty())
}

fn split_fields(line: &str) -> Vec<String> {
    line.split(PARAM_SEPARATOR).map(decode_value).collect()
}

/// Parse field `index`, `None` when absent, empty or malformed
pub fn field<T: FromStr>(fields: &[String], index: usize) -> Option<T> {
    fields.get(index).and_then(|f| f.trim().parse().ok())
}

/// Text field `index`, `None` when absent or empty
pub fn text_field(fields: &[String], index: usize) -> Option<String> {
    fields
        .get(index)
        .filter(|f| !f.is_empty())
        .map(|f| f.to_string())
}

/// Unix timestamp in field `index`, `None` when absent or zero
pub fn timestamp_field(fields: &[String], index: usize) -> Option<DateTime<Utc>> {
    field::<i64>(fields, index)
        .filter(|secs| *secs > 0)
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}

/// Comma-separated list in field `index`
pub fn list_field<T: FromStr>(fields: &[String], index: usize) -> Vec<T> {
    fields
        .get(index)
        .map(|f| {
            f.split(LIST_SEPARATOR)
                .filter_map(|v| v.trim().parse().ok())
                .collect()
        })
        .unwrap_or_default()
}

/// Encode a value for transmission
///
/// `&` is sent as `&amp;` and newlines as `<br />`; carriage returns are
/// dropped. Everything else passes through.
pub fn encode_value(value: &str) -> String {
    let mut result = String::with_capacity(value.len() + 10);

    for ch in value.chars() {
        match ch {
            '&' => result.push_str("&amp;"),
            '\n' => result.push_str(ENCODED_NEWLINE),
            '\r' => continue,
            _ => result.push(ch),
        }
    }

    result
}

/// Decode a value received from the server
///
/// Reverses [`encode_value`] and turns the backtick quote encoding back
/// into an apostrophe.
pub fn decode_value(value: &str) -> String {
    value
        .replace("&amp;", "&")
        .replace(ENCODED_NEWLINE, "\n")
        .replace(ENCODED_QUOTE, "'")
}

/// Mask credentials and the session key in a request for logging
pub fn mask_request(request: &str) -> String {
    let Some((verb, query)) = request.split_once(' ') else {
        return request.to_string();
    };
    let masked = query
        .split('&')
        .map(|token| match token.split_once('=') {
            Some((key @ ("user" | "pass" | "s"), _)) => format!("{key}=******"),
            _ => token.to_string(),
        })
        .collect::<Vec<_>>()
        .join("&");
    format!("{verb} {masked}")
}

/// Validate a hex ED2K digest
pub fn validate_ed2k(ed2k: &str) -> Result<String> {
    if ed2k.len() == 32 && ed2k.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(ed2k.to_ascii_lowercase())
    } else {
        Err(ProtocolError::invalid_parameter(
            "ed2k",
            format!("expected 32 hex digits, got '{ed2k}'"),
        ))
    }
}

/// Validate a non-zero numeric id or size
pub fn validate_nonzero(parameter: &str, value: u64) -> Result<u64> {
    if value == 0 {
        Err(ProtocolError::invalid_parameter(parameter, "must be non-zero"))
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_value() {
        assert_eq!(encode_value("simple"), "simple");
        assert_eq!(encode_value("Tom & Jerry"), "Tom &amp; Jerry");
        assert_eq!(encode_value("line1\r\nline2"), "line1<br />line2");
    }

    #[test]
    fn test_decode_value() {
        assert_eq!(decode_value("Tom &amp; Jerry"), "Tom & Jerry");
        assert_eq!(decode_value("line1<br />line2"), "line1\nline2");
        assert_eq!(decode_value("it`s"), "it's");
    }

    #[test]
    fn test_reply_parse() {
        let reply = Reply::parse("297 CALENDAR\n1|2|0\n3|4|0\n", 297);
        assert_eq!(reply.status, "297 CALENDAR");
        assert_eq!(reply.message(), "CALENDAR");
        assert_eq!(reply.lines.len(), 2);
        assert_eq!(reply.fields(1), vec!["3", "4", "0"]);
        assert!(reply.fields(5).is_empty());
        assert_eq!(reply.rows().count(), 2);
    }

    #[test]
    fn test_reply_parse_status_only() {
        let reply = Reply::parse("598 UNKNOWN COMMAND\n", 598);
        assert_eq!(reply.message(), "UNKNOWN COMMAND");
        assert!(reply.lines.is_empty());

        let empty = Reply::parse("", 0);
        assert_eq!(empty.status, "");
        assert_eq!(empty.message(), "");
    }

    #[test]
    fn test_field_helpers() {
        let fields: Vec<String> = ["12", "", "abc", "1,2,x,3"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(field::<u64>(&fields, 0), Some(12));
        assert_eq!(field::<u64>(&fields, 1), None);
        assert_eq!(field::<u64>(&fields, 2), None);
        assert_eq!(field::<u64>(&fields, 9), None);
        assert_eq!(text_field(&fields, 1), None);
        assert_eq!(text_field(&fields, 2).as_deref(), Some("abc"));
        assert_eq!(list_field::<u64>(&fields, 3), vec![1, 2, 3]);

        let stamps: Vec<String> = ["1262304000", "0"].iter().map(|s| s.to_string()).collect();
        assert_eq!(
            timestamp_field(&stamps, 0).map(|t| t.timestamp()),
            Some(1262304000)
        );
        assert_eq!(timestamp_field(&stamps, 1), None);
    }

    #[test]
    fn test_mask_request() {
        assert_eq!(
            mask_request("AUTH user=bob&pass=hunter2&protover=3&enc=utf-16"),
            "AUTH user=******&pass=******&protover=3&enc=utf-16"
        );
        assert_eq!(
            mask_request("VOTE type=1&id=5&value=850&s=abcde"),
            "VOTE type=1&id=5&value=850&s=******"
        );
        assert_eq!(mask_request("LOGOUT s=abcde"), "LOGOUT s=******");
        assert_eq!(mask_request("PING"), "PING");
    }

    #[test]
    fn test_validate_ed2k() {
        let hash = "A".repeat(32);
        assert_eq!(validate_ed2k(&hash).unwrap(), "a".repeat(32));
        assert!(validate_ed2k("abc").is_err());
        assert!(validate_ed2k(&"g".repeat(32)).is_err());
    }

    #[test]
    fn test_validate_nonzero() {
        assert_eq!(validate_nonzero("aid", 5).unwrap(), 5);
        assert!(matches!(
            validate_nonzero("aid", 0),
            Err(ProtocolError::InvalidParameter { .. })
        ));
    }
}
