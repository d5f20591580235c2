//! NOTIFYLIST and NOTIFYGET commands

use crate::protocol::error::{ProtocolError, Result};
use crate::protocol::messages::{
    AniDBCommand, ActivityKind, Classification, DomainOutcome, Payload, Reply, field, list_field,
    text_field, timestamp_field, validate_nonzero,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Private message or file notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Message,
    Notification,
}

impl NotificationKind {
    pub fn code(self) -> &'static str {
        match self {
            Self::Message => "M",
            Self::Notification => "N",
        }
    }
}

impl FromStr for NotificationKind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "M" | "m" => Ok(Self::Message),
            "N" | "n" => Ok(Self::Notification),
            other => Err(ProtocolError::invalid_parameter(
                "type",
                format!("expected M or N, got '{other}'"),
            )),
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// NOTIFYLIST command
#[derive(Debug, Clone, Default)]
pub struct NotifyListCommand;

impl NotifyListCommand {
    pub fn new() -> Self {
        Self
    }
}

impl AniDBCommand for NotifyListCommand {
    fn name(&self) -> &'static str {
        "NOTIFYLIST"
    }

    fn parameters(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    fn key(&self) -> String {
        "GetNotifyList".to_string()
    }

    fn activity(&self) -> ActivityKind {
        ActivityKind::GettingNotifications
    }

    fn classify(&self, reply: &Reply<'_>) -> Classification {
        match reply.code {
            291 => {
                let entries: Vec<_> = reply
                    .rows()
                    .filter_map(|row| NotifyEntry::parse(&row))
                    .collect();
                Classification::with(DomainOutcome::GotNotifyList, Payload::NotifyList(entries))
            }
            _ => Classification::bare(DomainOutcome::NoSuchNotification),
        }
    }
}

/// Pending notification reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotifyEntry {
    pub kind: NotificationKind,
    pub id: u64,
}

impl NotifyEntry {
    fn parse(fields: &[String]) -> Option<Self> {
        Some(Self {
            kind: fields.first()?.parse().ok()?,
            id: field(fields, 1)?,
        })
    }
}

/// NOTIFYGET command
#[derive(Debug, Clone)]
pub struct NotificationCommand {
    kind: NotificationKind,
    id: u64,
}

impl NotificationCommand {
    pub fn new(kind: NotificationKind, id: u64) -> Result<Self> {
        Ok(Self {
            kind,
            id: validate_nonzero("id", id)?,
        })
    }

    /// Build from an entry of a NOTIFYLIST reply
    pub fn for_entry(entry: &NotifyEntry) -> Result<Self> {
        Self::new(entry.kind, entry.id)
    }
}

impl AniDBCommand for NotificationCommand {
    fn name(&self) -> &'static str {
        "NOTIFYGET"
    }

    fn parameters(&self) -> Vec<(&'static str, String)> {
        vec![("type", self.kind.to_string()), ("id", self.id.to_string())]
    }

    fn key(&self) -> String {
        format!("GetNotification_{}_{}", self.kind, self.id)
    }

    fn activity(&self) -> ActivityKind {
        ActivityKind::GettingNotifications
    }

    fn classify(&self, reply: &Reply<'_>) -> Classification {
        let fields = reply.fields(0);
        match reply.code {
            292 => match NotifyMessage::parse(&fields) {
                Some(message) => Classification::with(
                    DomainOutcome::GotNotifyMessage,
                    Payload::NotifyMessage(message),
                ),
                None => Classification::bare(DomainOutcome::NoSuchNotification),
            },
            293 => match NotifyNotification::parse(&fields) {
                Some(notification) => Classification::with(
                    DomainOutcome::GotNotification,
                    Payload::Notification(notification),
                ),
                None => Classification::bare(DomainOutcome::NoSuchNotification),
            },
            _ => Classification::bare(DomainOutcome::NoSuchNotification),
        }
    }
}

/// Private message from a 292 reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotifyMessage {
    pub id: u64,
    pub from_uid: Option<u64>,
    pub from_name: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub message_type: Option<u8>,
    pub title: Option<String>,
    pub body: Option<String>,
}

impl NotifyMessage {
    fn parse(fields: &[String]) -> Option<Self> {
        Some(Self {
            id: field::<u64>(fields, 0).filter(|v| *v != 0)?,
            from_uid: field(fields, 1),
            from_name: text_field(fields, 2),
            date: timestamp_field(fields, 3),
            message_type: field(fields, 4),
            title: text_field(fields, 5),
            body: text_field(fields, 6),
        })
    }
}

/// File notification from a 293 reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotifyNotification {
    /// Anime or group the notification is about
    pub related_id: u64,
    pub notification_type: Option<u8>,
    pub pending: Option<u32>,
    pub date: Option<DateTime<Utc>>,
    pub related_name: Option<String>,
    pub fids: Vec<u64>,
}

impl NotifyNotification {
    fn parse(fields: &[String]) -> Option<Self> {
        Some(Self {
            related_id: field::<u64>(fields, 0).filter(|v| *v != 0)?,
            notification_type: field(fields, 1),
            pending: field(fields, 2),
            date: timestamp_field(fields, 3),
            related_name: text_field(fields, 4),
            fids: list_field(fields, 5),
        })
    }
}
