//! CALENDAR command

use crate::protocol::messages::{
    AniDBCommand, ActivityKind, Classification, DomainOutcome, Payload, Reply, field,
    timestamp_field,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// CALENDAR command
#[derive(Debug, Clone, Default)]
pub struct CalendarCommand;

impl CalendarCommand {
    pub fn new() -> Self {
        Self
    }
}

impl AniDBCommand for CalendarCommand {
    fn name(&self) -> &'static str {
        "CALENDAR"
    }

    fn parameters(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    fn key(&self) -> String {
        "GetCalendar".to_string()
    }

    fn activity(&self) -> ActivityKind {
        ActivityKind::GettingCalendar
    }

    fn classify(&self, reply: &Reply<'_>) -> Classification {
        match reply.code {
            297 => {
                let entries: Vec<_> = reply
                    .rows()
                    .filter_map(|row| CalendarEntry::parse(&row))
                    .collect();
                Classification::with(DomainOutcome::GotCalendar, Payload::Calendar(entries))
            }
            _ => Classification::bare(DomainOutcome::CalendarEmpty),
        }
    }
}

/// Upcoming anime
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarEntry {
    pub aid: u64,
    pub start_date: Option<DateTime<Utc>>,
    /// Bit flags marking unknown day, month or year
    pub date_flags: u16,
}

impl CalendarEntry {
    fn parse(fields: &[String]) -> Option<Self> {
        Some(Self {
            aid: field::<u64>(fields, 0).filter(|v| *v != 0)?,
            start_date: timestamp_field(fields, 1),
            date_flags: field(fields, 2).unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode() {
        let cmd = CalendarCommand::new();
        assert_eq!(cmd.encode(), "CALENDAR ");
        assert_eq!(cmd.key(), "GetCalendar");
    }

    #[test]
    fn test_reply() {
        let text = "297 CALENDAR\n14000|1262304000|0\n14001|1264982400|3\nbroken\n";
        let result = CalendarCommand::new().classify(&Reply::parse(text, 297));
        assert_eq!(result.outcome, DomainOutcome::GotCalendar);
        let Some(Payload::Calendar(entries)) = result.payload else {
            panic!("expected calendar payload");
        };
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].aid, 14000);
        assert_eq!(entries[1].date_flags, 3);
    }

    #[test]
    fn test_empty() {
        let result = CalendarCommand::new().classify(&Reply::parse("397 CALENDAR EMPTY\n", 397));
        assert_eq!(result.outcome, DomainOutcome::CalendarEmpty);
    }
}
