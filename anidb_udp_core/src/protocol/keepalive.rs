//! Idle-session keepalive decisions
//!
//! AniDB drops NAT mappings for quiet clients and expects idle clients to
//! log out. [`KeepAlivePolicy`] turns the session's activity timestamps into
//! the action a periodic maintenance tick should take.

use crate::protocol::backoff::BackoffSnapshot;
use crate::protocol::session::ActivityLog;
use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;

/// Action for one maintenance tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepAliveAction {
    /// Nothing to do
    Idle,
    /// Send a PING to keep the NAT mapping alive
    Ping,
    /// Log out the idle session
    Logout,
}

/// Thresholds for pings and idle logout
#[derive(Debug, Clone, Copy)]
pub struct KeepAlivePolicy {
    ping_frequency: TimeDelta,
    logout_after: TimeDelta,
}

impl KeepAlivePolicy {
    /// Create a policy
    pub fn new(ping_frequency: Duration, logout_after: Duration) -> Self {
        Self {
            ping_frequency: TimeDelta::from_std(ping_frequency).unwrap_or(TimeDelta::MAX),
            logout_after: TimeDelta::from_std(logout_after).unwrap_or(TimeDelta::MAX),
        }
    }

    /// Decide the action for the current tick
    pub fn decide(
        &self,
        logged_in: bool,
        activity: &ActivityLog,
        backoff: &BackoffSnapshot,
        now: DateTime<Utc>,
    ) -> KeepAliveAction {
        if !logged_in {
            return KeepAliveAction::Idle;
        }

        let older_than = |at: Option<DateTime<Utc>>, limit: TimeDelta| {
            at.is_none_or(|at| now.signed_duration_since(at) >= limit)
        };

        if activity
            .last_non_ping
            .is_some_and(|at| now.signed_duration_since(at) > self.logout_after)
        {
            return KeepAliveAction::Logout;
        }

        if older_than(activity.last_message, self.ping_frequency)
            && older_than(activity.last_ping, self.ping_frequency)
            && !backoff.is_banned
            && backoff.paused_until.is_none()
        {
            return KeepAliveAction::Ping;
        }

        KeepAliveAction::Idle
    }
}

impl Default for KeepAlivePolicy {
    fn default() -> Self {
        Self::new(
            crate::protocol::PING_FREQUENCY,
            crate::protocol::FORCE_LOGOUT_PERIOD,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn activity(last_non_ping: i64, last_ping: Option<i64>) -> ActivityLog {
        let mut log = ActivityLog::default();
        log.record(false, at(last_non_ping));
        if let Some(ping) = last_ping {
            log.record(true, at(ping));
        }
        log
    }

    #[test]
    fn test_idle_when_logged_out() {
        let policy = KeepAlivePolicy::default();
        let action = policy.decide(
            false,
            &activity(0, None),
            &BackoffSnapshot::default(),
            at(10_000),
        );
        assert_eq!(action, KeepAliveAction::Idle);
    }

    #[test]
    fn test_ping_after_quiet_period() {
        let policy = KeepAlivePolicy::default();
        let log = activity(0, None);
        let backoff = BackoffSnapshot::default();

        assert_eq!(policy.decide(true, &log, &backoff, at(44)), KeepAliveAction::Idle);
        assert_eq!(policy.decide(true, &log, &backoff, at(45)), KeepAliveAction::Ping);
    }

    #[test]
    fn test_recent_ping_suppresses_ping() {
        let policy = KeepAlivePolicy::default();
        let log = activity(0, Some(100));
        let action = policy.decide(true, &log, &BackoffSnapshot::default(), at(120));
        assert_eq!(action, KeepAliveAction::Idle);
    }

    #[test]
    fn test_no_ping_while_banned_or_paused() {
        let policy = KeepAlivePolicy::default();
        let log = activity(0, None);

        let banned = BackoffSnapshot {
            is_banned: true,
            ..Default::default()
        };
        assert_eq!(policy.decide(true, &log, &banned, at(60)), KeepAliveAction::Idle);

        let paused = BackoffSnapshot {
            paused_until: Some(at(400)),
            ..Default::default()
        };
        assert_eq!(policy.decide(true, &log, &paused, at(60)), KeepAliveAction::Idle);
    }

    #[test]
    fn test_logout_after_idle_period() {
        let policy = KeepAlivePolicy::default();
        let log = activity(0, Some(590));
        assert_eq!(
            policy.decide(true, &log, &BackoffSnapshot::default(), at(601)),
            KeepAliveAction::Logout
        );
    }
}
