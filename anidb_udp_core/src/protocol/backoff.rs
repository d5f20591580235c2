//! Ban and backoff state
//!
//! Every classified reply updates a [`BackoffState`]: a 555 sets the UDP
//! ban, any other code clears it, and the 600-604 family pushes the pause
//! deadline out. Bans reported by the HTTP API only lift on expiry. The engine only reports this state; the dispatcher in front
//! of it reads a [`BackoffSnapshot`] and holds commands back accordingly.

use chrono::{DateTime, TimeDelta, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which API reported the ban
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BanOrigin {
    /// Not banned
    #[default]
    None,
    /// Banned through a UDP 555 reply
    Udp,
    /// Banned by the HTTP API
    Http,
}

/// Pause reason for a server-busy family code
pub fn pause_reason(code: u16) -> Option<&'static str> {
    match code {
        600 => Some("600 INTERNAL SERVER ERROR"),
        601 => Some("601 ANIDB OUT OF SERVICE - TRY AGAIN LATER"),
        602 => Some("602 SERVER BUSY - TRY AGAIN LATER"),
        604 => Some("TIMEOUT - DELAY AND RESUBMIT"),
        _ => None,
    }
}

/// Immutable view of the backoff state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffSnapshot {
    pub is_banned: bool,
    pub ban_origin: BanOrigin,
    pub banned_at: Option<DateTime<Utc>>,
    pub paused_until: Option<DateTime<Utc>>,
    pub pause_reason: Option<String>,
}

impl BackoffSnapshot {
    /// Ban flag
    pub fn is_banned(&self) -> bool {
        self.is_banned
    }

    /// Pause deadline
    pub fn paused_until(&self) -> Option<DateTime<Utc>> {
        self.paused_until
    }

    /// Check if the pause deadline lies in the future
    pub fn is_paused(&self, now: DateTime<Utc>) -> bool {
        self.paused_until.is_some_and(|until| until > now)
    }

    /// Check if a dispatcher may send the next command
    pub fn may_dispatch(&self, now: DateTime<Utc>) -> bool {
        !self.is_banned && !self.is_paused(now)
    }
}

/// Flow-control state owned by the engine
///
/// UDP and HTTP bans are tracked apart: a UDP reply only ever recomputes the
/// UDP ban, so an HTTP ban survives until it expires.
#[derive(Debug, Clone)]
pub struct BackoffState {
    udp_banned_at: Option<DateTime<Utc>>,
    http_banned_at: Option<DateTime<Utc>>,
    paused_until: Option<DateTime<Utc>>,
    pause_reason: Option<String>,
    pause_extension: TimeDelta,
}

impl BackoffState {
    /// Create an unbanned, unpaused state
    pub fn new(pause_extension: Duration) -> Self {
        Self {
            udp_banned_at: None,
            http_banned_at: None,
            paused_until: None,
            pause_reason: None,
            pause_extension: TimeDelta::from_std(pause_extension)
                .unwrap_or_else(|_| TimeDelta::seconds(crate::protocol::PAUSE_EXTENSION_SECS)),
        }
    }

    /// Snapshot for the dispatcher
    pub fn snapshot(&self) -> BackoffSnapshot {
        BackoffSnapshot {
            is_banned: self.is_banned(),
            ban_origin: self.ban_origin(),
            banned_at: self.http_banned_at.or(self.udp_banned_at),
            paused_until: self.paused_until,
            pause_reason: self.pause_reason.clone(),
        }
    }

    /// Ban flag, set while either API reports a ban
    pub fn is_banned(&self) -> bool {
        self.udp_banned_at.is_some() || self.http_banned_at.is_some()
    }

    /// Ban origin; an HTTP ban outranks a UDP one
    pub fn ban_origin(&self) -> BanOrigin {
        match (self.http_banned_at, self.udp_banned_at) {
            (Some(_), _) => BanOrigin::Http,
            (None, Some(_)) => BanOrigin::Udp,
            (None, None) => BanOrigin::None,
        }
    }

    /// Pause deadline
    pub fn paused_until(&self) -> Option<DateTime<Utc>> {
        self.paused_until
    }

    /// Check if the pause deadline lies in the future
    pub fn is_paused(&self, now: DateTime<Utc>) -> bool {
        self.paused_until.is_some_and(|until| until > now)
    }

    /// Update from the response code of a classified reply
    ///
    /// Transport failures are recorded with code `0`.
    pub fn record_response(&mut self, code: u16, now: DateTime<Utc>) {
        if code == 555 {
            if self.udp_banned_at.is_none() {
                warn!("AniDB UDP ban received");
            }
            self.udp_banned_at = Some(now);
        } else if self.udp_banned_at.take().is_some() {
            info!("AniDB UDP ban lifted by {code} reply");
        }

        if let Some(reason) = pause_reason(code) {
            self.extend_pause(self.pause_extension, reason, now);
        }
    }

    /// Push the pause deadline to at least `now + by`
    pub fn extend_pause(&mut self, by: TimeDelta, reason: &str, now: DateTime<Utc>) {
        let candidate = now.checked_add_signed(by).unwrap_or(DateTime::<Utc>::MAX_UTC);
        if self.paused_until.is_none_or(|until| candidate > until) {
            self.paused_until = Some(candidate);
        }
        self.pause_reason = Some(reason.to_string());
        warn!("AniDB paused until {:?}: {reason}", self.paused_until);
    }

    /// Drop the pause once its deadline has passed
    pub fn clear_elapsed_pause(&mut self, now: DateTime<Utc>) -> bool {
        match self.paused_until {
            Some(until) if until <= now => {
                info!("AniDB pause elapsed, resuming");
                self.paused_until = None;
                self.pause_reason = None;
                true
            }
            _ => false,
        }
    }

    /// Record a ban reported by the HTTP API
    pub fn record_http_ban(&mut self, now: DateTime<Utc>) {
        warn!("AniDB HTTP ban received");
        self.http_banned_at = Some(now);
    }

    /// Lift every ban older than `after`
    pub fn expire_ban(&mut self, now: DateTime<Utc>, after: Duration) -> bool {
        let after = TimeDelta::from_std(after).unwrap_or(TimeDelta::MAX);
        let elapsed = |at: &DateTime<Utc>| now.signed_duration_since(*at) >= after;

        let mut lifted = false;
        if self.http_banned_at.take_if(|at| elapsed(at)).is_some() {
            info!("AniDB HTTP ban is over");
            lifted = true;
        }
        if self.udp_banned_at.take_if(|at| elapsed(at)).is_some() {
            info!("AniDB UDP ban is over");
            lifted = true;
        }
        lifted
    }
}

impl Default for BackoffState {
    fn default() -> Self {
        Self::new(Duration::from_secs(
            crate::protocol::PAUSE_EXTENSION_SECS as u64,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_ban_set_and_reset() {
        let mut state = BackoffState::default();
        state.record_response(555, at(0));
        assert!(state.is_banned());
        assert_eq!(state.ban_origin(), BanOrigin::Udp);

        state.record_response(260, at(1));
        assert!(!state.is_banned());
        assert_eq!(state.ban_origin(), BanOrigin::None);
    }

    #[test]
    fn test_server_busy_extends_pause() {
        let mut state = BackoffState::default();
        state.record_response(602, at(0));
        assert_eq!(state.paused_until(), Some(at(300)));
        assert_eq!(
            state.snapshot().pause_reason.as_deref(),
            Some("602 SERVER BUSY - TRY AGAIN LATER")
        );
        assert!(state.is_paused(at(299)));
        assert!(!state.is_paused(at(300)));
    }

    #[test]
    fn test_pause_never_shortened() {
        let mut state = BackoffState::default();
        state.extend_pause(TimeDelta::seconds(3600), "manual", at(0));
        state.record_response(600, at(10));
        assert_eq!(state.paused_until(), Some(at(3600)));

        state.record_response(604, at(3500));
        assert_eq!(state.paused_until(), Some(at(3800)));
        assert_eq!(
            state.snapshot().pause_reason.as_deref(),
            Some("TIMEOUT - DELAY AND RESUBMIT")
        );
    }

    #[test]
    fn test_record_is_idempotent() {
        let mut once = BackoffState::default();
        once.record_response(601, at(5));

        let mut twice = BackoffState::default();
        twice.record_response(601, at(5));
        twice.record_response(601, at(5));

        assert_eq!(once.snapshot(), twice.snapshot());
    }

    #[test]
    fn test_non_pause_codes() {
        for code in [0, 200, 555, 598, 603] {
            assert!(pause_reason(code).is_none(), "{code} should not pause");
        }
    }

    #[test]
    fn test_clear_elapsed_pause() {
        let mut state = BackoffState::default();
        state.record_response(602, at(0));
        assert!(!state.clear_elapsed_pause(at(100)));
        assert!(state.clear_elapsed_pause(at(300)));
        assert_eq!(state.paused_until(), None);
        assert!(state.snapshot().pause_reason.is_none());
    }

    #[test]
    fn test_http_ban_and_expiry() {
        let mut state = BackoffState::default();
        state.record_http_ban(at(0));
        assert_eq!(state.ban_origin(), BanOrigin::Http);

        let twelve_hours = Duration::from_secs(12 * 3600);
        assert!(!state.expire_ban(at(3600), twelve_hours));
        assert!(state.expire_ban(at(12 * 3600), twelve_hours));
        assert!(!state.is_banned());
    }

    #[test]
    fn test_udp_reply_keeps_http_ban() {
        let mut state = BackoffState::default();
        state.record_http_ban(at(0));
        state.record_response(300, at(10));
        assert!(state.is_banned());
        assert_eq!(state.ban_origin(), BanOrigin::Http);

        state.record_response(555, at(20));
        state.record_response(300, at(30));
        assert_eq!(state.snapshot().banned_at, Some(at(0)));
        assert_eq!(state.ban_origin(), BanOrigin::Http);
    }

    #[test]
    fn test_bans_expire_separately() {
        let mut state = BackoffState::default();
        state.record_http_ban(at(0));
        state.record_response(555, at(3600));
        let twelve_hours = Duration::from_secs(12 * 3600);

        assert!(state.expire_ban(at(12 * 3600), twelve_hours));
        assert!(state.is_banned());
        assert_eq!(state.ban_origin(), BanOrigin::Udp);
        assert_eq!(state.snapshot().banned_at, Some(at(3600)));

        assert!(state.expire_ban(at(13 * 3600), twelve_hours));
        assert_eq!(state.ban_origin(), BanOrigin::None);
    }

    #[test]
    fn test_transport_failure_lifts_udp_ban() {
        let mut state = BackoffState::default();
        state.record_response(555, at(0));
        state.record_response(0, at(1));
        assert!(!state.is_banned());
    }

    #[test]
    fn test_snapshot_dispatch_gate() {
        let mut state = BackoffState::default();
        assert!(state.snapshot().may_dispatch(at(0)));

        state.record_response(602, at(0));
        assert!(!state.snapshot().may_dispatch(at(1)));
        assert!(state.snapshot().may_dispatch(at(301)));

        state.record_response(555, at(400));
        assert!(!state.snapshot().may_dispatch(at(401)));
    }
}
