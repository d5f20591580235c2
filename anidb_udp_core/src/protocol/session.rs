//! Session context
//!
//! One [`SessionContext`] exists per logical connection. It owns the
//! transport, the negotiated encoding, the session token and the activity
//! timestamps. A forced reconnect drops it and builds a new one; it is never
//! patched up in place.

use crate::protocol::codec::TextEncoding;
use crate::protocol::error::{ProtocolError, Result};
use crate::protocol::transport::{DatagramTransport, SessionState, StateTransition};
use chrono::{DateTime, Utc};
use log::{debug, info};
use std::net::SocketAddr;

/// Timestamps of the last outgoing traffic
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivityLog {
    /// Any request
    pub last_message: Option<DateTime<Utc>>,
    /// Any request other than PING
    pub last_non_ping: Option<DateTime<Utc>>,
    /// PING requests
    pub last_ping: Option<DateTime<Utc>>,
}

impl ActivityLog {
    /// Record an outgoing request
    pub fn record(&mut self, is_ping: bool, now: DateTime<Utc>) {
        self.last_message = Some(now);
        if is_ping {
            self.last_ping = Some(now);
        } else {
            self.last_non_ping = Some(now);
        }
    }
}

/// Credentials of an authenticated session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    /// Opaque session key issued at login
    pub token: String,
    /// Image server host announced at login
    pub image_server: Option<String>,
}

/// Per-connection state shared by every command
pub struct SessionContext {
    transport: Box<dyn DatagramTransport>,
    state: SessionState,
    token: Option<SessionToken>,
    activity: ActivityLog,
}

impl SessionContext {
    /// Wrap a freshly opened transport; the session starts in ASCII
    pub fn new(transport: Box<dyn DatagramTransport>) -> Self {
        debug!("New session to {}", transport.remote_addr());
        Self {
            transport,
            state: SessionState::Connected(TextEncoding::Ascii),
            token: None,
            activity: ActivityLog::default(),
        }
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Encoding used for non-login requests
    pub fn encoding(&self) -> TextEncoding {
        self.state.encoding().unwrap_or_default()
    }

    /// Remote endpoint of the transport
    pub fn remote_addr(&self) -> SocketAddr {
        self.transport.remote_addr()
    }

    /// Transport handle
    pub fn transport(&self) -> &dyn DatagramTransport {
        self.transport.as_ref()
    }

    /// Session key, if logged in
    pub fn token(&self) -> Option<&str> {
        self.token.as_ref().map(|t| t.token.as_str())
    }

    /// Image server announced at login
    pub fn image_server(&self) -> Option<&str> {
        self.token.as_ref().and_then(|t| t.image_server.as_deref())
    }

    /// Check if a session key is held
    pub fn is_logged_in(&self) -> bool {
        self.token.is_some()
    }

    /// Activity timestamps
    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    /// Record an outgoing request
    pub fn touch(&mut self, is_ping: bool, now: DateTime<Utc>) {
        self.activity.record(is_ping, now);
    }

    /// Switch to the encoding requested at login
    pub fn negotiate(&mut self, encoding: TextEncoding) -> Result<()> {
        self.transition(SessionState::Connected(encoding))
    }

    /// Store the session key from a successful login
    pub fn authenticate(&mut self, token: SessionToken) {
        info!("Logged in to AniDB");
        self.token = Some(token);
    }

    /// Forget the session key
    pub fn clear_token(&mut self) {
        if self.token.take().is_some() {
            info!("AniDB session closed");
        }
    }

    /// Tear the session down
    pub fn dispose(mut self) {
        self.token = None;
        if let Err(e) = self.transition(SessionState::Disconnected) {
            debug!("Disposing session: {e}");
        }
        debug!("Session to {} disposed", self.transport.remote_addr());
    }

    fn transition(&mut self, to: SessionState) -> Result<()> {
        if !StateTransition::new(self.state, to).is_valid() {
            return Err(ProtocolError::InvalidTransition {
                from: self.state.to_string(),
                to: to.to_string(),
            });
        }
        self.state = to;
        Ok(())
    }
}

/// Detect a login reply sent in UTF-16 for a stale session
///
/// The server answers a fresh ASCII login in UTF-16 when it still holds a
/// Unicode session for this client. The reply then opens with `FE FF` and
/// carries the code digit `5` (`53`) as the low byte of the second code unit
/// but not of the third. Renegotiation only applies when the client is still
/// in ASCII and asked for UTF-16.
pub fn stale_utf16_session(reply: &[u8], active: TextEncoding, requested: TextEncoding) -> bool {
    if active.is_unicode() || !requested.is_unicode() || reply.len() < 6 {
        return false;
    }
    reply[0] == 0xFE && reply[1] == 0xFF && reply[3] == 53 && reply[5] != 53
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;

    struct NullTransport;

    #[async_trait]
    impl DatagramTransport for NullTransport {
        async fn send(&self, _datagram: &[u8]) -> Result<()> {
            Ok(())
        }

        async fn recv(&self, _buffer: &mut [u8]) -> Result<usize> {
            Err(ProtocolError::NotConnected)
        }

        fn remote_addr(&self) -> SocketAddr {
            "127.0.0.1:9000".parse().unwrap()
        }
    }

    fn utf16_reply(text: &str) -> Vec<u8> {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in text.encode_utf16() {
            bytes.extend(unit.to_be_bytes());
        }
        bytes
    }

    #[test]
    fn test_stale_session_detected() {
        // "50" as the first code units: second byte pair is 00 35 ('5' == 53), third is 00 30
        let reply = utf16_reply("503 CLIENT VERSION OUTDATED\n");
        assert!(stale_utf16_session(
            &reply,
            TextEncoding::Ascii,
            TextEncoding::Utf16
        ));
    }

    #[test]
    fn test_stale_session_preconditions() {
        let reply = utf16_reply("503 X\n");
        assert!(!stale_utf16_session(
            &reply,
            TextEncoding::Utf16,
            TextEncoding::Utf16
        ));
        assert!(!stale_utf16_session(
            &reply,
            TextEncoding::Ascii,
            TextEncoding::Ascii
        ));
        assert!(!stale_utf16_session(
            &reply[..5],
            TextEncoding::Ascii,
            TextEncoding::Utf16
        ));
    }

    #[test]
    fn test_stale_session_byte_pattern() {
        // 555 repeats the digit in the third unit
        let banned = utf16_reply("555 BANNED\n");
        assert!(!stale_utf16_session(
            &banned,
            TextEncoding::Ascii,
            TextEncoding::Utf16
        ));
        assert!(!stale_utf16_session(
            b"200 abc LOGIN ACCEPTED\n",
            TextEncoding::Ascii,
            TextEncoding::Utf16
        ));
    }

    #[test]
    fn test_session_lifecycle() {
        let mut session = SessionContext::new(Box::new(NullTransport));
        assert_eq!(session.state(), SessionState::Connected(TextEncoding::Ascii));
        assert!(!session.is_logged_in());

        session.negotiate(TextEncoding::Utf16).unwrap();
        assert_eq!(session.encoding(), TextEncoding::Utf16);
        assert!(session.negotiate(TextEncoding::Ascii).is_err());

        session.authenticate(SessionToken {
            token: "abcde".to_string(),
            image_server: Some("img7.anidb.net".to_string()),
        });
        assert_eq!(session.token(), Some("abcde"));
        assert_eq!(session.image_server(), Some("img7.anidb.net"));

        session.clear_token();
        assert!(session.token().is_none());
        session.dispose();
    }

    #[test]
    fn test_activity_log() {
        let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let t1 = Utc.timestamp_opt(1_700_000_050, 0).unwrap();

        let mut log = ActivityLog::default();
        log.record(false, t0);
        log.record(true, t1);

        assert_eq!(log.last_message, Some(t1));
        assert_eq!(log.last_non_ping, Some(t0));
        assert_eq!(log.last_ping, Some(t1));
    }
}
