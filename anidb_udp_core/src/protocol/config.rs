//! Engine configuration
//!
//! Plain serde data. Layering (defaults, file, environment) is left to the
//! embedding application.

use crate::protocol::codec::TextEncoding;
use crate::protocol::transport::ServerEndpoint;
use crate::security::SecureString;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a [`ProtocolEngine`](crate::protocol::ProtocolEngine)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Server and local port
    pub server: ServerEndpoint,
    /// Registered client name and version
    pub client: ClientIdentity,
    /// Encoding announced at login
    pub encoding: TextEncoding,
    /// AniDB account, required for [`login`](crate::protocol::ProtocolEngine::login)
    pub credentials: Option<Credentials>,
    /// Socket timeouts and protocol delays
    pub tuning: TuningConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            server: ServerEndpoint::default(),
            client: ClientIdentity::default(),
            encoding: TextEncoding::Utf16,
            credentials: None,
            tuning: TuningConfig::default(),
        }
    }
}

/// Client registration sent with AUTH
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientIdentity {
    pub name: String,
    pub version: u32,
}

impl Default for ClientIdentity {
    fn default() -> Self {
        Self {
            name: "anidbudp".to_string(),
            version: 1,
        }
    }
}

/// AniDB account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    #[serde(skip_serializing)]
    pub password: SecureString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<SecureString>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Timeouts and delays, all in milliseconds or seconds as named
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningConfig {
    pub read_timeout_ms: u64,
    pub write_timeout_ms: u64,
    pub multipart_delay_ms: u64,
    pub reconnect_delay_ms: u64,
    pub login_settle_ms: u64,
    pub pause_extension_secs: u64,
    pub ping_frequency_secs: u64,
    pub logout_after_secs: u64,
    pub ban_reset_secs: u64,
}

impl Default for TuningConfig {
    fn default() -> Self {
        use crate::protocol::*;
        Self {
            read_timeout_ms: 10_000,
            write_timeout_ms: 5_000,
            multipart_delay_ms: MULTIPART_DELAY.as_millis() as u64,
            reconnect_delay_ms: RECONNECT_DELAY.as_millis() as u64,
            login_settle_ms: LOGIN_SETTLE_DELAY.as_millis() as u64,
            pause_extension_secs: PAUSE_EXTENSION_SECS as u64,
            ping_frequency_secs: PING_FREQUENCY.as_secs(),
            logout_after_secs: FORCE_LOGOUT_PERIOD.as_secs(),
            ban_reset_secs: BAN_RESET_PERIOD.as_secs(),
        }
    }
}

impl TuningConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    pub fn multipart_delay(&self) -> Duration {
        Duration::from_millis(self.multipart_delay_ms)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn login_settle(&self) -> Duration {
        Duration::from_millis(self.login_settle_ms)
    }

    pub fn pause_extension(&self) -> Duration {
        Duration::from_secs(self.pause_extension_secs)
    }

    pub fn ping_frequency(&self) -> Duration {
        Duration::from_secs(self.ping_frequency_secs)
    }

    pub fn logout_after(&self) -> Duration {
        Duration::from_secs(self.logout_after_secs)
    }

    pub fn ban_reset(&self) -> Duration {
        Duration::from_secs(self.ban_reset_secs)
    }

    /// Same settings without any waits, for tests and scripted sessions
    pub fn without_delays(mut self) -> Self {
        self.multipart_delay_ms = 0;
        self.reconnect_delay_ms = 0;
        self.login_settle_ms = 0;
        self
    }
}
