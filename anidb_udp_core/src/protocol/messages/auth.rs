//! Session verbs: AUTH, LOGOUT and PING

use crate::protocol::error::{ProtocolError, Result};
use crate::protocol::messages::{
    AniDBCommand, ActivityKind, Classification, DomainOutcome, Payload, Reply, SessionSuffix,
    field, text_field,
};
use crate::security::SecureString;
use serde::Serialize;
use std::fmt;

/// AUTH command
///
/// The engine appends `&enc=` for the requested encoding; the login is
/// itself always sent in ASCII.
#[derive(Clone)]
pub struct LoginCommand {
    user: String,
    pass: SecureString,
    client: String,
    client_version: u32,
}

impl fmt::Debug for LoginCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCommand")
            .field("user", &"***")
            .field("pass", &"***")
            .field("client", &self.client)
            .field("client_version", &self.client_version)
            .finish()
    }
}

impl LoginCommand {
    /// Create a login for the given account and registered client
    pub fn new(
        user: impl Into<String>,
        pass: impl Into<SecureString>,
        client: impl Into<String>,
        client_version: u32,
    ) -> Result<Self> {
        let user = user.into();
        let client = client.into();
        if user.trim().is_empty() {
            return Err(ProtocolError::invalid_parameter("user", "must not be empty"));
        }
        if client.trim().is_empty() {
            return Err(ProtocolError::invalid_parameter(
                "client",
                "must not be empty",
            ));
        }
        Ok(Self {
            user,
            pass: pass.into(),
            client,
            client_version,
        })
    }

    /// Account name
    pub fn user(&self) -> &str {
        &self.user
    }
}

impl AniDBCommand for LoginCommand {
    fn name(&self) -> &'static str {
        "AUTH"
    }

    fn parameters(&self) -> Vec<(&'static str, String)> {
        vec![
            ("user", self.user.clone()),
            ("pass", self.pass.expose_secret()),
            ("protover", crate::protocol::PROTOCOL_VERSION.to_string()),
            ("client", self.client.clone()),
            ("clientver", self.client_version.to_string()),
            ("nat", "1".to_string()),
            ("comp", "1".to_string()),
            ("imgserver", "1".to_string()),
        ]
    }

    fn key(&self) -> String {
        "Login".to_string()
    }

    fn activity(&self) -> ActivityKind {
        ActivityKind::Login
    }

    fn classify(&self, reply: &Reply<'_>) -> Classification {
        match reply.code {
            200 | 201 => match SessionInfo::parse(reply) {
                Some(info) => Classification::with(DomainOutcome::LoggedIn, Payload::Session(info)),
                None => Classification::bare(DomainOutcome::LoginFailed),
            },
            500 => Classification::bare(DomainOutcome::LoginFailed),
            503 => Classification::bare(DomainOutcome::ClientVersionOutdated),
            504 => Classification::bare(DomainOutcome::ClientBanned),
            505 => Classification::bare(DomainOutcome::IllegalInput),
            _ => Classification::bare(DomainOutcome::LoginFailed),
        }
    }

    fn session_suffix(&self) -> SessionSuffix {
        SessionSuffix::Encoding
    }
}

/// Session granted by a successful login
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionInfo {
    pub session_key: String,
    /// Public address seen by the server when NAT detection is on
    pub nat_address: Option<String>,
    pub image_server: Option<String>,
    /// Set for 201 replies
    pub new_version_available: bool,
}

impl SessionInfo {
    /// Parse `200 {key} [{ip:port}] LOGIN ACCEPTED\n{image server}\n`
    fn parse(reply: &Reply<'_>) -> Option<Self> {
        let mut tokens = reply.status.split_whitespace().skip(1);
        let session_key = tokens.next().filter(|t| t.len() > 1)?.to_string();
        let nat_address = tokens
            .next()
            .filter(|t| t.contains(':'))
            .map(str::to_string);

        Some(Self {
            session_key,
            nat_address,
            image_server: text_field(&reply.fields(0), 0),
            new_version_available: reply.code == 201,
        })
    }
}

/// LOGOUT command
#[derive(Debug, Clone, Default)]
pub struct LogoutCommand;

impl LogoutCommand {
    pub fn new() -> Self {
        Self
    }
}

impl AniDBCommand for LogoutCommand {
    fn name(&self) -> &'static str {
        "LOGOUT"
    }

    fn parameters(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    fn key(&self) -> String {
        "Logout".to_string()
    }

    fn activity(&self) -> ActivityKind {
        ActivityKind::Logout
    }

    fn classify(&self, reply: &Reply<'_>) -> Classification {
        match reply.code {
            403 => Classification::bare(DomainOutcome::NotLoggedIn),
            _ => Classification::bare(DomainOutcome::LoggedOut),
        }
    }

    fn session_suffix(&self) -> SessionSuffix {
        SessionSuffix::Bare
    }
}

/// PING command, sent without a session
#[derive(Debug, Clone, Default)]
pub struct PingCommand;

impl PingCommand {
    pub fn new() -> Self {
        Self
    }
}

impl AniDBCommand for PingCommand {
    fn name(&self) -> &'static str {
        "PING"
    }

    fn parameters(&self) -> Vec<(&'static str, String)> {
        vec![("nat", "1".to_string())]
    }

    fn key(&self) -> String {
        "Ping".to_string()
    }

    fn activity(&self) -> ActivityKind {
        ActivityKind::Ping
    }

    fn classify(&self, reply: &Reply<'_>) -> Classification {
        let info = PongInfo {
            port: field(&reply.fields(0), 0),
        };
        Classification::with(DomainOutcome::Pong, Payload::Pong(info))
    }

    fn session_suffix(&self) -> SessionSuffix {
        SessionSuffix::None
    }
}

/// PONG reply data
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PongInfo {
    /// Outside port seen by the server
    pub port: Option<u16>,
}
