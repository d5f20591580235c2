//! Protocol-specific error types
//!
//! Domain failures reported by the server (bans, missing entries, busy
//! responses) are carried by [`DomainOutcome`](crate::protocol::DomainOutcome)
//! values. The errors in this module cover everything below that: socket
//! failures, undecodable datagrams and invalid command parameters.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Protocol-specific error types
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Network I/O error
    #[error("Network I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Receive or send timeout
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// Encoding error
    #[error("Encoding error: {message}")]
    Encoding { message: String },

    /// Decoding error (bad deflate stream, empty datagram)
    #[error("Decoding error: {message}")]
    Decoding { message: String },

    /// Datagram larger than the protocol allows
    #[error("Packet size {size} exceeds maximum {max_size}")]
    PacketTooLarge { size: usize, max_size: usize },

    /// No live session to send on
    #[error("Not connected to AniDB server")]
    NotConnected,

    /// Server host could not be resolved
    #[error("Could not resolve AniDB server address: {host}")]
    AddressResolution { host: String },

    /// A command was constructed with an invalid parameter
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter { parameter: String, reason: String },

    /// Multi-part reassembly failed
    #[error("Multi-part response error: {message}")]
    Multipart { message: String },

    /// Invalid session state transition
    #[error("Invalid session state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
}

impl ProtocolError {
    /// Create an encoding error
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding {
            message: message.into(),
        }
    }

    /// Create a decoding error
    pub fn decoding(message: impl Into<String>) -> Self {
        Self::Decoding {
            message: message.into(),
        }
    }

    /// Create a packet too large error
    pub fn packet_too_large(size: usize, max_size: usize) -> Self {
        Self::PacketTooLarge { size, max_size }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Create a multi-part error
    pub fn multipart(message: impl Into<String>) -> Self {
        Self::Multipart {
            message: message.into(),
        }
    }

    /// Check if this error is transient and the command may be queued again
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Io(_) | Self::Timeout(_) | Self::NotConnected | Self::Multipart { .. }
        )
    }
}

/// Response code returned by the AniDB UDP server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseCode(pub u16);

impl ResponseCode {
    /// Get a human-readable description of the response code
    pub fn description(&self) -> &'static str {
        match self.0 {
            200 => "LOGIN ACCEPTED",
            201 => "LOGIN ACCEPTED - NEW VERSION AVAILABLE",
            203 => "LOGGED OUT",
            210 => "MYLIST ENTRY ADDED",
            211 => "MYLIST ENTRY DELETED",
            220 => "FILE",
            221 => "MYLIST",
            222 => "MYLIST STATS",
            225 => "GROUPSTATUS",
            233 => "ANIMEDESC",
            234 => "REVIEW",
            235 => "CHARACTER",
            240 => "EPISODE",
            243 => "UPDATED",
            245 => "CREATOR",
            250 => "GROUP",
            260 => "VOTED",
            261 => "VOTE FOUND",
            262 => "VOTE UPDATED",
            263 => "VOTE REVOKED",
            291 => "NOTIFYLIST",
            292 => "NOTIFYGET MESSAGE",
            293 => "NOTIFYGET NOTIFICATION",
            297 => "CALENDAR",
            300 => "PONG",
            310 => "FILE ALREADY IN MYLIST",
            311 => "MYLIST ENTRY EDITED",
            312 => "MULTIPLE MYLIST ENTRIES",
            320 => "NO SUCH FILE",
            321 => "NO SUCH ENTRY",
            322 => "MULTIPLE FILES FOUND",
            325 => "NO GROUPS FOUND",
            330 => "NO SUCH ANIME",
            333 => "NO SUCH DESCRIPTION",
            334 => "NO SUCH REVIEW",
            335 => "NO SUCH CHARACTER",
            340 => "NO SUCH EPISODE",
            343 => "NO UPDATES",
            345 => "NO SUCH CREATOR",
            350 => "NO SUCH GROUP",
            360 => "NO SUCH VOTE",
            361 => "INVALID VOTE TYPE",
            362 => "INVALID VOTE VALUE",
            363 => "PERMVOTE NOT ALLOWED",
            364 => "ALREADY PERMVOTED",
            392 | 393 => "NO SUCH ENTRY",
            397 => "CALENDAR EMPTY",
            403 => "NOT LOGGED IN",
            411 => "NO SUCH MYLIST ENTRY",
            500 => "LOGIN FAILED",
            501 => "LOGIN FIRST",
            502 => "ACCESS DENIED",
            503 => "CLIENT VERSION OUTDATED",
            504 => "CLIENT BANNED",
            505 => "ILLEGAL INPUT OR ACCESS DENIED",
            506 => "INVALID SESSION",
            555 => "BANNED",
            598 => "UNKNOWN COMMAND",
            600 => "INTERNAL SERVER ERROR",
            601 => "ANIDB OUT OF SERVICE - TRY AGAIN LATER",
            602 => "SERVER BUSY - TRY AGAIN LATER",
            604 => "TIMEOUT - DELAY AND RESUBMIT",
            _ => "UNKNOWN RESPONSE CODE",
        }
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.0, self.description())
    }
}
