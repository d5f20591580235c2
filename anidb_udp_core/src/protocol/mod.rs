//! AniDB UDP Protocol Implementation
//!
//! This module implements the AniDB UDP API protocol with a modular architecture:
//! - `transport`: datagram transport trait, Tokio UDP socket and session states
//! - `codec`: request encoding, reply inflating/decoding/framing, multi-part reassembly
//! - `messages`: one typed command per AniDB verb plus response classification
//! - `session`, `backoff`, `keepalive`: per-connection state, ban/pause control, idle handling
//! - `client`: the [`ProtocolEngine`] that drives one command at a time

pub mod backoff;
pub mod client;
pub mod clock;
pub mod codec;
pub mod config;
pub mod error;
pub mod keepalive;
pub mod messages;
pub mod session;
pub mod transport;

// Re-export main types
pub use backoff::{BackoffSnapshot, BackoffState, BanOrigin};
pub use client::ProtocolEngine;
pub use clock::{Clock, SystemClock};
pub use config::{ClientIdentity, Credentials, EngineConfig, TuningConfig};
pub use error::{ProtocolError, Result};
pub use keepalive::{KeepAliveAction, KeepAlivePolicy};
pub use messages::{Command, DomainOutcome, Payload, Request};
pub use session::SessionContext;
pub use transport::{DatagramTransport, ServerEndpoint, TransportConnector, UdpConnector};

use std::time::Duration;

/// Protocol version supported by this implementation
pub const PROTOCOL_VERSION: &str = "3";

/// Maximum request datagram size (considering PPPoE)
pub const MAX_PACKET_SIZE: usize = 1400;

/// Receive buffer size for reply datagrams
pub const MAX_DATAGRAM_SIZE: usize = 2000;

/// Scratch buffer for inflated replies
pub const INFLATE_BUFFER_SIZE: usize = 64 * 1024;

/// Default AniDB server address
pub const DEFAULT_SERVER: &str = "api.anidb.net";

/// Default AniDB UDP port
pub const DEFAULT_PORT: u16 = 9000;

/// Default local UDP port
pub const DEFAULT_CLIENT_PORT: u16 = 4556;

/// Wait between parts of a multi-part reply
pub const MULTIPART_DELAY: Duration = Duration::from_millis(2300);

/// Wait between tearing a session down and rebuilding it
pub const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Wait after a successful login before the next command
pub const LOGIN_SETTLE_DELAY: Duration = Duration::from_millis(2200);

/// Minimum pause after a 600-604 reply, in seconds
pub const PAUSE_EXTENSION_SECS: i64 = 300;

/// Idle time after which a PING keeps the NAT mapping open
pub const PING_FREQUENCY: Duration = Duration::from_secs(45);

/// Idle time after which the session is logged out
pub const FORCE_LOGOUT_PERIOD: Duration = Duration::from_secs(600);

/// Records returned per UPDATED page
pub const UPDATED_PAGE_SIZE: usize = 200;

/// Age after which a ban is assumed lifted
pub const BAN_RESET_PERIOD: Duration = Duration::from_secs(12 * 60 * 60);
