//! AniDB UDP Protocol Engine
//!
//! Core library for talking to the AniDB UDP API: typed commands for every
//! supported verb, the wire codec (compression, UTF-16, framing, multi-part
//! replies), the session and reconnection manager, and the ban/backoff
//! controller a scheduler consults before dispatching work.
//!
//! ```no_run
//! use anidb_udp_core::protocol::{
//!     Command, EngineConfig, ProtocolEngine, SystemClock, UdpConnector,
//! };
//! use anidb_udp_core::protocol::messages::PingCommand;
//! use std::sync::Arc;
//!
//! # async fn run() -> anidb_udp_core::Result<()> {
//! let config = EngineConfig::default();
//! let connector = UdpConnector::new(config.tuning.read_timeout(), config.tuning.write_timeout());
//! let mut engine = ProtocolEngine::connect(config, Arc::new(connector), Arc::new(SystemClock)).await?;
//!
//! let mut ping = Command::new(PingCommand::new());
//! let outcome = engine.process(&mut ping).await;
//! println!("{outcome}");
//! # Ok(())
//! # }
//! ```

pub mod protocol;
pub mod security;

// Re-export main types
pub use protocol::{
    BackoffSnapshot, Command, DomainOutcome, EngineConfig, Payload, ProtocolEngine,
    ProtocolError, Request, Result,
};
pub use security::SecureString;
