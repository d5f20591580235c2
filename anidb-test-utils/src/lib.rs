//! Test utilities for the AniDB UDP engine
//!
//! This crate provides a scripted server standing in for the UDP transport,
//! a manual clock for the engine's delays, and builders for compressed and
//! UTF-16 reply datagrams.

pub mod builders;
pub mod mocks;

// Re-export commonly used types
pub use builders::{compressed, utf16, utf16_compressed};
pub use mocks::{ManualClock, ScriptedConnector, ScriptedReply, ScriptedServer, ScriptedTransport};
