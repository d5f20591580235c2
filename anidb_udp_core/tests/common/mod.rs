//! Shared setup for engine integration tests
#![allow(dead_code)]

use anidb_test_utils::{ManualClock, ScriptedServer};
use anidb_udp_core::protocol::codec::TextEncoding;
use anidb_udp_core::protocol::{Credentials, EngineConfig, ProtocolEngine};
use std::sync::Arc;

pub const LOGIN_OK: &str = "200 abcde LOGIN ACCEPTED\nhttp://img7.anidb.net/\n";

/// Config with test credentials and the given login encoding
pub fn config(encoding: TextEncoding) -> EngineConfig {
    EngineConfig {
        credentials: Some(Credentials::new("bob", "secret")),
        encoding,
        ..EngineConfig::default()
    }
}

/// Engine wired to a scripted server and a manual clock
pub async fn engine(
    server: &ScriptedServer,
    clock: &ManualClock,
    encoding: TextEncoding,
) -> ProtocolEngine {
    ProtocolEngine::connect(
        config(encoding),
        Arc::new(server.connector()),
        Arc::new(clock.clone()),
    )
    .await
    .expect("scripted connector always connects")
}

/// ASCII engine that has already logged in
pub async fn logged_in(server: &ScriptedServer, clock: &ManualClock) -> ProtocolEngine {
    server.reply_text(LOGIN_OK);
    let mut engine = engine(server, clock, TextEncoding::Ascii).await;
    assert!(engine.login().await.unwrap());
    engine
}

/// Read a big-endian UTF-16 request datagram
pub fn utf16_text(datagram: &[u8]) -> String {
    let units: Vec<u16> = datagram
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).expect("valid UTF-16 request")
}
