//! Live exchange with api.anidb.net
//!
//! Ignored by default; run with `--ignored` when the network is available.

use anidb_udp_core::protocol::codec::TextEncoding;
use anidb_udp_core::protocol::messages::PingCommand;
use anidb_udp_core::protocol::{
    Command, DomainOutcome, EngineConfig, ProtocolEngine, SystemClock, UdpConnector,
};
use std::sync::Arc;

#[tokio::test]
#[ignore = "requires network access to api.anidb.net"]
async fn test_live_ping() {
    let mut config = EngineConfig {
        encoding: TextEncoding::Ascii,
        ..EngineConfig::default()
    };
    config.server.local_port = 0;

    let connector = UdpConnector::new(
        config.tuning.read_timeout(),
        config.tuning.write_timeout(),
    );
    let mut engine = ProtocolEngine::connect(config, Arc::new(connector), Arc::new(SystemClock))
        .await
        .unwrap();

    let mut ping = Command::new(PingCommand::new());
    assert_eq!(engine.process(&mut ping).await, DomainOutcome::Pong);
    engine.shutdown().await;
}
