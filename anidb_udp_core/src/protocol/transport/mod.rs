//! Transport layer for UDP communication
//!
//! The engine talks to the server through the [`DatagramTransport`] trait so
//! that a bound socket can be supplied by the embedding application and tests
//! can script replies. [`TransportConnector`] rebuilds transports when the
//! session is torn down.

mod socket;
mod state;

pub use socket::{TransportStats, UdpConnector, UdpTransport};
pub use state::{SessionState, StateTransition};

use crate::protocol::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;

/// A connected datagram channel to the AniDB server
#[async_trait]
pub trait DatagramTransport: Send + Sync {
    /// Send one datagram
    async fn send(&self, datagram: &[u8]) -> Result<()>;

    /// Receive one datagram into `buffer`, returning its length
    async fn recv(&self, buffer: &mut [u8]) -> Result<usize>;

    /// Address of the remote endpoint
    fn remote_addr(&self) -> SocketAddr;
}

/// Creates transports for a server endpoint
#[async_trait]
pub trait TransportConnector: Send + Sync {
    /// Open a transport to the given endpoint
    async fn connect(&self, endpoint: &ServerEndpoint) -> Result<Box<dyn DatagramTransport>>;
}

/// Server host and port plus the local port to bind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEndpoint {
    /// Server host name or address
    pub host: String,
    /// Server UDP port
    pub port: u16,
    /// Local UDP port (0 for any)
    pub local_port: u16,
}

impl Default for ServerEndpoint {
    fn default() -> Self {
        Self {
            host: crate::protocol::DEFAULT_SERVER.to_string(),
            port: crate::protocol::DEFAULT_PORT,
            local_port: crate::protocol::DEFAULT_CLIENT_PORT,
        }
    }
}

impl fmt::Display for ServerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoint() {
        let endpoint = ServerEndpoint::default();
        assert_eq!(endpoint.to_string(), "api.anidb.net:9000");
        assert_eq!(endpoint.local_port, crate::protocol::DEFAULT_CLIENT_PORT);
    }
}
