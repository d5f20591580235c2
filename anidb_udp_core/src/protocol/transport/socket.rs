//! Tokio UDP socket transport
//!
//! This module provides the production [`DatagramTransport`] over a
//! connected Tokio `UdpSocket`, with send/receive timeouts.

use super::{DatagramTransport, ServerEndpoint, TransportConnector};
use crate::protocol::error::{ProtocolError, Result};
use async_trait::async_trait;
use log::{debug, trace, warn};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Mutex;
use std::time::Duration;
use tokio::net::{UdpSocket, lookup_host};
use tokio::time::timeout;

/// Transport statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TransportStats {
    /// Total packets sent
    pub packets_sent: u64,
    /// Total packets received
    pub packets_received: u64,
    /// Total bytes sent
    pub bytes_sent: u64,
    /// Total bytes received
    pub bytes_received: u64,
    /// Send errors
    pub send_errors: u64,
    /// Receive errors, timeouts included
    pub receive_errors: u64,
}

/// UDP transport over an already-bound, connected socket
pub struct UdpTransport {
    socket: UdpSocket,
    remote: SocketAddr,
    read_timeout: Duration,
    write_timeout: Duration,
    stats: Mutex<TransportStats>,
}

impl UdpTransport {
    /// Wrap a bound socket, connecting it to `remote`
    pub async fn from_socket(
        socket: UdpSocket,
        remote: SocketAddr,
        read_timeout: Duration,
        write_timeout: Duration,
    ) -> Result<Self> {
        socket.connect(remote).await?;
        debug!(
            "UDP transport {} -> {remote} ready",
            socket.local_addr()?
        );

        Ok(Self {
            socket,
            remote,
            read_timeout,
            write_timeout,
            stats: Mutex::new(TransportStats::default()),
        })
    }

    /// Get a copy of the transport statistics
    pub fn stats(&self) -> TransportStats {
        self.stats
            .lock()
            .map(|stats| stats.clone())
            .unwrap_or_default()
    }

    /// Local address of the socket
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    fn update_stats(&self, update: impl FnOnce(&mut TransportStats)) {
        if let Ok(mut stats) = self.stats.lock() {
            update(&mut stats);
        }
    }
}

#[async_trait]
impl DatagramTransport for UdpTransport {
    async fn send(&self, datagram: &[u8]) -> Result<()> {
        trace!("Sending {} bytes to {}", datagram.len(), self.remote);

        let result = match timeout(self.write_timeout, self.socket.send(datagram)).await {
            Ok(sent) => sent.map_err(ProtocolError::from),
            Err(_) => {
                warn!("Send timeout after {:?}", self.write_timeout);
                Err(ProtocolError::Timeout(self.write_timeout))
            }
        };

        match result {
            Ok(sent) => {
                self.update_stats(|stats| {
                    stats.packets_sent += 1;
                    stats.bytes_sent += sent as u64;
                });
                Ok(())
            }
            Err(e) => {
                self.update_stats(|stats| stats.send_errors += 1);
                Err(e)
            }
        }
    }

    async fn recv(&self, buffer: &mut [u8]) -> Result<usize> {
        let result = match timeout(self.read_timeout, self.socket.recv(buffer)).await {
            Ok(received) => received.map_err(ProtocolError::from),
            Err(_) => {
                warn!("Receive timeout after {:?}", self.read_timeout);
                Err(ProtocolError::Timeout(self.read_timeout))
            }
        };

        match result {
            Ok(size) => {
                trace!("Received {size} bytes from {}", self.remote);
                self.update_stats(|stats| {
                    stats.packets_received += 1;
                    stats.bytes_received += size as u64;
                });
                Ok(size)
            }
            Err(e) => {
                self.update_stats(|stats| stats.receive_errors += 1);
                Err(e)
            }
        }
    }

    fn remote_addr(&self) -> SocketAddr {
        self.remote
    }
}

/// Connector binding a fresh Tokio socket per session
#[derive(Debug, Clone)]
pub struct UdpConnector {
    read_timeout: Duration,
    write_timeout: Duration,
}

impl UdpConnector {
    /// Create a connector with the given socket timeouts
    pub fn new(read_timeout: Duration, write_timeout: Duration) -> Self {
        Self {
            read_timeout,
            write_timeout,
        }
    }
}

#[async_trait]
impl TransportConnector for UdpConnector {
    async fn connect(&self, endpoint: &ServerEndpoint) -> Result<Box<dyn DatagramTransport>> {
        let remote = lookup_host((endpoint.host.as_str(), endpoint.port))
            .await?
            .find(SocketAddr::is_ipv4)
            .ok_or_else(|| ProtocolError::AddressResolution {
                host: endpoint.host.clone(),
            })?;

        debug!("Binding local UDP port {} for {endpoint}", endpoint.local_port);
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, endpoint.local_port)).await?;
        let transport =
            UdpTransport::from_socket(socket, remote, self.read_timeout, self.write_timeout)
                .await?;
        Ok(Box::new(transport))
    }
}
