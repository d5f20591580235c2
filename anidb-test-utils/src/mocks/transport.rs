//! Scripted AniDB server
//!
//! A [`ScriptedServer`] holds a queue of replies shared by every transport
//! its connector opens, so a test can script a whole conversation across
//! forced reconnects.
//!
//! ```rust,no_run
//! use anidb_test_utils::ScriptedServer;
//!
//! let server = ScriptedServer::new();
//! server.reply_text("300 PONG\n4556\n");
//! server.reply_timeout();
//! let connector = server.connector();
//! ```

use anidb_udp_core::protocol::error::{ProtocolError, Result};
use anidb_udp_core::protocol::transport::{
    DatagramTransport, ServerEndpoint, TransportConnector,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// One scripted answer to a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedReply {
    /// Deliver these bytes
    Datagram(Vec<u8>),
    /// Fail the receive with a timeout
    Timeout,
}

#[derive(Debug, Default)]
struct ServerState {
    replies: VecDeque<ScriptedReply>,
    sent: Vec<Vec<u8>>,
    connects: u32,
    failing_connects: u32,
}

/// Shared script and request log
#[derive(Debug, Clone, Default)]
pub struct ScriptedServer {
    state: Arc<Mutex<ServerState>>,
}

impl ScriptedServer {
    /// Create a server with an empty script
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ServerState> {
        self.state.lock().expect("scripted server lock poisoned")
    }

    /// Queue an ASCII reply
    pub fn reply_text(&self, text: &str) -> &Self {
        self.reply(text.as_bytes().to_vec())
    }

    /// Queue a raw reply datagram
    pub fn reply(&self, datagram: Vec<u8>) -> &Self {
        self.lock()
            .replies
            .push_back(ScriptedReply::Datagram(datagram));
        self
    }

    /// Queue a receive timeout
    pub fn reply_timeout(&self) -> &Self {
        self.lock().replies.push_back(ScriptedReply::Timeout);
        self
    }

    /// Make the next `count` connection attempts fail
    pub fn fail_next_connects(&self, count: u32) {
        self.lock().failing_connects = count;
    }

    /// A transport reading from this script
    pub fn transport(&self) -> ScriptedTransport {
        ScriptedTransport {
            server: self.clone(),
        }
    }

    /// A connector handing out transports for this script
    pub fn connector(&self) -> ScriptedConnector {
        ScriptedConnector {
            server: self.clone(),
        }
    }

    /// Every datagram sent so far
    pub fn sent_datagrams(&self) -> Vec<Vec<u8>> {
        self.lock().sent.clone()
    }

    /// Every request sent so far, read as ASCII
    pub fn sent_requests(&self) -> Vec<String> {
        self.lock()
            .sent
            .iter()
            .map(|d| String::from_utf8_lossy(d).into_owned())
            .collect()
    }

    /// Number of transports opened through the connector
    pub fn connect_count(&self) -> u32 {
        self.lock().connects
    }

    /// Replies not yet consumed
    pub fn remaining_replies(&self) -> usize {
        self.lock().replies.len()
    }
}

/// Transport backed by a [`ScriptedServer`]
#[derive(Debug, Clone)]
pub struct ScriptedTransport {
    server: ScriptedServer,
}

#[async_trait]
impl DatagramTransport for ScriptedTransport {
    async fn send(&self, datagram: &[u8]) -> Result<()> {
        self.server.lock().sent.push(datagram.to_vec());
        Ok(())
    }

    async fn recv(&self, buffer: &mut [u8]) -> Result<usize> {
        let next = self.server.lock().replies.pop_front();
        match next {
            Some(ScriptedReply::Datagram(datagram)) => {
                let len = datagram.len().min(buffer.len());
                buffer[..len].copy_from_slice(&datagram[..len]);
                Ok(len)
            }
            Some(ScriptedReply::Timeout) | None => {
                Err(ProtocolError::Timeout(Duration::from_secs(10)))
            }
        }
    }

    fn remote_addr(&self) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 9000))
    }
}

/// Connector backed by a [`ScriptedServer`]
#[derive(Debug, Clone)]
pub struct ScriptedConnector {
    server: ScriptedServer,
}

#[async_trait]
impl TransportConnector for ScriptedConnector {
    async fn connect(&self, endpoint: &ServerEndpoint) -> Result<Box<dyn DatagramTransport>> {
        let mut state = self.server.lock();
        if state.failing_connects > 0 {
            state.failing_connects -= 1;
            return Err(ProtocolError::AddressResolution {
                host: endpoint.host.clone(),
            });
        }
        state.connects += 1;
        Ok(Box::new(self.server.transport()))
    }
}
