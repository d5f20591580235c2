//! Request encoder for the AniDB UDP protocol
//!
//! Turns request text into the bytes of a single datagram using the
//! session's current [`TextEncoding`].

use super::TextEncoding;
use crate::protocol::error::{ProtocolError, Result};
use bytes::{BufMut, Bytes, BytesMut};
use log::{debug, trace};

/// Encoder for AniDB protocol requests
pub struct Encoder {
    /// Buffer for encoding
    buffer: BytesMut,
}

impl Encoder {
    /// Create a new encoder
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(crate::protocol::MAX_PACKET_SIZE),
        }
    }

    /// Encode a request string into bytes
    pub fn encode(&mut self, request: &str, encoding: TextEncoding) -> Result<Bytes> {
        self.buffer.clear();

        if request.is_empty() {
            debug!("Attempted to encode empty request");
            return Err(ProtocolError::encoding("Empty request"));
        }

        match encoding {
            TextEncoding::Ascii => {
                for ch in request.chars() {
                    self.buffer.put_u8(if ch.is_ascii() { ch as u8 } else { b'?' });
                }
            }
            TextEncoding::Utf16 => {
                for unit in request.encode_utf16() {
                    self.buffer.put_u16(unit);
                }
            }
        }

        if self.buffer.len() > crate::protocol::MAX_PACKET_SIZE {
            debug!(
                "Request too large: {} bytes (max: {})",
                self.buffer.len(),
                crate::protocol::MAX_PACKET_SIZE
            );
            return Err(ProtocolError::packet_too_large(
                self.buffer.len(),
                crate::protocol::MAX_PACKET_SIZE,
            ));
        }

        trace!("Encoded {} bytes as {encoding}", self.buffer.len());
        Ok(self.buffer.split().freeze())
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}
