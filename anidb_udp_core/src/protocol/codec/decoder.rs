//! Response decoder for the AniDB UDP protocol
//!
//! A reply datagram goes through four steps:
//! 1. raw-inflate when it starts with the `00 00` compression marker
//! 2. text decoding (negotiated encoding when a `FE FF` mark is present, ASCII otherwise)
//! 3. framing on the two terminating newlines
//! 4. response code extraction

use super::TextEncoding;
use crate::protocol::error::{ProtocolError, Result};
use bytes::Bytes;
use flate2::read::DeflateDecoder;
use log::{debug, trace, warn};
use std::io::Read;

/// Marker that prefixes a raw-deflate compressed datagram
const COMPRESSION_MARKER: [u8; 2] = [0x00, 0x00];

/// UTF-16 byte-order mark as sent by the server
const BYTE_ORDER_MARK: [u8; 2] = [0xFE, 0xFF];

/// One decoded reply datagram
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireFrame {
    /// Datagram exactly as received
    pub raw: Bytes,
    /// Inflated payload when the compression marker was present
    pub decompressed: Option<Bytes>,
    /// Decoded text after the byte-order mark was stripped
    pub text: String,
    /// Text cut at the second newline, or the full text
    pub framed: String,
    /// Newline count was not exactly two
    pub truncated: bool,
}

impl WireFrame {
    /// Payload bytes the text was decoded from
    pub fn payload(&self) -> &[u8] {
        self.decompressed.as_deref().unwrap_or(&self.raw)
    }

    /// Numeric response code of the framed text
    pub fn response_code(&self) -> u16 {
        response_code(&self.framed)
    }
}

/// Decoder for AniDB reply datagrams
pub struct Decoder {
    /// Upper bound for inflated payloads
    inflate_limit: usize,
}

impl Decoder {
    /// Create a new decoder
    pub fn new() -> Self {
        Self {
            inflate_limit: crate::protocol::INFLATE_BUFFER_SIZE,
        }
    }

    /// Decode one reply datagram
    pub fn decode(&self, datagram: &[u8], encoding: TextEncoding) -> Result<WireFrame> {
        trace!("Decoder::decode called with {} bytes", datagram.len());

        if datagram.is_empty() {
            return Err(ProtocolError::decoding("Empty datagram"));
        }

        let raw = Bytes::copy_from_slice(datagram);
        let decompressed = if datagram.len() > 2 && datagram[..2] == COMPRESSION_MARKER {
            let inflated = inflate(&datagram[2..], self.inflate_limit)?;
            debug!(
                "Inflated {} compressed bytes to {}",
                datagram.len() - 2,
                inflated.len()
            );
            Some(inflated)
        } else {
            None
        };

        let payload = decompressed.as_deref().unwrap_or(datagram);
        let text = decode_text(payload, encoding);
        let (framed, truncated) = frame(&text);

        Ok(WireFrame {
            raw,
            decompressed,
            text,
            framed,
            truncated,
        })
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Raw-inflate a deflate stream without zlib header, capped at `limit` bytes
pub fn inflate(compressed: &[u8], limit: usize) -> Result<Bytes> {
    let mut output = Vec::with_capacity(limit.min(compressed.len() * 4));
    DeflateDecoder::new(compressed)
        .take(limit as u64)
        .read_to_end(&mut output)
        .map_err(|e| ProtocolError::decoding(format!("Inflate failed: {e}")))?;
    Ok(Bytes::from(output))
}

/// Decode payload bytes into text
///
/// Only payloads opening with `FE FF` are decoded with the negotiated
/// encoding. A leading U+FEFF is dropped afterwards.
pub fn decode_text(payload: &[u8], encoding: TextEncoding) -> String {
    let encoding = if payload.starts_with(&BYTE_ORDER_MARK) {
        encoding
    } else {
        TextEncoding::Ascii
    };

    let mut text = encoding.decode(payload);
    if text.starts_with('\u{FEFF}') {
        text.remove(0);
    }
    text
}

/// Cut decoded text at the terminating newline
///
/// Returns the framed text and whether the newline count deviated from two.
pub fn frame(text: &str) -> (String, bool) {
    let newlines: Vec<usize> = text.match_indices('\n').map(|(i, _)| i).collect();
    if newlines.len() == 2 {
        trace!("UDP_RESPONSE: {text}");
        (text[..=newlines[1]].to_string(), false)
    } else {
        warn!(
            "UDP_RESPONSE_TRUNC: {} newline(s) in {} chars: {text}",
            newlines.len(),
            text.len()
        );
        (text.to_string(), true)
    }
}

/// Parse the 3-digit response code, `0` when absent
pub fn response_code(framed: &str) -> u16 {
    if framed.chars().count() <= 2 {
        return 0;
    }
    framed
        .get(..3)
        .and_then(|code| code.parse().ok())
        .unwrap_or(0)
}
