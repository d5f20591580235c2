//! Wire codec for the AniDB UDP protocol
//!
//! This module handles the conversion between request text and datagram bytes,
//! decompression and framing of replies, and multi-part reassembly.

mod decoder;
mod encoder;
mod multipart;

pub use decoder::{Decoder, WireFrame, decode_text, frame, inflate, response_code};
pub use encoder::Encoder;
pub use multipart::{MultipartAssembler, MultipartKind, MultipartState};

use crate::protocol::error::Result;
use bytes::Bytes;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Text encoding of a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextEncoding {
    /// 7-bit ASCII, the encoding every session starts in
    #[default]
    #[serde(rename = "ascii")]
    Ascii,
    /// UTF-16 big-endian without byte-order mark
    #[serde(rename = "utf-16", alias = "utf16")]
    Utf16,
}

impl TextEncoding {
    /// Name sent in the `enc=` login parameter
    pub fn wire_name(&self) -> &'static str {
        match self {
            TextEncoding::Ascii => "ascii",
            TextEncoding::Utf16 => "utf-16",
        }
    }

    /// Check if this is a Unicode encoding
    pub fn is_unicode(&self) -> bool {
        matches!(self, TextEncoding::Utf16)
    }

    /// Decode bytes, replacing anything unrepresentable
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            TextEncoding::Ascii => bytes
                .iter()
                .map(|&b| if b.is_ascii() { b as char } else { '?' })
                .collect(),
            TextEncoding::Utf16 => {
                let units = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
                let mut text: String = char::decode_utf16(units)
                    .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
                    .collect();
                if bytes.len() % 2 == 1 {
                    text.push(char::REPLACEMENT_CHARACTER);
                }
                text
            }
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Codec for encoding requests and decoding reply datagrams
pub struct Codec {
    encoder: Encoder,
    decoder: Decoder,
}

impl Codec {
    /// Create a new codec instance
    pub fn new() -> Self {
        Self {
            encoder: Encoder::new(),
            decoder: Decoder::new(),
        }
    }

    /// Encode a request string into datagram bytes
    pub fn encode(&mut self, request: &str, encoding: TextEncoding) -> Result<Bytes> {
        debug!("Codec encoding request as {encoding}");
        self.encoder.encode(request, encoding)
    }

    /// Decode a reply datagram
    pub fn decode(&self, datagram: &[u8], encoding: TextEncoding) -> Result<WireFrame> {
        debug!("Codec decoding {} bytes", datagram.len());
        let frame = self.decoder.decode(datagram, encoding)?;
        trace!("Decoded content: {}", frame.framed);
        Ok(frame)
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self::new()
    }
}
