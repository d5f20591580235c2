//! Reply datagram builders
//!
//! Produce the byte layouts the AniDB server sends: raw-deflate compressed
//! payloads behind a `00 00` marker and big-endian UTF-16 text behind a
//! `FE FF` byte-order mark.

use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::io::Write;

/// Raw-deflate `payload` and prefix the compression marker
pub fn compressed(payload: &[u8]) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(payload)
        .expect("writing to a Vec cannot fail");
    let deflated = encoder.finish().expect("finishing a Vec encoder cannot fail");

    let mut datagram = vec![0x00, 0x00];
    datagram.extend(deflated);
    datagram
}

/// Encode `text` as big-endian UTF-16 with a leading `FE FF`
pub fn utf16(text: &str) -> Vec<u8> {
    let mut datagram = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        datagram.extend(unit.to_be_bytes());
    }
    datagram
}

/// UTF-16 text, then compressed
pub fn utf16_compressed(text: &str) -> Vec<u8> {
    compressed(&utf16(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compressed_marker() {
        let datagram = compressed(b"220 FILE\n1|2|3\n");
        assert_eq!(&datagram[..2], &[0x00, 0x00]);
        assert!(datagram.len() > 2);
    }

    #[test]
    fn test_utf16_layout() {
        assert_eq!(utf16("2"), vec![0xFE, 0xFF, 0x00, 0x32]);
    }
}
