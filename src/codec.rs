//! Line framer — turns a byte stream into trimmed, non-empty lines.
//!
//! Grounded in the `Decoder`/`Encoder` split `shroom-net` uses for its packet
//! codec (`codec::legacy::codec`), adapted from length-prefixed binary frames
//! to `\n`-terminated text. Empty lines are swallowed inside `decode` itself —
//! the caller never sees them — by looping until a non-empty trimmed line is
//! found or more bytes are needed.

use bytes::BytesMut;
use thiserror::Error;
use tokio_util::codec::{Decoder, Encoder};

/// Accumulator cap: a connection that sends this many bytes without a `\n` is
/// dropped rather than allowed to grow unbounded.
pub const MAX_LINE_LEN: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum LineCodecError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line exceeded {MAX_LINE_LEN} bytes without a newline")]
    Overflow,
}

#[derive(Debug, Default)]
pub struct LineCodec;

impl Decoder for LineCodec {
    type Item = String;
    type Error = LineCodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            let Some(newline_at) = src.iter().position(|b| *b == b'\n') else {
                if src.len() > MAX_LINE_LEN {
                    return Err(LineCodecError::Overflow);
                }
                return Ok(None);
            };

            let raw = src.split_to(newline_at + 1);
            let trimmed = trim(&raw[..raw.len() - 1]);

            if trimmed.is_empty() {
                // Discard empty lines silently and keep looking in the same call.
                continue;
            }

            return Ok(Some(String::from_utf8_lossy(trimmed).into_owned()));
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(line) => Ok(Some(line)),
            None if src.is_empty() => Ok(None),
            None => {
                // Trailing, unterminated bytes at EOF: trim and surface once,
                // then drop them. The stream isn't restartable past this point.
                let rest = src.split_to(src.len());
                let trimmed = trim(&rest);
                if trimmed.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(String::from_utf8_lossy(trimmed).into_owned()))
                }
            }
        }
    }
}

impl<'a> Encoder<&'a str> for LineCodec {
    type Error = LineCodecError;

    fn encode(&mut self, item: &'a str, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(item.len() + 1);
        dst.extend_from_slice(item.as_bytes());
        dst.extend_from_slice(b"\n");
        Ok(())
    }
}

impl Encoder<String> for LineCodec {
    type Error = LineCodecError;

    fn encode(&mut self, item: String, dst: &mut BytesMut) -> Result<(), Self::Error> {
        Encoder::<&str>::encode(self, &item, dst)
    }
}

/// Strips leading/trailing space, tab, CR, LF.
fn trim(bytes: &[u8]) -> &[u8] {
    let is_ws = |b: &u8| matches!(*b, b' ' | b'\t' | b'\r' | b'\n');
    let start = bytes.iter().position(|b| !is_ws(b)).unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !is_ws(b))
        .map(|i| i + 1)
        .unwrap_or(0);
    if start >= end {
        &[]
    } else {
        &bytes[start..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(input: &[u8]) -> Vec<String> {
        let mut codec = LineCodec;
        let mut buf = BytesMut::from(input);
        let mut out = Vec::new();
        while let Some(line) = codec.decode(&mut buf).unwrap() {
            out.push(line);
        }
        out
    }

    #[test]
    fn splits_and_trims_lines() {
        let lines = decode_all(b"hello\r\n  world  \n");
        assert_eq!(lines, vec!["hello", "world"]);
    }

    #[test]
    fn discards_empty_lines() {
        let lines = decode_all(b"\n\n  \t\r\n/rooms\n\n");
        assert_eq!(lines, vec!["/rooms"]);
    }

    #[test]
    fn tolerant_of_partial_reads() {
        let mut codec = LineCodec;
        let mut buf = BytesMut::new();
        buf.extend_from_slice(b"hel");
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        buf.extend_from_slice(b"lo\n");
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("hello".to_string()));
    }

    #[test]
    fn overflow_without_newline_is_an_error() {
        let mut codec = LineCodec;
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&vec![b'a'; MAX_LINE_LEN + 1]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(LineCodecError::Overflow)
        ));
    }

    #[test]
    fn encode_appends_newline() {
        let mut codec = LineCodec;
        let mut buf = BytesMut::new();
        Encoder::<&str>::encode(&mut codec, "ROOM|Lobby", &mut buf).unwrap();
        assert_eq!(&buf[..], b"ROOM|Lobby\n");
    }
}
