//! Line decoder for request and response heads.
//!
//! Lines are cut out of the read buffer without copying. Two terminator conventions are
//! supported:
//!
//! - [`LineDecoder::new`]: client side. `\r\n` and `\n` end a line, and so does a bare `\r`.
//!   A bare `\r` is only decided once the following byte is visible, and that byte is left
//!   in the buffer when it is not `\n`.
//! - [`LineDecoder::lf_only`]: origin side. Only `\n` ends a line, an immediately preceding
//!   `\r` is reported as part of a `\r\n` terminator.
//!
//! A line never holds more than `max_len - 1` bytes of content. A longer line is cut at
//! that point and the rest is returned as the next line. A terminator starting right at
//! the cap is kept with the line in both modes.

use std::io;

use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::protocol::{Line, Terminator};

/// Default line length cap, bytes after it start a new line
pub const MAX_LINE_BYTES: usize = 10 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineDecoder {
    max_len: usize,
    bare_cr_ends_line: bool,
}

impl LineDecoder {
    /// Creates a decoder that treats `\r\n`, `\n` and a bare `\r` as line ends.
    pub fn new(max_len: usize) -> Self {
        Self { max_len: max_len.max(2), bare_cr_ends_line: true }
    }

    /// Creates a decoder that only treats `\n` as a line end.
    pub fn lf_only(max_len: usize) -> Self {
        Self { max_len: max_len.max(2), bare_cr_ends_line: false }
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    #[inline]
    fn content_limit(&self) -> usize {
        self.max_len - 1
    }
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new(MAX_LINE_BYTES)
    }
}

impl Decoder for LineDecoder {
    type Item = Line;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let limit = self.content_limit();
        // in lf_only mode a `\r\n` right after the cap still belongs to the line
        let scan = if self.bare_cr_ends_line { limit + 1 } else { limit + 2 };

        for (index, byte) in src.iter().enumerate().take(scan) {
            match *byte {
                b'\n' => {
                    let after_cr = index > 0 && src[index - 1] == b'\r';
                    if index > limit && !after_cr {
                        break;
                    }
                    let terminator = if !self.bare_cr_ends_line && after_cr { Terminator::CrLf } else { Terminator::Lf };
                    return Ok(Some(split_line(src, index + 1, terminator)));
                }
                b'\r' if self.bare_cr_ends_line => {
                    return match src.get(index + 1) {
                        Some(b'\n') => Ok(Some(split_line(src, index + 2, Terminator::CrLf))),
                        Some(_) => Ok(Some(split_line(src, index + 1, Terminator::Cr))),
                        // peek the next byte before deciding
                        None => Ok(None),
                    };
                }
                _ => {}
            }
        }

        if !self.bare_cr_ends_line && src.len() == limit + 1 && src[limit] == b'\r' {
            // wait for the `\n` that may follow
            return Ok(None);
        }

        if src.len() > limit {
            return Ok(Some(split_line(src, limit, Terminator::LengthCap)));
        }

        Ok(None)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }

        if src.is_empty() {
            return Ok(None);
        }

        let terminator = if self.bare_cr_ends_line && src.ends_with(b"\r") { Terminator::Cr } else { Terminator::Eof };
        let len = src.len();
        Ok(Some(split_line(src, len, terminator)))
    }
}

#[inline]
fn split_line(src: &mut BytesMut, len: usize, terminator: Terminator) -> Line {
    Line::new(src.split_to(len).freeze(), terminator)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(decoder: &mut LineDecoder, input: &[u8]) -> Vec<Line> {
        let mut buf = BytesMut::from(input);
        let mut lines = vec![];
        while let Some(line) = decoder.decode(&mut buf).unwrap() {
            lines.push(line);
        }
        while let Some(line) = decoder.decode_eof(&mut buf).unwrap() {
            lines.push(line);
        }
        lines
    }

    #[test]
    fn crlf_and_lf() {
        let lines = decode_all(&mut LineDecoder::default(), b"GET x HTTP/1.0\r\nHost: a\n\r\n");

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].content(), b"GET x HTTP/1.0");
        assert_eq!(lines[0].terminator(), Terminator::CrLf);
        assert_eq!(lines[1].content(), b"Host: a");
        assert_eq!(lines[1].raw().as_ref(), b"Host: a\n");
        assert!(lines[2].is_blank());
    }

    #[test]
    fn bare_cr_ends_line_without_consuming_next_byte() {
        let mut buf = BytesMut::from(&b"abc\rdef\n"[..]);
        let mut decoder = LineDecoder::default();

        let line = decoder.decode(&mut buf).unwrap().unwrap();
        assert_eq!(line.content(), b"abc");
        assert_eq!(line.terminator(), Terminator::Cr);
        assert_eq!(&buf[..], b"def\n");
    }

    #[test]
    fn bare_cr_at_buffer_end_waits_for_peek() {
        let mut buf = BytesMut::from(&b"abc\r"[..]);
        let mut decoder = LineDecoder::default();

        assert!(decoder.decode(&mut buf).unwrap().is_none());
        assert_eq!(&buf[..], b"abc\r");

        buf.extend_from_slice(b"\n");
        let line = decoder.decode(&mut buf).unwrap().unwrap();
        assert_eq!(line.content(), b"abc");
        assert_eq!(line.terminator(), Terminator::CrLf);
        assert!(buf.is_empty());
    }

    #[test]
    fn eof_without_bytes_yields_nothing() {
        let mut buf = BytesMut::new();
        assert!(LineDecoder::default().decode_eof(&mut buf).unwrap().is_none());
    }

    #[test]
    fn eof_flushes_pending_line() {
        let lines = decode_all(&mut LineDecoder::default(), b"GET /");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].content(), b"GET /");
        assert_eq!(lines[0].terminator(), Terminator::Eof);

        let lines = decode_all(&mut LineDecoder::default(), b"GET /\r");
        assert_eq!(lines[0].content(), b"GET /");
        assert_eq!(lines[0].terminator(), Terminator::Cr);
    }

    #[test]
    fn long_line_is_cut_at_cap() {
        let mut decoder = LineDecoder::new(5);
        let lines = decode_all(&mut decoder, b"abcdefg\n");

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].content(), b"abcd");
        assert!(lines[0].is_truncated());
        assert_eq!(lines[1].content(), b"efg");
        assert_eq!(lines[1].terminator(), Terminator::Lf);
    }

    #[test]
    fn terminator_right_after_cap_is_kept_with_line() {
        let lines = decode_all(&mut LineDecoder::new(5), b"abcd\r\nx\n");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].content(), b"abcd");
        assert_eq!(lines[0].terminator(), Terminator::CrLf);
    }

    #[test]
    fn lf_only_keeps_bare_cr_as_content() {
        let lines = decode_all(&mut LineDecoder::lf_only(MAX_LINE_BYTES), b"HTTP/1.1 200 OK\r\nX: a\rb\n\n");

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].content(), b"HTTP/1.1 200 OK");
        assert_eq!(lines[0].terminator(), Terminator::CrLf);
        assert_eq!(lines[1].content(), b"X: a\rb");
        assert!(lines[2].is_blank());
    }

    #[test]
    fn lf_only_keeps_crlf_right_after_cap() {
        let lines = decode_all(&mut LineDecoder::lf_only(5), b"abcd\r\nX: y\n\n");

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].content(), b"abcd");
        assert_eq!(lines[0].terminator(), Terminator::CrLf);
        assert_eq!(lines[1].content(), b"X: y");
        assert!(lines[2].is_blank());
    }

    #[test]
    fn lf_only_waits_for_lf_after_cap() {
        let mut decoder = LineDecoder::lf_only(5);
        let mut buf = BytesMut::from(&b"abcd\r"[..]);
        assert!(decoder.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(b"\n");
        let line = decoder.decode(&mut buf).unwrap().unwrap();
        assert_eq!(line.content(), b"abcd");
        assert_eq!(line.terminator(), Terminator::CrLf);
        assert!(buf.is_empty());
    }

    #[test]
    fn lf_only_still_cuts_long_lines() {
        let lines = decode_all(&mut LineDecoder::lf_only(5), b"abcde\n");

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].content(), b"abcd");
        assert!(lines[0].is_truncated());
        assert_eq!(lines[1].content(), b"e");

        let lines = decode_all(&mut LineDecoder::lf_only(5), b"abcd\rx\n");
        assert_eq!(lines[0].content(), b"abcd");
        assert!(lines[0].is_truncated());
        assert_eq!(lines[1].content(), b"\rx");
    }
}
