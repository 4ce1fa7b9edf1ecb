//! A single line read off a socket.
//!
//! Lines keep the bytes exactly as they were received so that request and response
//! heads can be replayed verbatim, while [`Line::content`] exposes the part without
//! the terminator for parsing.

use bytes::Bytes;

/// How a [`Line`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminator {
    /// `\r\n`
    CrLf,
    /// a lone `\n`
    Lf,
    /// a bare `\r` not followed by `\n`
    Cr,
    /// the peer closed the stream before a terminator arrived
    Eof,
    /// the line hit the length cap of the decoder
    LengthCap,
}

impl Terminator {
    /// Number of bytes the terminator occupies at the end of the raw line.
    #[inline]
    pub fn len(self) -> usize {
        match self {
            Terminator::CrLf => 2,
            Terminator::Lf | Terminator::Cr => 1,
            Terminator::Eof | Terminator::LengthCap => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    raw: Bytes,
    terminator: Terminator,
}

impl Line {
    pub fn new(raw: Bytes, terminator: Terminator) -> Self {
        debug_assert!(raw.len() >= terminator.len());
        Self { raw, terminator }
    }

    /// The line without its terminator.
    #[inline]
    pub fn content(&self) -> &[u8] {
        &self.raw[..self.raw.len() - self.terminator.len()]
    }

    /// The line as received, terminator included.
    #[inline]
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    #[inline]
    pub fn into_raw(self) -> Bytes {
        self.raw
    }

    #[inline]
    pub fn terminator(&self) -> Terminator {
        self.terminator
    }

    /// Number of raw bytes, terminator included.
    #[inline]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// A terminated line without content, the boundary between a head and its body.
    #[inline]
    pub fn is_blank(&self) -> bool {
        self.content().is_empty() && self.terminator.len() > 0
    }

    #[inline]
    pub fn is_truncated(&self) -> bool {
        self.terminator == Terminator::LengthCap
    }

    /// Returns the trimmed value if this line is a `name: value` header line.
    ///
    /// The name is matched case-insensitively.
    pub fn header_value(&self, name: &str) -> Option<&[u8]> {
        let content = self.content();
        let name = name.as_bytes();
        if content.len() <= name.len() || content[name.len()] != b':' {
            return None;
        }
        if !content[..name.len()].eq_ignore_ascii_case(name) {
            return None;
        }
        Some(content[name.len() + 1..].trim_ascii())
    }
}
