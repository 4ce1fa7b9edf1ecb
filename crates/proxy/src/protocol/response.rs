//! Response side types.
//!
//! The proxy never builds responses from structured headers. Origin response heads are
//! relayed line by line, and the few responses the proxy writes itself are fixed byte
//! strings.

use http::StatusCode;

use crate::protocol::{Line, PayloadSize};

/// Written to the client once a CONNECT tunnel is ready.
pub const CONNECTION_ESTABLISHED: &[u8] = b"HTTP/1.0 200 Connection established\r\n\r\n";

/// Injected after the origin's response headers, the proxy never keeps a connection alive.
pub const CONNECTION_CLOSE: &[u8] = b"Connection: close\r\n";

/// Written to the client when its request head can not be parsed.
pub const BAD_REQUEST: &[u8] = b"HTTP/1.0 400 BAD REQUEST\r\n\
Content-type: text/html\r\n\
\r\n\
Your browser sent a bad request, such as a POST without a Content-Length.\r\n";

/// One part of an origin response head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseHeadLine {
    /// The status line or a header line, to be relayed verbatim
    Line(Line),
    /// The blank line ending the head, together with what the head declared
    End { blank: Line, status: Option<StatusCode>, payload_size: PayloadSize },
}

/// Extracts the status code out of a `PROTO STATUS COMMENT` status line.
///
/// Anything unexpected yields `None` instead of an error, the line is relayed regardless.
pub fn parse_status(status_line: &[u8]) -> Option<StatusCode> {
    let mut tokens = status_line.split(|b| *b == b' ').filter(|token| !token.is_empty());
    let _protocol = tokens.next()?;
    StatusCode::from_bytes(tokens.next()?).ok()
}
