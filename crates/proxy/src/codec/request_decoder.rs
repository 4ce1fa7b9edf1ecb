//! Proxy request decoder module
//!
//! Decodes what a client sends to the proxy: the request line, the header block and the
//! request body, in that order.
//!
//! # Components
//!
//! - [`RequestDecoder`]: coordinates head and payload decoding
//! - Head parsing: line by line through [`LineDecoder`], the request line is parsed by
//!   [`RequestLine::parse`] and header lines are kept raw for verbatim replay
//! - Payload handling: [`PayloadDecoder`] framed by the request's Content-Length
//!
//! # Example
//!
//! ```no_run
//! use micro_proxy::codec::RequestDecoder;
//! use tokio_util::codec::Decoder;
//! use bytes::BytesMut;
//!
//! let mut decoder = RequestDecoder::new();
//! let mut buffer = BytesMut::from("GET http://example.com/ HTTP/1.0\r\n\r\n");
//! let result = decoder.decode(&mut buffer);
//! ```

use bytes::{BufMut, BytesMut};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::codec::body::PayloadDecoder;
use crate::codec::line_decoder::{LineDecoder, MAX_LINE_BYTES};
use crate::ensure;
use crate::protocol::{Line, Message, ParseError, PayloadItem, PayloadSize, ProxyRequest, RequestLine};

/// Default limit for the request line plus all header lines
pub const MAX_HEADER_BYTES: usize = 20 * 1024;

const CONTENT_LENGTH: &str = "Content-Length";

/// A decoder for proxy requests that handles both the head and the payload
///
/// # State Machine
///
/// - `head` and `payload_decoder` both `None`: waiting for the request line
/// - `head` is `Some`: collecting header lines
/// - `payload_decoder` is `Some`: yielding the request body
#[derive(Debug)]
pub struct RequestDecoder {
    line_decoder: LineDecoder,
    max_header_bytes: usize,
    head: Option<PartialHead>,
    payload_decoder: Option<PayloadDecoder>,
}

/// The part of a request head seen so far.
#[derive(Debug)]
struct PartialHead {
    line: RequestLine,
    headers: BytesMut,
    size: usize,
    content_length: Option<u64>,
}

impl RequestDecoder {
    /// Creates a new `RequestDecoder` with the default limits
    pub fn new() -> Self {
        Default::default()
    }

    /// Creates a `RequestDecoder` rejecting heads larger than `max_header_bytes`
    pub fn with_max_header_bytes(max_header_bytes: usize) -> Self {
        Self { max_header_bytes, ..Default::default() }
    }

    fn on_line(&mut self, line: Line) -> Result<Option<Message<ProxyRequest>>, ParseError> {
        let max_header_bytes = self.max_header_bytes;
        ensure!(!line.is_truncated(), ParseError::too_large_header(line.len(), self.line_decoder.max_len()));

        let Some(head) = self.head.as_mut() else {
            ensure!(line.len() <= max_header_bytes, ParseError::too_large_header(line.len(), max_header_bytes));
            let request_line = RequestLine::parse(line.content())?;
            trace!(request_line = %line.content().escape_ascii(), "parsed request line");
            self.head = Some(PartialHead { line: request_line, headers: BytesMut::new(), size: line.len(), content_length: None });
            return Ok(None);
        };

        head.size += line.len();
        ensure!(head.size <= max_header_bytes, ParseError::too_large_header(head.size, max_header_bytes));

        if !line.is_blank() {
            head.push(&line)?;
            return Ok(None);
        }

        self.head.take().map(|head| self.finish_head(head)).transpose()
    }

    fn finish_head(&mut self, head: PartialHead) -> Result<Message<ProxyRequest>, ParseError> {
        let payload_size = match head.content_length {
            _ if head.line.is_tunnel() => PayloadSize::new_empty(),
            Some(length) => PayloadSize::new_length(length),
            None => PayloadSize::new_empty(),
        };
        trace!(head_size = head.size, ?payload_size, "parsed request head");

        self.payload_decoder = Some(payload_size.into());
        Ok(Message::Header(ProxyRequest::new(head.line, head.headers.freeze(), payload_size)))
    }

    fn decode_payload(&mut self, src: &mut BytesMut, eof: bool) -> Result<Option<Message<ProxyRequest>>, ParseError> {
        let Some(payload_decoder) = &mut self.payload_decoder else {
            return Ok(None);
        };

        let item = if eof { payload_decoder.decode_eof(src)? } else { payload_decoder.decode(src)? };
        let message = match item {
            Some(item @ PayloadItem::Chunk(_)) => Some(Message::Payload(item)),
            Some(item @ PayloadItem::Eof) => {
                // no need payload decoder in this request now
                self.payload_decoder.take();
                Some(Message::Payload(item))
            }
            None => None,
        };

        Ok(message)
    }
}

impl PartialHead {
    fn push(&mut self, line: &Line) -> Result<(), ParseError> {
        if let Some(value) = line.header_value(CONTENT_LENGTH) {
            let length = std::str::from_utf8(value)
                .ok()
                .and_then(|value| value.parse::<u64>().ok())
                .ok_or_else(|| ParseError::invalid_content_length(format!("value {} is not u64", value.escape_ascii())))?;

            match self.content_length {
                Some(previous) if previous != length => {
                    return Err(ParseError::invalid_content_length(format!("conflicting values {previous} and {length}")));
                }
                _ => self.content_length = Some(length),
            }
        }

        self.headers.put_slice(line.raw());
        Ok(())
    }
}

impl Default for RequestDecoder {
    fn default() -> Self {
        Self {
            line_decoder: LineDecoder::new(MAX_LINE_BYTES),
            max_header_bytes: MAX_HEADER_BYTES,
            head: None,
            payload_decoder: None,
        }
    }
}

impl Decoder for RequestDecoder {
    type Item = Message<ProxyRequest>;
    type Error = ParseError;

    /// Attempts to decode the next part of a proxy request from the provided buffer
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Message::Header(_)))`: the request head is complete
    /// - `Ok(Some(Message::Payload(_)))`: a request body chunk, or its end
    /// - `Ok(None)`: need more data to proceed
    /// - `Err(_)`: the head is malformed or too large
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.payload_decoder.is_some() {
            return self.decode_payload(src, false);
        }

        while let Some(line) = self.line_decoder.decode(src)? {
            if let Some(message) = self.on_line(line)? {
                return Ok(Some(message));
            }
        }

        Ok(None)
    }

    /// The client closed its side.
    ///
    /// A head that already has its request line is completed with the header lines
    /// received so far, nothing at all means there was no request.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.payload_decoder.is_some() {
            return self.decode_payload(src, true);
        }

        while let Some(line) = self.line_decoder.decode_eof(src)? {
            if let Some(message) = self.on_line(line)? {
                return Ok(Some(message));
            }
        }

        self.head.take().map(|head| self.finish_head(head)).transpose()
    }
}
