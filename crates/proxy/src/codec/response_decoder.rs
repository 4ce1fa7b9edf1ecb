//! Origin response decoder module
//!
//! Splits what an origin sends back into head lines and body chunks. Head lines are not
//! parsed into a structured head: each one is handed out as soon as it is complete so it
//! can be relayed to the client verbatim, while the decoder notes the status code and the
//! `Content-Length` on the way. The blank line ending the head carries the body framing.

use std::io;

use bytes::BytesMut;
use http::StatusCode;
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::codec::body::PayloadDecoder;
use crate::codec::line_decoder::{LineDecoder, MAX_LINE_BYTES};
use crate::protocol::{parse_status, Line, Message, PayloadSize, ProxyRequest, ResponseHeadLine};

const CONTENT_LENGTH: &str = "Content-Length";

/// A decoder for origin responses.
///
/// Yields `Message::Header(ResponseHeadLine::Line)` for the status line and every header
/// line, one `Message::Header(ResponseHeadLine::End)` for the blank line, and then the
/// response body as payload items.
#[derive(Debug)]
pub struct ResponseDecoder {
    line_decoder: LineDecoder,
    /// the request was a HEAD request, no body follows whatever the head says
    head_request: bool,
    status_line_seen: bool,
    status: Option<StatusCode>,
    content_length: Option<u64>,
    payload_decoder: Option<PayloadDecoder>,
}

impl ResponseDecoder {
    pub fn new(head_request: bool) -> Self {
        Self {
            line_decoder: LineDecoder::lf_only(MAX_LINE_BYTES),
            head_request,
            status_line_seen: false,
            status: None,
            content_length: None,
            payload_decoder: None,
        }
    }

    /// Creates the decoder for the response to `request`.
    pub fn for_request(request: &ProxyRequest) -> Self {
        Self::new(request.is_head())
    }

    /// The status code of the response head, once the status line has been read.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    fn on_line(&mut self, line: Line) -> ResponseHeadLine {
        if line.is_blank() {
            let payload_size = self.payload_size();
            trace!(status = ?self.status, ?payload_size, "parsed response head");
            self.payload_decoder = Some(payload_size.into());
            return ResponseHeadLine::End { blank: line, status: self.status, payload_size };
        }

        if !self.status_line_seen {
            self.status_line_seen = true;
            self.status = parse_status(line.content());
        } else if let Some(length) = line.header_value(CONTENT_LENGTH).and_then(parse_length) {
            self.content_length = Some(length);
        }

        ResponseHeadLine::Line(line)
    }

    fn payload_size(&self) -> PayloadSize {
        if self.head_request || self.status == Some(StatusCode::NOT_MODIFIED) {
            return PayloadSize::new_empty();
        }

        match self.content_length {
            Some(length) => PayloadSize::new_length(length),
            None => PayloadSize::new_until_eof(),
        }
    }

    fn decode_payload(&mut self, src: &mut BytesMut, eof: bool) -> io::Result<Option<Message<ResponseHeadLine>>> {
        let Some(payload_decoder) = &mut self.payload_decoder else {
            return Ok(None);
        };

        let item = if eof { payload_decoder.decode_eof(src)? } else { payload_decoder.decode(src)? };
        Ok(item.map(Message::Payload))
    }
}

/// A value that does not parse is ignored, the body then runs until the origin closes.
fn parse_length(value: &[u8]) -> Option<u64> {
    std::str::from_utf8(value).ok()?.parse().ok()
}

impl Decoder for ResponseDecoder {
    type Item = Message<ResponseHeadLine>;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.payload_decoder.is_some() {
            return self.decode_payload(src, false);
        }

        let line = self.line_decoder.decode(src)?;
        Ok(line.map(|line| Message::Header(self.on_line(line))))
    }

    /// The origin closed its side.
    ///
    /// A pending unterminated head line is still handed out, after that the stream ends
    /// without an `End` item and the caller learns the head is incomplete.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.payload_decoder.is_some() {
            return self.decode_payload(src, true);
        }

        let line = self.line_decoder.decode_eof(src)?;
        Ok(line.map(|line| Message::Header(self.on_line(line))))
    }
}
