//! Proxy codec module for decoding and encoding what flows through the proxy
//!
//! This module provides streaming processing for both legs of a proxied exchange. It
//! uses a state machine pattern to handle heads and payload data, and keeps every head
//! line byte-for-byte so it can be replayed verbatim.
//!
//! # Architecture
//!
//! - Lines:
//!   - [`LineDecoder`]: cuts `\r\n`, `\n` or bare `\r` terminated lines out of a buffer
//!
//! - Client side:
//!   - [`RequestDecoder`]: decodes the proxy request head and its Content-Length body
//!
//! - Origin side:
//!   - [`RequestEncoder`]: writes the forwarded request head and body
//!   - [`ResponseDecoder`]: hands out response head lines and the response body
//!
//! - Payload decoding via the `body` module
//!
//! # Example
//!
//! ```no_run
//! use micro_proxy::codec::{RequestDecoder, RequestEncoder};
//! use micro_proxy::protocol::{Message, PayloadItem, ProxyRequest};
//! use tokio_util::codec::{Decoder, Encoder};
//! use bytes::{Bytes, BytesMut};
//!
//! // Decode the client request
//! let mut decoder = RequestDecoder::new();
//! let mut request_buffer = BytesMut::from("GET http://example.com/ HTTP/1.0\r\n\r\n");
//! if let Ok(Some(Message::Header(request))) = decoder.decode(&mut request_buffer) {
//!     // Encode it for the origin
//!     let mut encoder = RequestEncoder::new();
//!     let mut origin_buffer = BytesMut::new();
//!     let _ = encoder.encode(Message::<&ProxyRequest, Bytes>::Header(&request), &mut origin_buffer);
//! }
//! ```

mod body;
mod line_decoder;
mod request_decoder;
mod request_encoder;
mod response_decoder;

pub use body::{LengthDecoder, PayloadDecoder};
pub use line_decoder::{LineDecoder, MAX_LINE_BYTES};
pub use request_decoder::{RequestDecoder, MAX_HEADER_BYTES};
pub use request_encoder::RequestEncoder;
pub use response_decoder::ResponseDecoder;
