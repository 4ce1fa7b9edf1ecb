//! Body framing for relayed payloads
//!
//! - [`LengthDecoder`]: fixed-length payloads (Content-Length)
//! - [`PayloadDecoder`]: picks the strategy, including end-of-stream delimited bodies
//!
//! Chunked transfer coding is not decoded, a proxy without keep-alive can relay such
//! bodies until the origin closes.

mod length_decoder;
mod payload_decoder;

pub use length_decoder::LengthDecoder;
pub use payload_decoder::PayloadDecoder;
