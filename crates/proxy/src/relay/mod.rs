//! The two ways a request is relayed once its origin is connected.
//!
//! - [`http()`]: plain HTTP. The request is re-framed toward the origin and the response
//!   streamed back, with `Connection: close` added to the response head.
//! - [`tunnel()`]: CONNECT. After the `200 Connection established` line, raw bytes are
//!   pumped in both directions until one side closes or the tunnel sits idle.

mod http_relay;
mod tunnel_relay;

pub use http_relay::{http, RelaySummary, REARM_EVERY_BODY_BYTES};
pub use tunnel_relay::{tunnel, TunnelEnd, TunnelSummary, TUNNEL_BUFFER_SIZE};
