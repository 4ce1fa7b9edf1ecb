//! Proxy connection handling module
//!
//! This module owns one client connection from accept to close and implements the
//! core connection handling logic of the proxy.
//!
//! # Components
//!
//! - [`ProxyConnection`]: the connection supervisor that:
//!   - Reads and parses the single request of the connection
//!   - Connects to the origin through a [`Connector`](crate::origin::Connector)
//!   - Dispatches to the HTTP relay or the CONNECT tunnel
//!   - Answers unparsable requests with `400 BAD REQUEST`
//!   - Closes the connection on every path
//! - [`ConnectionState`]: where a connection is in its lifetime
//! - [`IdleTimeout`]: the re-armable deadline bounding every blocking step
//!
//! # Features
//!
//! - Asynchronous I/O handling
//! - Streaming relay of request and response bodies
//! - Idle timeouts instead of a fixed connection lifetime
//! - No keep-alive, one request per connection

mod idle;
mod proxy_connection;

pub use idle::IdleTimeout;
pub use proxy_connection::{ConnectionConfig, ConnectionState, ProxyConnection, DEFAULT_IDLE_TIMEOUT};
