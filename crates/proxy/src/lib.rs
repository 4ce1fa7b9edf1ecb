//! An asynchronous micro forward HTTP proxy
//!
//! This crate provides a small forward proxy built on top of tokio. A client sends its
//! request to the proxy with an absolute `http://` target, or asks for an opaque tunnel
//! with `CONNECT host:port`; the proxy connects to the origin and relays the exchange.
//!
//! # Features
//!
//! - Plain HTTP relay with Content-Length or end-of-stream framing
//! - CONNECT tunnels for HTTPS, passed through without TLS termination
//! - Request and response heads relayed byte-for-byte
//! - Idle timeouts on every blocking step
//! - One task per connection, nothing shared between connections
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use micro_proxy::server::Server;
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = Server::builder()
//!         .port(8080)
//!         .idle_timeout(Duration::from_secs(300))
//!         .bind()
//!         .await
//!         .expect("bind server");
//!
//!     println!("micro-proxy running on port {}", server.local_addr().port());
//!     server.run().await;
//! }
//! ```
//!
//! # Architecture
//!
//! The crate is organized into several key modules:
//!
//! - [`protocol`]: requests, lines, payload framing and the error types
//! - [`codec`]: decoders and encoders for both legs of a proxied exchange
//! - [`origin`]: resolving and dialing origin servers
//! - [`relay`]: the HTTP relay and the CONNECT tunnel
//! - [`connection`]: the per-connection supervisor and its idle timeout
//! - [`server`]: the listener
//!
//! # Error Handling
//!
//! - [`protocol::ProxyError`]: Top-level error of a connection
//! - [`protocol::ParseError`]: the request head could not be parsed, answered with `400`
//! - [`protocol::OriginError`]: the origin could not be reached, the connection is closed
//! - [`protocol::TransferError`]: relaying failed midway
//! - [`server::ServerError`]: the listener could not be bound
//!
//! # Limitations
//!
//! - HTTP/1.x only, one request per connection
//! - Chunked request bodies are not decoded
//! - No TLS termination, no caching, no access control

pub mod codec;
pub mod connection;
pub mod origin;
pub mod protocol;
pub mod relay;
pub mod server;

mod utils;
pub(crate) use utils::ensure;
