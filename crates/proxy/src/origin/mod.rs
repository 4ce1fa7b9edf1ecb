//! Reaching the origin server of a request.
//!
//! [`connect_origin`] resolves a host name and dials the resolved addresses one after the
//! other until one accepts. [`AddressFamily`] decides which addresses take part: IPv4 only
//! by default, or IPv4 first followed by IPv6.
//!
//! The connection supervisor does not dial directly, it goes through the [`Connector`]
//! trait. [`TcpConnector`] is the production implementation, [`make_connector`] wraps an
//! async function.

mod connector;
mod resolver;

pub use connector::{make_connector, Connector, ConnectorFn, TcpConnector};
pub use resolver::{connect_origin, resolve, AddressFamily};
