use std::io;
use std::net::SocketAddr;

use tokio::net::{lookup_host, TcpStream};
use tracing::debug;

use crate::protocol::OriginError;

/// Which resolved addresses are dialed, and in what order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AddressFamily {
    /// Only IPv4 addresses, in resolver order
    #[default]
    Ipv4Only,
    /// IPv4 addresses first, then IPv6 addresses, each in resolver order
    Ipv4First,
}

impl AddressFamily {
    /// Filters and orders the resolved addresses.
    pub fn order<I: IntoIterator<Item = SocketAddr>>(self, addrs: I) -> Vec<SocketAddr> {
        let (ipv4, ipv6): (Vec<_>, Vec<_>) = addrs.into_iter().partition(SocketAddr::is_ipv4);
        match self {
            AddressFamily::Ipv4Only => ipv4,
            AddressFamily::Ipv4First => ipv4.into_iter().chain(ipv6).collect(),
        }
    }
}

/// Resolves `host:port` to the addresses worth dialing.
pub async fn resolve(host: &str, port: u16, family: AddressFamily) -> Result<Vec<SocketAddr>, OriginError> {
    let resolved = lookup_host((host, port)).await.map_err(|e| OriginError::lookup(host, e))?;

    let addrs = family.order(resolved);
    if addrs.is_empty() {
        return Err(OriginError::no_address(host));
    }
    Ok(addrs)
}

/// Resolves `host` and connects to the first address that accepts.
///
/// Every address is tried once, in order. There is no retry and nothing is cached.
pub async fn connect_origin(host: &str, port: u16, family: AddressFamily) -> Result<TcpStream, OriginError> {
    let addrs = resolve(host, port, family).await?;

    let mut last_error = None;
    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(stream) => {
                debug!(%addr, "connected to origin");
                return Ok(stream);
            }
            Err(e) => {
                debug!(%addr, cause = %e, "connect to origin address failed");
                last_error = Some(e);
            }
        }
    }

    let source = last_error.unwrap_or_else(|| io::Error::from(io::ErrorKind::NotFound));
    Err(OriginError::connect(host, port, source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    fn addr(s: &str) -> SocketAddr {
        s.parse().unwrap()
    }

    #[test]
    fn ipv4_only_drops_ipv6() {
        let addrs = vec![addr("[::1]:80"), addr("127.0.0.1:80"), addr("10.0.0.1:80")];
        assert_eq!(AddressFamily::Ipv4Only.order(addrs), vec![addr("127.0.0.1:80"), addr("10.0.0.1:80")]);
    }

    #[test]
    fn ipv4_first_keeps_both_in_order() {
        let addrs = vec![addr("[::1]:80"), addr("127.0.0.1:80"), addr("[::2]:80"), addr("10.0.0.1:80")];
        assert_eq!(
            AddressFamily::Ipv4First.order(addrs),
            vec![addr("127.0.0.1:80"), addr("10.0.0.1:80"), addr("[::1]:80"), addr("[::2]:80")]
        );
    }

    #[tokio::test]
    async fn connects_to_listening_origin() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let stream = connect_origin("127.0.0.1", port, AddressFamily::Ipv4Only).await.unwrap();
        assert_eq!(stream.peer_addr().unwrap().port(), port);
    }

    #[tokio::test]
    async fn refused_connect_is_connect_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let result = connect_origin("127.0.0.1", port, AddressFamily::Ipv4Only).await;
        assert!(matches!(result, Err(OriginError::Connect { port: p, .. }) if p == port));
    }

    #[tokio::test]
    async fn ipv6_literal_has_no_ipv4_address() {
        let result = resolve("::1", 80, AddressFamily::Ipv4Only).await;
        assert!(matches!(result, Err(OriginError::NoAddress { .. })));
    }

    #[tokio::test]
    async fn unknown_host_fails() {
        let result = connect_origin("nonexistent.invalid", 80, AddressFamily::Ipv4Only).await;
        assert!(matches!(result, Err(OriginError::Lookup { .. } | OriginError::NoAddress { .. })));
    }
}
