use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

use crate::origin::resolver::{connect_origin, AddressFamily};
use crate::protocol::{OriginError, Target};

/// Opens the connection to the origin of a request.
#[async_trait]
pub trait Connector: Send + Sync {
    type Stream: AsyncRead + AsyncWrite + Send + Unpin;

    async fn connect(&self, target: &Target) -> Result<Self::Stream, OriginError>;
}

/// Dials origins over TCP after a DNS lookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector {
    family: AddressFamily,
}

impl TcpConnector {
    pub fn new(family: AddressFamily) -> Self {
        Self { family }
    }

    pub fn family(&self) -> AddressFamily {
        self.family
    }
}

#[async_trait]
impl Connector for TcpConnector {
    type Stream = TcpStream;

    async fn connect(&self, target: &Target) -> Result<Self::Stream, OriginError> {
        connect_origin(target.host(), target.port(), self.family).await
    }
}

#[derive(Debug)]
pub struct ConnectorFn<F> {
    f: F,
}

#[async_trait]
impl<S, F, Fut> Connector for ConnectorFn<F>
where
    S: AsyncRead + AsyncWrite + Send + Unpin,
    F: Fn(Target) -> Fut + Send + Sync,
    Fut: Future<Output = Result<S, OriginError>> + Send,
{
    type Stream = S;

    async fn connect(&self, target: &Target) -> Result<Self::Stream, OriginError> {
        (self.f)(target.clone()).await
    }
}

/// Turns an async function into a [`Connector`], handy to route targets somewhere else.
pub fn make_connector<F, S, Fut>(f: F) -> ConnectorFn<F>
where
    F: Fn(Target) -> Fut,
    Fut: Future<Output = Result<S, OriginError>>,
{
    ConnectorFn { f }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt, DuplexStream};

    #[tokio::test]
    async fn connector_fn_sees_target() {
        let connector = make_connector(|target: Target| async move {
            let (mut near, far) = duplex(64);
            near.write_all(target.to_string().as_bytes()).await.map_err(|e| OriginError::connect(target.host(), target.port(), e))?;
            Ok::<DuplexStream, OriginError>(far)
        });

        let mut stream = connector.connect(&Target::new("example.com", 8080, "/")).await.unwrap();
        let mut buf = [0u8; 16];
        let n = stream.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"example.com:8080");
    }

    #[tokio::test]
    async fn tcp_connector_reports_unreachable_origin() {
        let result = TcpConnector::default().connect(&Target::new("nonexistent.invalid", 80, "")).await;
        assert!(result.is_err());
    }
}
