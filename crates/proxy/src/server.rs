//! The listener of the proxy.
//!
//! A [`Server`] owns the bound [`TcpListener`] and spawns one task per accepted
//! connection. Each task runs a [`ProxyConnection`] inside its own tracing span.

use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{info, info_span, warn, Instrument};

use crate::codec::MAX_HEADER_BYTES;
use crate::connection::{ConnectionConfig, ProxyConnection, DEFAULT_IDLE_TIMEOUT};
use crate::origin::{AddressFamily, Connector, TcpConnector};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
    pub address: SocketAddr,
    pub connection: ConnectionConfig,
    pub address_family: AddressFamily,
}

#[derive(Debug, Clone)]
pub struct ServerBuilder {
    ip: IpAddr,
    port: u16,
    idle_timeout: Duration,
    max_header_bytes: usize,
    address_family: AddressFamily,
}

impl ServerBuilder {
    fn new() -> Self {
        Self {
            ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 0,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            max_header_bytes: MAX_HEADER_BYTES,
            address_family: AddressFamily::default(),
        }
    }

    /// The local address to listen on, all IPv4 interfaces by default.
    pub fn ip(mut self, ip: IpAddr) -> Self {
        self.ip = ip;
        self
    }

    /// The port to listen on, `0` picks any free port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn max_header_bytes(mut self, max_header_bytes: usize) -> Self {
        self.max_header_bytes = max_header_bytes;
        self
    }

    pub fn address_family(mut self, address_family: AddressFamily) -> Self {
        self.address_family = address_family;
        self
    }

    pub fn build(self) -> ServerConfig {
        ServerConfig {
            address: SocketAddr::new(self.ip, self.port),
            connection: ConnectionConfig { idle_timeout: self.idle_timeout, max_header_bytes: self.max_header_bytes },
            address_family: self.address_family,
        }
    }

    /// Builds the config and binds the listener.
    pub async fn bind(self) -> Result<Server, ServerError> {
        Server::bind(self.build()).await
    }
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("bind {address} failed: {source}")]
    Bind { address: SocketAddr, source: io::Error },

    #[error("can't read the bound address: {source}")]
    LocalAddr { source: io::Error },
}

/// A bound proxy listener, ready to [`run`](Server::run).
pub struct Server<C = TcpConnector> {
    listener: TcpListener,
    local_addr: SocketAddr,
    config: ServerConfig,
    connector: Arc<C>,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Binds the listener, origins are dialed with a [`TcpConnector`].
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let listener =
            TcpListener::bind(config.address).await.map_err(|source| ServerError::Bind { address: config.address, source })?;
        let local_addr = listener.local_addr().map_err(|source| ServerError::LocalAddr { source })?;

        Ok(Self { listener, local_addr, config, connector: Arc::new(TcpConnector::new(config.address_family)) })
    }
}

impl<C> Server<C>
where
    C: Connector + 'static,
{
    /// Replaces the way origins are dialed.
    pub fn with_connector<C2: Connector + 'static>(self, connector: C2) -> Server<C2> {
        Server { listener: self.listener, local_addr: self.local_addr, config: self.config, connector: Arc::new(connector) }
    }

    /// The address actually bound, with the chosen port when port `0` was requested.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Accepts connections forever, each one is served on its own task.
    ///
    /// A failed accept is logged and the loop goes on.
    pub async fn run(self) {
        info!(address = %self.local_addr, "start listening");
        let connection_config = self.config.connection;

        loop {
            let (tcp_stream, remote_addr) = match self.listener.accept().await {
                Ok(stream_and_addr) => stream_and_addr,
                Err(e) => {
                    warn!(cause = %e, "failed to accept");
                    continue;
                }
            };

            let connector = self.connector.clone();

            tokio::spawn(
                async move {
                    let (reader, writer) = tcp_stream.into_split();
                    let connection = ProxyConnection::new(reader, writer, connection_config);
                    match connection.process(connector.as_ref()).await {
                        Ok(()) => {
                            info!("finished process, connection shutdown");
                        }
                        Err(e) => {
                            warn!(cause = %e, "proxy connection failed, connection shutdown");
                        }
                    }
                }
                .instrument(info_span!("connection", %remote_addr)),
            );
        }
    }
}
