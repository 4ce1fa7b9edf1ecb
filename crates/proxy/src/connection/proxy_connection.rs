use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{BytesCodec, FramedRead, FramedWrite};
use tracing::{debug, info, trace, warn};

use crate::codec::{RequestDecoder, MAX_HEADER_BYTES};
use crate::connection::IdleTimeout;
use crate::origin::Connector;
use crate::protocol::{Message, OriginError, ParseError, ProxyError, ProxyRequest, BAD_REQUEST};
use crate::relay;

/// Default idle timeout of a connection
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(300);

/// Settings applied to every accepted connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub idle_timeout: Duration,
    pub max_header_bytes: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self { idle_timeout: DEFAULT_IDLE_TIMEOUT, max_header_bytes: MAX_HEADER_BYTES }
    }
}

/// Where a connection is in its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Start,
    Parsing,
    Resolving,
    Relaying,
    Done,
    Error,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Start => "start",
            ConnectionState::Parsing => "parsing",
            ConnectionState::Resolving => "resolving",
            ConnectionState::Relaying => "relaying",
            ConnectionState::Done => "done",
            ConnectionState::Error => "error",
        };
        f.write_str(name)
    }
}

/// One client connection, from its first byte to its close.
///
/// `ProxyConnection` reads a single request, connects to its origin through a
/// [`Connector`] and relays the exchange, either framed for plain HTTP or as an opaque
/// tunnel for CONNECT. There is no keep-alive: the connection is closed once the relay
/// ends, whatever the outcome.
///
/// # Type Parameters
///
/// * `R`: The async readable half of the client connection
/// * `W`: The async writable half of the client connection
pub struct ProxyConnection<R, W> {
    framed_read: FramedRead<R, RequestDecoder>,
    framed_write: FramedWrite<W, BytesCodec>,
    idle: IdleTimeout,
    state: ConnectionState,
}

impl<R, W> ProxyConnection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W, config: ConnectionConfig) -> Self {
        Self {
            framed_read: FramedRead::with_capacity(reader, RequestDecoder::with_max_header_bytes(config.max_header_bytes), 8 * 1024),
            framed_write: FramedWrite::new(writer, BytesCodec::new()),
            idle: IdleTimeout::new(config.idle_timeout),
            state: ConnectionState::Start,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Serves the connection and closes it.
    ///
    /// A client that closes without sending anything is not an error. Every other failure
    /// is returned after the connection was closed, a request that could not be parsed
    /// got a `400 BAD REQUEST` first.
    pub async fn process<C: Connector>(mut self, connector: &C) -> Result<(), ProxyError> {
        let result = self.do_process(connector).await;
        self.close().await;
        self.transition(ConnectionState::Done);
        result
    }

    async fn do_process<C: Connector>(&mut self, connector: &C) -> Result<(), ProxyError> {
        let Some(request) = self.read_request().await? else {
            return Ok(());
        };

        self.transition(ConnectionState::Resolving);
        self.idle.rearm();
        let connected = self
            .idle
            .guard("connecting to origin", connector.connect(request.target()))
            .await
            .map_err(OriginError::from)
            .and_then(|connected| connected);
        let origin = match connected {
            Ok(origin) => origin,
            Err(e) => {
                self.transition(ConnectionState::Error);
                return Err(e.into());
            }
        };
        debug!(target = %request.target(), "connected to origin");

        self.transition(ConnectionState::Relaying);
        if request.is_tunnel() {
            let pending = self.framed_read.read_buffer_mut().split().freeze();
            let summary = relay::tunnel(
                self.framed_read.get_mut(),
                self.framed_write.get_mut(),
                pending,
                origin,
                self.idle.duration(),
            )
            .await?;
            info!(
                end = ?summary.end,
                client_to_origin = summary.client_to_origin,
                origin_to_client = summary.origin_to_client,
                "tunnel closed"
            );
        } else {
            let summary = relay::http(&request, &mut self.framed_read, &mut self.framed_write, origin, &mut self.idle).await?;
            info!(
                status = summary.status.map(|status| status.as_u16()),
                request_body_bytes = summary.request_body_bytes,
                response_body_bytes = summary.response_body_bytes,
                "relayed request"
            );
        }

        Ok(())
    }

    /// Reads the request head, `None` when the client closed without sending a byte.
    async fn read_request(&mut self) -> Result<Option<ProxyRequest>, ParseError> {
        self.transition(ConnectionState::Parsing);
        self.idle.rearm();

        let error = match self.idle.guard("reading request head", self.framed_read.next()).await {
            Ok(Some(Ok(Message::Header(request)))) => {
                info!(request = %request, protocol = request.protocol(), "received request");
                return Ok(Some(request));
            }
            Ok(None) => {
                debug!("client closed before sending a request");
                return Ok(None);
            }
            Ok(Some(Ok(Message::Payload(_)))) => ParseError::malformed_request("payload received before request head"),
            Ok(Some(Err(e))) => e,
            Err(elapsed) => elapsed.into(),
        };

        self.transition(ConnectionState::Error);
        if error.is_bad_request() {
            warn!(cause = %error, "bad request");
            self.send_bad_request().await;
        }
        Err(error)
    }

    /// Best effort, the connection is closed right after anyway.
    async fn send_bad_request(&mut self) {
        self.idle.rearm();
        match self.idle.guard("writing bad request response", self.framed_write.send(Bytes::from_static(BAD_REQUEST))).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(cause = %e, "can't send bad request response"),
            Err(elapsed) => debug!(cause = %elapsed, "can't send bad request response"),
        }
    }

    /// Flushes and shuts down the client writer, errors are ignored and calling it again is
    /// harmless.
    async fn close(&mut self) {
        if let Err(e) = SinkExt::<Bytes>::flush(&mut self.framed_write).await {
            trace!(cause = %e, "flush on close");
        }
        if let Err(e) = self.framed_write.get_mut().shutdown().await {
            trace!(cause = %e, "shutdown on close");
        }
    }

    fn transition(&mut self, next: ConnectionState) {
        trace!(from = %self.state, to = %next, "connection state");
        self.state = next;
    }
}
