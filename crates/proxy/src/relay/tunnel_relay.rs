//! Opaque relay for CONNECT requests.

use std::io;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::select;
use tokio::time::{sleep, timeout};
use tracing::{debug, trace};

use crate::protocol::{TransferError, CONNECTION_ESTABLISHED};

/// Read buffer size for each direction of a tunnel
pub const TUNNEL_BUFFER_SIZE: usize = 10_000;

/// Why a tunnel stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TunnelEnd {
    ClientClosed,
    OriginClosed,
    /// nothing moved for a whole idle period, or a peer stopped taking bytes
    IdleTimeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TunnelSummary {
    pub end: TunnelEnd,
    pub client_to_origin: u64,
    pub origin_to_client: u64,
}

/// Acknowledges the CONNECT request and pumps bytes both ways.
///
/// `pending` holds client bytes that were read together with the CONNECT head, they reach
/// the origin before anything else. The tunnel ends when either side closes or when a read
/// or write fails. It also ends when `idle` passes without traffic in either direction, or
/// while a write waits on a peer that stopped reading. An idle end is not an error.
pub async fn tunnel<CR, CW, O>(
    client_reader: &mut CR,
    client_writer: &mut CW,
    pending: Bytes,
    origin: O,
    idle: Duration,
) -> Result<TunnelSummary, TransferError>
where
    CR: AsyncRead + Unpin,
    CW: AsyncWrite + Unpin,
    O: AsyncRead + AsyncWrite + Unpin,
{
    let (mut origin_reader, mut origin_writer) = tokio::io::split(origin);

    let mut client_to_origin = 0u64;
    let mut origin_to_client = 0u64;
    let mut client_buf = vec![0u8; TUNNEL_BUFFER_SIZE];
    let mut origin_buf = vec![0u8; TUNNEL_BUFFER_SIZE];

    let end = 'relay: {
        if !write_within(client_writer, CONNECTION_ESTABLISHED, idle).await.map_err(TransferError::client)? {
            break 'relay TunnelEnd::IdleTimeout;
        }

        if !pending.is_empty() {
            trace!(size = pending.len(), "forward buffered client bytes");
            if !write_within(&mut origin_writer, &pending, idle).await.map_err(TransferError::origin)? {
                break 'relay TunnelEnd::IdleTimeout;
            }
            client_to_origin += pending.len() as u64;
        }

        loop {
            select! {
                read = client_reader.read(&mut client_buf) => {
                    let n = read.map_err(TransferError::client)?;
                    if n == 0 {
                        break TunnelEnd::ClientClosed;
                    }
                    if !write_within(&mut origin_writer, &client_buf[..n], idle).await.map_err(TransferError::origin)? {
                        break TunnelEnd::IdleTimeout;
                    }
                    client_to_origin += n as u64;
                }

                read = origin_reader.read(&mut origin_buf) => {
                    let n = read.map_err(TransferError::origin)?;
                    if n == 0 {
                        break TunnelEnd::OriginClosed;
                    }
                    if !write_within(client_writer, &origin_buf[..n], idle).await.map_err(TransferError::client)? {
                        break TunnelEnd::IdleTimeout;
                    }
                    origin_to_client += n as u64;
                }

                () = sleep(idle) => {
                    break TunnelEnd::IdleTimeout;
                }
            }
        }
    };

    match timeout(idle, origin_writer.shutdown()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => trace!(cause = %e, "shutdown origin side of tunnel"),
        Err(_elapsed) => trace!("shutdown origin side of tunnel timed out"),
    }

    debug!(?end, client_to_origin, origin_to_client, "tunnel finished");
    Ok(TunnelSummary { end, client_to_origin, origin_to_client })
}

/// Writes and flushes `bytes`, `Ok(false)` when the peer did not take all of it within `idle`.
async fn write_within<W: AsyncWrite + Unpin>(writer: &mut W, bytes: &[u8], idle: Duration) -> io::Result<bool> {
    let write = async {
        writer.write_all(bytes).await?;
        writer.flush().await
    };

    match timeout(idle, write).await {
        Ok(written) => written.map(|()| true),
        Err(_elapsed) => {
            debug!(size = bytes.len(), idle_timeout = ?idle, "peer stopped reading");
            Ok(false)
        }
    }
}
