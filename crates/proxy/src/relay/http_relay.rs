//! Framed relay for plain HTTP requests.

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use http::StatusCode;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{BytesCodec, FramedRead, FramedWrite};
use tracing::{debug, trace};

use crate::codec::{RequestDecoder, RequestEncoder, ResponseDecoder};
use crate::connection::IdleTimeout;
use crate::protocol::{Message, PayloadItem, ProxyRequest, ResponseHeadLine, TransferError, CONNECTION_CLOSE};

/// The idle deadline is re-armed each time this many response body bytes went through
pub const REARM_EVERY_BODY_BYTES: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelaySummary {
    /// status of the origin response, when its status line could be parsed
    pub status: Option<StatusCode>,
    pub request_body_bytes: u64,
    pub response_body_bytes: u64,
}

/// Forwards `request` to the origin and streams the response back to the client.
///
/// The request head is rebuilt with the origin path, its body is copied from
/// `client_read` as framed by the request. The response head is relayed line by line as
/// it arrives with `Connection: close` added after the last header, then the body follows.
pub async fn http<R, W, O>(
    request: &ProxyRequest,
    client_read: &mut FramedRead<R, RequestDecoder>,
    client_write: &mut FramedWrite<W, BytesCodec>,
    origin: O,
    idle: &mut IdleTimeout,
) -> Result<RelaySummary, TransferError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    O: AsyncRead + AsyncWrite + Unpin,
{
    let (origin_read, origin_write) = tokio::io::split(origin);
    let mut upstream = FramedWrite::new(origin_write, RequestEncoder::new());
    let mut downstream = FramedRead::new(origin_read, ResponseDecoder::for_request(request));

    idle.rearm();
    let head = Message::<_, Bytes>::Header(request);
    if request.payload_size().is_empty() {
        idle.guard("sending request head", upstream.send(head)).await?.map_err(TransferError::origin)?;
    } else {
        // the body follows right away, flush once it is done
        idle.guard("sending request head", upstream.feed(head)).await?.map_err(TransferError::origin)?;
    }

    let request_body_bytes = if request.payload_size().is_empty() { 0 } else { send_request_body(client_read, &mut upstream, idle).await? };

    idle.rearm();
    let (status, payload_size) = loop {
        match idle.guard("reading response head", downstream.next()).await? {
            Some(Ok(Message::Header(ResponseHeadLine::Line(line)))) => {
                write_client(client_write, idle, "writing response head", line.into_raw()).await?;
                idle.rearm();
            }
            Some(Ok(Message::Header(ResponseHeadLine::End { blank, status, payload_size }))) => {
                idle.guard("writing response head", client_write.feed(Bytes::from_static(CONNECTION_CLOSE)))
                    .await?
                    .map_err(TransferError::client)?;
                write_client(client_write, idle, "writing response head", blank.into_raw()).await?;
                break (status, payload_size);
            }
            Some(Ok(Message::Payload(_))) | None => return Err(TransferError::IncompleteResponseHead),
            Some(Err(e)) => return Err(TransferError::origin(e)),
        }
    };
    debug!(?status, ?payload_size, "relayed response head");

    let mut response_body_bytes = 0u64;
    if !payload_size.is_empty() {
        idle.rearm();
        let mut since_rearm = 0u64;
        loop {
            match idle.guard("reading response body", downstream.next()).await? {
                Some(Ok(Message::Payload(PayloadItem::Chunk(bytes)))) => {
                    let len = bytes.len() as u64;
                    write_client(client_write, idle, "writing response body", bytes).await?;
                    response_body_bytes += len;
                    since_rearm += len;
                    if since_rearm >= REARM_EVERY_BODY_BYTES {
                        idle.rearm();
                        since_rearm = 0;
                    }
                }
                Some(Ok(Message::Payload(PayloadItem::Eof) | Message::Header(_))) | None => break,
                Some(Err(e)) => return Err(TransferError::origin(e)),
            }
        }
    }

    Ok(RelaySummary { status, request_body_bytes, response_body_bytes })
}

/// Copies the request body from the client to the origin.
///
/// A client closing before the declared length simply ends the body.
async fn send_request_body<R, OW>(
    client_read: &mut FramedRead<R, RequestDecoder>,
    upstream: &mut FramedWrite<OW, RequestEncoder>,
    idle: &mut IdleTimeout,
) -> Result<u64, TransferError>
where
    R: AsyncRead + Unpin,
    OW: AsyncWrite + Unpin,
{
    idle.rearm();
    let mut sent = 0u64;
    loop {
        match idle.guard("reading request body", client_read.next()).await? {
            Some(Ok(Message::Payload(PayloadItem::Chunk(bytes)))) => {
                sent += bytes.len() as u64;
                idle.guard("sending request body", upstream.feed(Message::<&ProxyRequest, _>::Payload(PayloadItem::Chunk(bytes))))
                    .await?
                    .map_err(TransferError::origin)?;
            }
            Some(Ok(Message::Payload(PayloadItem::Eof) | Message::Header(_))) | None => break,
            Some(Err(e)) => return Err(TransferError::client(e)),
        }
    }

    idle.guard("sending request body", SinkExt::<Message<&ProxyRequest, Bytes>>::flush(upstream))
        .await?
        .map_err(TransferError::origin)?;
    trace!(sent, "sent request body");
    Ok(sent)
}

async fn write_client<W: AsyncWrite + Unpin>(
    client_write: &mut FramedWrite<W, BytesCodec>,
    idle: &IdleTimeout,
    stage: &'static str,
    bytes: Bytes,
) -> Result<(), TransferError> {
    idle.guard(stage, client_write.send(bytes)).await?.map_err(TransferError::client)
}
