//! Encoder for the request the proxy forwards to an origin.
//!
//! The request line is rebuilt from the method, the origin path and the protocol token of
//! the client request. The header block is replayed byte-for-byte and closed with `\r\n`.
//! Body chunks are copied as they come, their framing was already enforced by the
//! [`RequestDecoder`](crate::codec::RequestDecoder).

use std::io;
use std::io::{ErrorKind, Write};

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::Encoder;
use tracing::error;

use crate::protocol::{Message, PayloadItem, ProxyRequest};

/// Initial buffer size reserved for the request head
const INIT_HEAD_SIZE: usize = 4 * 1024;

#[derive(Debug, Default)]
pub struct RequestEncoder {
    /// a head was written and its payload has not ended yet
    in_payload: bool,
}

impl RequestEncoder {
    pub fn new() -> Self {
        Default::default()
    }
}

impl<D: Buf> Encoder<Message<&ProxyRequest, D>> for RequestEncoder {
    type Error = io::Error;

    fn encode(&mut self, item: Message<&ProxyRequest, D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            Message::Header(request) => {
                if self.in_payload {
                    error!("expect payload item but receive request head");
                    return Err(io::Error::from(ErrorKind::InvalidInput));
                }

                let headers = request.headers();
                dst.reserve(INIT_HEAD_SIZE.max(headers.len() + request.uri().len() + 32));
                write!(FastWrite(dst), "{} {} {}\r\n", request.method(), request.target().path(), request.protocol())?;
                dst.put_slice(headers);
                dst.put_slice(b"\r\n");

                self.in_payload = true;
                Ok(())
            }

            Message::Payload(PayloadItem::Chunk(mut bytes)) => {
                if !self.in_payload {
                    error!("expect request head but receive payload item");
                    return Err(io::Error::from(ErrorKind::InvalidInput));
                }

                while bytes.has_remaining() {
                    let chunk = bytes.chunk();
                    let len = chunk.len();
                    dst.extend_from_slice(chunk);
                    bytes.advance(len);
                }
                Ok(())
            }

            Message::Payload(PayloadItem::Eof) => {
                self.in_payload = false;
                Ok(())
            }
        }
    }
}

/// Writes formatted text straight into the `BytesMut`, space is reserved beforehand.
struct FastWrite<'a>(&'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
