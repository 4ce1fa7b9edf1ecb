use bytes::{Bytes, BytesMut};
use criterion::{criterion_group, criterion_main, Criterion};
use micro_proxy::{
    codec::{RequestDecoder, RequestEncoder, ResponseDecoder},
    connection::{ConnectionConfig, ProxyConnection},
    origin::make_connector,
    protocol::{Message, OriginError, Target},
};
use std::{
    hint::black_box,
    io,
    pin::Pin,
    task::{Context, Poll},
};
use tokio::io::{duplex, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, DuplexStream, ReadBuf};
use tokio::runtime::Runtime;
use tokio_util::codec::{Decoder, Encoder};

const GET_REQUEST: &[u8] = b"GET http://localhost:8080/index.html HTTP/1.1\r\nHost: localhost\r\nAccept: */*\r\n\r\n";
const ORIGIN_RESPONSE: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 12\r\n\r\nHello World!";

// Mock IO for the client side
#[derive(Clone)]
struct MockIO {
    read_data: Vec<u8>,
    write_data: Vec<u8>,
    read_pos: usize,
}

impl MockIO {
    fn new(read_data: Vec<u8>) -> Self {
        Self { read_data, write_data: Vec::new(), read_pos: 0 }
    }
}

impl AsyncRead for MockIO {
    fn poll_read(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        let remaining = &self.read_data[self.read_pos..];
        let amt = std::cmp::min(remaining.len(), buf.remaining());
        buf.put_slice(&remaining[..amt]);
        self.read_pos += amt;
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockIO {
    fn poll_write(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<Result<usize, io::Error>> {
        self.write_data.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        Poll::Ready(Ok(()))
    }
}

// An origin answering every request with the same response
async fn canned_origin(target: Target) -> Result<DuplexStream, OriginError> {
    let (near, mut far) = duplex(4096);
    tokio::spawn(async move {
        let _ = far.write_all(ORIGIN_RESPONSE).await;
        let _ = far.shutdown().await;
        let mut sink = Vec::new();
        let _ = far.read_to_end(&mut sink).await;
    });
    black_box(target);
    Ok(near)
}

fn bench_request_decoder(c: &mut Criterion) {
    c.bench_function("decode_proxy_request", |b| {
        b.iter(|| {
            let mut decoder = RequestDecoder::new();
            let mut bytes = BytesMut::from(GET_REQUEST);
            black_box(decoder.decode(&mut bytes).unwrap());
        });
    });
}

fn bench_response_decoder(c: &mut Criterion) {
    c.bench_function("decode_origin_response", |b| {
        b.iter(|| {
            let mut decoder = ResponseDecoder::new(false);
            let mut bytes = BytesMut::from(ORIGIN_RESPONSE);
            while let Some(item) = decoder.decode(&mut bytes).unwrap() {
                let done = matches!(&item, Message::Payload(payload) if payload.is_eof());
                black_box(item);
                if done {
                    break;
                }
            }
        });
    });
}

fn bench_request_encoder(c: &mut Criterion) {
    let request = match RequestDecoder::new().decode(&mut BytesMut::from(GET_REQUEST)).unwrap() {
        Some(Message::Header(request)) => request,
        _ => unreachable!("the request head is complete"),
    };

    c.bench_function("encode_origin_request", |b| {
        b.iter(|| {
            let mut encoder = RequestEncoder::new();
            let mut bytes = BytesMut::new();
            black_box(encoder.encode(Message::<_, Bytes>::Header(&request), &mut bytes).unwrap());
        });
    });
}

fn bench_proxy_connection(c: &mut Criterion) {
    let runtime = Runtime::new().unwrap();
    let connector = make_connector(canned_origin);

    c.bench_function("process_proxy_request", |b| {
        b.to_async(&runtime).iter(|| async {
            let mock_io = MockIO::new(GET_REQUEST.to_vec());
            let (reader, writer) = (mock_io.clone(), mock_io);
            let connection = ProxyConnection::new(reader, writer, ConnectionConfig::default());
            black_box(connection.process(&connector).await.unwrap());
        });
    });
}

fn bench_bad_request(c: &mut Criterion) {
    let runtime = Runtime::new().unwrap();
    let connector = make_connector(canned_origin);

    c.bench_function("reject_malformed_request", |b| {
        b.to_async(&runtime).iter(|| async {
            let mock_io = MockIO::new(b"GET /\r\n\r\n".to_vec());
            let (reader, writer) = (mock_io.clone(), mock_io);
            let connection = ProxyConnection::new(reader, writer, ConnectionConfig::default());
            black_box(connection.process(&connector).await.is_err());
        });
    });
}

criterion_group!(
    benches,
    bench_request_decoder,
    bench_response_decoder,
    bench_request_encoder,
    bench_proxy_connection,
    bench_bad_request
);
criterion_main!(benches);
