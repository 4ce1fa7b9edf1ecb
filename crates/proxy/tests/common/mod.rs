//! Loopback origins and a proxy instance for end-to-end tests.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use micro_proxy::server::Server;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Starts a proxy on a free loopback port.
pub async fn start_proxy(idle_timeout: Duration) -> SocketAddr {
    let server = Server::builder().ip(Ipv4Addr::LOCALHOST.into()).idle_timeout(idle_timeout).bind().await.unwrap();
    let addr = server.local_addr();
    tokio::spawn(server.run());
    addr
}

/// Starts an origin serving exactly one connection.
///
/// It reads the request head and `body_len` more bytes, answers with `response`, closes
/// its write side and then keeps reading until the proxy hangs up. Everything it received
/// is returned by the task.
pub async fn one_shot_origin(body_len: usize, response: &'static [u8]) -> (u16, JoinHandle<Vec<u8>>) {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let task = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut received = read_head(&mut socket).await;

        let head_len = received.len();
        while received.len() < head_len + body_len {
            let mut buf = [0u8; 1024];
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            received.extend_from_slice(&buf[..n]);
        }

        let _ = socket.write_all(response).await;
        let _ = socket.shutdown().await;

        let mut rest = Vec::new();
        let _ = socket.read_to_end(&mut rest).await;
        received.extend_from_slice(&rest);
        received
    });

    (port, task)
}

/// Starts an origin echoing every byte back, one connection at a time.
pub async fn echo_origin() -> u16 {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let (mut reader, mut writer) = socket.split();
                let _ = tokio::io::copy(&mut reader, &mut writer).await;
            });
        }
    });

    port
}

/// A port nothing listens on.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    listener.local_addr().unwrap().port()
}

/// Sends `request` through the proxy and returns everything it answers until it closes.
pub async fn exchange(proxy: SocketAddr, request: &[u8]) -> Vec<u8> {
    let mut client = TcpStream::connect(proxy).await.unwrap();
    client.write_all(request).await.unwrap();

    let mut response = Vec::new();
    tokio::time::timeout(Duration::from_secs(10), client.read_to_end(&mut response))
        .await
        .expect("proxy closes the connection")
        .unwrap();
    response
}

async fn read_head(socket: &mut TcpStream) -> Vec<u8> {
    let mut received = Vec::new();
    let mut byte = [0u8; 1];
    while !ends_with_blank_line(&received) {
        if socket.read(&mut byte).await.unwrap() == 0 {
            break;
        }
        received.push(byte[0]);
    }
    received
}

/// A head ends with an empty line, whichever terminators the lines around it use.
fn ends_with_blank_line(received: &[u8]) -> bool {
    received.ends_with(b"\n\r\n") || received.ends_with(b"\n\n")
}
