use std::net::{IpAddr, Ipv4Addr};
use std::process;
use std::time::Duration;

use clap::Parser;
use micro_proxy::codec::MAX_HEADER_BYTES;
use micro_proxy::origin::AddressFamily;
use micro_proxy::server::Server;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "micro-proxy", version)]
#[command(about = "A small forward HTTP/HTTPS proxy", long_about = None)]
struct Cli {
    /// Port to listen on, 0 picks any free port
    #[arg(default_value_t = 0)]
    port: u16,

    /// Local address to listen on
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    bind: IpAddr,

    /// Seconds a connection may sit idle before it is closed
    #[arg(long, default_value_t = 300)]
    idle_timeout: u64,

    /// Upper bound for a request line plus its headers
    #[arg(long, default_value_t = MAX_HEADER_BYTES)]
    max_header_bytes: usize,

    /// Dial origins over IPv4 first, then IPv6
    #[arg(long)]
    dual_stack: bool,
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let cli = Cli::parse();
    let address_family = if cli.dual_stack { AddressFamily::Ipv4First } else { AddressFamily::Ipv4Only };

    let server = match Server::builder()
        .ip(cli.bind)
        .port(cli.port)
        .idle_timeout(Duration::from_secs(cli.idle_timeout))
        .max_header_bytes(cli.max_header_bytes)
        .address_family(address_family)
        .bind()
        .await
    {
        Ok(server) => server,
        Err(e) => {
            error!(cause = %e, "bind server error");
            process::exit(1);
        }
    };

    let port = server.local_addr().port();
    println!("micro-proxy running on port {port}");
    info!(port, ?address_family, "micro-proxy running");

    server.run().await;
}
