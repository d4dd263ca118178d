use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use clap::Parser;
use tokio::sync::RwLock;
use tracing_subscriber::EnvFilter;

use spoold::config::{parse_printers, ServerConfig};
use spoold::scheduler::Scheduler;
use spoold::server::{run_server, AppState};
use spoold::shutdown::shutdown_token;

#[derive(Parser, Debug)]
#[command(name = "spoold")]
#[command(version)]
#[command(about = "A single-slot print queue scheduling daemon")]
struct Args {
    /// Address to bind the HTTP server on
    #[arg(long, default_value = "127.0.0.1")]
    bind: IpAddr,

    /// Port to listen on
    #[arg(long, default_value = "8080")]
    port: u16,

    /// Printer fleet (comma-separated, format: "id:name")
    /// Example: "1:Office Laser,2:Lab SLA"
    /// When empty, a default fleet of four printers is used.
    #[arg(long, default_value = "")]
    printers: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let listen_addr = SocketAddr::new(args.bind, args.port);
    let printers = {
        let parsed = parse_printers(&args.printers);
        if parsed.is_empty() {
            ServerConfig::default().printers
        } else {
            parsed
        }
    };

    let config = ServerConfig {
        listen_addr,
        printers,
    };

    tracing::info!(
        listen_addr = %config.listen_addr,
        printers = ?config.printers.iter().map(|p| format!("{}:{}", p.id, p.name)).collect::<Vec<_>>(),
        "Starting spoold"
    );

    let state = AppState {
        scheduler: Arc::new(RwLock::new(Scheduler::new(&config.printers))),
    };

    run_server(config.listen_addr, state, shutdown_token()).await;

    Ok(())
}
