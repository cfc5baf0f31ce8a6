use clap::Parser;
use log::{error, info};
use server::network::{Server, ServerMessage};
use shared::MAP_ROTATION_MS;
use std::time::Duration;

/// Authoritative tag game server
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server IP address to bind to
    #[clap(short = 'H', long, default_value = "127.0.0.1")]
    host: String,
    /// Server port to listen on
    #[clap(short, long, default_value = "8080")]
    port: u16,
    /// Tick rate (updates per second)
    #[clap(short, long, default_value = "60")]
    tick_rate: u32,
    /// Seconds between map rotations
    #[clap(short, long, default_value_t = MAP_ROTATION_MS / 1000)]
    rotation_secs: u64,
    /// Maximum number of connected players
    #[clap(short, long, default_value = "32")]
    max_clients: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let tick_duration = Duration::from_secs_f64(1.0 / args.tick_rate.max(1) as f64);
    let rotation_interval = Duration::from_secs(args.rotation_secs.max(1));
    let address = format!("{}:{}", args.host, args.port);

    let mut server = Server::new(&address, tick_duration, rotation_interval, args.max_clients).await?;
    let shutdown = server.shutdown_sender();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down gracefully...");
            if let Err(e) = shutdown.send(ServerMessage::Shutdown) {
                error!("Failed to signal shutdown: {}", e);
            }
        }
    });

    server.run().await
}
