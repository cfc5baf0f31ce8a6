//! Headless bot that joins the server, wanders randomly, and logs what it sees.

use bincode::{deserialize, serialize};
use clap::Parser;
use log::{info, warn};
use rand::Rng;
use shared::Packet;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::{interval, timeout, Instant};

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server address
    #[clap(short, long, default_value = "127.0.0.1:8080")]
    server: SocketAddr,
    /// Display name
    #[clap(short, long, default_value = "bot")]
    name: String,
    /// Reported viewport width
    #[clap(long, default_value = "1920")]
    width: f32,
    /// Reported viewport height
    #[clap(long, default_value = "1080")]
    height: f32,
    /// How long to play before disconnecting
    #[clap(long, default_value = "30")]
    seconds: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    info!("Bot socket bound to {}", socket.local_addr()?);

    let join = Packet::Join {
        name: args.name.clone(),
        screen_width: Some(args.width),
        screen_height: Some(args.height),
    };
    socket.send_to(&serialize(&join)?, args.server).await?;

    // Snapshots can be large with many players
    let mut buf = vec![0u8; 65536];

    let (len, _) = timeout(Duration::from_secs(5), socket.recv_from(&mut buf)).await??;
    let my_id = match deserialize::<Packet>(&buf[..len])? {
        Packet::Init { id, players, portals } => {
            info!(
                "Joined as {} with {} players and {} portals visible",
                id,
                players.len(),
                portals.len()
            );
            id
        }
        Packet::Disconnected { reason } => {
            warn!("Server refused connection: {}", reason);
            return Ok(());
        }
        other => {
            warn!("Expected Init but got {:?}", other);
            return Ok(());
        }
    };

    let mut rng = rand::thread_rng();
    let mut input_timer = interval(Duration::from_millis(100));
    let deadline = Instant::now() + Duration::from_secs(args.seconds);
    let mut snapshots = 0u64;

    while Instant::now() < deadline {
        tokio::select! {
            _ = input_timer.tick() => {
                let input = Packet::Input {
                    up: rng.gen_bool(0.3),
                    down: rng.gen_bool(0.3),
                    left: rng.gen_bool(0.3),
                    right: rng.gen_bool(0.3),
                };
                socket.send_to(&serialize(&input)?, args.server).await?;
            }
            received = socket.recv_from(&mut buf) => {
                let (len, _) = received?;
                match deserialize::<Packet>(&buf[..len]) {
                    Ok(Packet::Players { tick, map, players, .. }) => {
                        snapshots += 1;
                        if snapshots % 60 == 0 {
                            if let Some(me) = players.iter().find(|p| p.id == my_id) {
                                info!(
                                    "Tick {} on '{}': {} players, me at ({:.0}, {:.0}){}{}",
                                    tick,
                                    map,
                                    players.len(),
                                    me.x,
                                    me.y,
                                    if me.is_tagger { " [tagger]" } else { "" },
                                    if me.frozen { " [frozen]" } else { "" }
                                );
                            }
                        }
                    }
                    Ok(other) => warn!("Unexpected packet: {:?}", other),
                    Err(e) => warn!("Failed to deserialize packet: {}", e),
                }
            }
        }
    }

    socket.send_to(&serialize(&Packet::Disconnect)?, args.server).await?;
    info!("Bot finished after {} snapshots", snapshots);
    Ok(())
}
