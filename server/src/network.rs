//! Server network layer handling UDP communications and game loop coordination

use crate::broadcast::{init_packet, snapshot_packets};
use crate::client_manager::{ClientManager, CLIENT_TIMEOUT};
use crate::game::{GameEvent, GameState};
use crate::utils::get_timestamp;
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{InputState, Packet};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};

/// Messages sent from network tasks to main server loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived { packet: Packet, addr: SocketAddr },
    ClientTimeout { client_id: u32 },
    Shutdown,
}

/// Messages sent from game loop to network tasks
#[derive(Debug)]
pub enum GameMessage {
    SendPacket { packet: Packet, addr: SocketAddr },
}

/// Main server coordinating networking and game simulation
///
/// The run loop owns the `GameState`; packets, timeouts, ticks and map rotations
/// are all handled one at a time inside a single `select!`, so every mutation lands
/// between two ticks.
pub struct Server {
    socket: Arc<UdpSocket>,
    clients: Arc<RwLock<ClientManager>>,
    game_state: GameState,
    rng: StdRng,
    tick_duration: Duration,
    rotation_interval: Duration,

    // Communication channels
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    game_tx: mpsc::UnboundedSender<GameMessage>,
    game_rx: mpsc::UnboundedReceiver<GameMessage>,
}

impl Server {
    pub async fn new(
        addr: &str,
        tick_duration: Duration,
        rotation_interval: Duration,
        max_clients: usize,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Server listening on {}", socket.local_addr()?);

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (game_tx, game_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            clients: Arc::new(RwLock::new(ClientManager::new(max_clients))),
            game_state: GameState::new(),
            rng: StdRng::from_entropy(),
            tick_duration,
            rotation_interval,
            server_tx,
            server_rx,
            game_tx,
            game_rx,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Handle for stopping `run` from outside, e.g. on Ctrl+C
    pub fn shutdown_sender(&self) -> mpsc::UnboundedSender<ServerMessage> {
        self.server_tx.clone()
    }

    /// Spawns task that continuously listens for incoming packets
    fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 2048];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                            if let Err(e) =
                                server_tx.send(ServerMessage::PacketReceived { packet, addr })
                            {
                                error!("Failed to send packet to main loop: {}", e);
                                break;
                            }
                        } else {
                            warn!("Failed to deserialize packet from {}", addr);
                        }
                    }
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns task that processes outgoing packet queue
    fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let mut game_rx = std::mem::replace(&mut self.game_rx, mpsc::unbounded_channel().1);

        tokio::spawn(async move {
            while let Some(message) = game_rx.recv().await {
                match message {
                    GameMessage::SendPacket { packet, addr } => {
                        if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                            error!("Failed to send packet to {}: {}", addr, e);
                        }
                    }
                }
            }
        });
    }

    /// Spawns task that monitors client timeouts
    fn spawn_timeout_checker(&self) {
        let clients = Arc::clone(&self.clients);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut interval = interval(Duration::from_secs(1));

            loop {
                interval.tick().await;

                let timed_out = {
                    let mut clients_guard = clients.write().await;
                    clients_guard.check_timeouts(CLIENT_TIMEOUT)
                };

                for client_id in timed_out {
                    if let Err(e) = server_tx.send(ServerMessage::ClientTimeout { client_id }) {
                        error!("Failed to send timeout message: {}", e);
                        break;
                    }
                }
            }
        });
    }

    async fn send_packet_impl(
        socket: &UdpSocket,
        packet: &Packet,
        addr: SocketAddr,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let data = serialize(packet)?;
        socket.send_to(&data, addr).await?;
        Ok(())
    }

    fn send_packet(&self, packet: Packet, addr: SocketAddr) {
        if let Err(e) = self.game_tx.send(GameMessage::SendPacket { packet, addr }) {
            error!("Failed to queue packet for sending: {}", e);
        }
    }

    /// Translates a datagram into a game event and applies it
    async fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        match packet {
            Packet::Join {
                name,
                screen_width,
                screen_height,
            } => {
                // A second join from the same address starts over as a new player
                let existing_client_id = {
                    let clients = self.clients.read().await;
                    clients.find_client_by_addr(addr)
                };

                if let Some(existing_id) = existing_client_id {
                    info!("Replacing existing client {} from {}", existing_id, addr);
                    self.clients.write().await.remove_client(&existing_id);
                    self.game_state
                        .apply_event(GameEvent::Disconnect { id: existing_id }, &mut self.rng);
                }

                let client_id = {
                    let mut clients = self.clients.write().await;
                    clients.add_client(addr)
                };

                match client_id {
                    Some(id) => {
                        self.game_state.apply_event(
                            GameEvent::Join {
                                id,
                                name,
                                screen_width,
                                screen_height,
                            },
                            &mut self.rng,
                        );
                        if let Some(init) = init_packet(&self.game_state, id) {
                            self.send_packet(init, addr);
                        }
                    }
                    None => {
                        warn!("Rejecting {} from {}: server full", name, addr);
                        let response = Packet::Disconnected {
                            reason: "Server full".to_string(),
                        };
                        self.send_packet(response, addr);
                    }
                }
            }

            Packet::ScreenSize { width, height } => {
                let client_id = self.clients.write().await.touch(addr);
                if let Some(id) = client_id {
                    self.game_state
                        .apply_event(GameEvent::ScreenSize { id, width, height }, &mut self.rng);
                }
            }

            Packet::Input {
                up,
                down,
                left,
                right,
            } => {
                let client_id = self.clients.write().await.touch(addr);
                if let Some(id) = client_id {
                    let input = InputState {
                        up,
                        down,
                        left,
                        right,
                    };
                    self.game_state
                        .apply_event(GameEvent::Input { id, input }, &mut self.rng);
                }
            }

            Packet::Disconnect => {
                let client_id = {
                    let clients = self.clients.read().await;
                    clients.find_client_by_addr(addr)
                };

                if let Some(id) = client_id {
                    self.clients.write().await.remove_client(&id);
                    self.game_state
                        .apply_event(GameEvent::Disconnect { id }, &mut self.rng);
                }
            }

            _ => {
                warn!("Unexpected packet type from client at {}", addr);
            }
        }
    }

    /// Sends every connected player its own snapshot
    async fn broadcast_game_state(&self) {
        let packets = snapshot_packets(&self.game_state);
        if packets.is_empty() {
            return;
        }

        let clients = self.clients.read().await;
        for (client_id, packet) in packets {
            if let Some(addr) = clients.get_client_addr(client_id) {
                self.send_packet(packet, addr);
            }
        }
    }

    /// Main server loop coordinating all operations
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_network_receiver();
        self.spawn_network_sender();
        self.spawn_timeout_checker();

        let mut tick_interval = interval(self.tick_duration);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut rotation_interval = interval_at(
            Instant::now() + self.rotation_interval,
            self.rotation_interval,
        );
        let mut last_tick = Instant::now();

        info!(
            "Server started on map '{}' ({:?} ticks, rotating every {:?})",
            self.game_state.current_map, self.tick_duration, self.rotation_interval
        );

        loop {
            tokio::select! {
                // Handle network events
                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::PacketReceived { packet, addr }) => {
                            self.handle_packet(packet, addr).await;
                        },
                        Some(ServerMessage::ClientTimeout { client_id }) => {
                            info!("Client {} timed out", client_id);
                            self.game_state
                                .apply_event(GameEvent::Disconnect { id: client_id }, &mut self.rng);
                        },
                        Some(ServerMessage::Shutdown) | None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                },

                // Handle server tick events
                _ = tick_interval.tick() => {
                    let now = Instant::now();
                    let dt = now.duration_since(last_tick).as_secs_f32();
                    last_tick = now;

                    let result = self.game_state.tick(get_timestamp());
                    self.broadcast_game_state().await;

                    for tag in &result.tags {
                        debug!("Tick {}: {} tagged {}", self.game_state.tick, tag.tagger, tag.tagged);
                    }
                    for id in &result.teleports {
                        debug!("Tick {}: player {} went through a portal", self.game_state.tick, id);
                    }

                    // Periodic performance monitoring
                    if self.game_state.tick % 60 == 0 && !self.game_state.is_empty() {
                        debug!(
                            "Tick {}: {} players, {:.1}Hz, map '{}'",
                            self.game_state.tick,
                            self.game_state.len(),
                            1.0 / dt.max(f32::EPSILON),
                            self.game_state.current_map
                        );
                    }
                },

                _ = rotation_interval.tick() => {
                    self.game_state.rotate_map(&mut self.rng);
                },
            }
        }

        Ok(())
    }
}
