//! # Tag Game Server Library
//!
//! Authoritative server for a multiplayer game of tag. The server owns every
//! player's position and role, advances the world on a fixed tick, and streams
//! per-player snapshots back to the clients. Clients only send intent
//! (join, viewport size, directional input) and render what they receive.
//!
//! ## Simulation
//!
//! ### Viewport-relative geometry
//! Every client may run a different window size. Maps are authored in fractions
//! of the viewport and each player's position is stored in that player's own pixel
//! space, so the same map looks proportionally identical everywhere. Player-to-player
//! proximity is compared after normalizing both positions.
//!
//! ### Tick order
//! Each tick moves every unfrozen player from its latest input (tagger 3.75 px,
//! everyone else 3 px), clamps to the viewport, rejects moves into walls, applies
//! portals, and then runs tag detection over the new positions. A tagger who makes a
//! tag hands the role over and is frozen for five seconds.
//!
//! ### Map rotation
//! Every two minutes the server switches to a different map and respawns every
//! player at a wall-free point. Roles and freeze timers carry over.
//!
//! ## Module Organization
//!
//! - `game`: the registry, event entry point, tick and map rotation
//! - `collision`: wall overlap, normalized player proximity, portal teleports
//! - `spawn`: bounded random search for a wall-free spawn point
//! - `broadcast`: per-recipient snapshot packets
//! - `client_manager`: socket address to connection id bookkeeping
//! - `network`: UDP transport and the single-writer event loop
//!
//! Map geometry and the wire protocol live in the `shared` crate.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::Server;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = Server::new(
//!         "127.0.0.1:8080",
//!         Duration::from_micros(16_667), // 60Hz
//!         Duration::from_secs(120),      // map rotation
//!         32,
//!     )
//!     .await?;
//!
//!     server.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Determinism
//!
//! `GameState` takes its clock (`now_ms`) and randomness (`&mut impl Rng`) as
//! arguments, so a seeded `StdRng` and fixed timestamps replay a game exactly.

pub mod broadcast;
pub mod client_manager;
pub mod collision;
pub mod game;
pub mod network;
pub mod spawn;
pub mod utils;
