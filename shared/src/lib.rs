use serde::{Deserialize, Serialize};

pub mod maps;

/// Half the side of a player's square bounding box, in viewport pixels.
pub const PLAYER_SIZE: f32 = 15.0;
/// Movement per tick for untagged players.
pub const PLAYER_SPEED: f32 = 3.0;
/// Movement per tick for the tagger.
pub const TAGGER_SPEED: f32 = 3.75;
/// How long a player stays frozen after passing the tag on.
pub const FREEZE_TIME_MS: u64 = 5000;
/// Interval between active map changes.
pub const MAP_ROTATION_MS: u64 = 120_000;
/// Inset from every viewport edge used when sampling spawn points.
pub const SPAWN_MARGIN: f32 = 100.0;
pub const SPAWN_ATTEMPTS: u32 = 100;
pub const DEFAULT_SCREEN_WIDTH: f32 = 1920.0;
pub const DEFAULT_SCREEN_HEIGHT: f32 = 1080.0;
/// Longest display name kept on join, in characters.
pub const MAX_NAME_LEN: usize = 32;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum Packet {
    Join {
        name: String,
        screen_width: Option<f32>,
        screen_height: Option<f32>,
    },
    ScreenSize {
        width: f32,
        height: f32,
    },
    Input {
        up: bool,
        down: bool,
        left: bool,
        right: bool,
    },
    Disconnect,

    Init {
        id: u32,
        players: Vec<Player>,
        portals: Vec<Portal>,
    },
    Players {
        tick: u32,
        map: String,
        players: Vec<Player>,
        portals: Vec<Portal>,
    },
    Disconnected {
        reason: String,
    },
}

/// Axis-aligned wall rectangle in a specific viewport's pixel space.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Wall {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Wall {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }
}

/// Circular portal scaled to a viewport. `target` indexes the same map's portal list.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Portal {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub target: usize,
}

/// Latest directional input received from a client. Replaced wholesale on every update.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Player {
    pub id: u32,
    pub name: String,
    /// Center position in this player's own viewport pixels.
    pub x: f32,
    pub y: f32,
    pub color: String,
    pub is_tagger: bool,
    pub frozen: bool,
    /// Absolute unix time in milliseconds; meaningful only while `frozen`.
    pub frozen_until: u64,
    pub input: InputState,
    pub screen_width: f32,
    pub screen_height: f32,
    pub current_map: String,
    /// Walls of `current_map` scaled to this player's viewport.
    pub walls: Vec<Wall>,
    /// Portal the player last arrived on; it stays inert until the player steps off it.
    #[serde(skip)]
    pub portal_lock: Option<usize>,
}

impl Player {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u32,
        name: String,
        x: f32,
        y: f32,
        color: String,
        screen_width: f32,
        screen_height: f32,
        current_map: &str,
    ) -> Self {
        Self {
            id,
            name,
            x,
            y,
            color,
            is_tagger: false,
            frozen: false,
            frozen_until: 0,
            input: InputState::default(),
            screen_width,
            screen_height,
            current_map: current_map.to_string(),
            walls: maps::walls_for(current_map, screen_width, screen_height),
            portal_lock: None,
        }
    }

    /// Position as a fraction of this player's own viewport.
    pub fn normalized_position(&self) -> (f32, f32) {
        (self.x / self.screen_width, self.y / self.screen_height)
    }

    pub fn speed(&self) -> f32 {
        if self.is_tagger {
            TAGGER_SPEED
        } else {
            PLAYER_SPEED
        }
    }

    /// Re-derives the wall cache for the player's current map and viewport.
    pub fn refresh_walls(&mut self) {
        self.walls = maps::walls_for(&self.current_map, self.screen_width, self.screen_height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn test_player() -> Player {
        Player::new(
            1,
            "alice".to_string(),
            960.0,
            270.0,
            "#ff0000".to_string(),
            1920.0,
            1080.0,
            maps::PLUS,
        )
    }

    #[test]
    fn test_player_creation() {
        let player = test_player();
        assert_eq!(player.id, 1);
        assert_eq!(player.name, "alice");
        assert!(!player.is_tagger);
        assert!(!player.frozen);
        assert_eq!(player.input, InputState::default());
        assert_eq!(player.current_map, maps::PLUS);
        assert_eq!(player.walls, maps::walls_for(maps::PLUS, 1920.0, 1080.0));
        assert!(player.portal_lock.is_none());
    }

    #[test]
    fn test_normalized_position() {
        let player = test_player();
        let (nx, ny) = player.normalized_position();
        assert_approx_eq!(nx, 0.5, 1e-6);
        assert_approx_eq!(ny, 0.25, 1e-6);
    }

    #[test]
    fn test_speed_depends_on_role() {
        let mut player = test_player();
        assert_eq!(player.speed(), PLAYER_SPEED);
        player.is_tagger = true;
        assert_eq!(player.speed(), TAGGER_SPEED);
        assert_approx_eq!(TAGGER_SPEED / PLAYER_SPEED, 1.25, 1e-6);
    }

    #[test]
    fn test_refresh_walls_follows_map_and_viewport() {
        let mut player = test_player();
        player.current_map = maps::CORNERS.to_string();
        player.screen_width = 1280.0;
        player.screen_height = 720.0;
        player.refresh_walls();
        assert_eq!(player.walls, maps::walls_for(maps::CORNERS, 1280.0, 720.0));
    }

    #[test]
    fn test_packet_serialization_join() {
        let packet = Packet::Join {
            name: "bob".to_string(),
            screen_width: Some(1280.0),
            screen_height: None,
        };
        let serialized = bincode::serialize(&packet).unwrap();
        let deserialized: Packet = bincode::deserialize(&serialized).unwrap();

        match deserialized {
            Packet::Join {
                name,
                screen_width,
                screen_height,
            } => {
                assert_eq!(name, "bob");
                assert_eq!(screen_width, Some(1280.0));
                assert_eq!(screen_height, None);
            }
            _ => panic!("Wrong packet type after deserialization"),
        }
    }

    #[test]
    fn test_packet_serialization_players() {
        let mut player = test_player();
        player.is_tagger = true;
        player.portal_lock = Some(2);

        let packet = Packet::Players {
            tick: 42,
            map: maps::PORTALS.to_string(),
            players: vec![player],
            portals: maps::portals_for(maps::PORTALS, 1920.0, 1080.0),
        };

        let serialized = bincode::serialize(&packet).unwrap();
        let deserialized: Packet = bincode::deserialize(&serialized).unwrap();

        match deserialized {
            Packet::Players {
                tick,
                map,
                players,
                portals,
            } => {
                assert_eq!(tick, 42);
                assert_eq!(map, maps::PORTALS);
                assert_eq!(players.len(), 1);
                assert!(players[0].is_tagger);
                assert_eq!(players[0].walls.len(), maps::walls_for(maps::PLUS, 1920.0, 1080.0).len());
                // Server-side bookkeeping never goes over the wire.
                assert!(players[0].portal_lock.is_none());
                assert_eq!(portals, maps::portals_for(maps::PORTALS, 1920.0, 1080.0));
            }
            _ => panic!("Wrong packet type after deserialization"),
        }
    }
}
