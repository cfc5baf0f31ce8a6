//! Authoritative game state: player registry, per-tick simulation, and map rotation.
//!
//! All mutation goes through `&mut GameState`, so whoever owns the state (the network
//! loop) is the single writer. Joins, inputs and disconnects are applied between ticks
//! and never observe a half-finished update.

use crate::collision::{check_portal, players_touching, wall_collision};
use crate::spawn::find_safe_spawn;
use log::{debug, info};
use rand::seq::SliceRandom;
use rand::Rng;
use shared::maps;
use shared::{
    InputState, Player, DEFAULT_SCREEN_HEIGHT, DEFAULT_SCREEN_WIDTH, FREEZE_TIME_MS, MAX_NAME_LEN,
    PLAYER_SIZE,
};
use std::collections::BTreeMap;

/// Transport-independent events that mutate the registry.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Join {
        id: u32,
        name: String,
        screen_width: Option<f32>,
        screen_height: Option<f32>,
    },
    ScreenSize {
        id: u32,
        width: f32,
        height: f32,
    },
    Input {
        id: u32,
        input: InputState,
    },
    Disconnect {
        id: u32,
    },
}

/// A role swap produced by tag detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag {
    pub tagger: u32,
    pub tagged: u32,
}

/// What happened during one call to `GameState::tick`.
#[derive(Debug, Default)]
pub struct TickResult {
    pub tags: Vec<Tag>,
    pub teleports: Vec<u32>,
}

#[derive(Debug, Clone)]
pub struct GameState {
    pub tick: u32,
    /// Keyed by connection id; iteration order is the registry order used for tagging.
    pub players: BTreeMap<u32, Player>,
    pub current_map: String,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    pub fn new() -> Self {
        Self::with_map(maps::default_map())
    }

    pub fn with_map(map_name: &str) -> Self {
        Self {
            tick: 0,
            players: BTreeMap::new(),
            current_map: map_name.to_string(),
        }
    }

    /// Routes a transport event to the matching registry operation.
    ///
    /// Returns false if the event referenced a player that is not registered.
    pub fn apply_event<R: Rng + ?Sized>(&mut self, event: GameEvent, rng: &mut R) -> bool {
        match event {
            GameEvent::Join {
                id,
                name,
                screen_width,
                screen_height,
            } => {
                self.join(id, name, screen_width, screen_height, rng);
                true
            }
            GameEvent::ScreenSize { id, width, height } => {
                self.update_viewport(id, width, height, rng).is_some()
            }
            GameEvent::Input { id, input } => self.set_input(id, input),
            GameEvent::Disconnect { id } => self.leave(id, rng).is_some(),
        }
    }

    /// Registers a player on the active map.
    ///
    /// The joiner becomes tagger only if the registry was empty. Missing dimensions
    /// default to 1920x1080. Names are cut to `MAX_NAME_LEN` characters. Re-joining
    /// with a live id replaces the old player.
    pub fn join<R: Rng + ?Sized>(
        &mut self,
        id: u32,
        name: String,
        screen_width: Option<f32>,
        screen_height: Option<f32>,
        rng: &mut R,
    ) -> &Player {
        if self.players.contains_key(&id) {
            self.leave(id, rng);
        }

        let name = truncate_name(name);
        let width = viewport_dimension(screen_width, DEFAULT_SCREEN_WIDTH);
        let height = viewport_dimension(screen_height, DEFAULT_SCREEN_HEIGHT);
        let is_first_player = self.players.is_empty();

        let (x, y) = find_safe_spawn(&self.current_map, width, height, rng);
        let color = random_color(rng);

        let mut player = Player::new(id, name, x, y, color, width, height, &self.current_map);
        player.is_tagger = is_first_player;

        info!(
            "Player {} ({}) joined at ({:.1}, {:.1}) on {}x{}{}",
            id,
            player.name,
            x,
            y,
            width,
            height,
            if is_first_player { " as tagger" } else { "" }
        );

        self.players.insert(id, player);
        &self.players[&id]
    }

    /// Stores a new viewport for `id`, respawning it if its position now hits a wall.
    ///
    /// Returns `None` for unknown players, otherwise whether a respawn happened.
    pub fn update_viewport<R: Rng + ?Sized>(
        &mut self,
        id: u32,
        width: f32,
        height: f32,
        rng: &mut R,
    ) -> Option<bool> {
        let player = self.players.get_mut(&id)?;
        player.screen_width = viewport_dimension(Some(width), DEFAULT_SCREEN_WIDTH);
        player.screen_height = viewport_dimension(Some(height), DEFAULT_SCREEN_HEIGHT);

        let respawn = wall_collision(
            player.x,
            player.y,
            &player.current_map,
            player.screen_width,
            player.screen_height,
        );
        if respawn {
            let (x, y) = find_safe_spawn(
                &player.current_map,
                player.screen_width,
                player.screen_height,
                rng,
            );
            debug!(
                "Player {} respawned at ({:.1}, {:.1}) after resize to {}x{}",
                id, x, y, player.screen_width, player.screen_height
            );
            player.x = x;
            player.y = y;
            player.portal_lock = None;
        }
        player.refresh_walls();

        Some(respawn)
    }

    /// Replaces the buffered input for `id`. Latest input wins.
    pub fn set_input(&mut self, id: u32, input: InputState) -> bool {
        match self.players.get_mut(&id) {
            Some(player) => {
                player.input = input;
                true
            }
            None => false,
        }
    }

    /// Removes `id`. If it held the tag, a random remaining player inherits it unfrozen.
    pub fn leave<R: Rng + ?Sized>(&mut self, id: u32, rng: &mut R) -> Option<Player> {
        let removed = self.players.remove(&id)?;
        info!("Player {} ({}) left", id, removed.name);

        if removed.is_tagger {
            let remaining: Vec<u32> = self.players.keys().copied().collect();
            if let Some(&next) = remaining.choose(rng) {
                if let Some(player) = self.players.get_mut(&next) {
                    player.is_tagger = true;
                    player.frozen = false;
                    info!("Player {} ({}) is the new tagger", next, player.name);
                }
            } else {
                debug!("Tagger left an empty game");
            }
        }

        Some(removed)
    }

    /// Advances the simulation by one tick at wall-clock time `now_ms`.
    ///
    /// Every player moves first, then tag detection runs over the updated positions.
    pub fn tick(&mut self, now_ms: u64) -> TickResult {
        self.tick = self.tick.wrapping_add(1);
        let mut result = TickResult::default();

        for (id, player) in self.players.iter_mut() {
            if player.frozen && now_ms >= player.frozen_until {
                player.frozen = false;
            }
            if player.frozen {
                continue;
            }

            let (x, y) = next_position(player);
            if !wall_collision(
                x,
                y,
                &player.current_map,
                player.screen_width,
                player.screen_height,
            ) {
                player.x = x;
                player.y = y;
            }

            if check_portal(player) {
                result.teleports.push(*id);
            }

            if player.current_map != self.current_map {
                player.current_map = self.current_map.clone();
            }
            player.refresh_walls();
        }

        result.tags = self.detect_tags(now_ms);
        result
    }

    /// Each unfrozen tagger, in registry order, tags the first touching untagged and
    /// unfrozen player. A tagger tags at most once per tick. A player who receives the
    /// tag earlier in the pass may tag again when their turn comes.
    fn detect_tags(&mut self, now_ms: u64) -> Vec<Tag> {
        let ids: Vec<u32> = self.players.keys().copied().collect();
        let mut tags = Vec::new();

        for &tagger_id in &ids {
            let Some(tagger) = self.players.get(&tagger_id) else {
                continue;
            };
            if !tagger.is_tagger || tagger.frozen {
                continue;
            }

            let victim = ids.iter().copied().find(|&other_id| {
                other_id != tagger_id
                    && self.players.get(&other_id).is_some_and(|other| {
                        !other.is_tagger && !other.frozen && players_touching(tagger, other)
                    })
            });

            let Some(victim_id) = victim else {
                continue;
            };

            if let Some(player) = self.players.get_mut(&tagger_id) {
                player.is_tagger = false;
                player.frozen = true;
                player.frozen_until = now_ms + FREEZE_TIME_MS;
            }
            if let Some(player) = self.players.get_mut(&victim_id) {
                player.is_tagger = true;
                player.frozen = false;
            }

            info!("Player {} tagged player {}", tagger_id, victim_id);
            tags.push(Tag {
                tagger: tagger_id,
                tagged: victim_id,
            });
        }

        tags
    }

    /// Switches to a different map and respawns every player on it.
    ///
    /// Roles and freeze timers survive; only position, map and walls change. With a
    /// single-map catalog the map stays the same but players are still respawned.
    pub fn rotate_map<R: Rng + ?Sized>(&mut self, rng: &mut R) -> &str {
        let candidates: Vec<&str> = maps::map_names()
            .filter(|name| *name != self.current_map)
            .collect();
        if let Some(next) = candidates.choose(rng) {
            self.current_map = next.to_string();
        }

        for player in self.players.values_mut() {
            player.current_map = self.current_map.clone();
            let (x, y) = find_safe_spawn(
                &self.current_map,
                player.screen_width,
                player.screen_height,
                rng,
            );
            player.x = x;
            player.y = y;
            player.portal_lock = None;
            player.refresh_walls();
        }

        info!(
            "Map rotated to '{}' ({} players respawned)",
            self.current_map,
            self.players.len()
        );
        &self.current_map
    }

    pub fn tagger_ids(&self) -> Vec<u32> {
        self.players
            .values()
            .filter(|player| player.is_tagger)
            .map(|player| player.id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

/// Candidate position from the player's input, clamped to its viewport.
///
/// Diagonal input applies both axis deltas at full speed.
fn next_position(player: &Player) -> (f32, f32) {
    let speed = player.speed();
    let mut x = player.x;
    let mut y = player.y;

    if player.input.up {
        y -= speed;
    }
    if player.input.down {
        y += speed;
    }
    if player.input.left {
        x -= speed;
    }
    if player.input.right {
        x += speed;
    }

    let x = x.min(player.screen_width - PLAYER_SIZE).max(PLAYER_SIZE);
    let y = y.min(player.screen_height - PLAYER_SIZE).max(PLAYER_SIZE);
    (x, y)
}

fn viewport_dimension(value: Option<f32>, default: f32) -> f32 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => default,
    }
}

fn truncate_name(name: String) -> String {
    match name.char_indices().nth(MAX_NAME_LEN) {
        Some((end, _)) => name[..end].to_string(),
        None => name,
    }
}

fn random_color<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("#{:06x}", rng.gen_range(0..0x0100_0000u32))
}
