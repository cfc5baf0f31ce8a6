//! Per-recipient state snapshots.
//!
//! Portal geometry depends on the viewport, so every connection gets its own packet
//! even though the player list is the same for everyone.

use crate::game::GameState;
use shared::maps::portals_for;
use shared::{Packet, Player, Portal};

/// Full registry in registry order.
pub fn player_list(state: &GameState) -> Vec<Player> {
    state.players.values().cloned().collect()
}

/// Portals of the player's map scaled to the player's own viewport.
pub fn portals_for_player(player: &Player) -> Vec<Portal> {
    portals_for(
        &player.current_map,
        player.screen_width,
        player.screen_height,
    )
}

/// Welcome packet for a freshly joined player, or `None` if `id` is not registered.
pub fn init_packet(state: &GameState, id: u32) -> Option<Packet> {
    let player = state.players.get(&id)?;
    Some(Packet::Init {
        id,
        players: player_list(state),
        portals: portals_for_player(player),
    })
}

/// One `Players` packet per connected player.
pub fn snapshot_packets(state: &GameState) -> Vec<(u32, Packet)> {
    if state.players.is_empty() {
        return Vec::new();
    }

    let players = player_list(state);
    state
        .players
        .iter()
        .map(|(id, player)| {
            let packet = Packet::Players {
                tick: state.tick,
                map: state.current_map.clone(),
                players: players.clone(),
                portals: portals_for_player(player),
            };
            (*id, packet)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use shared::maps;

    fn portal_game() -> GameState {
        let mut state = GameState::with_map(maps::PORTALS);
        let mut rng = StdRng::seed_from_u64(5);
        state.join(1, "big".to_string(), Some(1920.0), Some(1080.0), &mut rng);
        state.join(2, "small".to_string(), Some(960.0), Some(540.0), &mut rng);
        state
    }

    #[test]
    fn test_no_snapshots_for_empty_game() {
        let state = GameState::new();
        assert!(snapshot_packets(&state).is_empty());
    }

    #[test]
    fn test_snapshot_per_recipient_portals() {
        let state = portal_game();
        let packets = snapshot_packets(&state);
        assert_eq!(packets.len(), 2);

        for (id, packet) in packets {
            match packet {
                Packet::Players {
                    tick,
                    map,
                    players,
                    portals,
                } => {
                    assert_eq!(tick, state.tick);
                    assert_eq!(map, maps::PORTALS);
                    assert_eq!(players.len(), 2);
                    let (width, height) = if id == 1 {
                        (1920.0, 1080.0)
                    } else {
                        (960.0, 540.0)
                    };
                    assert_eq!(portals, maps::portals_for(maps::PORTALS, width, height));
                }
                _ => panic!("Expected Players packet"),
            }
        }
    }

    #[test]
    fn test_init_packet_for_known_player() {
        let state = portal_game();
        match init_packet(&state, 2) {
            Some(Packet::Init {
                id,
                players,
                portals,
            }) => {
                assert_eq!(id, 2);
                assert_eq!(players.len(), 2);
                assert_eq!(players[0].id, 1);
                assert_eq!(players[1].id, 2);
                assert_eq!(portals, maps::portals_for(maps::PORTALS, 960.0, 540.0));
            }
            other => panic!("Expected Init packet, got {:?}", other),
        }
    }

    #[test]
    fn test_init_packet_for_unknown_player() {
        let state = portal_game();
        assert!(init_packet(&state, 99).is_none());
    }

    #[test]
    fn test_portals_empty_on_portal_free_map() {
        let mut state = GameState::with_map(maps::ARENA);
        let mut rng = StdRng::seed_from_u64(5);
        state.join(1, "solo".to_string(), None, None, &mut rng);
        assert!(portals_for_player(&state.players[&1]).is_empty());
    }
}
