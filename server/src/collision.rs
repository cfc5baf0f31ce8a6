//! Wall, player-proximity and portal checks used by the simulation tick.

use shared::maps::{portals_for, walls_for};
use shared::{Player, Wall, PLAYER_SIZE};

/// Returns true if a player centered at `(x, y)` overlaps any wall.
///
/// The player occupies a square of side `2 * PLAYER_SIZE`. Intersection is strict,
/// so a box that only shares an edge with a wall does not collide.
pub fn collides_with_walls(x: f32, y: f32, walls: &[Wall]) -> bool {
    walls.iter().any(|wall| {
        x + PLAYER_SIZE > wall.x
            && x - PLAYER_SIZE < wall.x + wall.w
            && y + PLAYER_SIZE > wall.y
            && y - PLAYER_SIZE < wall.y + wall.h
    })
}

/// Wall test against `map_name` scaled to a `width`×`height` viewport.
pub fn wall_collision(x: f32, y: f32, map_name: &str, width: f32, height: f32) -> bool {
    collides_with_walls(x, y, &walls_for(map_name, width, height))
}

/// Returns true if two players are close enough to tag.
///
/// Each position lives in its owner's viewport, so both are normalized first and the
/// fractional delta is projected back into pixels using the smaller width and the
/// smaller height of the two viewports. The result is not symmetric in general when
/// viewports differ in aspect ratio; clients depend on this exact formula.
pub fn players_touching(p1: &Player, p2: &Player) -> bool {
    let (n1x, n1y) = p1.normalized_position();
    let (n2x, n2y) = p2.normalized_position();

    let dx = (n1x - n2x) * p1.screen_width.min(p2.screen_width);
    let dy = (n1y - n2y) * p1.screen_height.min(p2.screen_height);

    (dx * dx + dy * dy).sqrt() < PLAYER_SIZE * 2.0
}

/// Teleports `player` if it stands inside a portal of its current map.
///
/// The player lands on the center of the entry portal's target. At most one portal is
/// used per call. The arrival portal is ignored until the player leaves its radius,
/// otherwise linked portals would bounce the player back on the next tick.
/// Returns true if a teleport happened.
pub fn check_portal(player: &mut Player) -> bool {
    let portals = portals_for(&player.current_map, player.screen_width, player.screen_height);
    if portals.is_empty() {
        player.portal_lock = None;
        return false;
    }

    let inside = |portal_x: f32, portal_y: f32, radius: f32, x: f32, y: f32| {
        let dx = x - portal_x;
        let dy = y - portal_y;
        (dx * dx + dy * dy).sqrt() < radius
    };

    if let Some(locked) = player.portal_lock {
        let still_inside = portals
            .get(locked)
            .is_some_and(|p| inside(p.x, p.y, p.radius, player.x, player.y));
        if !still_inside {
            player.portal_lock = None;
        }
    }

    for (index, portal) in portals.iter().enumerate() {
        if player.portal_lock == Some(index) {
            continue;
        }
        if !inside(portal.x, portal.y, portal.radius, player.x, player.y) {
            continue;
        }

        let Some(target) = portals.get(portal.target) else {
            continue;
        };
        player.x = target.x;
        player.y = target.y;
        player.portal_lock = Some(portal.target);
        return true;
    }

    false
}
