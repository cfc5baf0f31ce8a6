//! Wall-free spawn point selection.

use crate::collision::wall_collision;
use log::warn;
use rand::Rng;
use shared::{PLAYER_SIZE, SPAWN_ATTEMPTS, SPAWN_MARGIN};

/// Finds a position on `map_name` where a player does not overlap any wall.
///
/// Points are sampled uniformly inside a `SPAWN_MARGIN` inset of the viewport; a sample
/// whose bounding box pokes out of the inset or hits a wall is discarded. After
/// `SPAWN_ATTEMPTS` failed samples the viewport center is returned, whether or not it
/// is clear.
pub fn find_safe_spawn<R: Rng + ?Sized>(
    map_name: &str,
    width: f32,
    height: f32,
    rng: &mut R,
) -> (f32, f32) {
    let low = SPAWN_MARGIN;
    let high_x = width - SPAWN_MARGIN;
    let high_y = height - SPAWN_MARGIN;

    for _ in 0..SPAWN_ATTEMPTS {
        let x = low + rng.gen::<f32>() * (width - 2.0 * SPAWN_MARGIN);
        let y = low + rng.gen::<f32>() * (height - 2.0 * SPAWN_MARGIN);

        if x - PLAYER_SIZE < low || x + PLAYER_SIZE > high_x {
            continue;
        }
        if y - PLAYER_SIZE < low || y + PLAYER_SIZE > high_y {
            continue;
        }
        if !wall_collision(x, y, map_name, width, height) {
            return (x, y);
        }
    }

    warn!(
        "No safe spawn on map '{}' for {}x{} after {} attempts, using center",
        map_name, width, height, SPAWN_ATTEMPTS
    );
    (width / 2.0, height / 2.0)
}
