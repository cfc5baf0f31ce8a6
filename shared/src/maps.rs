//! Static map catalog.
//!
//! Every map is authored in fractions of the viewport so that clients running at
//! different resolutions see proportionally identical layouts. Geometry is
//! produced on demand for a concrete `(width, height)`; maps never change at runtime.

use crate::{Portal, Wall};

pub const PLUS: &str = "plus";
pub const PORTALS: &str = "portals";
pub const CORNERS: &str = "corners";
pub const ARENA: &str = "arena";

/// A named map template.
#[derive(Debug, Clone, Copy)]
pub struct MapDef {
    pub name: &'static str,
    pub walls: fn(f32, f32) -> Vec<Wall>,
    pub portals: Option<fn(f32, f32) -> Vec<Portal>>,
}

/// Every map the server can rotate through. Order is stable and the first entry
/// is the map a fresh server starts on.
pub const CATALOG: &[MapDef] = &[
    MapDef {
        name: PLUS,
        walls: plus_walls,
        portals: None,
    },
    MapDef {
        name: PORTALS,
        walls: portal_walls,
        portals: Some(portal_portals),
    },
    MapDef {
        name: CORNERS,
        walls: corner_walls,
        portals: None,
    },
    MapDef {
        name: ARENA,
        walls: arena_walls,
        portals: None,
    },
];

pub fn default_map() -> &'static str {
    CATALOG[0].name
}

pub fn find_map(name: &str) -> Option<&'static MapDef> {
    CATALOG.iter().find(|map| map.name == name)
}

pub fn map_names() -> impl Iterator<Item = &'static str> {
    CATALOG.iter().map(|map| map.name)
}

/// Walls of `name` scaled to a `width`×`height` viewport. Unknown maps have no walls.
pub fn walls_for(name: &str, width: f32, height: f32) -> Vec<Wall> {
    find_map(name)
        .map(|map| (map.walls)(width, height))
        .unwrap_or_default()
}

/// Portals of `name` scaled to a `width`×`height` viewport, empty if the map has none.
pub fn portals_for(name: &str, width: f32, height: f32) -> Vec<Portal> {
    find_map(name)
        .and_then(|map| map.portals)
        .map(|portals| portals(width, height))
        .unwrap_or_default()
}

fn rect(width: f32, height: f32, fx: f32, fy: f32, fw: f32, fh: f32) -> Wall {
    Wall::new(fx * width, fy * height, fw * width, fh * height)
}

fn portal(width: f32, height: f32, fx: f32, fy: f32, target: usize) -> Portal {
    Portal {
        x: fx * width,
        y: fy * height,
        radius: 0.03 * width.min(height),
        target,
    }
}

fn plus_walls(width: f32, height: f32) -> Vec<Wall> {
    vec![
        rect(width, height, 0.30, 0.46, 0.40, 0.08),
        rect(width, height, 0.46, 0.20, 0.08, 0.60),
    ]
}

fn portal_walls(width: f32, height: f32) -> Vec<Wall> {
    vec![
        rect(width, height, 0.33, 0.00, 0.03, 0.40),
        rect(width, height, 0.64, 0.60, 0.03, 0.40),
        rect(width, height, 0.45, 0.25, 0.10, 0.03),
        rect(width, height, 0.45, 0.72, 0.10, 0.03),
    ]
}

// Portals 0/1 and 2/3 link across the map diagonals in both directions.
fn portal_portals(width: f32, height: f32) -> Vec<Portal> {
    vec![
        portal(width, height, 0.15, 0.20, 1),
        portal(width, height, 0.85, 0.80, 0),
        portal(width, height, 0.85, 0.20, 3),
        portal(width, height, 0.15, 0.80, 2),
    ]
}

fn corner_walls(width: f32, height: f32) -> Vec<Wall> {
    vec![
        rect(width, height, 0.15, 0.15, 0.15, 0.20),
        rect(width, height, 0.70, 0.15, 0.15, 0.20),
        rect(width, height, 0.15, 0.65, 0.15, 0.20),
        rect(width, height, 0.70, 0.65, 0.15, 0.20),
    ]
}

fn arena_walls(width: f32, height: f32) -> Vec<Wall> {
    vec![
        rect(width, height, 0.40, 0.40, 0.20, 0.20),
        rect(width, height, 0.20, 0.30, 0.02, 0.40),
        rect(width, height, 0.78, 0.30, 0.02, 0.40),
        rect(width, height, 0.35, 0.12, 0.30, 0.02),
        rect(width, height, 0.35, 0.86, 0.30, 0.02),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_catalog_has_reference_maps() {
        let names: Vec<&str> = map_names().collect();
        assert!(names.len() >= 4);
        for name in [PLUS, PORTALS, CORNERS, ARENA] {
            assert!(names.contains(&name), "missing map {}", name);
        }
        assert_eq!(default_map(), PLUS);
    }

    #[test]
    fn test_map_names_are_unique() {
        let mut names: Vec<&str> = map_names().collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), CATALOG.len());
    }

    #[test]
    fn test_walls_scale_with_viewport() {
        for name in map_names() {
            let small = walls_for(name, 1280.0, 720.0);
            let large = walls_for(name, 2560.0, 1440.0);
            assert!(!small.is_empty());
            assert_eq!(small.len(), large.len());

            for (a, b) in small.iter().zip(large.iter()) {
                assert_approx_eq!(a.x * 2.0, b.x, 1e-3);
                assert_approx_eq!(a.y * 2.0, b.y, 1e-3);
                assert_approx_eq!(a.w * 2.0, b.w, 1e-3);
                assert_approx_eq!(a.h * 2.0, b.h, 1e-3);
            }
        }
    }

    #[test]
    fn test_walls_stay_inside_viewport() {
        for name in map_names() {
            for wall in walls_for(name, 1920.0, 1080.0) {
                assert!(wall.x >= 0.0 && wall.x + wall.w <= 1920.0 + 1e-3);
                assert!(wall.y >= 0.0 && wall.y + wall.h <= 1080.0 + 1e-3);
                assert!(wall.w > 0.0 && wall.h > 0.0);
            }
        }
    }

    #[test]
    fn test_maps_have_distinct_topology() {
        let layouts: Vec<Vec<Wall>> = map_names()
            .map(|name| walls_for(name, 1920.0, 1080.0))
            .collect();
        for i in 0..layouts.len() {
            for j in (i + 1)..layouts.len() {
                assert_ne!(layouts[i], layouts[j]);
            }
        }
    }

    #[test]
    fn test_portals_only_on_portal_map() {
        assert!(portals_for(PLUS, 1920.0, 1080.0).is_empty());
        assert!(portals_for(CORNERS, 1920.0, 1080.0).is_empty());
        assert!(portals_for(ARENA, 1920.0, 1080.0).is_empty());
        assert_eq!(portals_for(PORTALS, 1920.0, 1080.0).len(), 4);
    }

    #[test]
    fn test_portal_targets_are_valid_and_distinct() {
        let portals = portals_for(PORTALS, 1920.0, 1080.0);
        for (index, portal) in portals.iter().enumerate() {
            assert!(portal.target < portals.len());
            assert_ne!(portal.target, index);
        }
    }

    #[test]
    fn test_portal_radius_scales_with_short_side() {
        let portals = portals_for(PORTALS, 1920.0, 1080.0);
        assert_approx_eq!(portals[0].radius, 32.4, 1e-3);
        assert_approx_eq!(portals[0].x, 288.0, 1e-3);
        assert_approx_eq!(portals[0].y, 216.0, 1e-3);
    }

    #[test]
    fn test_unknown_map_has_no_geometry() {
        assert!(find_map("nowhere").is_none());
        assert!(walls_for("nowhere", 1920.0, 1080.0).is_empty());
        assert!(portals_for("nowhere", 1920.0, 1080.0).is_empty());
    }
}
