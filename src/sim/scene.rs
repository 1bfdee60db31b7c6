//! Static scene layout
//!
//! Walls hug the four viewport edges (centered on them, so half of each wall
//! is off screen) and two pins sit a quarter of the width in from each side.
//! The layout is a pure function of the viewport; a resize produces a new
//! complete set that replaces the old one.

use glam::Vec2;

use super::viewport::Viewport;
use crate::settings::SceneSettings;

/// Number of static bodies in every layout
pub const OBSTACLE_COUNT: usize = 6;

/// A static body
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Obstacle {
    /// Axis-aligned rectangle; `size` is the full width and height
    Wall { center: Vec2, size: Vec2 },
    /// Disk
    Pin { center: Vec2, radius: f32 },
}

impl Obstacle {
    pub fn center(&self) -> Vec2 {
        match *self {
            Obstacle::Wall { center, .. } | Obstacle::Pin { center, .. } => center,
        }
    }

    pub fn is_wall(&self) -> bool {
        matches!(self, Obstacle::Wall { .. })
    }
}

/// Build the walls and pins for a viewport
///
/// Order: top wall, bottom wall, right wall, left wall, left pin, right pin.
pub fn build_obstacles(viewport: Viewport, settings: &SceneSettings) -> [Obstacle; OBSTACLE_COUNT] {
    let Viewport { width: w, height: h } = viewport;
    let thickness = settings.wall.size;
    let pin_radius = settings.pin.radius;

    [
        Obstacle::Wall {
            center: Vec2::new(w / 2.0, 0.0),
            size: Vec2::new(w, thickness),
        },
        Obstacle::Wall {
            center: Vec2::new(w / 2.0, h),
            size: Vec2::new(w, thickness),
        },
        Obstacle::Wall {
            center: Vec2::new(w, h / 2.0),
            size: Vec2::new(thickness, h),
        },
        Obstacle::Wall {
            center: Vec2::new(0.0, h / 2.0),
            size: Vec2::new(thickness, h),
        },
        Obstacle::Pin {
            center: Vec2::new(w / 4.0, h / 2.0),
            radius: pin_radius,
        },
        Obstacle::Pin {
            center: Vec2::new(w - w / 4.0, h / 2.0),
            radius: pin_radius,
        },
    ]
}
