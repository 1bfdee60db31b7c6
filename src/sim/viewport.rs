//! Viewport geometry
//!
//! The visible area in CSS pixels, origin at the top-left corner, y down.
//! Replaced as a whole on every resize; nothing holds a reference to the old one.

use glam::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Whether `p` lies inside `[0, W] × [0, H]` (edges included)
    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= 0.0 && p.x <= self.width && p.y >= 0.0 && p.y <= self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_edges() {
        let vp = Viewport::new(800.0, 600.0);
        assert!(vp.contains(Vec2::new(0.0, 0.0)));
        assert!(vp.contains(Vec2::new(800.0, 600.0)));
        assert!(!vp.contains(Vec2::new(-0.01, 300.0)));
        assert!(!vp.contains(Vec2::new(400.0, 600.5)));
    }
}
