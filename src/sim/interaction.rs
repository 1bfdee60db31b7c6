//! Pointer interaction and boundary rules
//!
//! Pure geometry plus the small amount of state a pointer drag needs. Nothing
//! here touches the physics world; `Simulation` applies the results.

use glam::Vec2;

use super::state::BallId;
use super::viewport::Viewport;
use crate::consts::CLICK_SLOP;

/// Whether a ball center has left the viewport
///
/// Strict comparisons: a center exactly on an edge is still inside.
#[inline]
pub fn out_of_bounds(p: Vec2, viewport: Viewport) -> bool {
    p.x < 0.0 || p.x > viewport.width || p.y < 0.0 || p.y > viewport.height
}

/// Whether `p` lies on or inside the disk
#[inline]
pub fn disk_contains(center: Vec2, radius: f32, p: Vec2) -> bool {
    center.distance_squared(p) <= radius * radius
}

/// Force pushing a ball away from a click: `(center - click) * magnitude`
#[inline]
pub fn click_force(center: Vec2, click: Vec2, magnitude: f32) -> Vec2 {
    (center - click) * magnitude
}

/// Forces for every ball whose disk contains the click point
///
/// `balls` yields `(id, center)`; all balls share `radius`.
pub fn click_forces(
    balls: impl IntoIterator<Item = (BallId, Vec2)>,
    radius: f32,
    click: Vec2,
    magnitude: f32,
) -> Vec<(BallId, Vec2)> {
    balls
        .into_iter()
        .filter(|&(_, center)| disk_contains(center, radius, click))
        .map(|(id, center)| (id, click_force(center, click, magnitude)))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Grab {
    ball: BallId,
    /// Pointer minus ball center at the moment of the grab
    offset: Vec2,
}

/// Pointer-to-ball link that exists only while the pointer is pressed on a ball
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DragConstraint {
    pointer: Option<Vec2>,
    press_origin: Option<Vec2>,
    /// Farthest the pointer got from where it was pressed (current or last press)
    travel: f32,
    grab: Option<Grab>,
}

impl DragConstraint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pointer pressed at `at`; `hit` is the ball under it, if any
    pub fn press(&mut self, at: Vec2, hit: Option<(BallId, Vec2)>) {
        self.pointer = Some(at);
        self.press_origin = Some(at);
        self.travel = 0.0;
        self.grab = hit.map(|(ball, center)| Grab {
            ball,
            offset: at - center,
        });
    }

    /// Link the press to a ball reached after the press began
    pub fn attach(&mut self, at: Vec2, (ball, center): (BallId, Vec2)) {
        if self.press_origin.is_some() {
            self.grab = Some(Grab {
                ball,
                offset: at - center,
            });
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.press_origin.is_some()
    }

    pub fn moved(&mut self, to: Vec2) {
        if let Some(origin) = self.press_origin {
            self.pointer = Some(to);
            self.travel = self.travel.max(origin.distance(to));
        }
    }

    pub fn release(&mut self) {
        self.pointer = None;
        self.press_origin = None;
        self.grab = None;
    }

    pub fn grabbed(&self) -> Option<BallId> {
        self.grab.map(|g| g.ball)
    }

    /// Whether the current or most recent press moved far enough to be a drag
    pub fn is_drag_gesture(&self) -> bool {
        self.travel > CLICK_SLOP
    }

    /// Velocity that closes `stiffness` of the gap between the grabbed point
    /// and the pointer within one step of `dt` seconds
    pub fn pull_velocity(&self, center: Vec2, stiffness: f32, dt: f32) -> Option<Vec2> {
        let grab = self.grab?;
        let pointer = self.pointer?;
        if dt <= 0.0 {
            return None;
        }
        let target = pointer - grab.offset;
        Some((target - center) * stiffness / dt)
    }
}
