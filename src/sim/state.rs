//! Simulation context
//!
//! Everything the toy mutates lives in one owned `Simulation`: the physics
//! world, the two balls, the current viewport and obstacle set, pending
//! resets and the pointer drag. Event handlers and the step loop receive it
//! explicitly.

use glam::Vec2;
use rapier2d::prelude::RigidBodyHandle;
use serde::{Deserialize, Serialize};

use super::interaction::{DragConstraint, click_forces, disk_contains, out_of_bounds};
use super::reset::ResetScheduler;
use super::scene::{OBSTACLE_COUNT, Obstacle, build_obstacles};
use super::viewport::Viewport;
use super::world::PhysicsWorld;
use crate::settings::SceneSettings;

/// Identity of the two movable balls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BallId {
    Ball1,
    Ball2,
}

impl BallId {
    pub const ALL: [BallId; 2] = [BallId::Ball1, BallId::Ball2];

    #[inline]
    pub const fn index(self) -> usize {
        match self {
            BallId::Ball1 => 0,
            BallId::Ball2 => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BallId::Ball1 => "ball1",
            BallId::Ball2 => "ball2",
        }
    }
}

/// A movable ball (its dynamic state lives in the physics world)
#[derive(Debug, Clone)]
pub struct Ball {
    pub id: BallId,
    pub handle: RigidBodyHandle,
    pub radius: f32,
    /// Where the ball respawns, resolved against the current viewport
    pub reset_position: Vec2,
}

/// Render-facing copy of a ball's state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallSnapshot {
    pub id: BallId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub angle: f32,
    pub radius: f32,
}

pub struct Simulation {
    settings: SceneSettings,
    viewport: Viewport,
    obstacles: [Obstacle; OBSTACLE_COUNT],
    world: PhysicsWorld,
    balls: [Ball; 2],
    resets: ResetScheduler,
    drag: DragConstraint,
    /// Steps taken since creation
    pub time_ticks: u64,
}

impl Simulation {
    /// Build the world: both balls at their spawn points plus the static set
    pub fn new(settings: SceneSettings, viewport: Viewport) -> Self {
        let mut world = PhysicsWorld::new(&settings);

        let balls = BallId::ALL.map(|id| {
            let reset_position = settings.reset_position(id, viewport);
            Ball {
                id,
                handle: world.add_ball(reset_position, &settings),
                radius: settings.ball.radius,
                reset_position,
            }
        });

        let obstacles = build_obstacles(viewport, &settings);
        world.replace_obstacles(&obstacles, &settings);

        log::info!(
            "Scene built for {}x{} viewport",
            viewport.width,
            viewport.height
        );

        Self {
            settings,
            viewport,
            obstacles,
            world,
            balls,
            resets: ResetScheduler::new(),
            drag: DragConstraint::new(),
            time_ticks: 0,
        }
    }

    pub fn settings(&self) -> &SceneSettings {
        &self.settings
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn obstacles(&self) -> &[Obstacle; OBSTACLE_COUNT] {
        &self.obstacles
    }

    pub fn ball(&self, id: BallId) -> &Ball {
        &self.balls[id.index()]
    }

    pub fn resets(&self) -> &ResetScheduler {
        &self.resets
    }

    pub fn drag(&self) -> &DragConstraint {
        &self.drag
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn ball_position(&self, id: BallId) -> Vec2 {
        self.world.position(self.ball(id).handle)
    }

    pub fn ball_velocity(&self, id: BallId) -> Vec2 {
        self.world.velocity(self.ball(id).handle)
    }

    pub fn snapshot(&self) -> [BallSnapshot; 2] {
        BallId::ALL.map(|id| {
            let ball = self.ball(id);
            BallSnapshot {
                id,
                pos: self.world.position(ball.handle),
                vel: self.world.velocity(ball.handle),
                angle: self.world.angle(ball.handle),
                radius: ball.radius,
            }
        })
    }

    /// Move a ball directly (scripted input, tests)
    pub fn place_ball(&mut self, id: BallId, position: Vec2, velocity: Vec2) {
        let handle = self.ball(id).handle;
        self.world.set_position(handle, position);
        self.world.set_velocity(handle, velocity);
    }

    /// Adopt a new viewport: rebuild the static set, keep the balls as they are
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.obstacles = build_obstacles(viewport, &self.settings);
        self.world.replace_obstacles(&self.obstacles, &self.settings);

        for ball in &mut self.balls {
            ball.reset_position = self.settings.reset_position(ball.id, viewport);
        }

        log::info!("Resized to {}x{}", viewport.width, viewport.height);
    }

    /// Push every ball under `at` away from it; returns the forces applied
    pub fn click(&mut self, at: Vec2) -> Vec<(BallId, Vec2)> {
        let centers = BallId::ALL.map(|id| (id, self.ball_position(id)));
        let forces = click_forces(
            centers,
            self.settings.ball.radius,
            at,
            self.settings.click_force,
        );

        for &(id, force) in &forces {
            let handle = self.ball(id).handle;
            self.world.add_force(handle, force * self.settings.physics.force_scale);
            log::debug!("Click at {at} pushes {} with {force}", id.as_str());
        }
        forces
    }

    /// Topmost ball under `at` (the one drawn last wins)
    fn ball_at(&self, at: Vec2) -> Option<(BallId, Vec2)> {
        BallId::ALL
            .into_iter()
            .rev()
            .map(|id| (id, self.ball_position(id)))
            .find(|&(id, center)| disk_contains(center, self.ball(id).radius, at))
    }

    pub fn pointer_down(&mut self, at: Vec2) {
        let hit = self.ball_at(at);
        self.drag.press(at, hit);
        if let Some((id, _)) = hit {
            log::debug!("Grabbed {}", id.as_str());
        }
    }

    /// A press that started on empty space grabs the first ball it slides over
    pub fn pointer_move(&mut self, at: Vec2) {
        self.drag.moved(at);
        if self.drag.is_pressed() && self.drag.grabbed().is_none() {
            if let Some(hit) = self.ball_at(at) {
                self.drag.attach(at, hit);
                log::debug!("Grabbed {} mid-drag", hit.0.as_str());
            }
        }
    }

    pub fn pointer_up(&mut self) {
        self.drag.release();
    }

    /// Drive the grabbed ball toward the pointer for the coming step
    pub fn apply_drag(&mut self, dt: f32) {
        let Some(id) = self.drag.grabbed() else {
            return;
        };
        let center = self.ball_position(id);
        if let Some(velocity) = self
            .drag
            .pull_velocity(center, self.settings.drag_stiffness, dt)
        {
            let handle = self.ball(id).handle;
            self.world.set_velocity(handle, velocity);
        }
    }

    /// Schedule a reset for every ball whose center left the viewport
    pub fn schedule_exits(&mut self, now_ms: f64) {
        for id in BallId::ALL {
            if out_of_bounds(self.ball_position(id), self.viewport)
                && self
                    .resets
                    .schedule(id, now_ms, self.settings.reset_delay_ms)
            {
                log::debug!(
                    "{} left the viewport, reset at {:.0} ms",
                    id.as_str(),
                    now_ms + self.settings.reset_delay_ms
                );
            }
        }
    }

    /// Put a ball back on its reset point with zero velocity
    pub fn reset_ball(&mut self, id: BallId) {
        let ball = self.ball(id);
        let (handle, home) = (ball.handle, ball.reset_position);
        self.world.set_position(handle, home);
        self.world.set_velocity(handle, Vec2::ZERO);
    }

    /// Perform every reset whose deadline has passed
    pub fn fire_due_resets(&mut self, now_ms: f64) -> Vec<BallId> {
        let due = self.resets.take_due(now_ms);
        for &id in &due {
            self.reset_ball(id);
            log::debug!("{} reset", id.as_str());
        }
        due
    }

    /// One physics step of `dt` seconds
    pub fn step_world(&mut self, dt: f32) {
        self.world.step(dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sim_800x600() -> Simulation {
        Simulation::new(SceneSettings::default(), Viewport::new(800.0, 600.0))
    }

    #[test]
    fn test_spawn_positions() {
        let sim = sim_800x600();
        assert_eq!(sim.ball_position(BallId::Ball1), Vec2::new(400.0, 150.0));
        assert_eq!(sim.ball_position(BallId::Ball2), Vec2::new(400.0, 550.0));
        assert_eq!(sim.world().body_count(), 2 + OBSTACLE_COUNT);
    }

    #[test]
    fn test_reset_zeroes_velocity() {
        let mut sim = sim_800x600();
        sim.place_ball(BallId::Ball2, Vec2::new(-300.0, 20.0), Vec2::new(5000.0, -9000.0));
        sim.reset_ball(BallId::Ball2);
        assert_eq!(sim.ball_position(BallId::Ball2), Vec2::new(400.0, 550.0));
        assert_eq!(sim.ball_velocity(BallId::Ball2), Vec2::ZERO);
    }

    #[test]
    fn test_resize_keeps_ball_state() {
        let mut sim = sim_800x600();
        sim.place_ball(BallId::Ball1, Vec2::new(300.0, 200.0), Vec2::new(120.0, -40.0));

        sim.resize(Viewport::new(1024.0, 768.0));

        assert_eq!(sim.ball_position(BallId::Ball1), Vec2::new(300.0, 200.0));
        assert_eq!(sim.ball_velocity(BallId::Ball1), Vec2::new(120.0, -40.0));
        assert_eq!(sim.obstacles()[1].center(), Vec2::new(512.0, 768.0));
        assert_eq!(sim.ball(BallId::Ball1).reset_position, Vec2::new(512.0, 192.0));
        assert_eq!(sim.world().body_count(), 2 + OBSTACLE_COUNT);
    }

    #[test]
    fn test_click_returns_unscaled_force() {
        let mut sim = sim_800x600();
        let center = sim.ball_position(BallId::Ball1);
        let forces = sim.click(center - Vec2::new(10.0, 10.0));
        assert_eq!(forces.len(), 1);
        assert_eq!(forces[0].0, BallId::Ball1);
        assert!((forces[0].1 - Vec2::new(0.2, 0.2)).length() < 1e-6);

        assert!(sim.click(Vec2::new(5.0, 5.0)).is_empty());
    }

    #[test]
    fn test_pointer_down_grabs_ball_under_pointer() {
        let mut sim = sim_800x600();
        sim.pointer_down(Vec2::new(420.0, 560.0));
        assert_eq!(sim.drag().grabbed(), Some(BallId::Ball2));
        sim.pointer_up();
        assert_eq!(sim.drag().grabbed(), None);

        sim.pointer_down(Vec2::new(50.0, 50.0));
        assert_eq!(sim.drag().grabbed(), None);
    }

    #[test]
    fn test_press_on_empty_space_grabs_ball_it_slides_onto() {
        let mut sim = sim_800x600();
        sim.pointer_down(Vec2::new(250.0, 150.0));
        assert_eq!(sim.drag().grabbed(), None);

        sim.pointer_move(Vec2::new(300.0, 150.0));
        assert_eq!(sim.drag().grabbed(), None);
        sim.pointer_move(Vec2::new(360.0, 150.0));
        assert_eq!(sim.drag().grabbed(), Some(BallId::Ball1));

        // Moving with nothing pressed never grabs
        sim.pointer_up();
        sim.pointer_move(Vec2::new(400.0, 150.0));
        assert_eq!(sim.drag().grabbed(), None);
    }
}
