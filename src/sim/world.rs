//! Physics world
//!
//! Owns every rapier structure the pipeline needs. Dynamics, collision
//! detection and constraint solving are rapier's; this type only adds bodies,
//! swaps the static set, mutates body state and steps.

use glam::Vec2;
use rapier2d::prelude::*;

use super::scene::Obstacle;
use crate::settings::{BodyOptions, SceneSettings};

/// Smallest half-extent handed to the collider builder (zero-sized viewports)
const MIN_HALF_EXTENT: f32 = 0.01;

#[inline]
fn to_vector(v: Vec2) -> Vector<Real> {
    vector![v.x, v.y]
}

#[inline]
fn to_vec2(v: &Vector<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

pub struct PhysicsWorld {
    gravity: Vector<Real>,
    params: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: BroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd: CCDSolver,
    /// Handles of the current static set (replaced as a whole)
    obstacles: Vec<RigidBodyHandle>,
}

impl PhysicsWorld {
    pub fn new(settings: &SceneSettings) -> Self {
        Self {
            gravity: to_vector(settings.physics.gravity),
            params: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            obstacles: Vec::new(),
        }
    }

    /// Insert a ball disk and return its handle
    pub fn add_ball(&mut self, center: Vec2, settings: &SceneSettings) -> RigidBodyHandle {
        let body = body_builder(&settings.ball.options)
            .translation(to_vector(center))
            .linear_damping(settings.physics.air_drag)
            .ccd_enabled(true)
            .build();
        let collider = ColliderBuilder::ball(settings.ball.radius)
            .density(settings.physics.density)
            .friction(settings.physics.friction)
            .restitution(settings.ball.options.restitution)
            .restitution_combine_rule(CoefficientCombineRule::Max)
            .build();

        let handle = self.bodies.insert(body);
        self.colliders.insert_with_parent(collider, handle, &mut self.bodies);
        handle
    }

    /// Remove the previous static set and insert `obstacles` in its place
    pub fn replace_obstacles(&mut self, obstacles: &[Obstacle], settings: &SceneSettings) {
        for handle in self.obstacles.drain(..) {
            self.bodies.remove(
                handle,
                &mut self.islands,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            );
        }

        for obstacle in obstacles {
            let (center, collider, options) = match *obstacle {
                Obstacle::Wall { center, size } => {
                    let half = (size * 0.5).max(Vec2::splat(MIN_HALF_EXTENT));
                    let collider = ColliderBuilder::cuboid(half.x, half.y);
                    (center, collider, &settings.wall.options)
                }
                Obstacle::Pin { center, radius } => {
                    let collider = ColliderBuilder::ball(radius.max(MIN_HALF_EXTENT));
                    (center, collider, &settings.pin.options)
                }
            };
            let body = body_builder(options).translation(to_vector(center)).build();
            let collider = with_options(collider, options, settings).build();
            let handle = self.bodies.insert(body);
            self.colliders.insert_with_parent(collider, handle, &mut self.bodies);
            self.obstacles.push(handle);
        }

        // Resting balls must notice the new geometry
        for (_, body) in self.bodies.iter_mut() {
            if body.is_dynamic() {
                body.wake_up(true);
            }
        }
    }

    pub fn obstacle_count(&self) -> usize {
        self.obstacles.len()
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Whether the body is moved by the solver
    pub fn is_dynamic(&self, handle: RigidBodyHandle) -> bool {
        self.bodies.get(handle).is_some_and(|b| b.is_dynamic())
    }

    /// Advance the world by `dt` seconds, then drop accumulated forces
    pub fn step(&mut self, dt: f32) {
        self.params.dt = dt;
        self.pipeline.step(
            &self.gravity,
            &self.params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            None,
            &(),
            &(),
        );

        // Forces last exactly one step
        for (_, body) in self.bodies.iter_mut() {
            body.reset_forces(false);
        }
    }

    pub fn position(&self, handle: RigidBodyHandle) -> Vec2 {
        self.bodies
            .get(handle)
            .map(|b| to_vec2(b.translation()))
            .unwrap_or(Vec2::ZERO)
    }

    pub fn velocity(&self, handle: RigidBodyHandle) -> Vec2 {
        self.bodies
            .get(handle)
            .map(|b| to_vec2(b.linvel()))
            .unwrap_or(Vec2::ZERO)
    }

    /// Rotation in radians
    pub fn angle(&self, handle: RigidBodyHandle) -> f32 {
        self.bodies
            .get(handle)
            .map(|b| b.rotation().angle())
            .unwrap_or(0.0)
    }

    /// Teleport a body, bypassing the solver
    pub fn set_position(&mut self, handle: RigidBodyHandle, position: Vec2) {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.set_translation(to_vector(position), true);
        }
    }

    pub fn set_velocity(&mut self, handle: RigidBodyHandle, velocity: Vec2) {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.set_linvel(to_vector(velocity), true);
        }
    }

    /// Apply a force at the center of mass for the next step
    pub fn add_force(&mut self, handle: RigidBodyHandle, force: Vec2) {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.add_force(to_vector(force), true);
        }
    }
}

/// Fixed or dynamic body, as the options bag says
fn body_builder(options: &BodyOptions) -> RigidBodyBuilder {
    if options.is_static {
        RigidBodyBuilder::fixed()
    } else {
        RigidBodyBuilder::dynamic()
    }
}

fn with_options(
    builder: ColliderBuilder,
    options: &BodyOptions,
    settings: &SceneSettings,
) -> ColliderBuilder {
    builder
        .density(settings.physics.density)
        .restitution(options.restitution)
        .friction(settings.physics.friction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::scene::build_obstacles;
    use crate::sim::viewport::Viewport;

    #[test]
    fn test_replace_obstacles_swaps_whole_set() {
        let settings = SceneSettings::default();
        let mut world = PhysicsWorld::new(&settings);
        let ball = world.add_ball(Vec2::new(400.0, 150.0), &settings);

        let obstacles = build_obstacles(Viewport::new(800.0, 600.0), &settings);
        world.replace_obstacles(&obstacles, &settings);
        assert_eq!(world.obstacle_count(), 6);
        assert_eq!(world.body_count(), 7);

        let obstacles = build_obstacles(Viewport::new(1024.0, 768.0), &settings);
        world.replace_obstacles(&obstacles, &settings);
        assert_eq!(world.obstacle_count(), 6);
        assert_eq!(world.body_count(), 7);
        assert_eq!(world.position(ball), Vec2::new(400.0, 150.0));
    }

    #[test]
    fn test_gravity_pulls_down() {
        let settings = SceneSettings::default();
        let mut world = PhysicsWorld::new(&settings);
        let ball = world.add_ball(Vec2::new(400.0, 150.0), &settings);

        for _ in 0..10 {
            world.step(crate::consts::SIM_DT);
        }
        assert!(world.position(ball).y > 150.0);
        assert!(world.velocity(ball).y > 0.0);
    }

    #[test]
    fn test_force_lasts_one_step() {
        let settings = SceneSettings::default();
        let mut world = PhysicsWorld::new(&settings);
        let ball = world.add_ball(Vec2::new(400.0, 150.0), &settings);

        world.add_force(ball, Vec2::new(100_000.0, 0.0));
        world.step(crate::consts::SIM_DT);
        let after_push = world.velocity(ball).x;
        assert!(after_push > 0.0);

        // No force the second time: only drag acts on the horizontal speed
        world.step(crate::consts::SIM_DT);
        assert!(world.velocity(ball).x <= after_push);
    }

    #[test]
    fn test_body_type_follows_is_static() {
        let mut settings = SceneSettings::default();
        settings.ball.options.is_static = true;
        settings.pin.options.is_static = false;
        let mut world = PhysicsWorld::new(&settings);
        let ball = world.add_ball(Vec2::new(400.0, 150.0), &settings);
        let obstacles = build_obstacles(Viewport::new(800.0, 600.0), &settings);
        world.replace_obstacles(&obstacles, &settings);

        assert!(!world.is_dynamic(ball));
        let pin = world.obstacles[4];
        let wall = world.obstacles[0];
        assert!(world.is_dynamic(pin));
        assert!(!world.is_dynamic(wall));

        for _ in 0..30 {
            world.step(crate::consts::SIM_DT);
        }
        assert_eq!(world.position(ball), Vec2::new(400.0, 150.0));
        assert!(world.position(pin).y > 300.0);
        assert_eq!(world.position(wall), Vec2::new(400.0, 0.0));
    }
}
