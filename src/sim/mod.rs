//! Simulation module
//!
//! Scene layout, the physics world and the interaction rules. No rendering
//! or platform dependencies:
//! - Fixed timestep only
//! - Wall-clock time passed in explicitly (reset deadlines)
//! - Ball iteration in `BallId::ALL` order

pub mod interaction;
pub mod reset;
pub mod scene;
pub mod state;
pub mod tick;
pub mod viewport;
pub mod world;

pub use interaction::{DragConstraint, click_force, click_forces, disk_contains, out_of_bounds};
pub use reset::ResetScheduler;
pub use scene::{OBSTACLE_COUNT, Obstacle, build_obstacles};
pub use state::{Ball, BallId, BallSnapshot, Simulation};
pub use tick::{InputEvent, dispatch, tick};
pub use viewport::Viewport;
pub use world::PhysicsWorld;
