//! Fixed timestep simulation tick
//!
//! Input arrives as `InputEvent` messages, dispatched in arrival order before
//! the next step. A step then runs in the physics library's order:
//! boundary check ("before update"), drag, integration; resets that came due
//! are applied last so the next frame draws them.

use glam::Vec2;

use super::state::Simulation;
use super::viewport::Viewport;

/// Input delivered to the simulation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown(Vec2),
    PointerMove(Vec2),
    PointerUp,
    /// Completed click, in canvas coordinates
    Click(Vec2),
    Resize(Viewport),
}

/// Apply one input message to the simulation
pub fn dispatch(sim: &mut Simulation, event: InputEvent) {
    match event {
        InputEvent::PointerDown(at) => sim.pointer_down(at),
        InputEvent::PointerMove(at) => sim.pointer_move(at),
        InputEvent::PointerUp => sim.pointer_up(),
        InputEvent::Click(at) => {
            // The click that ends a drag gesture is not an impulse
            if sim.drag().is_drag_gesture() {
                log::debug!("Click at {at} ignored after drag");
            } else {
                sim.click(at);
            }
        }
        InputEvent::Resize(viewport) => sim.resize(viewport),
    }
}

/// Advance the simulation by one fixed timestep
///
/// `now_ms` is the wall clock used for reset deadlines.
pub fn tick(sim: &mut Simulation, dt: f32, now_ms: f64) {
    sim.time_ticks += 1;

    sim.schedule_exits(now_ms);
    sim.apply_drag(dt);
    sim.step_world(dt);
    sim.fire_due_resets(now_ms);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::settings::SceneSettings;
    use crate::sim::state::BallId;

    fn sim_800x600() -> Simulation {
        Simulation::new(SceneSettings::default(), Viewport::new(800.0, 600.0))
    }

    /// Wall-clock time of step `i` at 60 Hz
    fn frame_ms(i: u32) -> f64 {
        f64::from(i) * 1000.0 / 60.0
    }

    #[test]
    fn test_ball_below_viewport_resets_after_one_second() {
        let mut sim = sim_800x600();
        assert_eq!(sim.ball_position(BallId::Ball1), Vec2::new(400.0, 150.0));

        sim.place_ball(BallId::Ball1, Vec2::new(400.0, 650.0), Vec2::new(0.0, 300.0));
        tick(&mut sim, SIM_DT, frame_ms(0));
        assert_eq!(sim.resets().deadline(BallId::Ball1), Some(1000.0));

        for i in 1..60 {
            tick(&mut sim, SIM_DT, frame_ms(i));
            assert!(sim.resets().is_pending(BallId::Ball1), "reset fired early at step {i}");
        }
        // Still pending means it was never rescheduled later
        assert_eq!(sim.resets().deadline(BallId::Ball1), Some(1000.0));

        tick(&mut sim, SIM_DT, frame_ms(60));
        assert_eq!(sim.ball_position(BallId::Ball1), Vec2::new(400.0, 150.0));
        assert_eq!(sim.ball_velocity(BallId::Ball1), Vec2::ZERO);
        assert!(!sim.resets().is_pending(BallId::Ball1));
    }

    #[test]
    fn test_ball2_resets_to_its_own_position() {
        let mut sim = sim_800x600();
        sim.place_ball(BallId::Ball2, Vec2::new(-80.0, 300.0), Vec2::new(-50.0, 0.0));
        tick(&mut sim, SIM_DT, 0.0);
        tick(&mut sim, SIM_DT, 1000.0);
        assert_eq!(sim.ball_position(BallId::Ball2), Vec2::new(400.0, 550.0));
        assert_eq!(sim.ball_velocity(BallId::Ball2), Vec2::ZERO);
    }

    #[test]
    fn test_pending_reset_fires_even_if_ball_returned() {
        let mut sim = sim_800x600();
        sim.place_ball(BallId::Ball1, Vec2::new(900.0, 300.0), Vec2::ZERO);
        tick(&mut sim, SIM_DT, 0.0);
        assert!(sim.resets().is_pending(BallId::Ball1));

        sim.place_ball(BallId::Ball1, Vec2::new(300.0, 300.0), Vec2::ZERO);
        tick(&mut sim, SIM_DT, 1000.0);
        assert_eq!(sim.ball_position(BallId::Ball1), Vec2::new(400.0, 150.0));
    }

    #[test]
    fn test_in_bounds_ball_is_never_reset() {
        let mut sim = sim_800x600();
        for i in 0..120 {
            tick(&mut sim, SIM_DT, frame_ms(i));
        }
        for id in BallId::ALL {
            assert!(!sim.resets().is_pending(id));
            assert!(sim.viewport().contains(sim.ball_position(id)));
        }
    }

    #[test]
    fn test_click_pushes_ball_away() {
        let mut sim = sim_800x600();
        let center = sim.ball_position(BallId::Ball1);
        dispatch(&mut sim, InputEvent::Click(center - Vec2::new(10.0, 10.0)));
        tick(&mut sim, SIM_DT, 0.0);

        let vel = sim.ball_velocity(BallId::Ball1);
        assert!(vel.x > 0.0, "pushed right, got {vel}");
        // Beyond what gravity alone gives in one step
        assert!(vel.y > 1000.0 * SIM_DT);
    }

    #[test]
    fn test_click_after_drag_is_ignored() {
        let mut sim = sim_800x600();
        let center = sim.ball_position(BallId::Ball1);
        dispatch(&mut sim, InputEvent::PointerDown(center));
        dispatch(&mut sim, InputEvent::PointerMove(center + Vec2::new(100.0, 0.0)));
        dispatch(&mut sim, InputEvent::PointerUp);
        dispatch(&mut sim, InputEvent::Click(center + Vec2::new(100.0, 0.0)));
        tick(&mut sim, SIM_DT, 0.0);

        assert!(sim.ball_velocity(BallId::Ball1).x.abs() < 1e-3);
    }

    #[test]
    fn test_drag_moves_ball_toward_pointer() {
        let mut sim = sim_800x600();
        let start = sim.ball_position(BallId::Ball1);
        let target = start + Vec2::new(150.0, 0.0);

        dispatch(&mut sim, InputEvent::PointerDown(start));
        dispatch(&mut sim, InputEvent::PointerMove(target));
        for i in 0..30 {
            tick(&mut sim, SIM_DT, frame_ms(i));
        }
        let pos = sim.ball_position(BallId::Ball1);
        assert!(pos.distance(target) < 5.0, "ball at {pos}, pointer at {target}");

        dispatch(&mut sim, InputEvent::PointerUp);
        assert_eq!(sim.drag().grabbed(), None);
    }

    #[test]
    fn test_resize_event_rebuilds_obstacles() {
        let mut sim = sim_800x600();
        let before = sim.ball_position(BallId::Ball2);
        dispatch(&mut sim, InputEvent::Resize(Viewport::new(400.0, 300.0)));
        assert_eq!(sim.viewport(), Viewport::new(400.0, 300.0));
        assert_eq!(sim.obstacles()[5].center(), Vec2::new(300.0, 150.0));
        assert_eq!(sim.ball_position(BallId::Ball2), before);
    }

    #[test]
    fn test_static_ball_override_holds_position() {
        let json = r#"{ "ball": { "options": { "is_static": true } } }"#;
        let settings = SceneSettings::from_json(json).unwrap();
        let mut sim = Simulation::new(settings, Viewport::new(800.0, 600.0));
        for i in 0..30 {
            tick(&mut sim, SIM_DT, frame_ms(i));
        }
        assert_eq!(sim.ball_position(BallId::Ball1), Vec2::new(400.0, 150.0));
        assert_eq!(sim.ball_velocity(BallId::Ball1), Vec2::ZERO);
    }
}
