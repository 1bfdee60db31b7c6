//! Delayed respawn of balls that left the viewport
//!
//! Each ball has at most one pending reset. Scheduling again while one is
//! pending keeps the earlier deadline, so a ball that stays off screen for
//! many steps is reset once, `delay` after it first left. Pending resets are
//! never cancelled: a ball dragged back into view still snaps home.

use serde::{Deserialize, Serialize};

use super::state::BallId;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResetScheduler {
    /// Deadline (ms) per ball, indexed by `BallId::index`
    pending: [Option<f64>; 2],
}

impl ResetScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a reset of `id` at `now_ms + delay_ms`
    ///
    /// Returns true when this call created the pending reset.
    pub fn schedule(&mut self, id: BallId, now_ms: f64, delay_ms: f64) -> bool {
        let deadline = now_ms + delay_ms;
        let slot = &mut self.pending[id.index()];
        match slot {
            Some(existing) => {
                *existing = existing.min(deadline);
                false
            }
            None => {
                *slot = Some(deadline);
                true
            }
        }
    }

    pub fn deadline(&self, id: BallId) -> Option<f64> {
        self.pending[id.index()]
    }

    pub fn is_pending(&self, id: BallId) -> bool {
        self.pending[id.index()].is_some()
    }

    /// Remove and return every ball whose deadline is at or before `now_ms`
    pub fn take_due(&mut self, now_ms: f64) -> Vec<BallId> {
        BallId::ALL
            .into_iter()
            .filter(|id| {
                let slot = &mut self.pending[id.index()];
                match *slot {
                    Some(deadline) if deadline <= now_ms => {
                        *slot = None;
                        true
                    }
                    _ => false,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reschedule_keeps_earliest() {
        let mut resets = ResetScheduler::new();
        assert!(resets.schedule(BallId::Ball1, 0.0, 1000.0));
        assert!(!resets.schedule(BallId::Ball1, 16.0, 1000.0));
        assert!(!resets.schedule(BallId::Ball1, 33.0, 1000.0));
        assert_eq!(resets.deadline(BallId::Ball1), Some(1000.0));
        assert!(!resets.is_pending(BallId::Ball2));
    }

    #[test]
    fn test_take_due_fires_once() {
        let mut resets = ResetScheduler::new();
        resets.schedule(BallId::Ball1, 0.0, 1000.0);
        resets.schedule(BallId::Ball2, 500.0, 1000.0);

        assert!(resets.take_due(999.0).is_empty());
        assert_eq!(resets.take_due(1000.0), vec![BallId::Ball1]);
        assert!(resets.take_due(1200.0).is_empty());
        assert_eq!(resets.take_due(1500.0), vec![BallId::Ball2]);
        assert!(!resets.is_pending(BallId::Ball2));
    }
}
