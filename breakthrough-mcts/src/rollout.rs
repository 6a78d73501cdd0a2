//! Rollout (simulation) sampling for MCTS

use breakthrough_core::{random_playout, Action, Position};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::Result;

/// Owns the search's random stream and a reusable move buffer.
pub struct RolloutEngine {
    rng: ChaCha8Rng,
    buffer: Vec<Action>,
    rollouts: u64,
}

impl RolloutEngine {
    pub fn new(rng: ChaCha8Rng) -> Self {
        Self {
            rng,
            buffer: Vec::new(),
            rollouts: 0,
        }
    }

    /// Seeded engine, or one seeded from entropy when `seed` is `None`
    pub fn from_seed(seed: Option<u64>) -> Self {
        Self::new(match seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_entropy(),
        })
    }

    /// Average reward of `count` random playouts starting with `action`,
    /// from the point of view of the side playing it. Zero when `count` is 0.
    pub fn sample(&mut self, position: &mut Position, action: Action, count: u32) -> Result<f64> {
        if count == 0 {
            return Ok(0.0);
        }
        let mut total = 0.0;
        for _ in 0..count {
            total += random_playout(position, action, &mut self.rng, &mut self.buffer)?;
        }
        self.rollouts += u64::from(count);
        Ok(total / f64::from(count))
    }

    /// Playouts run since creation or the last reset
    pub fn rollouts(&self) -> u64 {
        self.rollouts
    }

    pub fn reset_counter(&mut self) {
        self.rollouts = 0;
    }
}
