//! Non-search agents: uniform random and epsilon-greedy playout sampling

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::bitboard::Bitboard;
use crate::error::{CoreError, Result};
use crate::eval::static_eval;
use crate::playout::{random_choice, random_playout};
use crate::position::Position;
use crate::types::Action;

/// Ply after which the exploration rate is halved
const LATE_GAME_PLY: u32 = 32;

// ============================================================================
// RANDOM AGENT
// ============================================================================

/// Plays a uniformly random legal action
pub struct RandomAgent {
    rng: ChaCha8Rng,
    buffer: Vec<Action>,
}

impl RandomAgent {
    pub fn new(rng: ChaCha8Rng) -> Self {
        Self {
            rng,
            buffer: Vec::new(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::new(ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn best_action(&mut self, position: &Position) -> Result<Action> {
        if position.is_lost() {
            return Err(CoreError::GameOver {
                loser: position.player_to_move(),
            });
        }
        position.fill_valid_actions(&mut self.buffer);
        random_choice(&self.buffer, &mut self.rng)
    }
}

// ============================================================================
// EPSILON-GREEDY AGENT
// ============================================================================

/// Settings for [`GreedyAgent`]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GreedyConfig {
    /// Probability of sampling a random root action instead of the leader
    pub epsilon: f64,
    /// Playouts spent after the warm-up
    pub iterations: u32,
    /// Playouts per root action before the epsilon-greedy loop starts
    pub warmup_samples: u32,
}

impl Default for GreedyConfig {
    fn default() -> Self {
        Self {
            epsilon: 0.3,
            iterations: 5000,
            warmup_samples: 20,
        }
    }
}

impl GreedyConfig {
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_warmup_samples(mut self, warmup_samples: u32) -> Self {
        self.warmup_samples = warmup_samples;
        self
    }
}

/// Running statistics of one root action
#[derive(Clone, Copy, Debug)]
struct RootAction {
    action: Action,
    prior: f64,
    total: f64,
    visits: u32,
}

impl RootAction {
    fn score(&self) -> f64 {
        (self.prior + self.total) / (f64::from(self.visits) + 1.0)
    }
}

/// Flat Monte Carlo agent: each root action starts from a static-evaluation
/// prior and is refined by random playouts, mostly spent on the current
/// leader.
pub struct GreedyAgent {
    config: GreedyConfig,
    rng: ChaCha8Rng,
    roots: Vec<RootAction>,
    buffer: Vec<Action>,
}

impl GreedyAgent {
    pub fn new(config: GreedyConfig, rng: ChaCha8Rng) -> Self {
        Self {
            config,
            rng,
            roots: Vec::new(),
            buffer: Vec::new(),
        }
    }

    pub fn with_seed(config: GreedyConfig, seed: u64) -> Self {
        Self::new(config, ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn config(&self) -> &GreedyConfig {
        &self.config
    }

    /// Choose an action for the side to move. The position is used as
    /// scratch space and is restored before returning.
    pub fn best_action(&mut self, position: &mut Position) -> Result<Action> {
        if position.is_lost() {
            return Err(CoreError::GameOver {
                loser: position.player_to_move(),
            });
        }
        let actions = position.compute_valid_actions();

        if let Some(action) = winning_action(position, &actions) {
            tracing::debug!("greedy: immediate win {}", action);
            return Ok(action);
        }
        if let Some(action) = self.capture_intruder(position, &actions) {
            tracing::debug!("greedy: capturing intruder with {}", action);
            return Ok(action);
        }

        self.setup_roots(position, &actions)?;
        let mut best = self.leader();

        let epsilon = if position.ply() < LATE_GAME_PLY {
            self.config.epsilon
        } else {
            self.config.epsilon / 2.0
        };

        for _ in 0..self.config.iterations {
            let i = if self.rng.gen_bool(epsilon.clamp(0.0, 1.0)) {
                self.rng.gen_range(0..self.roots.len())
            } else {
                best
            };
            let reward = random_playout(position, self.roots[i].action, &mut self.rng, &mut self.buffer)?;
            let root = &mut self.roots[i];
            root.total += reward;
            root.visits += 1;
            if self.roots[i].score() > self.roots[best].score() {
                best = i;
            }
        }

        for root in &self.roots {
            tracing::debug!(
                "greedy: {} visits={} prior={:.3} score={:.3}",
                root.action,
                root.visits,
                root.prior,
                root.score()
            );
        }
        Ok(self.roots[best].action)
    }

    /// Intruders one step from our home row must be taken if we can.
    fn capture_intruder(&mut self, position: &Position, actions: &[Action]) -> Option<Action> {
        let us = position.player_to_move();
        let critical_row = Bitboard::row(us.home_row()).forward(us);
        let intruders = position.pieces(us.opponent()) & critical_row;
        if intruders.is_empty() {
            return None;
        }
        let captures: Vec<Action> = actions
            .iter()
            .copied()
            .filter(|a| intruders.contains(a.to_square()))
            .collect();
        captures.choose(&mut self.rng).copied()
    }

    fn setup_roots(&mut self, position: &mut Position, actions: &[Action]) -> Result<()> {
        self.roots.clear();
        for &action in actions {
            position.apply(action)?;
            let prior = 1.0 - static_eval(position);
            position.undo(action)?;

            let mut total = 0.0;
            for _ in 0..self.config.warmup_samples {
                total += random_playout(position, action, &mut self.rng, &mut self.buffer)?;
            }
            self.roots.push(RootAction {
                action,
                prior,
                total,
                visits: self.config.warmup_samples,
            });
        }
        Ok(())
    }

    fn leader(&self) -> usize {
        let mut best = 0;
        for (i, root) in self.roots.iter().enumerate() {
            if root.score() > self.roots[best].score() {
                best = i;
            }
        }
        best
    }
}

/// An action that lands on our goal row, if any
fn winning_action(position: &Position, actions: &[Action]) -> Option<Action> {
    let goal = position.player_to_move().goal_row();
    actions.iter().copied().find(|a| a.to_square().row() == goal)
}
