//! Breakthrough MCTS - Monte Carlo Tree Search over a transposition graph
//!
//! This crate provides the search engine:
//! - Search graph keyed by position hash (transpositions share one node)
//! - Tree policy (UCB1)
//! - Expansion seeded by random playouts
//! - Backpropagation by undoing the selection path
//! - JSON export of the visited graph

pub mod error;
pub mod graph;
pub mod rollout;
pub mod search;
pub mod export;

use serde::{Deserialize, Serialize};

pub use error::{MctsError, Result};
pub use graph::{Edge, Node, NodeId, SearchGraph};
pub use rollout::RolloutEngine;
pub use search::{Mcts, RootStatistics, SearchStats};
pub use export::{export_graph, write_json, EdgeRecord, NodeRecord, TreeDump};

/// MCTS configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MctsConfig {
    /// Search iterations per call to `best_action`
    pub iterations: u32,
    /// UCB1 exploration constant
    pub exploration: f64,
    /// Random playouts averaged to seed each new edge
    pub initial_samples: u32,
    /// Rollout seed, entropy when `None`
    pub seed: Option<u64>,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            iterations: 300,
            exploration: 1.4,
            initial_samples: 1,
            seed: None,
        }
    }
}

impl MctsConfig {
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_exploration(mut self, exploration: f64) -> Self {
        self.exploration = exploration;
        self
    }

    pub fn with_initial_samples(mut self, initial_samples: u32) -> Self {
        self.initial_samples = initial_samples;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
