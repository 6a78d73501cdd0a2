//! Engine configuration loaded from JSON
//!
//! Level 4 - Utilities and configuration

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use breakthrough_core::GreedyConfig;
use breakthrough_mcts::MctsConfig;

/// Settings shared by every subcommand. Missing keys take their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// MCTS iterations per move
    pub iterations: u32,
    /// UCB1 exploration constant
    #[serde(alias = "exp_cst")]
    pub exploration: f64,
    /// Playouts used to seed each new edge
    #[serde(alias = "init_samples")]
    pub initial_samples: u32,

    /// Write the search graph after each move in `dump-tree`
    pub dump_tree: bool,
    #[serde(alias = "jsontree_datadir")]
    pub tree_dir: PathBuf,
    #[serde(alias = "jsontree_fn")]
    pub tree_prefix: String,
    /// Node limit per exported graph
    pub max_nodes: usize,

    /// Greedy agent exploration rate
    pub epsilon: f64,
    /// Greedy agent playouts per move
    pub greedy_iterations: u32,

    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            iterations: 300,
            exploration: 1.4,
            initial_samples: 1,
            dump_tree: false,
            tree_dir: PathBuf::from("view/data/jsontree"),
            tree_prefix: "jsontree_ply_".to_string(),
            max_nodes: 1000,
            epsilon: 0.3,
            greedy_iterations: 5000,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Read a JSON config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: EngineConfig = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        tracing::info!("Loaded config from {}", path.display());
        tracing::debug!("{:?}", config);
        Ok(config)
    }

    /// `load(path)` when a path is given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn mcts(&self) -> MctsConfig {
        MctsConfig {
            iterations: self.iterations,
            exploration: self.exploration,
            initial_samples: self.initial_samples,
            seed: self.seed,
        }
    }

    pub fn greedy(&self) -> GreedyConfig {
        GreedyConfig::default()
            .with_epsilon(self.epsilon)
            .with_iterations(self.greedy_iterations)
    }

    /// File the graph after `ply` is written to
    pub fn tree_path(&self, ply: u32) -> PathBuf {
        self.tree_dir.join(format!("{}{}.json", self.tree_prefix, ply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_gives_defaults() {
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_legacy_key_names() {
        let config: EngineConfig = serde_json::from_str(
            r#"{
                "iterations": 1000,
                "exp_cst": 0.7,
                "init_samples": 4,
                "dump_tree": true,
                "jsontree_datadir": "out/trees",
                "jsontree_fn": "tree_",
                "max_nodes": 50
            }"#,
        )
        .unwrap();
        assert_eq!(config.iterations, 1000);
        assert_eq!(config.exploration, 0.7);
        assert_eq!(config.initial_samples, 4);
        assert!(config.dump_tree);
        assert_eq!(config.tree_path(12), PathBuf::from("out/trees/tree_12.json"));
        assert_eq!(config.max_nodes, 50);
        assert_eq!(config.epsilon, 0.3);
    }

    #[test]
    fn test_mcts_config_mapping() {
        let config = EngineConfig {
            iterations: 42,
            seed: Some(9),
            ..Default::default()
        };
        let mcts = config.mcts();
        assert_eq!(mcts.iterations, 42);
        assert_eq!(mcts.exploration, 1.4);
        assert_eq!(mcts.seed, Some(9));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(EngineConfig::load(Path::new("/nonexistent/breakthrough.json")).is_err());
        assert_eq!(EngineConfig::load_or_default(None).unwrap(), EngineConfig::default());
    }
}
