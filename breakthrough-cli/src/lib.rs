//! Breakthrough CLI - turn loop, arena and tree dumping
//!
//! Commands:
//! - play: answer moves over the line-based turn protocol
//! - arena: play a series of games between two agents
//! - dump-tree: write the MCTS graph after every move of a game

pub mod config;
pub mod player;
pub mod play;
pub mod arena;
pub mod dump_tree;

pub use config::EngineConfig;
pub use player::{create_rng, Player, PlayerType};
