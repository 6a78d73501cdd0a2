//! Breakthrough Core - Board model and reversible game state
//!
//! This crate provides the game logic for 8x8 Breakthrough:
//! - Squares, pieces and packed actions
//! - Bitboards with non-wrapping shifts
//! - Zobrist-hashed position with an apply/undo delta stack
//! - Legal move generation and terminal detection
//! - Random playouts, static evaluation and simple agents

pub mod types;
pub mod error;
pub mod bitboard;
pub mod zobrist;
pub mod history;
pub mod position;
pub mod playout;
pub mod eval;
pub mod agent;

// Re-exports for convenient access
pub use types::{Action, Color, Piece, Square, MAX_ACTIONS, MAX_PLY, NUM_SQUARES};
pub use error::{CoreError, Result};
pub use bitboard::{Bitboard, Direction};
pub use zobrist::ZobristKeys;
pub use history::{History, StateDelta};
pub use position::Position;
pub use playout::{random_choice, random_playout};
pub use eval::static_eval;
pub use agent::{GreedyAgent, GreedyConfig, RandomAgent};
