//! Error types for board and position operations

use thiserror::Error;

use crate::types::{Action, Color};

/// Errors raised by the board model and the reversible mutation protocol.
///
/// Protocol violations are also `debug_assert!`ed at the point of detection,
/// so a debug build stops right there while a release build hands the error
/// back to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid square: {0:?}")]
    InvalidSquare(String),

    #[error("invalid action: {0:?}")]
    InvalidAction(String),

    #[error("invalid board diagram: {0}")]
    InvalidDiagram(String),

    #[error("{action}: source square does not hold a {mover} piece")]
    NotMoversPiece { action: Action, mover: Color },

    #[error("{action}: destination holds a {mover} piece")]
    SelfCapture { action: Action, mover: Color },

    #[error("{action}: straight moves cannot capture")]
    ForwardBlocked { action: Action },

    #[error("the game is already over ({loser} has lost)")]
    GameOver { loser: Color },

    #[error("undo called with an empty history")]
    NothingToUndo,

    #[error("undo of {requested} does not match the last applied action {applied}")]
    UndoMismatch { requested: Action, applied: Action },

    #[error("ply limit of {0} exceeded")]
    PlyLimitExceeded(usize),

    #[error("cannot pick an action from an empty list")]
    EmptyActionList,
}

/// Convenience Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
