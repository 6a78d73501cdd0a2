//! Error types for the search engine

use breakthrough_core::{Color, CoreError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MctsError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("no search from a finished game ({loser} has lost)")]
    RootIsTerminal { loser: Color },

    #[error("position {0:016x} has not been searched")]
    NotSearched(u64),

    #[error("failed to write search graph: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience Result type for search operations
pub type Result<T> = std::result::Result<T, MctsError>;
