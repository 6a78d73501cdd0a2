//! Undo history: a preallocated stack of position deltas

use crate::error::{CoreError, Result};
use crate::types::{Action, MAX_PLY};

/// What one applied action changed, enough to reverse it.
///
/// The delta below it on the stack is the previous position's delta, so the
/// stack index doubles as the back-link.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StateDelta {
    /// Position hash after the action
    pub key: u64,
    /// Whether the action removed an opposing piece
    pub capture: bool,
    /// The action that produced this position (`Action::NONE` at the base)
    pub action: Action,
}

impl StateDelta {
    fn root(key: u64) -> Self {
        Self {
            key,
            capture: false,
            action: Action::NONE,
        }
    }
}

/// Arena of deltas sized for [`MAX_PLY`] actions. Only `push` and `pop`
/// mutate it; the base entry describes the position the history started from.
#[derive(Clone, Debug)]
pub struct History {
    deltas: Vec<StateDelta>,
}

impl History {
    pub fn new(root_key: u64) -> Self {
        let mut deltas = Vec::with_capacity(MAX_PLY + 1);
        deltas.push(StateDelta::root(root_key));
        Self { deltas }
    }

    pub fn reset(&mut self, root_key: u64) {
        self.deltas.clear();
        self.deltas.push(StateDelta::root(root_key));
    }

    pub fn push(&mut self, delta: StateDelta) -> Result<()> {
        if self.depth() >= MAX_PLY {
            return Err(CoreError::PlyLimitExceeded(MAX_PLY));
        }
        self.deltas.push(delta);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<StateDelta> {
        if self.depth() == 0 {
            return Err(CoreError::NothingToUndo);
        }
        self.deltas.pop().ok_or(CoreError::NothingToUndo)
    }

    /// Newest delta (the base entry when nothing has been applied)
    #[inline]
    pub fn top(&self) -> &StateDelta {
        // never empty: the base entry is only replaced, not popped
        &self.deltas[self.deltas.len() - 1]
    }

    /// Delta of the position before the newest one
    pub fn previous(&self) -> Option<&StateDelta> {
        self.deltas.len().checked_sub(2).map(|i| &self.deltas[i])
    }

    /// Number of actions that can still be undone
    #[inline]
    pub fn depth(&self) -> usize {
        self.deltas.len() - 1
    }

    /// Applied actions, oldest first
    pub fn actions(&self) -> impl Iterator<Item = Action> + '_ {
        self.deltas.iter().skip(1).map(|d| d.action)
    }
}
