//! Agents selectable from the command line

use std::fmt;

use anyhow::Result;
use clap::ValueEnum;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use breakthrough_core::{Action, GreedyAgent, Position, RandomAgent};
use breakthrough_mcts::Mcts;

use crate::config::EngineConfig;

/// Player type for games
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum PlayerType {
    /// Monte Carlo Tree Search over a transposition graph
    #[default]
    Mcts,
    /// Epsilon-greedy flat playout sampling
    Greedy,
    /// Uniformly random legal actions
    Random,
}

impl fmt::Display for PlayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlayerType::Mcts => "mcts",
            PlayerType::Greedy => "greedy",
            PlayerType::Random => "random",
        };
        f.write_str(name)
    }
}

/// A configured agent ready to play one game
pub enum Player {
    Mcts(Box<Mcts>),
    Greedy(GreedyAgent),
    Random(RandomAgent),
}

impl Player {
    /// Build an agent; `seed` overrides the config's seed.
    pub fn new(kind: PlayerType, config: &EngineConfig, seed: Option<u64>) -> Self {
        let seed = seed.or(config.seed);
        match kind {
            PlayerType::Mcts => {
                let mut mcts = config.mcts();
                mcts.seed = seed;
                Player::Mcts(Box::new(Mcts::with_config(mcts)))
            }
            PlayerType::Greedy => Player::Greedy(GreedyAgent::new(config.greedy(), create_rng(seed))),
            PlayerType::Random => Player::Random(RandomAgent::new(create_rng(seed))),
        }
    }

    pub fn kind(&self) -> PlayerType {
        match self {
            Player::Mcts(_) => PlayerType::Mcts,
            Player::Greedy(_) => PlayerType::Greedy,
            Player::Random(_) => PlayerType::Random,
        }
    }

    /// Choose an action for the side to move; `position` is left unchanged.
    pub fn best_action(&mut self, position: &mut Position) -> Result<Action> {
        let action = match self {
            Player::Mcts(mcts) => mcts.best_action(position)?,
            Player::Greedy(agent) => agent.best_action(position)?,
            Player::Random(agent) => agent.best_action(position)?,
        };
        Ok(action)
    }

    /// Forget per-game state
    pub fn reset(&mut self) {
        if let Player::Mcts(mcts) = self {
            mcts.reset();
        }
    }

    pub fn as_mcts(&self) -> Option<&Mcts> {
        match self {
            Player::Mcts(mcts) => Some(&**mcts),
            _ => None,
        }
    }
}

/// Create RNG from seed or random
pub fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_config() -> EngineConfig {
        EngineConfig {
            iterations: 20,
            greedy_iterations: 50,
            ..Default::default()
        }
    }

    #[test]
    fn test_every_player_type_plays_legally() {
        for kind in [PlayerType::Mcts, PlayerType::Greedy, PlayerType::Random] {
            let mut player = Player::new(kind, &quick_config(), Some(1));
            assert_eq!(player.kind(), kind);
            let mut pos = Position::new();
            let action = player.best_action(&mut pos).unwrap();
            assert!(pos.is_legal(action), "{} played {}", kind, action);
            assert_eq!(pos.history_depth(), 0);
        }
    }

    #[test]
    fn test_player_type_names() {
        assert_eq!(PlayerType::Mcts.to_string(), "mcts");
        assert_eq!(PlayerType::from_str("greedy", true).unwrap(), PlayerType::Greedy);
    }

    #[test]
    fn test_reset_clears_search_graph() {
        let mut player = Player::new(PlayerType::Mcts, &quick_config(), Some(2));
        let mut pos = Position::new();
        player.best_action(&mut pos).unwrap();
        assert!(!player.as_mcts().unwrap().graph().is_empty());
        player.reset();
        assert!(player.as_mcts().unwrap().graph().is_empty());
    }
}
