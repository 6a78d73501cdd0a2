//! Uniform random move choice and random playouts

use rand::Rng;

use crate::error::{CoreError, Result};
use crate::position::Position;
use crate::types::Action;

/// Pick one action uniformly at random
pub fn random_choice<R: Rng + ?Sized>(actions: &[Action], rng: &mut R) -> Result<Action> {
    if actions.is_empty() {
        return Err(CoreError::EmptyActionList);
    }
    Ok(actions[rng.gen_range(0..actions.len())])
}

/// Play `first`, then uniformly random actions until the game ends, and
/// rewind the position to where it started.
///
/// Returns 1.0 if the side that played `first` won the playout and 0.0
/// otherwise. `buffer` is scratch space for move generation.
pub fn random_playout<R: Rng + ?Sized>(
    position: &mut Position,
    first: Action,
    rng: &mut R,
    buffer: &mut Vec<Action>,
) -> Result<f64> {
    let start = position.history_depth();
    position.apply(first)?;

    let outcome = play_to_end(position, rng, buffer);

    // the side that moved last won; walk back to the side that played `first`
    let mut reward = 1.0;
    while position.history_depth() > start + 1 {
        position.undo_last()?;
        reward = 1.0 - reward;
    }
    position.undo(first)?;

    outcome.map(|()| reward)
}

fn play_to_end<R: Rng + ?Sized>(
    position: &mut Position,
    rng: &mut R,
    buffer: &mut Vec<Action>,
) -> Result<()> {
    while !position.is_lost() {
        position.fill_valid_actions(buffer);
        let action = random_choice(buffer, rng)?;
        position.apply(action)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Color;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_random_choice_empty() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(random_choice(&[], &mut rng), Err(CoreError::EmptyActionList));
    }

    #[test]
    fn test_random_choice_covers_list() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let actions = Position::new().compute_valid_actions();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1000 {
            seen.insert(random_choice(&actions, &mut rng).unwrap());
        }
        assert_eq!(seen.len(), actions.len());
    }

    #[test]
    fn test_playout_restores_position() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut pos = Position::new();
        let mut buffer = Vec::new();
        let hash = pos.position_hash();
        let board = *pos.board();

        for action in pos.compute_valid_actions() {
            let reward = random_playout(&mut pos, action, &mut rng, &mut buffer).unwrap();
            assert!(reward == 0.0 || reward == 1.0);
            assert_eq!(pos.position_hash(), hash);
            assert_eq!(*pos.board(), board);
            assert_eq!(pos.history_depth(), 0);
        }
    }

    #[test]
    fn test_winning_first_action_scores_one() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut pos = Position::from_diagram(
            "
            . . . . . . . .
            W . . . . . . .
            . . . . . . . .
            . . . . . . . .
            . . . . . . . .
            . . . . . . . .
            . . . . . . . B
            . . . . . . . .
            ",
            Color::White,
        )
        .unwrap();
        let mut buffer = Vec::new();
        let win = "a7a8".parse().unwrap();
        assert_eq!(random_playout(&mut pos, win, &mut rng, &mut buffer).unwrap(), 1.0);
    }

    #[test]
    fn test_forced_loss_scores_zero() {
        // black wins next move whatever white does
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut pos = Position::from_diagram(
            "
            . . . . . . . .
            . . . . . . . .
            . . . . . . . .
            . . . . . . . .
            . . . . . . . .
            . . . . . . . .
            . . . . B . . .
            W . . . . . . .
            ",
            Color::White,
        )
        .unwrap();
        let mut buffer = Vec::new();
        let step = "a1a2".parse().unwrap();
        assert_eq!(random_playout(&mut pos, step, &mut rng, &mut buffer).unwrap(), 0.0);
    }
}
