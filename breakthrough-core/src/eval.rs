//! Static position evaluation

use crate::bitboard::{Bitboard, Direction};
use crate::position::Position;
use crate::types::{Color, Square};

/// Score when the side to move has a runner one step from its goal row
pub const WIN_SCORE: f64 = 1.0;
/// Score when the opponent has an unstoppable runner one step away
pub const LOSS_SCORE: f64 = 0.0;
/// Score when the side to move has a free runner two steps away
const NEAR_WIN_SCORE: f64 = 0.8;

/// A runner is a pawn whose forward cone holds fewer than this many enemies.
const RUNNER_BLOCKERS: u32 = 2;

/// Evaluate `position` from the side to move's point of view, in [0, 1].
///
/// Runner races are checked first, then the score blends material balance,
/// pawn structure (side-by-side phalanxes and pawns backed from behind) and
/// levers covered at least as often as they are attacked.
pub fn static_eval(position: &Position) -> f64 {
    let us = position.player_to_move();
    let them = us.opponent();

    let ours = side_summary(position, us);
    if ours.fastest_win == 1 {
        return WIN_SCORE;
    }
    let theirs = side_summary(position, them);
    // they need one more ply since we move first
    let their_fastest = theirs.fastest_win.saturating_add(1);
    if their_fastest == 2 {
        return LOSS_SCORE;
    }
    if ours.fastest_win == 3 {
        return NEAR_WIN_SCORE;
    }

    let my_count = f64::from(ours.count);
    let their_count = f64::from(theirs.count);
    if my_count + their_count == 0.0 {
        return 0.5;
    }
    let material = 0.5 + (my_count - their_count) / (2.0 * (my_count + their_count));
    let structure = 0.5 + ours.structure_ratio() / 2.0 - theirs.structure_ratio() / 2.0;

    let score = if their_fastest == 4 {
        0.35 * 0.33 + 0.33 * material + 0.33 * structure
    } else {
        let levers = 0.5 + f64::from(ours.levers - theirs.levers) / 64.0;
        0.2 * levers + 0.3 * structure + 0.5 * material
    };
    score.clamp(0.0, 1.0)
}

struct SideSummary {
    count: u32,
    /// Plies to the goal row of the fastest runner, `u32::MAX` if none
    fastest_win: u32,
    structure: i32,
    levers: i32,
}

impl SideSummary {
    /// Structure points relative to the maximum, in [-0.5, 0.5]
    fn structure_ratio(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let max = f64::from(3 * self.count);
        (2.0 * f64::from(self.structure) - max) / (2.0 * max)
    }
}

fn side_summary(position: &Position, color: Color) -> SideSummary {
    let own = position.pieces(color);
    let enemy = position.pieces(color.opponent());
    let mut summary = SideSummary {
        count: own.popcount(),
        fastest_win: u32::MAX,
        structure: 0,
        levers: 0,
    };

    for sq in own {
        if (Bitboard::span(color, sq) & enemy).popcount() < RUNNER_BLOCKERS {
            let plies = 7 - u32::from(color.relative_row(sq.row()));
            summary.fastest_win = summary.fastest_win.min(plies);
        }
        let bb = Bitboard::from_square(sq);
        if (bb.shift(Direction::Left) & own).is_not_empty() {
            summary.structure += 2;
        }
        if (bb.forward(color) & own).is_not_empty() {
            summary.structure += 1;
        }
        if protected_lever(position, color, sq) {
            summary.levers += 2;
        }
    }
    summary
}

/// The pawn on `sq` is guarded by at least as many friendly pawns as there
/// are enemy pawns attacking it.
fn protected_lever(position: &Position, color: Color, sq: Square) -> bool {
    let guards = Bitboard::attackers(color, sq) & position.pieces(color);
    let attackers = Bitboard::attackers(color.opponent(), sq) & position.pieces(color.opponent());
    guards.popcount() >= attackers.popcount()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_position_is_balanced() {
        let score = static_eval(&Position::new());
        assert!((score - 0.5).abs() < 1e-9, "score = {}", score);
    }

    #[test]
    fn test_runner_one_step_away_wins() {
        let pos = Position::from_diagram(
            "
            . . . . . . . .
            . . W . . . . .
            . . . . . . . .
            . . . . . . . .
            . . . . . . . .
            . . . . . B . .
            . . . . . . . .
            . . . . . . . .
            ",
            Color::White,
        )
        .unwrap();
        assert_eq!(static_eval(&pos), WIN_SCORE);
    }

    #[test]
    fn test_enemy_runner_one_step_away_loses() {
        let pos = Position::from_diagram(
            "
            . . . . . . . .
            . . . . . . . .
            . . . . . . . .
            . . . . . . . .
            . . . . . . . .
            . . . . W . . .
            . B . . . . . .
            . . . . . . . .
            ",
            Color::White,
        )
        .unwrap();
        assert_eq!(static_eval(&pos), LOSS_SCORE);
    }

    #[test]
    fn test_material_advantage_scores_higher() {
        let mut pos = Position::from_diagram(
            "
            . . . . . . . .
            B B B . . B B B
            . . . . . . . .
            . . . . . . . .
            . . . . . . . .
            . . . . . . . .
            W W W W W W W W
            . . . . . . . .
            ",
            Color::White,
        )
        .unwrap();
        let ahead = static_eval(&pos);
        assert!(ahead > 0.5, "score = {}", ahead);

        pos.apply("a2a3".parse().unwrap()).unwrap();
        let behind = static_eval(&pos);
        assert!(behind < 0.5, "score = {}", behind);
    }

    #[test]
    fn test_score_stays_in_range() {
        use rand::prelude::*;
        use rand_chacha::ChaCha8Rng;

        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut pos = Position::new();
        while !pos.is_lost() {
            let score = static_eval(&pos);
            assert!((0.0..=1.0).contains(&score));
            let actions = pos.compute_valid_actions();
            pos.apply(*actions.choose(&mut rng).unwrap()).unwrap();
        }
    }
}
