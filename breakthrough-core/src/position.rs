//! Position state, move generation and the reversible apply/undo protocol

use std::fmt;
use std::sync::Arc;

use crate::bitboard::Bitboard;
use crate::error::{CoreError, Result};
use crate::history::{History, StateDelta};
use crate::types::{Action, Color, Piece, Square, MAX_ACTIONS, NUM_SQUARES};
use crate::zobrist::ZobristKeys;

/// Debug builds stop at the violation; release builds return the error.
macro_rules! protocol_check {
    ($cond:expr, $err:expr) => {
        if !$cond {
            let err = $err;
            debug_assert!(false, "protocol violation: {}", err);
            return Err(err);
        }
    };
}

// ============================================================================
// POSITION
// ============================================================================

/// A Breakthrough position that is mutated in place.
///
/// `apply` and `undo` must nest like a stack: every `undo` names the most
/// recently applied action still on the history.
#[derive(Clone)]
pub struct Position {
    board: [Piece; NUM_SQUARES],
    by_color: [Bitboard; 2],
    side_to_move: Color,
    ply: u32,
    history: History,
    keys: Arc<ZobristKeys>,
}

impl Position {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    /// Starting layout: white on rows 1-2, black on rows 7-8, white to move
    pub fn new() -> Self {
        Self::with_keys(ZobristKeys::shared())
    }

    pub fn with_keys(keys: Arc<ZobristKeys>) -> Self {
        let mut board = [Piece::Empty; NUM_SQUARES];
        board[..16].fill(Piece::White);
        board[48..].fill(Piece::Black);
        let by_color = [
            Bitboard::row(0) | Bitboard::row(1),
            Bitboard::row(6) | Bitboard::row(7),
        ];
        Self::from_parts(board, by_color, Color::White, keys)
    }

    /// Build a position from eight rank lines, row 8 first, using `W`, `B`
    /// and `.`. Any other characters (rank numbers, spacing) are ignored and
    /// lines without board characters are skipped.
    pub fn from_diagram(diagram: &str, side_to_move: Color) -> Result<Self> {
        let rows: Vec<Vec<Piece>> = diagram
            .lines()
            .map(|line| {
                line.chars()
                    .filter_map(|c| match c {
                        'W' => Some(Piece::White),
                        'B' => Some(Piece::Black),
                        '.' => Some(Piece::Empty),
                        _ => None,
                    })
                    .collect::<Vec<_>>()
            })
            .filter(|row| !row.is_empty())
            .collect();

        if rows.len() != 8 {
            return Err(CoreError::InvalidDiagram(format!(
                "expected 8 rows, found {}",
                rows.len()
            )));
        }

        let mut board = [Piece::Empty; NUM_SQUARES];
        let mut by_color = [Bitboard::EMPTY; 2];
        for (i, row) in rows.iter().enumerate() {
            if row.len() != 8 {
                return Err(CoreError::InvalidDiagram(format!(
                    "row {} has {} squares",
                    8 - i,
                    row.len()
                )));
            }
            for (col, &piece) in row.iter().enumerate() {
                let sq = Square::at(col as u8, 7 - i as u8);
                board[sq.index()] = piece;
                if let Some(color) = piece.color() {
                    by_color[color.index()].toggle(sq);
                }
            }
        }

        Ok(Self::from_parts(board, by_color, side_to_move, ZobristKeys::shared()))
    }

    fn from_parts(
        board: [Piece; NUM_SQUARES],
        by_color: [Bitboard; 2],
        side_to_move: Color,
        keys: Arc<ZobristKeys>,
    ) -> Self {
        let mut position = Self {
            board,
            by_color,
            side_to_move,
            ply: 0,
            history: History::new(0),
            keys,
        };
        let key = position.compute_hash();
        position.history.reset(key);
        position
    }

    /// Back to the starting layout, keeping the key table
    pub fn reset(&mut self) {
        *self = Self::with_keys(Arc::clone(&self.keys));
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    #[inline]
    pub fn piece_at(&self, sq: Square) -> Piece {
        self.board[sq.index()]
    }

    #[inline]
    pub fn pieces(&self, color: Color) -> Bitboard {
        self.by_color[color.index()]
    }

    /// Empty squares
    #[inline]
    pub fn no_pieces(&self) -> Bitboard {
        !(self.by_color[0] | self.by_color[1])
    }

    pub fn board(&self) -> &[Piece; NUM_SQUARES] {
        &self.board
    }

    #[inline]
    pub fn player_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline]
    pub fn ply(&self) -> u32 {
        self.ply
    }

    #[inline]
    pub fn position_hash(&self) -> u64 {
        self.history.top().key
    }

    /// Action that produced this position, `Action::NONE` at the history base
    pub fn last_action(&self) -> Action {
        self.history.top().action
    }

    pub fn last_was_capture(&self) -> bool {
        self.history.top().capture
    }

    pub fn last_delta(&self) -> &StateDelta {
        self.history.top()
    }

    /// Number of applied actions that can be undone
    pub fn history_depth(&self) -> usize {
        self.history.depth()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Hash recomputed from the board; equals `position_hash` at all times.
    pub fn compute_hash(&self) -> u64 {
        let mut key = 0;
        for color in Color::ALL {
            for sq in self.pieces(color) {
                key ^= self.keys.piece(color, sq);
            }
        }
        if self.side_to_move == Color::Black {
            key ^= self.keys.side();
        }
        key
    }

    // ========================================================================
    // TERMINAL DETECTION
    // ========================================================================

    /// The side to move has lost: the opponent already stands on its home
    /// row, or it has no legal action left.
    pub fn is_lost(&self) -> bool {
        let us = self.side_to_move;
        let intruders = self.pieces(us.opponent()) & Bitboard::row(us.home_row());
        intruders.is_not_empty() || !self.has_legal_action()
    }

    fn has_legal_action(&self) -> bool {
        let us = self.side_to_move;
        let ours = self.pieces(us);
        (ours.forward(us) & self.no_pieces()).is_not_empty()
            || (ours.attacks(us) & !ours).is_not_empty()
    }

    // ========================================================================
    // MOVE GENERATION
    // ========================================================================

    /// Legal actions for the side to move. Call only on positions where
    /// `is_lost()` is false.
    pub fn compute_valid_actions(&self) -> Vec<Action> {
        let mut actions = Vec::with_capacity(MAX_ACTIONS);
        self.fill_valid_actions(&mut actions);
        actions
    }

    /// Same as [`compute_valid_actions`](Self::compute_valid_actions),
    /// reusing the caller's buffer.
    pub fn fill_valid_actions(&self, actions: &mut Vec<Action>) {
        actions.clear();
        let us = self.side_to_move;
        let ours = self.pieces(us);
        let empty = self.no_pieces();

        for sq in ours {
            let from = Bitboard::from_square(sq);
            if let Some(ahead) = (from.forward(us) & empty).lsb() {
                actions.push(Action::new(sq, ahead));
            }
            for target in from.attacks(us) & !ours {
                actions.push(Action::new(sq, target));
            }
        }
    }

    /// Whether `action` is among the legal actions of this position
    pub fn is_legal(&self, action: Action) -> bool {
        let us = self.side_to_move;
        if !self.piece_at(action.from_square()).is_color(us) || self.is_lost() {
            return false;
        }
        let from = Bitboard::from_square(action.from_square());
        let targets = (from.forward(us) & self.no_pieces()) | (from.attacks(us) & !self.pieces(us));
        targets.contains(action.to_square())
    }

    // ========================================================================
    // APPLY / UNDO
    // ========================================================================

    /// Play `action` for the side to move and push its delta.
    pub fn apply(&mut self, action: Action) -> Result<()> {
        let us = self.side_to_move;
        let them = us.opponent();
        let from = action.from_square();
        let to = action.to_square();

        protocol_check!(!self.is_lost(), CoreError::GameOver { loser: us });
        protocol_check!(
            self.piece_at(from).is_color(us),
            CoreError::NotMoversPiece { action, mover: us }
        );
        protocol_check!(
            !self.piece_at(to).is_color(us),
            CoreError::SelfCapture { action, mover: us }
        );
        protocol_check!(
            self.piece_at(to).is_empty() || !action.is_straight(),
            CoreError::ForwardBlocked { action }
        );

        let capture = self.piece_at(to).is_color(them);
        let mut key = self.position_hash();
        if capture {
            key ^= self.keys.piece(them, to);
        }
        key ^= self.keys.piece(us, from) ^ self.keys.piece(us, to);
        key ^= self.keys.side();

        // push first so a full history leaves the board untouched
        self.history.push(StateDelta {
            key,
            capture,
            action,
        })?;

        if capture {
            self.remove_piece(them, to);
        }
        self.move_piece(us, from, to);
        self.ply += 1;
        self.side_to_move = them;
        Ok(())
    }

    /// Reverse the most recent `apply`, which must have been `action`.
    pub fn undo(&mut self, action: Action) -> Result<()> {
        protocol_check!(self.history.depth() > 0, CoreError::NothingToUndo);
        let applied = self.history.top().action;
        protocol_check!(
            applied == action,
            CoreError::UndoMismatch {
                requested: action,
                applied
            }
        );

        let delta = self.history.pop()?;
        let from = action.from_square();
        let to = action.to_square();

        self.ply -= 1;
        self.side_to_move = self.side_to_move.opponent();
        let us = self.side_to_move;
        self.move_piece(us, to, from);
        if delta.capture {
            self.put_piece(us.opponent(), to);
        }
        Ok(())
    }

    /// Undo whatever action is on top of the history and return it.
    pub fn undo_last(&mut self) -> Result<Action> {
        protocol_check!(self.history.depth() > 0, CoreError::NothingToUndo);
        let action = self.history.top().action;
        self.undo(action)?;
        Ok(action)
    }

    // ========================================================================
    // BOARD MUTATION HELPERS
    // ========================================================================

    #[inline]
    fn move_piece(&mut self, color: Color, from: Square, to: Square) {
        self.board[from.index()] = Piece::Empty;
        self.board[to.index()] = Piece::of(color);
        self.by_color[color.index()] ^= Bitboard::from_square(from) | Bitboard::from_square(to);
    }

    #[inline]
    fn remove_piece(&mut self, color: Color, sq: Square) {
        self.board[sq.index()] = Piece::Empty;
        self.by_color[color.index()].toggle(sq);
    }

    #[inline]
    fn put_piece(&mut self, color: Color, sq: Square) {
        self.board[sq.index()] = Piece::of(color);
        self.by_color[color.index()].toggle(sq);
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = match self.side_to_move {
            Color::White => "white",
            Color::Black => "black",
        };
        writeln!(f, "ply {}, {} to play", self.ply, side)?;
        for row in (0..8).rev() {
            write!(f, "{}  ", row + 1)?;
            for col in 0..8 {
                write!(f, " {} ", self.piece_at(Square::at(col, row)).symbol())?;
            }
            writeln!(f)?;
        }
        writeln!(f, "    a  b  c  d  e  f  g  h")
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Position {{ hash: {:#018x} }}", self.position_hash())?;
        write!(f, "{}", self)
    }
}

// ============================================================================
// TESTS
// ============================================================================
