//! Squares, colors, pieces and packed actions

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ============================================================================
// CONSTANTS
// ============================================================================

pub const WIDTH: u8 = 8;
pub const HEIGHT: u8 = 8;
pub const NUM_SQUARES: usize = 64;

/// Longest game the history arena can hold. Every action advances one pawn
/// by a row, so a real game never gets close.
pub const MAX_PLY: usize = 256;

/// Upper bound on legal actions in any position (16 pawns, 3 targets each)
pub const MAX_ACTIONS: usize = 48;

// ============================================================================
// COLOR / PIECE
// ============================================================================

/// Side to move. White starts on rows 1-2 and advances towards row 8.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    White = 0,
    Black = 1,
}

impl Color {
    pub const ALL: [Color; 2] = [Color::White, Color::Black];

    pub fn opponent(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Row this color starts from; the opponent wins by reaching it.
    pub fn home_row(self) -> u8 {
        match self {
            Color::White => 0,
            Color::Black => 7,
        }
    }

    /// Row this color must reach to win.
    pub fn goal_row(self) -> u8 {
        self.opponent().home_row()
    }

    /// Row index as seen from this color's side (0 = own home row).
    pub fn relative_row(self, row: u8) -> u8 {
        match self {
            Color::White => row,
            Color::Black => 7 - row,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "WHITE"),
            Color::Black => write!(f, "BLACK"),
        }
    }
}

/// Content of a square
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Piece {
    White,
    Black,
    #[default]
    Empty,
}

impl Piece {
    pub fn of(color: Color) -> Self {
        match color {
            Color::White => Piece::White,
            Color::Black => Piece::Black,
        }
    }

    pub fn color(self) -> Option<Color> {
        match self {
            Piece::White => Some(Color::White),
            Piece::Black => Some(Color::Black),
            Piece::Empty => None,
        }
    }

    pub fn is_color(self, color: Color) -> bool {
        self.color() == Some(color)
    }

    pub fn is_empty(self) -> bool {
        self == Piece::Empty
    }

    pub fn symbol(self) -> char {
        match self {
            Piece::White => 'W',
            Piece::Black => 'B',
            Piece::Empty => '.',
        }
    }
}

// ============================================================================
// SQUARE
// ============================================================================

/// Board square, `column + 8 * row`; a1 = 0, h8 = 63.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Square(u8);

impl Square {
    pub const fn new(index: u8) -> Self {
        debug_assert!(index < 64);
        Square(index)
    }

    pub const fn at(column: u8, row: u8) -> Self {
        Square::new(column + row * WIDTH)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub const fn column(self) -> u8 {
        self.0 & 7
    }

    pub const fn row(self) -> u8 {
        self.0 >> 3
    }

    pub fn all() -> impl Iterator<Item = Square> {
        (0..NUM_SQUARES as u8).map(Square)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.column()) as char, (b'1' + self.row()) as char)
    }
}

impl FromStr for Square {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.as_bytes() {
            [c @ b'a'..=b'h', r @ b'1'..=b'8'] => Ok(Square::at(c - b'a', r - b'1')),
            _ => Err(CoreError::InvalidSquare(s.to_string())),
        }
    }
}

// ============================================================================
// ACTION
// ============================================================================

/// A move packed into 16 bits: source square in the low byte, destination
/// in the high byte. Whether it is a capture depends on the position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Action(u16);

impl Action {
    /// a1a1, never legal
    pub const NONE: Action = Action(0);

    pub const fn new(from: Square, to: Square) -> Self {
        Action(from.0 as u16 | (to.0 as u16) << 8)
    }

    pub const fn from_square(self) -> Square {
        Square((self.0 & 0x3f) as u8)
    }

    pub const fn to_square(self) -> Square {
        Square((self.0 >> 8) as u8)
    }

    pub const fn is_none(self) -> bool {
        self.0 == Action::NONE.0
    }

    pub const fn raw(self) -> u16 {
        self.0
    }

    /// True when source and destination share a column
    pub const fn is_straight(self) -> bool {
        self.from_square().column() == self.to_square().column()
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from_square(), self.to_square())
    }
}

impl FromStr for Action {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() != 4 || !s.is_ascii() {
            return Err(CoreError::InvalidAction(s.to_string()));
        }
        let from: Square = s[..2]
            .parse()
            .map_err(|_| CoreError::InvalidAction(s.to_string()))?;
        let to: Square = s[2..]
            .parse()
            .map_err(|_| CoreError::InvalidAction(s.to_string()))?;
        Ok(Action::new(from, to))
    }
}

impl Serialize for Action {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// TESTS
// ============================================================================
