//! 64-bit square sets with non-wrapping geometric shifts

use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Not};

use crate::types::{Color, Square};

/// A set of squares, bit `n` standing for `Square::new(n)`.
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Bitboard(pub u64);

/// Single-step directions on the board
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
}

impl Bitboard {
    pub const EMPTY: Bitboard = Bitboard(0);
    pub const ALL: Bitboard = Bitboard(!0u64);

    pub const COL_A: Bitboard = Bitboard(0x0101_0101_0101_0101);
    pub const COL_H: Bitboard = Bitboard(0x8080_8080_8080_8080);
    pub const ROW_1: Bitboard = Bitboard(0x0000_0000_0000_00FF);
    pub const ROW_8: Bitboard = Bitboard(0xFF00_0000_0000_0000);

    #[inline]
    pub const fn from_square(sq: Square) -> Self {
        Bitboard(1u64 << sq.index())
    }

    #[inline]
    pub const fn column(col: u8) -> Self {
        Bitboard(Self::COL_A.0 << col)
    }

    #[inline]
    pub const fn row(row: u8) -> Self {
        Bitboard(Self::ROW_1.0 << (8 * row))
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_not_empty(self) -> bool {
        self.0 != 0
    }

    #[inline]
    pub const fn contains(self, sq: Square) -> bool {
        (self.0 >> sq.index()) & 1 == 1
    }

    #[inline]
    pub fn toggle(&mut self, sq: Square) {
        self.0 ^= 1u64 << sq.index();
    }

    #[inline]
    pub const fn popcount(self) -> u32 {
        self.0.count_ones()
    }

    /// Lowest set square, `None` if empty
    #[inline]
    pub const fn lsb(self) -> Option<Square> {
        if self.0 == 0 {
            None
        } else {
            Some(Square::new(self.0.trailing_zeros() as u8))
        }
    }

    /// Highest set square, `None` if empty
    #[inline]
    pub const fn msb(self) -> Option<Square> {
        if self.0 == 0 {
            None
        } else {
            Some(Square::new(63 - self.0.leading_zeros() as u8))
        }
    }

    /// Removes and returns the lowest set square
    #[inline]
    pub fn pop_lsb(&mut self) -> Option<Square> {
        let sq = self.lsb()?;
        self.0 &= self.0 - 1;
        Some(sq)
    }

    /// Most advanced square from `color`'s point of view
    pub fn frontmost(self, color: Color) -> Option<Square> {
        match color {
            Color::White => self.msb(),
            Color::Black => self.lsb(),
        }
    }

    /// Shift every square one step, dropping squares that would leave the
    /// board instead of wrapping onto the opposite edge.
    #[inline]
    pub const fn shift(self, dir: Direction) -> Self {
        let b = self.0;
        let not_a = !Self::COL_A.0;
        let not_h = !Self::COL_H.0;
        Bitboard(match dir {
            Direction::Up => b << 8,
            Direction::Down => b >> 8,
            Direction::Left => (b & not_a) >> 1,
            Direction::Right => (b & not_h) << 1,
            Direction::UpLeft => (b & not_a) << 7,
            Direction::UpRight => (b & not_h) << 9,
            Direction::DownLeft => (b & not_a) >> 9,
            Direction::DownRight => (b & not_h) >> 7,
        })
    }

    /// Squares directly ahead of each square for `color`
    #[inline]
    pub const fn forward(self, color: Color) -> Self {
        match color {
            Color::White => self.shift(Direction::Up),
            Color::Black => self.shift(Direction::Down),
        }
    }

    /// Forward diagonals of each square for `color`
    #[inline]
    pub const fn attacks(self, color: Color) -> Self {
        match color {
            Color::White => {
                Bitboard(self.shift(Direction::UpLeft).0 | self.shift(Direction::UpRight).0)
            }
            Color::Black => {
                Bitboard(self.shift(Direction::DownLeft).0 | self.shift(Direction::DownRight).0)
            }
        }
    }

    /// Every square a pawn of `color` on `sq` could ever reach, `sq` included.
    pub fn span(color: Color, sq: Square) -> Self {
        let mut span = Bitboard::from_square(sq);
        let mut front = span;
        while front.is_not_empty() {
            front = front.forward(color) | front.attacks(color);
            span |= front;
        }
        span
    }

    /// Squares from which a `color` pawn attacks `sq`
    pub fn attackers(color: Color, sq: Square) -> Self {
        Bitboard::from_square(sq).attacks(color.opponent())
    }

    pub fn iter(self) -> BitboardIter {
        BitboardIter(self)
    }
}

/// Iterator over set squares, lowest first
pub struct BitboardIter(Bitboard);

impl Iterator for BitboardIter {
    type Item = Square;

    fn next(&mut self) -> Option<Square> {
        self.0.pop_lsb()
    }
}

impl IntoIterator for Bitboard {
    type Item = Square;
    type IntoIter = BitboardIter;

    fn into_iter(self) -> BitboardIter {
        self.iter()
    }
}

impl From<Square> for Bitboard {
    fn from(sq: Square) -> Self {
        Bitboard::from_square(sq)
    }
}

impl BitAnd for Bitboard {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Bitboard(self.0 & rhs.0)
    }
}

impl BitOr for Bitboard {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Bitboard(self.0 | rhs.0)
    }
}

impl BitXor for Bitboard {
    type Output = Self;
    fn bitxor(self, rhs: Self) -> Self {
        Bitboard(self.0 ^ rhs.0)
    }
}

impl Not for Bitboard {
    type Output = Self;
    fn not(self) -> Self {
        Bitboard(!self.0)
    }
}

impl BitAndAssign for Bitboard {
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

impl BitOrAssign for Bitboard {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitXorAssign for Bitboard {
    fn bitxor_assign(&mut self, rhs: Self) {
        self.0 ^= rhs.0;
    }
}

impl fmt::Debug for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Bitboard({:#018x})", self.0)?;
        for row in (0..8).rev() {
            write!(f, "{}  ", row + 1)?;
            for col in 0..8 {
                let mark = if self.contains(Square::at(col, row)) { 'X' } else { '.' };
                write!(f, " {} ", mark)?;
            }
            writeln!(f)?;
        }
        write!(f, "    a  b  c  d  e  f  g  h")
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    #[test]
    fn test_shifts_do_not_wrap() {
        let a = Bitboard::from_square(sq("a4"));
        let h = Bitboard::from_square(sq("h4"));
        assert!(a.shift(Direction::Left).is_empty());
        assert!(a.shift(Direction::UpLeft).is_empty());
        assert!(a.shift(Direction::DownLeft).is_empty());
        assert!(h.shift(Direction::Right).is_empty());
        assert!(h.shift(Direction::UpRight).is_empty());
        assert!(h.shift(Direction::DownRight).is_empty());
        assert_eq!(a.shift(Direction::UpRight), Bitboard::from_square(sq("b5")));
        assert_eq!(h.shift(Direction::DownLeft), Bitboard::from_square(sq("g3")));
    }

    #[test]
    fn test_forward_falls_off_the_board() {
        assert!(Bitboard::from_square(sq("d8")).forward(Color::White).is_empty());
        assert!(Bitboard::from_square(sq("d1")).forward(Color::Black).is_empty());
        assert_eq!(
            Bitboard::from_square(sq("d7")).forward(Color::Black),
            Bitboard::from_square(sq("d6"))
        );
    }

    #[test]
    fn test_attacks() {
        let b = Bitboard::from_square(sq("e4"));
        assert_eq!(b.attacks(Color::White), Bitboard::from(sq("d5")) | Bitboard::from(sq("f5")));
        assert_eq!(b.attacks(Color::Black), Bitboard::from(sq("d3")) | Bitboard::from(sq("f3")));
        assert_eq!(Bitboard::from(sq("a2")).attacks(Color::White), Bitboard::from(sq("b3")));
    }

    #[test]
    fn test_lsb_msb_pop() {
        let mut b = Bitboard::from(sq("c3")) | Bitboard::from(sq("f6"));
        assert_eq!(b.lsb(), Some(sq("c3")));
        assert_eq!(b.msb(), Some(sq("f6")));
        assert_eq!(b.popcount(), 2);
        assert_eq!(b.pop_lsb(), Some(sq("c3")));
        assert_eq!(b.pop_lsb(), Some(sq("f6")));
        assert_eq!(b.pop_lsb(), None);
        assert_eq!(Bitboard::EMPTY.lsb(), None);
    }

    #[test]
    fn test_rows_and_columns() {
        assert_eq!(Bitboard::row(7), Bitboard::ROW_8);
        assert_eq!(Bitboard::column(7), Bitboard::COL_H);
        assert_eq!((Bitboard::row(2) & Bitboard::column(3)).lsb(), Some(sq("d3")));
    }

    #[test]
    fn test_span_is_forward_cone() {
        let span = Bitboard::span(Color::White, sq("a6"));
        let expected: Bitboard = ["a6", "a7", "b7", "a8", "b8", "c8"]
            .iter()
            .map(|s| Bitboard::from(sq(s)))
            .fold(Bitboard::EMPTY, |acc, b| acc | b);
        assert_eq!(span, expected);
        assert_eq!(Bitboard::span(Color::Black, sq("h1")), Bitboard::from(sq("h1")));
    }

    #[test]
    fn test_attackers() {
        let attackers = Bitboard::attackers(Color::White, sq("e5"));
        assert_eq!(attackers, Bitboard::from(sq("d4")) | Bitboard::from(sq("f4")));
    }

    #[test]
    fn test_iteration_order() {
        let b = Bitboard::row(0);
        let squares: Vec<String> = b.iter().map(|s| s.to_string()).collect();
        assert_eq!(squares, ["a1", "b1", "c1", "d1", "e1", "f1", "g1", "h1"]);
    }
}
