//! Zobrist keys for incremental position hashing

use std::sync::{Arc, OnceLock};

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::types::{Color, Square, NUM_SQUARES};

/// Seed for the shared key table, fixed so hashes are stable between runs
pub const ZOBRIST_SEED: u64 = 0x6272_6561_6b74_6872;

/// One key per (color, square) plus a key toggled on every ply.
#[derive(Clone, Debug)]
pub struct ZobristKeys {
    pieces: [[u64; NUM_SQUARES]; 2],
    side: u64,
}

impl ZobristKeys {
    pub fn new(seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut pieces = [[0u64; NUM_SQUARES]; 2];
        for color_keys in pieces.iter_mut() {
            for key in color_keys.iter_mut() {
                *key = rng.next_u64();
            }
        }
        let side = rng.next_u64();
        Self { pieces, side }
    }

    /// Process-wide table built from [`ZOBRIST_SEED`]
    pub fn shared() -> Arc<ZobristKeys> {
        static SHARED: OnceLock<Arc<ZobristKeys>> = OnceLock::new();
        SHARED
            .get_or_init(|| Arc::new(ZobristKeys::new(ZOBRIST_SEED)))
            .clone()
    }

    #[inline]
    pub fn piece(&self, color: Color, sq: Square) -> u64 {
        self.pieces[color.index()][sq.index()]
    }

    #[inline]
    pub fn side(&self) -> u64 {
        self.side
    }
}
