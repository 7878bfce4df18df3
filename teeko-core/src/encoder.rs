//! Dense bijection between positions and integer keys.
//!
//! # Key Layout
//!
//! ```text
//! Positions are grouped into buckets by (opponent_count, mover_count),
//! ordered by total markers, then opponent_count:
//!
//!   (o,p)          base          size
//!   (0,0)             0             1
//!   (1,0)             1            25
//!   (1,1)            26           600
//!   (2,1)           626         6 900
//!   (2,2)         7 526        75 900
//!   (3,2)        83 426       531 300
//!   (3,3)       614 726     3 542 000
//!   (4,3)     4 156 726    16 824 500
//!   (4,4)    20 981 226    75 710 250
//!   MAX_KEY  96 691 476
//!
//! Within a bucket:
//!   key = base + opponent_rank * C(25 - o, p) + mover_rank
//!
//! opponent_rank: rank of the opponent squares among o-subsets of {0..25}
//! mover_rank:    rank of the mover squares, renumbered among the 25 - o
//!                squares the opponent does not hold
//! ```

use thiserror::Error;

use crate::combinatorics::{
    binomial, bitboard_of, rank_combination, squares_of, unrank_combination, Combination,
};
use crate::{Bitboard, Board, Player, BOARD_MASK, BOARD_SIZE, MARKERS_PER_SIDE, TOTAL_MARKERS};

/// Errors from [`StateEncoder::decode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("key {key} out of range (MAX_KEY={max_key})")]
    KeyOutOfRange { key: u64, max_key: u64 },
}

/// One `(opponent_count, mover_count)` bucket of the key space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    pub opponent_count: u32,
    pub mover_count: u32,
    /// First key of the bucket.
    pub base: u64,
    /// Number of keys in the bucket.
    pub len: u64,
}

impl Bucket {
    #[inline]
    pub fn contains(&self, key: u64) -> bool {
        key >= self.base && key < self.base + self.len
    }

    #[inline]
    pub fn total(&self) -> u32 {
        self.opponent_count + self.mover_count
    }
}

/// Valid `(opponent_count, mover_count)` pairs in key order.
fn bucket_order() -> impl Iterator<Item = (u32, u32)> {
    (0..=TOTAL_MARKERS).flat_map(|total| {
        (0..=MARKERS_PER_SIDE).filter_map(move |o| {
            let p = total.checked_sub(o)?;
            (p <= MARKERS_PER_SIDE && (o == p || o == p + 1)).then_some((o, p))
        })
    })
}

/// Number of positions with `o` opponent and `p` mover markers.
#[inline]
fn bucket_len(o: u32, p: u32) -> u64 {
    binomial(BOARD_SIZE as i32, o as i32) * binomial((BOARD_SIZE as u32 - o) as i32, p as i32)
}

/// Offset table and key bound. Cheap to copy; build once with
/// [`StateEncoder::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateEncoder {
    /// `offsets[o][p]` is the base key of bucket `(o, p)`.
    offsets: [[u64; 5]; 5],
    max_key: u64,
}

impl StateEncoder {
    pub fn new() -> StateEncoder {
        let mut offsets = [[0u64; 5]; 5];
        let mut accum = 0;
        for (o, p) in bucket_order() {
            offsets[o as usize][p as usize] = accum;
            accum += bucket_len(o, p);
        }
        StateEncoder {
            offsets,
            max_key: accum,
        }
    }

    /// Number of keys; every key lies in `[0, max_key)`.
    #[inline]
    pub fn max_key(&self) -> u64 {
        self.max_key
    }

    /// All buckets in key order.
    pub fn buckets(&self) -> impl Iterator<Item = Bucket> + '_ {
        bucket_order().map(|(o, p)| Bucket {
            opponent_count: o,
            mover_count: p,
            base: self.offsets[o as usize][p as usize],
            len: bucket_len(o, p),
        })
    }

    /// The bucket containing `key`, if the key is in range.
    pub fn bucket_of(&self, key: u64) -> Option<Bucket> {
        self.buckets().find(|bucket| bucket.contains(key))
    }

    /// Key of a position. The board must satisfy [`Board::is_consistent`];
    /// anything else gives an unspecified key.
    pub fn encode(&self, board: &Board) -> u64 {
        debug_assert!(board.is_consistent(), "encoding inconsistent board {:?}", board);

        let mover_mask = board.mover_positions();
        let opponent_mask = board.opponent_positions();
        let mover_count = mover_mask.count_ones();
        let opponent_count = opponent_mask.count_ones();

        let base = self.offsets[opponent_count as usize][mover_count as usize];
        let opponent_rank = rank_combination(&squares_of(opponent_mask), BOARD_SIZE as u32);

        // Renumber each mover square by how many non-opponent squares lie
        // below it.
        let mut relative = Combination::new();
        for &square in squares_of(mover_mask).iter() {
            let below: Bitboard = (1 << square) - 1;
            relative.push(square - (opponent_mask & below).count_ones() as u8);
        }
        let leftover = BOARD_SIZE as u32 - opponent_count;
        let mover_rank = rank_combination(&relative, leftover);

        let ways = binomial(leftover as i32, mover_count as i32);
        base + opponent_rank * ways + mover_rank
    }

    /// Position of a key.
    ///
    /// The side tag follows a fixed convention: in the drop phase Black is
    /// to move when both sides have the same number of markers, Red
    /// otherwise; in the move phase Black is always reported. Keys do not
    /// record whose turn it is, so the tag of a decoded move-phase position
    /// may not match the game it came from. Values and transitions do not
    /// depend on it.
    pub fn decode(&self, key: u64) -> Result<Board, DecodeError> {
        let bucket = self.bucket_of(key).ok_or(DecodeError::KeyOutOfRange {
            key,
            max_key: self.max_key,
        })?;
        let (o, p) = (bucket.opponent_count, bucket.mover_count);

        let local_rank = key - bucket.base;
        let leftover_count = BOARD_SIZE as u32 - o;
        let ways = binomial(leftover_count as i32, p as i32);
        let opponent_rank = local_rank / ways;
        let mover_rank = local_rank % ways;

        let opponent = unrank_combination(opponent_rank, o, BOARD_SIZE as u32);
        let opponent_mask = bitboard_of(&opponent);

        let leftover = squares_of(opponent_mask ^ BOARD_MASK);
        let relative = unrank_combination(mover_rank, p, leftover_count);
        let mover_mask: Bitboard = relative
            .iter()
            .fold(0, |bits, &idx| bits | (1 << leftover[idx as usize]));

        let player = if o + p < TOTAL_MARKERS {
            if o == p {
                Player::Black
            } else {
                Player::Red
            }
        } else {
            Player::Black
        };

        Ok(Board::from_parts(mover_mask, mover_mask | opponent_mask, player))
    }
}

impl Default for StateEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Phase, Square};

    #[test]
    fn test_max_key() {
        let encoder = StateEncoder::new();
        assert_eq!(encoder.max_key(), 96_691_476);
        let sum: u64 = encoder.buckets().map(|b| b.len).sum();
        assert_eq!(sum, encoder.max_key());
    }

    #[test]
    fn test_bucket_bases() {
        let encoder = StateEncoder::new();
        let bases: Vec<(u32, u32, u64)> = encoder
            .buckets()
            .map(|b| (b.opponent_count, b.mover_count, b.base))
            .collect();
        assert_eq!(
            bases,
            vec![
                (0, 0, 0),
                (1, 0, 1),
                (1, 1, 26),
                (2, 1, 626),
                (2, 2, 7_526),
                (3, 2, 83_426),
                (3, 3, 614_726),
                (4, 3, 4_156_726),
                (4, 4, 20_981_226),
            ]
        );
    }

    #[test]
    fn test_buckets_are_contiguous() {
        let encoder = StateEncoder::new();
        let mut next = 0;
        for bucket in encoder.buckets() {
            assert_eq!(bucket.base, next);
            next = bucket.base + bucket.len;
        }
        assert_eq!(next, encoder.max_key());
    }

    #[test]
    fn test_encode_empty_board() {
        let encoder = StateEncoder::new();
        assert_eq!(encoder.encode(&Board::new()), 0);
        assert_eq!(encoder.decode(0).unwrap(), Board::new());
    }

    #[test]
    fn test_encode_first_drops() {
        let encoder = StateEncoder::new();
        let mut board = Board::new();
        board.drop_marker(Square(0).bit());
        assert_eq!(encoder.encode(&board), 1);

        let mut board = Board::new();
        board.drop_marker(Square(24).bit());
        assert_eq!(encoder.encode(&board), 25);
    }

    #[test]
    fn test_decode_last_key() {
        let encoder = StateEncoder::new();
        let board = encoder.decode(encoder.max_key() - 1).unwrap();
        let expected_opponent: Bitboard = [21, 22, 23, 24].iter().fold(0, |b, &s| b | (1 << s));
        let expected_mover: Bitboard = [17, 18, 19, 20].iter().fold(0, |b, &s| b | (1 << s));
        assert_eq!(board.opponent_positions(), expected_opponent);
        assert_eq!(board.mover_positions(), expected_mover);
        assert_eq!(board.phase(), Phase::Move);
    }

    #[test]
    fn test_decode_out_of_range() {
        let encoder = StateEncoder::new();
        let max_key = encoder.max_key();
        assert_eq!(
            encoder.decode(max_key),
            Err(DecodeError::KeyOutOfRange { key: max_key, max_key })
        );
        let message = encoder.decode(u64::MAX).unwrap_err().to_string();
        assert!(message.contains("96691476"));
    }

    #[test]
    fn test_decode_side_to_move() {
        let encoder = StateEncoder::new();
        // Bucket (1,0): Black dropped, Red to move
        assert_eq!(encoder.decode(1).unwrap().current_player(), Player::Red);
        // Bucket (1,1): Black to move
        assert_eq!(encoder.decode(26).unwrap().current_player(), Player::Black);
        // Move phase always reports Black
        assert_eq!(encoder.decode(20_981_226).unwrap().current_player(), Player::Black);
    }

    #[test]
    fn test_roundtrip_bucket_edges() {
        let encoder = StateEncoder::new();
        for bucket in encoder.buckets() {
            for key in [bucket.base, bucket.base + bucket.len / 2, bucket.base + bucket.len - 1] {
                let board = encoder.decode(key).unwrap();
                assert!(board.is_consistent());
                assert_eq!(board.opponent_count(), bucket.opponent_count);
                assert_eq!(board.mover_count(), bucket.mover_count);
                assert_eq!(encoder.encode(&board), key);
            }
        }
    }

    #[test]
    fn test_roundtrip_small_buckets_exhaustive() {
        let encoder = StateEncoder::new();
        // Through bucket (2,2): every key
        for key in 0..83_426 {
            let board = encoder.decode(key).unwrap();
            assert_eq!(encoder.encode(&board), key, "key {}", key);
        }
    }

    #[test]
    fn test_encode_ignores_side_tag() {
        let encoder = StateEncoder::new();
        let black = Board::from_squares(Player::Black, &[Square(3)], &[Square(4)]);
        let red = Board::from_squares(Player::Red, &[Square(3)], &[Square(4)]);
        assert_eq!(encoder.encode(&black), encoder.encode(&red));
    }
}
