//! Read-only perfect-play table and the queries built on it.

use crate::{Bitboard, Board, MoveList, Phase, StateEncoder, Value};

/// One [`Value`] per key, in key order.
///
/// A table may be shorter than the key space (a partial solve or a
/// truncated book); keys past the end read as [`Value::Unknown`].
#[derive(Debug, Clone)]
pub struct PerfectPlayTable {
    encoder: StateEncoder,
    values: Vec<Value>,
}

impl PerfectPlayTable {
    pub fn from_values(values: Vec<Value>) -> PerfectPlayTable {
        PerfectPlayTable {
            encoder: StateEncoder::new(),
            values,
        }
    }

    /// Build from the signed byte encoding.
    pub fn from_bytes(bytes: &[i8]) -> PerfectPlayTable {
        Self::from_values(bytes.iter().map(|&b| Value::from_byte(b)).collect())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether every key of the key space has an entry.
    pub fn is_complete(&self) -> bool {
        self.values.len() as u64 >= self.encoder.max_key()
    }

    #[inline]
    pub fn encoder(&self) -> &StateEncoder {
        &self.encoder
    }

    #[inline]
    pub fn get(&self, key: u64) -> Value {
        usize::try_from(key)
            .ok()
            .and_then(|idx| self.values.get(idx))
            .copied()
            .unwrap_or(Value::Unknown)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Entries in the signed byte encoding, key order.
    pub fn bytes(&self) -> impl Iterator<Item = i8> + '_ {
        self.values.iter().map(|v| v.to_byte())
    }

    // ========== Queries ==========

    /// Stored value of a position, from the side to move.
    #[inline]
    pub fn evaluate(&self, board: &Board) -> Value {
        self.get(self.encoder.encode(board))
    }

    /// Best drop for the side to move, or `None` if no drop leads to a
    /// scorable child.
    pub fn best_drop(&self, board: &Board) -> Option<Bitboard> {
        self.best_of(board, board.possible_drops(), Board::drop_marker)
    }

    /// Best slide for the side to move, as `source | destination`.
    pub fn best_move(&self, board: &Board) -> Option<Bitboard> {
        self.best_of(board, board.possible_moves(), Board::move_marker)
    }

    /// [`best_drop`](Self::best_drop) or [`best_move`](Self::best_move)
    /// depending on the phase.
    pub fn best_transition(&self, board: &Board) -> Option<Bitboard> {
        match board.phase() {
            Phase::Drop => self.best_drop(board),
            Phase::Move => self.best_move(board),
        }
    }

    /// First candidate with the highest score. A child scores as the
    /// negation of its value; unresolved children score as ties and illegal
    /// children are skipped.
    fn best_of(
        &self,
        board: &Board,
        candidates: MoveList,
        apply: fn(&mut Board, Bitboard),
    ) -> Option<Bitboard> {
        let mut best: Option<(i16, Bitboard)> = None;

        for transition in candidates {
            let mut child = *board;
            apply(&mut child, transition);

            let score = match self.evaluate(&child) {
                Value::Unknown => 0,
                value => match value.score() {
                    Some(s) => -(s as i16),
                    None => continue,
                },
            };
            if best.map_or(true, |(best_score, _)| score > best_score) {
                best = Some((score, transition));
            }
        }
        best.map(|(_, transition)| transition)
    }
}
