//! Teeko game logic with bitboard representation.
//!
//! # Board Layout (25 bits, column-major)
//!
//! ```text
//! bit = col * 5 + row
//!
//!   row 4 |  4   9  14  19  24
//!   row 3 |  3   8  13  18  23
//!   row 2 |  2   7  12  17  22
//!   row 1 |  1   6  11  16  21
//!   row 0 |  0   5  10  15  20
//!         +--------------------
//!          c0  c1  c2  c3  c4
//! ```
//!
//! # Position Representation
//!
//! ```text
//! mover:    squares held by the side to move
//! occupied: squares held by either side
//! opponent: mover ^ occupied
//! ```
//!
//! Every drop or move swaps the roles, so a [`Board`] always describes the
//! position from the perspective of whoever moves next. Each side places 4
//! markers (drop phase), after which markers slide one square in any of the
//! 8 directions (move phase).

pub mod combinatorics;
pub mod encoder;
pub mod table;
pub mod value;

#[cfg(feature = "wasm")]
pub mod wasm;

use serde::{Deserialize, Serialize};

pub use encoder::{Bucket, DecodeError, StateEncoder};
pub use table::PerfectPlayTable;
pub use value::{negamax, Value};

/// One bit per square, see module documentation for the layout.
pub type Bitboard = u32;

/// Squares per side of the board.
pub const BOARD_LENGTH: u32 = 5;
/// Number of squares.
pub const BOARD_SIZE: usize = 25;
/// All 25 squares.
pub const BOARD_MASK: Bitboard = (1 << BOARD_SIZE) - 1;
/// Markers each side places before the move phase.
pub const MARKERS_PER_SIDE: u32 = 4;
/// Markers on the board once both sides have dropped everything.
pub const TOTAL_MARKERS: u32 = 2 * MARKERS_PER_SIDE;

/// Player identifier. Black moves first.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Player {
    Black = 0,
    Red = 1,
}

impl Player {
    /// Get the opponent player.
    #[inline]
    pub fn opponent(self) -> Player {
        match self {
            Player::Black => Player::Red,
            Player::Red => Player::Black,
        }
    }
}

/// Stage of play for the side to move.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Fewer than 4 own markers on the board: place a new one.
    Drop,
    /// All 4 own markers placed: slide one to an adjacent empty square.
    Move,
}

/// Win-shape rule set.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Default, Serialize, Deserialize)]
pub enum GameMode {
    /// Four in a line or a 2×2 square.
    Regular,
    /// Regular shapes plus the corners of a 3×3, 4×4 or 5×5 square.
    #[default]
    Advanced,
}

impl GameMode {
    /// Byte tag used by the checkpoint header.
    pub fn to_byte(self) -> u8 {
        match self {
            GameMode::Regular => 0,
            GameMode::Advanced => 1,
        }
    }

    pub fn from_byte(byte: u8) -> Option<GameMode> {
        match byte {
            0 => Some(GameMode::Regular),
            1 => Some(GameMode::Advanced),
            _ => None,
        }
    }
}

/// Square on the board (0-24), column-major.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub struct Square(pub u8);

impl Square {
    /// Create a square from column and row (0-4 each).
    #[inline]
    pub fn from_col_row(col: u8, row: u8) -> Square {
        debug_assert!(col < 5 && row < 5);
        Square(col * BOARD_LENGTH as u8 + row)
    }

    /// The square of a single-bit bitboard.
    #[inline]
    pub fn from_bit(bit: Bitboard) -> Option<Square> {
        if bit.count_ones() == 1 && bit & BOARD_MASK != 0 {
            Some(Square(bit.trailing_zeros() as u8))
        } else {
            None
        }
    }

    #[inline]
    pub fn col(self) -> u8 {
        self.0 / BOARD_LENGTH as u8
    }

    #[inline]
    pub fn row(self) -> u8 {
        self.0 % BOARD_LENGTH as u8
    }

    #[inline]
    pub fn bit(self) -> Bitboard {
        1 << self.0
    }

    /// Iterate over all 25 squares.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..BOARD_SIZE as u8).map(Square)
    }
}

// ============================================================================
// MOVE LIST - Zero-allocation transition storage
// ============================================================================

/// Maximum number of transitions from any position.
/// Drops: at most 25 empty squares. Moves: 4 markers × 8 directions.
pub const MAX_MOVES: usize = 32;

/// A fixed-size list of transitions (drop bits or `source | destination`
/// move masks) that avoids heap allocation.
#[derive(Clone, Copy)]
pub struct MoveList {
    moves: [Bitboard; MAX_MOVES],
    len: u8,
}

impl MoveList {
    /// Create an empty move list.
    #[inline]
    pub const fn new() -> MoveList {
        MoveList {
            moves: [0; MAX_MOVES],
            len: 0,
        }
    }

    /// Add a transition to the list.
    #[inline]
    pub fn push(&mut self, mov: Bitboard) {
        debug_assert!((self.len as usize) < MAX_MOVES);
        self.moves[self.len as usize] = mov;
        self.len += 1;
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub const fn get(&self, idx: usize) -> Bitboard {
        self.moves[idx]
    }

    /// Iterate over transitions in generation order.
    pub fn iter(&self) -> impl Iterator<Item = Bitboard> + '_ {
        self.moves[..self.len as usize].iter().copied()
    }

    pub fn as_slice(&self) -> &[Bitboard] {
        &self.moves[..self.len as usize]
    }

    #[inline]
    pub fn contains(&self, mov: Bitboard) -> bool {
        self.as_slice().contains(&mov)
    }
}

impl Default for MoveList {
    fn default() -> Self {
        Self::new()
    }
}

impl IntoIterator for MoveList {
    type Item = Bitboard;
    type IntoIter = std::iter::Take<std::array::IntoIter<Bitboard, MAX_MOVES>>;

    fn into_iter(self) -> Self::IntoIter {
        self.moves.into_iter().take(self.len as usize)
    }
}

impl std::fmt::Debug for MoveList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

// ============================================================================
// SHAPE AND EDGE MASKS
// ============================================================================

/// Destination squares reachable without wrapping from row 4 into row 0.
const NOT_ROW_0: Bitboard = 0b11110_11110_11110_11110_11110;
/// Destination squares reachable without wrapping from row 0 into row 4.
const NOT_ROW_4: Bitboard = 0b01111_01111_01111_01111_01111;

// Start squares (lowest bit) of each shape that stay on the board.
const LINE_ALONG_COLUMN: Bitboard = 0b00011_00011_00011_00011_00011;
const LINE_ALONG_ROW: Bitboard = 0b00000_00000_00000_11111_11111;
const DIAGONAL: Bitboard = 0b00000_00000_00000_00011_00011;
const ANTI_DIAGONAL: Bitboard = 0b00000_00000_00000_11000_11000;
const SQUARE_2: Bitboard = 0b00000_01111_01111_01111_01111;
const SQUARE_3: Bitboard = 0b00000_00000_00111_00111_00111;
const SQUARE_4: Bitboard = 0b00000_00000_00000_00011_00011;
/// The four corners of the board (squares 0, 4, 20, 24).
const CORNERS: Bitboard = 0x1100011;

/// Single-step shifts in generation order, each with the guard applied to
/// the destination square. Generation order decides tie-breaks in
/// best-move queries, so it must not change.
const STEPS: [(i32, Bitboard); 8] = [
    (1, NOT_ROW_0),
    (6, NOT_ROW_0),
    (-4, NOT_ROW_0),
    (-1, NOT_ROW_4),
    (-6, NOT_ROW_4),
    (4, NOT_ROW_4),
    (-5, BOARD_MASK),
    (5, BOARD_MASK),
];

#[inline]
fn shift(bits: Bitboard, by: i32) -> Bitboard {
    if by >= 0 {
        bits << by
    } else {
        bits >> -by
    }
}

/// Start squares of four markers spaced `step` bits apart.
#[inline]
fn line(bits: Bitboard, step: u32) -> Bitboard {
    bits & (bits >> step) & (bits >> (2 * step)) & (bits >> (3 * step))
}

/// Lower-left corners of axis-aligned squares whose corners are `span`
/// squares apart.
#[inline]
fn square_corners(bits: Bitboard, span: u32) -> Bitboard {
    let across = span * BOARD_LENGTH;
    bits & (bits >> span) & (bits >> across) & (bits >> (across + span))
}

/// Check whether `bits` contains a winning shape under `mode`.
#[inline]
pub fn has_shape(bits: Bitboard, mode: GameMode) -> bool {
    if line(bits, 1) & LINE_ALONG_COLUMN != 0
        || line(bits, BOARD_LENGTH) & LINE_ALONG_ROW != 0
        || line(bits, BOARD_LENGTH + 1) & DIAGONAL != 0
        || line(bits, BOARD_LENGTH - 1) & ANTI_DIAGONAL != 0
        || square_corners(bits, 1) & SQUARE_2 != 0
    {
        return true;
    }

    mode == GameMode::Advanced
        && (square_corners(bits, 2) & SQUARE_3 != 0
            || square_corners(bits, 3) & SQUARE_4 != 0
            || bits & CORNERS == CORNERS)
}

// ============================================================================
// BOARD
// ============================================================================

/// Compact position, always relative to the side to move.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Board {
    mover_positions: Bitboard,
    occupied_positions: Bitboard,
    current_player: Player,
}

impl Board {
    /// Create the empty starting board with Black to move.
    #[inline]
    pub fn new() -> Board {
        Board {
            mover_positions: 0,
            occupied_positions: 0,
            current_player: Player::Black,
        }
    }

    /// Build a board from raw bitboards. Does NOT validate.
    #[inline]
    pub fn from_parts(mover: Bitboard, occupied: Bitboard, player: Player) -> Board {
        Board {
            mover_positions: mover,
            occupied_positions: occupied,
            current_player: player,
        }
    }

    /// Build a board from the squares of each side.
    pub fn from_squares(player: Player, mover: &[Square], opponent: &[Square]) -> Board {
        let mover_bits = mover.iter().fold(0, |bits, sq| bits | sq.bit());
        let opponent_bits = opponent.iter().fold(0, |bits, sq| bits | sq.bit());
        Board::from_parts(mover_bits, mover_bits | opponent_bits, player)
    }

    #[inline]
    pub fn mover_positions(&self) -> Bitboard {
        self.mover_positions
    }

    #[inline]
    pub fn occupied_positions(&self) -> Bitboard {
        self.occupied_positions
    }

    #[inline]
    pub fn opponent_positions(&self) -> Bitboard {
        self.mover_positions ^ self.occupied_positions
    }

    #[inline]
    pub fn empty_positions(&self) -> Bitboard {
        self.occupied_positions ^ BOARD_MASK
    }

    #[inline]
    pub fn current_player(&self) -> Player {
        self.current_player
    }

    #[inline]
    pub fn mover_count(&self) -> u32 {
        self.mover_positions.count_ones()
    }

    #[inline]
    pub fn opponent_count(&self) -> u32 {
        self.opponent_positions().count_ones()
    }

    #[inline]
    pub fn marker_count(&self) -> u32 {
        self.occupied_positions.count_ones()
    }

    /// Current phase for the side to move.
    ///
    /// Clears the three lowest set bits of the mover's markers; anything
    /// left means at least four are on the board.
    #[inline]
    pub fn phase(&self) -> Phase {
        let mut n = self.mover_positions;
        n &= n.wrapping_sub(1);
        n &= n.wrapping_sub(1);
        n &= n.wrapping_sub(1);
        if n != 0 {
            Phase::Move
        } else {
            Phase::Drop
        }
    }

    /// Check whether the opponent of the side to move has a winning shape,
    /// i.e. the position is already lost for the mover.
    #[inline]
    pub fn is_win(&self, mode: GameMode) -> bool {
        has_shape(self.opponent_positions(), mode)
    }

    /// Check whether the side to move itself has a winning shape.
    #[inline]
    pub fn mover_has_won(&self, mode: GameMode) -> bool {
        self.flipped().is_win(mode)
    }

    /// Check the representation invariants: mover ⊆ occupied, at most 4
    /// mover markers and 8 in total, and the opponent has either as many
    /// markers as the mover or exactly one more.
    pub fn is_consistent(&self) -> bool {
        let mover = self.mover_count();
        let opponent = self.opponent_count();
        self.mover_positions & !self.occupied_positions == 0
            && self.occupied_positions & !BOARD_MASK == 0
            && mover <= MARKERS_PER_SIDE
            && mover + opponent <= TOTAL_MARKERS
            && (opponent == mover || opponent == mover + 1)
    }

    // ========== Transitions ==========

    /// Every empty square as a single-bit drop, ascending.
    pub fn possible_drops(&self) -> MoveList {
        let mut drops = MoveList::new();
        let mut empty = self.empty_positions();

        while empty != 0 {
            let square = empty & empty.wrapping_neg();
            empty ^= square;
            drops.push(square);
        }
        drops
    }

    /// Every single-step slide of a mover marker to an adjacent empty
    /// square, as `source | destination`.
    pub fn possible_moves(&self) -> MoveList {
        let mut moves = MoveList::new();
        let empty = self.empty_positions();
        let mut markers = self.mover_positions;

        while markers != 0 {
            let marker = markers & markers.wrapping_neg();
            markers ^= marker;

            for &(step, guard) in &STEPS {
                let destination = shift(marker, step) & guard & empty;
                if destination != 0 {
                    moves.push(destination | marker);
                }
            }
        }
        moves
    }

    /// Transitions for the current phase.
    #[inline]
    pub fn transitions(&self) -> MoveList {
        match self.phase() {
            Phase::Drop => self.possible_drops(),
            Phase::Move => self.possible_moves(),
        }
    }

    /// Swap roles without placing a marker.
    #[inline]
    fn swap_roles(&mut self) {
        self.current_player = self.current_player.opponent();
        self.mover_positions ^= self.occupied_positions;
    }

    /// Place a marker on an empty square. Does NOT validate.
    #[inline]
    pub fn drop_marker(&mut self, drop: Bitboard) {
        self.swap_roles();
        self.occupied_positions |= drop;
    }

    /// Slide a marker: `mov` has the source and destination bits set.
    /// Does NOT validate.
    #[inline]
    pub fn move_marker(&mut self, mov: Bitboard) {
        self.swap_roles();
        self.occupied_positions ^= mov;
    }

    /// Apply a transition produced by [`Board::transitions`].
    #[inline]
    pub fn apply(&mut self, transition: Bitboard) {
        match self.phase() {
            Phase::Drop => self.drop_marker(transition),
            Phase::Move => self.move_marker(transition),
        }
    }

    /// The same markers seen from the other side.
    #[inline]
    pub fn flipped(&self) -> Board {
        let mut board = *self;
        board.drop_marker(0);
        board
    }

    /// Children for the current phase as `(transition, child)` pairs, in
    /// generation order.
    pub fn successors(&self) -> impl Iterator<Item = (Bitboard, Board)> {
        let board = *self;
        self.transitions().into_iter().map(move |transition| {
            let mut child = board;
            child.apply(transition);
            (transition, child)
        })
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
