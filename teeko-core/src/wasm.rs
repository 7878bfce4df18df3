//! WASM bindings for teeko-core
//!
//! Provides a JavaScript-friendly API for playing against a loaded table.
//! Squares are addressed as `(col, row)` with `(0, 0)` in the bottom-left.

use wasm_bindgen::prelude::*;

use crate::{Bitboard, Board, GameMode, PerfectPlayTable, Phase, Square, StateEncoder};

fn mode_of(advanced: bool) -> GameMode {
    if advanced {
        GameMode::Advanced
    } else {
        GameMode::Regular
    }
}

/// Bit of an on-board square.
fn square_bit(col: u8, row: u8) -> Option<Bitboard> {
    (col < 5 && row < 5).then(|| Square::from_col_row(col, row).bit())
}

/// WASM-friendly wrapper around Board
#[wasm_bindgen]
pub struct WasmBoard {
    inner: Board,
}

#[wasm_bindgen]
impl WasmBoard {
    /// Create a new empty board
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmBoard {
        WasmBoard { inner: Board::new() }
    }

    /// Board stored under a key
    #[wasm_bindgen(js_name = fromKey)]
    pub fn from_key(key: u64) -> Result<WasmBoard, JsValue> {
        StateEncoder::new()
            .decode(key)
            .map(|inner| WasmBoard { inner })
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Table key of this position
    pub fn key(&self) -> u64 {
        StateEncoder::new().encode(&self.inner)
    }

    /// Side to move: 1 (black) or 2 (red)
    #[wasm_bindgen(js_name = currentPlayer)]
    pub fn current_player(&self) -> u8 {
        self.inner.current_player() as u8 + 1
    }

    /// "drop" or "move"
    pub fn phase(&self) -> String {
        match self.inner.phase() {
            Phase::Drop => "drop".to_string(),
            Phase::Move => "move".to_string(),
        }
    }

    /// Owner of a square: 0 (empty), 1 (black) or 2 (red)
    pub fn cell(&self, col: u8, row: u8) -> u8 {
        let Some(bit) = square_bit(col, row) else {
            return 0;
        };
        let player = self.inner.current_player();
        if self.inner.mover_positions() & bit != 0 {
            player as u8 + 1
        } else if self.inner.occupied_positions() & bit != 0 {
            player.opponent() as u8 + 1
        } else {
            0
        }
    }

    /// Whether the player who just moved has completed a winning shape
    #[wasm_bindgen(js_name = isWin)]
    pub fn is_win(&self, advanced: bool) -> bool {
        self.inner.is_win(mode_of(advanced))
    }

    /// Legal transitions as JSON array
    /// Each entry is { to: [col, row], from: [col, row] | null }
    #[wasm_bindgen(js_name = legalTransitions)]
    pub fn legal_transitions(&self) -> Result<JsValue, JsValue> {
        let transitions: Vec<WasmTransition> = self
            .inner
            .transitions()
            .into_iter()
            .map(|t| WasmTransition::new(&self.inner, t))
            .collect();
        serde_wasm_bindgen::to_value(&transitions).map_err(JsValue::from)
    }

    /// Drop a marker. Returns true if the drop was legal and applied.
    #[wasm_bindgen(js_name = dropMarker)]
    pub fn drop_marker(&mut self, col: u8, row: u8) -> bool {
        let Some(bit) = square_bit(col, row) else {
            return false;
        };
        if self.inner.phase() != Phase::Drop || !self.inner.possible_drops().contains(bit) {
            return false;
        }
        self.inner.drop_marker(bit);
        true
    }

    /// Slide a marker one square. Returns true if the slide was legal and
    /// applied.
    #[wasm_bindgen(js_name = moveMarker)]
    pub fn move_marker(&mut self, from_col: u8, from_row: u8, to_col: u8, to_row: u8) -> bool {
        let (Some(from), Some(to)) = (square_bit(from_col, from_row), square_bit(to_col, to_row))
        else {
            return false;
        };
        let mov = from | to;
        if self.inner.phase() != Phase::Move || !self.inner.possible_moves().contains(mov) {
            return false;
        }
        self.inner.move_marker(mov);
        true
    }

    /// Clone the board
    #[wasm_bindgen(js_name = clone)]
    pub fn clone_board(&self) -> WasmBoard {
        WasmBoard { inner: self.inner }
    }
}

impl Default for WasmBoard {
    fn default() -> Self {
        Self::new()
    }
}

/// Perfect-play table loaded from its byte encoding
#[wasm_bindgen]
pub struct WasmTable {
    inner: PerfectPlayTable,
}

#[wasm_bindgen]
impl WasmTable {
    #[wasm_bindgen(js_name = fromBytes)]
    pub fn from_bytes(bytes: Vec<i8>) -> WasmTable {
        WasmTable {
            inner: PerfectPlayTable::from_bytes(&bytes),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[wasm_bindgen(js_name = isEmpty)]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Value byte of a position (126 win, -126 lose, 0 tie, ...)
    pub fn evaluate(&self, board: &WasmBoard) -> i8 {
        self.inner.evaluate(&board.inner).to_byte()
    }

    /// Human-readable value, e.g. "win in 7"
    pub fn describe(&self, board: &WasmBoard) -> String {
        self.inner.evaluate(&board.inner).to_string()
    }

    /// Best transition as { to, from }, or null
    #[wasm_bindgen(js_name = bestTransition)]
    pub fn best_transition(&self, board: &WasmBoard) -> Result<JsValue, JsValue> {
        match self.inner.best_transition(&board.inner) {
            Some(t) => serde_wasm_bindgen::to_value(&WasmTransition::new(&board.inner, t))
                .map_err(JsValue::from),
            None => Ok(JsValue::NULL),
        }
    }
}

/// Serializable transition for JavaScript
#[derive(serde::Serialize)]
struct WasmTransition {
    to: [u8; 2],
    from: Option<[u8; 2]>,
}

impl WasmTransition {
    fn new(board: &Board, transition: Bitboard) -> Self {
        let coords = |bit: Bitboard| {
            let square = Square::from_bit(bit).unwrap_or(Square(0));
            [square.col(), square.row()]
        };
        let source = transition & board.mover_positions();
        if source == 0 {
            WasmTransition {
                to: coords(transition),
                from: None,
            }
        } else {
            WasmTransition {
                to: coords(transition ^ source),
                from: Some(coords(source)),
            }
        }
    }
}
