//! Encoding properties over positions reached by real play.
//!
//! Random playouts from the empty board (both rule sets) check that every
//! reachable position has a key in range, that decoding gives back the
//! same markers, and that children always land in the next bucket.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use teeko_core::{Board, GameMode, Phase, StateEncoder, MARKERS_PER_SIDE, TOTAL_MARKERS};

const PLAYOUTS: usize = 300;
const MAX_PLIES: usize = 60;

/// Positions along one random game, stopping at a win.
fn playout(rng: &mut StdRng, mode: GameMode) -> Vec<Board> {
    let mut board = Board::new();
    let mut seen = vec![board];

    for _ in 0..MAX_PLIES {
        if board.is_win(mode) {
            break;
        }
        let transitions = board.transitions();
        if transitions.is_empty() {
            break;
        }
        let pick = transitions.get(rng.random_range(0..transitions.len()));
        board.apply(pick);
        seen.push(board);
    }
    seen
}

fn same_markers(a: &Board, b: &Board) -> bool {
    a.mover_positions() == b.mover_positions() && a.occupied_positions() == b.occupied_positions()
}

#[test]
fn test_playout_positions_roundtrip() {
    let encoder = StateEncoder::new();
    let mut rng = StdRng::seed_from_u64(0x7ee_c0);

    for mode in [GameMode::Regular, GameMode::Advanced] {
        for _ in 0..PLAYOUTS {
            for board in playout(&mut rng, mode) {
                assert!(board.is_consistent(), "{:?}", board);
                let key = encoder.encode(&board);
                assert!(key < encoder.max_key());

                let decoded = encoder.decode(key).expect("key in range");
                assert!(same_markers(&decoded, &board), "{:?} vs {:?}", decoded, board);
                assert_eq!(encoder.encode(&decoded), key);
            }
        }
    }
}

#[test]
fn test_children_move_to_next_bucket() {
    let encoder = StateEncoder::new();
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..PLAYOUTS {
        for board in playout(&mut rng, GameMode::Advanced) {
            let parent = encoder.bucket_of(encoder.encode(&board)).expect("in range");
            for (_, child) in board.successors() {
                let bucket = encoder.bucket_of(encoder.encode(&child)).expect("in range");
                match board.phase() {
                    Phase::Drop => assert_eq!(bucket.total(), parent.total() + 1),
                    Phase::Move => assert_eq!(bucket.total(), TOTAL_MARKERS),
                }
                // Roles swap: the old mover becomes the opponent
                let placed = (board.phase() == Phase::Drop) as u32;
                assert_eq!(child.opponent_count(), board.mover_count() + placed);
            }
        }
    }
}

#[test]
fn test_random_keys_decode_to_consistent_boards() {
    let encoder = StateEncoder::new();
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..20_000 {
        let key = rng.random_range(0..encoder.max_key());
        let board = encoder.decode(key).expect("key in range");
        assert!(board.is_consistent());
        assert!(board.mover_count() <= MARKERS_PER_SIDE);
        assert_eq!(encoder.encode(&board), key);
    }
}

#[test]
fn test_board_json_roundtrip() {
    let mut board = Board::new();
    for transition in [1 << 12, 1 << 6, 1 << 18] {
        board.apply(transition);
    }
    let json = serde_json::to_string(&board).unwrap();
    let restored: Board = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, board);
}
