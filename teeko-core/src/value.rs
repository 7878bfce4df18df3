//! Game-theoretic values and the negamax backup rule.
//!
//! # Byte Encoding
//!
//! ```text
//!   126        Win       the side to move already has a winning shape
//!   1..=125    Distance  side to move wins; 126 - n plies away
//!   0          Tie
//!   -125..=-1  Distance  side to move loses; 126 + n plies away
//!   -126       Lose      the opponent already has a winning shape
//!   -127       Unknown   not yet resolved (working buffers only)
//!   -128       Illegal   both sides hold a winning shape
//! ```
//!
//! The byte form exists only at persistence boundaries; everything else
//! works with [`Value`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Value of a position from the perspective of the side to move.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Default, Serialize, Deserialize)]
pub enum Value {
    #[default]
    Unknown,
    Illegal,
    Win,
    Lose,
    Tie,
    /// Forced outcome at a distance; see module documentation.
    Distance(i8),
}

impl Value {
    /// Score of an immediate win.
    pub const WIN_SCORE: i8 = 126;
    pub const UNKNOWN_BYTE: i8 = -127;
    pub const ILLEGAL_BYTE: i8 = -128;

    /// Value of a score. Scores outside `[-126, 126]` become out-of-range
    /// distances, which [`Value::score`] rejects.
    #[inline]
    pub fn from_score(score: i8) -> Value {
        match score {
            Self::WIN_SCORE => Value::Win,
            0 => Value::Tie,
            s if s == -Self::WIN_SCORE => Value::Lose,
            s => Value::Distance(s),
        }
    }

    /// Score on the `[-126, 126]` scale, or `None` for `Unknown`, `Illegal`
    /// and out-of-range distances.
    #[inline]
    pub fn score(self) -> Option<i8> {
        match self {
            Value::Win => Some(Self::WIN_SCORE),
            Value::Lose => Some(-Self::WIN_SCORE),
            Value::Tie => Some(0),
            Value::Distance(n) if n.unsigned_abs() < Self::WIN_SCORE as u8 => Some(n),
            _ => None,
        }
    }

    #[inline]
    pub fn to_byte(self) -> i8 {
        match self {
            Value::Unknown => Self::UNKNOWN_BYTE,
            Value::Illegal => Self::ILLEGAL_BYTE,
            Value::Win => Self::WIN_SCORE,
            Value::Lose => -Self::WIN_SCORE,
            Value::Tie => 0,
            Value::Distance(n) => n,
        }
    }

    #[inline]
    pub fn from_byte(byte: i8) -> Value {
        match byte {
            Self::ILLEGAL_BYTE => Value::Illegal,
            Self::UNKNOWN_BYTE => Value::Unknown,
            score => Value::from_score(score),
        }
    }

    /// Win, Lose and Illegal are fixed by the initialization pass and never
    /// revisited.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, Value::Win | Value::Lose | Value::Illegal)
    }

    /// Contribution of a child to its parent's score: negated and moved one
    /// step toward zero. Unresolved children count as a tie; illegal ones
    /// contribute nothing.
    #[inline]
    pub fn backed_up(self) -> Option<i8> {
        let child = match self {
            Value::Unknown => 0,
            other => other.score()?,
        };
        let parent = -child;
        Some(parent - parent.signum())
    }

    /// Plies until the forced outcome; `None` for ties and unresolved
    /// values.
    pub fn plies(self) -> Option<u8> {
        match self {
            Value::Win | Value::Lose => Some(0),
            Value::Distance(_) => self
                .score()
                .map(|n| Self::WIN_SCORE as u8 - n.unsigned_abs()),
            _ => None,
        }
    }

    /// Side to move wins with perfect play.
    pub fn is_winning(self) -> bool {
        self.score().is_some_and(|n| n > 0)
    }

    /// Side to move loses with perfect play.
    pub fn is_losing(self) -> bool {
        self.score().is_some_and(|n| n < 0)
    }
}

/// Parent value from its children's values: the best backed-up score, or
/// `Unknown` when no child contributes.
pub fn negamax<I>(children: I) -> Value
where
    I: IntoIterator<Item = Value>,
{
    children
        .into_iter()
        .filter_map(Value::backed_up)
        .max()
        .map_or(Value::Unknown, Value::from_score)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Value::Unknown => write!(f, "unknown"),
            Value::Illegal => write!(f, "illegal"),
            Value::Win => write!(f, "win"),
            Value::Lose => write!(f, "lose"),
            Value::Tie => write!(f, "tie"),
            Value::Distance(n) => match self.plies() {
                Some(plies) if n > 0 => write!(f, "win in {}", plies),
                Some(plies) => write!(f, "lose in {}", plies),
                None => write!(f, "distance({})", n),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_roundtrip_all_bytes() {
        for byte in i8::MIN..=i8::MAX {
            assert_eq!(Value::from_byte(byte).to_byte(), byte, "byte {}", byte);
        }
    }

    #[test]
    fn test_named_bytes() {
        assert_eq!(Value::from_byte(126), Value::Win);
        assert_eq!(Value::from_byte(-126), Value::Lose);
        assert_eq!(Value::from_byte(0), Value::Tie);
        assert_eq!(Value::from_byte(-127), Value::Unknown);
        assert_eq!(Value::from_byte(-128), Value::Illegal);
        assert_eq!(Value::from_byte(5), Value::Distance(5));
        assert_eq!(Value::from_byte(127).score(), None);
    }

    #[test]
    fn test_terminal_values() {
        assert!(Value::Win.is_terminal());
        assert!(Value::Lose.is_terminal());
        assert!(Value::Illegal.is_terminal());
        assert!(!Value::Tie.is_terminal());
        assert!(!Value::Unknown.is_terminal());
        assert!(!Value::Distance(100).is_terminal());
    }

    #[test]
    fn test_backed_up_shrinks_toward_zero() {
        assert_eq!(Value::Win.backed_up(), Some(-125));
        assert_eq!(Value::Lose.backed_up(), Some(125));
        assert_eq!(Value::Tie.backed_up(), Some(0));
        assert_eq!(Value::Unknown.backed_up(), Some(0));
        assert_eq!(Value::Illegal.backed_up(), None);
        assert_eq!(Value::Distance(-1).backed_up(), Some(0));
        assert_eq!(Value::Distance(1).backed_up(), Some(0));
        assert_eq!(Value::Distance(-100).backed_up(), Some(99));
        assert_eq!(Value::Distance(100).backed_up(), Some(-99));
        assert_eq!(Value::Distance(127).backed_up(), None);
    }

    #[test]
    fn test_negamax_picks_best_child() {
        // One child where the opponent is lost: winning in one ply
        let value = negamax([Value::Tie, Value::Lose, Value::Distance(50)]);
        assert_eq!(value, Value::Distance(125));
        assert_eq!(value.plies(), Some(1));
    }

    #[test]
    fn test_negamax_all_children_winning_for_opponent() {
        let value = negamax([Value::Win, Value::Distance(120)]);
        assert_eq!(value, Value::Distance(-119));
        assert!(value.is_losing());
        assert_eq!(value.plies(), Some(7));
    }

    #[test]
    fn test_negamax_skips_illegal() {
        assert_eq!(negamax([Value::Illegal, Value::Win]), Value::Distance(-125));
        assert_eq!(negamax([Value::Illegal]), Value::Unknown);
        assert_eq!(negamax(std::iter::empty()), Value::Unknown);
    }

    #[test]
    fn test_negamax_unknown_is_tie() {
        assert_eq!(negamax([Value::Unknown, Value::Win]), Value::Tie);
    }

    #[test]
    fn test_plies_and_display() {
        assert_eq!(Value::Distance(125).to_string(), "win in 1");
        assert_eq!(Value::Distance(-124).to_string(), "lose in 2");
        assert_eq!(Value::Win.to_string(), "win");
        assert_eq!(Value::Tie.plies(), None);
        assert_eq!(Value::Lose.plies(), Some(0));
    }
}
