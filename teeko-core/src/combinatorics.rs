//! Binomial coefficients and the combinatorial number system.
//!
//! A `k`-subset of `{0..n}` is ranked by its position in the lexicographic
//! order of sorted subsets, so `{0, 1, .., k-1}` has rank 0 and
//! `{n-k, .., n-1}` has rank `C(n, k) - 1`.
//!
//! Subsets are carried in [`Combination`], a fixed-capacity buffer, so that
//! ranking and unranking never allocate.

use std::ops::Deref;

use crate::Bitboard;

/// Largest ground set size (one element per board square).
pub const MAX_N: usize = 25;

/// Binomial coefficient `C(n, k)`.
///
/// Returns 0 when `k < 0`, `k > n` or `n > 25`. Every caller treats 0 as
/// "no such combination", so out-of-domain arguments need no error path.
#[inline]
pub const fn binomial(n: i32, k: i32) -> u64 {
    if k < 0 || k > n || n > MAX_N as i32 {
        return 0;
    }
    if k == 0 || k == n {
        return 1;
    }
    let k = if k > n - k { n - k } else { k };
    let mut result: u64 = 1;
    let mut i = 0;
    while i < k {
        result = result * (n - i) as u64 / (i + 1) as u64;
        i += 1;
    }
    result
}

/// A sorted subset of `{0..25}` stored inline.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Combination {
    items: [u8; MAX_N],
    len: u8,
}

impl Combination {
    /// Create an empty combination.
    #[inline]
    pub const fn new() -> Combination {
        Combination {
            items: [0; MAX_N],
            len: 0,
        }
    }

    /// Append a value. Callers keep the values strictly increasing.
    #[inline]
    pub fn push(&mut self, value: u8) {
        debug_assert!((self.len as usize) < MAX_N);
        self.items[self.len as usize] = value;
        self.len += 1;
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.items[..self.len as usize]
    }
}

impl Default for Combination {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for Combination {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

/// Rank of a sorted, duplicate-free `subset` of `{0..n}` among all subsets
/// of the same size.
///
/// Unsorted or repeated input gives an unspecified result.
pub fn rank_combination(subset: &[u8], n: u32) -> u64 {
    let n = n as i32;
    let k = subset.len() as i32;
    let mut rank = 0;
    let mut previous = -1i32;

    for (i, &x) in subset.iter().enumerate() {
        let x = x as i32;
        // Every value skipped at this position accounts for all subsets
        // that would have used it here instead.
        for v in (previous + 1)..x {
            rank += binomial(n - 1 - v, k - 1 - i as i32);
        }
        previous = x;
    }
    rank
}

/// Inverse of [`rank_combination`]: the `k`-subset of `{0..n}` with the
/// given rank.
pub fn unrank_combination(rank: u64, k: u32, n: u32) -> Combination {
    let (k, n) = (k as i32, n as i32);
    let mut subset = Combination::new();
    let mut rank = rank;
    let mut current = 0;

    for i in 0..k {
        for v in current..n {
            let count = binomial(n - 1 - v, k - 1 - i);
            if rank < count {
                subset.push(v as u8);
                current = v + 1;
                break;
            }
            rank -= count;
        }
    }
    subset
}

/// Squares set in `bits`, ascending.
#[inline]
pub fn squares_of(bits: Bitboard) -> Combination {
    let mut squares = Combination::new();
    let mut rest = bits;
    while rest != 0 {
        squares.push(rest.trailing_zeros() as u8);
        rest &= rest - 1;
    }
    squares
}

/// Bitboard with exactly the given squares set.
#[inline]
pub fn bitboard_of(squares: &[u8]) -> Bitboard {
    squares.iter().fold(0, |bits, &sq| bits | (1 << sq))
}
