// SPDX-License-Identifier: MIT
// Shared kernel helpers: common affix trimming and pattern-match tables.
// Pattern tables are keyed by the widened element key so a table built from
// one width can be probed with another.

use rustc_hash::FxHashMap;

use crate::types::{eq, HashableChar};

pub(crate) const WORD_BITS: usize = 64;

// ---------------------------------------------------------------------------
// Small arithmetic helpers
// ---------------------------------------------------------------------------

#[inline(always)]
pub(crate) fn ceil_div(a: usize, b: usize) -> usize {
    a / b + usize::from(a % b != 0)
}

/// Word with the lowest `n` bits set (`n` in `0..=64`).
#[inline(always)]
pub(crate) fn low_mask(n: usize) -> u64 {
    if n >= WORD_BITS {
        u64::MAX
    } else {
        (1u64 << n) - 1
    }
}

#[inline(always)]
pub(crate) fn words_for(len: usize) -> usize {
    ceil_div(len, WORD_BITS)
}

/// Number of set bits among the lowest `len` bits of a block vector.
#[inline]
pub(crate) fn popcount_prefix(words: &[u64], len: usize) -> usize {
    let full = len / WORD_BITS;
    let mut count: usize = words[..full].iter().map(|w| w.count_ones() as usize).sum();
    let rest = len % WORD_BITS;
    if rest != 0 {
        count += (words[full] & low_mask(rest)).count_ones() as usize;
    }
    count
}

// ---------------------------------------------------------------------------
// Common prefix / suffix
// ---------------------------------------------------------------------------

#[inline]
pub fn common_prefix<A: HashableChar, B: HashableChar>(s1: &[A], s2: &[B]) -> usize {
    s1.iter().zip(s2.iter()).take_while(|&(&a, &b)| eq(a, b)).count()
}

#[inline]
pub fn common_suffix<A: HashableChar, B: HashableChar>(s1: &[A], s2: &[B]) -> usize {
    s1.iter()
        .rev()
        .zip(s2.iter().rev())
        .take_while(|&(&a, &b)| eq(a, b))
        .count()
}

/// Both sequences with their shared prefix and suffix removed.
pub(crate) struct Trimmed<'a, A, B> {
    pub s1: &'a [A],
    pub s2: &'a [B],
    pub prefix: usize,
    pub suffix: usize,
}

#[inline]
pub(crate) fn remove_common_affix<'a, A: HashableChar, B: HashableChar>(
    s1: &'a [A],
    s2: &'a [B],
) -> Trimmed<'a, A, B> {
    let prefix = common_prefix(s1, s2);
    let s1 = &s1[prefix..];
    let s2 = &s2[prefix..];
    let suffix = common_suffix(s1, s2);
    Trimmed {
        s1: &s1[..s1.len() - suffix],
        s2: &s2[..s2.len() - suffix],
        prefix,
        suffix,
    }
}

// ---------------------------------------------------------------------------
// Pattern-match tables
// ---------------------------------------------------------------------------

/// Match table for a pattern of at most 64 elements: bit `i` of `get(c)` is
/// set iff `pattern[i] == c`.
#[derive(Clone, Debug)]
pub struct PatternMask64 {
    ascii: [u64; 256],
    fallback: FxHashMap<u64, u64>,
}

impl PatternMask64 {
    pub fn new<T: HashableChar>(pattern: &[T]) -> Self {
        debug_assert!(pattern.len() <= WORD_BITS);
        let mut pm = PatternMask64 { ascii: [0; 256], fallback: FxHashMap::default() };
        for (i, &c) in pattern.iter().enumerate() {
            pm.insert(c, 1u64 << i);
        }
        pm
    }

    #[inline(always)]
    fn insert<T: HashableChar>(&mut self, c: T, mask: u64) {
        match c.ascii_index() {
            Some(idx) => self.ascii[idx] |= mask,
            None => *self.fallback.entry(c.key()).or_insert(0) |= mask,
        }
    }

    #[inline(always)]
    pub fn get<T: HashableChar>(&self, c: T) -> u64 {
        match c.ascii_index() {
            Some(idx) => self.ascii[idx],
            None => self.fallback.get(&c.key()).copied().unwrap_or(0),
        }
    }
}

/// Match table split into 64-bit blocks for patterns of any length.
#[derive(Clone, Debug)]
pub struct BlockPatternMask {
    words: usize,
    ascii: Vec<u64>,
    fallback: FxHashMap<u64, Vec<u64>>,
    zeros: Vec<u64>,
}

impl BlockPatternMask {
    pub fn new<T: HashableChar>(pattern: &[T]) -> Self {
        let words = words_for(pattern.len()).max(1);
        let mut pm = BlockPatternMask {
            words,
            ascii: vec![0u64; 256 * words],
            fallback: FxHashMap::default(),
            zeros: vec![0u64; words],
        };
        for (i, &c) in pattern.iter().enumerate() {
            pm.set_bit(c, i / WORD_BITS, i % WORD_BITS);
        }
        pm
    }

    #[inline(always)]
    fn set_bit<T: HashableChar>(&mut self, c: T, word: usize, bit: usize) {
        match c.ascii_index() {
            Some(idx) => self.ascii[idx * self.words + word] |= 1u64 << bit,
            None => {
                let words = self.words;
                let entry = self.fallback.entry(c.key()).or_insert_with(|| vec![0u64; words]);
                entry[word] |= 1u64 << bit;
            }
        }
    }

    #[inline(always)]
    pub fn words(&self) -> usize {
        self.words
    }

    #[inline(always)]
    pub fn get<T: HashableChar>(&self, c: T) -> &[u64] {
        match c.ascii_index() {
            Some(idx) => &self.ascii[idx * self.words..(idx + 1) * self.words],
            None => self.fallback.get(&c.key()).map(|v| v.as_slice()).unwrap_or(&self.zeros),
        }
    }
}

/// Lowest 64 match bits for an element, for single-word kernels that may be
/// fed either table.
pub(crate) trait PatternLookup {
    fn first_word<T: HashableChar>(&self, c: T) -> u64;
}

impl PatternLookup for PatternMask64 {
    #[inline(always)]
    fn first_word<T: HashableChar>(&self, c: T) -> u64 {
        self.get(c)
    }
}

impl PatternLookup for BlockPatternMask {
    #[inline(always)]
    fn first_word<T: HashableChar>(&self, c: T) -> u64 {
        self.get(c)[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_affix_trimming() {
        let t = remove_common_affix(b"prefix_abc_suffix", b"prefix_xyz_suffix");
        assert_eq!(t.prefix, 7);
        assert_eq!(t.suffix, 7);
        assert_eq!(t.s1, b"abc");
        assert_eq!(t.s2, b"xyz");

        let t = remove_common_affix(b"aaa", b"aaaa");
        assert_eq!(t.prefix, 3);
        assert_eq!(t.suffix, 0);
        assert!(t.s1.is_empty());
        assert_eq!(t.s2, b"a");
    }

    #[test]
    fn test_pattern_mask_mixed_width() {
        let pattern: Vec<u32> = vec![b'a' as u32, 0x4E2D, b'a' as u32];
        let pm = PatternMask64::new(&pattern);
        assert_eq!(pm.get(b'a'), 0b101);
        assert_eq!(pm.get(0x4E2Du32), 0b010);
        assert_eq!(pm.get(b'z'), 0);
    }

    #[test]
    fn test_block_pattern_mask() {
        let pattern: Vec<u8> = (0..130).map(|i| if i % 64 == 0 { b'x' } else { b'y' }).collect();
        let pm = BlockPatternMask::new(&pattern);
        assert_eq!(pm.words(), 3);
        assert_eq!(pm.get(b'x'), &[1, 1, 1]);
        assert_eq!(pm.get(0x1F600u32), &[0, 0, 0]);
    }

    #[test]
    fn test_popcount_prefix() {
        let words = [u64::MAX, 0b1011];
        assert_eq!(popcount_prefix(&words, 64), 64);
        assert_eq!(popcount_prefix(&words, 66), 66);
        assert_eq!(popcount_prefix(&words, 128), 67);
        assert_eq!(ceil_div(7, 3), 3);
        assert_eq!(low_mask(64), u64::MAX);
    }
}
