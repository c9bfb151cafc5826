// SPDX-License-Identifier: MIT
// Longest common subsequence (Hyyrö's bit-parallel LCS).
// distance = max(len1, len2) - LCS, similarity = LCS.

use crate::cached::CachedMetric;
use crate::common::{low_mask, popcount_prefix, remove_common_affix, BlockPatternMask, PatternLookup, PatternMask64, WORD_BITS};
use crate::distance::editops::{trivial_ops, traceback, Editops, Opcodes};
use crate::score::Metric;
use crate::types::{eq, HashableChar};

pub struct LcsSeq;

impl Metric for LcsSeq {
    type Params = ();

    const NAME: &'static str = "lcs_seq";

    fn maximum(len1: usize, len2: usize, _: &()) -> usize {
        len1.max(len2)
    }

    fn raw_distance<A: HashableChar, B: HashableChar>(s1: &[A], s2: &[B], _: &(), cutoff: usize) -> usize {
        let maximum = s1.len().max(s2.len());
        let lcs = similarity_with_cutoff(s1, s2, maximum.saturating_sub(cutoff));
        maximum - lcs
    }
}

pub fn distance<A: HashableChar, B: HashableChar>(s1: &[A], s2: &[B], score_cutoff: Option<usize>) -> usize {
    LcsSeq::distance(s1, s2, &(), score_cutoff)
}

/// Length of the longest common subsequence.
pub fn similarity<A: HashableChar, B: HashableChar>(s1: &[A], s2: &[B], score_cutoff: Option<usize>) -> usize {
    LcsSeq::similarity(s1, s2, &(), score_cutoff)
}

pub fn normalized_distance<A: HashableChar, B: HashableChar>(s1: &[A], s2: &[B], score_cutoff: Option<f64>) -> f64 {
    LcsSeq::normalized_distance(s1, s2, &(), score_cutoff)
}

pub fn normalized_similarity<A: HashableChar, B: HashableChar>(
    s1: &[A],
    s2: &[B],
    score_cutoff: Option<f64>,
) -> f64 {
    LcsSeq::normalized_similarity(s1, s2, &(), score_cutoff)
}

/// Insert/delete-only edit script; matched elements form an LCS.
pub fn editops<A: HashableChar, B: HashableChar>(s1: &[A], s2: &[B]) -> Editops {
    let t = remove_common_affix(s1, s2);
    let ops = if t.s1.is_empty() || t.s2.is_empty() {
        trivial_ops(t.s1.len(), t.s2.len(), t.prefix)
    } else {
        let matrix = LcsMatrix::new(t.s1, t.s2);
        traceback(t.s1, t.s2, false, t.prefix, |i, j| matrix.cell(i, j))
    };
    Editops::new(ops, s1.len(), s2.len())
}

pub fn opcodes<A: HashableChar, B: HashableChar>(s1: &[A], s2: &[B]) -> Opcodes {
    editops(s1, s2).as_opcodes()
}

/// LCS scorer with the fixed sequence's block match table precomputed.
#[derive(Clone, Debug)]
pub struct CachedLcsSeq {
    len1: usize,
    pm: BlockPatternMask,
}

impl CachedLcsSeq {
    pub fn new<A: HashableChar>(s1: &[A]) -> Self {
        CachedLcsSeq { len1: s1.len(), pm: BlockPatternMask::new(s1) }
    }
}

impl CachedMetric for CachedLcsSeq {
    fn len(&self) -> usize {
        self.len1
    }

    fn maximum(&self, len2: usize) -> usize {
        self.len1.max(len2)
    }

    fn raw_distance<B: HashableChar>(&self, s2: &[B], cutoff: usize) -> usize {
        let maximum = self.len1.max(s2.len());
        let lcs = lcs_with_pattern(&self.pm, self.len1, s2, maximum.saturating_sub(cutoff));
        maximum - lcs
    }
}

// ---------------------------------------------------------------------------
// Kernels
// ---------------------------------------------------------------------------

/// LCS length if it is `>= score_cutoff`, otherwise 0.
pub(crate) fn similarity_with_cutoff<A: HashableChar, B: HashableChar>(
    s1: &[A],
    s2: &[B],
    score_cutoff: usize,
) -> usize {
    // the shorter sequence becomes the bit pattern
    if s1.len() > s2.len() {
        return similarity_with_cutoff(s2, s1, score_cutoff);
    }
    let (len1, len2) = (s1.len(), s2.len());
    if score_cutoff > len1 {
        return 0;
    }

    let max_misses = len1 + len2 - 2 * score_cutoff;
    if max_misses == 0 || (max_misses == 1 && len1 == len2) {
        let same = len1 == len2 && s1.iter().zip(s2).all(|(&a, &b)| eq(a, b));
        return if same { len1 } else { 0 };
    }
    if len2 - len1 > max_misses {
        return 0;
    }

    let t = remove_common_affix(s1, s2);
    let mut lcs = t.prefix + t.suffix;
    if !t.s1.is_empty() && !t.s2.is_empty() {
        lcs += if t.s1.len() <= WORD_BITS {
            lcs_64(&PatternMask64::new(t.s1), t.s1.len(), t.s2)
        } else {
            lcs_block(&BlockPatternMask::new(t.s1), t.s1.len(), t.s2)
        };
    }
    if lcs >= score_cutoff {
        lcs
    } else {
        0
    }
}

/// LCS against a precomputed pattern; 0 when below `score_cutoff`.
pub(crate) fn lcs_with_pattern<B: HashableChar>(
    pm: &BlockPatternMask,
    len1: usize,
    s2: &[B],
    score_cutoff: usize,
) -> usize {
    if score_cutoff > len1.min(s2.len()) {
        return 0;
    }
    let lcs = if len1 == 0 || s2.is_empty() {
        0
    } else if len1 <= WORD_BITS {
        lcs_64(pm, len1, s2)
    } else {
        lcs_block(pm, len1, s2)
    };
    if lcs >= score_cutoff {
        lcs
    } else {
        0
    }
}

/// Single-word update: `S' = (S + (S & M)) | (S & !M)`.
#[inline]
pub(crate) fn lcs_64<P: PatternLookup, B: HashableChar>(pm: &P, len1: usize, s2: &[B]) -> usize {
    let mut s: u64 = u64::MAX;
    for &c in s2 {
        let matches = pm.first_word(c) & s;
        s = s.wrapping_add(matches) | (s - matches);
    }
    (!s & low_mask(len1)).count_ones() as usize
}

pub(crate) fn lcs_block<B: HashableChar>(pm: &BlockPatternMask, len1: usize, s2: &[B]) -> usize {
    let words = pm.words();
    let mut s = vec![u64::MAX; words];
    for &c in s2 {
        let pm_c = pm.get(c);
        let mut carry = false;
        for (sw, &m) in s.iter_mut().zip(pm_c) {
            let matches = m & *sw;
            let (x, c1) = sw.overflowing_add(matches);
            let (x, c2) = x.overflowing_add(u64::from(carry));
            carry = c1 | c2;
            *sw = x | (*sw - matches);
        }
    }
    len1 - popcount_prefix(&s, len1)
}

/// Column bit vectors of the LCS recurrence, kept for the traceback.
/// `D[i][j] = i + j - 2 * LCS(s1[..i], s2[..j])` and the LCS is the number of
/// cleared bits among the lowest `i` bits of column `j`.
struct LcsMatrix {
    words: usize,
    s: Vec<u64>,
}

impl LcsMatrix {
    fn new<A: HashableChar, B: HashableChar>(s1: &[A], s2: &[B]) -> Self {
        let pm = BlockPatternMask::new(s1);
        let words = pm.words();
        let mut hist = Vec::with_capacity((s2.len() + 1) * words);
        let mut s = vec![u64::MAX; words];
        hist.extend_from_slice(&s);
        for &c in s2 {
            let pm_c = pm.get(c);
            let mut carry = false;
            for (sw, &m) in s.iter_mut().zip(pm_c) {
                let matches = m & *sw;
                let (x, c1) = sw.overflowing_add(matches);
                let (x, c2) = x.overflowing_add(u64::from(carry));
                carry = c1 | c2;
                *sw = x | (*sw - matches);
            }
            hist.extend_from_slice(&s);
        }
        LcsMatrix { words, s: hist }
    }

    #[inline]
    fn cell(&self, i: usize, j: usize) -> usize {
        let col = &self.s[j * self.words..(j + 1) * self.words];
        let lcs = i - popcount_prefix(col, i);
        i + j - 2 * lcs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive_lcs(a: &[u8], b: &[u8]) -> usize {
        let mut dp = vec![vec![0usize; b.len() + 1]; a.len() + 1];
        for i in 1..=a.len() {
            for j in 1..=b.len() {
                dp[i][j] = if a[i - 1] == b[j - 1] {
                    dp[i - 1][j - 1] + 1
                } else {
                    dp[i - 1][j].max(dp[i][j - 1])
                };
            }
        }
        dp[a.len()][b.len()]
    }

    #[test]
    fn test_basic() {
        assert_eq!(similarity(b"kitten", b"sitting", None), 4);
        assert_eq!(distance(b"kitten", b"sitting", None), 3);
        assert_eq!(similarity(b"", b"abc", None), 0);
        assert_eq!(distance(b"", b"", None), 0);
        assert_eq!(normalized_similarity(b"", b"", None), 1.0);
    }

    #[test]
    fn test_cutoffs() {
        assert_eq!(similarity(b"kitten", b"sitting", Some(4)), 4);
        assert_eq!(similarity(b"kitten", b"sitting", Some(5)), 0);
        assert_eq!(distance(b"kitten", b"sitting", Some(2)), 3);
        assert_eq!(distance(b"abc", b"abc", Some(0)), 0);
        assert_eq!(distance(b"abc", b"abd", Some(0)), 1);
    }

    #[test]
    fn test_block_matches_naive() {
        let a: Vec<u8> = (0..190).map(|i| b"acgt"[(i * 7 + i / 3) % 4]).collect();
        let b: Vec<u8> = (0..230).map(|i| b"acgt"[(i * 5 + i / 4) % 4]).collect();
        let expected = naive_lcs(&a, &b);
        assert_eq!(similarity(&a, &b, None), expected);
        assert_eq!(similarity(&b, &a, None), expected);
        let cached = CachedLcsSeq::new(&a);
        assert_eq!(cached.similarity(&b, None), expected);
        assert_eq!(cached.distance(&b, None), 230 - expected);
    }

    #[test]
    fn test_editops_preserve_lcs() {
        let ops = editops(b"kitten", b"sitting");
        assert_eq!(ops.len(), 6 + 7 - 2 * 4);
        assert_eq!(ops.len(), crate::distance::indel::distance(b"kitten", b"sitting", None));
        assert_eq!(ops.as_slice(), crate::distance::indel::editops(b"kitten", b"sitting").as_slice());
        assert!(ops.iter().all(|op| op.tag != crate::distance::editops::EditType::Replace));
        assert_eq!(ops.apply(b"kitten", b"sitting"), b"sitting".to_vec());
        let blocks = ops.as_matching_blocks();
        assert_eq!(blocks.iter().map(|b| b.size).sum::<usize>(), 4);
    }

    #[test]
    fn test_cached_short_pattern() {
        let cached = CachedLcsSeq::new(b"kitten");
        for c in [&b"sitting"[..], b"", b"kitten", b"mitt"] {
            assert_eq!(cached.similarity(c, None), similarity(b"kitten", c, None));
            assert_eq!(cached.distance(c, Some(1)), distance(b"kitten", c, Some(1)));
        }
    }
}
