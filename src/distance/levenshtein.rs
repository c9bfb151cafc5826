// SPDX-License-Identifier: MIT
// Levenshtein distance.
// Uniform costs: Myers' bit-parallel algorithm (single word + multi-word blocks)
// with early exit. Arbitrary costs: reductions to uniform / Indel where the
// weights allow it, otherwise a Wagner-Fischer DP restricted to a diagonal band.

use crate::cached::CachedMetric;
use crate::common::{
    ceil_div, popcount_prefix, remove_common_affix, BlockPatternMask, PatternLookup, PatternMask64,
    WORD_BITS,
};
use crate::distance::editops::{trivial_ops, traceback, Editops, Opcodes};
use crate::distance::indel::{self, Indel};
use crate::error::{MetricError, Result};
use crate::score::Metric;
use crate::types::{eq, HashableChar};

/// Per-operation costs. `DISALLOWED` marks an operation that may never be used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LevenshteinWeights {
    pub insertion: usize,
    pub deletion: usize,
    pub substitution: usize,
}

impl LevenshteinWeights {
    pub const DISALLOWED: usize = usize::MAX;

    pub const fn new(insertion: usize, deletion: usize, substitution: usize) -> Self {
        LevenshteinWeights { insertion, deletion, substitution }
    }

    pub const fn uniform() -> Self {
        LevenshteinWeights::new(1, 1, 1)
    }

    /// Unit costs: the only weights eligible for the vectorized batch path.
    pub fn is_uniform(&self) -> bool {
        self.insertion == 1 && self.deletion == 1 && self.substitution == 1
    }

    pub fn validate(&self) -> Result<()> {
        if self.insertion == Self::DISALLOWED
            && self.deletion == Self::DISALLOWED
            && self.substitution == Self::DISALLOWED
        {
            return Err(MetricError::InvalidParameters(
                "all Levenshtein operations are disallowed".into(),
            ));
        }
        Ok(())
    }
}

impl Default for LevenshteinWeights {
    fn default() -> Self {
        LevenshteinWeights::uniform()
    }
}

pub struct Levenshtein;

impl Metric for Levenshtein {
    type Params = LevenshteinWeights;

    const NAME: &'static str = "levenshtein";

    fn validate(params: &LevenshteinWeights) -> Result<()> {
        params.validate()
    }

    fn maximum(len1: usize, len2: usize, w: &LevenshteinWeights) -> usize {
        let mut max_dist = len1
            .saturating_mul(w.deletion)
            .saturating_add(len2.saturating_mul(w.insertion));
        if len1 >= len2 {
            max_dist = max_dist.min(
                len2.saturating_mul(w.substitution)
                    .saturating_add((len1 - len2).saturating_mul(w.deletion)),
            );
        } else {
            max_dist = max_dist.min(
                len1.saturating_mul(w.substitution)
                    .saturating_add((len2 - len1).saturating_mul(w.insertion)),
            );
        }
        max_dist
    }

    fn raw_distance<A: HashableChar, B: HashableChar>(
        s1: &[A],
        s2: &[B],
        w: &LevenshteinWeights,
        cutoff: usize,
    ) -> usize {
        if w.insertion == w.deletion {
            if w.insertion == 0 {
                return 0;
            }
            let scaled = ceil_div(cutoff, w.insertion);
            if w.insertion == w.substitution {
                return uniform_distance(s1, s2, scaled).saturating_mul(w.insertion);
            }
            if w.substitution >= w.insertion.saturating_add(w.deletion) {
                return Indel::raw_distance(s1, s2, &(), scaled).saturating_mul(w.insertion);
            }
        }
        weighted_distance(s1, s2, w, cutoff)
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub fn distance<A: HashableChar, B: HashableChar>(
    s1: &[A],
    s2: &[B],
    weights: LevenshteinWeights,
    score_cutoff: Option<usize>,
) -> usize {
    Levenshtein::distance(s1, s2, &weights, score_cutoff)
}

pub fn similarity<A: HashableChar, B: HashableChar>(
    s1: &[A],
    s2: &[B],
    weights: LevenshteinWeights,
    score_cutoff: Option<usize>,
) -> usize {
    Levenshtein::similarity(s1, s2, &weights, score_cutoff)
}

pub fn normalized_distance<A: HashableChar, B: HashableChar>(
    s1: &[A],
    s2: &[B],
    weights: LevenshteinWeights,
    score_cutoff: Option<f64>,
) -> f64 {
    Levenshtein::normalized_distance(s1, s2, &weights, score_cutoff)
}

pub fn normalized_similarity<A: HashableChar, B: HashableChar>(
    s1: &[A],
    s2: &[B],
    weights: LevenshteinWeights,
    score_cutoff: Option<f64>,
) -> f64 {
    Levenshtein::normalized_similarity(s1, s2, &weights, score_cutoff)
}

/// Minimal unit-cost edit script from `s1` to `s2`.
pub fn editops<A: HashableChar, B: HashableChar>(s1: &[A], s2: &[B]) -> Editops {
    let t = remove_common_affix(s1, s2);
    let ops = if t.s1.is_empty() || t.s2.is_empty() {
        trivial_ops(t.s1.len(), t.s2.len(), t.prefix)
    } else {
        let matrix = LevenshteinMatrix::new(t.s1, t.s2);
        traceback(t.s1, t.s2, true, t.prefix, |i, j| matrix.cell(i, j))
    };
    Editops::new(ops, s1.len(), s2.len())
}

pub fn opcodes<A: HashableChar, B: HashableChar>(s1: &[A], s2: &[B]) -> Opcodes {
    editops(s1, s2).as_opcodes()
}

// ---------------------------------------------------------------------------
// Cached scorer
// ---------------------------------------------------------------------------

/// Levenshtein scorer with the fixed sequence's match table precomputed.
#[derive(Clone, Debug)]
pub struct CachedLevenshtein {
    s1: Vec<u64>,
    pm: BlockPatternMask,
    weights: LevenshteinWeights,
}

impl CachedLevenshtein {
    pub fn new<A: HashableChar>(s1: &[A], weights: LevenshteinWeights) -> Result<Self> {
        weights.validate()?;
        Ok(CachedLevenshtein {
            s1: s1.iter().map(|c| c.key()).collect(),
            pm: BlockPatternMask::new(s1),
            weights,
        })
    }

    pub fn weights(&self) -> LevenshteinWeights {
        self.weights
    }

    fn uniform_cached<B: HashableChar>(&self, s2: &[B], max: usize) -> usize {
        let len1 = self.s1.len();
        if len1.abs_diff(s2.len()) > max {
            return max.saturating_add(1);
        }
        if len1 == 0 {
            return s2.len();
        }
        if s2.is_empty() {
            return len1;
        }
        if len1 <= WORD_BITS {
            myers_64(&self.pm, len1, s2, max)
        } else {
            myers_block(&self.pm, len1, s2, max)
        }
    }
}

impl CachedMetric for CachedLevenshtein {
    fn len(&self) -> usize {
        self.s1.len()
    }

    fn maximum(&self, len2: usize) -> usize {
        Levenshtein::maximum(self.s1.len(), len2, &self.weights)
    }

    fn raw_distance<B: HashableChar>(&self, s2: &[B], cutoff: usize) -> usize {
        let w = &self.weights;
        if w.insertion == w.deletion {
            if w.insertion == 0 {
                return 0;
            }
            let scaled = ceil_div(cutoff, w.insertion);
            if w.insertion == w.substitution {
                return self.uniform_cached(s2, scaled).saturating_mul(w.insertion);
            }
            if w.substitution >= w.insertion.saturating_add(w.deletion) {
                return indel::distance_with_pattern(&self.pm, self.s1.len(), s2, scaled)
                    .saturating_mul(w.insertion);
            }
        }
        weighted_distance(&self.s1, s2, w, cutoff)
    }
}

// ---------------------------------------------------------------------------
// Uniform cost kernels
// ---------------------------------------------------------------------------

/// Unit-cost distance; exact when `<= max`, otherwise `max + 1`.
pub(crate) fn uniform_distance<A: HashableChar, B: HashableChar>(s1: &[A], s2: &[B], max: usize) -> usize {
    // the shorter sequence becomes the bit pattern
    if s1.len() > s2.len() {
        return uniform_distance(s2, s1, max);
    }
    if max == 0 {
        let same = s1.len() == s2.len() && s1.iter().zip(s2).all(|(&a, &b)| eq(a, b));
        return usize::from(!same);
    }
    if s2.len() - s1.len() > max {
        return max.saturating_add(1);
    }

    let t = remove_common_affix(s1, s2);
    if t.s1.is_empty() {
        return t.s2.len();
    }
    if t.s1.len() <= WORD_BITS {
        let pm = PatternMask64::new(t.s1);
        myers_64(&pm, t.s1.len(), t.s2, max)
    } else {
        let pm = BlockPatternMask::new(t.s1);
        myers_block(&pm, t.s1.len(), t.s2, max)
    }
}

/// Myers (1999) for a pattern of `len1 <= 64` elements.
pub(crate) fn myers_64<P: PatternLookup, B: HashableChar>(pm: &P, len1: usize, s2: &[B], max: usize) -> usize {
    let mut vp: u64 = u64::MAX;
    let mut vn: u64 = 0;
    let mut dist = len1;
    let mask: u64 = 1u64 << (len1 - 1);
    let len2 = s2.len();

    for (j, &c) in s2.iter().enumerate() {
        let pm_j = pm.first_word(c);
        let x = pm_j | vn;
        let d0 = (((pm_j & vp).wrapping_add(vp)) ^ vp) | x;
        let hp = vn | !(d0 | vp);
        let hn = d0 & vp;
        if hp & mask != 0 {
            dist += 1;
        }
        if hn & mask != 0 {
            dist -= 1;
        }
        // each remaining column lowers the distance by at most one
        if dist > max.saturating_add(len2 - j - 1) {
            return max.saturating_add(1);
        }
        let hp = (hp << 1) | 1;
        let hn = hn << 1;
        vp = hn | !(d0 | hp);
        vn = hp & d0;
    }
    dist
}

/// Myers over 64-bit blocks; the bit vectors behave as one wide integer.
pub(crate) fn myers_block<B: HashableChar>(pm: &BlockPatternMask, len1: usize, s2: &[B], max: usize) -> usize {
    let words = pm.words();
    let mut vp = vec![u64::MAX; words];
    let mut vn = vec![0u64; words];
    let mut dist = len1;
    let last = words - 1;
    let mask: u64 = 1u64 << ((len1 - 1) % WORD_BITS);
    let len2 = s2.len();

    for (j, &c) in s2.iter().enumerate() {
        let pm_c = pm.get(c);
        let mut add_carry: u64 = 0;
        let mut hp_carry: u64 = 1;
        let mut hn_carry: u64 = 0;

        for w in 0..words {
            let pm_j = pm_c[w];
            let pv = vp[w];
            let nv = vn[w];

            let (t, c1) = (pm_j & pv).overflowing_add(add_carry);
            let (sum, c2) = t.overflowing_add(pv);
            add_carry = u64::from(c1 | c2);
            let d0 = (sum ^ pv) | pm_j | nv;

            let hp = nv | !(d0 | pv);
            let hn = d0 & pv;
            if w == last {
                if hp & mask != 0 {
                    dist += 1;
                }
                if hn & mask != 0 {
                    dist -= 1;
                }
            }

            let hp_shifted = (hp << 1) | hp_carry;
            let hn_shifted = (hn << 1) | hn_carry;
            hp_carry = hp >> 63;
            hn_carry = hn >> 63;
            vp[w] = hn_shifted | !(d0 | hp_shifted);
            vn[w] = hp_shifted & d0;
        }

        if dist > max.saturating_add(len2 - j - 1) {
            return max.saturating_add(1);
        }
    }
    dist
}

/// Vertical delta vectors for every column, kept for the traceback.
/// `D[i][j] = j + popcount(VP_j[..i]) - popcount(VN_j[..i])`.
struct LevenshteinMatrix {
    words: usize,
    vp: Vec<u64>,
    vn: Vec<u64>,
}

impl LevenshteinMatrix {
    fn new<A: HashableChar, B: HashableChar>(s1: &[A], s2: &[B]) -> Self {
        let pm = BlockPatternMask::new(s1);
        let words = pm.words();
        let mut vp_hist = Vec::with_capacity((s2.len() + 1) * words);
        let mut vn_hist = Vec::with_capacity((s2.len() + 1) * words);
        let mut vp = vec![u64::MAX; words];
        let mut vn = vec![0u64; words];
        vp_hist.extend_from_slice(&vp);
        vn_hist.extend_from_slice(&vn);

        for &c in s2 {
            let pm_c = pm.get(c);
            let mut add_carry: u64 = 0;
            let mut hp_carry: u64 = 1;
            let mut hn_carry: u64 = 0;
            for w in 0..words {
                let pm_j = pm_c[w];
                let pv = vp[w];
                let nv = vn[w];
                let (t, c1) = (pm_j & pv).overflowing_add(add_carry);
                let (sum, c2) = t.overflowing_add(pv);
                add_carry = u64::from(c1 | c2);
                let d0 = (sum ^ pv) | pm_j | nv;
                let hp = nv | !(d0 | pv);
                let hn = d0 & pv;
                let hp_shifted = (hp << 1) | hp_carry;
                let hn_shifted = (hn << 1) | hn_carry;
                hp_carry = hp >> 63;
                hn_carry = hn >> 63;
                vp[w] = hn_shifted | !(d0 | hp_shifted);
                vn[w] = hp_shifted & d0;
            }
            vp_hist.extend_from_slice(&vp);
            vn_hist.extend_from_slice(&vn);
        }
        LevenshteinMatrix { words, vp: vp_hist, vn: vn_hist }
    }

    #[inline]
    fn cell(&self, i: usize, j: usize) -> usize {
        let row = j * self.words..(j + 1) * self.words;
        j + popcount_prefix(&self.vp[row.clone()], i) - popcount_prefix(&self.vn[row], i)
    }
}

// ---------------------------------------------------------------------------
// Weighted kernel
// ---------------------------------------------------------------------------

const INF: usize = usize::MAX;

/// Wagner-Fischer with arbitrary costs. With a finite `max`, only cells whose
/// diagonal offset `k` satisfies `k * min(ins, del) <= max` are evaluated.
pub(crate) fn weighted_distance<A: HashableChar, B: HashableChar>(
    s1: &[A],
    s2: &[B],
    w: &LevenshteinWeights,
    max: usize,
) -> usize {
    let t = remove_common_affix(s1, s2);
    let (s1, s2) = (t.s1, t.s2);
    let (len1, len2) = (s1.len(), s2.len());

    let lower_bound = if len1 >= len2 {
        (len1 - len2).saturating_mul(w.deletion)
    } else {
        (len2 - len1).saturating_mul(w.insertion)
    };
    if lower_bound > max {
        return max.saturating_add(1);
    }

    let min_indel = w.insertion.min(w.deletion);
    let band = if min_indel == 0 || max == INF { len1.max(len2) } else { max / min_indel };

    let mut cache: Vec<usize> = (0..=len2)
        .map(|j| if j <= band { j.saturating_mul(w.insertion) } else { INF })
        .collect();

    for i in 1..=len1 {
        let lo = i.saturating_sub(band);
        let hi = len2.min(i.saturating_add(band));
        let mut row_min = INF;

        let (mut diag, start) = if lo == 0 {
            let diag = cache[0];
            cache[0] = i.saturating_mul(w.deletion);
            row_min = cache[0];
            (diag, 1)
        } else {
            let diag = cache[lo - 1];
            cache[lo - 1] = INF;
            (diag, lo)
        };

        let c1 = s1[i - 1];
        for j in start..=hi {
            let above = cache[j];
            let left = cache[j - 1];
            let sub = if eq(c1, s2[j - 1]) { 0 } else { w.substitution };
            let value = diag
                .saturating_add(sub)
                .min(above.saturating_add(w.deletion))
                .min(left.saturating_add(w.insertion));
            diag = above;
            cache[j] = value;
            row_min = row_min.min(value);
        }

        if row_min > max {
            return max.saturating_add(1);
        }
    }

    let dist = cache[len2];
    if dist <= max {
        dist
    } else {
        max.saturating_add(1)
    }
}
