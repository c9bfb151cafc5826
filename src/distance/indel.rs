// SPDX-License-Identifier: MIT
// Indel distance: insertions and deletions only, len1 + len2 - 2 * LCS.

use crate::cached::CachedMetric;
use crate::common::{ceil_div, BlockPatternMask};
use crate::distance::editops::{Editops, Opcodes};
use crate::distance::lcs_seq;
use crate::score::Metric;
use crate::types::HashableChar;

pub struct Indel;

/// Smallest LCS that keeps the Indel distance within `cutoff`.
#[inline]
fn lcs_cutoff(maximum: usize, cutoff: usize) -> usize {
    ceil_div(maximum.saturating_sub(cutoff), 2)
}

impl Metric for Indel {
    type Params = ();

    const NAME: &'static str = "indel";

    fn maximum(len1: usize, len2: usize, _: &()) -> usize {
        len1 + len2
    }

    fn raw_distance<A: HashableChar, B: HashableChar>(s1: &[A], s2: &[B], _: &(), cutoff: usize) -> usize {
        let maximum = s1.len() + s2.len();
        let lcs = lcs_seq::similarity_with_cutoff(s1, s2, lcs_cutoff(maximum, cutoff));
        maximum - 2 * lcs
    }
}

pub fn distance<A: HashableChar, B: HashableChar>(s1: &[A], s2: &[B], score_cutoff: Option<usize>) -> usize {
    Indel::distance(s1, s2, &(), score_cutoff)
}

pub fn similarity<A: HashableChar, B: HashableChar>(s1: &[A], s2: &[B], score_cutoff: Option<usize>) -> usize {
    Indel::similarity(s1, s2, &(), score_cutoff)
}

pub fn normalized_distance<A: HashableChar, B: HashableChar>(s1: &[A], s2: &[B], score_cutoff: Option<f64>) -> f64 {
    Indel::normalized_distance(s1, s2, &(), score_cutoff)
}

pub fn normalized_similarity<A: HashableChar, B: HashableChar>(
    s1: &[A],
    s2: &[B],
    score_cutoff: Option<f64>,
) -> f64 {
    Indel::normalized_similarity(s1, s2, &(), score_cutoff)
}

pub fn editops<A: HashableChar, B: HashableChar>(s1: &[A], s2: &[B]) -> Editops {
    lcs_seq::editops(s1, s2)
}

pub fn opcodes<A: HashableChar, B: HashableChar>(s1: &[A], s2: &[B]) -> Opcodes {
    lcs_seq::opcodes(s1, s2)
}

/// Indel distance against a precomputed pattern of length `len1`.
pub(crate) fn distance_with_pattern<B: HashableChar>(
    pm: &BlockPatternMask,
    len1: usize,
    s2: &[B],
    cutoff: usize,
) -> usize {
    let maximum = len1 + s2.len();
    let lcs = lcs_seq::lcs_with_pattern(pm, len1, s2, lcs_cutoff(maximum, cutoff));
    maximum - 2 * lcs
}

#[derive(Clone, Debug)]
pub struct CachedIndel {
    len1: usize,
    pm: BlockPatternMask,
}

impl CachedIndel {
    pub fn new<A: HashableChar>(s1: &[A]) -> Self {
        CachedIndel { len1: s1.len(), pm: BlockPatternMask::new(s1) }
    }
}

impl CachedMetric for CachedIndel {
    fn len(&self) -> usize {
        self.len1
    }

    fn maximum(&self, len2: usize) -> usize {
        self.len1 + len2
    }

    fn raw_distance<B: HashableChar>(&self, s2: &[B], cutoff: usize) -> usize {
        distance_with_pattern(&self.pm, self.len1, s2, cutoff)
    }
}
