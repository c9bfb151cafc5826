// SPDX-License-Identifier: MIT
// Score transform layer. Every metric supplies one raw kernel plus its
// normalization constant; the four views are derived here once.
//
// Sentinels:
//   distance            -> score_cutoff + 1 when the bound is exceeded
//   similarity          -> 0 when below score_cutoff
//   normalized_distance -> 1.0 when above score_cutoff
//   normalized_similarity -> 0.0 when below score_cutoff

use std::fmt::Debug;

use crate::error::Result;
use crate::types::HashableChar;

/// Slack added when a normalized similarity cutoff is turned into a
/// normalized distance cutoff, so rounding never rejects an exact hit.
pub(crate) const NORM_IMPRECISION: f64 = 0.00001;

#[inline]
pub(crate) fn norm_sim_to_norm_dist(score_cutoff: f64) -> f64 {
    (1.0 - score_cutoff + NORM_IMPRECISION).min(1.0)
}

#[inline]
fn cutoff_distance(maximum: usize, score_cutoff: f64) -> usize {
    // `as` saturates, so cutoffs above 1.0 simply admit everything
    (maximum as f64 * score_cutoff).ceil() as usize
}

// ---------------------------------------------------------------------------
// Generic views over a raw distance kernel
// ---------------------------------------------------------------------------

/// `kernel(cutoff)` must return the exact distance when it is `<= cutoff`
/// and any value `> cutoff` otherwise.
#[inline]
pub fn distance_view(score_cutoff: Option<usize>, kernel: impl FnOnce(usize) -> usize) -> usize {
    let cutoff = score_cutoff.unwrap_or(usize::MAX);
    let dist = kernel(cutoff);
    if dist <= cutoff {
        dist
    } else {
        cutoff.saturating_add(1)
    }
}

#[inline]
pub fn similarity_view(
    maximum: usize,
    score_cutoff: Option<usize>,
    kernel: impl FnOnce(usize) -> usize,
) -> usize {
    let score_cutoff = score_cutoff.unwrap_or(0);
    if score_cutoff > maximum {
        return 0;
    }
    let dist = kernel(maximum - score_cutoff);
    let sim = maximum.saturating_sub(dist);
    if sim >= score_cutoff {
        sim
    } else {
        0
    }
}

#[inline]
pub fn normalized_distance_view(
    maximum: usize,
    score_cutoff: Option<f64>,
    kernel: impl FnOnce(usize) -> usize,
) -> f64 {
    let score_cutoff = score_cutoff.unwrap_or(1.0);
    let dist = kernel(cutoff_distance(maximum, score_cutoff));
    let norm_dist = if maximum == 0 { 0.0 } else { dist as f64 / maximum as f64 };
    if norm_dist <= score_cutoff {
        norm_dist
    } else {
        1.0
    }
}

#[inline]
pub fn normalized_similarity_view(
    maximum: usize,
    score_cutoff: Option<f64>,
    kernel: impl FnOnce(usize) -> usize,
) -> f64 {
    let score_cutoff = score_cutoff.unwrap_or(0.0);
    let norm_dist = normalized_distance_view(maximum, Some(norm_sim_to_norm_dist(score_cutoff)), kernel);
    let norm_sim = 1.0 - norm_dist;
    if norm_sim >= score_cutoff {
        norm_sim
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
// Metric trait
// ---------------------------------------------------------------------------

/// One metric family: its parameters, normalization constant and raw kernel.
/// The four views are provided on top of those two functions.
pub trait Metric {
    type Params: Copy + Default + Debug + Send + Sync;

    const NAME: &'static str;

    fn validate(_params: &Self::Params) -> Result<()> {
        Ok(())
    }

    /// Largest distance two sequences of these lengths can have.
    fn maximum(len1: usize, len2: usize, params: &Self::Params) -> usize;

    /// Exact distance if it is `<= cutoff`, otherwise any value `> cutoff`.
    fn raw_distance<A: HashableChar, B: HashableChar>(
        s1: &[A],
        s2: &[B],
        params: &Self::Params,
        cutoff: usize,
    ) -> usize;

    fn distance<A: HashableChar, B: HashableChar>(
        s1: &[A],
        s2: &[B],
        params: &Self::Params,
        score_cutoff: Option<usize>,
    ) -> usize {
        distance_view(score_cutoff, |c| Self::raw_distance(s1, s2, params, c))
    }

    fn similarity<A: HashableChar, B: HashableChar>(
        s1: &[A],
        s2: &[B],
        params: &Self::Params,
        score_cutoff: Option<usize>,
    ) -> usize {
        let maximum = Self::maximum(s1.len(), s2.len(), params);
        similarity_view(maximum, score_cutoff, |c| Self::raw_distance(s1, s2, params, c))
    }

    fn normalized_distance<A: HashableChar, B: HashableChar>(
        s1: &[A],
        s2: &[B],
        params: &Self::Params,
        score_cutoff: Option<f64>,
    ) -> f64 {
        let maximum = Self::maximum(s1.len(), s2.len(), params);
        normalized_distance_view(maximum, score_cutoff, |c| Self::raw_distance(s1, s2, params, c))
    }

    fn normalized_similarity<A: HashableChar, B: HashableChar>(
        s1: &[A],
        s2: &[B],
        params: &Self::Params,
        score_cutoff: Option<f64>,
    ) -> f64 {
        let maximum = Self::maximum(s1.len(), s2.len(), params);
        normalized_similarity_view(maximum, score_cutoff, |c| Self::raw_distance(s1, s2, params, c))
    }
}
