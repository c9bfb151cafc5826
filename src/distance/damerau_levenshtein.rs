// SPDX-License-Identifier: MIT
// Unrestricted Damerau-Levenshtein distance (Zhao's banded recurrence).
// Transposed elements may be edited again, unlike OSA.

use rustc_hash::FxHashMap;

use crate::cached::CachedMetric;
use crate::common::remove_common_affix;
use crate::score::Metric;
use crate::types::{eq, HashableChar};

pub struct DamerauLevenshtein;

impl Metric for DamerauLevenshtein {
    type Params = ();

    const NAME: &'static str = "damerau_levenshtein";

    fn maximum(len1: usize, len2: usize, _: &()) -> usize {
        len1.max(len2)
    }

    fn raw_distance<A: HashableChar, B: HashableChar>(s1: &[A], s2: &[B], _: &(), cutoff: usize) -> usize {
        if s1.len().abs_diff(s2.len()) > cutoff {
            return cutoff.saturating_add(1);
        }
        let t = remove_common_affix(s1, s2);
        zhao(t.s1, t.s2, cutoff)
    }
}

pub fn distance<A: HashableChar, B: HashableChar>(s1: &[A], s2: &[B], score_cutoff: Option<usize>) -> usize {
    DamerauLevenshtein::distance(s1, s2, &(), score_cutoff)
}

pub fn similarity<A: HashableChar, B: HashableChar>(s1: &[A], s2: &[B], score_cutoff: Option<usize>) -> usize {
    DamerauLevenshtein::similarity(s1, s2, &(), score_cutoff)
}

pub fn normalized_distance<A: HashableChar, B: HashableChar>(s1: &[A], s2: &[B], score_cutoff: Option<f64>) -> f64 {
    DamerauLevenshtein::normalized_distance(s1, s2, &(), score_cutoff)
}

pub fn normalized_similarity<A: HashableChar, B: HashableChar>(
    s1: &[A],
    s2: &[B],
    score_cutoff: Option<f64>,
) -> f64 {
    DamerauLevenshtein::normalized_similarity(s1, s2, &(), score_cutoff)
}

/// No bit-parallel form exists for the unrestricted variant, so the cached
/// scorer only keeps the widened fixed sequence.
#[derive(Clone, Debug)]
pub struct CachedDamerauLevenshtein {
    s1: Vec<u64>,
}

impl CachedDamerauLevenshtein {
    pub fn new<A: HashableChar>(s1: &[A]) -> Self {
        CachedDamerauLevenshtein { s1: s1.iter().map(|c| c.key()).collect() }
    }
}

impl CachedMetric for CachedDamerauLevenshtein {
    fn len(&self) -> usize {
        self.s1.len()
    }

    fn maximum(&self, len2: usize) -> usize {
        self.s1.len().max(len2)
    }

    fn raw_distance<B: HashableChar>(&self, s2: &[B], cutoff: usize) -> usize {
        DamerauLevenshtein::raw_distance(&self.s1, s2, &(), cutoff)
    }
}

/// Zhao's linear-space recurrence over the band `|i - j| <= max`.
///
/// Only the two latest rows are kept. `fr[j]` holds `D[k-1][j-2]` for the
/// last row `k` that matched column `j`, and `t` holds `D[i-2][l-1]` for the
/// last column `l` matched in the current row. Stored values are clamped to
/// `max + 1`, and the scan stops once a whole row is above `max` since row
/// minima never decrease.
fn zhao<A: HashableChar, B: HashableChar>(s1: &[A], s2: &[B], max: usize) -> usize {
    let (len1, len2) = (s1.len(), s2.len());
    let max = max.min(len1.max(len2));
    let over = max + 1;
    if len1.abs_diff(len2) > max {
        return over;
    }
    if len1 == 0 || len2 == 0 {
        return (len1 + len2).min(over);
    }

    // column j is stored at index j + 1; index 0 is the column left of 0
    let mut prev: Vec<usize> = std::iter::once(over).chain((0..=len2).map(|j| j.min(over))).collect();
    let mut row = vec![over; len2 + 2];
    let mut fr = vec![over; len2 + 2];
    let mut fr_row = vec![0usize; len2 + 2];
    // last 1-based row of s1 holding each element
    let mut last_row: FxHashMap<u64, usize> = FxHashMap::default();

    for i in 1..=len1 {
        let a = s1[i - 1];
        let lo = if i > max { i - max } else { 1 };
        let hi = (i + max).min(len2);

        // `row` still holds row i - 2
        let mut diag_above = row[lo];
        row[lo] = if lo == 1 { i.min(over) } else { over };
        let mut row_min = row[lo];
        let mut last_col = 0usize;
        let mut t = over;

        for j in lo..=hi {
            let b = s2[j - 1];
            let p = j + 1;
            let same = eq(a, b);
            let mut best = (prev[p - 1] + usize::from(!same)).min(row[p - 1] + 1).min(prev[p] + 1);

            if same {
                last_col = j;
                fr[p] = prev[p - 2];
                fr_row[p] = i;
                t = diag_above;
            } else if last_col > 0 {
                let k = last_row.get(&b.key()).copied().unwrap_or(0);
                if k > 0 {
                    if j - last_col == 1 && fr_row[p] == k {
                        best = best.min(fr[p] + (i - k));
                    } else if i - k == 1 {
                        best = best.min(t + (j - last_col));
                    }
                }
            }

            diag_above = row[p];
            row[p] = best.min(over);
            row_min = row_min.min(row[p]);
        }
        if hi < len2 {
            row[hi + 2] = over;
        }
        if row_min > max {
            return over;
        }

        last_row.insert(a.key(), i);
        std::mem::swap(&mut prev, &mut row);
    }
    prev[len2 + 1]
}
