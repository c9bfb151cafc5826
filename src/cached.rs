// SPDX-License-Identifier: MIT
// Cached scorer protocol.
//
// Lifecycle: `new(fixed, params)` validates the parameters and precomputes the
// fixed sequence's tables in one step (there is no observable uninitialized
// state). The scorer is then evaluated any number of times through `&self`,
// from any number of threads, and released on drop. Candidates are borrowed
// per call and never retained.

use crate::error::Result;
use crate::score::{distance_view, normalized_distance_view, normalized_similarity_view, similarity_view};
use crate::types::HashableChar;

pub trait CachedMetric: Send + Sync {
    /// Length of the fixed sequence.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rejects candidates the metric cannot score against the fixed sequence.
    /// The scoring methods assume this passed.
    fn check(&self, _len2: usize) -> Result<()> {
        Ok(())
    }

    /// Normalization constant against a candidate of length `len2`.
    fn maximum(&self, len2: usize) -> usize;

    /// Exact distance if it is `<= cutoff`, otherwise any value `> cutoff`.
    fn raw_distance<B: HashableChar>(&self, s2: &[B], cutoff: usize) -> usize;

    fn distance<B: HashableChar>(&self, s2: &[B], score_cutoff: Option<usize>) -> usize {
        distance_view(score_cutoff, |c| self.raw_distance(s2, c))
    }

    fn similarity<B: HashableChar>(&self, s2: &[B], score_cutoff: Option<usize>) -> usize {
        similarity_view(self.maximum(s2.len()), score_cutoff, |c| self.raw_distance(s2, c))
    }

    fn normalized_distance<B: HashableChar>(&self, s2: &[B], score_cutoff: Option<f64>) -> f64 {
        normalized_distance_view(self.maximum(s2.len()), score_cutoff, |c| self.raw_distance(s2, c))
    }

    fn normalized_similarity<B: HashableChar>(&self, s2: &[B], score_cutoff: Option<f64>) -> f64 {
        normalized_similarity_view(self.maximum(s2.len()), score_cutoff, |c| self.raw_distance(s2, c))
    }
}
