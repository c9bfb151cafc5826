// SPDX-License-Identifier: MIT
// Backend selection for cached scorers.
//
// Host capabilities are detected once per process. `build` picks a backend
// from (metric, parameters, fixed length, capabilities) when the scorer is
// constructed; the choice never changes afterwards. Every backend returns the
// same scores, only throughput differs.
//
// Environment overrides (read on first detection):
// - `RUSTFUZZ_FORCE_SCALAR=1`: never use lane-packed kernels
// - `RUSTFUZZ_FORCE_SSE2=1`:   cap lane width at 128 bits

use std::sync::OnceLock;

use crate::batch::{self, LaneKernel, LanePattern};
use crate::cached::CachedMetric;
use crate::distance::damerau_levenshtein::{CachedDamerauLevenshtein, DamerauLevenshtein};
use crate::distance::hamming::{CachedHamming, Hamming, HammingParams};
use crate::distance::indel::{CachedIndel, Indel};
use crate::distance::lcs_seq::{CachedLcsSeq, LcsSeq};
use crate::distance::levenshtein::{CachedLevenshtein, Levenshtein, LevenshteinWeights};
use crate::distance::osa::{CachedOsa, Osa};
use crate::error::{MetricError, Result};
use crate::score::{distance_view, normalized_distance_view, normalized_similarity_view, similarity_view, Metric};
use crate::types::{with_seq, Seq};

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// Implementation strategy behind a scorer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Backend {
    /// Cached scalar kernels, any metric and length.
    Scalar,
    /// Two 64-bit lanes per step (SSE2 / NEON).
    Lanes128,
    /// Four 64-bit lanes per step (AVX2).
    Lanes256,
}

/// Vectorized paths the host can run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub lanes128: bool,
    pub lanes256: bool,
}

impl Capabilities {
    /// Widest backend available.
    pub fn best_backend(&self) -> Backend {
        if self.lanes256 {
            Backend::Lanes256
        } else if self.lanes128 {
            Backend::Lanes128
        } else {
            Backend::Scalar
        }
    }

    pub fn supports(&self, backend: Backend) -> bool {
        match backend {
            Backend::Scalar => true,
            Backend::Lanes128 => self.lanes128,
            Backend::Lanes256 => self.lanes256,
        }
    }
}

static CAPABILITIES: OnceLock<Capabilities> = OnceLock::new();

fn env_flag(name: &str) -> bool {
    std::env::var(name).map(|v| v == "1").unwrap_or(false)
}

fn detect_capabilities() -> Capabilities {
    if env_flag("RUSTFUZZ_FORCE_SCALAR") {
        log::info!("RUSTFUZZ_FORCE_SCALAR=1: using scalar kernels only");
        return Capabilities::default();
    }

    #[allow(unused_mut)]
    let mut caps = Capabilities::default();

    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    {
        caps.lanes128 = is_x86_feature_detected!("sse2");
        caps.lanes256 = is_x86_feature_detected!("avx2");
    }

    // NEON is part of the aarch64 baseline
    #[cfg(target_arch = "aarch64")]
    {
        caps.lanes128 = true;
    }

    if caps.lanes256 && env_flag("RUSTFUZZ_FORCE_SSE2") {
        log::info!("RUSTFUZZ_FORCE_SSE2=1: capping lane width at 128 bits");
        caps.lanes256 = false;
    }

    log::debug!("detected capabilities: {:?}", caps);
    caps
}

/// Host capabilities, detected on first call and cached for the process.
#[inline]
pub fn capabilities() -> Capabilities {
    *CAPABILITIES.get_or_init(detect_capabilities)
}

// ---------------------------------------------------------------------------
// Metric selection
// ---------------------------------------------------------------------------

/// A metric family together with its parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MetricKind {
    Levenshtein(LevenshteinWeights),
    DamerauLevenshtein,
    Hamming(HammingParams),
    Indel,
    LcsSeq,
    Osa,
}

impl MetricKind {
    pub fn name(&self) -> &'static str {
        match self {
            MetricKind::Levenshtein(_) => Levenshtein::NAME,
            MetricKind::DamerauLevenshtein => DamerauLevenshtein::NAME,
            MetricKind::Hamming(_) => Hamming::NAME,
            MetricKind::Indel => Indel::NAME,
            MetricKind::LcsSeq => LcsSeq::NAME,
            MetricKind::Osa => Osa::NAME,
        }
    }

    /// Checks the metric's parameters; `build` fails with this error before
    /// any comparison runs.
    pub fn validate(&self) -> Result<()> {
        match self {
            MetricKind::Levenshtein(w) => Levenshtein::validate(w),
            MetricKind::DamerauLevenshtein => DamerauLevenshtein::validate(&()),
            MetricKind::Hamming(p) => Hamming::validate(p),
            MetricKind::Indel => Indel::validate(&()),
            MetricKind::LcsSeq => LcsSeq::validate(&()),
            MetricKind::Osa => Osa::validate(&()),
        }
    }

    /// Lane kernel that computes this metric, if any.
    fn lane_kernel(&self) -> Option<LaneKernel> {
        match self {
            MetricKind::Levenshtein(w) if w.is_uniform() => Some(LaneKernel::Levenshtein),
            MetricKind::Indel | MetricKind::LcsSeq => Some(LaneKernel::Lcs),
            _ => None,
        }
    }
}

/// Whether batch evaluation of `metric` can run vectorized on this host.
pub fn supports_vectorized(metric: MetricKind) -> bool {
    metric.lane_kernel().is_some() && capabilities().best_backend() != Backend::Scalar
}

// ---------------------------------------------------------------------------
// Scorer
// ---------------------------------------------------------------------------

/// Construction-time options of a scorer.
///
/// `score_cutoff` bounds the integer views: a maximum for `distance`, a floor
/// for `similarity`. `normalized_cutoff` does the same for the normalized
/// views and must lie in `[0, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScorerOptions {
    pub score_cutoff: Option<usize>,
    pub normalized_cutoff: Option<f64>,
    /// Request a specific backend. Ignored for metrics without a lane kernel.
    pub force_backend: Option<Backend>,
}

impl ScorerOptions {
    pub fn with_score_cutoff(mut self, cutoff: usize) -> Self {
        self.score_cutoff = Some(cutoff);
        self
    }

    pub fn with_normalized_cutoff(mut self, cutoff: f64) -> Self {
        self.normalized_cutoff = Some(cutoff);
        self
    }

    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.force_backend = Some(backend);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(c) = self.normalized_cutoff {
            if !(0.0..=1.0).contains(&c) {
                return Err(MetricError::InvalidParameters(format!(
                    "normalized cutoff {} is outside [0, 1]",
                    c
                )));
            }
        }
        if let Some(backend) = self.force_backend {
            if !capabilities().supports(backend) {
                return Err(MetricError::InvalidParameters(format!(
                    "backend {:?} is not available on this host",
                    backend
                )));
            }
        }
        Ok(())
    }
}

/// Object-safe scorer over one fixed sequence.
///
/// Evaluation borrows `&self` only, so one scorer may be shared across threads.
pub trait Scorer: Send + Sync {
    fn metric(&self) -> MetricKind;

    fn backend(&self) -> Backend;

    fn options(&self) -> &ScorerOptions;

    fn distance(&self, s2: Seq<'_>) -> Result<usize>;

    fn similarity(&self, s2: Seq<'_>) -> Result<usize>;

    fn normalized_distance(&self, s2: Seq<'_>) -> Result<f64>;

    fn normalized_similarity(&self, s2: Seq<'_>) -> Result<f64>;

    fn distance_batch(&self, candidates: &[Seq<'_>]) -> Result<Vec<usize>> {
        candidates.iter().map(|&c| self.distance(c)).collect()
    }

    fn similarity_batch(&self, candidates: &[Seq<'_>]) -> Result<Vec<usize>> {
        candidates.iter().map(|&c| self.similarity(c)).collect()
    }

    fn normalized_distance_batch(&self, candidates: &[Seq<'_>]) -> Result<Vec<f64>> {
        candidates.iter().map(|&c| self.normalized_distance(c)).collect()
    }

    fn normalized_similarity_batch(&self, candidates: &[Seq<'_>]) -> Result<Vec<f64>> {
        candidates.iter().map(|&c| self.normalized_similarity(c)).collect()
    }
}

/// Builds the scorer for `fixed`, choosing its backend once.
pub fn build(metric: MetricKind, fixed: Seq<'_>, options: ScorerOptions) -> Result<Box<dyn Scorer>> {
    metric.validate()?;
    options.validate()?;

    let lane = metric
        .lane_kernel()
        .and_then(|kernel| LanePattern::new(fixed).map(|pattern| (kernel, pattern)));
    let backend = match (&lane, options.force_backend) {
        (None, _) => Backend::Scalar,
        (Some(_), Some(forced)) => forced,
        (Some(_), None) => capabilities().best_backend(),
    };
    log::debug!(
        "building {} scorer over {} elements with {:?} backend",
        metric.name(),
        fixed.len(),
        backend
    );

    if let (Some((kernel, pattern)), Backend::Lanes128 | Backend::Lanes256) = (lane, backend) {
        return Ok(Box::new(LaneScorer { metric, backend, kernel, pattern, options }));
    }

    let scorer: Box<dyn Scorer> = match metric {
        MetricKind::Levenshtein(w) => {
            let cached = with_seq!(fixed, |s| CachedLevenshtein::new(s, w))?;
            Box::new(CachedScorer { metric, cached, options })
        }
        MetricKind::DamerauLevenshtein => {
            let cached = with_seq!(fixed, |s| CachedDamerauLevenshtein::new(s));
            Box::new(CachedScorer { metric, cached, options })
        }
        MetricKind::Hamming(params) => {
            let cached = with_seq!(fixed, |s| CachedHamming::new(s, params));
            Box::new(CachedScorer { metric, cached, options })
        }
        MetricKind::Indel => {
            let cached = with_seq!(fixed, |s| CachedIndel::new(s));
            Box::new(CachedScorer { metric, cached, options })
        }
        MetricKind::LcsSeq => {
            let cached = with_seq!(fixed, |s| CachedLcsSeq::new(s));
            Box::new(CachedScorer { metric, cached, options })
        }
        MetricKind::Osa => {
            let cached = with_seq!(fixed, |s| CachedOsa::new(s));
            Box::new(CachedScorer { metric, cached, options })
        }
    };
    Ok(scorer)
}

/// Scalar backend: a cached metric behind the object-safe interface.
struct CachedScorer<C> {
    metric: MetricKind,
    cached: C,
    options: ScorerOptions,
}

impl<C: CachedMetric> Scorer for CachedScorer<C> {
    fn metric(&self) -> MetricKind {
        self.metric
    }

    fn backend(&self) -> Backend {
        Backend::Scalar
    }

    fn options(&self) -> &ScorerOptions {
        &self.options
    }

    fn distance(&self, s2: Seq<'_>) -> Result<usize> {
        self.cached.check(s2.len())?;
        Ok(with_seq!(s2, |s| self.cached.distance(s, self.options.score_cutoff)))
    }

    fn similarity(&self, s2: Seq<'_>) -> Result<usize> {
        self.cached.check(s2.len())?;
        Ok(with_seq!(s2, |s| self.cached.similarity(s, self.options.score_cutoff)))
    }

    fn normalized_distance(&self, s2: Seq<'_>) -> Result<f64> {
        self.cached.check(s2.len())?;
        Ok(with_seq!(s2, |s| self.cached.normalized_distance(s, self.options.normalized_cutoff)))
    }

    fn normalized_similarity(&self, s2: Seq<'_>) -> Result<f64> {
        self.cached.check(s2.len())?;
        Ok(with_seq!(s2, |s| self.cached.normalized_similarity(s, self.options.normalized_cutoff)))
    }
}

/// Vectorized backend for unit-cost Levenshtein, Indel and LCS-sequence.
struct LaneScorer {
    metric: MetricKind,
    backend: Backend,
    kernel: LaneKernel,
    pattern: LanePattern,
    options: ScorerOptions,
}

impl LaneScorer {
    /// Exact distance and normalization constant for each candidate.
    fn exact(&self, candidates: &[Seq<'_>]) -> Vec<(usize, usize)> {
        let len1 = self.pattern.len();
        let raw = batch::run(self.backend, self.kernel, &self.pattern, candidates);
        raw.into_iter()
            .zip(candidates)
            .map(|(r, c)| {
                let len2 = c.len();
                match self.metric {
                    MetricKind::Indel => (len1 + len2 - 2 * r, len1 + len2),
                    MetricKind::LcsSeq => (len1.max(len2) - r, len1.max(len2)),
                    _ => (r, len1.max(len2)),
                }
            })
            .collect()
    }

    fn single(&self, s2: Seq<'_>) -> (usize, usize) {
        self.exact(&[s2])[0]
    }
}

impl Scorer for LaneScorer {
    fn metric(&self) -> MetricKind {
        self.metric
    }

    fn backend(&self) -> Backend {
        self.backend
    }

    fn options(&self) -> &ScorerOptions {
        &self.options
    }

    fn distance(&self, s2: Seq<'_>) -> Result<usize> {
        let (dist, _) = self.single(s2);
        Ok(distance_view(self.options.score_cutoff, |_| dist))
    }

    fn similarity(&self, s2: Seq<'_>) -> Result<usize> {
        let (dist, maximum) = self.single(s2);
        Ok(similarity_view(maximum, self.options.score_cutoff, |_| dist))
    }

    fn normalized_distance(&self, s2: Seq<'_>) -> Result<f64> {
        let (dist, maximum) = self.single(s2);
        Ok(normalized_distance_view(maximum, self.options.normalized_cutoff, |_| dist))
    }

    fn normalized_similarity(&self, s2: Seq<'_>) -> Result<f64> {
        let (dist, maximum) = self.single(s2);
        Ok(normalized_similarity_view(maximum, self.options.normalized_cutoff, |_| dist))
    }

    fn distance_batch(&self, candidates: &[Seq<'_>]) -> Result<Vec<usize>> {
        Ok(self
            .exact(candidates)
            .into_iter()
            .map(|(dist, _)| distance_view(self.options.score_cutoff, |_| dist))
            .collect())
    }

    fn similarity_batch(&self, candidates: &[Seq<'_>]) -> Result<Vec<usize>> {
        Ok(self
            .exact(candidates)
            .into_iter()
            .map(|(dist, maximum)| similarity_view(maximum, self.options.score_cutoff, |_| dist))
            .collect())
    }

    fn normalized_distance_batch(&self, candidates: &[Seq<'_>]) -> Result<Vec<f64>> {
        Ok(self
            .exact(candidates)
            .into_iter()
            .map(|(dist, maximum)| normalized_distance_view(maximum, self.options.normalized_cutoff, |_| dist))
            .collect())
    }

    fn normalized_similarity_batch(&self, candidates: &[Seq<'_>]) -> Result<Vec<f64>> {
        Ok(self
            .exact(candidates)
            .into_iter()
            .map(|(dist, maximum)| normalized_similarity_view(maximum, self.options.normalized_cutoff, |_| dist))
            .collect())
    }
}
