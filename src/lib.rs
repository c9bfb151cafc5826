// SPDX-License-Identifier: MIT
// Edit-distance engine: metric kernels, score views, cached scorers,
// alignments and backend dispatch.

pub mod batch;
pub mod cached;
pub mod common;
pub mod dispatch;
pub mod distance;
pub mod error;
pub mod process;
pub mod score;
pub mod types;

pub use cached::CachedMetric;
pub use dispatch::{build, supports_vectorized, Backend, Capabilities, MetricKind, Scorer, ScorerOptions};
pub use distance::damerau_levenshtein::{CachedDamerauLevenshtein, DamerauLevenshtein};
pub use distance::editops::{EditType, Editop, Editops, MatchingBlock, Opcode, Opcodes};
pub use distance::hamming::{CachedHamming, Hamming, HammingParams};
pub use distance::indel::{CachedIndel, Indel};
pub use distance::lcs_seq::{CachedLcsSeq, LcsSeq};
pub use distance::levenshtein::{CachedLevenshtein, Levenshtein, LevenshteinWeights};
pub use distance::osa::{CachedOsa, Osa};
pub use error::{MetricError, Result};
pub use score::Metric;
pub use types::{CodeUnitWidth, HashableChar, Seq};
