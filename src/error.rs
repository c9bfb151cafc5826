// SPDX-License-Identifier: MIT
// Error type shared by scorer construction and the fallible metric entry points.

use thiserror::Error;

/// Errors surfaced by scorer construction and fallible metric calls.
///
/// Early exit because of `score_cutoff` is never an error: it is reported
/// through the sentinel values described on each view.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetricError {
    /// Cost weights or cutoffs outside their valid range
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// Code unit width the sequence view cannot represent
    #[error("unsupported sequence width: {0} bits")]
    UnsupportedSequenceWidth(usize),

    /// Hamming distance with padding disabled on sequences of different lengths
    #[error("sequences are not the same length ({len1} != {len2})")]
    LengthMismatch { len1: usize, len2: usize },

    /// Worker pool for parallel batch scoring could not be created
    #[error("thread pool error: {0}")]
    ThreadPool(String),
}

pub type Result<T> = std::result::Result<T, MetricError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = MetricError::LengthMismatch { len1: 3, len2: 5 };
        assert_eq!(err.to_string(), "sequences are not the same length (3 != 5)");

        let err = MetricError::InvalidParameters("all weights disallowed".into());
        assert!(err.to_string().contains("all weights disallowed"));
    }
}
