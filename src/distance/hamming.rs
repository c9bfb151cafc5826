// SPDX-License-Identifier: MIT
// Hamming distance: positional mismatches. With `pad` the shorter sequence is
// treated as padded, so every position past its end counts as a mismatch.

use crate::cached::CachedMetric;
use crate::distance::editops::{EditType, Editop, Editops, Opcodes};
use crate::error::{MetricError, Result};
use crate::score::Metric;
use crate::types::{eq, HashableChar};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HammingParams {
    pub pad: bool,
}

impl Default for HammingParams {
    fn default() -> Self {
        HammingParams { pad: true }
    }
}

impl HammingParams {
    /// Fails for unequal lengths when padding is off.
    pub fn check_lengths(&self, len1: usize, len2: usize) -> Result<()> {
        if !self.pad && len1 != len2 {
            return Err(MetricError::LengthMismatch { len1, len2 });
        }
        Ok(())
    }
}

pub struct Hamming;

impl Metric for Hamming {
    type Params = HammingParams;

    const NAME: &'static str = "hamming";

    fn maximum(len1: usize, len2: usize, _: &HammingParams) -> usize {
        len1.max(len2)
    }

    fn raw_distance<A: HashableChar, B: HashableChar>(s1: &[A], s2: &[B], _: &HammingParams, cutoff: usize) -> usize {
        mismatches(s1, s2, cutoff)
    }
}

fn mismatches<A: HashableChar, B: HashableChar>(s1: &[A], s2: &[B], cutoff: usize) -> usize {
    let mut dist = s1.len().abs_diff(s2.len());
    if dist > cutoff {
        return dist;
    }
    for (&a, &b) in s1.iter().zip(s2) {
        if !eq(a, b) {
            dist += 1;
            if dist > cutoff {
                break;
            }
        }
    }
    dist
}

pub fn distance<A: HashableChar, B: HashableChar>(
    s1: &[A],
    s2: &[B],
    params: HammingParams,
    score_cutoff: Option<usize>,
) -> Result<usize> {
    params.check_lengths(s1.len(), s2.len())?;
    Ok(Hamming::distance(s1, s2, &params, score_cutoff))
}

pub fn similarity<A: HashableChar, B: HashableChar>(
    s1: &[A],
    s2: &[B],
    params: HammingParams,
    score_cutoff: Option<usize>,
) -> Result<usize> {
    params.check_lengths(s1.len(), s2.len())?;
    Ok(Hamming::similarity(s1, s2, &params, score_cutoff))
}

pub fn normalized_distance<A: HashableChar, B: HashableChar>(
    s1: &[A],
    s2: &[B],
    params: HammingParams,
    score_cutoff: Option<f64>,
) -> Result<f64> {
    params.check_lengths(s1.len(), s2.len())?;
    Ok(Hamming::normalized_distance(s1, s2, &params, score_cutoff))
}

pub fn normalized_similarity<A: HashableChar, B: HashableChar>(
    s1: &[A],
    s2: &[B],
    params: HammingParams,
    score_cutoff: Option<f64>,
) -> Result<f64> {
    params.check_lengths(s1.len(), s2.len())?;
    Ok(Hamming::normalized_similarity(s1, s2, &params, score_cutoff))
}

/// Replaces at mismatching positions, then deletes or inserts for the tail.
pub fn editops<A: HashableChar, B: HashableChar>(s1: &[A], s2: &[B], params: HammingParams) -> Result<Editops> {
    params.check_lengths(s1.len(), s2.len())?;
    let (len1, len2) = (s1.len(), s2.len());
    let common = len1.min(len2);

    let mut ops: Vec<Editop> = s1
        .iter()
        .zip(s2)
        .enumerate()
        .filter(|&(_, (&a, &b))| !eq(a, b))
        .map(|(i, _)| Editop::new(EditType::Replace, i, i))
        .collect();
    ops.extend((common..len1).map(|i| Editop::new(EditType::Delete, i, len2)));
    ops.extend((common..len2).map(|j| Editop::new(EditType::Insert, len1, j)));

    Ok(Editops::new(ops, len1, len2))
}

pub fn opcodes<A: HashableChar, B: HashableChar>(s1: &[A], s2: &[B], params: HammingParams) -> Result<Opcodes> {
    Ok(editops(s1, s2, params)?.as_opcodes())
}

#[derive(Clone, Debug)]
pub struct CachedHamming {
    s1: Vec<u64>,
    params: HammingParams,
}

impl CachedHamming {
    pub fn new<A: HashableChar>(s1: &[A], params: HammingParams) -> Self {
        CachedHamming { s1: s1.iter().map(|c| c.key()).collect(), params }
    }

    pub fn params(&self) -> HammingParams {
        self.params
    }
}

impl CachedMetric for CachedHamming {
    fn len(&self) -> usize {
        self.s1.len()
    }

    fn check(&self, len2: usize) -> Result<()> {
        self.params.check_lengths(self.s1.len(), len2)
    }

    fn maximum(&self, len2: usize) -> usize {
        self.s1.len().max(len2)
    }

    fn raw_distance<B: HashableChar>(&self, s2: &[B], cutoff: usize) -> usize {
        mismatches(&self.s1, s2, cutoff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAD: HammingParams = HammingParams { pad: true };
    const STRICT: HammingParams = HammingParams { pad: false };

    #[test]
    fn test_equal_lengths() {
        assert_eq!(distance(b"karolin", b"kathrin", STRICT, None).unwrap(), 3);
        assert_eq!(similarity(b"karolin", b"kathrin", STRICT, None).unwrap(), 4);
        assert_eq!(distance(b"karolin", b"kathrin", STRICT, Some(2)).unwrap(), 3);
        assert_eq!(distance(b"karolin", b"kathrin", STRICT, Some(1)).unwrap(), 2);
    }

    #[test]
    fn test_padding() {
        assert_eq!(distance(b"abc", b"abcde", PAD, None).unwrap(), 2);
        assert_eq!(distance(b"", b"abc", PAD, None).unwrap(), 3);
        let nd = normalized_distance(b"abc", b"abd", PAD, None).unwrap();
        assert!((nd - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(normalized_similarity(b"", b"", PAD, None).unwrap(), 1.0);
    }

    #[test]
    fn test_length_mismatch() {
        assert_eq!(
            distance(b"abc", b"abcd", STRICT, None),
            Err(MetricError::LengthMismatch { len1: 3, len2: 4 })
        );
        assert!(editops(b"ab", b"a", STRICT).is_err());
        assert_eq!(CachedHamming::new(b"abc", STRICT).check(2), Err(MetricError::LengthMismatch { len1: 3, len2: 2 }));
    }

    #[test]
    fn test_editops() {
        let ops = editops(b"abcd", b"xbc", PAD).unwrap();
        let tags: Vec<EditType> = ops.iter().map(|op| op.tag).collect();
        assert_eq!(tags, [EditType::Replace, EditType::Delete]);
        assert_eq!(ops.apply(b"abcd", b"xbc"), b"xbc".to_vec());
        let ops = editops(b"ab", b"abcd", PAD).unwrap();
        assert_eq!(ops.apply(b"ab", b"abcd"), b"abcd".to_vec());
    }

    #[test]
    fn test_cached() {
        let cached = CachedHamming::new(b"karolin", PAD);
        assert_eq!(cached.distance(b"kathrin", None), 3);
        assert_eq!(cached.distance(b"kathrin", Some(0)), 1);
        assert_eq!(cached.similarity(b"karol", None), 5);
    }
}
