// SPDX-License-Identifier: MIT
// Lane-packed batch kernels.
//
// A fixed pattern of at most 64 elements is compared against N candidates at
// once: each candidate owns one u64 lane and all lanes advance through the
// bit-parallel recurrence in lockstep. Lanes whose candidate is exhausted are
// masked so their state freezes. Results are exact, so the score views give
// the same numbers as the scalar cached scorers.

use crate::common::{low_mask, PatternMask64, WORD_BITS};
use crate::dispatch::Backend;
use crate::types::Seq;

/// Recurrence run in every lane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum LaneKernel {
    /// Myers' Levenshtein; lanes yield the unit-cost distance.
    Levenshtein,
    /// Hyyrö's LCS; lanes yield the LCS length.
    Lcs,
}

/// Precomputed fixed side of a lane-packed comparison.
#[derive(Clone, Debug)]
pub(crate) struct LanePattern {
    pm: PatternMask64,
    len: usize,
}

impl LanePattern {
    /// `None` when the fixed sequence does not fit in one lane.
    pub(crate) fn new(fixed: Seq<'_>) -> Option<Self> {
        if fixed.len() > WORD_BITS {
            return None;
        }
        let keys = fixed.to_keys();
        Some(LanePattern { pm: PatternMask64::new(&keys), len: keys.len() })
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }
}

/// Raw lane results for every candidate, in input order.
pub(crate) fn run(backend: Backend, kernel: LaneKernel, pattern: &LanePattern, candidates: &[Seq<'_>]) -> Vec<usize> {
    let mut out = Vec::with_capacity(candidates.len());
    if pattern.len == 0 {
        out.extend(candidates.iter().map(|c| match kernel {
            LaneKernel::Levenshtein => c.len(),
            LaneKernel::Lcs => 0,
        }));
        return out;
    }

    match backend {
        Backend::Scalar => lanes::<1>(kernel, pattern, candidates, &mut out),
        Backend::Lanes128 => {
            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            // SAFETY: Lanes128 is only selected after SSE2 was detected.
            unsafe {
                lanes_sse2(kernel, pattern, candidates, &mut out);
            }
            #[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
            lanes::<2>(kernel, pattern, candidates, &mut out);
        }
        Backend::Lanes256 => {
            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            // SAFETY: Lanes256 is only selected after AVX2 was detected.
            unsafe {
                lanes_avx2(kernel, pattern, candidates, &mut out);
            }
            #[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
            lanes::<4>(kernel, pattern, candidates, &mut out);
        }
    }
    out
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[target_feature(enable = "sse2")]
unsafe fn lanes_sse2(kernel: LaneKernel, pattern: &LanePattern, candidates: &[Seq<'_>], out: &mut Vec<usize>) {
    lanes::<2>(kernel, pattern, candidates, out)
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[target_feature(enable = "avx2")]
unsafe fn lanes_avx2(kernel: LaneKernel, pattern: &LanePattern, candidates: &[Seq<'_>], out: &mut Vec<usize>) {
    lanes::<4>(kernel, pattern, candidates, out)
}

#[inline(always)]
fn lanes<const N: usize>(kernel: LaneKernel, pattern: &LanePattern, candidates: &[Seq<'_>], out: &mut Vec<usize>) {
    let len1 = pattern.len;
    let last_bit: u64 = 1u64 << (len1 - 1);
    let valid = low_mask(len1);

    for chunk in candidates.chunks(N) {
        let mut lens = [0usize; N];
        for (l, c) in chunk.iter().enumerate() {
            lens[l] = c.len();
        }
        let steps = lens.iter().copied().max().unwrap_or(0);

        match kernel {
            LaneKernel::Levenshtein => {
                let mut vp = [u64::MAX; N];
                let mut vn = [0u64; N];
                let mut dist = [len1; N];

                for t in 0..steps {
                    let (x, active) = gather::<N>(&pattern.pm, chunk, &lens, t);
                    for l in 0..N {
                        let (pv, nv, pm_j, on) = (vp[l], vn[l], x[l], active[l]);
                        let d0 = (((pm_j & pv).wrapping_add(pv)) ^ pv) | pm_j | nv;
                        let hp = nv | !(d0 | pv);
                        let hn = d0 & pv;
                        let step_on = (on & 1) as usize;
                        dist[l] = dist[l] + (usize::from(hp & last_bit != 0) & step_on)
                            - (usize::from(hn & last_bit != 0) & step_on);
                        let hp = (hp << 1) | 1;
                        let hn = hn << 1;
                        vp[l] = ((hn | !(d0 | hp)) & on) | (pv & !on);
                        vn[l] = ((hp & d0) & on) | (nv & !on);
                    }
                }
                out.extend_from_slice(&dist[..chunk.len()]);
            }
            LaneKernel::Lcs => {
                let mut s = [u64::MAX; N];
                for t in 0..steps {
                    let (x, active) = gather::<N>(&pattern.pm, chunk, &lens, t);
                    for l in 0..N {
                        let (sv, on) = (s[l], active[l]);
                        let matches = x[l] & sv;
                        let next = sv.wrapping_add(matches) | (sv - matches);
                        s[l] = (next & on) | (sv & !on);
                    }
                }
                out.extend(s[..chunk.len()].iter().map(|&sv| (!sv & valid).count_ones() as usize));
            }
        }
    }
}

/// Match words for step `t` of every lane plus the per-lane activity mask.
#[inline(always)]
fn gather<const N: usize>(pm: &PatternMask64, chunk: &[Seq<'_>], lens: &[usize; N], t: usize) -> ([u64; N], [u64; N]) {
    let mut x = [0u64; N];
    let mut active = [0u64; N];
    for (l, c) in chunk.iter().enumerate() {
        if t < lens[l] {
            x[l] = pm.get(c.at(t));
            active[l] = u64::MAX;
        }
    }
    (x, active)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::{lcs_seq, levenshtein};

    fn candidates() -> Vec<Vec<u8>> {
        ["sitting", "", "k", "kitten", "mittens and more text", "ktn", "sitting on a long kitten wall"]
            .iter()
            .map(|s| s.as_bytes().to_vec())
            .collect()
    }

    #[test]
    fn test_lanes_match_scalar_kernels() {
        let fixed = b"kitten";
        let pattern = LanePattern::new(Seq::from(&fixed[..])).unwrap();
        let owned = candidates();
        let seqs: Vec<Seq<'_>> = owned.iter().map(|c| Seq::from(c.as_slice())).collect();

        for backend in [Backend::Scalar, Backend::Lanes128] {
            let dist = run(backend, LaneKernel::Levenshtein, &pattern, &seqs);
            let lcs = run(backend, LaneKernel::Lcs, &pattern, &seqs);
            for (i, c) in owned.iter().enumerate() {
                assert_eq!(dist[i], levenshtein::distance(fixed, c, Default::default(), None));
                assert_eq!(lcs[i], lcs_seq::similarity(fixed, c, None));
            }
        }
    }

    #[test]
    fn test_empty_and_oversized_patterns() {
        let empty = LanePattern::new(Seq::from("")).unwrap();
        let seqs = [Seq::from("abc"), Seq::from("")];
        assert_eq!(run(Backend::Scalar, LaneKernel::Levenshtein, &empty, &seqs), vec![3, 0]);
        assert_eq!(run(Backend::Scalar, LaneKernel::Lcs, &empty, &seqs), vec![0, 0]);

        let long = "x".repeat(65);
        assert!(LanePattern::new(Seq::from(long.as_str())).is_none());
    }

    #[test]
    fn test_full_width_pattern() {
        let fixed: Vec<u8> = (0..64).map(|i| b"abcd"[i % 4]).collect();
        let pattern = LanePattern::new(Seq::from(fixed.as_slice())).unwrap();
        let other: Vec<u8> = (0..70).map(|i| b"abcd"[(i * 3) % 4]).collect();
        let seqs = [Seq::from(other.as_slice()), Seq::from(&fixed[..10])];
        let dist = run(Backend::Scalar, LaneKernel::Levenshtein, &pattern, &seqs);
        assert_eq!(dist[0], levenshtein::distance(&fixed, &other, Default::default(), None));
        assert_eq!(dist[1], 54);
    }
}
