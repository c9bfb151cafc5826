// SPDX-License-Identifier: MIT
// Optimal string alignment: Levenshtein plus transposition of two adjacent
// elements, where no substring is edited more than once.
// Bit-parallel after Hyyrö (2003), single word and multi-word blocks.

use crate::cached::CachedMetric;
use crate::common::{remove_common_affix, BlockPatternMask, PatternLookup, PatternMask64, WORD_BITS};
use crate::score::Metric;
use crate::types::HashableChar;

pub struct Osa;

impl Metric for Osa {
    type Params = ();

    const NAME: &'static str = "osa";

    fn maximum(len1: usize, len2: usize, _: &()) -> usize {
        len1.max(len2)
    }

    fn raw_distance<A: HashableChar, B: HashableChar>(s1: &[A], s2: &[B], _: &(), cutoff: usize) -> usize {
        osa_distance(s1, s2, cutoff)
    }
}

pub fn distance<A: HashableChar, B: HashableChar>(s1: &[A], s2: &[B], score_cutoff: Option<usize>) -> usize {
    Osa::distance(s1, s2, &(), score_cutoff)
}

pub fn similarity<A: HashableChar, B: HashableChar>(s1: &[A], s2: &[B], score_cutoff: Option<usize>) -> usize {
    Osa::similarity(s1, s2, &(), score_cutoff)
}

pub fn normalized_distance<A: HashableChar, B: HashableChar>(s1: &[A], s2: &[B], score_cutoff: Option<f64>) -> f64 {
    Osa::normalized_distance(s1, s2, &(), score_cutoff)
}

pub fn normalized_similarity<A: HashableChar, B: HashableChar>(
    s1: &[A],
    s2: &[B],
    score_cutoff: Option<f64>,
) -> f64 {
    Osa::normalized_similarity(s1, s2, &(), score_cutoff)
}

#[derive(Clone, Debug)]
pub struct CachedOsa {
    len1: usize,
    pm: BlockPatternMask,
}

impl CachedOsa {
    pub fn new<A: HashableChar>(s1: &[A]) -> Self {
        CachedOsa { len1: s1.len(), pm: BlockPatternMask::new(s1) }
    }
}

impl CachedMetric for CachedOsa {
    fn len(&self) -> usize {
        self.len1
    }

    fn maximum(&self, len2: usize) -> usize {
        self.len1.max(len2)
    }

    fn raw_distance<B: HashableChar>(&self, s2: &[B], cutoff: usize) -> usize {
        if self.len1.abs_diff(s2.len()) > cutoff {
            return cutoff.saturating_add(1);
        }
        if self.len1 == 0 {
            s2.len()
        } else if s2.is_empty() {
            self.len1
        } else if self.len1 <= WORD_BITS {
            osa_64(&self.pm, self.len1, s2, cutoff)
        } else {
            osa_block(&self.pm, self.len1, s2, cutoff)
        }
    }
}

fn osa_distance<A: HashableChar, B: HashableChar>(s1: &[A], s2: &[B], max: usize) -> usize {
    if s1.len() > s2.len() {
        return osa_distance(s2, s1, max);
    }
    if s2.len() - s1.len() > max {
        return max.saturating_add(1);
    }
    let t = remove_common_affix(s1, s2);
    if t.s1.is_empty() {
        return t.s2.len();
    }
    if t.s1.len() <= WORD_BITS {
        osa_64(&PatternMask64::new(t.s1), t.s1.len(), t.s2, max)
    } else {
        osa_block(&BlockPatternMask::new(t.s1), t.s1.len(), t.s2, max)
    }
}

fn osa_64<P: PatternLookup, B: HashableChar>(pm: &P, len1: usize, s2: &[B], max: usize) -> usize {
    let mut vp: u64 = u64::MAX;
    let mut vn: u64 = 0;
    let mut d0: u64 = 0;
    let mut pm_old: u64 = 0;
    let mut dist = len1;
    let mask: u64 = 1u64 << (len1 - 1);
    let len2 = s2.len();

    for (j, &c) in s2.iter().enumerate() {
        let pm_j = pm.first_word(c);
        let tr = (((!d0) & pm_j) << 1) & pm_old;
        d0 = (((pm_j & vp).wrapping_add(vp)) ^ vp) | pm_j | vn | tr;

        let hp = vn | !(d0 | vp);
        let hn = d0 & vp;
        if hp & mask != 0 {
            dist += 1;
        }
        if hn & mask != 0 {
            dist -= 1;
        }
        if dist > max.saturating_add(len2 - j - 1) {
            return max.saturating_add(1);
        }

        let hp = (hp << 1) | 1;
        let hn = hn << 1;
        vp = hn | !(d0 | hp);
        vn = hp & d0;
        pm_old = pm_j;
    }
    dist
}

fn osa_block<B: HashableChar>(pm: &BlockPatternMask, len1: usize, s2: &[B], max: usize) -> usize {
    let words = pm.words();
    let last = words - 1;
    let mask: u64 = 1u64 << ((len1 - 1) % WORD_BITS);
    let mut vp = vec![u64::MAX; words];
    let mut vn = vec![0u64; words];
    let mut d0 = vec![0u64; words];
    let zeros = vec![0u64; words];
    let mut pm_old: &[u64] = &zeros;
    let mut dist = len1;
    let len2 = s2.len();

    for (j, &c) in s2.iter().enumerate() {
        let pm_c = pm.get(c);
        let mut add_carry: u64 = 0;
        let mut hp_carry: u64 = 1;
        let mut hn_carry: u64 = 0;
        let mut tr_carry: u64 = 0;

        for w in 0..words {
            let pm_j = pm_c[w];
            let pv = vp[w];
            let nv = vn[w];

            // transposition term crosses word boundaries through its shift
            let tr_src = !d0[w] & pm_j;
            let tr = ((tr_src << 1) | tr_carry) & pm_old[w];
            tr_carry = tr_src >> 63;

            let (t, c1) = (pm_j & pv).overflowing_add(add_carry);
            let (sum, c2) = t.overflowing_add(pv);
            add_carry = u64::from(c1 | c2);
            let d = (sum ^ pv) | pm_j | nv | tr;

            let hp = nv | !(d | pv);
            let hn = d & pv;
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
            vp[w] = hn_shifted | !(d | hp_shifted);
            vn[w] = hp_shifted & d;
            d0[w] = d;
        }

        if dist > max.saturating_add(len2 - j - 1) {
            return max.saturating_add(1);
        }
        pm_old = pm_c;
    }
    dist
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive(a: &[u8], b: &[u8]) -> usize {
        let (m, n) = (a.len(), b.len());
        let mut d = vec![vec![0usize; n + 1]; m + 1];
        for (i, row) in d.iter_mut().enumerate() {
            row[0] = i;
        }
        for j in 0..=n {
            d[0][j] = j;
        }
        for i in 1..=m {
            for j in 1..=n {
                let cost = usize::from(a[i - 1] != b[j - 1]);
                d[i][j] = (d[i - 1][j] + 1).min(d[i][j - 1] + 1).min(d[i - 1][j - 1] + cost);
                if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                    d[i][j] = d[i][j].min(d[i - 2][j - 2] + 1);
                }
            }
        }
        d[m][n]
    }

    #[test]
    fn test_transpositions() {
        assert_eq!(distance(b"ab", b"ba", None), 1);
        assert_eq!(distance(b"ca", b"abc", None), 3);
        assert_eq!(distance(b"abcd", b"acbd", None), 1);
        assert_eq!(distance(b"", b"ab", None), 2);
        assert_eq!(distance(b"ab", b"ba", Some(0)), 1);
    }

    #[test]
    fn test_short_matches_naive() {
        let words: [&[u8]; 8] = [b"ab", b"ba", b"abc", b"acb", b"cab", b"tapioca", b"patioca", b"ca"];
        for a in words {
            for b in words {
                assert_eq!(distance(a, b, None), naive(a, b), "{:?} {:?}", a, b);
            }
        }
    }

    #[test]
    fn test_block_matches_naive() {
        let a: Vec<u8> = (0..150).map(|i| b"abc"[(i * 7 + i / 5) % 3]).collect();
        let mut b = a.clone();
        for k in (0..140).step_by(9) {
            b.swap(k, k + 1);
        }
        b.truncate(130);
        b.extend_from_slice(b"cabbage");
        let expected = naive(&a, &b);
        assert_eq!(distance(&a, &b, None), expected);
        let cached = CachedOsa::new(&a);
        assert_eq!(cached.distance(&b, None), expected);
        assert_eq!(cached.distance(&b, Some(expected)), expected);
    }

    #[test]
    fn test_normalized() {
        let ns = normalized_similarity(b"ab", b"ba", None);
        assert!((ns - 0.5).abs() < 1e-12);
        assert_eq!(similarity(b"abcd", b"acbd", None), 3);
    }
}
