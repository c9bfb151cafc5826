// SPDX-License-Identifier: MIT
// Property-based checks over randomly generated sequences.

use proptest::prelude::*;
use rustfuzz_core::distance::{damerau_levenshtein, hamming, indel, lcs_seq, levenshtein, osa};
use rustfuzz_core::{build, Backend, HammingParams, LevenshteinWeights, MetricKind, ScorerOptions, Seq};

const UNIFORM: LevenshteinWeights = LevenshteinWeights::uniform();

/// Small alphabet so that matches, transpositions and repeats are common.
fn arb_seq(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(prop::sample::select(b"abcde".to_vec()), 0..max_len)
}

fn arb_weights() -> impl Strategy<Value = LevenshteinWeights> {
    (0usize..4, 0usize..4, 0usize..5).prop_map(|(i, d, s)| LevenshteinWeights::new(i, d, s))
}

/// Reference Wagner-Fischer used as the oracle.
fn oracle(a: &[u8], b: &[u8], w: &LevenshteinWeights) -> usize {
    let mut prev: Vec<usize> = (0..=b.len()).map(|j| j * w.insertion).collect();
    for i in 1..=a.len() {
        let mut curr = vec![i * w.deletion; b.len() + 1];
        for j in 1..=b.len() {
            let sub = if a[i - 1] == b[j - 1] { 0 } else { w.substitution };
            curr[j] = (prev[j - 1] + sub).min(prev[j] + w.deletion).min(curr[j - 1] + w.insertion);
        }
        prev = curr;
    }
    prev[b.len()]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn symmetry(a in arb_seq(90), b in arb_seq(90)) {
        prop_assert_eq!(levenshtein::distance(&a, &b, UNIFORM, None), levenshtein::distance(&b, &a, UNIFORM, None));
        prop_assert_eq!(indel::distance(&a, &b, None), indel::distance(&b, &a, None));
        prop_assert_eq!(lcs_seq::distance(&a, &b, None), lcs_seq::distance(&b, &a, None));
        prop_assert_eq!(osa::distance(&a, &b, None), osa::distance(&b, &a, None));
        prop_assert_eq!(damerau_levenshtein::distance(&a, &b, None), damerau_levenshtein::distance(&b, &a, None));
        let p = HammingParams::default();
        prop_assert_eq!(hamming::distance(&a, &b, p, None).unwrap(), hamming::distance(&b, &a, p, None).unwrap());
    }

    #[test]
    fn identity(a in arb_seq(100)) {
        prop_assert_eq!(levenshtein::distance(&a, &a, UNIFORM, None), 0);
        prop_assert_eq!(osa::distance(&a, &a, None), 0);
        prop_assert_eq!(damerau_levenshtein::distance(&a, &a, None), 0);
        prop_assert_eq!(indel::normalized_similarity(&a, &a, None), 1.0);
        prop_assert_eq!(lcs_seq::normalized_similarity(&a, &a, None), 1.0);
        prop_assert_eq!(hamming::normalized_similarity(&a, &a, HammingParams::default(), None).unwrap(), 1.0);
    }

    #[test]
    fn normalized_views_complement(a in arb_seq(80), b in arb_seq(80), w in arb_weights()) {
        let pairs = [
            (levenshtein::normalized_distance(&a, &b, w, None), levenshtein::normalized_similarity(&a, &b, w, None)),
            (indel::normalized_distance(&a, &b, None), indel::normalized_similarity(&a, &b, None)),
            (lcs_seq::normalized_distance(&a, &b, None), lcs_seq::normalized_similarity(&a, &b, None)),
            (osa::normalized_distance(&a, &b, None), osa::normalized_similarity(&a, &b, None)),
            (damerau_levenshtein::normalized_distance(&a, &b, None), damerau_levenshtein::normalized_similarity(&a, &b, None)),
        ];
        for (nd, ns) in pairs {
            prop_assert!((0.0..=1.0).contains(&nd));
            prop_assert!((nd + ns - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn levenshtein_triangle_inequality(a in arb_seq(70), b in arb_seq(70), c in arb_seq(70)) {
        let ab = levenshtein::distance(&a, &b, UNIFORM, None);
        let bc = levenshtein::distance(&b, &c, UNIFORM, None);
        let ac = levenshtein::distance(&a, &c, UNIFORM, None);
        prop_assert!(ac <= ab + bc);
    }

    #[test]
    fn weighted_matches_oracle(a in arb_seq(40), b in arb_seq(40), w in arb_weights()) {
        prop_assert_eq!(levenshtein::distance(&a, &b, w, None), oracle(&a, &b, &w));
    }

    #[test]
    fn bound_enforcement(a in arb_seq(140), b in arb_seq(140), k in 0usize..40, w in arb_weights()) {
        let exact = levenshtein::distance(&a, &b, UNIFORM, None);
        let expected = if exact <= k { exact } else { k + 1 };
        prop_assert_eq!(levenshtein::distance(&a, &b, UNIFORM, Some(k)), expected);

        let exact = levenshtein::distance(&a, &b, w, None);
        let expected = if exact <= k { exact } else { k + 1 };
        prop_assert_eq!(levenshtein::distance(&a, &b, w, Some(k)), expected);

        for (exact, bounded) in [
            (indel::distance(&a, &b, None), indel::distance(&a, &b, Some(k))),
            (lcs_seq::distance(&a, &b, None), lcs_seq::distance(&a, &b, Some(k))),
            (osa::distance(&a, &b, None), osa::distance(&a, &b, Some(k))),
            (damerau_levenshtein::distance(&a, &b, None), damerau_levenshtein::distance(&a, &b, Some(k))),
        ] {
            prop_assert_eq!(bounded, if exact <= k { exact } else { k + 1 });
        }
    }

    #[test]
    fn editops_reproduce_target(a in arb_seq(150), b in arb_seq(150)) {
        let ops = levenshtein::editops(&a, &b);
        prop_assert_eq!(ops.len(), levenshtein::distance(&a, &b, UNIFORM, None));
        prop_assert_eq!(ops.apply(&a, &b), b.clone());
        prop_assert_eq!(ops.as_opcodes().apply(&a, &b), b.clone());

        let ops = indel::editops(&a, &b);
        prop_assert_eq!(ops.len(), indel::distance(&a, &b, None));
        prop_assert_eq!(ops.apply(&a, &b), b.clone());

        let ops = lcs_seq::editops(&a, &b);
        prop_assert_eq!(ops.apply(&a, &b), b.clone());

        let ops = hamming::editops(&a, &b, HammingParams::default()).unwrap();
        prop_assert_eq!(ops.len(), hamming::distance(&a, &b, HammingParams::default(), None).unwrap());
        prop_assert_eq!(ops.apply(&a, &b), b.clone());
    }

    #[test]
    fn osa_between_levenshtein_and_damerau(a in arb_seq(80), b in arb_seq(80)) {
        let lev = levenshtein::distance(&a, &b, UNIFORM, None);
        let osa = osa::distance(&a, &b, None);
        let dl = damerau_levenshtein::distance(&a, &b, None);
        prop_assert!(dl <= osa);
        prop_assert!(osa <= lev);
    }

    #[test]
    fn scalar_and_batch_agree(
        fixed in arb_seq(64),
        choices in prop::collection::vec(arb_seq(100), 0..12),
        cutoff in prop::option::of(0usize..20),
    ) {
        let seqs: Vec<Seq<'_>> = choices.iter().map(|c| Seq::from(c.as_slice())).collect();
        let best = rustfuzz_core::dispatch::capabilities().best_backend();
        let options = ScorerOptions { score_cutoff: cutoff, normalized_cutoff: Some(0.5), force_backend: None };

        for metric in [MetricKind::Levenshtein(UNIFORM), MetricKind::Indel, MetricKind::LcsSeq] {
            let scalar = build(metric, Seq::from(fixed.as_slice()), options.with_backend(Backend::Scalar)).unwrap();
            let fast = build(metric, Seq::from(fixed.as_slice()), options.with_backend(best)).unwrap();
            prop_assert_eq!(scalar.distance_batch(&seqs).unwrap(), fast.distance_batch(&seqs).unwrap());
            prop_assert_eq!(scalar.similarity_batch(&seqs).unwrap(), fast.similarity_batch(&seqs).unwrap());
            prop_assert_eq!(scalar.normalized_distance_batch(&seqs).unwrap(), fast.normalized_distance_batch(&seqs).unwrap());
            prop_assert_eq!(scalar.normalized_similarity_batch(&seqs).unwrap(), fast.normalized_similarity_batch(&seqs).unwrap());
        }
    }
}
