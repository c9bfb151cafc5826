// SPDX-License-Identifier: MIT
// One-query-against-many helpers. Each query builds one scorer through the
// dispatcher and reuses it for every choice.

use std::str::FromStr;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::dispatch::{build, MetricKind, Scorer, ScorerOptions};
use crate::error::{MetricError, Result};
use crate::types::Seq;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScoreView {
    Distance,
    Similarity,
    NormalizedDistance,
    NormalizedSimilarity,
}

impl ScoreView {
    /// Whether larger scores are better matches.
    pub fn higher_is_better(self) -> bool {
        matches!(self, ScoreView::Similarity | ScoreView::NormalizedSimilarity)
    }
}

impl FromStr for ScoreView {
    type Err = MetricError;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "distance" => Ok(ScoreView::Distance),
            "similarity" => Ok(ScoreView::Similarity),
            "normalized_distance" => Ok(ScoreView::NormalizedDistance),
            "normalized_similarity" => Ok(ScoreView::NormalizedSimilarity),
            other => Err(MetricError::InvalidParameters(format!("unknown score view: {}", other))),
        }
    }
}

/// How rows of work are scheduled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Parallelism {
    #[default]
    Sequential,
    /// Rayon's global pool, or a dedicated pool of `threads` workers.
    #[cfg(feature = "parallel")]
    Rayon { threads: Option<usize> },
}

/// Scores of `choices` under one view, widened to `f64`.
fn score_all(scorer: &dyn Scorer, choices: &[Seq<'_>], view: ScoreView) -> Result<Vec<f64>> {
    Ok(match view {
        ScoreView::Distance => scorer.distance_batch(choices)?.into_iter().map(|d| d as f64).collect(),
        ScoreView::Similarity => scorer.similarity_batch(choices)?.into_iter().map(|s| s as f64).collect(),
        ScoreView::NormalizedDistance => scorer.normalized_distance_batch(choices)?,
        ScoreView::NormalizedSimilarity => scorer.normalized_similarity_batch(choices)?,
    })
}

fn score_row(
    query: Seq<'_>,
    choices: &[Seq<'_>],
    metric: MetricKind,
    view: ScoreView,
    options: ScorerOptions,
) -> Result<Vec<f64>> {
    let scorer = build(metric, query, options)?;
    score_all(scorer.as_ref(), choices, view)
}

#[cfg(feature = "parallel")]
fn with_pool<T: Send>(threads: Option<usize>, work: impl FnOnce() -> T + Send) -> Result<T> {
    match threads {
        None => Ok(work()),
        Some(n) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| MetricError::ThreadPool(e.to_string()))?;
            Ok(pool.install(work))
        }
    }
}

/// Score matrix: `result[i][j]` scores `queries[i]` against `choices[j]`.
pub fn cdist(
    queries: &[Seq<'_>],
    choices: &[Seq<'_>],
    metric: MetricKind,
    view: ScoreView,
    options: ScorerOptions,
    parallelism: Parallelism,
) -> Result<Vec<Vec<f64>>> {
    log::debug!(
        "cdist: {} queries x {} choices, metric {}, {:?}",
        queries.len(),
        choices.len(),
        metric.name(),
        parallelism
    );
    match parallelism {
        Parallelism::Sequential => queries
            .iter()
            .map(|&q| score_row(q, choices, metric, view, options))
            .collect(),
        #[cfg(feature = "parallel")]
        Parallelism::Rayon { threads } => with_pool(threads, || {
            queries
                .par_iter()
                .map(|&q| score_row(q, choices, metric, view, options))
                .collect::<Result<Vec<_>>>()
        })?,
    }
}

/// Best matches for `query`: `(choice index, score)` pairs that pass the
/// scorer's cutoff, best first, ties in input order, at most `limit` long.
pub fn extract(
    query: Seq<'_>,
    choices: &[Seq<'_>],
    metric: MetricKind,
    view: ScoreView,
    options: ScorerOptions,
    limit: Option<usize>,
    parallelism: Parallelism,
) -> Result<Vec<(usize, f64)>> {
    let scorer = build(metric, query, options)?;
    log::debug!("extract: {} choices with {:?} backend", choices.len(), scorer.backend());

    let scores = match parallelism {
        Parallelism::Sequential => score_all(scorer.as_ref(), choices, view)?,
        #[cfg(feature = "parallel")]
        Parallelism::Rayon { threads } => {
            const CHUNK: usize = 256;
            let scorer = scorer.as_ref();
            let parts = with_pool(threads, || {
                choices
                    .par_chunks(CHUNK)
                    .map(|chunk| score_all(scorer, chunk, view))
                    .collect::<Result<Vec<_>>>()
            })??;
            parts.into_iter().flatten().collect()
        }
    };

    let mut hits: Vec<(usize, f64)> = scores
        .into_iter()
        .enumerate()
        .filter(|&(_, score)| passes(score, view, &options))
        .collect();
    if view.higher_is_better() {
        hits.sort_by(|a, b| b.1.total_cmp(&a.1));
    } else {
        hits.sort_by(|a, b| a.1.total_cmp(&b.1));
    }
    if let Some(limit) = limit {
        hits.truncate(limit);
    }
    Ok(hits)
}

/// Best single match, if any choice passes the cutoff.
pub fn extract_one(
    query: Seq<'_>,
    choices: &[Seq<'_>],
    metric: MetricKind,
    view: ScoreView,
    options: ScorerOptions,
) -> Result<Option<(usize, f64)>> {
    Ok(extract(query, choices, metric, view, options, Some(1), Parallelism::Sequential)?
        .into_iter()
        .next())
}

/// Drops results reported through a cutoff sentinel.
fn passes(score: f64, view: ScoreView, options: &ScorerOptions) -> bool {
    match view {
        ScoreView::Distance => options.score_cutoff.map_or(true, |c| score <= c as f64),
        ScoreView::Similarity => options.score_cutoff.map_or(true, |c| score >= c as f64),
        ScoreView::NormalizedDistance => options.normalized_cutoff.map_or(true, |c| score <= c),
        ScoreView::NormalizedSimilarity => options.normalized_cutoff.map_or(true, |c| score >= c),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::levenshtein::LevenshteinWeights;

    fn seqs<'a>(words: &[&'a str]) -> Vec<Seq<'a>> {
        words.iter().map(|&w| Seq::from(w)).collect()
    }

    #[test]
    fn test_view_names() {
        assert_eq!("normalized_similarity".parse::<ScoreView>().unwrap(), ScoreView::NormalizedSimilarity);
        assert!("ratio".parse::<ScoreView>().is_err());
    }

    #[test]
    fn test_cdist_sequential() {
        let queries = seqs(&["kitten", "abc"]);
        let choices = seqs(&["sitting", "abc", ""]);
        let matrix = cdist(
            &queries,
            &choices,
            MetricKind::Levenshtein(LevenshteinWeights::uniform()),
            ScoreView::Distance,
            ScorerOptions::default(),
            Parallelism::Sequential,
        )
        .unwrap();
        assert_eq!(matrix, vec![vec![3.0, 6.0, 6.0], vec![7.0, 0.0, 3.0]]);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_cdist_parallel_matches_sequential() {
        let queries = seqs(&["kitten", "abc", "", "sitting"]);
        let choices = seqs(&["sitting", "abc", "", "kitchen", "mitten"]);
        for metric in [MetricKind::Indel, MetricKind::Osa, MetricKind::DamerauLevenshtein] {
            let run = |p| cdist(&queries, &choices, metric, ScoreView::NormalizedSimilarity, ScorerOptions::default(), p);
            let seq = run(Parallelism::Sequential).unwrap();
            assert_eq!(run(Parallelism::Rayon { threads: None }).unwrap(), seq);
            assert_eq!(run(Parallelism::Rayon { threads: Some(2) }).unwrap(), seq);
        }
    }

    #[test]
    fn test_extract_orders_and_filters() {
        let choices = seqs(&["sitting", "kitten", "mitten", "xyz", "kitchen"]);
        let hits = extract(
            Seq::from("kitten"),
            &choices,
            MetricKind::Levenshtein(LevenshteinWeights::uniform()),
            ScoreView::Distance,
            ScorerOptions::default().with_score_cutoff(2),
            None,
            Parallelism::Sequential,
        )
        .unwrap();
        assert_eq!(hits, vec![(1, 0.0), (2, 1.0), (4, 2.0)]);

        let best = extract_one(
            Seq::from("kitten"),
            &choices,
            MetricKind::Indel,
            ScoreView::NormalizedSimilarity,
            ScorerOptions::default(),
        )
        .unwrap();
        assert_eq!(best, Some((1, 1.0)));
    }

    #[test]
    fn test_extract_limit_and_similarity_cutoff() {
        let choices = seqs(&["abcd", "abce", "zzzz", "abcd"]);
        let hits = extract(
            Seq::from("abcd"),
            &choices,
            MetricKind::LcsSeq,
            ScoreView::Similarity,
            ScorerOptions::default().with_score_cutoff(3),
            Some(2),
            Parallelism::Sequential,
        )
        .unwrap();
        assert_eq!(hits, vec![(0, 4.0), (3, 4.0)]);
    }

    #[test]
    fn test_extract_propagates_errors() {
        let choices = seqs(&["abc", "ab"]);
        let err = extract(
            Seq::from("abc"),
            &choices,
            MetricKind::Hamming(crate::distance::hamming::HammingParams { pad: false }),
            ScoreView::Distance,
            ScorerOptions::default(),
            None,
            Parallelism::Sequential,
        );
        assert_eq!(err, Err(MetricError::LengthMismatch { len1: 3, len2: 2 }));
    }
}
