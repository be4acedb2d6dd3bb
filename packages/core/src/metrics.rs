//! Evaluation statistics for a single classification.
//!
//! No ground truth is available, so every figure here describes the shape of
//! the distribution rather than its correctness:
//!
//! - `top_k` is the largest score among the first `k` entries. On a
//!   descending distribution that is always the first entry, so every `k`
//!   reports the top-1 confidence.
//! - `confidence_margin` is the gap between the two best entries.
//! - `certainty` is `1 - H / log2(n)` with `H` the Shannon entropy of the
//!   entries present. A truncated top-N view therefore only approximates the
//!   model's full-vocabulary uncertainty.
//! - `average_confidence` is the mean score of the entries present.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sightline_types::{ScoreDistribution, percentage};
use std::collections::BTreeMap;

use crate::error::{SightlineError, SightlineResult};

/// The `k` values reported in [`MetricsSummary::top_k`].
pub const TOP_K: [usize; 3] = [1, 3, 5];

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq, Eq)]
pub struct MetricsSummary {
    pub top_k: BTreeMap<usize, u8>,
    /// Percentage points between first and second entry, 100 with a single entry
    pub confidence_margin: i32,
    pub certainty: u8,
    pub average_confidence: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

impl MetricsSummary {
    pub fn top_k(&self, k: usize) -> Option<u8> {
        self.top_k.get(&k).copied()
    }

    pub fn top1(&self) -> u8 {
        self.top_k(1).unwrap_or(0)
    }
}

/// Stateless; kept as a type so the orchestrator can own one.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsEngine;

impl MetricsEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn summarize(
        &self,
        distribution: &ScoreDistribution,
        latency_ms: Option<u64>,
    ) -> SightlineResult<MetricsSummary> {
        summarize(distribution, latency_ms)
    }
}

pub fn summarize(
    distribution: &ScoreDistribution,
    latency_ms: Option<u64>,
) -> SightlineResult<MetricsSummary> {
    let Some(average) = distribution.mean_score() else {
        return Err(SightlineError::EmptyDistribution);
    };

    let top_k = TOP_K
        .iter()
        .filter_map(|&k| {
            distribution
                .max_in_head(k)
                .map(|score| (k, to_percentage(score)))
        })
        .collect();

    let confidence_margin = distribution
        .margin()
        .map(|gap| percentage(gap).clamp(-100, 100))
        .unwrap_or(100);

    let max_entropy = distribution.max_entropy();
    let certainty = if max_entropy > 0.0 {
        to_percentage(1.0 - distribution.entropy() / max_entropy)
    } else {
        100
    };

    Ok(MetricsSummary {
        top_k,
        confidence_margin,
        certainty,
        average_confidence: to_percentage(average),
        latency_ms,
    })
}

fn to_percentage(value: f64) -> u8 {
    percentage(value).clamp(0, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use sightline_types::ClassificationResult;

    fn dist(scores: &[f64]) -> ScoreDistribution {
        scores
            .iter()
            .enumerate()
            .map(|(i, &s)| ClassificationResult::new(format!("label_{i}"), s))
            .collect()
    }

    #[test]
    fn margin_and_average_for_three_entries() {
        let summary = summarize(&dist(&[0.9, 0.3, 0.1]), None).unwrap();
        assert_eq!(summary.confidence_margin, 60);
        assert_eq!(summary.average_confidence, 43);
        assert_eq!(summary.top1(), 90);
        assert_eq!(summary.latency_ms, None);
    }

    #[test]
    fn top_k_is_top_one_for_every_k() {
        let summary = summarize(&dist(&[0.55, 0.2, 0.1, 0.08, 0.04, 0.03]), Some(12)).unwrap();
        assert_eq!(summary.top_k(1), Some(55));
        assert_eq!(summary.top_k(3), Some(55));
        assert_eq!(summary.top_k(5), Some(55));
        assert_eq!(summary.top_k(2), None);
        assert_eq!(summary.latency_ms, Some(12));
    }

    #[test]
    fn top_k_covers_short_distributions() {
        let summary = summarize(&dist(&[0.7, 0.3]), None).unwrap();
        assert_eq!(summary.top_k.len(), 3);
        assert!(summary.top_k.values().all(|&v| v == 70));
    }

    #[test]
    fn uniform_distribution_has_zero_certainty() {
        for n in [2usize, 3, 4, 5, 10] {
            let scores = vec![1.0 / n as f64; n];
            let summary = summarize(&dist(&scores), None).unwrap();
            assert_eq!(summary.certainty, 0, "n = {n}");
        }
    }

    #[test]
    fn single_entry_is_fully_certain() {
        let summary = summarize(&dist(&[0.42]), None).unwrap();
        assert_eq!(summary.certainty, 100);
        assert_eq!(summary.confidence_margin, 100);
        assert_eq!(summary.average_confidence, 42);
    }

    #[test]
    fn peaked_distribution_is_more_certain_than_flat() {
        let peaked = summarize(&dist(&[0.97, 0.01, 0.01, 0.01]), None).unwrap();
        let flat = summarize(&dist(&[0.3, 0.25, 0.25, 0.2]), None).unwrap();
        assert!(peaked.certainty > flat.certainty);
    }

    #[test]
    fn zero_scores_are_skipped_in_entropy() {
        let summary = summarize(&dist(&[1.0, 0.0]), None).unwrap();
        assert_eq!(summary.certainty, 100);
        assert_eq!(summary.confidence_margin, 100);
    }

    #[test]
    fn half_percent_scores_round_up() {
        let summary = summarize(&dist(&[0.005]), None).unwrap();
        assert_eq!(summary.top1(), 1);
        assert_eq!(summary.average_confidence, 1);

        let summary = summarize(&dist(&[0.125, 0.115]), None).unwrap();
        assert_eq!(summary.top1(), 13);
        assert_eq!(summary.average_confidence, 12);
    }

    #[test]
    fn empty_distribution_is_rejected() {
        let err = summarize(&ScoreDistribution::default(), None).unwrap_err();
        assert!(matches!(err, SightlineError::EmptyDistribution));
    }

    #[test]
    fn percentages_stay_in_range() {
        // Unnormalised scores from a misbehaving backend
        let summary = summarize(&dist(&[1.7, 1.2, -0.4]), None).unwrap();
        assert_eq!(summary.top1(), 100);
        assert!(summary.certainty <= 100);
        assert!(summary.average_confidence <= 100);
        assert!((-100..=100).contains(&summary.confidence_margin));
    }
}
