//! Ranked label/score distributions and the pure helpers that read them.
//!
//! A [`ScoreDistribution`] is ordered by whoever produced it (descending by
//! score). Nothing in here re-sorts an existing distribution; only
//! [`ScoreDistribution::from_scores`], which *is* a producer, sorts.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One ranked class prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClassificationResult {
    /// Class identifier as reported by the model
    pub label: String,
    /// Probability-like score in [0, 1]
    pub score: f64,
}

impl ClassificationResult {
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// Ordered (descending) sequence of class predictions, possibly a top-N view
/// of the model's full output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ScoreDistribution(Vec<ClassificationResult>);

impl ScoreDistribution {
    /// Wrap entries exactly as the producer ordered them.
    pub fn new(entries: Vec<ClassificationResult>) -> Self {
        Self(entries)
    }

    /// Build a distribution from a full score vector: pairs every score with
    /// its label (`class_{idx}` when the label list is short), sorts
    /// descending and keeps the first `top_n` entries.
    pub fn from_scores(labels: &[String], scores: &[f64], top_n: usize) -> Self {
        let mut entries: Vec<ClassificationResult> = scores
            .iter()
            .enumerate()
            .map(|(idx, &score)| {
                let label = labels
                    .get(idx)
                    .cloned()
                    .unwrap_or_else(|| format!("class_{}", idx));
                ClassificationResult { label, score }
            })
            .collect();

        entries.sort_by(|a, b| b.score.total_cmp(&a.score));
        entries.truncate(top_n);
        Self(entries)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn entries(&self) -> &[ClassificationResult] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ClassificationResult> {
        self.0.iter()
    }

    pub fn into_inner(self) -> Vec<ClassificationResult> {
        self.0
    }

    /// Highest-ranked entry.
    pub fn top(&self) -> Option<&ClassificationResult> {
        self.0.first()
    }

    /// The first `min(k, len)` entries.
    pub fn head(&self, k: usize) -> &[ClassificationResult] {
        &self.0[..k.min(self.0.len())]
    }

    /// Largest score among the first `min(k, len)` entries.
    pub fn max_in_head(&self, k: usize) -> Option<f64> {
        self.head(k)
            .iter()
            .map(|r| r.score)
            .reduce(f64::max)
    }

    /// Gap between the first and second score, `None` with fewer than two entries.
    pub fn margin(&self) -> Option<f64> {
        match self.0.as_slice() {
            [first, second, ..] => Some(first.score - second.score),
            _ => None,
        }
    }

    /// Shannon entropy in bits over the entries present (zero scores skipped).
    ///
    /// On a truncated view this is an approximation of the model's
    /// full-vocabulary uncertainty.
    pub fn entropy(&self) -> f64 {
        -self
            .0
            .iter()
            .map(|r| r.score)
            .filter(|&p| p > 0.0)
            .map(|p| p * p.log2())
            .sum::<f64>()
    }

    /// `log2(len)`; zero for a single entry.
    pub fn max_entropy(&self) -> f64 {
        (self.0.len() as f64).log2()
    }

    /// Arithmetic mean of the scores, `None` when empty.
    pub fn mean_score(&self) -> Option<f64> {
        if self.0.is_empty() {
            return None;
        }
        let sum: f64 = self.0.iter().map(|r| r.score).sum();
        Some(sum / self.0.len() as f64)
    }

    /// Display rows for the first `n` entries, rank starting at 1.
    pub fn ranked(&self, n: usize) -> Vec<RankedScore> {
        self.head(n)
            .iter()
            .enumerate()
            .map(|(idx, r)| {
                let pct = percentage(r.score).clamp(0, 100) as u8;
                RankedScore {
                    rank: idx + 1,
                    label: r.label.clone(),
                    display_label: r.label.to_lowercase(),
                    percentage: pct,
                    level: ConfidenceLevel::from_percentage(pct),
                }
            })
            .collect()
    }
}

impl From<Vec<ClassificationResult>> for ScoreDistribution {
    fn from(entries: Vec<ClassificationResult>) -> Self {
        Self(entries)
    }
}

impl FromIterator<ClassificationResult> for ScoreDistribution {
    fn from_iter<I: IntoIterator<Item = ClassificationResult>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for ScoreDistribution {
    type Item = ClassificationResult;
    type IntoIter = std::vec::IntoIter<ClassificationResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ScoreDistribution {
    type Item = &'a ClassificationResult;
    type IntoIter = std::slice::Iter<'a, ClassificationResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Coarse confidence bucket for a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    pub fn from_percentage(pct: u8) -> Self {
        if pct >= 80 {
            ConfidenceLevel::High
        } else if pct >= 50 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

/// A single ranked prediction prepared for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RankedScore {
    pub rank: usize,
    pub label: String,
    /// Lowercased label
    pub display_label: String,
    pub percentage: u8,
    pub level: ConfidenceLevel,
}

/// `round(value * 100)`, half away from zero.
pub fn percentage(value: f64) -> i32 {
    (value * 100.0).round() as i32
}

/// Numerically stable softmax. Empty input yields an empty vector.
pub fn softmax(logits: &[f64]) -> Vec<f64> {
    let Some(max) = logits.iter().copied().reduce(f64::max) else {
        return Vec::new();
    };
    let exps: Vec<f64> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    if sum == 0.0 || !sum.is_finite() {
        return vec![0.0; logits.len()];
    }
    exps.into_iter().map(|e| e / sum).collect()
}
