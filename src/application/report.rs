//! Report service: builds reports for processed tests.
//!
//! This service coordinates:
//! - Readiness lookup through the record port
//! - Metric synthesis
//! - Score aggregation
//! - Interpretation
//!
//! Synthesis only runs once a test is marked processed.

use std::sync::Arc;

use crate::domain::{BloodTestReport, HealthScore, Interpretation, ScoreTrend};
use crate::ports::TestRecords;
use crate::BloodwiseError;

use super::{HealthScoreAggregator, MetricSynthesizer};

/// Result of asking for a report.
#[derive(Debug, Clone)]
pub enum ReportOutcome {
    /// The test exists but has not been processed yet
    Pending {
        created_at: chrono::DateTime<chrono::Utc>,
    },
    /// The report is available
    Ready(Box<BloodTestReport>),
}

/// Service for building blood test reports and score history.
pub struct ReportService<S>
where
    S: TestRecords,
{
    records: Arc<S>,
    synthesizer: MetricSynthesizer,
    aggregator: HealthScoreAggregator,
}

impl<S> ReportService<S>
where
    S: TestRecords,
    S::Error: Into<crate::adapters::StorageError>,
{
    /// Create a new report service.
    pub fn new(
        records: Arc<S>,
        synthesizer: MetricSynthesizer,
        aggregator: HealthScoreAggregator,
    ) -> Self {
        Self {
            records,
            synthesizer,
            aggregator,
        }
    }

    #[must_use]
    pub fn synthesizer(&self) -> &MetricSynthesizer {
        &self.synthesizer
    }

    #[must_use]
    pub fn aggregator(&self) -> &HealthScoreAggregator {
        &self.aggregator
    }

    /// Build the report for `test_id`.
    ///
    /// # Errors
    /// Returns `NotFound` if no such test exists, or a storage error.
    pub fn build_report(&self, test_id: &str) -> Result<ReportOutcome, BloodwiseError> {
        let test = self
            .records
            .load_test(test_id)
            .map_err(|e| BloodwiseError::Storage(e.into()))?
            .ok_or_else(|| BloodwiseError::NotFound(format!("blood test {test_id}")))?;

        if !test.processed {
            tracing::info!("Blood test {} is still pending analysis", test_id);
            return Ok(ReportOutcome::Pending {
                created_at: test.created_at,
            });
        }

        let metrics = self.synthesizer.synthesize(&test.id);
        let breakdown = self.aggregator.breakdown(&metrics, &test.id);
        let interpretation = Interpretation::from_metrics(&metrics);

        tracing::info!(
            "Built report for {}: score={}, abnormal={}",
            test.id,
            breakdown.score,
            breakdown.abnormal()
        );

        Ok(ReportOutcome::Ready(Box::new(BloodTestReport {
            health_score: HealthScore::new(test.created_at, breakdown.score),
            test_id: test.id,
            name: test.file_name,
            date: test.created_at,
            metrics,
            breakdown,
            interpretation,
        })))
    }

    /// Score one test from its readiness record alone.
    ///
    /// Returns `None` while the test is unprocessed.
    ///
    /// # Errors
    /// Returns `NotFound` if no such test exists, or a storage error.
    pub fn score_for(&self, test_id: &str) -> Result<Option<HealthScore>, BloodwiseError> {
        let status = self
            .records
            .test_status(test_id)
            .map_err(|e| BloodwiseError::Storage(e.into()))?
            .ok_or_else(|| BloodwiseError::NotFound(format!("blood test {test_id}")))?;

        if !status.processed {
            return Ok(None);
        }

        let metrics = self.synthesizer.synthesize(test_id);
        let score = self.aggregator.score(&metrics, test_id);
        Ok(Some(HealthScore::new(status.created_at, score)))
    }

    /// One score per processed test, oldest first.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    pub fn health_history(&self) -> Result<Vec<HealthScore>, BloodwiseError> {
        let tests = self
            .records
            .load_tests()
            .map_err(|e| BloodwiseError::Storage(e.into()))?;

        let mut history: Vec<HealthScore> = tests
            .iter()
            .filter(|t| t.processed)
            .map(|t| {
                let metrics = self.synthesizer.synthesize(&t.id);
                HealthScore::new(t.created_at, self.aggregator.score(&metrics, &t.id))
            })
            .collect();
        history.sort_by_key(|s| s.date);

        tracing::debug!("Computed health history with {} points", history.len());
        Ok(history)
    }

    /// Trend across the two most recent processed tests.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    pub fn trend(&self) -> Result<Option<ScoreTrend>, BloodwiseError> {
        Ok(ScoreTrend::from_history(&self.health_history()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::SqliteTestStore;
    use crate::domain::{BloodTest, ScoreSource};
    use chrono::TimeZone;

    fn create_test_service() -> (ReportService<SqliteTestStore>, Arc<SqliteTestStore>) {
        let store = Arc::new(SqliteTestStore::in_memory().expect("Should create db"));
        let service = ReportService::new(
            Arc::clone(&store),
            MetricSynthesizer::default(),
            HealthScoreAggregator::default(),
        );
        (service, store)
    }

    fn saved_test(store: &SqliteTestStore, day: u32, processed: bool) -> BloodTest {
        let mut test = BloodTest::new("user-1", format!("panel-{day}.pdf"), "application/pdf", 512);
        test.created_at = chrono::Utc
            .with_ymd_and_hms(2024, 1, day, 8, 30, 0)
            .single()
            .expect("Valid date");
        test.processed = processed;
        store.save_test(&test).expect("Should save");
        test
    }

    #[test]
    fn test_missing_test_is_not_found() {
        let (service, _) = create_test_service();
        assert!(matches!(
            service.build_report("nope"),
            Err(BloodwiseError::NotFound(_))
        ));
        assert!(matches!(
            service.score_for("nope"),
            Err(BloodwiseError::NotFound(_))
        ));
    }

    #[test]
    fn test_pending_test_skips_synthesis() {
        let (service, store) = create_test_service();
        let test = saved_test(&store, 3, false);

        match service.build_report(&test.id).expect("Should build") {
            ReportOutcome::Pending { created_at } => assert_eq!(created_at, test.created_at),
            ReportOutcome::Ready(_) => panic!("Unprocessed test must not produce a report"),
        }
        assert_eq!(service.score_for(&test.id).expect("Should score"), None);
    }

    #[test]
    fn test_ready_report_matches_core() {
        let (service, store) = create_test_service();
        let test = saved_test(&store, 5, true);

        let report = match service.build_report(&test.id).expect("Should build") {
            ReportOutcome::Ready(report) => report,
            ReportOutcome::Pending { .. } => panic!("Processed test should be ready"),
        };

        let metrics = service.synthesizer().synthesize(&test.id);
        assert_eq!(report.metrics, metrics);
        assert_eq!(report.name, test.file_name);
        assert_eq!(report.health_score.date, test.created_at);
        assert_eq!(
            report.health_score.score,
            service.aggregator().score(&metrics, &test.id)
        );
        assert_eq!(report.breakdown.source, ScoreSource::Metrics);
        assert_eq!(
            u32::from(report.health_score.score),
            85 - 3 * report.breakdown.abnormal() as u32
        );
        assert_eq!(
            report.interpretation.elevated.len() + report.interpretation.low.len(),
            report.breakdown.abnormal()
        );
        assert_eq!(
            service.score_for(&test.id).expect("Should score"),
            Some(report.health_score)
        );
    }

    #[test]
    fn test_history_only_processed_oldest_first() {
        let (service, store) = create_test_service();
        let late = saved_test(&store, 20, true);
        let _pending = saved_test(&store, 15, false);
        let early = saved_test(&store, 2, true);

        let history = service.health_history().expect("Should load");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].date, early.created_at);
        assert_eq!(history[1].date, late.created_at);

        let trend = service.trend().expect("Should load").expect("Two points");
        let delta = i16::from(history[1].score) - i16::from(history[0].score);
        match trend {
            ScoreTrend::Improving(d) | ScoreTrend::Declining(d) => assert_eq!(d, delta),
            ScoreTrend::Stable => assert_eq!(delta, 0),
        }
    }

    #[test]
    fn test_trend_needs_two_points() {
        let (service, store) = create_test_service();
        assert_eq!(service.trend().expect("Should load"), None);
        saved_test(&store, 1, true);
        assert_eq!(service.trend().expect("Should load"), None);
    }
}
