//! # Bloodwise
//!
//! Deterministic blood-test metric synthesis and health scoring.
//!
//! This crate provides:
//! - A seeded synthesizer that derives a fixed biomarker panel from a test id
//! - A health score aggregator with an id-derived fallback
//! - A report service that checks test readiness before synthesizing
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (Metric, MetricCatalog, HealthScore, BloodTest)
//! - `ports`: Trait definitions for the record store
//! - `adapters`: Concrete implementations (SQLite, log sanitization)
//! - `application`: Synthesis, scoring and report use cases
//! - `config`: Environment-driven configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use application::{HealthScoreAggregator, MetricSynthesizer, ReportOutcome, ReportService};
pub use domain::{HealthScore, Metric, MetricCatalog, MetricStatus};

/// Result type for Bloodwise operations
pub type Result<T> = std::result::Result<T, BloodwiseError>;

/// Main error type for Bloodwise
#[derive(Debug, thiserror::Error)]
pub enum BloodwiseError {
    #[error("Storage operation failed: {0}")]
    Storage(#[from] adapters::StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid catalog: {0}")]
    Catalog(#[from] domain::CatalogError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Synthesize the standard panel for `test_id` with per-entry seed mixing.
#[must_use]
pub fn synthesize_metrics(test_id: &str) -> Vec<Metric> {
    MetricSynthesizer::default().synthesize(test_id)
}

/// Score `metrics` with the default policy, falling back to `fallback_id`.
#[must_use]
pub fn compute_health_score(metrics: &[Metric], fallback_id: &str) -> u8 {
    HealthScoreAggregator::default().score(metrics, fallback_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abc123_scenario() {
        let metrics = synthesize_metrics("abc123");
        assert_eq!(metrics.len(), 10);
        assert_eq!(metrics[0].name(), "Hemoglobin");
        assert_eq!(metrics[0].unit(), "g/dL");

        let abnormal = metrics.iter().filter(|m| m.status().is_abnormal()).count();
        let score = compute_health_score(&metrics, "abc123");
        assert_eq!(usize::from(score), 85 - 3 * abnormal);
        assert_eq!(score, compute_health_score(&synthesize_metrics("abc123"), "abc123"));
    }

    #[test]
    fn test_empty_id_scenario() {
        let metrics = synthesize_metrics("");
        assert_eq!(metrics.len(), 10);
        assert!(compute_health_score(&metrics, "") <= 100);
        assert_eq!(compute_health_score(&[], ""), 70);
    }
}
