//! Application layer: Use cases and services.
//!
//! The synthesizer and aggregator are pure; the report service adds the
//! readiness lookup through the record port.

mod report;
mod scoring;
mod synthesizer;

pub use report::{ReportOutcome, ReportService};
pub use scoring::HealthScoreAggregator;
pub use synthesizer::MetricSynthesizer;
