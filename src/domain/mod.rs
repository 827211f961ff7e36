//! Domain layer: Core business types and logic.
//!
//! Pure types with no I/O. Everything here is deterministic and safe to
//! share across threads.

mod analysis;
mod catalog;
mod metric;
mod report;
mod score;
mod seed;

pub use analysis::{render_assistant_context, Interpretation};
pub use catalog::{CatalogEntry, CatalogError, MetricCatalog, MAX_PRECISION};
pub use metric::{Metric, MetricStatus, ReferenceRange};
pub use report::{BloodTest, BloodTestReport, TestStatus};
pub use score::{
    HealthScore, PolicyError, ScoreBand, ScoreBreakdown, ScoreSource, ScoreTrend, ScoringPolicy,
    FALLBACK_FLOOR, FALLBACK_SPAN, MAX_SCORE,
};
pub use seed::{Seed, SeedMixing};
