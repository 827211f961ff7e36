//! Metric synthesis: deterministic biomarker values from a test id.

use std::sync::Arc;

use crate::domain::{Metric, MetricCatalog, Seed, SeedMixing};

/// Produces the same ordered panel every time for the same test id.
#[derive(Debug, Clone)]
pub struct MetricSynthesizer {
    catalog: Arc<MetricCatalog>,
    mixing: SeedMixing,
}

impl MetricSynthesizer {
    /// Create a synthesizer over a shared catalog.
    #[must_use]
    pub fn new(catalog: Arc<MetricCatalog>, mixing: SeedMixing) -> Self {
        Self { catalog, mixing }
    }

    #[must_use]
    pub fn catalog(&self) -> &MetricCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn mixing(&self) -> SeedMixing {
        self.mixing
    }

    /// Synthesize one metric per catalog entry, in catalog order.
    ///
    /// Total over all strings, including the empty string (seed 0).
    #[must_use]
    pub fn synthesize(&self, test_id: &str) -> Vec<Metric> {
        let seed = Seed::from_test_id(test_id);

        let metrics: Vec<Metric> = self
            .catalog
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let fraction = seed.fraction(self.mixing, index);
                entry.reading(entry.base_value + fraction * entry.spread)
            })
            .collect();

        tracing::debug!(
            "Synthesized {} metrics (seed={}, mixing={})",
            metrics.len(),
            seed.value(),
            self.mixing
        );

        metrics
    }
}

impl Default for MetricSynthesizer {
    fn default() -> Self {
        Self::new(Arc::new(MetricCatalog::standard_panel()), SeedMixing::default())
    }
}
