//! Biomarker readings and their classification.

use serde::{Deserialize, Serialize};

/// Classification of a reading against its reference range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricStatus {
    /// Within the reference range (bounds inclusive)
    Normal,
    /// Above the upper bound
    Elevated,
    /// Below the lower bound
    Low,
}

impl MetricStatus {
    /// Whether the reading falls outside its reference range.
    #[must_use]
    pub fn is_abnormal(&self) -> bool {
        !matches!(self, Self::Normal)
    }

    /// Get the associated color for display (RGB).
    #[must_use]
    pub fn color(&self) -> (u8, u8, u8) {
        match self {
            Self::Normal => (34, 197, 94),    // Green (#22C55E)
            Self::Elevated => (249, 115, 22), // Orange (#F97316)
            Self::Low => (59, 130, 246),      // Blue (#3B82F6)
        }
    }

    /// Lowercase label, matching the serialized form.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Elevated => "elevated",
            Self::Low => "low",
        }
    }
}

impl std::fmt::Display for MetricStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive `[low, high]` reference range for one biomarker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRange {
    pub low: f64,
    pub high: f64,
}

impl ReferenceRange {
    #[must_use]
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Classify a value against this range.
    #[must_use]
    pub fn classify(&self, value: f64) -> MetricStatus {
        if value < self.low {
            MetricStatus::Low
        } else if value > self.high {
            MetricStatus::Elevated
        } else {
            MetricStatus::Normal
        }
    }
}

/// One biomarker reading.
///
/// The status is always derived from the value at construction, so the
/// fields are read-only and there is no `Deserialize` impl.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    name: String,
    value: f64,
    unit: String,
    status: MetricStatus,
}

impl Metric {
    /// Build a reading, classifying `value` against `range`.
    #[must_use]
    pub fn classified(
        name: impl Into<String>,
        value: f64,
        unit: impl Into<String>,
        range: ReferenceRange,
    ) -> Self {
        Self {
            name: name.into(),
            value,
            unit: unit.into(),
            status: range.classify(value),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }

    #[must_use]
    pub fn unit(&self) -> &str {
        &self.unit
    }

    #[must_use]
    pub fn status(&self) -> MetricStatus {
        self.status
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} {} ({})", self.name, self.value, self.unit, self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_bounds_inclusive() {
        let range = ReferenceRange::new(70.0, 100.0);
        assert_eq!(range.classify(70.0), MetricStatus::Normal);
        assert_eq!(range.classify(100.0), MetricStatus::Normal);
        assert_eq!(range.classify(69.9), MetricStatus::Low);
        assert_eq!(range.classify(100.1), MetricStatus::Elevated);
    }

    #[test]
    fn test_metric_status_follows_value() {
        let range = ReferenceRange::new(13.5, 17.5);
        let metric = Metric::classified("Hemoglobin", 12.0, "g/dL", range);
        assert_eq!(metric.status(), MetricStatus::Low);
        assert!(metric.status().is_abnormal());
        assert_eq!(metric.to_string(), "Hemoglobin: 12 g/dL (low)");
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&MetricStatus::Elevated).expect("Should serialize");
        assert_eq!(json, "\"elevated\"");
    }
}
