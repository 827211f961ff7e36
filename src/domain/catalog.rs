//! The biomarker catalog: an ordered, immutable table of panel definitions.
//!
//! Catalog order is the output order of every synthesis call. A catalog is
//! built once (either [`MetricCatalog::standard_panel`] or loaded from JSON)
//! and shared read-only.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::metric::{Metric, ReferenceRange};

/// Most decimal places an entry may keep; an `f64` holds about 15 digits.
pub const MAX_PRECISION: u8 = 15;

/// Errors raised when validating a catalog.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog has no entries")]
    Empty,

    #[error("Duplicate catalog entry: {0}")]
    DuplicateName(String),

    #[error("Catalog entry has an empty name or unit")]
    MissingLabel,

    #[error("Invalid reference range for {name}: [{low}, {high}]")]
    InvalidRange { name: String, low: f64, high: f64 },

    #[error("Invalid number for {name}: {field}")]
    InvalidNumber { name: String, field: &'static str },

    #[error("Precision {precision} for {name} exceeds {MAX_PRECISION}")]
    PrecisionTooHigh { name: String, precision: u8 },
}

/// Definition of one biomarker in the panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Display name (e.g. "Hemoglobin")
    pub name: String,

    /// Display unit, paired 1:1 with the name
    pub unit: String,

    /// Lowest value synthesis can produce
    pub base_value: f64,

    /// Width of the synthesized value interval `[base, base + spread)`
    pub spread: f64,

    /// Reference range used for classification
    pub range: ReferenceRange,

    /// Decimal places kept on synthesized values
    #[serde(default = "default_precision")]
    pub precision: u8,
}

fn default_precision() -> u8 {
    1
}

impl CatalogEntry {
    #[must_use]
    pub fn new(
        name: &str,
        unit: &str,
        base_value: f64,
        spread: f64,
        range: ReferenceRange,
        precision: u8,
    ) -> Self {
        Self {
            name: name.to_string(),
            unit: unit.to_string(),
            base_value,
            spread,
            range,
            precision,
        }
    }

    /// Round a raw value to this entry's precision.
    #[must_use]
    pub fn round(&self, value: f64) -> f64 {
        let factor = 10f64.powi(i32::from(self.precision));
        (value * factor).round() / factor
    }

    /// Turn a value into a classified reading for this biomarker.
    ///
    /// The value is rounded first so the stored value is the one classified.
    #[must_use]
    pub fn reading(&self, value: f64) -> Metric {
        Metric::classified(&self.name, self.round(value), &self.unit, self.range)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if self.name.trim().is_empty() || self.unit.trim().is_empty() {
            return Err(CatalogError::MissingLabel);
        }
        let numbers = [
            ("base_value", self.base_value),
            ("spread", self.spread),
            ("range.low", self.range.low),
            ("range.high", self.range.high),
        ];
        for (field, value) in numbers {
            if !value.is_finite() {
                return Err(CatalogError::InvalidNumber {
                    name: self.name.clone(),
                    field,
                });
            }
        }
        if self.spread < 0.0 {
            return Err(CatalogError::InvalidNumber {
                name: self.name.clone(),
                field: "spread",
            });
        }
        if self.precision > MAX_PRECISION {
            return Err(CatalogError::PrecisionTooHigh {
                name: self.name.clone(),
                precision: self.precision,
            });
        }
        // Every synthesized value, scaled for rounding, must stay finite.
        let extent = self.base_value.abs() + self.spread;
        if !(extent * 10f64.powi(i32::from(self.precision))).is_finite() {
            return Err(CatalogError::InvalidNumber {
                name: self.name.clone(),
                field: "base_value + spread",
            });
        }
        if self.range.low > self.range.high {
            return Err(CatalogError::InvalidRange {
                name: self.name.clone(),
                low: self.range.low,
                high: self.range.high,
            });
        }
        Ok(())
    }
}

/// Ordered set of biomarker definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricCatalog {
    entries: Vec<CatalogEntry>,
}

impl MetricCatalog {
    /// Build a catalog from entries, validating them.
    ///
    /// # Errors
    /// Returns error if the catalog is empty, has duplicate names, or any
    /// entry has a non-finite number, negative spread or inverted range.
    pub fn new(entries: Vec<CatalogEntry>) -> Result<Self, CatalogError> {
        if entries.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = HashSet::new();
        for entry in &entries {
            entry.validate()?;
            if !seen.insert(entry.name.as_str()) {
                return Err(CatalogError::DuplicateName(entry.name.clone()));
            }
        }
        Ok(Self { entries })
    }

    /// Parse and validate a catalog from a JSON array of entries.
    ///
    /// # Errors
    /// Returns error if the JSON is malformed or the catalog is invalid.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let entries: Vec<CatalogEntry> = serde_json::from_str(json)?;
        Ok(Self::new(entries)?)
    }

    /// The canonical ten-marker blood panel.
    #[must_use]
    pub fn standard_panel() -> Self {
        let r = ReferenceRange::new;
        Self {
            entries: vec![
                CatalogEntry::new("Hemoglobin", "g/dL", 12.0, 6.0, r(13.5, 17.5), 1),
                CatalogEntry::new("Glucose", "mg/dL", 70.0, 60.0, r(70.0, 100.0), 0),
                CatalogEntry::new("Cholesterol", "mg/dL", 150.0, 100.0, r(125.0, 200.0), 0),
                CatalogEntry::new("LDL", "mg/dL", 70.0, 100.0, r(50.0, 130.0), 0),
                CatalogEntry::new("HDL", "mg/dL", 30.0, 50.0, r(40.0, 100.0), 0),
                CatalogEntry::new("Triglycerides", "mg/dL", 80.0, 150.0, r(50.0, 150.0), 0),
                CatalogEntry::new("Creatinine", "mg/dL", 0.5, 1.0, r(0.6, 1.2), 2),
                CatalogEntry::new(
                    "Platelets",
                    "cells/µL",
                    140_000.0,
                    300_000.0,
                    r(150_000.0, 450_000.0),
                    0,
                ),
                CatalogEntry::new(
                    "White Blood Cells",
                    "cells/µL",
                    3_500.0,
                    8_000.0,
                    r(4_500.0, 11_000.0),
                    0,
                ),
                CatalogEntry::new("Red Blood Cells", "million cells/µL", 4.0, 2.0, r(4.2, 5.9), 2),
            ],
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }

    /// Look up an entry by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Entry names in catalog order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }
}

impl Default for MetricCatalog {
    fn default() -> Self {
        Self::standard_panel()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MetricStatus;

    #[test]
    fn test_standard_panel_order() {
        let catalog = MetricCatalog::standard_panel();
        assert_eq!(catalog.len(), 10);
        assert_eq!(
            catalog.names(),
            vec![
                "Hemoglobin",
                "Glucose",
                "Cholesterol",
                "LDL",
                "HDL",
                "Triglycerides",
                "Creatinine",
                "Platelets",
                "White Blood Cells",
                "Red Blood Cells",
            ]
        );
    }

    #[test]
    fn test_standard_panel_is_valid() {
        let catalog = MetricCatalog::standard_panel();
        let entries: Vec<CatalogEntry> = catalog.iter().cloned().collect();
        assert_eq!(MetricCatalog::new(entries).expect("Should validate"), catalog);
    }

    #[test]
    fn test_reading_rounds_before_classifying() {
        let catalog = MetricCatalog::standard_panel();
        let creatinine = catalog.get("Creatinine").expect("Should exist");

        // 1.204 rounds to 1.2, which is inside the range
        let metric = creatinine.reading(1.204);
        assert!((metric.value() - 1.2).abs() < f64::EPSILON);
        assert_eq!(metric.status(), MetricStatus::Normal);

        let metric = creatinine.reading(1.256);
        assert_eq!(metric.status(), MetricStatus::Elevated);
    }

    #[test]
    fn test_rejects_invalid_catalogs() {
        assert_eq!(MetricCatalog::new(vec![]), Err(CatalogError::Empty));

        let range = ReferenceRange::new(70.0, 100.0);
        let entry = CatalogEntry::new("Glucose", "mg/dL", 70.0, 60.0, range, 0);
        let dup = MetricCatalog::new(vec![entry.clone(), entry.clone()]);
        assert_eq!(dup, Err(CatalogError::DuplicateName("Glucose".to_string())));

        let mut inverted = entry.clone();
        inverted.range = ReferenceRange::new(100.0, 70.0);
        assert!(matches!(
            MetricCatalog::new(vec![inverted]),
            Err(CatalogError::InvalidRange { .. })
        ));

        let mut negative = entry.clone();
        negative.spread = -1.0;
        assert!(matches!(
            MetricCatalog::new(vec![negative]),
            Err(CatalogError::InvalidNumber { field: "spread", .. })
        ));

        let mut nan = entry;
        nan.base_value = f64::NAN;
        assert!(matches!(
            MetricCatalog::new(vec![nan]),
            Err(CatalogError::InvalidNumber { field: "base_value", .. })
        ));
    }

    #[test]
    fn test_rejects_values_that_overflow_rounding() {
        let range = ReferenceRange::new(0.0, 1.0);

        let precise = CatalogEntry::new("Trace", "ng/L", 0.0, 1.0, range, MAX_PRECISION);
        assert!(MetricCatalog::new(vec![precise]).is_ok());

        let too_precise = CatalogEntry::new("Trace", "ng/L", 0.0, 1.0, range, 200);
        assert_eq!(
            MetricCatalog::new(vec![too_precise]),
            Err(CatalogError::PrecisionTooHigh {
                name: "Trace".to_string(),
                precision: 200,
            })
        );

        let huge = CatalogEntry::new("Huge", "u", f64::MAX, f64::MAX, range, 0);
        assert!(matches!(
            MetricCatalog::new(vec![huge]),
            Err(CatalogError::InvalidNumber { field: "base_value + spread", .. })
        ));

        let scaled = CatalogEntry::new("Scaled", "u", 1e300, 0.0, range, 10);
        assert!(matches!(
            MetricCatalog::new(vec![scaled]),
            Err(CatalogError::InvalidNumber { .. })
        ));

        let json = r#"[{"name": "Deep", "unit": "u", "base_value": 1.0, "spread": 1.0,
                        "range": {"low": 0.0, "high": 2.0}, "precision": 16}]"#;
        assert!(MetricCatalog::from_json(json).is_err());
    }

    #[test]
    fn test_from_json() {
        let json = r#"[
            {"name": "Ferritin", "unit": "ng/mL", "base_value": 10.0, "spread": 300.0,
             "range": {"low": 24.0, "high": 336.0}},
            {"name": "Vitamin D", "unit": "ng/mL", "base_value": 10.0, "spread": 60.0,
             "range": {"low": 20.0, "high": 50.0}, "precision": 0}
        ]"#;
        let catalog = MetricCatalog::from_json(json).expect("Should parse");
        assert_eq!(catalog.names(), vec!["Ferritin", "Vitamin D"]);
        assert_eq!(catalog.get("Ferritin").map(|e| e.precision), Some(1));

        assert!(MetricCatalog::from_json("[]").is_err());
        assert!(MetricCatalog::from_json("not json").is_err());
    }
}
