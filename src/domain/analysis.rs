//! Rule-based interpretation of a metric list.
//!
//! Produces the summary shown next to a report and the plain-text context
//! handed to the chat assistant. Wording is informational, not diagnostic.

use serde::Serialize;

use super::metric::{Metric, MetricStatus};

const FOLLOW_UP: &str =
    "Schedule a follow-up with your healthcare provider to discuss these results in detail.";

/// Summary of which metrics are out of range, with recommendations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Interpretation {
    pub elevated: Vec<String>,
    pub low: Vec<String>,
    pub summary: String,
    pub recommendations: Vec<String>,
}

impl Interpretation {
    #[must_use]
    pub fn from_metrics(metrics: &[Metric]) -> Self {
        let names_with = |status: MetricStatus| -> Vec<String> {
            metrics
                .iter()
                .filter(|m| m.status() == status)
                .map(|m| m.name().to_string())
                .collect()
        };
        let elevated = names_with(MetricStatus::Elevated);
        let low = names_with(MetricStatus::Low);

        let mut summary = String::from("Based on your blood test results: ");
        if !elevated.is_empty() {
            summary.push_str(&format!("You have elevated levels of {}. ", elevated.join(", ")));
        }
        if !low.is_empty() {
            summary.push_str(&format!("You have low levels of {}. ", low.join(", ")));
        }
        if elevated.is_empty() && low.is_empty() {
            summary.push_str("All your values are within normal range. ");
        }
        let summary = summary.trim_end().to_string();

        let mut recommendations = Vec::new();
        if elevated
            .iter()
            .any(|n| n.contains("Cholesterol") || n.contains("LDL"))
        {
            recommendations.push(
                "Consider reducing saturated fat intake and increasing exercise.".to_string(),
            );
        }
        if elevated.iter().any(|n| n.contains("Glucose")) {
            recommendations.push(
                "Monitor your carbohydrate intake and consider speaking with a nutritionist."
                    .to_string(),
            );
        }
        if low.iter().any(|n| n.contains("Hemoglobin")) {
            recommendations
                .push("Consider iron supplements after consulting with your doctor.".to_string());
        }
        recommendations.push(FOLLOW_UP.to_string());

        Self {
            elevated,
            low,
            summary,
            recommendations,
        }
    }

    /// Whether every metric was in range.
    #[must_use]
    pub fn all_normal(&self) -> bool {
        self.elevated.is_empty() && self.low.is_empty()
    }
}

/// Render metrics as one `name: value unit (status)` line each.
#[must_use]
pub fn render_assistant_context(metrics: &[Metric]) -> String {
    metrics
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ReferenceRange;

    fn metric(name: &str, value: f64, low: f64, high: f64) -> Metric {
        Metric::classified(name, value, "mg/dL", ReferenceRange::new(low, high))
    }

    #[test]
    fn test_all_normal() {
        let metrics = vec![metric("Glucose", 85.0, 70.0, 100.0)];
        let interp = Interpretation::from_metrics(&metrics);

        assert!(interp.all_normal());
        assert!(interp.summary.contains("within normal range"));
        assert_eq!(interp.recommendations, vec![FOLLOW_UP.to_string()]);
    }

    #[test]
    fn test_abnormal_rules() {
        let metrics = vec![
            metric("Hemoglobin", 11.0, 13.5, 17.5),
            metric("Glucose", 126.0, 70.0, 100.0),
            metric("LDL", 160.0, 50.0, 130.0),
            metric("HDL", 55.0, 40.0, 100.0),
        ];
        let interp = Interpretation::from_metrics(&metrics);

        assert_eq!(interp.elevated, vec!["Glucose", "LDL"]);
        assert_eq!(interp.low, vec!["Hemoglobin"]);
        assert!(interp.summary.contains("elevated levels of Glucose, LDL"));
        assert!(interp.summary.contains("low levels of Hemoglobin"));
        assert_eq!(interp.recommendations.len(), 4);
        assert_eq!(interp.recommendations.last().map(String::as_str), Some(FOLLOW_UP));
    }

    #[test]
    fn test_assistant_context() {
        let metrics = vec![
            metric("Glucose", 126.0, 70.0, 100.0),
            metric("HDL", 55.0, 40.0, 100.0),
        ];
        assert_eq!(
            render_assistant_context(&metrics),
            "Glucose: 126 mg/dL (elevated)\nHDL: 55 mg/dL (normal)"
        );
        assert_eq!(render_assistant_context(&[]), "");
    }
}
