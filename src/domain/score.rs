//! Health score types.

use serde::{Deserialize, Serialize};

/// Highest possible score.
pub const MAX_SCORE: u8 = 100;

/// Lower bound of the id-derived fallback score.
pub const FALLBACK_FLOOR: u8 = 70;

/// Width of the fallback window (`seed mod FALLBACK_SPAN + FALLBACK_FLOOR`).
pub const FALLBACK_SPAN: u64 = 30;

/// A wellness score associated with a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthScore {
    pub date: chrono::DateTime<chrono::Utc>,
    pub score: u8,
}

impl HealthScore {
    #[must_use]
    pub fn new(date: chrono::DateTime<chrono::Utc>, score: u8) -> Self {
        Self {
            date,
            score: score.min(MAX_SCORE),
        }
    }

    #[must_use]
    pub fn band(&self) -> ScoreBand {
        ScoreBand::from_score(self.score)
    }
}

/// Display band for a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreBand {
    /// 90 and above
    Excellent,
    /// 75 to 89
    Good,
    /// 60 to 74
    Average,
    /// 40 to 59
    Fair,
    /// Below 40
    Poor,
}

impl ScoreBand {
    #[must_use]
    pub fn from_score(score: u8) -> Self {
        match score {
            90..=u8::MAX => Self::Excellent,
            75..=89 => Self::Good,
            60..=74 => Self::Average,
            40..=59 => Self::Fair,
            _ => Self::Poor,
        }
    }

    /// Get a human-readable description.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent (90+)",
            Self::Good => "Good (75-89)",
            Self::Average => "Average (60-74)",
            Self::Fair => "Fair (40-59)",
            Self::Poor => "Poor (<40)",
        }
    }

    /// Get the associated color for display (RGB).
    #[must_use]
    pub fn color(&self) -> (u8, u8, u8) {
        match self {
            Self::Excellent => (16, 185, 129), // Emerald (#10B981)
            Self::Good => (34, 197, 94),       // Green (#22C55E)
            Self::Average => (250, 204, 21),   // Yellow (#FACC15)
            Self::Fair => (249, 115, 22),      // Orange (#F97316)
            Self::Poor => (239, 68, 68),       // Red (#EF4444)
        }
    }
}

impl std::fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Excellent => write!(f, "EXCELLENT"),
            Self::Good => write!(f, "GOOD"),
            Self::Average => write!(f, "AVERAGE"),
            Self::Fair => write!(f, "FAIR"),
            Self::Poor => write!(f, "POOR"),
        }
    }
}

/// Error type for scoring policy construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    #[error("Baseline {0} out of range [0, {MAX_SCORE}]")]
    BaselineOutOfRange(u8),
}

/// Flat-penalty scoring weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringPolicy {
    /// Score of a panel with no abnormal metrics
    pub baseline: u8,

    /// Points removed per elevated metric
    pub elevated_penalty: u32,

    /// Points removed per low metric
    pub low_penalty: u32,
}

impl ScoringPolicy {
    /// Create a policy, rejecting a baseline above [`MAX_SCORE`].
    ///
    /// # Errors
    /// Returns `BaselineOutOfRange` if `baseline` exceeds [`MAX_SCORE`].
    pub fn new(
        baseline: u8,
        elevated_penalty: u32,
        low_penalty: u32,
    ) -> Result<Self, PolicyError> {
        if baseline > MAX_SCORE {
            return Err(PolicyError::BaselineOutOfRange(baseline));
        }
        Ok(Self {
            baseline,
            elevated_penalty,
            low_penalty,
        })
    }
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            baseline: 85,
            elevated_penalty: 3,
            low_penalty: 3,
        }
    }
}

/// Which path produced a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreSource {
    /// Derived from classified metrics
    Metrics,
    /// No metrics available; derived from the test id
    Fallback,
}

/// A score together with the counts it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub score: u8,
    pub source: ScoreSource,
    pub normal: usize,
    pub elevated: usize,
    pub low: usize,
}

impl ScoreBreakdown {
    #[must_use]
    pub fn abnormal(&self) -> usize {
        self.elevated + self.low
    }
}

/// Direction of change between the two most recent scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "direction", content = "delta", rename_all = "lowercase")]
pub enum ScoreTrend {
    Improving(i16),
    Declining(i16),
    Stable,
}

impl ScoreTrend {
    /// Compare the last two points of a date-ordered history.
    ///
    /// Returns `None` when fewer than two points exist.
    #[must_use]
    pub fn from_history(history: &[HealthScore]) -> Option<Self> {
        let [.., previous, latest] = history else {
            return None;
        };
        let delta = i16::from(latest.score) - i16::from(previous.score);
        Some(match delta {
            d if d > 0 => Self::Improving(d),
            d if d < 0 => Self::Declining(d),
            _ => Self::Stable,
        })
    }
}

impl std::fmt::Display for ScoreTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Improving(d) => write!(f, "improving (+{d})"),
            Self::Declining(d) => write!(f, "declining ({d})"),
            Self::Stable => write!(f, "stable"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32, score: u8) -> HealthScore {
        let date = chrono::Utc
            .with_ymd_and_hms(2024, 3, day, 9, 0, 0)
            .single()
            .expect("Valid date");
        HealthScore::new(date, score)
    }

    #[test]
    fn test_band_boundaries() {
        assert_eq!(ScoreBand::from_score(100), ScoreBand::Excellent);
        assert_eq!(ScoreBand::from_score(90), ScoreBand::Excellent);
        assert_eq!(ScoreBand::from_score(89), ScoreBand::Good);
        assert_eq!(ScoreBand::from_score(75), ScoreBand::Good);
        assert_eq!(ScoreBand::from_score(74), ScoreBand::Average);
        assert_eq!(ScoreBand::from_score(60), ScoreBand::Average);
        assert_eq!(ScoreBand::from_score(59), ScoreBand::Fair);
        assert_eq!(ScoreBand::from_score(40), ScoreBand::Fair);
        assert_eq!(ScoreBand::from_score(39), ScoreBand::Poor);
        assert_eq!(ScoreBand::from_score(0), ScoreBand::Poor);
    }

    #[test]
    fn test_health_score_clamps() {
        assert_eq!(at(1, 250).score, 100);
        assert_eq!(at(1, 82).band(), ScoreBand::Good);
    }

    #[test]
    fn test_policy_validation() {
        assert!(ScoringPolicy::new(100, 3, 3).is_ok());
        assert_eq!(
            ScoringPolicy::new(101, 3, 3),
            Err(PolicyError::BaselineOutOfRange(101))
        );
        assert_eq!(ScoringPolicy::default().baseline, 85);
    }

    #[test]
    fn test_trend() {
        assert_eq!(ScoreTrend::from_history(&[]), None);
        assert_eq!(ScoreTrend::from_history(&[at(1, 80)]), None);
        assert_eq!(
            ScoreTrend::from_history(&[at(1, 70), at(2, 79)]),
            Some(ScoreTrend::Improving(9))
        );
        assert_eq!(
            ScoreTrend::from_history(&[at(1, 90), at(2, 85), at(3, 79)]),
            Some(ScoreTrend::Declining(-6))
        );
        assert_eq!(
            ScoreTrend::from_history(&[at(1, 85), at(2, 85)]),
            Some(ScoreTrend::Stable)
        );
    }
}
