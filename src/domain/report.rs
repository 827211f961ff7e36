//! Blood test records and materialized reports.

use serde::{Deserialize, Serialize};

use super::analysis::Interpretation;
use super::metric::Metric;
use super::score::{HealthScore, ScoreBreakdown};

/// An uploaded blood test document.
///
/// Owned by the record store; this crate only reads its readiness flag and
/// creation date when building reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BloodTest {
    /// Unique identifier (UUID v4)
    pub id: String,

    /// Owning user
    pub user_id: String,

    /// Original file name as uploaded
    pub file_name: String,

    /// Storage path: `<user_id>/<id>.<ext>`
    pub file_path: String,

    /// MIME type reported at upload
    pub file_type: String,

    /// File size in bytes
    pub file_size: u64,

    /// Upload timestamp
    pub created_at: chrono::DateTime<chrono::Utc>,

    /// Whether analysis is available
    pub processed: bool,
}

impl BloodTest {
    /// Register a new, unprocessed upload.
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        file_name: impl Into<String>,
        file_type: impl Into<String>,
        file_size: u64,
    ) -> Self {
        let user_id = user_id.into();
        let file_name = file_name.into();
        let id = uuid_v4();
        let file_path = format!("{}/{}.{}", user_id, id, file_extension(&file_name));

        Self {
            id,
            user_id,
            file_name,
            file_path,
            file_type: file_type.into(),
            file_size,
            created_at: chrono::Utc::now(),
            processed: false,
        }
    }

    /// Readiness view of this record.
    #[must_use]
    pub fn status(&self) -> TestStatus {
        TestStatus {
            processed: self.processed,
            created_at: self.created_at,
        }
    }
}

/// Readiness of a test: whether it can be analyzed, and when it was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestStatus {
    pub processed: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A fully materialized report for one processed test.
#[derive(Debug, Clone, Serialize)]
pub struct BloodTestReport {
    /// Test identifier the metrics were synthesized from
    pub test_id: String,

    /// Display name (the uploaded file name)
    pub name: String,

    /// Test creation date
    pub date: chrono::DateTime<chrono::Utc>,

    /// Metrics in catalog order
    pub metrics: Vec<Metric>,

    /// Score dated at the test's creation
    pub health_score: HealthScore,

    /// How the score was derived
    pub breakdown: ScoreBreakdown,

    /// Rule-based reading of the metrics
    pub interpretation: Interpretation,
}

fn file_extension(file_name: &str) -> &str {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext,
        _ => "bin",
    }
}

/// Generate a UUID v4 (random) using a CSPRNG.
fn uuid_v4() -> String {
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    let mut rng = ChaCha20Rng::from_entropy();
    let bytes: [u8; 16] = rng.gen();

    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3],
        bytes[4], bytes[5],
        (bytes[6] & 0x0f) | 0x40, bytes[7],
        (bytes[8] & 0x3f) | 0x80, bytes[9],
        bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15]
    )
}
