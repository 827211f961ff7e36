//! Runtime configuration from `BLOODWISE_*` environment variables.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `BLOODWISE_DB_PATH` | `bloodwise.db` |
//! | `BLOODWISE_LOG_MODE` | `stderr` (`stderr` or `file`) |
//! | `BLOODWISE_LOG_FILE` | `bloodwise.log` |
//! | `BLOODWISE_SEED_MIXING` | `per-entry` (`literal` or `per-entry`) |
//! | `BLOODWISE_SCORE_BASELINE` | `85` |
//! | `BLOODWISE_PENALTY_ELEVATED` | `3` |
//! | `BLOODWISE_PENALTY_LOW` | `3` |
//! | `BLOODWISE_CATALOG_FILE` | unset (standard panel) |
//! | `BLOODWISE_SANITIZE_MAX_BYTES` | `16384` (per log line redaction cap) |

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use crate::adapters::sanitize::DEFAULT_SANITIZE_MAX_BYTES;
use crate::application::{HealthScoreAggregator, MetricSynthesizer};
use crate::domain::{CatalogError, MetricCatalog, ScoringPolicy, SeedMixing};

pub const DB_PATH_ENV: &str = "BLOODWISE_DB_PATH";
pub const LOG_MODE_ENV: &str = "BLOODWISE_LOG_MODE";
pub const LOG_FILE_ENV: &str = "BLOODWISE_LOG_FILE";
pub const SEED_MIXING_ENV: &str = "BLOODWISE_SEED_MIXING";
pub const SCORE_BASELINE_ENV: &str = "BLOODWISE_SCORE_BASELINE";
pub const PENALTY_ELEVATED_ENV: &str = "BLOODWISE_PENALTY_ELEVATED";
pub const PENALTY_LOW_ENV: &str = "BLOODWISE_PENALTY_LOW";
pub const CATALOG_FILE_ENV: &str = "BLOODWISE_CATALOG_FILE";
pub const SANITIZE_MAX_BYTES_ENV: &str = "BLOODWISE_SANITIZE_MAX_BYTES";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("Cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid catalog in {}: {reason}", path.display())]
    Catalog { path: PathBuf, reason: String },
}

impl ConfigError {
    fn invalid(key: &'static str, value: &str, reason: impl std::fmt::Display) -> Self {
        Self::InvalidValue {
            key,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<(PathBuf, CatalogError)> for ConfigError {
    fn from((path, err): (PathBuf, CatalogError)) -> Self {
        Self::Catalog {
            path,
            reason: err.to_string(),
        }
    }
}

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogMode {
    /// Write to stderr, keeping stdout for command output
    #[default]
    Stderr,
    /// Append to the configured log file
    File,
}

impl FromStr for LogMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stderr" => Ok(Self::Stderr),
            "file" => Ok(Self::File),
            other => Err(format!("unknown log mode '{other}'")),
        }
    }
}

/// Resolved application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
    pub mixing: SeedMixing,
    pub scoring: ScoringPolicy,
    pub catalog: Arc<MetricCatalog>,
    pub sanitize_max_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("bloodwise.db"),
            log_mode: LogMode::default(),
            log_file: PathBuf::from("bloodwise.log"),
            mixing: SeedMixing::default(),
            scoring: ScoringPolicy::default(),
            catalog: Arc::new(MetricCatalog::standard_panel()),
            sanitize_max_bytes: DEFAULT_SANITIZE_MAX_BYTES,
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    /// Returns error if any variable is set to an invalid value or the
    /// catalog file cannot be read or validated.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// # Errors
    /// See [`AppConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let db_path = get(DB_PATH_ENV).map_or(defaults.db_path, PathBuf::from);
        let log_file = get(LOG_FILE_ENV).map_or(defaults.log_file, PathBuf::from);
        let log_mode = parse_or(get(LOG_MODE_ENV), LOG_MODE_ENV, defaults.log_mode)?;
        let mixing = parse_or(get(SEED_MIXING_ENV), SEED_MIXING_ENV, defaults.mixing)?;

        let baseline = parse_or(
            get(SCORE_BASELINE_ENV),
            SCORE_BASELINE_ENV,
            defaults.scoring.baseline,
        )?;
        let elevated = parse_or(
            get(PENALTY_ELEVATED_ENV),
            PENALTY_ELEVATED_ENV,
            defaults.scoring.elevated_penalty,
        )?;
        let low = parse_or(get(PENALTY_LOW_ENV), PENALTY_LOW_ENV, defaults.scoring.low_penalty)?;
        let scoring = ScoringPolicy::new(baseline, elevated, low).map_err(|reason| {
            ConfigError::invalid(SCORE_BASELINE_ENV, &baseline.to_string(), reason)
        })?;

        let sanitize_max_bytes = parse_or(
            get(SANITIZE_MAX_BYTES_ENV),
            SANITIZE_MAX_BYTES_ENV,
            defaults.sanitize_max_bytes,
        )?;
        if sanitize_max_bytes == 0 {
            return Err(ConfigError::invalid(SANITIZE_MAX_BYTES_ENV, "0", "must be positive"));
        }

        let catalog = match get(CATALOG_FILE_ENV) {
            Some(path) => Arc::new(load_catalog(PathBuf::from(path))?),
            None => defaults.catalog,
        };

        Ok(Self {
            db_path,
            log_mode,
            log_file,
            mixing,
            scoring,
            catalog,
            sanitize_max_bytes,
        })
    }

    /// Build a synthesizer from this configuration.
    #[must_use]
    pub fn synthesizer(&self) -> MetricSynthesizer {
        MetricSynthesizer::new(Arc::clone(&self.catalog), self.mixing)
    }

    /// Build an aggregator from this configuration.
    #[must_use]
    pub fn aggregator(&self) -> HealthScoreAggregator {
        HealthScoreAggregator::new(self.scoring)
    }
}

fn parse_or<T>(raw: Option<String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| ConfigError::invalid(key, &value, e)),
        None => Ok(default),
    }
}

fn load_catalog(path: PathBuf) -> Result<MetricCatalog, ConfigError> {
    let json = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    let entries = serde_json::from_str(&json).map_err(|e| ConfigError::Catalog {
        path: path.clone(),
        reason: e.to_string(),
    })?;
    let catalog = MetricCatalog::new(entries).map_err(|e| ConfigError::from((path.clone(), e)))?;

    tracing::info!("Loaded {} catalog entries from {}", catalog.len(), path.display());
    Ok(catalog)
}
