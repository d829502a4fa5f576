//! Configuration for the analyzer.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::core::calibrator::{DEFAULT_ACTIVE_SECS, DEFAULT_BASELINE_SECS};
use crate::core::detector::DEFAULT_DETECTION_THRESHOLD;
use crate::core::extractor::{DEFAULT_BINARIZE_CUTOFF, DEFAULT_NOISE_FLOOR};
use crate::core::window::DEFAULT_WINDOW_CAPACITY;
use crate::session::reporter::{DEFAULT_REPORT_INTERVAL_SECS, DEFAULT_REPORT_MIN_SAMPLES};

/// Main configuration for the analyzer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Number of frames the sliding window holds
    pub window_capacity: usize,

    /// Brightness cutoff for binarization
    pub binarize_cutoff: u8,

    /// Pixel area at or below which a blob is noise
    pub blob_noise_floor: usize,

    /// Skewness magnitude above which an event fires. Replaced by
    /// successful calibration runs and carried forward across sessions.
    pub detection_threshold: f64,

    /// Calibration baseline (idle) phase duration
    #[serde(with = "duration_serde")]
    pub baseline_duration: Duration,

    /// Calibration active (typing) phase duration
    #[serde(with = "duration_serde")]
    pub active_duration: Duration,

    /// How often the reporter publishes a visualization snapshot
    #[serde(with = "duration_serde")]
    pub report_interval: Duration,

    /// Minimum skewness samples before the reporter publishes anything
    pub report_min_samples: usize,

    /// Directory for session streams, artifacts and stats
    pub data_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ir-pulse");

        Self {
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            binarize_cutoff: DEFAULT_BINARIZE_CUTOFF,
            blob_noise_floor: DEFAULT_NOISE_FLOOR,
            detection_threshold: DEFAULT_DETECTION_THRESHOLD,
            baseline_duration: Duration::from_secs(DEFAULT_BASELINE_SECS),
            active_duration: Duration::from_secs(DEFAULT_ACTIVE_SECS),
            report_interval: Duration::from_secs(DEFAULT_REPORT_INTERVAL_SECS),
            report_min_samples: DEFAULT_REPORT_MIN_SAMPLES,
            data_path: data_dir,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ir-pulse")
            .join("config.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.data_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Path of the persisted cumulative statistics file.
    pub fn stats_path(&self) -> PathBuf {
        self.data_path.join("stats.json")
    }

    /// Directory the reporter writes visualization snapshots into.
    pub fn reports_path(&self) -> PathBuf {
        self.data_path.join("reports")
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.window_capacity, 30);
        assert_eq!(config.binarize_cutoff, 180);
        assert_eq!(config.blob_noise_floor, 5);
        assert_eq!(config.detection_threshold, 0.8);
        assert_eq!(config.baseline_duration, Duration::from_secs(5));
        assert_eq!(config.active_duration, Duration::from_secs(10));
        assert_eq!(config.report_interval, Duration::from_secs(10));
        assert_eq!(config.report_min_samples, 30);
    }

    #[test]
    fn test_config_json_round_trip() {
        let config = Config {
            detection_threshold: 1.25,
            window_capacity: 12,
            ..Config::default()
        };

        let json = serde_json::to_string(&config).unwrap();
        let restored: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.detection_threshold, 1.25);
        assert_eq!(restored.window_capacity, 12);
        assert_eq!(restored.report_interval, Duration::from_secs(10));
    }
}
