//! Run settings
//!
//! Defines how long a session lasts, when it takes idle breaks and how
//! pointer strokes are shaped.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::stealth::MotionConfig;

/// Settings for one bot session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Total session length in seconds
    pub runtime_secs: f64,
    /// Seconds of activity before an idle break is due
    pub idle_period_secs: f64,
    /// Idle break length range in minutes, `[min, max]`
    pub idle_minutes: [f64; 2],
    /// Seconds to wait before the first pass
    pub start_delay_secs: f64,
    /// Log and count missing color targets instead of stopping
    pub skip_missing_targets: bool,
    /// Pointer stroke shape
    pub motion: MotionConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            runtime_secs: 3600.0,
            idle_period_secs: 900.0,
            idle_minutes: [2.0, 5.0],
            start_delay_secs: 0.0,
            skip_missing_targets: false,
            motion: MotionConfig::default(),
        }
    }
}

impl RunConfig {
    /// Ten minute session with short, frequent breaks
    pub fn short_session() -> Self {
        Self {
            runtime_secs: 600.0,
            idle_period_secs: 180.0,
            idle_minutes: [0.5, 1.5],
            start_delay_secs: 3.0,
            ..Default::default()
        }
    }

    /// Load settings from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Parse settings from JSON text; missing fields take their defaults
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the settings are usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        let [idle_min, idle_max] = self.idle_minutes;

        for (name, secs) in [
            ("runtime_secs", self.runtime_secs),
            ("idle_period_secs", self.idle_period_secs),
            ("start_delay_secs", self.start_delay_secs),
            ("idle minimum", idle_min * 60.0),
            ("idle maximum", idle_max * 60.0),
        ] {
            if Duration::try_from_secs_f64(secs).is_err() {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-negative time that fits in a duration, got {secs}s"
                )));
            }
        }

        if idle_min > idle_max {
            return Err(ConfigError::Invalid(format!(
                "idle range is reversed: {idle_min} > {idle_max}"
            )));
        }
        if self.motion.speed == 0 {
            return Err(ConfigError::Invalid("motion speed must be at least 1".into()));
        }

        Ok(())
    }

    /// Session length
    pub fn runtime(&self) -> Duration {
        saturating_secs(self.runtime_secs)
    }

    /// Activity allowed between idle breaks
    pub fn idle_period(&self) -> Duration {
        saturating_secs(self.idle_period_secs)
    }

    /// Delay before the first pass
    pub fn start_delay(&self) -> Duration {
        saturating_secs(self.start_delay_secs)
    }
}

/// Seconds to a `Duration` for settings that skipped `validate`
fn saturating_secs(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(Duration::MAX)
}

/// Settings errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}
