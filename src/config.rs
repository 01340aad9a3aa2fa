use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::display::{Breakpoints, DisplayClass};
use crate::error::{Error, Result};

/// Tunables for the resampling engine and the live monitor.
///
/// Every field has a default, so a config file only needs the values it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Windows of exactly this many hours skip sampling
    pub short_window_hours: u32,
    /// Bucket width for short windows on constrained displays
    pub short_bucket_minutes: u32,
    /// Bucket width for unconstrained displays
    pub bucket_minutes: u32,
    /// Minutes after midnight a point may fall and still mark the date boundary
    pub boundary_tolerance_minutes: u32,
    pub breakpoints: Breakpoints,
    /// Display classes up to and including this one are width-constrained
    pub constrained_up_to: DisplayClass,
    /// Resize quiescence before recomputing
    pub debounce_ms: u64,
    pub temperature_trend_threshold: f64,
    pub humidity_trend_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            short_window_hours: 1,
            short_bucket_minutes: 5,
            bucket_minutes: 10,
            boundary_tolerance_minutes: 10,
            breakpoints: Breakpoints::default(),
            constrained_up_to: DisplayClass::Narrow,
            debounce_ms: 250,
            temperature_trend_threshold: 0.1,
            humidity_trend_threshold: 1.0,
        }
    }
}

impl EngineConfig {
    /// Reads and validates a JSON config file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        let config: EngineConfig = serde_json::from_slice(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, minutes) in [
            ("short_bucket_minutes", self.short_bucket_minutes),
            ("bucket_minutes", self.bucket_minutes),
        ] {
            if !(1..=60).contains(&minutes) {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be within 1..=60, got {minutes}"
                )));
            }
        }
        if self.boundary_tolerance_minutes > 59 {
            return Err(Error::InvalidConfig(format!(
                "boundary_tolerance_minutes must be below 60, got {}",
                self.boundary_tolerance_minutes
            )));
        }
        if self.breakpoints.narrow >= self.breakpoints.medium {
            return Err(Error::InvalidConfig(format!(
                "narrow breakpoint ({}) must be below medium ({})",
                self.breakpoints.narrow, self.breakpoints.medium
            )));
        }
        if self.temperature_trend_threshold < 0.0 || self.humidity_trend_threshold < 0.0 {
            return Err(Error::InvalidConfig(
                "trend thresholds must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_constrained(&self, class: DisplayClass) -> bool {
        class <= self.constrained_up_to
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn test_constrained_classes() {
        let mut config = EngineConfig::default();
        assert!(config.is_constrained(DisplayClass::Narrow));
        assert!(!config.is_constrained(DisplayClass::Medium));

        config.constrained_up_to = DisplayClass::Medium;
        assert!(config.is_constrained(DisplayClass::Medium));
        assert!(!config.is_constrained(DisplayClass::Wide));
    }

    #[test]
    fn test_rejects_bad_bucket_width() {
        let config = EngineConfig {
            bucket_minutes: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_inverted_breakpoints() {
        let config = EngineConfig {
            breakpoints: Breakpoints {
                narrow: 800,
                medium: 600,
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_path_partial_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"bucket_minutes": 15, "constrained_up_to": "medium"}}"#).unwrap();

        let config = EngineConfig::from_path(file.path()).unwrap();
        assert_eq!(config.bucket_minutes, 15);
        assert_eq!(config.constrained_up_to, DisplayClass::Medium);
        assert_eq!(config.short_bucket_minutes, 5);
    }

    #[test]
    fn test_from_path_unknown_field() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"bucket_minute": 15}}"#).unwrap();
        assert!(matches!(
            EngineConfig::from_path(file.path()),
            Err(Error::Json(_))
        ));
    }
}
