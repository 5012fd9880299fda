//! Monitor configuration

use crate::MonitorError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use vigilance::SwayConfig;

/// Thresholds and window sizes for the per-frame evaluation loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Eye-aspect-ratio below which the eyes count as closed
    pub ear_threshold: f64,

    /// Pitch (degrees) below which the head counts as down
    pub head_down_threshold_degrees: f64,

    /// Rotation (degrees) beyond which a head direction counts as movement
    pub head_movement_threshold_degrees: f64,

    /// Trailing window for sway movement retention (seconds)
    pub head_movement_window_secs: f64,

    /// Direction reversals required to qualify as drowsy sway
    pub min_head_reversals: u32,

    /// Minimum sway episode length to confirm drowsiness (seconds)
    pub head_drowsy_duration_secs: f64,

    /// Centered idle gap that ends a sway episode (seconds)
    pub sway_idle_reset_secs: f64,

    /// Trailing window for PERCLOS estimation (seconds)
    pub perclos_window_secs: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            ear_threshold: 0.23,
            head_down_threshold_degrees: -15.0,
            head_movement_threshold_degrees: 12.0,
            head_movement_window_secs: 6.0,
            min_head_reversals: 4,
            head_drowsy_duration_secs: 3.0,
            sway_idle_reset_secs: 2.0,
            perclos_window_secs: 60.0,
        }
    }
}

impl MonitorConfig {
    /// Check configuration invariants; fatal at startup when violated
    pub fn validate(&self) -> Result<(), MonitorError> {
        if !(0.0..1.0).contains(&self.ear_threshold) || self.ear_threshold <= 0.0 {
            return Err(MonitorError::InvalidConfig(format!(
                "ear_threshold {} must be in (0, 1)",
                self.ear_threshold
            )));
        }
        if !(-90.0..0.0).contains(&self.head_down_threshold_degrees) {
            return Err(MonitorError::InvalidConfig(format!(
                "head_down_threshold_degrees {} must be in (-90, 0)",
                self.head_down_threshold_degrees
            )));
        }
        for (name, value) in [
            ("head_movement_window_secs", self.head_movement_window_secs),
            ("head_drowsy_duration_secs", self.head_drowsy_duration_secs),
            ("sway_idle_reset_secs", self.sway_idle_reset_secs),
            ("perclos_window_secs", self.perclos_window_secs),
        ] {
            if value <= 0.0 {
                return Err(MonitorError::InvalidConfig(format!(
                    "{name} {value} must be positive"
                )));
            }
        }
        Ok(())
    }

    /// Layer an optional TOML file and `MONITOR_*` environment variables
    /// over the defaults
    pub fn load(path: Option<&Path>) -> Result<Self, MonitorError> {
        let mut builder =
            ::config::Config::builder().add_source(::config::Config::try_from(&Self::default())?);
        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path));
        }
        let cfg: Self = builder
            .add_source(::config::Environment::with_prefix("MONITOR"))
            .build()?
            .try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Sway detector parameters derived from this configuration
    pub fn sway_config(&self) -> SwayConfig {
        SwayConfig {
            threshold_degrees: self.head_movement_threshold_degrees,
            window: Duration::from_secs_f64(self.head_movement_window_secs),
            min_reversals: self.min_head_reversals,
            drowsy_duration: Duration::from_secs_f64(self.head_drowsy_duration_secs),
            idle_reset: Duration::from_secs_f64(self.sway_idle_reset_secs),
        }
    }

    /// PERCLOS trailing window
    pub fn perclos_window(&self) -> Duration {
        Duration::from_secs_f64(self.perclos_window_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(MonitorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_ear_threshold() {
        let config = MonitorConfig {
            ear_threshold: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_positive_head_down_threshold() {
        let config = MonitorConfig {
            head_down_threshold_degrees: 15.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_nonpositive_windows() {
        let config = MonitorConfig {
            perclos_window_secs: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_without_file_yields_defaults() {
        let config = MonitorConfig::load(None).unwrap();
        assert_eq!(config.ear_threshold, MonitorConfig::default().ear_threshold);
    }
}
