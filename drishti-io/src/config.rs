//! Configuration for the DrishtiIO daemon
//!
//! Loaded from a TOML file. Every section and field is optional; anything
//! missing falls back to its default.
//!
//! ```toml
//! [tracking]
//! port = 2001
//! frame_rate = { numerator = 25, denominator = 1 }
//!
//! [transform]
//! convention = "view_direction_y"   # view_direction_x | unity
//! scale = 100.0
//! sensor_source = "chip"            # fake_chip
//!
//! [driver]
//! poll_interval_ms = 10
//! error_backoff_ms = 1000
//!
//! [publisher]
//! enabled = false
//! target = "127.0.0.1:5600"
//! wire_format = "json"              # postcard
//!
//! [logging]
//! level = "info"
//! ```

use crate::core::FrameRate;
use crate::driver::DriverConfig;
use crate::error::{Error, Result};
use crate::streaming::PublisherConfig;
use crate::transform::TransformConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

/// Default tracker port
pub const DEFAULT_PORT: u16 = 2001;

/// Top-level application configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub tracking: TrackingConfig,
    pub transform: TransformConfig,
    pub driver: DriverConfig,
    pub publisher: PublisherConfig,
    pub logging: LoggingConfig,
}

/// Tracker input
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// UDP port the tracker sends to
    pub port: u16,
    /// Rate the tracker counter runs at
    pub frame_rate: FrameRate,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            frame_rate: FrameRate::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` overrides it
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from TOML file
    ///
    /// # Example
    /// ```no_run
    /// use drishti_io::config::AppConfig;
    ///
    /// let config = AppConfig::from_file("drishti.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or use defaults if the file does not exist
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        match Self::from_file(path.as_ref()) {
            Err(Error::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                log::warn!(
                    "Config file {} not found, using defaults",
                    path.as_ref().display()
                );
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        let rate = self.tracking.frame_rate;
        if rate.numerator == 0 || rate.denominator == 0 {
            return Err(Error::InvalidParameter(format!(
                "frame_rate {}/{} must be non-zero",
                rate.numerator, rate.denominator
            )));
        }
        if !self.transform.scale.is_finite() || self.transform.scale == 0.0 {
            return Err(Error::InvalidParameter(format!(
                "transform.scale {} must be finite and non-zero",
                self.transform.scale
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streaming::WireFormat;
    use crate::transform::{CoordinateConvention, SensorSource};

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.tracking.port, 2001);
        assert_eq!(config.tracking.frame_rate, FrameRate::new(30, 1));
        assert_eq!(
            config.transform.convention,
            CoordinateConvention::ViewDirectionY
        );
        assert_eq!(config.transform.scale, 100.0);
        assert_eq!(config.driver.poll_interval_ms, 10);
        assert_eq!(config.driver.error_backoff_ms, 1000);
        assert!(!config.publisher.enabled);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_file() {
        let toml_str = r#"
            [tracking]
            port = 6301
            frame_rate = { numerator = 30000, denominator = 1001 }

            [transform]
            convention = "unity"
            scale = 1.0
            sensor_source = "fake_chip"

            [driver]
            poll_interval_ms = 5
            error_backoff_ms = 500

            [publisher]
            enabled = true
            target = "10.0.0.5:7000"
            wire_format = "postcard"

            [logging]
            level = "debug"
        "#;

        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.tracking.port, 6301);
        assert_eq!(config.tracking.frame_rate, FrameRate::new(30000, 1001));
        assert_eq!(config.transform.convention, CoordinateConvention::Unity);
        assert_eq!(config.transform.sensor_source, SensorSource::FakeChip);
        assert_eq!(config.driver.poll_interval_ms, 5);
        assert!(config.publisher.enabled);
        assert_eq!(config.publisher.wire_format, WireFormat::Postcard);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: AppConfig = toml::from_str("[tracking]\nport = 40000\n").unwrap();
        assert_eq!(config.tracking.port, 40000);
        assert_eq!(config.tracking.frame_rate, FrameRate::default());
        assert_eq!(config.transform, TransformConfig::default());
        assert_eq!(config.publisher, PublisherConfig::default());
    }

    #[test]
    fn test_file_roundtrip_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drishti.toml");

        let mut config = AppConfig::default();
        config.tracking.port = 5001;
        config.publisher.wire_format = WireFormat::Postcard;
        config.to_file(&path).unwrap();
        assert_eq!(AppConfig::from_file(&path).unwrap(), config);

        let missing = dir.path().join("absent.toml");
        assert!(AppConfig::from_file(&missing).is_err());
        assert_eq!(AppConfig::load(&missing).unwrap(), AppConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(
            &path,
            "[tracking]\nframe_rate = { numerator = 0, denominator = 1 }\n",
        )
        .unwrap();
        assert!(matches!(
            AppConfig::load(&path),
            Err(Error::InvalidParameter(_))
        ));

        fs::write(&path, "[tracking]\nport = \"abc\"\n").unwrap();
        assert!(matches!(AppConfig::from_file(&path), Err(Error::Config(_))));
    }
}
