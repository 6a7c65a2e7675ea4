//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{BridgeError, Result};
use crate::session::SessionOptions;
use crate::sh2::report::ReportId;
use crate::transport::{CargoRead, TransportKind};

/// 7-bit addresses outside the I2C reserved ranges
pub const I2C_ADDRESS_RANGE: std::ops::RangeInclusive<u8> = 0x08..=0x77;

/// Baud rates accepted for the serial link
pub const SUPPORTED_BAUD_RATES: [u32; 6] = [115200, 230400, 460800, 921600, 1000000, 3000000];

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub transport: TransportConfig,
    pub session: SessionConfig,

    #[serde(default)]
    pub features: Vec<FeatureConfig>,

    pub telemetry: TelemetryConfig,
    pub logging: LoggingConfig,
}

/// Transport configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TransportConfig {
    #[serde(default)]
    pub kind: TransportKind,

    /// I2C bus number or device path
    #[serde(default = "default_bus")]
    pub bus: String,

    #[serde(default = "default_address")]
    pub address: u8,

    #[serde(default = "default_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default)]
    pub cargo_read: CargoRead,
}

/// Session configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    #[serde(default = "default_identify_attempts")]
    pub identify_attempts: u32,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_reset_settle_ms")]
    pub reset_settle_ms: u64,
}

/// One report to enable at startup
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct FeatureConfig {
    pub report: ReportId,
    pub interval_us: u32,
}

/// Telemetry configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default = "default_telemetry_enabled")]
    pub enabled: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_max_records_per_file")]
    pub max_records_per_file: usize,

    #[serde(default = "default_max_files_to_keep")]
    pub max_files_to_keep: usize,

    #[serde(default = "default_log_interval_ms")]
    pub log_interval_ms: u64,

    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Diagnostic logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Write daily-rolling log files here instead of stdout
    #[serde(default)]
    pub directory: Option<String>,
}

// Default value functions
fn default_bus() -> String { "1".to_string() }
fn default_address() -> u8 { 0x4A }
fn default_port() -> String { "/dev/ttyUSB0".to_string() }
fn default_baud_rate() -> u32 { 3000000 }
fn default_timeout_ms() -> u64 { 100 }

fn default_identify_attempts() -> u32 { 100 }
fn default_poll_interval_ms() -> u64 { 10 }
fn default_reset_settle_ms() -> u64 { 500 }

fn default_telemetry_enabled() -> bool { true }
fn default_log_dir() -> String { "./logs".to_string() }
fn default_max_records_per_file() -> usize { 10000 }
fn default_max_files_to_keep() -> usize { 10 }
fn default_log_interval_ms() -> u64 { 100 }
fn default_log_format() -> String { "jsonl".to_string() }

fn default_log_level() -> String { "info".to_string() }

impl TransportConfig {
    /// Upper bound on each transport read
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl SessionConfig {
    /// Request/response tunables for the session
    pub fn options(&self) -> SessionOptions {
        SessionOptions {
            identify_attempts: self.identify_attempts,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }

    /// Pause after a soft reset before talking to the hub again
    pub fn reset_settle(&self) -> Duration {
        Duration::from_millis(self.reset_settle_ms)
    }
}

fn invalid(msg: impl std::fmt::Display) -> BridgeError {
    BridgeError::Config(toml::de::Error::custom(msg))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use sh2_bridge::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    fn validate(&self) -> Result<()> {
        // Validate transport configuration
        match self.transport.kind {
            TransportKind::I2c => {
                if self.transport.bus.is_empty() {
                    return Err(invalid("transport bus cannot be empty"));
                }

                if !I2C_ADDRESS_RANGE.contains(&self.transport.address) {
                    return Err(invalid(format!(
                        "address {:#04x} must be between 0x08 and 0x77",
                        self.transport.address
                    )));
                }
            }
            TransportKind::Serial => {
                if self.transport.port.is_empty() {
                    return Err(invalid("transport port cannot be empty"));
                }

                if !SUPPORTED_BAUD_RATES.contains(&self.transport.baud_rate) {
                    return Err(invalid(
                        "baud_rate must be one of: 115200, 230400, 460800, 921600, 1000000, 3000000",
                    ));
                }
            }
        }

        if self.transport.timeout_ms == 0 || self.transport.timeout_ms > 10000 {
            return Err(invalid("timeout_ms must be between 1 and 10000"));
        }

        // Validate session timing
        if self.session.identify_attempts == 0 {
            return Err(invalid("identify_attempts must be greater than 0"));
        }

        if self.session.poll_interval_ms == 0 || self.session.poll_interval_ms > 10000 {
            return Err(invalid("poll_interval_ms must be between 1 and 10000"));
        }

        if self.session.reset_settle_ms > 10000 {
            return Err(invalid("reset_settle_ms must be at most 10000"));
        }

        // Only reports with a known record layout can be decoded
        for feature in &self.features {
            if !feature.report.is_sensor() {
                return Err(invalid(format!(
                    "feature {:?} is not a sensor report",
                    feature.report
                )));
            }

            if feature.report.record_length().is_none() {
                return Err(invalid(format!(
                    "feature {:?} is not a decodable sensor report",
                    feature.report
                )));
            }

            if feature.interval_us == 0 {
                return Err(invalid(format!(
                    "feature {:?} interval_us must be greater than 0",
                    feature.report
                )));
            }
        }

        // Validate telemetry configuration
        if self.telemetry.enabled && self.telemetry.log_dir.is_empty() {
            return Err(invalid("telemetry log_dir cannot be empty when enabled"));
        }

        if self.telemetry.log_interval_ms == 0 || self.telemetry.log_interval_ms > 60000 {
            return Err(invalid("log_interval_ms must be between 1 and 60000"));
        }

        if self.telemetry.max_records_per_file == 0 {
            return Err(invalid("max_records_per_file must be greater than 0"));
        }

        if self.telemetry.max_files_to_keep == 0 {
            return Err(invalid("max_files_to_keep must be greater than 0"));
        }

        if self.telemetry.format != "jsonl" {
            return Err(invalid("log format must be 'jsonl' (only supported format)"));
        }

        // Validate logging
        if self.logging.level.is_empty() {
            return Err(invalid("logging level cannot be empty"));
        }

        if matches!(&self.logging.directory, Some(dir) if dir.is_empty()) {
            return Err(invalid("logging directory cannot be empty when set"));
        }

        Ok(())
    }
}
