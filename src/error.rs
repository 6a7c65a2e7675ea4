//! # Error Types
//!
//! Custom error types for SH2 Bridge using `thiserror`.

use thiserror::Error;

use crate::sh2::report::ReportId;

/// Main error type for SH2 Bridge
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Malformed or undersized SHTP header, or a frame that cannot be built
    #[error("SHTP format error: {0}")]
    Format(String),

    /// Sensor record shorter than the fixed length of its report type
    #[error("Truncated {report:?} record: expected {expected} bytes, got {actual}")]
    TruncatedRecord {
        report: ReportId,
        expected: usize,
        actual: usize,
    },

    /// Report identity with no entry in the decode table
    #[error("Unsupported report ID 0x{0:02X}")]
    UnsupportedReport(u8),

    /// Errors raised by the transport collaborator, passed through unchanged
    #[error("Transport error: {0}")]
    Transport(#[source] std::io::Error),

    /// Transport returned fewer bytes than requested
    #[error("Short read: expected {expected} bytes, got {actual}")]
    ShortRead { expected: usize, actual: usize },

    /// Header was consumed but its cargo never arrived
    #[error("Cargo lost after header ({expected} bytes expected): {source}")]
    CargoLost {
        expected: usize,
        #[source]
        source: std::io::Error,
    },

    /// Bounded request/response exchange gave up
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Serial port could not be opened
    #[error("Serial port error: {0}")]
    Serial(String),

    /// I2C bus could not be opened
    #[error("I2C bus error: {0}")]
    I2c(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Telemetry serialization errors
    #[error("Telemetry error: {0}")]
    Telemetry(#[from] serde_json::Error),

    /// File I/O errors (configuration, telemetry logs)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Whether part of a frame was consumed and the inbound byte stream may
    /// no longer start on a header
    pub fn is_desync(&self) -> bool {
        matches!(self, Self::ShortRead { .. } | Self::CargoLost { .. })
    }
}

/// Result type alias for SH2 Bridge
pub type Result<T> = std::result::Result<T, BridgeError>;
