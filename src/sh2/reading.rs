//! # Decoded Sensor Values
//!
//! Typed values produced by the report decoder.

use serde::Serialize;

use super::euler::{to_euler, EulerAngles};

/// Three-axis reading in physical units (m/s², rad/s or µT)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    /// Components as an `[x, y, z]` array
    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

/// Orientation quaternion
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Quaternion {
    pub i: f64,
    pub j: f64,
    pub k: f64,
    pub real: f64,

    /// Heading accuracy estimate in radians, when the record carries one
    pub accuracy_estimate: Option<f64>,
}

impl Quaternion {
    /// Convert to pitch / roll / yaw in degrees
    pub fn to_euler(&self) -> EulerAngles {
        to_euler(self)
    }
}

/// Calibration accuracy reported in the status byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Accuracy {
    #[default]
    Unreliable = 0,
    Low = 1,
    Medium = 2,
    High = 3,
}

impl Accuracy {
    /// Extract accuracy from the low 2 bits of a status byte
    pub fn from_status(status: u8) -> Self {
        match status & 0x03 {
            0 => Self::Unreliable,
            1 => Self::Low,
            2 => Self::Medium,
            _ => Self::High,
        }
    }
}

/// Most recent decoded value for a report
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Reading {
    Vector3(Vector3),
    Quaternion(Quaternion),
    Classifier(u8),
}

impl Reading {
    pub fn as_vector3(&self) -> Option<Vector3> {
        match self {
            Reading::Vector3(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_quaternion(&self) -> Option<Quaternion> {
        match self {
            Reading::Quaternion(q) => Some(*q),
            _ => None,
        }
    }

    pub fn as_classifier(&self) -> Option<u8> {
        match self {
            Reading::Classifier(b) => Some(*b),
            _ => None,
        }
    }
}

/// Stability classifier output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StabilityClass {
    Unknown,
    OnTable,
    Stationary,
    Stable,
    InMotion,
}

impl StabilityClass {
    /// Map a raw classifier byte; out-of-range values are `Unknown`
    pub fn from_raw(value: u8) -> Self {
        match value {
            1 => Self::OnTable,
            2 => Self::Stationary,
            3 => Self::Stable,
            4 => Self::InMotion,
            _ => Self::Unknown,
        }
    }

    /// Human-readable label
    pub fn label(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::OnTable => "On Table",
            Self::Stationary => "Stationary",
            Self::Stable => "Stable",
            Self::InMotion => "In motion",
        }
    }
}

impl std::fmt::Display for StabilityClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Product ID response (report 0xF8)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ProductId {
    pub reset_cause: u8,
    pub sw_version_major: u8,
    pub sw_version_minor: u8,
    pub sw_part_number: u32,
    pub sw_build_number: u32,
    pub sw_version_patch: u16,
}

impl ProductId {
    /// Minimum cargo length of a full Product ID response
    pub const RESPONSE_LEN: usize = 16;

    /// Parse the fields of a Product ID response
    ///
    /// Returns `None` when the response is shorter than 16 bytes.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < Self::RESPONSE_LEN {
            return None;
        }

        Some(Self {
            reset_cause: data[1],
            sw_version_major: data[2],
            sw_version_minor: data[3],
            sw_part_number: u32::from_le_bytes([data[4], data[5], data[6], data[7]]),
            sw_build_number: u32::from_le_bytes([data[8], data[9], data[10], data[11]]),
            sw_version_patch: u16::from_le_bytes([data[12], data[13]]),
        })
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "part {} v{}.{}.{} build {}",
            self.sw_part_number,
            self.sw_version_major,
            self.sw_version_minor,
            self.sw_version_patch,
            self.sw_build_number
        )
    }
}
