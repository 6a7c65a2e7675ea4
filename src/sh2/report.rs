//! # SH-2 Report Identities
//!
//! Report IDs and the per-report decode table.
//!
//! Input reports carry no length prefix, so the record length is purely a
//! function of report identity:
//!
//! | Report                                     | Length | Q-point |
//! |--------------------------------------------|--------|---------|
//! | Accelerometer, Linear Acceleration, Gravity| 10     | 8       |
//! | Gyroscope                                  | 10     | 9       |
//! | Magnetometer                               | 10     | 4       |
//! | Rotation Vector, Game Rotation Vector      | 14     | 14      |
//! | Geomagnetic Rotation Vector                | 14     | 12      |
//! | Stability Classifier                       | 6      | -       |

use serde::{Deserialize, Serialize};

/// Length of a timestamp base / rebase record
pub const TIMESTAMP_RECORD_LEN: usize = 5;

/// Length of a three-axis vector record
pub const VECTOR3_RECORD_LEN: usize = 10;

/// Length of a rotation vector record (quaternion + accuracy estimate)
pub const QUATERNION_RECORD_LEN: usize = 14;

/// Length of a stability classifier record
pub const CLASSIFIER_RECORD_LEN: usize = 6;

/// Offset of the status byte (accuracy in the low 2 bits)
pub const STATUS_OFFSET: usize = 2;

/// Offset of the first data field in every input report
pub const DATA_OFFSET: usize = 4;

/// Offset of the rotation vector accuracy estimate
pub const ACCURACY_ESTIMATE_OFFSET: usize = 12;

/// Mask for the accuracy bits of the status byte
pub const ACCURACY_MASK: u8 = 0x03;

/// Q-point of quaternion components for (game) rotation vectors
pub const Q_POINT_ROTATION: i32 = 14;

/// Q-point of geomagnetic rotation vector components
pub const Q_POINT_GEOMAGNETIC: i32 = 12;

/// Q-point of the rotation vector accuracy estimate (radians)
pub const Q_POINT_ACCURACY_ESTIMATE: i32 = 12;

/// Q-point of accelerometer, linear acceleration and gravity (m/s²)
pub const Q_POINT_ACCELERATION: i32 = 8;

/// Q-point of calibrated gyroscope (rad/s)
pub const Q_POINT_GYROSCOPE: i32 = 9;

/// Q-point of calibrated magnetometer (µT)
pub const Q_POINT_MAGNETOMETER: i32 = 4;

/// SH-2 report identities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ReportId {
    Accelerometer = 0x01,
    Gyroscope = 0x02,
    Magnetometer = 0x03,
    LinearAcceleration = 0x04,
    RotationVector = 0x05,
    Gravity = 0x06,
    GameRotationVector = 0x08,
    GeomagneticRotationVector = 0x09,
    StepCounter = 0x11,
    StabilityClassifier = 0x13,
    RawAccelerometer = 0x14,
    RawGyroscope = 0x15,
    RawMagnetometer = 0x16,
    ShakeDetector = 0x19,
    ActivityClassifier = 0x1E,
    GyroIntegratedRotationVector = 0x2A,
    CommandResponse = 0xF1,
    CommandRequest = 0xF2,
    ProductIdResponse = 0xF8,
    ProductIdRequest = 0xF9,
    TimestampRebase = 0xFA,
    BaseTimestamp = 0xFB,
    GetFeatureResponse = 0xFC,
    SetFeatureCommand = 0xFD,
    GetFeatureRequest = 0xFE,
}

impl ReportId {
    /// Convert from a raw report byte
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::Accelerometer),
            0x02 => Some(Self::Gyroscope),
            0x03 => Some(Self::Magnetometer),
            0x04 => Some(Self::LinearAcceleration),
            0x05 => Some(Self::RotationVector),
            0x06 => Some(Self::Gravity),
            0x08 => Some(Self::GameRotationVector),
            0x09 => Some(Self::GeomagneticRotationVector),
            0x11 => Some(Self::StepCounter),
            0x13 => Some(Self::StabilityClassifier),
            0x14 => Some(Self::RawAccelerometer),
            0x15 => Some(Self::RawGyroscope),
            0x16 => Some(Self::RawMagnetometer),
            0x19 => Some(Self::ShakeDetector),
            0x1E => Some(Self::ActivityClassifier),
            0x2A => Some(Self::GyroIntegratedRotationVector),
            0xF1 => Some(Self::CommandResponse),
            0xF2 => Some(Self::CommandRequest),
            0xF8 => Some(Self::ProductIdResponse),
            0xF9 => Some(Self::ProductIdRequest),
            0xFA => Some(Self::TimestampRebase),
            0xFB => Some(Self::BaseTimestamp),
            0xFC => Some(Self::GetFeatureResponse),
            0xFD => Some(Self::SetFeatureCommand),
            0xFE => Some(Self::GetFeatureRequest),
            _ => None,
        }
    }

    /// Whether this is a timestamp base or rebase marker
    pub fn is_timestamp(self) -> bool {
        matches!(self, Self::BaseTimestamp | Self::TimestampRebase)
    }

    /// Fixed record length, or `None` when the report is not decodable
    pub fn record_length(self) -> Option<usize> {
        match self {
            Self::Accelerometer
            | Self::LinearAcceleration
            | Self::Gravity
            | Self::Gyroscope
            | Self::Magnetometer => Some(VECTOR3_RECORD_LEN),
            Self::RotationVector | Self::GameRotationVector | Self::GeomagneticRotationVector => {
                Some(QUATERNION_RECORD_LEN)
            }
            Self::StabilityClassifier => Some(CLASSIFIER_RECORD_LEN),
            _ => None,
        }
    }

    /// Q-point used to scale this report's fixed-point fields
    pub fn q_point(self) -> Option<i32> {
        match self {
            Self::RotationVector | Self::GameRotationVector => Some(Q_POINT_ROTATION),
            Self::GeomagneticRotationVector => Some(Q_POINT_GEOMAGNETIC),
            Self::Accelerometer | Self::LinearAcceleration | Self::Gravity => {
                Some(Q_POINT_ACCELERATION)
            }
            Self::Gyroscope => Some(Q_POINT_GYROSCOPE),
            Self::Magnetometer => Some(Q_POINT_MAGNETOMETER),
            _ => None,
        }
    }

    /// Multiplier applied to raw fixed-point values (2^-Q)
    pub fn scalar(self) -> Option<f64> {
        self.q_point().map(q_scalar)
    }

    /// Whether the report can be requested with a Set Feature command
    pub fn is_sensor(self) -> bool {
        (self as u8) < 0xF0
    }
}

impl From<ReportId> for u8 {
    fn from(report: ReportId) -> u8 {
        report as u8
    }
}

/// Scale factor for a Q-point: 2^-q
pub fn q_scalar(q_point: i32) -> f64 {
    2f64.powi(-q_point)
}
