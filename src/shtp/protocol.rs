//! # SHTP Protocol Constants and Types
//!
//! Core framing definitions for SHTP communication.

use crate::error::{BridgeError, Result};

/// SHTP header size in bytes
pub const SHTP_HEADER_LEN: usize = 4;

/// Mask applied to the raw 16-bit length field
///
/// Bit 15 is a continuation flag that this implementation does not model.
pub const SHTP_LENGTH_MASK: u16 = 0x7FFF;

/// Largest frame length the header can express (header included)
pub const SHTP_MAX_FRAME_LEN: usize = SHTP_LENGTH_MASK as usize;

/// Number of logical SHTP channels
pub const SHTP_NUM_CHANNELS: usize = 6;

/// SHTP channels
///
/// Each channel is an independent stream multiplexed over the bus with its
/// own sequence counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Channel {
    /// SHTP command channel (advertisements, errors)
    Command = 0,
    /// Executable channel (reset, on/off)
    Executable = 1,
    /// Sensor hub control channel (Set Feature, Product ID)
    Control = 2,
    /// Normal input sensor reports
    InputSensorReports = 3,
    /// Wake input sensor reports
    WakeSensorReports = 4,
    /// Gyro-integrated rotation vector reports
    GyroRotationVector = 5,
}

impl Channel {
    /// All channels in wire order
    pub const ALL: [Channel; SHTP_NUM_CHANNELS] = [
        Channel::Command,
        Channel::Executable,
        Channel::Control,
        Channel::InputSensorReports,
        Channel::WakeSensorReports,
        Channel::GyroRotationVector,
    ];

    /// Index into per-channel tables
    pub fn index(self) -> usize {
        self as usize
    }

    /// Whether cargo on this channel is a batch of sensor report records
    pub fn carries_sensor_reports(self) -> bool {
        matches!(
            self,
            Channel::InputSensorReports | Channel::WakeSensorReports | Channel::GyroRotationVector
        )
    }
}

impl TryFrom<u8> for Channel {
    type Error = BridgeError;

    fn try_from(value: u8) -> Result<Self> {
        Channel::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| BridgeError::Format(format!("Unknown SHTP channel {}", value)))
    }
}
