//! # SH-2 Command Encoder
//!
//! Builds the fixed control payloads sent to the sensor hub.

use bytes::{BufMut, BytesMut};

use super::report::ReportId;

/// Soft reset command byte (Executable channel)
pub const EXECUTABLE_RESET: u8 = 0x01;

/// Set Feature command payload length
pub const SET_FEATURE_LEN: usize = 21;

/// Product ID request payload length
pub const PRODUCT_ID_REQUEST_LEN: usize = 2;

/// Encode a Set Feature command enabling `feature` at `interval_us`
///
/// # Arguments
///
/// * `feature` - Report to enable
/// * `interval_us` - Report interval in microseconds
///
/// # Returns
///
/// * `Vec<u8>` - 21-byte payload for the Control channel
///
/// # Layout
///
/// ```text
/// Byte 0:     0xFD (Set Feature)
/// Byte 1:     Feature report ID
/// Byte 2:     Feature flags (0)
/// Byte 3-4:   Change sensitivity (0)
/// Byte 5-8:   Report interval, µs (u32 LE)
/// Byte 9-20:  Batch interval + sensor-specific config (0)
/// ```
///
/// # Examples
///
/// ```
/// use sh2_bridge::sh2::command::encode_set_feature;
/// use sh2_bridge::sh2::report::ReportId;
///
/// let payload = encode_set_feature(ReportId::RotationVector, 50_000);
/// assert_eq!(payload.len(), 21);
/// assert_eq!(payload[0], 0xFD);
/// ```
pub fn encode_set_feature(feature: ReportId, interval_us: u32) -> Vec<u8> {
    let mut payload = BytesMut::with_capacity(SET_FEATURE_LEN);
    payload.put_u8(ReportId::SetFeatureCommand.into());
    payload.put_u8(feature.into());
    payload.put_u8(0); // flags
    payload.put_u16_le(0); // change sensitivity
    payload.put_u32_le(interval_us);
    payload.put_bytes(0, SET_FEATURE_LEN - payload.len());
    payload.to_vec()
}

/// Encode a Product ID request
pub fn encode_product_id_request() -> [u8; PRODUCT_ID_REQUEST_LEN] {
    [ReportId::ProductIdRequest.into(), 0x00]
}

/// Encode a soft reset command
pub fn encode_soft_reset() -> [u8; 1] {
    [EXECUTABLE_RESET]
}
