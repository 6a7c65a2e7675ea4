//! # SH-2 Report Decoder
//!
//! Converts fixed-length input report records into typed physical values.
//!
//! Every multi-byte field is a little-endian `i16` scaled by the report's
//! Q-point (`raw × 2^-Q`). Accuracy is the low 2 bits of the status byte.

use super::reading::{Accuracy, Quaternion, Reading, Vector3};
use super::report::*;
use crate::error::{BridgeError, Result};

/// Decode one input report record
///
/// # Arguments
///
/// * `report` - Report identity (record byte 0)
/// * `record` - Record bytes starting at the report ID
///
/// # Returns
///
/// * `Result<(Reading, Accuracy)>` - Decoded value and its accuracy
///
/// # Errors
///
/// Returns error if:
/// - The report has no entry in the decode table (`UnsupportedReport`)
/// - The record is shorter than the report's fixed length (`TruncatedRecord`)
///
/// # Examples
///
/// ```
/// use sh2_bridge::sh2::decoder::decode_record;
/// use sh2_bridge::sh2::report::ReportId;
///
/// // x = 256 at Q8 is 1.0 m/s²
/// let record = [0x01, 0x00, 0x03, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00];
/// let (reading, _) = decode_record(ReportId::Accelerometer, &record).unwrap();
/// assert_eq!(reading.as_vector3().unwrap().x, 1.0);
/// ```
pub fn decode_record(report: ReportId, record: &[u8]) -> Result<(Reading, Accuracy)> {
    let expected = report
        .record_length()
        .ok_or(BridgeError::UnsupportedReport(report as u8))?;

    if record.len() < expected {
        return Err(BridgeError::TruncatedRecord {
            report,
            expected,
            actual: record.len(),
        });
    }

    let accuracy = Accuracy::from_status(record[STATUS_OFFSET]);

    let reading = match report {
        ReportId::Accelerometer
        | ReportId::LinearAcceleration
        | ReportId::Gravity
        | ReportId::Gyroscope
        | ReportId::Magnetometer => Reading::Vector3(decode_vector3(record, q_scalar_for(report)?)),
        ReportId::RotationVector
        | ReportId::GameRotationVector
        | ReportId::GeomagneticRotationVector => {
            Reading::Quaternion(decode_quaternion(record, q_scalar_for(report)?))
        }
        ReportId::StabilityClassifier => Reading::Classifier(record[DATA_OFFSET]),
        _ => return Err(BridgeError::UnsupportedReport(report as u8)),
    };

    Ok((reading, accuracy))
}

fn q_scalar_for(report: ReportId) -> Result<f64> {
    report
        .scalar()
        .ok_or(BridgeError::UnsupportedReport(report as u8))
}

/// Read a little-endian `i16` at `offset` and scale it
fn read_fixed(record: &[u8], offset: usize, scalar: f64) -> f64 {
    f64::from(i16::from_le_bytes([record[offset], record[offset + 1]])) * scalar
}

/// Decode x/y/z at offsets 4, 6, 8 (record must be ≥ 10 bytes)
fn decode_vector3(record: &[u8], scalar: f64) -> Vector3 {
    Vector3 {
        x: read_fixed(record, DATA_OFFSET, scalar),
        y: read_fixed(record, DATA_OFFSET + 2, scalar),
        z: read_fixed(record, DATA_OFFSET + 4, scalar),
    }
}

/// Decode i/j/k/real at offsets 4..12 and the accuracy estimate at 12
///
/// `decode_record` only passes full 14-byte records, so the estimate is
/// always present here. It is Q12 regardless of the quaternion's own Q-point.
fn decode_quaternion(record: &[u8], scalar: f64) -> Quaternion {
    Quaternion {
        i: read_fixed(record, DATA_OFFSET, scalar),
        j: read_fixed(record, DATA_OFFSET + 2, scalar),
        k: read_fixed(record, DATA_OFFSET + 4, scalar),
        real: read_fixed(record, DATA_OFFSET + 6, scalar),
        accuracy_estimate: Some(read_fixed(
            record,
            ACCURACY_ESTIMATE_OFFSET,
            q_scalar(Q_POINT_ACCURACY_ESTIMATE),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector_record(report: ReportId, status: u8, x: i16, y: i16, z: i16) -> Vec<u8> {
        let mut record = vec![report as u8, 0x00, status, 0x00];
        record.extend_from_slice(&x.to_le_bytes());
        record.extend_from_slice(&y.to_le_bytes());
        record.extend_from_slice(&z.to_le_bytes());
        record
    }

    fn quaternion_record(report: ReportId, status: u8, q: [i16; 4], accuracy: i16) -> Vec<u8> {
        let mut record = vec![report as u8, 0x00, status, 0x00];
        for value in q {
            record.extend_from_slice(&value.to_le_bytes());
        }
        record.extend_from_slice(&accuracy.to_le_bytes());
        record
    }

    #[test]
    fn test_accelerometer_scalar() {
        let record = vector_record(ReportId::Accelerometer, 0x03, 256, 0, 0);
        let (reading, accuracy) = decode_record(ReportId::Accelerometer, &record).unwrap();
        let v = reading.as_vector3().unwrap();
        assert_eq!(v.x, 1.0);
        assert_eq!(v.y, 0.0);
        assert_eq!(v.z, 0.0);
        assert_eq!(accuracy, Accuracy::High);
    }

    #[test]
    fn test_negative_components() {
        // -9.81 m/s² ≈ -2511 at Q8
        let record = vector_record(ReportId::Gravity, 0x02, 0, 0, -2511);
        let (reading, accuracy) = decode_record(ReportId::Gravity, &record).unwrap();
        let v = reading.as_vector3().unwrap();
        assert!((v.z - (-2511.0 / 256.0)).abs() < 1e-12);
        assert_eq!(accuracy, Accuracy::Medium);
    }

    #[test]
    fn test_gyroscope_scalar() {
        let record = vector_record(ReportId::Gyroscope, 0x01, 512, -512, 1024);
        let (reading, accuracy) = decode_record(ReportId::Gyroscope, &record).unwrap();
        assert_eq!(reading.as_vector3().unwrap().to_array(), [1.0, -1.0, 2.0]);
        assert_eq!(accuracy, Accuracy::Low);
    }

    #[test]
    fn test_magnetometer_scalar() {
        let record = vector_record(ReportId::Magnetometer, 0x00, 16, 32, -48);
        let (reading, accuracy) = decode_record(ReportId::Magnetometer, &record).unwrap();
        assert_eq!(reading.as_vector3().unwrap().to_array(), [1.0, 2.0, -3.0]);
        assert_eq!(accuracy, Accuracy::Unreliable);
    }

    #[test]
    fn test_rotation_vector() {
        let record = quaternion_record(ReportId::RotationVector, 0x03, [0, 0, 0, 16384], 4096);
        let (reading, accuracy) = decode_record(ReportId::RotationVector, &record).unwrap();
        let q = reading.as_quaternion().unwrap();
        assert_eq!(q.real, 1.0);
        assert_eq!(q.i, 0.0);
        assert_eq!(q.accuracy_estimate, Some(1.0));
        assert_eq!(accuracy, Accuracy::High);

        let angles = q.to_euler();
        assert!(angles.pitch.abs() < 1e-9);
        assert!(angles.roll.abs() < 1e-9);
        assert!(angles.yaw.abs() < 1e-9);
    }

    #[test]
    fn test_geomagnetic_rotation_vector_uses_q12() {
        let record =
            quaternion_record(ReportId::GeomagneticRotationVector, 0x02, [4096, 0, 0, 0], 2048);
        let (reading, _) = decode_record(ReportId::GeomagneticRotationVector, &record).unwrap();
        let q = reading.as_quaternion().unwrap();
        assert_eq!(q.i, 1.0);
        // Accuracy estimate stays Q12 regardless of report
        assert_eq!(q.accuracy_estimate, Some(0.5));
    }

    #[test]
    fn test_game_rotation_vector() {
        let record = quaternion_record(ReportId::GameRotationVector, 0x01, [8192, 0, 0, 8192], 0);
        let (reading, _) = decode_record(ReportId::GameRotationVector, &record).unwrap();
        let q = reading.as_quaternion().unwrap();
        assert_eq!(q.i, 0.5);
        assert_eq!(q.real, 0.5);
    }

    #[test]
    fn test_stability_classifier() {
        let record = [0x13, 0x00, 0xFE, 0x00, 0x04, 0x00];
        let (reading, accuracy) = decode_record(ReportId::StabilityClassifier, &record).unwrap();
        assert_eq!(reading, Reading::Classifier(4));
        assert_eq!(accuracy, Accuracy::Medium);
    }

    #[test]
    fn test_truncated_record() {
        let record = vector_record(ReportId::Accelerometer, 0x03, 1, 2, 3);
        let result = decode_record(ReportId::Accelerometer, &record[..9]);
        match result {
            Err(BridgeError::TruncatedRecord { report, expected, actual }) => {
                assert_eq!(report, ReportId::Accelerometer);
                assert_eq!(expected, 10);
                assert_eq!(actual, 9);
            }
            other => panic!("Expected TruncatedRecord, got: {:?}", other),
        }
    }

    #[test]
    fn test_truncated_quaternion() {
        let record = quaternion_record(ReportId::RotationVector, 0x03, [0, 0, 0, 16384], 0);
        let result = decode_record(ReportId::RotationVector, &record[..12]);
        assert!(matches!(result, Err(BridgeError::TruncatedRecord { expected: 14, .. })));
    }

    #[test]
    fn test_unsupported_report() {
        let result = decode_record(ReportId::StepCounter, &[0x11; 16]);
        assert!(matches!(result, Err(BridgeError::UnsupportedReport(0x11))));
    }

    #[test]
    fn test_quaternion_always_carries_accuracy_estimate() {
        for report in [
            ReportId::RotationVector,
            ReportId::GameRotationVector,
            ReportId::GeomagneticRotationVector,
        ] {
            let record = quaternion_record(report, 0x03, [0, 0, 0, 0], 0);
            let (reading, _) = decode_record(report, &record).unwrap();
            assert_eq!(reading.as_quaternion().unwrap().accuracy_estimate, Some(0.0));
        }
    }

    #[test]
    fn test_longer_slice_is_accepted() {
        let mut record = vector_record(ReportId::Accelerometer, 0x03, 256, 0, 0);
        record.extend_from_slice(&[0xAA; 4]);
        let (reading, _) = decode_record(ReportId::Accelerometer, &record).unwrap();
        assert_eq!(reading.as_vector3().unwrap().x, 1.0);
    }
}
