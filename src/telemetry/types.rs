//! Telemetry record written once per reading per log tick.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::session::StoredReading;
use crate::sh2::euler::EulerAngles;
use crate::sh2::reading::{Accuracy, Reading};
use crate::sh2::report::ReportId;

/// One JSONL line
///
/// ```text
/// {"timestamp":"2024-05-01T12:00:00.000Z","report":"rotation_vector",
///  "accuracy":"high","reading":{"kind":"quaternion","value":{...}},
///  "euler":{"pitch":0.0,"roll":0.0,"yaw":0.0}}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryRecord {
    pub timestamp: DateTime<Utc>,
    pub report: ReportId,
    pub accuracy: Accuracy,
    pub reading: Reading,

    /// Present for orientation readings only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub euler: Option<EulerAngles>,
}

impl TelemetryRecord {
    /// Build a record stamped with `timestamp`
    pub fn at(timestamp: DateTime<Utc>, stored: &StoredReading) -> Self {
        Self {
            timestamp,
            report: stored.report,
            accuracy: stored.accuracy,
            reading: stored.reading,
            euler: stored.reading.as_quaternion().map(|q| q.to_euler()),
        }
    }

    /// Build a record stamped with the current time
    pub fn now(stored: &StoredReading) -> Self {
        Self::at(Utc::now(), stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sh2::reading::{Quaternion, Vector3};
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_quaternion_record_has_euler() {
        let stored = StoredReading {
            report: ReportId::GameRotationVector,
            reading: Reading::Quaternion(Quaternion {
                i: 0.0,
                j: 0.0,
                k: 0.0,
                real: 1.0,
                accuracy_estimate: None,
            }),
            accuracy: Accuracy::High,
        };

        let record = TelemetryRecord::at(fixed_time(), &stored);
        assert!(record.euler.is_some());

        let json: serde_json::Value = serde_json::to_value(&record).unwrap();
        assert_eq!(json["report"], "game_rotation_vector");
        assert_eq!(json["accuracy"], "high");
        assert_eq!(json["reading"]["kind"], "quaternion");
        assert_eq!(json["reading"]["value"]["real"], 1.0);
        assert_eq!(json["euler"]["yaw"], 0.0);
        assert!(json["timestamp"]
            .as_str()
            .unwrap()
            .starts_with("2024-05-01T12:00:00"));
    }

    #[test]
    fn test_vector_record_omits_euler() {
        let stored = StoredReading {
            report: ReportId::Accelerometer,
            reading: Reading::Vector3(Vector3 {
                x: 0.0,
                y: 0.0,
                z: 9.8,
            }),
            accuracy: Accuracy::Medium,
        };

        let record = TelemetryRecord::at(fixed_time(), &stored);
        let json: serde_json::Value = serde_json::to_value(&record).unwrap();
        assert!(json.get("euler").is_none());
        assert_eq!(json["reading"]["kind"], "vector3");
        assert_eq!(json["reading"]["value"]["z"], 9.8);
    }
}
