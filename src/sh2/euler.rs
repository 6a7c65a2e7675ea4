//! # Euler Conversion
//!
//! Converts orientation quaternions into pitch / roll / yaw in degrees.
//!
//! Pitch is taken from the arcsine of `2(r·j − k·i)`. Floating-point error
//! near the poles can push that argument just past ±1, so it is clamped to
//! ±90° instead of producing NaN.

use std::f64::consts::FRAC_PI_2;

use serde::Serialize;

use super::reading::Quaternion;

/// Orientation angles in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct EulerAngles {
    pub pitch: f64,
    pub roll: f64,
    pub yaw: f64,
}

impl EulerAngles {
    /// Yaw normalized into `[0, 360)` degrees
    pub fn heading(&self) -> f64 {
        let heading = self.yaw.rem_euclid(360.0);
        // rem_euclid can round up to exactly 360.0 for tiny negative inputs
        if heading >= 360.0 {
            0.0
        } else {
            heading
        }
    }
}

/// Convert a quaternion to Euler angles (degrees)
pub fn to_euler(q: &Quaternion) -> EulerAngles {
    let (i, j, k, real) = (q.i, q.j, q.k, q.real);

    let roll = (2.0 * (real * i + j * k)).atan2(1.0 - 2.0 * (i * i + j * j));

    let sinp = 2.0 * (real * j - k * i);
    let pitch = if sinp.abs() >= 1.0 {
        FRAC_PI_2.copysign(sinp)
    } else {
        sinp.asin()
    };

    let yaw = (2.0 * (real * k + i * j)).atan2(1.0 - 2.0 * (j * j + k * k));

    EulerAngles {
        pitch: pitch.to_degrees(),
        roll: roll.to_degrees(),
        yaw: yaw.to_degrees(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn quat(i: f64, j: f64, k: f64, real: f64) -> Quaternion {
        Quaternion {
            i,
            j,
            k,
            real,
            accuracy_estimate: None,
        }
    }

    #[test]
    fn test_identity_is_level() {
        let angles = to_euler(&quat(0.0, 0.0, 0.0, 1.0));
        assert!(angles.pitch.abs() < TOLERANCE);
        assert!(angles.roll.abs() < TOLERANCE);
        assert!(angles.yaw.abs() < TOLERANCE);
    }

    #[test]
    fn test_pitch_clamped_at_pole() {
        // real = j = sqrt(0.5) gives sinp = 2 * 0.5 = 1.0 (or a hair above)
        let h = 0.5f64.sqrt();
        let angles = to_euler(&quat(0.0, h, 0.0, h));
        assert!(!angles.pitch.is_nan());
        assert!((angles.pitch - 90.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_pitch_clamped_when_overshooting() {
        // sinp = 2 * 0.6 * 0.9 = 1.08
        let angles = to_euler(&quat(0.0, 0.9, 0.0, 0.6));
        assert!((angles.pitch - 90.0).abs() < TOLERANCE);

        let angles = to_euler(&quat(0.0, -0.9, 0.0, 0.6));
        assert!((angles.pitch + 90.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_yaw_90_degrees() {
        let h = 0.5f64.sqrt();
        let angles = to_euler(&quat(0.0, 0.0, h, h));
        assert!((angles.yaw - 90.0).abs() < 1e-6);
        assert!(angles.pitch.abs() < 1e-6);
        assert!(angles.roll.abs() < 1e-6);
    }

    #[test]
    fn test_roll_90_degrees() {
        let h = 0.5f64.sqrt();
        let angles = to_euler(&quat(h, 0.0, 0.0, h));
        assert!((angles.roll - 90.0).abs() < 1e-6);
        assert!(angles.yaw.abs() < 1e-6);
    }

    #[test]
    fn test_quaternion_method_matches_function() {
        let q = quat(0.1, 0.2, 0.3, 0.927);
        assert_eq!(q.to_euler(), to_euler(&q));
    }

    #[test]
    fn test_deterministic() {
        let q = quat(0.123, -0.456, 0.789, 0.3);
        assert_eq!(to_euler(&q), to_euler(&q));
    }

    #[test]
    fn test_heading_normalization() {
        let angles = EulerAngles { pitch: 0.0, roll: 0.0, yaw: -90.0 };
        assert!((angles.heading() - 270.0).abs() < TOLERANCE);

        let angles = EulerAngles { pitch: 0.0, roll: 0.0, yaw: 45.0 };
        assert!((angles.heading() - 45.0).abs() < TOLERANCE);

        let angles = EulerAngles { pitch: 0.0, roll: 0.0, yaw: 180.0 };
        assert!((angles.heading() - 180.0).abs() < TOLERANCE);
    }
}
