//! # Heading
//!
//! Holds the most recent heading (yaw) received from the orientation source. Only the latest
//! sample is kept, there is no history.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use comms_if::eqpt::imu::ImuOrientation;
use nalgebra::{Quaternion, UnitQuaternion};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Quaternions with a norm below this cannot be normalised and are rejected.
const MIN_QUATERNION_NORM: f64 = 1e-9;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadingSample {
    /// Time of the orientation message this sample was taken from
    pub timestamp: DateTime<Utc>,

    /// Rotation about the vertical axis, right-hand rule.
    ///
    /// Units: radians, in the range [-pi, pi]
    pub yaw_rad: f64,
}

#[derive(Debug, Default)]
pub struct HeadingCell {
    latest: Option<HeadingSample>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum HeadingError {
    #[error("No heading has been recieved from the orientation source")]
    NoHeading,

    #[error("The latest heading is {age_s:.3} s old, the maximum age is {max_age_s:.3} s")]
    Stale { age_s: f64, max_age_s: f64 },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl HeadingSample {
    /// Extract the heading from an orientation message.
    ///
    /// Returns `None` if the quaternion in the message is degenerate or not finite.
    pub fn from_orientation(msg: &ImuOrientation) -> Option<Self> {
        let [x, y, z, w] = msg.orientation_q;
        let q = Quaternion::new(w, x, y, z);

        if !q.coords.iter().all(|c| c.is_finite()) {
            return None;
        }

        let attitude = UnitQuaternion::try_new(q, MIN_QUATERNION_NORM)?;
        let (_roll, _pitch, yaw) = attitude.euler_angles();

        Some(Self {
            timestamp: msg.timestamp,
            yaw_rad: yaw,
        })
    }
}

impl HeadingCell {
    /// Replace the held sample.
    pub fn update(&mut self, sample: HeadingSample) {
        self.latest = Some(sample);
    }

    pub fn latest(&self) -> Option<HeadingSample> {
        self.latest
    }

    /// Get the yaw to use for a fix taken at `at`.
    ///
    /// If `max_age` is given the sample must be no older than `max_age` relative to `at`.
    pub fn yaw_at(
        &self,
        at: &DateTime<Utc>,
        max_age: Option<chrono::Duration>,
    ) -> Result<f64, HeadingError> {
        let sample = self.latest.ok_or(HeadingError::NoHeading)?;

        if let Some(max_age) = max_age {
            let age = *at - sample.timestamp;
            if age > max_age {
                return Err(HeadingError::Stale {
                    age_s: util::time::duration_to_seconds(age).unwrap_or(std::f64::INFINITY),
                    max_age_s: util::time::duration_to_seconds(max_age)
                        .unwrap_or(std::f64::INFINITY),
                });
            }
        }

        Ok(sample.yaw_rad)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn orientation_from_rpy(roll: f64, pitch: f64, yaw: f64) -> ImuOrientation {
        let q = UnitQuaternion::from_euler_angles(roll, pitch, yaw);

        ImuOrientation {
            timestamp: Utc::now(),
            orientation_q: [q.i, q.j, q.k, q.w],
        }
    }

    #[test]
    fn test_yaw_extraction() {
        let sample = HeadingSample::from_orientation(&orientation_from_rpy(0.0, 0.0, FRAC_PI_2))
            .unwrap();
        assert_relative_eq!(sample.yaw_rad, FRAC_PI_2, epsilon = 1e-9);

        let sample =
            HeadingSample::from_orientation(&orientation_from_rpy(0.1, -0.2, -1.0)).unwrap();
        assert_relative_eq!(sample.yaw_rad, -1.0, epsilon = 1e-9);

        // Non-normalised quaternions are normalised first
        let msg = ImuOrientation {
            timestamp: Utc::now(),
            orientation_q: [0.0, 0.0, 0.0, 2.0],
        };
        assert_relative_eq!(
            HeadingSample::from_orientation(&msg).unwrap().yaw_rad,
            0.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_degenerate_orientation_rejected() {
        let zero = ImuOrientation {
            timestamp: Utc::now(),
            orientation_q: [0.0; 4],
        };
        assert!(HeadingSample::from_orientation(&zero).is_none());

        let nan = ImuOrientation {
            timestamp: Utc::now(),
            orientation_q: [0.0, 0.0, std::f64::NAN, 1.0],
        };
        assert!(HeadingSample::from_orientation(&nan).is_none());
    }

    #[test]
    fn test_cell() {
        let mut cell = HeadingCell::default();
        let now = Utc::now();

        assert_eq!(cell.yaw_at(&now, None), Err(HeadingError::NoHeading));

        cell.update(HeadingSample {
            timestamp: now - chrono::Duration::seconds(10),
            yaw_rad: 0.5,
        });
        cell.update(HeadingSample {
            timestamp: now - chrono::Duration::seconds(2),
            yaw_rad: 1.5,
        });

        // Without a limit any age is accepted
        assert_eq!(cell.yaw_at(&now, None), Ok(1.5));
        assert_eq!(
            cell.yaw_at(&now, Some(chrono::Duration::seconds(3))),
            Ok(1.5)
        );
        assert_eq!(
            cell.yaw_at(&now, Some(chrono::Duration::seconds(1))),
            Err(HeadingError::Stale {
                age_s: 2.0,
                max_age_s: 1.0
            })
        );
    }
}
