//! # IMU Equipment Communications Module

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{serde::ts_milliseconds, DateTime, Utc};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Orientation estimate published by the IMU (or any attitude filter running on it).
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct ImuOrientation {
    /// UTC timestamp at which the orientation was estimated
    #[serde(with = "ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    /// Orientation of the body in the world frame as a quaternion, ordered `[x, y, z, w]`.
    pub orientation_q: [f64; 4],
}
