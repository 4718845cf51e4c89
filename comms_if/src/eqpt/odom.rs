//! # Odometry Communications Module
//!
//! The corrected pose published by the ENU node for consumption by state estimators.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{serde::ts_milliseconds, DateTime, Utc};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Dimension of the pose covariance matrix (x, y, z, roll, pitch, yaw).
pub const POSE_COV_DIM: usize = 6;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A timestamped pose with covariance, expressed as the child frame in the parent frame.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CorrectedPose {
    /// UTC timestamp of the fix this pose was derived from
    #[serde(with = "ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    /// The frame the pose is expressed in
    pub frame_id: String,

    /// The frame whose pose this is
    pub child_frame_id: String,

    /// Position of the child frame in the parent frame
    ///
    /// Units: meters
    pub position_m: [f64; 3],

    /// Orientation of the child frame in the parent frame, ordered `[x, y, z, w]`.
    pub orientation_q: [f64; 4],

    /// Row-major 6x6 covariance over (x, y, z, roll, pitch, yaw).
    pub covariance: Vec<f64>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CorrectedPose {
    /// Get the covariance element at the given row and column.
    pub fn cov(&self, row: usize, col: usize) -> f64 {
        self.covariance[row * POSE_COV_DIM + col]
    }
}
