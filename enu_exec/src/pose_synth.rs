//! # Pose Synthesizer
//!
//! Combines a projected fix, the lever arm and the current heading into the pose of the body
//! frame, along with its covariance.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::{
    enu::LocalPoint,
    gnss::GeodeticFix,
    odom::{CorrectedPose, POSE_COV_DIM},
};
use nalgebra::{Matrix6, Vector3, Vector6};
use util::maths::rotate_about_z;

use crate::params::EnuExecParams;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Identity orientation, ordered `[x, y, z, w]`. A single fix carries no orientation information.
pub const IDENTITY_Q: [f64; 4] = [0.0, 0.0, 0.0, 1.0];

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Build the corrected pose for a single fix.
///
/// ## Arguments
/// - `local`: the fix projected into the ENU frame
/// - `lever_arm_m`: the sensor origin in the body frame
/// - `heading_yaw_rad`: the current heading of the body
/// - `fix`: the fix itself, for the timestamp and variance
/// - `params`: frame names and the covariance and altitude overrides
pub fn synthesize(
    local: &LocalPoint,
    lever_arm_m: &Vector3<f64>,
    heading_yaw_rad: f64,
    fix: &GeodeticFix,
    params: &EnuExecParams,
) -> CorrectedPose {
    let offset_m = rotate_about_z(lever_arm_m, heading_yaw_rad);

    let z = match params.altitude_lock() {
        Some(lock) => lock,
        None => local.up_m + offset_m.z,
    };

    CorrectedPose {
        timestamp: fix.timestamp,
        frame_id: params.output_frame_id.clone(),
        child_frame_id: params.robot_frame_id.clone(),
        position_m: [local.east_m + offset_m.x, local.north_m + offset_m.y, z],
        orientation_q: IDENTITY_Q,
        covariance: build_covariance(
            &fix.position_variance_m2,
            params.scale_covariance,
            params.invalid_covariance_value,
        ),
    }
}

/// Build the row-major pose covariance.
///
/// The position diagonal is the scaled fix variance, the orientation diagonal is set to
/// `invalid_value` and all other elements are zero.
pub fn build_covariance(
    position_variance_m2: &[f64; 3],
    scale: f64,
    invalid_value: f64,
) -> Vec<f64> {
    let diag = Vector6::new(
        position_variance_m2[0] * scale,
        position_variance_m2[1] * scale,
        position_variance_m2[2] * scale,
        invalid_value,
        invalid_value,
        invalid_value,
    );

    let cov = Matrix6::from_diagonal(&diag);

    // nalgebra is column-major, the diagonal matrix is symmetric so the order is the same.
    let mut out = Vec::with_capacity(POSE_COV_DIM * POSE_COV_DIM);
    for row in 0..POSE_COV_DIM {
        for col in 0..POSE_COV_DIM {
            out.push(cov[(row, col)]);
        }
    }

    out
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;
    use comms_if::eqpt::gnss::GeoPoint;
    use std::f64::consts::FRAC_PI_2;

    fn fix() -> GeodeticFix {
        GeodeticFix::now(GeoPoint::new(45.0, -75.0, 100.0), [0.5, 0.75, 2.0])
    }

    #[test]
    fn test_lever_arm_rotation() {
        let params = EnuExecParams::default();
        let origin = LocalPoint::default();
        let arm = Vector3::new(1.0, 0.0, 0.0);

        let pose = synthesize(&origin, &arm, 0.0, &fix(), &params);
        assert_eq!(pose.position_m, [1.0, 0.0, 0.0]);

        let pose = synthesize(&origin, &arm, FRAC_PI_2, &fix(), &params);
        assert_relative_eq!(pose.position_m[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(pose.position_m[1], 1.0, epsilon = 1e-12);
        assert_relative_eq!(pose.position_m[2], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_offset_added_to_local_point() {
        let params = EnuExecParams::default();
        let local = LocalPoint {
            east_m: 10.0,
            north_m: -4.0,
            up_m: 1.5,
        };

        let pose = synthesize(&local, &Vector3::new(0.0, 2.0, 0.5), -FRAC_PI_2, &fix(), &params);

        assert_relative_eq!(pose.position_m[0], 12.0, epsilon = 1e-12);
        assert_relative_eq!(pose.position_m[1], -4.0, epsilon = 1e-12);
        assert_relative_eq!(pose.position_m[2], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_altitude_lock() {
        let local = LocalPoint {
            east_m: 0.0,
            north_m: 0.0,
            up_m: 12.0,
        };
        let arm = Vector3::new(0.0, 0.0, 0.3);

        let mut params = EnuExecParams::default();
        params.lock_altitude = 5.0;
        let pose = synthesize(&local, &arm, 0.0, &fix(), &params);
        assert_eq!(pose.position_m[2], 5.0);

        params.lock_altitude = -1.0;
        let pose = synthesize(&local, &arm, 0.0, &fix(), &params);
        assert_relative_eq!(pose.position_m[2], 12.3, epsilon = 1e-12);
    }

    #[test]
    fn test_covariance_shape() {
        let cov = build_covariance(&[0.5, 0.75, 2.0], 4.0, -1.0);

        assert_eq!(cov.len(), 36);
        assert_eq!(cov[0], 2.0);
        assert_eq!(cov[7], 3.0);
        assert_eq!(cov[14], 8.0);
        assert_eq!(cov[21], -1.0);
        assert_eq!(cov[28], -1.0);
        assert_eq!(cov[35], -1.0);

        let num_zeros = cov.iter().filter(|&&c| c == 0.0).count();
        assert_eq!(num_zeros, 30);
    }

    #[test]
    fn test_pose_metadata() {
        let mut params = EnuExecParams::default();
        params.invalid_covariance_value = 1e6;
        let f = fix();

        let pose = synthesize(&LocalPoint::default(), &Vector3::zeros(), 0.3, &f, &params);

        assert_eq!(pose.timestamp, f.timestamp);
        assert_eq!(pose.frame_id, "odom");
        assert_eq!(pose.child_frame_id, "base_link");
        assert_eq!(pose.orientation_q, IDENTITY_Q);
        assert_eq!(pose.cov(0, 0), 0.5);
        assert_eq!(pose.cov(5, 5), 1e6);
        assert_eq!(pose.cov(0, 1), 0.0);
    }
}
