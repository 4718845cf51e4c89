//! # Fix to ENU
//!
//! The cyclic module run once per GNSS fix. It owns all state that persists between fixes: the
//! datum, the lever arm and the latest heading.
//!
//! A fix is turned into a pose in this order:
//! 1. Establish the datum if this is the first fix
//! 2. Project the fix into the ENU frame at the datum
//! 3. Resolve the lever arm if it has not been resolved yet
//! 4. Get the current heading
//! 5. Synthesize the corrected pose
//!
//! If steps 3 or 4 fail the fix is dropped and an error returned. Nothing is emitted for a
//! dropped fix, the next fix is processed from the start.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::{
    gnss::{Datum, GeodeticFix},
    imu::ImuOrientation,
    odom::CorrectedPose,
};
use log::{debug, warn};
use serde::Serialize;
use util::module::State;

use crate::{
    datum::DatumMgr,
    heading::{HeadingCell, HeadingError, HeadingSample},
    lever_arm::{FrameOffsetSource, LeverArmResolver, LookupError},
    params::EnuExecParams,
    pose_synth, projection,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Fix to ENU module state
pub struct FixToEnu<S: FrameOffsetSource> {
    params: EnuExecParams,

    datum_mgr: DatumMgr,

    lever_arm: LeverArmResolver,

    heading: HeadingCell,

    /// Where the lever arm is looked up
    frame_source: S,

    report: StatusReport,
}

/// Status report for fix to ENU processing.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct StatusReport {
    pub datum_set: bool,
    pub lever_arm_resolved: bool,

    /// Number of poses produced since startup
    pub num_poses: u64,

    /// Number of fixes dropped since startup
    pub num_dropped: u64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Reasons a fix can be dropped.
#[derive(Debug, thiserror::Error)]
pub enum FixToEnuError {
    #[error("Could not resolve the lever arm: {0}")]
    LeverArmUnresolved(LookupError),

    #[error("Heading unavailable: {0}")]
    Heading(HeadingError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<S: FrameOffsetSource> FixToEnu<S> {
    pub fn new(params: EnuExecParams, frame_source: S) -> Self {
        let datum_mgr = DatumMgr::new(params.configured_datum());
        let lever_arm = LeverArmResolver::new(
            &params.robot_frame_id,
            &params.sensor_frame_id,
            params.tf_lookup_timeout(),
        );

        Self {
            params,
            datum_mgr,
            lever_arm,
            heading: HeadingCell::default(),
            frame_source,
            report: StatusReport::default(),
        }
    }

    /// Update the heading from a new orientation message.
    ///
    /// Degenerate orientations are logged and ignored, the previous heading is kept.
    pub fn handle_orientation(&mut self, msg: &ImuOrientation) {
        match HeadingSample::from_orientation(msg) {
            Some(sample) => self.heading.update(sample),
            None => warn!(
                "Ignoring degenerate orientation quaternion {:?}",
                msg.orientation_q
            ),
        }
    }

    /// The datum, or `None` if no fix has been processed yet.
    pub fn datum(&self) -> Option<Datum> {
        self.datum_mgr.datum()
    }

    /// Take the datum announcement. Returns `Some` once, after the datum has been established.
    pub fn take_datum_announcement(&mut self) -> Option<Datum> {
        self.datum_mgr.take_announcement()
    }

    pub fn params(&self) -> &EnuExecParams {
        &self.params
    }

    pub fn report(&self) -> StatusReport {
        self.report
    }

    fn process_fix(&mut self, fix: &GeodeticFix) -> Result<CorrectedPose, FixToEnuError> {
        let datum = self.datum_mgr.ensure_datum(fix);
        self.report.datum_set = true;

        let local = projection::project_fix(fix, &datum);

        let lever_arm_m = self
            .lever_arm
            .resolve(&mut self.frame_source)
            .map_err(FixToEnuError::LeverArmUnresolved)?;
        self.report.lever_arm_resolved = true;

        let yaw_rad = self
            .heading
            .yaw_at(&fix.timestamp, self.params.max_heading_age())
            .map_err(FixToEnuError::Heading)?;

        debug!(
            "Fix at [{:.3}, {:.3}, {:.3}] m, heading {:.1} deg",
            local.east_m,
            local.north_m,
            local.up_m,
            yaw_rad.to_degrees()
        );

        Ok(pose_synth::synthesize(
            &local,
            &lever_arm_m,
            yaw_rad,
            fix,
            &self.params,
        ))
    }
}

impl<S: FrameOffsetSource> State for FixToEnu<S> {
    type InputData = GeodeticFix;
    type OutputData = CorrectedPose;
    type StatusReport = StatusReport;
    type ProcError = FixToEnuError;

    /// Process a single fix.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        match self.process_fix(input_data) {
            Ok(pose) => {
                self.report.num_poses += 1;
                Ok((pose, self.report))
            }
            Err(e) => {
                self.report.num_dropped += 1;
                Err(e)
            }
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::lever_arm::{test::FlakySource, StaticFrameOffsets};
    use approx::assert_relative_eq;
    use chrono::Utc;
    use comms_if::eqpt::gnss::GeoPoint;
    use nalgebra::{UnitQuaternion, Vector3};

    fn orientation(yaw: f64) -> ImuOrientation {
        let q = UnitQuaternion::from_euler_angles(0.0, 0.0, yaw);

        ImuOrientation {
            timestamp: Utc::now(),
            orientation_q: [q.i, q.j, q.k, q.w],
        }
    }

    fn fix_at(lat: f64, lon: f64, alt: f64) -> GeodeticFix {
        GeodeticFix::now(GeoPoint::new(lat, lon, alt), [1.0, 1.0, 4.0])
    }

    fn datum_params() -> EnuExecParams {
        EnuExecParams {
            datum_latitude: Some(45.0),
            datum_longitude: Some(-75.0),
            datum_altitude: Some(100.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_end_to_end() {
        let mut f2e = FixToEnu::new(
            datum_params(),
            FlakySource::new(0, Vector3::new(2.0, 0.0, 0.3)),
        );
        f2e.handle_orientation(&orientation(0.0));

        let (pose, report) = f2e.proc(&fix_at(45.0, -75.0, 100.0)).unwrap();

        assert_relative_eq!(pose.position_m[0], 2.0, epsilon = 1e-6);
        assert_relative_eq!(pose.position_m[1], 0.0, epsilon = 1e-6);
        assert_relative_eq!(pose.position_m[2], 0.3, epsilon = 1e-6);
        assert_eq!(pose.cov(2, 2), 4.0);
        assert_eq!(pose.cov(3, 3), -1.0);

        assert_eq!(
            report,
            StatusReport {
                datum_set: true,
                lever_arm_resolved: true,
                num_poses: 1,
                num_dropped: 0,
            }
        );
        assert_eq!(f2e.take_datum_announcement(), Some(Datum::new(45.0, -75.0, 100.0)));
        assert_eq!(f2e.take_datum_announcement(), None);
    }

    #[test]
    fn test_first_fix_becomes_datum() {
        let mut f2e = FixToEnu::new(
            EnuExecParams::default(),
            FlakySource::new(0, Vector3::zeros()),
        );
        f2e.handle_orientation(&orientation(1.0));

        let first = fix_at(51.0, 0.5, 30.0);
        let (pose, _) = f2e.proc(&first).unwrap();
        assert_relative_eq!(pose.position_m[0], 0.0, epsilon = 1e-6);
        assert_relative_eq!(pose.position_m[1], 0.0, epsilon = 1e-6);

        let (pose, _) = f2e.proc(&fix_at(51.001, 0.5, 30.0)).unwrap();
        assert!(pose.position_m[1] > 100.0);
        assert_eq!(f2e.datum(), Some(first.position));
    }

    #[test]
    fn test_configured_datum_wins() {
        let mut f2e = FixToEnu::new(datum_params(), FlakySource::new(0, Vector3::zeros()));
        f2e.handle_orientation(&orientation(0.0));

        let (pose, _) = f2e.proc(&fix_at(45.001, -75.0, 100.0)).unwrap();

        assert_relative_eq!(pose.position_m[1], 111.13, epsilon = 0.05);
        assert_eq!(f2e.datum(), Some(Datum::new(45.0, -75.0, 100.0)));
    }

    #[test]
    fn test_lever_arm_retry() {
        const NUM_FAILURES: u32 = 3;

        let mut f2e = FixToEnu::new(
            datum_params(),
            FlakySource::new(NUM_FAILURES, Vector3::new(1.0, 0.0, 0.0)),
        );
        f2e.handle_orientation(&orientation(0.0));

        let results: Vec<_> = (0..6)
            .map(|_| f2e.proc(&fix_at(45.0, -75.0, 100.0)))
            .collect();

        for r in &results[..NUM_FAILURES as usize] {
            match r {
                Err(FixToEnuError::LeverArmUnresolved(_)) => (),
                r => panic!("Expected the fix to be dropped, got {:?}", r),
            }
        }
        for r in &results[NUM_FAILURES as usize..] {
            assert!(r.is_ok());
        }

        assert_eq!(f2e.frame_source.num_lookups, NUM_FAILURES + 1);
        assert_eq!(f2e.report().num_dropped, NUM_FAILURES as u64);
        assert_eq!(f2e.report().num_poses, 3);
    }

    #[test]
    fn test_datum_announced_when_fix_dropped() {
        let mut f2e = FixToEnu::new(
            EnuExecParams::default(),
            FlakySource::new(10, Vector3::zeros()),
        );

        let first = fix_at(45.0, -75.0, 100.0);
        assert!(f2e.proc(&first).is_err());

        assert_eq!(f2e.take_datum_announcement(), Some(first.position));
    }

    #[test]
    fn test_no_heading_no_pose() {
        let mut f2e = FixToEnu::new(datum_params(), FlakySource::new(0, Vector3::zeros()));

        for _ in 0..5 {
            match f2e.proc(&fix_at(45.0, -75.0, 100.0)) {
                Err(FixToEnuError::Heading(HeadingError::NoHeading)) => (),
                r => panic!("Expected no heading, got {:?}", r),
            }
        }
        assert_eq!(f2e.report().num_poses, 0);

        // A degenerate orientation does not count as a heading
        f2e.handle_orientation(&ImuOrientation {
            timestamp: Utc::now(),
            orientation_q: [0.0; 4],
        });
        assert!(f2e.proc(&fix_at(45.0, -75.0, 100.0)).is_err());
    }

    #[test]
    fn test_stale_heading() {
        let mut params = datum_params();
        params.max_heading_age_s = Some(0.5);
        let mut f2e = FixToEnu::new(params, FlakySource::new(0, Vector3::zeros()));

        let mut old = orientation(0.0);
        old.timestamp = Utc::now() - chrono::Duration::seconds(5);
        f2e.handle_orientation(&old);

        match f2e.proc(&fix_at(45.0, -75.0, 100.0)) {
            Err(FixToEnuError::Heading(HeadingError::Stale { .. })) => (),
            r => panic!("Expected a stale heading, got {:?}", r),
        }

        f2e.handle_orientation(&orientation(0.0));
        assert!(f2e.proc(&fix_at(45.0, -75.0, 100.0)).is_ok());
    }

    #[test]
    fn test_heading_rotates_lever_arm() {
        let mut params = datum_params();
        params.lock_altitude = 5.0;
        let mut table = StaticFrameOffsets::default();
        table.insert("base_link", "gps", Vector3::new(1.0, 0.0, 0.0));
        let mut f2e = FixToEnu::new(params, table);

        f2e.handle_orientation(&orientation(std::f64::consts::FRAC_PI_2));
        let (pose, _) = f2e.proc(&fix_at(45.0, -75.0, 100.0)).unwrap();

        assert_relative_eq!(pose.position_m[0], 0.0, epsilon = 1e-6);
        assert_relative_eq!(pose.position_m[1], 1.0, epsilon = 1e-6);
        assert_eq!(pose.position_m[2], 5.0);
    }
}
