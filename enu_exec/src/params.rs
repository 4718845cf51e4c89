//! # ENU Executable Parameters
//!
//! Loaded once at startup from `enu_exec.toml`. Every field has a default so an empty file is a
//! valid configuration.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::gnss::Datum;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Value of `lock_altitude` which means the altitude is not locked.
pub const LOCK_ALTITUDE_UNSET: f64 = -1.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnuExecParams {
    // ---- FRAMES ----
    /// Frame the output poses are expressed in
    pub output_frame_id: String,

    /// Body frame of the vehicle, the output poses are the pose of this frame
    pub robot_frame_id: String,

    /// Frame of the GNSS antenna
    pub sensor_frame_id: String,

    // ---- COVARIANCE ----
    /// Covariance written to the orientation axes, which a GNSS fix cannot observe.
    ///
    /// -1 is the usual "do not use" marker, some filters expect a large value such as 1e6
    /// instead.
    pub invalid_covariance_value: f64,

    /// Factor applied to the fix's position variance
    pub scale_covariance: f64,

    // ---- ALTITUDE ----
    /// If not -1 the output altitude is always this value.
    ///
    /// Units: meters
    pub lock_altitude: f64,

    // ---- DATUM ----
    /// Datum latitude. The datum is only taken from parameters if all three datum fields are
    /// given, otherwise the first fix is used.
    ///
    /// Units: degrees
    pub datum_latitude: Option<f64>,

    /// Units: degrees
    pub datum_longitude: Option<f64>,

    /// Units: meters
    pub datum_altitude: Option<f64>,

    // ---- LEVER ARM ----
    /// Where the sensor-to-body offset is read from
    pub frame_source: FrameSource,

    /// Transforms served by `FrameSource::Static`
    pub static_frames: Vec<StaticFrameParams>,

    /// Maximum time a single transform lookup may block for.
    ///
    /// Units: seconds
    pub tf_lookup_timeout_s: f64,

    // ---- HEADING ----
    /// Maximum age of the heading sample relative to the fix. No limit if not given.
    ///
    /// Units: seconds
    pub max_heading_age_s: Option<f64>,

    // ---- EXECUTION ----
    /// Maximum time the main loop waits for network activity.
    ///
    /// Units: milliseconds
    pub poll_timeout_ms: i64,
}

/// A single static transform, the origin of `source_frame` in `target_frame`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StaticFrameParams {
    pub target_frame: String,
    pub source_frame: String,

    /// Units: meters
    pub translation_m: [f64; 3],
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum FrameSource {
    /// Query the transform server
    TfClient,

    /// Use the `static_frames` table
    Static,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for EnuExecParams {
    fn default() -> Self {
        Self {
            output_frame_id: "odom".into(),
            robot_frame_id: "base_link".into(),
            sensor_frame_id: "gps".into(),
            invalid_covariance_value: -1.0,
            scale_covariance: 1.0,
            lock_altitude: LOCK_ALTITUDE_UNSET,
            datum_latitude: None,
            datum_longitude: None,
            datum_altitude: None,
            frame_source: FrameSource::TfClient,
            static_frames: Vec::new(),
            tf_lookup_timeout_s: 1.0,
            max_heading_age_s: None,
            poll_timeout_ms: 100,
        }
    }
}

impl EnuExecParams {
    /// The datum given in the parameters, only if all of latitude, longitude and altitude are set.
    pub fn configured_datum(&self) -> Option<Datum> {
        match (self.datum_latitude, self.datum_longitude, self.datum_altitude) {
            (Some(lat), Some(lon), Some(alt)) => Some(Datum::new(lat, lon, alt)),
            _ => None,
        }
    }

    /// The locked altitude, or `None` if the altitude should follow the fix.
    pub fn altitude_lock(&self) -> Option<f64> {
        if self.lock_altitude == LOCK_ALTITUDE_UNSET {
            None
        } else {
            Some(self.lock_altitude)
        }
    }

    pub fn tf_lookup_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.tf_lookup_timeout_s.max(0.0))
    }

    pub fn max_heading_age(&self) -> Option<chrono::Duration> {
        self.max_heading_age_s
            .map(util::time::seconds_to_duration)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults_from_empty_file() {
        let params: EnuExecParams = util::params::parse("").unwrap();

        assert_eq!(params.output_frame_id, "odom");
        assert_eq!(params.robot_frame_id, "base_link");
        assert_eq!(params.sensor_frame_id, "gps");
        assert_eq!(params.invalid_covariance_value, -1.0);
        assert_eq!(params.scale_covariance, 1.0);
        assert_eq!(params.altitude_lock(), None);
        assert_eq!(params.configured_datum(), None);
        assert_eq!(params.frame_source, FrameSource::TfClient);
        assert_eq!(params.tf_lookup_timeout(), Duration::from_secs(1));
        assert!(params.max_heading_age().is_none());
    }

    #[test]
    fn test_partial_datum_is_ignored() {
        let params: EnuExecParams =
            util::params::parse("datum_latitude = 45.0\ndatum_longitude = -75.0").unwrap();
        assert_eq!(params.configured_datum(), None);

        let params: EnuExecParams = util::params::parse(
            "datum_latitude = 45.0\ndatum_longitude = -75.0\ndatum_altitude = 100.0",
        )
        .unwrap();
        assert_eq!(
            params.configured_datum(),
            Some(Datum::new(45.0, -75.0, 100.0))
        );
    }

    #[test]
    fn test_static_frames_and_lock() {
        let params: EnuExecParams = util::params::parse(
            r#"
            lock_altitude = 5.0
            frame_source = "static"
            max_heading_age_s = 0.5

            [[static_frames]]
            target_frame = "base_link"
            source_frame = "gps"
            translation_m = [2.0, 0.0, 0.3]
            "#,
        )
        .unwrap();

        assert_eq!(params.altitude_lock(), Some(5.0));
        assert_eq!(params.frame_source, FrameSource::Static);
        assert_eq!(
            params.max_heading_age(),
            Some(chrono::Duration::milliseconds(500))
        );
        assert_eq!(
            params.static_frames,
            vec![StaticFrameParams {
                target_frame: "base_link".into(),
                source_frame: "gps".into(),
                translation_m: [2.0, 0.0, 0.3],
            }]
        );
    }
}
