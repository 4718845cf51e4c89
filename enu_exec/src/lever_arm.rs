//! # Lever Arm
//!
//! The GNSS antenna is not mounted at the origin of the body frame. The offset between the two is
//! static, so it is looked up once and cached. Until a lookup succeeds every fix triggers a new
//! attempt, since the source of the offset may start after this executable does.
//!
//! Only the translation of the offset is used.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, info};
use nalgebra::Vector3;
use std::{collections::HashMap, time::Duration};

use crate::{latch::Latch, params::StaticFrameParams, tf_client::TfClientError};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Something which can report the static offset between two named frames.
pub trait FrameOffsetSource {
    /// Get the origin of `source_frame` expressed in `target_frame`.
    ///
    /// Implementations must not block for longer than `timeout`.
    fn lookup(
        &mut self,
        target_frame: &str,
        source_frame: &str,
        timeout: Duration,
    ) -> Result<Vector3<f64>, LookupError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Resolves and caches the offset of the sensor frame in the body frame.
#[derive(Debug)]
pub struct LeverArmResolver {
    body_frame: String,
    sensor_frame: String,
    timeout: Duration,

    /// Sensor origin in the body frame
    ///
    /// Units: meters
    offset_m: Latch<Vector3<f64>>,

    num_failed_attempts: u64,
}

/// A fixed table of frame offsets, usually loaded from parameters.
#[derive(Debug, Default, Clone)]
pub struct StaticFrameOffsets {
    offsets_m: HashMap<(String, String), Vector3<f64>>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error(
        "Timed out after {timeout:?} waiting for the transform from \"{source_frame}\" to \
        \"{target_frame}\""
    )]
    Timeout {
        target_frame: String,
        source_frame: String,
        timeout: Duration,
    },

    #[error("No transform from \"{source_frame}\" to \"{target_frame}\" is available")]
    NotFound {
        target_frame: String,
        source_frame: String,
    },

    #[error("Transform client error: {0}")]
    ClientError(TfClientError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl LeverArmResolver {
    pub fn new(body_frame: &str, sensor_frame: &str, timeout: Duration) -> Self {
        Self {
            body_frame: body_frame.into(),
            sensor_frame: sensor_frame.into(),
            timeout,
            offset_m: Latch::Unset,
            num_failed_attempts: 0,
        }
    }

    /// Get the lever arm, querying `source` if it has not been resolved yet.
    ///
    /// A failure is not cached, the next call queries `source` again.
    pub fn resolve<S>(&mut self, source: &mut S) -> Result<Vector3<f64>, LookupError>
    where
        S: FrameOffsetSource + ?Sized,
    {
        if let Some(offset) = self.offset_m.get().copied() {
            return Ok(offset);
        }

        let (body_frame, sensor_frame, timeout) =
            (&self.body_frame, &self.sensor_frame, self.timeout);

        match self
            .offset_m
            .get_or_try_set_with(|| source.lookup(body_frame, sensor_frame, timeout))
        {
            Ok(offset) => {
                info!(
                    "Lever arm from \"{}\" to \"{}\" resolved after {} failed attempts: \
                    [{:.3}, {:.3}, {:.3}] m",
                    self.sensor_frame,
                    self.body_frame,
                    self.num_failed_attempts,
                    offset.x,
                    offset.y,
                    offset.z
                );
                Ok(offset)
            }
            Err(e) => {
                self.num_failed_attempts += 1;
                debug!("Lever arm lookup attempt {} failed", self.num_failed_attempts);
                Err(e)
            }
        }
    }

    /// The cached lever arm, or `None` if it has not been resolved yet.
    pub fn offset(&self) -> Option<Vector3<f64>> {
        self.offset_m.get().copied()
    }

    pub fn is_resolved(&self) -> bool {
        self.offset_m.is_set()
    }

    pub fn num_failed_attempts(&self) -> u64 {
        self.num_failed_attempts
    }
}

impl StaticFrameOffsets {
    pub fn from_params(frames: &[StaticFrameParams]) -> Self {
        let mut table = Self::default();

        for f in frames {
            table.insert(
                &f.target_frame,
                &f.source_frame,
                Vector3::from(f.translation_m),
            );
        }

        table
    }

    /// Add (or replace) the origin of `source_frame` in `target_frame`.
    pub fn insert(&mut self, target_frame: &str, source_frame: &str, offset_m: Vector3<f64>) {
        self.offsets_m
            .insert((target_frame.into(), source_frame.into()), offset_m);
    }
}

impl FrameOffsetSource for StaticFrameOffsets {
    fn lookup(
        &mut self,
        target_frame: &str,
        source_frame: &str,
        _timeout: Duration,
    ) -> Result<Vector3<f64>, LookupError> {
        self.offsets_m
            .get(&(target_frame.to_string(), source_frame.to_string()))
            .copied()
            .ok_or_else(|| LookupError::NotFound {
                target_frame: target_frame.into(),
                source_frame: source_frame.into(),
            })
    }
}

impl<S: FrameOffsetSource + ?Sized> FrameOffsetSource for Box<S> {
    fn lookup(
        &mut self,
        target_frame: &str,
        source_frame: &str,
        timeout: Duration,
    ) -> Result<Vector3<f64>, LookupError> {
        (**self).lookup(target_frame, source_frame, timeout)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    /// A source which fails a set number of times before returning its offset.
    pub(crate) struct FlakySource {
        pub failures_remaining: u32,
        pub offset_m: Vector3<f64>,
        pub num_lookups: u32,
    }

    impl FlakySource {
        pub fn new(failures: u32, offset_m: Vector3<f64>) -> Self {
            Self {
                failures_remaining: failures,
                offset_m,
                num_lookups: 0,
            }
        }
    }

    impl FrameOffsetSource for FlakySource {
        fn lookup(
            &mut self,
            target_frame: &str,
            source_frame: &str,
            timeout: Duration,
        ) -> Result<Vector3<f64>, LookupError> {
            self.num_lookups += 1;

            if self.failures_remaining > 0 {
                self.failures_remaining -= 1;
                Err(LookupError::Timeout {
                    target_frame: target_frame.into(),
                    source_frame: source_frame.into(),
                    timeout,
                })
            } else {
                Ok(self.offset_m)
            }
        }
    }

    #[test]
    fn test_resolved_once() {
        let mut source = FlakySource::new(0, Vector3::new(2.0, 0.0, 0.3));
        let mut resolver = LeverArmResolver::new("base_link", "gps", Duration::from_secs(1));
        assert!(!resolver.is_resolved());

        for _ in 0..5 {
            assert_eq!(
                resolver.resolve(&mut source).unwrap(),
                Vector3::new(2.0, 0.0, 0.3)
            );
        }

        assert_eq!(source.num_lookups, 1);
        assert_eq!(resolver.offset(), Some(Vector3::new(2.0, 0.0, 0.3)));
    }

    #[test]
    fn test_failures_retried() {
        let mut source = FlakySource::new(3, Vector3::new(1.0, -1.0, 0.0));
        let mut resolver = LeverArmResolver::new("base_link", "gps", Duration::from_millis(10));

        for i in 1..=3 {
            match resolver.resolve(&mut source) {
                Err(LookupError::Timeout { .. }) => (),
                r => panic!("Expected a timeout, got {:?}", r),
            }
            assert!(!resolver.is_resolved());
            assert_eq!(resolver.num_failed_attempts(), i);
        }

        assert!(resolver.resolve(&mut source).is_ok());
        assert!(resolver.resolve(&mut source).is_ok());
        assert_eq!(source.num_lookups, 4);
    }

    #[test]
    fn test_static_offsets() {
        let mut table = StaticFrameOffsets::from_params(&[StaticFrameParams {
            target_frame: "base_link".into(),
            source_frame: "gps".into(),
            translation_m: [0.5, 0.25, 1.0],
        }]);

        assert_eq!(
            table
                .lookup("base_link", "gps", Duration::from_secs(0))
                .unwrap(),
            Vector3::new(0.5, 0.25, 1.0)
        );

        // Direction matters
        match table.lookup("gps", "base_link", Duration::from_secs(0)) {
            Err(LookupError::NotFound {
                target_frame,
                source_frame,
            }) => {
                assert_eq!(target_frame, "gps");
                assert_eq!(source_frame, "base_link");
            }
            r => panic!("Expected not found, got {:?}", r),
        }

        // Through a box, as the executable uses it
        let mut boxed: Box<dyn FrameOffsetSource> = Box::new(table);
        let mut resolver = LeverArmResolver::new("base_link", "gps", Duration::from_secs(0));
        assert_eq!(
            resolver.resolve(&mut boxed).unwrap(),
            Vector3::new(0.5, 0.25, 1.0)
        );
    }
}
