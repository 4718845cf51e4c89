//! # ENU library.
//!
//! Converts GNSS position fixes into body-frame poses in a local East-North-Up frame. The library
//! holds all processing so that it can be exercised without the network, the `enu_exec` binary
//! wires it up to the rest of the system.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Datum manager - establishes the origin of the local frame exactly once
pub mod datum;

/// Network server - subscribes to fixes and orientation, publishes poses and serves requests
pub mod enu_server;

/// The fix-to-pose pipeline, the main cyclic module of the executable
pub mod fix_to_enu;

/// Heading cell - latest yaw from the orientation source
pub mod heading;

/// Single-assignment latch used for the datum and lever arm
pub mod latch;

/// Lever-arm resolver and the frame offset sources it can query
pub mod lever_arm;

/// Parameters for the executable
pub mod params;

/// Pose synthesizer - builds the corrected pose and its covariance
pub mod pose_synth;

/// Geodetic to local tangent plane projection
pub mod projection;

/// Transform client - requests static transforms from the transform server
pub mod tf_client;
