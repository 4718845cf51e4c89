//! # Communications interface crate.
//!
//! Provides all common communications interfaces for the ENU software: the messages which flow
//! between the GNSS receiver, the orientation source, the transform server and the ENU node, and
//! the networking layer used to carry them.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Message definitions for equipment (GNSS, IMU) and services (transforms, ENU conversion)
pub mod eqpt;

/// Network module
pub mod net;
