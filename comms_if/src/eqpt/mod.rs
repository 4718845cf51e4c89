//! # Equipment Interface
//!
//! This module defines the interface structures which will be sent to and from the ENU node.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod enu;
pub mod gnss;
pub mod imu;
pub mod odom;
pub mod tf;
