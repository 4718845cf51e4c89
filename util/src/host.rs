//! Host platform utility functions

use std::env;
use std::path::PathBuf;

/// Environment variable pointing at the root of the software checkout.
///
/// Parameter files are read from `$ENU_SW_ROOT/params` and sessions are written beneath it.
pub const SW_ROOT_ENV_VAR: &str = "ENU_SW_ROOT";

/// Get the root directory of the software.
pub fn get_sw_root() -> Result<PathBuf, env::VarError> {
    env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}

/// Get the name of the machine this executable is running on, if it can be determined.
pub fn get_hostname() -> Option<String> {
    env::var("HOSTNAME")
        .ok()
        .or_else(|| std::fs::read_to_string("/etc/hostname").ok())
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
}
