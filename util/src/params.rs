//! Generic parameters functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::de::DeserializeOwned;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// An error that occurs during loading of a parameter file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("The software root environment variable (ENU_SW_ROOT) is not set")]
    SwRootNotSet,

    #[error("Cannot load the parmeter file {0:?}: {1}")]
    FileLoadError(PathBuf, std::io::Error),

    #[error("Cannot read the parameter file: {0}")]
    DeserialiseError(toml::de::Error),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Load a parameter file
///
/// The file path is relative to the `$ENU_SW_ROOT/params` directory
pub fn load<P>(param_file_path: &str) -> Result<P, LoadError>
where
    P: DeserializeOwned,
{
    let mut path = crate::host::get_sw_root().map_err(|_| LoadError::SwRootNotSet)?;
    path.push("params");
    path.push(param_file_path);

    load_path(path)
}

/// Load a parameter file from an explicit path.
pub fn load_path<P, F>(path: F) -> Result<P, LoadError>
where
    P: DeserializeOwned,
    F: AsRef<Path>,
{
    let params_str = read_to_string(path.as_ref())
        .map_err(|e| LoadError::FileLoadError(path.as_ref().to_path_buf(), e))?;

    parse(&params_str)
}

/// Parse parameters from a TOML string.
pub fn parse<P>(params_str: &str) -> Result<P, LoadError>
where
    P: DeserializeOwned,
{
    toml::from_str(params_str).map_err(LoadError::DeserialiseError)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct TestParams {
        name: String,
        #[serde(default)]
        scale: Option<f64>,
    }

    #[test]
    fn test_parse() {
        let p: TestParams = parse("name = \"gps\"\nscale = 2.5").unwrap();
        assert_eq!(p.name, "gps");
        assert_eq!(p.scale, Some(2.5));

        let p: TestParams = parse("name = \"gps\"").unwrap();
        assert_eq!(p.scale, None);
    }

    #[test]
    fn test_parse_error() {
        match parse::<TestParams>("scale = 1.0") {
            Err(LoadError::DeserialiseError(_)) => (),
            r => panic!("Expected a deserialise error, got {:?}", r),
        }
    }

    #[test]
    fn test_missing_file() {
        match load_path::<TestParams, _>("/this/path/does/not/exist.toml") {
            Err(LoadError::FileLoadError(p, _)) => {
                assert_eq!(p, PathBuf::from("/this/path/does/not/exist.toml"))
            }
            r => panic!("Expected a file load error, got {:?}", r),
        }
    }
}
