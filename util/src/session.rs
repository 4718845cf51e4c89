//! Session management
//!
//! A session is one run of an executable. Each session gets its own timestamped directory beneath
//! the software root, holding the log file and any data saved during the run.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use chrono::{DateTime, Utc};
use conquer_once::OnceCell;
use erased_serde::Serialize;
use log::{info, warn};
use std::fs;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::{self, JoinHandle};
use thiserror::Error;

// Internal imports
use crate::time;

// ---------------------------------------------------------------------------
// STATICS
// ---------------------------------------------------------------------------

static SESSION_EPOCH: OnceCell<DateTime<Utc>> = OnceCell::uninit();

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// A chrono format string which diplays a timestamp. See
/// https://docs.rs/chrono/0.4.11/chrono/format/strftime/index.html for more
/// information.
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

type SaveItem = (PathBuf, Box<dyn Serialize + Send>);

/// A struct storing information about the current session
pub struct Session {
    /// The root directory for this session
    pub session_root: PathBuf,

    /// The path to the session's log file
    pub log_file_path: PathBuf,

    save_sender: Sender<SaveItem>,

    save_jh: Option<JoinHandle<()>>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors associated with the session module.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("The software root environment variable (ENU_SW_ROOT) is not set")]
    SwRootNotSet,

    #[error("Cannot create the session directory: {0}")]
    CannotCreateDir(std::io::Error),

    #[error(
        "Cannot initialise the session epoch, have you already initialised the \
         session? (conquer_once error: {0})"
    )]
    CannotInitEpoch(conquer_once::TryInitError),

    #[error("Cannot get the epoch time, did you forget to initialise the session?")]
    CannotGetEpoch,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Session {
    /// Start a new session within the given directory.
    ///
    /// This will create a new session directory named `{exec_name}_{timestamp}` inside
    /// `$ENU_SW_ROOT/{sessions_dir}`.
    pub fn new(exec_name: &str, sessions_dir: &str) -> Result<Self, SessionError> {
        let root = crate::host::get_sw_root().map_err(|_| SessionError::SwRootNotSet)?;

        Self::new_in(exec_name, root.join(sessions_dir))
    }

    /// Start a new session within an explicit directory.
    pub fn new_in<P: AsRef<Path>>(exec_name: &str, sessions_dir: P) -> Result<Self, SessionError> {
        SESSION_EPOCH
            .try_init_once(Utc::now)
            .map_err(SessionError::CannotInitEpoch)?;

        let timestamp = match SESSION_EPOCH.get() {
            Some(e) => e.format(TIMESTAMP_FORMAT),
            None => return Err(SessionError::CannotGetEpoch),
        };

        let path = sessions_dir
            .as_ref()
            .join(format!("{}_{}", exec_name, timestamp));

        fs::create_dir_all(&path).map_err(SessionError::CannotCreateDir)?;

        let log_file_path = path.join(format!("{}.log", exec_name));

        // Saving is done on a background thread so that the caller never blocks on disk IO
        let (tx, rx) = channel();
        let session_root = path.clone();
        let save_jh = thread::spawn(move || save_thread(session_root, rx));

        Ok(Session {
            session_root: path,
            log_file_path,
            save_sender: tx,
            save_jh: Some(save_jh),
        })
    }

    /// Exit the session, waiting for the save thread to finish any pending actions
    pub fn exit(self) {
        let Session {
            save_sender,
            save_jh,
            ..
        } = self;

        info!("Stopping save thread");

        // Dropping the only sender ends the save thread once the queue is empty
        drop(save_sender);
        if let Some(jh) = save_jh {
            jh.join().ok();
        }

        info!("Save thread exited");
    }

    /// Saves the given data to the given session-relative path in a background thread.
    ///
    /// Only `.json` paths are supported.
    pub fn save<P: AsRef<Path>, T: Serialize + Send + 'static>(&self, path: P, data: T) {
        if let Err(e) = self
            .save_sender
            .send((path.as_ref().to_path_buf(), Box::new(data)))
        {
            warn!(
                "Could not send data to be saved to path {:?}: {}",
                path.as_ref(),
                e
            )
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the number of seconds elapsed since the start of the session.
///
/// Returns `NAN` if the session has not been started.
pub fn get_elapsed_seconds() -> f64 {
    match SESSION_EPOCH.get() {
        Some(e) => time::duration_to_seconds(Utc::now() - *e).unwrap_or(std::f64::NAN),
        None => std::f64::NAN,
    }
}

/// Return a reference to the session's epoch.
///
/// # Panics
/// - This function will panic if the session epoch has not been
///   initialised, which is performed on creating a new Session instance.
pub fn get_epoch() -> &'static DateTime<Utc> {
    match SESSION_EPOCH.get() {
        Some(e) => e,
        None => panic!("Cannot get the session epoch!"),
    }
}

// -----------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// -----------------------------------------------------------------------------------------------

fn save_thread(session_root: PathBuf, receiver: Receiver<SaveItem>) {
    // Ends when the session's sender is dropped
    for (path, data) in receiver {
        let full_path = session_root.join(path);

        match full_path.extension().and_then(|s| s.to_str()) {
            Some("json") => {
                if let Some(parent) = full_path.parent() {
                    if let Err(e) = fs::create_dir_all(parent) {
                        warn!("Couldn't create parent directory for {:?}: {}", full_path, e);
                        continue;
                    }
                }

                let file = match OpenOptions::new()
                    .write(true)
                    .truncate(true)
                    .create(true)
                    .open(&full_path)
                {
                    Ok(f) => f,
                    Err(e) => {
                        warn!("Couldn't create file {:?}: {}", full_path, e);
                        continue;
                    }
                };

                if let Err(e) = serde_json::to_writer_pretty(&file, &data) {
                    warn!("Couldn't serialize data for file {:?}: {}", full_path, e);
                }
            }
            ext => warn!(
                "Unrecognised file path extension for {:?} (got {:?})",
                full_path, ext
            ),
        }
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    // The session epoch is process-wide, so all session behaviour is checked in one test.
    #[test]
    fn test_session_save_and_exit() {
        let sessions_dir = std::env::temp_dir().join(format!("enu_session_{}", std::process::id()));

        let session = Session::new_in("test_exec", &sessions_dir).unwrap();
        assert!(session.session_root.starts_with(&sessions_dir));
        assert!(session.session_root.is_dir());
        assert_eq!(
            session.log_file_path.file_name().unwrap(),
            "test_exec.log"
        );
        assert!(get_elapsed_seconds() >= 0.0);

        session.save("data/values.json", vec![1.0, 2.0]);
        let saved_path = session.session_root.join("data/values.json");
        session.exit();

        let saved: Vec<f64> =
            serde_json::from_str(&fs::read_to_string(&saved_path).unwrap()).unwrap();
        assert_eq!(saved, vec![1.0, 2.0]);

        // A second session in the same process is refused
        assert!(Session::new_in("test_exec", &sessions_dir).is_err());

        fs::remove_dir_all(&sessions_dir).ok();
    }
}
