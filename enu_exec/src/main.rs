//! # ENU Executable
//!
//! Converts GNSS fixes into poses of the body frame in a local East-North-Up frame.
//!
//! # Architecture
//!
//! - Initialise the session, logging and parameters
//! - Initialise the frame offset source and the fix to ENU module
//! - Main loop, waiting on network activity:
//!     - Update the heading from all queued orientations
//!     - Process each queued fix, publishing a pose for each one that is not dropped
//!     - Announce the datum once it has been established
//!     - Answer requests on the ENU service

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use comms_if::net::{zmq, NetParams};
use log::{debug, error, info, warn};

// Internal
use enu_lib::{
    enu_server::{self, EnuServer},
    fix_to_enu::{FixToEnu, FixToEnuError},
    lever_arm::{FrameOffsetSource, StaticFrameOffsets},
    params::{EnuExecParams, FrameSource},
    tf_client::TfClient,
};
use util::{
    host,
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<(), Report> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("enu_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("ENU Executable\n");
    info!(
        "Running on: {}",
        host::get_hostname().unwrap_or_else(|| "unknown host".into())
    );
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let net_params: NetParams =
        util::params::load("net.toml").wrap_err("Could not load net params")?;
    let params: EnuExecParams =
        util::params::load("enu_exec.toml").wrap_err("Could not load enu_exec params")?;

    session.save("params.json", params.clone());

    info!("Parameters loaded");

    // ---- INITIALISE NETWORK ----

    let zmq_ctx = zmq::Context::new();

    let frame_source: Box<dyn FrameOffsetSource> = match params.frame_source {
        FrameSource::TfClient => Box::new(
            TfClient::new(&zmq_ctx, &net_params).wrap_err("Failed to initialise the TfClient")?,
        ),
        FrameSource::Static => {
            Box::new(StaticFrameOffsets::from_params(&params.static_frames))
        }
    };
    info!("Lever arm will be read from {:?}", params.frame_source);

    let server = EnuServer::new(&zmq_ctx, &net_params)
        .wrap_err("Failed to initialise the EnuServer")?;
    info!("EnuServer initialised");

    // ---- INITIALISE MODULES ----

    let poll_timeout_ms = params.poll_timeout_ms;
    let mut fix_to_enu = FixToEnu::new(params, frame_source);

    info!("Initialisation complete, entering main loop\n");

    // ---- MAIN LOOP ----

    loop {
        let ready = match server.poll(poll_timeout_ms) {
            Ok(r) => r,
            Err(e) => {
                error!("{}, exiting", e);
                break;
            }
        };

        // Orientations first so fixes use the newest heading
        if ready.imu {
            while let Some(msg) = server.recv_orientation() {
                fix_to_enu.handle_orientation(&msg);
            }
        }

        if ready.fix {
            while let Some(fix) = server.recv_fix() {
                match fix_to_enu.proc(&fix) {
                    Ok((pose, report)) => {
                        debug!("Pose {:?}, status {:?}", pose.position_m, report);
                        if let Err(e) = server.publish_pose(&pose) {
                            warn!("{}", e);
                        }
                    }
                    Err(e @ FixToEnuError::Heading(_)) => warn!("Fix dropped: {}", e),
                    Err(e @ FixToEnuError::LeverArmUnresolved(_)) => {
                        error!("Fix dropped: {}", e)
                    }
                }

                if let Some(datum) = fix_to_enu.take_datum_announcement() {
                    if let Err(e) = server.announce_datum(&datum) {
                        warn!("{}", e);
                    }
                    session.save("datum.json", datum);
                }
            }
        }

        if ready.service {
            match server.recv_request() {
                Ok(Some(cmd)) => {
                    debug!("Request: {:?}", cmd);
                    let rep = enu_server::handle_enu_cmd(&cmd, fix_to_enu.datum());
                    if let Err(e) = server.send_reply(&rep) {
                        warn!("{}", e);
                    }
                }
                Ok(None) => (),
                Err(e) => warn!("{}", e),
            }
        }
    }

    info!("Final status: {:?}", fix_to_enu.report());

    session.exit();

    Ok(())
}
