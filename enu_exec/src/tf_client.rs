//! # Transform Client
//!
//! The transform client requests static transforms from the transform server over a
//! request-reply socket. Each lookup blocks for at most the requested timeout.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    eqpt::tf::{TfCmd, TfRep},
    net::{zmq, MessageError, MonitoredSocket, MonitoredSocketError, NetParams, SocketOptions},
};
use log::trace;
use nalgebra::Vector3;
use std::{convert::TryFrom, time::Duration};

use crate::lever_arm::{FrameOffsetSource, LookupError};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The transform client
pub struct TfClient {
    /// Request-response socket for transform lookups
    reqrep: MonitoredSocket,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TfClientError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("The client is not connected to the server")]
    NotConnected,

    #[error("Could not set the recieve timeout: {0}")]
    TimeoutOptionError(zmq::Error),

    #[error("Message error: {0}")]
    MessageError(MessageError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TfClient {
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, TfClientError> {
        // Relaxed and correlated so that a request which timed out does not block the next one,
        // and so a late reply to it is discarded.
        let reqrep_opts = SocketOptions {
            block_on_first_connect: false,
            connect_timeout: 1000,
            heartbeat_ivl: 500,
            heartbeat_ttl: 1000,
            heartbeat_timeout: 1000,
            linger: 1,
            send_timeout: 10,
            req_correlate: true,
            req_relaxed: true,
            ..Default::default()
        };

        let reqrep = MonitoredSocket::new(ctx, zmq::REQ, reqrep_opts, &params.tf_endpoint)
            .map_err(TfClientError::SocketError)?;

        Ok(Self { reqrep })
    }

    /// Send a command to the server and wait up to `timeout` for the reply.
    ///
    /// `Ok(None)` is returned if the timeout elapsed.
    fn request(&mut self, cmd: &TfCmd, timeout: Duration) -> Result<Option<TfRep>, TfClientError> {
        if !self.reqrep.connected() {
            return Err(TfClientError::NotConnected);
        }

        let timeout_ms = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);
        self.reqrep
            .set_rcvtimeo(timeout_ms)
            .map_err(TfClientError::TimeoutOptionError)?;

        self.reqrep
            .send_json(cmd)
            .map_err(TfClientError::MessageError)?;

        self.reqrep
            .recv_json(0)
            .map_err(TfClientError::MessageError)
    }
}

impl FrameOffsetSource for TfClient {
    fn lookup(
        &mut self,
        target_frame: &str,
        source_frame: &str,
        timeout: Duration,
    ) -> Result<Vector3<f64>, LookupError> {
        let cmd = TfCmd::Lookup {
            target_frame: target_frame.into(),
            source_frame: source_frame.into(),
        };

        trace!("Requesting transform {:?}", cmd);

        match self
            .request(&cmd, timeout)
            .map_err(LookupError::ClientError)?
        {
            Some(TfRep::Transform(tf)) => Ok(Vector3::from(tf.translation_m)),
            Some(TfRep::NotFound {
                target_frame,
                source_frame,
            }) => Err(LookupError::NotFound {
                target_frame,
                source_frame,
            }),
            None => Err(LookupError::Timeout {
                target_frame: target_frame.into(),
                source_frame: source_frame.into(),
                timeout,
            }),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
