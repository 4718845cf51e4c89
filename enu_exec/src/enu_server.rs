//! # ENU Server
//!
//! Abstracts over the networking side of the ENU executable:
//! - fixes and orientations are recieved on two SUB sockets
//! - corrected poses are sent out on a PUB socket
//! - the datum is announced once on its own PUB socket
//! - requests from other executables are answered on a REP socket

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    eqpt::{
        enu::{EnuCmd, EnuRep},
        gnss::{Datum, GeodeticFix},
        imu::ImuOrientation,
        odom::CorrectedPose,
    },
    net::{zmq, MessageError, MonitoredSocket, MonitoredSocketError, NetParams, SocketOptions},
};
use log::warn;
use serde::de::DeserializeOwned;

use crate::projection;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Networking for the ENU executable
pub struct EnuServer {
    fix_sub: MonitoredSocket,
    imu_sub: MonitoredSocket,

    pose_pub: MonitoredSocket,
    datum_pub: MonitoredSocket,

    /// REP socket for [`EnuCmd`]s
    service: MonitoredSocket,
}

/// Which sockets have messages waiting after a call to [`EnuServer::poll`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Ready {
    pub fix: bool,
    pub imu: bool,
    pub service: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum EnuServerError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not poll the sockets: {0}")]
    PollError(zmq::Error),

    #[error("Could not send the pose: {0}")]
    PoseSendError(MessageError),

    #[error("Could not send the datum: {0}")]
    DatumSendError(MessageError),

    #[error("Could not send the reply: {0}")]
    ReplySendError(MessageError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl EnuServer {
    /// Create a new instance of the ENU server.
    ///
    /// This function does not wait for any peers to connect.
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, EnuServerError> {
        let sub_opts = SocketOptions {
            block_on_first_connect: false,
            connect_timeout: 1000,
            heartbeat_ivl: 500,
            heartbeat_ttl: 1000,
            heartbeat_timeout: 1000,
            linger: 1,
            ..Default::default()
        };
        let pub_opts = SocketOptions {
            bind: true,
            block_on_first_connect: false,
            linger: 1,
            send_timeout: 10,
            ..Default::default()
        };
        let rep_opts = SocketOptions {
            bind: true,
            block_on_first_connect: false,
            linger: 1,
            send_timeout: 10,
            ..Default::default()
        };

        let socket = |socket_type: zmq::SocketType, opts: &SocketOptions, endpoint: &str| {
            MonitoredSocket::new(ctx, socket_type, opts.clone(), endpoint)
                .map_err(EnuServerError::SocketError)
        };

        Ok(Self {
            fix_sub: socket(zmq::SUB, &sub_opts, &params.fix_endpoint)?,
            imu_sub: socket(zmq::SUB, &sub_opts, &params.imu_endpoint)?,
            pose_pub: socket(zmq::PUB, &pub_opts, &params.pose_endpoint)?,
            datum_pub: socket(zmq::PUB, &pub_opts, &params.datum_endpoint)?,
            service: socket(zmq::REP, &rep_opts, &params.enu_service_endpoint)?,
        })
    }

    /// Wait up to `timeout_ms` for a message on any input socket.
    pub fn poll(&self, timeout_ms: i64) -> Result<Ready, EnuServerError> {
        let mut items = [
            self.fix_sub.as_poll_item(zmq::POLLIN),
            self.imu_sub.as_poll_item(zmq::POLLIN),
            self.service.as_poll_item(zmq::POLLIN),
        ];

        zmq::poll(&mut items, timeout_ms).map_err(EnuServerError::PollError)?;

        Ok(Ready {
            fix: items[0].is_readable(),
            imu: items[1].is_readable(),
            service: items[2].is_readable(),
        })
    }

    /// Get the next queued fix, if any.
    pub fn recv_fix(&self) -> Option<GeodeticFix> {
        recv_or_warn(&self.fix_sub, "fix")
    }

    /// Get the next queued orientation, if any.
    pub fn recv_orientation(&self) -> Option<ImuOrientation> {
        recv_or_warn(&self.imu_sub, "orientation")
    }

    /// Get the next request from a client, if any.
    ///
    /// If this returns `Ok(Some(_))` the caller must respond with [`EnuServer::send_reply`]. A
    /// request which cannot be parsed is answered with [`EnuRep::Error`] here.
    pub fn recv_request(&self) -> Result<Option<EnuCmd>, EnuServerError> {
        match self.service.recv_json(zmq::DONTWAIT) {
            Ok(cmd) => Ok(cmd),
            Err(e @ MessageError::RecvError(_)) => {
                warn!("Could not read from the service socket: {}", e);
                Ok(None)
            }
            Err(e) => {
                warn!("Invalid request recieved: {}", e);
                self.send_reply(&EnuRep::Error(e.to_string()))?;
                Ok(None)
            }
        }
    }

    pub fn send_reply(&self, rep: &EnuRep) -> Result<(), EnuServerError> {
        self.service
            .send_json(rep)
            .map_err(EnuServerError::ReplySendError)
    }

    pub fn publish_pose(&self, pose: &CorrectedPose) -> Result<(), EnuServerError> {
        self.pose_pub
            .send_json(pose)
            .map_err(EnuServerError::PoseSendError)
    }

    pub fn announce_datum(&self, datum: &Datum) -> Result<(), EnuServerError> {
        self.datum_pub
            .send_json(datum)
            .map_err(EnuServerError::DatumSendError)
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Build the reply to a service request.
///
/// `datum` is the executable's current datum.
pub fn handle_enu_cmd(cmd: &EnuCmd, datum: Option<Datum>) -> EnuRep {
    match cmd {
        EnuCmd::ToEnu {
            point,
            datum: request_datum,
        } => EnuRep::Enu(projection::project(point, request_datum)),
        EnuCmd::GetDatum => EnuRep::Datum(datum),
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Recieve without blocking, malformed messages are logged and skipped.
fn recv_or_warn<T: DeserializeOwned>(socket: &MonitoredSocket, what: &str) -> Option<T> {
    loop {
        match socket.recv_json(zmq::DONTWAIT) {
            Ok(msg) => return msg,
            Err(e @ MessageError::RecvError(_)) => {
                warn!("Could not read {} message: {}", what, e);
                return None;
            }
            Err(e) => warn!("Skipping malformed {} message: {}", what, e),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::eqpt::gnss::GeoPoint;

    #[test]
    fn test_to_enu_is_stateless() {
        let point = GeoPoint::new(45.001, -75.0, 100.0);
        let cmd = EnuCmd::ToEnu {
            point,
            datum: Datum::new(45.0, -75.0, 100.0),
        };

        // The node's own datum plays no part
        let a = handle_enu_cmd(&cmd, None);
        let b = handle_enu_cmd(&cmd, Some(Datum::new(10.0, 10.0, 0.0)));
        assert_eq!(a, b);

        match a {
            EnuRep::Enu(p) => assert!((p.north_m - 111.13).abs() < 0.05),
            r => panic!("Expected a point, got {:?}", r),
        }
    }

    #[test]
    fn test_get_datum() {
        assert_eq!(handle_enu_cmd(&EnuCmd::GetDatum, None), EnuRep::Datum(None));

        let d = Datum::new(45.0, -75.0, 100.0);
        assert_eq!(
            handle_enu_cmd(&EnuCmd::GetDatum, Some(d)),
            EnuRep::Datum(Some(d))
        );
    }

    #[test]
    fn test_service_roundtrip() {
        let ctx = zmq::Context::new();
        let params = NetParams {
            fix_endpoint: "inproc://test_fix".into(),
            imu_endpoint: "inproc://test_imu".into(),
            pose_endpoint: "inproc://test_pose".into(),
            datum_endpoint: "inproc://test_datum".into(),
            enu_service_endpoint: "inproc://test_enu_service".into(),
            tf_endpoint: "inproc://test_tf".into(),
        };
        let server = EnuServer::new(&ctx, &params).unwrap();

        let client = ctx.socket(zmq::REQ).unwrap();
        client.set_rcvtimeo(2000).unwrap();
        client.connect(&params.enu_service_endpoint).unwrap();

        client.send("not json", 0).unwrap();
        assert!(server.poll(2000).unwrap().service);
        assert!(server.recv_request().unwrap().is_none());
        let rep: EnuRep = serde_json::from_str(&client.recv_string(0).unwrap().unwrap()).unwrap();
        assert!(matches!(rep, EnuRep::Error(_)));

        client
            .send(&serde_json::to_string(&EnuCmd::GetDatum).unwrap(), 0)
            .unwrap();
        assert!(server.poll(2000).unwrap().service);
        let cmd = server.recv_request().unwrap().unwrap();
        server.send_reply(&handle_enu_cmd(&cmd, None)).unwrap();
        let rep: EnuRep = serde_json::from_str(&client.recv_string(0).unwrap().unwrap()).unwrap();
        assert_eq!(rep, EnuRep::Datum(None));
    }
}
