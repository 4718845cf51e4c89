//! # Network Module
//!
//! This module provides networking abstractions over ZMQ, the networking library chosen for the
//! software. All messages are sent as JSON strings.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    thread,
};
use zmq::{Context, Socket, SocketEvent, SocketType};

// Export zmq
pub use zmq;

// ------------------------------------------------------------------------------------------------
// MACROS
// ------------------------------------------------------------------------------------------------

macro_rules! set_sockopts {
    ($socket:expr, $(($opt:ident, $val:expr)),+) => {
        $(
            $socket.$opt($val)
                .map_err(|e| MonitoredSocketError::SocketOptionError(stringify!($opt).into(), e))?;
        )+
    };
}

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Receive timeout on the monitor socket, this bounds how long dropping a socket takes.
const MONITOR_RECV_TIMEOUT_MS: i32 = 100;

// ------------------------------------------------------------------------------------------------
// STATICS
// ------------------------------------------------------------------------------------------------

/// Number of monitors that are registered. Used to provide unique IDs for each mointor endpoint.
static NUM_MONITORS: AtomicUsize = AtomicUsize::new(0);

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Endpoints used by the ENU node and its peers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetParams {
    /// Endpoint the GNSS receiver publishes `GeodeticFix` messages on
    pub fix_endpoint: String,

    /// Endpoint the IMU publishes `ImuOrientation` messages on
    pub imu_endpoint: String,

    /// Endpoint the ENU node publishes `CorrectedPose` messages on
    pub pose_endpoint: String,

    /// Endpoint the ENU node announces its datum on
    pub datum_endpoint: String,

    /// Endpoint of the ENU request-reply service
    pub enu_service_endpoint: String,

    /// Endpoint of the transform server
    pub tf_endpoint: String,
}

/// A zmq socket which is monitored providing additional information.
///
/// A background thread is run in order to monitor activity on the socket and update visible
/// information to the user. Currently this is only whether or not the socket is actually connected.
pub struct MonitoredSocket {
    socket: Socket,

    join_handle: Option<thread::JoinHandle<()>>,

    shutdown: Arc<AtomicBool>,

    connected: Arc<AtomicBool>,
}

/// Represents options which can be set on a monitored socket.
///
/// Most options here correspond to those found in the
/// [`zmq_setsockopt`](http://api.zeromq.org/4-2:zmq-setsockopt) documentation.
#[derive(Debug, Clone)]
pub struct SocketOptions {
    /// Indicates if the socket should bind itself to the endpoint. Servers and publishers should
    /// have this value set as `true`, clients and subscribers should have it set as `false`.
    ///
    /// The default value is `false`.
    pub bind: bool,

    /// If true the `MonitoredSocket::new()` function will block until the socket is connected.
    ///
    /// The default value is `true`.
    pub block_on_first_connect: bool,

    /// Topic filters applied to `SUB` sockets. An empty filter subscribes to everything.
    ///
    /// The default value is a single empty filter.
    pub subscribe: Vec<Vec<u8>>,

    /// `ZMQ_REQ_CORRELATE`: Match replies with requests
    pub req_correlate: bool,

    /// `ZMQ_REQ_RELAXED`: relax strict alternation between request and reply
    pub req_relaxed: bool,

    /// `ZMQ_LINGER`: Set linger period for socket shutdown
    pub linger: i32,

    /// `ZMQ_RECONNECT_IVL`: Set reconnection interval
    pub reconnect_ivl: i32,

    /// `ZMQ_CONNECT_TIMEOUT`: Set `connect()` timeout
    pub connect_timeout: i32,

    /// `ZMQ_RCVTIMEO`: Maximum time before a recv operation returns with `EAGAIN`
    pub recv_timeout: i32,

    /// `ZMQ_SNDTIMEO`: Maximum time before a send operation returns with `EAGAIN`
    pub send_timeout: i32,

    /// `ZMQ_HEARTBEAT_IVL`: Set interval between sending ZMTP heartbeats
    pub heartbeat_ivl: i32,

    /// `ZMQ_HEARTBEAT_TIMEOUT`: Set timeout for ZMTP heartbeats
    pub heartbeat_timeout: i32,

    /// `ZMQ_HEARTBEAT_TTL`: Set the TTL (time to live) value for ZMTP heartbeats
    pub heartbeat_ttl: i32,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum MonitoredSocketError {
    #[error("Error creating the socket: {0}")]
    CreateSocketError(zmq::Error),

    #[error("Error enabling monitoring for the socket: {0}")]
    MonitoringEnableError(zmq::Error),

    #[error("Could not connect the socket: {0:?}")]
    CouldNotConnect(Option<zmq::Error>),

    #[error("Could not read event from monitor socket: {0}")]
    EventReadError(zmq::Error),

    #[error("Could not set the {0} socket option: {1}")]
    SocketOptionError(String, zmq::Error),
}

/// Errors which can occur while exchanging JSON messages over a [`MonitoredSocket`].
#[derive(thiserror::Error, Debug)]
pub enum MessageError {
    #[error("Could not serialize the message: {0}")]
    SerializationError(serde_json::Error),

    #[error("Could not deserialize the message: {0}")]
    DeserializeError(serde_json::Error),

    #[error("Could not send the message: {0}")]
    SendError(zmq::Error),

    #[error("Could not recieve a message: {0}")]
    RecvError(zmq::Error),

    #[error("Recieved a message which was not valid UTF-8")]
    NonUtf8,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MonitoredSocket {
    /// Create a new monitored socket.
    ///
    /// ## Arguments
    /// - `ctx`: the zmq context which will be used to create the socket
    /// - `socket_type`: the type of zmq socket to create
    /// - `socket_options`: a [`SocketOptions`] struct specifying how to configure the socket
    /// - `endpoint`: a zmq endpoint string, such as `"tcp://localhost:4000"`
    pub fn new(
        ctx: &Context,
        socket_type: SocketType,
        socket_options: SocketOptions,
        endpoint: &str,
    ) -> Result<Self, MonitoredSocketError> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let connected = Arc::new(AtomicBool::new(false));

        let socket = ctx
            .socket(socket_type)
            .map_err(MonitoredSocketError::CreateSocketError)?;

        // Each monitor needs its own inproc endpoint
        let monitor_endpoint = format!(
            "inproc://monitor_{}",
            NUM_MONITORS.fetch_add(1, Ordering::Relaxed)
        );

        socket
            .monitor(&monitor_endpoint, SocketEvent::ALL as i32)
            .map_err(MonitoredSocketError::MonitoringEnableError)?;
        let monitor = ctx
            .socket(zmq::PAIR)
            .map_err(MonitoredSocketError::CreateSocketError)?;
        monitor
            .connect(&monitor_endpoint)
            .map_err(|e| MonitoredSocketError::CouldNotConnect(Some(e)))?;
        set_sockopts!(monitor, (set_rcvtimeo, MONITOR_RECV_TIMEOUT_MS));

        socket_options.set(&socket)?;

        match socket_options.bind {
            false => socket.connect(endpoint),
            true => socket.bind(endpoint),
        }
        .map_err(|e| MonitoredSocketError::CouldNotConnect(Some(e)))?;

        if socket_options.block_on_first_connect {
            loop {
                match read_event(&monitor) {
                    Ok(SocketEvent::CONNECTED) => break,
                    Ok(SocketEvent::CONNECT_DELAYED) | Err(zmq::Error::EAGAIN) => continue,
                    Ok(_) => return Err(MonitoredSocketError::CouldNotConnect(None)),
                    Err(e) => return Err(MonitoredSocketError::EventReadError(e)),
                }
            }

            connected.store(true, Ordering::Relaxed);
        }

        let shutdown_clone = shutdown.clone();
        let connected_clone = connected.clone();

        let join_handle = thread::spawn(move || {
            monitor_socket(monitor, monitor_endpoint, shutdown_clone, connected_clone)
        });

        Ok(Self {
            socket,
            join_handle: Some(join_handle),
            shutdown,
            connected,
        })
    }

    /// Return if the socket is connected or not.
    pub fn connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    /// Serialize `message` to JSON and send it.
    pub fn send_json<T: Serialize>(&self, message: &T) -> Result<(), MessageError> {
        let msg_str = serde_json::to_string(message).map_err(MessageError::SerializationError)?;

        self.socket
            .send(&msg_str, 0)
            .map_err(MessageError::SendError)
    }

    /// Recieve a JSON message and deserialize it.
    ///
    /// `Ok(None)` is returned if no message arrived before the socket's recieve timeout (or
    /// immediately if `flags` contains `zmq::DONTWAIT` and nothing is queued).
    pub fn recv_json<T: DeserializeOwned>(&self, flags: i32) -> Result<Option<T>, MessageError> {
        let msg_str = match self.socket.recv_string(flags) {
            Ok(Ok(s)) => s,
            Ok(Err(_)) => return Err(MessageError::NonUtf8),
            Err(zmq::Error::EAGAIN) => return Ok(None),
            Err(e) => return Err(MessageError::RecvError(e)),
        };

        serde_json::from_str(&msg_str)
            .map(Some)
            .map_err(MessageError::DeserializeError)
    }
}

impl Drop for MonitoredSocket {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);

        if let Some(jh) = self.join_handle.take() {
            jh.join().ok();
        }
    }
}

impl std::ops::Deref for MonitoredSocket {
    type Target = Socket;

    fn deref(&self) -> &Self::Target {
        &self.socket
    }
}

impl std::ops::DerefMut for MonitoredSocket {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.socket
    }
}

impl SocketOptions {
    /// Set these options on the given socket.
    pub fn set(&self, socket: &Socket) -> Result<(), MonitoredSocketError> {
        set_sockopts!(
            socket,
            (set_connect_timeout, self.connect_timeout),
            (set_heartbeat_ivl, self.heartbeat_ivl),
            (set_heartbeat_timeout, self.heartbeat_timeout),
            (set_heartbeat_ttl, self.heartbeat_ttl),
            (set_linger, self.linger),
            (set_reconnect_ivl, self.reconnect_ivl),
            (set_rcvtimeo, self.recv_timeout),
            (set_sndtimeo, self.send_timeout)
        );

        match socket.get_socket_type() {
            Ok(SocketType::REQ) => {
                set_sockopts!(
                    socket,
                    (set_req_correlate, self.req_correlate),
                    (set_req_relaxed, self.req_relaxed)
                );
            }
            Ok(SocketType::SUB) => {
                for filter in self.subscribe.iter() {
                    set_sockopts!(socket, (set_subscribe, filter));
                }
            }
            _ => (),
        }

        Ok(())
    }
}

impl Default for SocketOptions {
    fn default() -> Self {
        // Defaults for sockopts taken from http://api.zeromq.org/4-2:zmq-setsockopt
        Self {
            bind: false,
            block_on_first_connect: true,
            subscribe: vec![Vec::new()],
            connect_timeout: 0,
            heartbeat_ivl: 0,
            heartbeat_timeout: 0,
            heartbeat_ttl: 0,
            linger: 30_000,
            reconnect_ivl: 100,
            recv_timeout: -1,
            req_correlate: false,
            req_relaxed: false,
            send_timeout: 0,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Read an event from a monitor socket.
fn read_event(socket: &Socket) -> Result<SocketEvent, zmq::Error> {
    let msg = socket.recv_msg(0)?;

    if msg.len() < 2 {
        return Err(zmq::Error::EPROTO);
    }
    let event = u16::from_ne_bytes([msg[0], msg[1]]);

    // The second frame holds the endpoint address, which is not needed
    if socket.get_rcvmore()? {
        let _ = socket.recv_msg(0)?;
    }

    Ok(SocketEvent::from_raw(event))
}

fn monitor_socket(
    monitor: Socket,
    monitor_endpoint: String,
    shutdown: Arc<AtomicBool>,
    connected: Arc<AtomicBool>,
) {
    while !shutdown.load(Ordering::Relaxed) {
        let event = match read_event(&monitor) {
            Ok(e) => e,
            Err(zmq::Error::EAGAIN) => continue,
            Err(e) => {
                log::warn!("Error reading event from monitor {}: {}", monitor_endpoint, e);
                break;
            }
        };

        match event {
            SocketEvent::CONNECTED => connected.store(true, Ordering::Relaxed),
            SocketEvent::DISCONNECTED => connected.store(false, Ordering::Relaxed),
            _ => (),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
