//! # ENU Service Client
//!
//! Command line client for the ENU service of `enu_exec`. Sends a single request and prints the
//! reply.
//!
//! ```text
//! to_enu to-enu --lat 45.001 --lon -75.0 --alt 100.0 --datum-lat 45.0 --datum-lon -75.0 --datum-alt 100.0
//! to_enu get-datum
//! ```

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use comms_if::{
    eqpt::{
        enu::{EnuCmd, EnuRep},
        gnss::{Datum, GeoPoint},
    },
    net::{zmq, MonitoredSocket, SocketOptions},
};
use structopt::StructOpt;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "to_enu", about = "Query the ENU service of enu_exec")]
struct Opts {
    /// Endpoint of the ENU service
    #[structopt(long, default_value = "tcp://localhost:5104")]
    endpoint: String,

    /// Maximum time to wait for the reply in milliseconds
    #[structopt(long, default_value = "2000")]
    timeout_ms: i32,

    #[structopt(subcommand)]
    cmd: Cmd,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
enum Cmd {
    /// Project a point into the ENU frame of the given datum.
    ToEnu {
        /// Latitude of the point in degrees
        #[structopt(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude of the point in degrees
        #[structopt(long, allow_hyphen_values = true)]
        lon: f64,

        /// Altitude of the point in meters
        #[structopt(long, allow_hyphen_values = true)]
        alt: f64,

        /// Latitude of the datum in degrees
        #[structopt(long, allow_hyphen_values = true)]
        datum_lat: f64,

        /// Longitude of the datum in degrees
        #[structopt(long, allow_hyphen_values = true)]
        datum_lon: f64,

        /// Altitude of the datum in meters
        #[structopt(long, allow_hyphen_values = true)]
        datum_alt: f64,
    },

    /// Get the datum currently used by enu_exec.
    GetDatum,
}

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opts = Opts::from_args();

    let cmd = match opts.cmd {
        Cmd::ToEnu {
            lat,
            lon,
            alt,
            datum_lat,
            datum_lon,
            datum_alt,
        } => EnuCmd::ToEnu {
            point: GeoPoint::new(lat, lon, alt),
            datum: Datum::new(datum_lat, datum_lon, datum_alt),
        },
        Cmd::GetDatum => EnuCmd::GetDatum,
    };

    let ctx = zmq::Context::new();
    let socket = MonitoredSocket::new(
        &ctx,
        zmq::REQ,
        SocketOptions {
            block_on_first_connect: false,
            linger: 0,
            recv_timeout: opts.timeout_ms,
            send_timeout: opts.timeout_ms,
            ..Default::default()
        },
        &opts.endpoint,
    )
    .wrap_err("Could not create the socket")?;

    socket.send_json(&cmd).wrap_err("Could not send the request")?;

    let rep: EnuRep = socket
        .recv_json(0)
        .wrap_err("Could not recieve the reply")?
        .ok_or_else(|| eyre!("No reply from {} after {} ms", opts.endpoint, opts.timeout_ms))?;

    match rep {
        EnuRep::Enu(p) => println!(
            "east: {:.3} m, north: {:.3} m, up: {:.3} m",
            p.east_m, p.north_m, p.up_m
        ),
        EnuRep::Datum(Some(d)) => println!(
            "latitude: {:.8} deg, longitude: {:.8} deg, altitude: {:.3} m",
            d.latitude_deg, d.longitude_deg, d.altitude_m
        ),
        EnuRep::Datum(None) => println!("No datum has been established yet"),
        EnuRep::Error(e) => return Err(eyre!("The service rejected the request: {}", e)),
    }

    Ok(())
}
