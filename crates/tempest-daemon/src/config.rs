//! Daemon configuration from environment variables

use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Inbound UDP port (default: 50222, the station broadcast port)
    pub udp_port: u16,

    /// Station altitude above sea level in meters, for pressure reduction
    pub station_altitude: f64,

    /// Seconds of silence after which the connection indicator clears
    pub connection_expiry: u64,

    /// Log every raw datagram at debug level
    pub packet_trace: bool,

    /// Telemetry source type ("udp" or "simulator")
    pub source: String,

    /// Packet interval for the simulator source (seconds)
    pub simulator_interval: u64,
}

impl DaemonConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let udp_port = env::var("UDP_PORT")
            .unwrap_or_else(|_| "50222".to_string())
            .parse()
            .context("Invalid UDP_PORT")?;

        let station_altitude = env::var("STATION_ALTITUDE")
            .unwrap_or_else(|_| "0".to_string())
            .parse()
            .context("Invalid STATION_ALTITUDE")?;

        let connection_expiry = env::var("CONNECTION_EXPIRY")
            .unwrap_or_else(|_| "600".to_string())
            .parse()
            .context("Invalid CONNECTION_EXPIRY")?;

        let packet_trace = env::var("PACKET_TRACE")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let source = env::var("SOURCE").unwrap_or_else(|_| "udp".to_string());

        let simulator_interval = env::var("SIMULATOR_INTERVAL")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .context("Invalid SIMULATOR_INTERVAL")?;

        Ok(Self {
            udp_port,
            station_altitude,
            connection_expiry,
            packet_trace,
            source,
            simulator_interval,
        })
    }
}
