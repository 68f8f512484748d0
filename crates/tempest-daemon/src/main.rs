//! Tempest UDP daemon
//!
//! Binds the station broadcast port and feeds every datagram through the
//! decode/derive engine against an in-process state store. Malformed or
//! unknown packets are logged and dropped; only a failed bind is fatal.

mod config;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tempest_engine::{Engine, EngineConfig};
use tempest_ingest::{IngestError, SimulatorSource, TelemetrySource, UdpSource};
use tempest_store::MemoryStore;

use crate::config::DaemonConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tempest UDP daemon");

    let config = DaemonConfig::from_env()?;
    info!("Loaded configuration: {:?}", config);

    let store = Arc::new(MemoryStore::new());
    let engine = Engine::new(
        Arc::clone(&store),
        EngineConfig {
            altitude_m: config.station_altitude,
            connection_expiry: Duration::from_secs(config.connection_expiry),
        },
    );

    let mut source: Box<dyn TelemetrySource> = match config.source.as_str() {
        "simulator" => Box::new(SimulatorSource::new(config.simulator_interval)),
        _ => {
            let bind: SocketAddr = ([0, 0, 0, 0], config.udp_port).into();
            Box::new(UdpSource::new(bind))
        }
    };

    // failure to bind the inbound transport is fatal; the daemon must never
    // run silently with no input
    source
        .start()
        .await
        .context("failed to start telemetry source")?;
    info!("Telemetry source started: {}", source.name());

    let shutdown = setup_shutdown_handler();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
            datagram = source.next_datagram() => match datagram {
                Ok(raw) => {
                    if config.packet_trace {
                        debug!(packet = %String::from_utf8_lossy(&raw), "datagram received");
                    }
                    if let Err(e) = engine.process_datagram(&raw).await {
                        // recoverable: this packet is dropped, the next is not
                        warn!("Failed to process packet: {}", e);
                    }
                }
                Err(IngestError::Timeout) => debug!("no datagram within receive window"),
                Err(e) => warn!("Receive error: {}", e),
            },
        }
    }

    if let Err(e) = source.stop().await {
        warn!("Error stopping source: {}", e);
    }
    info!("Tempest UDP daemon stopped");
    Ok(())
}

/// Setup graceful shutdown handler
async fn setup_shutdown_handler() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to setup signal handler");
}
