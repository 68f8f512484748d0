//! Telemetry sources
//!
//! Sources deliver raw datagrams; decoding belongs to the core. The UDP
//! source listens for real station broadcasts, the simulator fabricates
//! them for local runs without hardware.

pub mod simulator;
pub mod udp;

pub use simulator::SimulatorSource;
pub use udp::UdpSource;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("source error: {0}")]
    SourceError(String),

    #[error("communication error: {0}")]
    CommunicationError(String),

    #[error("timeout waiting for data")]
    Timeout,
}

pub type IngestResult<T> = Result<T, IngestError>;

/// Trait for all raw telemetry sources
#[async_trait::async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Source name/identifier
    fn name(&self) -> &str;

    /// Bind/initialize the source and start listening
    async fn start(&mut self) -> IngestResult<()>;

    /// Stop the source and release resources
    async fn stop(&mut self) -> IngestResult<()>;

    /// Get the next raw datagram (blocking)
    async fn next_datagram(&mut self) -> IngestResult<Vec<u8>>;

    /// Check if the source is currently active
    fn is_active(&self) -> bool;
}
