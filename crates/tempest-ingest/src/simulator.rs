//! Simulated station for local runs and demos

use crate::{IngestError, IngestResult, TelemetrySource};
use serde_json::json;
use tokio::time::{sleep, Duration};

/// Fabricates Tempest observation datagrams on a fixed interval
pub struct SimulatorSource {
    interval: u64,
    active: bool,
    base_temperature: f64,
}

impl SimulatorSource {
    /// Create a new simulator with the specified interval (seconds)
    pub fn new(interval: u64) -> Self {
        Self {
            interval,
            active: false,
            base_temperature: 20.0,
        }
    }

    fn generate_datagram(&self) -> Vec<u8> {
        let now = chrono::Utc::now().timestamp();

        // pseudo-random drift from the clock
        let variation = ((now % 100) as f64 / 10.0) - 5.0;
        let temperature = self.base_temperature + variation;

        json!({
            "serial_number": "ST-00000001",
            "type": "obs_st",
            "hub_sn": "HB-00000001",
            "obs": [[
                now,
                (variation.abs() / 4.0 * 100.0).round() / 100.0,
                1.0 + variation.abs() / 2.0,
                2.0 + variation.abs(),
                (now % 360) as f64,
                3,
                1013.25 + variation * 2.0,
                temperature,
                65.0 + variation,
                24000,
                2.5,
                350.0 + variation * 10.0,
                0.0,
                0,
                0,
                0,
                2.61,
                1
            ]],
            "firmware_revision": 129
        })
        .to_string()
        .into_bytes()
    }
}

#[async_trait::async_trait]
impl TelemetrySource for SimulatorSource {
    fn name(&self) -> &str {
        "simulator"
    }

    async fn start(&mut self) -> IngestResult<()> {
        if self.active {
            return Err(IngestError::SourceError("already started".to_string()));
        }
        self.active = true;
        tracing::info!("simulator source started with {}s interval", self.interval);
        Ok(())
    }

    async fn stop(&mut self) -> IngestResult<()> {
        if !self.active {
            return Err(IngestError::SourceError("not started".to_string()));
        }
        self.active = false;
        tracing::info!("simulator source stopped");
        Ok(())
    }

    async fn next_datagram(&mut self) -> IngestResult<Vec<u8>> {
        if !self.active {
            return Err(IngestError::SourceError("not active".to_string()));
        }
        sleep(Duration::from_secs(self.interval)).await;
        Ok(self.generate_datagram())
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simulator_lifecycle() {
        let mut source = SimulatorSource::new(1);

        assert!(!source.is_active());

        source.start().await.unwrap();
        assert!(source.is_active());

        // starting again should fail
        assert!(source.start().await.is_err());

        source.stop().await.unwrap();
        assert!(!source.is_active());
    }

    #[tokio::test]
    async fn test_simulator_datagram_decodes() {
        let mut source = SimulatorSource::new(0);
        source.start().await.unwrap();

        let datagram = source.next_datagram().await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&datagram).unwrap();

        assert_eq!(value["type"], "obs_st");
        assert_eq!(value["obs"][0].as_array().unwrap().len(), 18);
    }
}
