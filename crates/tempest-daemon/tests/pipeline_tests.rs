//! End-to-end pipeline test: UDP datagram in, derived state out

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;

use tempest_engine::{Engine, EngineConfig};
use tempest_ingest::{TelemetrySource, UdpSource};
use tempest_store::{MemoryStore, StateStore, StoredValue};

const BASE: &str = "HB-00054321.ST-00012345.obs_st";

async fn poll_value(store: &MemoryStore, path: &str) -> Option<StoredValue> {
    // small retry loop in case of scheduling delay
    for _ in 0..40 {
        if let Some(stored) = store.get_current_value(path).await.unwrap() {
            return Some(stored);
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    None
}

#[tokio::test]
async fn udp_packet_populates_store() {
    let store = Arc::new(MemoryStore::new());
    let engine = Engine::new(
        Arc::clone(&store),
        EngineConfig {
            altitude_m: 100.0,
            ..EngineConfig::default()
        },
    );

    let bind: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let mut source = UdpSource::new(bind).with_recv_timeout(Duration::from_secs(2));
    source.start().await.unwrap();
    let local = source.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match source.next_datagram().await {
                Ok(raw) => {
                    if let Err(e) = engine.process_datagram(&raw).await {
                        eprintln!("process error: {e}");
                    }
                }
                Err(_) => break,
            }
        }
    });

    // Tempest observation: 1013 hPa, 20 °C, 60 % RH
    let sock = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let packet = r#"{"serial_number":"ST-00012345","type":"obs_st","hub_sn":"HB-00054321","obs":[[1700000000,0.2,1.3,2.7,187,3,1013.0,20.0,60.0,24000,2.5,540.0,0.0,0,0,0,2.61,1]],"firmware_revision":129}"#;
    sock.send_to(packet.as_bytes(), local).await.unwrap();

    let temperature = poll_value(&store, &format!("{BASE}.airTemperature"))
        .await
        .expect("air temperature never appeared");
    assert_eq!(temperature.value.as_f64(), Some(20.0));

    let connection = poll_value(&store, "info.connection").await.unwrap();
    assert_eq!(connection.value.as_bool(), Some(true));

    assert!(poll_value(&store, &format!("{BASE}.lastMessage")).await.is_some());

    // a second packet reduces pressure with the first packet's readings
    let packet = r#"{"serial_number":"ST-00012345","type":"obs_st","hub_sn":"HB-00054321","obs":[[1700000060,0.2,1.3,2.7,187,3,1013.0,20.0,60.0,24000,2.5,540.0,0.0,0,0,0,2.61,1]],"firmware_revision":129}"#;
    sock.send_to(packet.as_bytes(), local).await.unwrap();

    let mut reduced = None;
    for _ in 0..40 {
        if let Some(stored) = store
            .get_current_value(&format!("{BASE}.reducedPressure"))
            .await
            .unwrap()
        {
            let value = stored.value.as_f64().unwrap();
            if (value - 1024.8).abs() < 0.05 {
                reduced = Some(value);
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    assert!(reduced.is_some(), "reduced pressure never converged");
}

#[tokio::test]
async fn malformed_datagrams_do_not_stop_ingestion() {
    let store = Arc::new(MemoryStore::new());
    let engine = Engine::new(Arc::clone(&store), EngineConfig::default());

    let bind: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let mut source = UdpSource::new(bind).with_recv_timeout(Duration::from_secs(2));
    source.start().await.unwrap();
    let local = source.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match source.next_datagram().await {
                Ok(raw) => {
                    // log-and-continue, exactly as the daemon loop does
                    let _ = engine.process_datagram(&raw).await;
                }
                Err(_) => break,
            }
        }
    });

    let sock = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    sock.send_to(b"garbage, not json", local).await.unwrap();
    sock.send_to(br#"{"no_type_here":1}"#, local).await.unwrap();
    sock.send_to(
        br#"{"serial_number":"HB-00000001","type":"hub_status","uptime":86400,"rssi":-62}"#,
        local,
    )
    .await
    .unwrap();

    let uptime = poll_value(&store, "HB-00000001.hub_status.uptime")
        .await
        .expect("valid packet after garbage never processed");
    assert_eq!(uptime.value.as_f64(), Some(86400.0));
}
