//! UDP source: receives station broadcast datagrams

use crate::{IngestError, IngestResult, TelemetrySource};
use std::net::SocketAddr;
use tokio::{
    net::UdpSocket,
    time::{timeout, Duration},
};

/// Station packets are small JSON objects; 2 KiB covers every known type
const RECV_BUFFER_SIZE: usize = 2048;

pub struct UdpSource {
    bind: SocketAddr,
    socket: Option<UdpSocket>,
    active: bool,
    recv_timeout: Duration,
}

impl UdpSource {
    pub fn new(bind: SocketAddr) -> Self {
        Self {
            bind,
            socket: None,
            active: false,
            recv_timeout: Duration::from_secs(60),
        }
    }

    pub fn with_recv_timeout(mut self, recv_timeout: Duration) -> Self {
        self.recv_timeout = recv_timeout;
        self
    }

    /// Address the socket actually bound to (for ephemeral-port binds)
    pub fn local_addr(&self) -> IngestResult<SocketAddr> {
        self.socket_ref()?
            .local_addr()
            .map_err(|e| IngestError::CommunicationError(e.to_string()))
    }

    fn socket_ref(&self) -> Result<&UdpSocket, IngestError> {
        self.socket
            .as_ref()
            .ok_or_else(|| IngestError::SourceError("socket not active".into()))
    }
}

#[async_trait::async_trait]
impl TelemetrySource for UdpSource {
    fn name(&self) -> &str {
        "udp"
    }

    async fn start(&mut self) -> IngestResult<()> {
        if self.active {
            return Err(IngestError::SourceError("already started".into()));
        }
        let sock = UdpSocket::bind(self.bind)
            .await
            .map_err(|e| IngestError::CommunicationError(e.to_string()))?;
        // stations broadcast to the local subnet
        sock.set_broadcast(true)
            .map_err(|e| IngestError::CommunicationError(e.to_string()))?;
        tracing::info!(addr = %self.bind, "udp source listening");
        self.socket = Some(sock);
        self.active = true;
        Ok(())
    }

    async fn stop(&mut self) -> IngestResult<()> {
        self.active = false;
        self.socket = None;
        Ok(())
    }

    async fn next_datagram(&mut self) -> IngestResult<Vec<u8>> {
        if !self.active {
            return Err(IngestError::SourceError("not active".into()));
        }
        let sock = self.socket_ref()?;
        let mut buf = vec![0u8; RECV_BUFFER_SIZE];
        let (n, _peer) = timeout(self.recv_timeout, sock.recv_from(&mut buf))
            .await
            .map_err(|_| IngestError::Timeout)?
            .map_err(|e| IngestError::CommunicationError(e.to_string()))?;
        buf.truncate(n);
        Ok(buf)
    }

    fn is_active(&self) -> bool {
        self.active
    }
}
