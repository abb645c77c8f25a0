//! UDP datagram ingest worker.
//!
//! Each datagram is one UTF-8 JSON object describing a single record.
//! Malformed payloads are diagnosed and dropped; the worker itself never
//! terminates on input or socket errors, only on shutdown.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::UdpSocket;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use loghive_core::{diag, now_secs, LogRecord};
use loghive_store::LogStore;

/// Maximum accepted datagram payload.
const MAX_DATAGRAM: usize = 65536;

pub struct UdpReceiver {
    local_addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl UdpReceiver {
    /// Bind the receive socket and spawn the receive loop. Pass port 0 to
    /// let the OS pick (useful in tests); see [`UdpReceiver::local_addr`].
    pub async fn bind(store: Arc<LogStore>, port: u16) -> io::Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", port)).await?;
        let local_addr = socket.local_addr()?;
        diag::log("UDP", &format!("listening on port {}", local_addr.port()));

        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(receive_loop(socket, store, shutdown_rx));

        Ok(Self {
            local_addr,
            shutdown,
            handle,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Signal the worker and wait for it to drain its current datagram.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.handle.await;
        diag::log("UDP", "receiver stopped");
    }
}

async fn receive_loop(
    socket: UdpSocket,
    store: Arc<LogStore>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut buf = vec![0u8; MAX_DATAGRAM];
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            received = socket.recv_from(&mut buf) => match received {
                Ok((len, _)) => ingest_datagram(&store, &buf[..len]),
                Err(e) => diag::error("UDP", &format!("receive error: {e}")),
            },
        }
    }
}

fn ingest_datagram(store: &LogStore, payload: &[u8]) {
    if payload.is_empty() {
        diag::error("UDP", "dropped empty datagram");
        return;
    }

    let mut record: LogRecord = match serde_json::from_slice(payload) {
        Ok(record) => record,
        Err(e) => {
            diag::error("UDP", &format!("failed to parse log: {e}"));
            return;
        }
    };

    // Emitter-written id/receive time are not trusted.
    record.id = 0;
    record.received_at = now_secs();

    if let Err(e) = store.insert(&record) {
        diag::error("UDP", &format!("failed to store log: {e}"));
    }
}
