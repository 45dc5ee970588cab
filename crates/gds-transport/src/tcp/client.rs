//! TCP client for the internal transport: connects, registers an incoming
//! tag, and exchanges whole messages with the router. Used both by the
//! ground handler (FSW-side) and, as a library, by any other ground client
//! (GUI, CLI, test harness) that wants to speak the same protocol.

use bytes::Bytes;
use gds_proto::{RoutingTag, envelope};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    sync::mpsc,
    task::JoinHandle,
};
use tracing::warn;

/// Depth of the internal queue buffering messages received from the router
/// before the caller drains them via [`TcpClient::recv_all`].
const INBOUND_QUEUE_DEPTH: usize = 256;

/// A connected, registered client of a [`crate::tcp::TcpRouter`].
pub struct TcpClient {
    write_half: tokio::net::tcp::OwnedWriteHalf,
    inbound_rx: mpsc::Receiver<Bytes>,
    reader: JoinHandle<()>,
}

impl TcpClient {
    /// Connect to `addr`, register `incoming` as this client's tag, and
    /// start a background reader task.
    ///
    /// # Errors
    ///
    /// Propagates the connection I/O error.
    pub async fn connect(addr: &str, incoming: RoutingTag) -> std::io::Result<Self> {
        let mut stream = TcpStream::connect(addr).await?;
        stream.write_all(format!("Register {incoming}\n").as_bytes()).await?;

        let (read_half, write_half) = stream.into_split();
        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_QUEUE_DEPTH);
        let reader = tokio::spawn(run_reader(read_half, inbound_tx));

        Ok(Self { write_half, inbound_rx, reader })
    }

    /// Send `body` addressed to `dest`.
    ///
    /// Returns `true` iff the write succeeded; never panics on link
    /// failure.
    pub async fn send(&mut self, dest: RoutingTag, body: &[u8]) -> bool {
        let envelope = envelope::encode(dest, body);
        match self.write_half.write_all(&envelope).await {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "tcp client send failed");
                false
            },
        }
    }

    /// Drain every message currently queued from the router, waiting up to
    /// `poll_timeout` for at least one if none are queued yet.
    pub async fn recv_all(&mut self, poll_timeout: std::time::Duration) -> Vec<Bytes> {
        let first = match tokio::time::timeout(poll_timeout, self.inbound_rx.recv()).await {
            Ok(Some(msg)) => msg,
            Ok(None) | Err(_elapsed) => return Vec::new(),
        };

        let mut batch = vec![first];
        while let Ok(msg) = self.inbound_rx.try_recv() {
            batch.push(msg);
        }
        batch
    }
}

impl Drop for TcpClient {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

async fn run_reader(mut read_half: tokio::net::tcp::OwnedReadHalf, inbound_tx: mpsc::Sender<Bytes>) {
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = match read_half.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        // The router forwards bare bodies (envelope already stripped), so
        // each read is delivered to the caller as-is.
        if inbound_tx.send(Bytes::copy_from_slice(&buf[..n])).await.is_err() {
            break;
        }
    }
}
