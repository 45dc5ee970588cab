//! Routed TCP pub/sub server.
//!
//! One listener socket. On accept, a peer must send `Register <TAG>\n`
//! before anything else; thereafter every envelope it sends is forwarded
//! (body only, envelope stripped) to every peer registered under the
//! envelope's destination tag. A slow peer is dropped rather than allowed
//! to stall delivery to others: each peer has its own bounded outbound
//! queue and its own writer task.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use bytes::Bytes;
use gds_proto::{
    RoutingTag,
    envelope::{self, EnvelopeOutcome},
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    sync::{Mutex, mpsc},
};
use tracing::{debug, warn};

use crate::{
    error::TransportError,
    tcp::registry::{PeerId, Registry},
};

/// How many outbound messages a single peer may have queued before it is
/// considered unresponsive and dropped.
const PEER_QUEUE_DEPTH: usize = 256;

/// Routed TCP pub/sub server.
pub struct TcpRouter {
    listener: TcpListener,
    registry: Arc<Mutex<Registry>>,
    next_peer_id: AtomicU64,
}

impl TcpRouter {
    /// Bind a router to `addr` (`host:port`).
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Bind`] if the address cannot be bound;
    /// this is the one fatal error in the transport layer.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| TransportError::Bind { addr: addr.to_string(), source })?;
        Ok(Self { listener, registry: Arc::new(Mutex::new(Registry::new())), next_peer_id: AtomicU64::new(0) })
    }

    /// Local address the router is bound to.
    ///
    /// # Errors
    ///
    /// Propagates any I/O error from querying the listener's local address.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections forever, spawning one reader/writer task pair per
    /// peer. Returns only if `accept` itself fails (listener torn down).
    pub async fn run(&self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    debug!(%addr, "accepted connection");
                    let peer_id = PeerId(self.next_peer_id.fetch_add(1, Ordering::SeqCst));
                    let registry = Arc::clone(&self.registry);
                    tokio::spawn(async move {
                        handle_connection(stream, peer_id, registry).await;
                    });
                },
                Err(err) => {
                    warn!(error = %err, "accept failed");
                },
            }
        }
    }
}

async fn handle_connection(stream: TcpStream, peer_id: PeerId, registry: Arc<Mutex<Registry>>) {
    let Ok(tag) = read_registration(&stream).await else {
        debug!(peer = peer_id.0, "connection closed before registration");
        return;
    };

    let (outbound_tx, outbound_rx) = mpsc::channel(PEER_QUEUE_DEPTH);
    registry.lock().await.register(peer_id, tag, outbound_tx);
    debug!(peer = peer_id.0, tag = %tag, "peer registered");

    let (read_half, write_half) = stream.into_split();
    let writer = tokio::spawn(run_writer(write_half, outbound_rx));

    run_reader(read_half, peer_id, Arc::clone(&registry)).await;

    registry.lock().await.unregister(peer_id);
    writer.abort();
    debug!(peer = peer_id.0, "peer disconnected");
}

/// Read lines until a complete `Register <TAG>\n` is seen. Returns an error
/// on EOF, malformed line, or invalid tag, all of which close the
/// connection without registering it.
async fn read_registration(stream: &TcpStream) -> Result<RoutingTag, ()> {
    let mut buf = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        match stream.try_read(&mut byte) {
            Ok(0) => return Err(()),
            Ok(_) => {
                if byte[0] == b'\n' {
                    break;
                }
                buf.push(byte[0]);
                if buf.len() > 64 {
                    return Err(());
                }
            },
            Err(ref err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                stream.readable().await.map_err(|_| ())?;
            },
            Err(_) => return Err(()),
        }
    }

    let line = String::from_utf8(buf).map_err(|_| ())?;
    let tag_str = line.strip_prefix("Register ").ok_or(())?;
    RoutingTag::from_slice(tag_str.as_bytes()).map_err(|_| ())
}

async fn run_writer(
    mut write_half: tokio::net::tcp::OwnedWriteHalf,
    mut outbound_rx: mpsc::Receiver<Bytes>,
) {
    while let Some(body) = outbound_rx.recv().await {
        if write_half.write_all(&body).await.is_err() {
            break;
        }
    }
}

async fn run_reader(
    mut read_half: tokio::net::tcp::OwnedReadHalf,
    peer_id: PeerId,
    registry: Arc<Mutex<Registry>>,
) {
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = match read_half.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };

        match envelope::decode(&buf[..n]) {
            EnvelopeOutcome::Envelope { tag, body } => {
                let unresponsive = registry.lock().await.route(tag, &body);
                if !unresponsive.is_empty() {
                    let mut guard = registry.lock().await;
                    for dropped in unresponsive {
                        warn!(peer = dropped.0, "peer unresponsive, dropping");
                        guard.unregister(dropped);
                    }
                }
            },
            EnvelopeOutcome::Incomplete | EnvelopeOutcome::BadMarker => {
                warn!(peer = peer_id.0, "malformed envelope, ignoring chunk");
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;

    async fn connect_and_register(addr: std::net::SocketAddr, tag: &str) -> TcpStream {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(format!("Register {tag}\n").as_bytes()).await.unwrap();
        stream
    }

    #[tokio::test]
    async fn scenario_six_end_to_end_over_real_sockets() {
        let router = TcpRouter::bind("127.0.0.1:0").await.unwrap();
        let addr = router.local_addr().unwrap();
        tokio::spawn(async move { router.run().await });

        let mut gui = connect_and_register(addr, "GUI").await;
        let mut fsw = connect_and_register(addr, "FSW").await;

        // Give the router a moment to process both registrations.
        tokio::time::sleep(Duration::from_millis(30)).await;

        let message = envelope::encode(RoutingTag::GUI, b"hello gui");
        fsw.write_all(&message).await.unwrap();

        let mut buf = [0u8; 64];
        let n = tokio::time::timeout(Duration::from_millis(200), gui.read(&mut buf)).await.unwrap().unwrap();
        assert_eq!(&buf[..n], b"hello gui");

        // FSW never registered for GUI-tagged traffic, so it gets nothing.
        let mut fsw_buf = [0u8; 64];
        let timed_out =
            tokio::time::timeout(Duration::from_millis(50), fsw.read(&mut fsw_buf)).await.is_err();
        assert!(timed_out);
    }
}
