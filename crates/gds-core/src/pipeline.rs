//! Uplink and downlink pipelines.
//!
//! Grounded in the two-thread `Downlinker`/`Uplinker` design of the original
//! `updown.py`: a deframing worker and a sending worker cooperate over a
//! bounded queue for downlink, and a single worker drains, frames, writes,
//! and retries for uplink. The uplinker holds only an injected enqueue
//! capability onto the downlinker's queue (see `DownlinkHandle`), never a
//! back-reference to the downlinker itself, so the dependency is one-way at
//! the type level even though the data flow loops back.

use std::{sync::Arc, time::Duration};

use bytes::Bytes;
use gds_proto::descriptor;
use tokio::{
    io::AsyncWriteExt,
    sync::{
        Mutex,
        mpsc::{self, error::TrySendError},
    },
    task::JoinHandle,
};
use tracing::warn;

use crate::{adapter::ByteAdapter, framer::FramerDeframer, ground::GroundHandler};

/// Number of attempts the uplinker makes to write a framed packet before
/// giving up and dropping it.
pub const RETRY_COUNT: u32 = 3;

/// How long the downlink sending worker waits for the first frame before
/// draining non-blocking and calling `send_all` regardless.
pub const SEND_BATCH_WINDOW: Duration = Duration::from_millis(500);

/// Non-blocking enqueue capability onto a downlinker's outgoing queue.
///
/// This is the collaborator an uplinker is constructed with, rather than a
/// reference to the downlinker itself: it can enqueue loopback handshakes
/// but cannot start, stop, or otherwise control the downlinker.
#[derive(Clone)]
pub struct DownlinkHandle {
    outgoing: mpsc::Sender<Bytes>,
}

impl DownlinkHandle {
    /// Attempt to enqueue `frame` without blocking. Returns `false` (and
    /// logs a warning) if the queue is full; the frame is dropped, not
    /// retried.
    pub fn try_enqueue(&self, frame: Bytes) -> bool {
        match self.outgoing.try_send(frame) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(queue = "outgoing", "downlink queue full, dropping frame");
                false
            },
            Err(TrySendError::Closed(_)) => {
                warn!(queue = "outgoing", "downlink queue closed, dropping frame");
                false
            },
        }
    }
}

/// Sink for bytes discarded while resyncing the deframer. A write failure
/// permanently disables the sink (it is never retried) but never stops the
/// deframing worker.
pub struct DiscardSink {
    file: Option<tokio::fs::File>,
}

impl DiscardSink {
    /// Open `path` for appending discarded bytes. If the open fails the
    /// sink starts disabled: `write` becomes a silent no-op.
    pub async fn open(path: &std::path::Path) -> Self {
        match tokio::fs::OpenOptions::new().create(true).append(true).open(path).await {
            Ok(file) => Self { file: Some(file) },
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to open discard sink");
                Self { file: None }
            },
        }
    }

    /// A sink that discards everything written to it.
    #[must_use]
    pub fn disabled() -> Self {
        Self { file: None }
    }

    async fn write(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        if let Some(file) = self.file.as_mut()
            && let Err(err) = file.write_all(bytes).await
        {
            warn!(error = %err, "discard sink write failed, disabling sink");
            self.file = None;
        }
    }
}

/// Runtime configuration for a [`Downlinker`].
pub struct DownlinkConfig {
    /// Capacity of the bounded `outgoing` queue shared by both workers.
    pub queue_depth: usize,
    /// How long the deframing worker blocks on `adapter.read()` per
    /// iteration.
    pub read_timeout: Duration,
}

impl Default for DownlinkConfig {
    fn default() -> Self {
        Self { queue_depth: 256, read_timeout: Duration::from_millis(100) }
    }
}

/// Downlink pipeline: read → pool → deframe → enqueue → broadcast.
///
/// Owns two cooperating workers, started together and stopped together: a
/// deframing worker (adapter → framer → `outgoing`) and a sending worker
/// (`outgoing` → ground handler). Neither worker exits on a single I/O
/// failure; only clearing the run flag via [`Downlinker::stop`] does.
pub struct Downlinker<A, F, G> {
    adapter: Arc<Mutex<A>>,
    framer: Arc<Mutex<F>>,
    ground: Arc<Mutex<G>>,
    discard_sink: Arc<Mutex<DiscardSink>>,
    config: DownlinkConfig,
    outgoing_tx: mpsc::Sender<Bytes>,
    outgoing_rx: Option<mpsc::Receiver<Bytes>>,
    running: Arc<std::sync::atomic::AtomicBool>,
    handles: Vec<JoinHandle<()>>,
}

impl<A, F, G> Downlinker<A, F, G>
where
    A: ByteAdapter + 'static,
    F: FramerDeframer + 'static,
    G: GroundHandler + 'static,
{
    /// Build a downlinker around the given adapter, framer, and ground
    /// handler. Workers are not started until [`Downlinker::start`].
    #[must_use]
    pub fn new(adapter: A, framer: F, ground: G, config: DownlinkConfig) -> Self {
        let (outgoing_tx, outgoing_rx) = mpsc::channel(config.queue_depth);
        Self {
            adapter: Arc::new(Mutex::new(adapter)),
            framer: Arc::new(Mutex::new(framer)),
            ground: Arc::new(Mutex::new(ground)),
            discard_sink: Arc::new(Mutex::new(DiscardSink::disabled())),
            config,
            outgoing_tx,
            outgoing_rx: Some(outgoing_rx),
            running: Arc::new(std::sync::atomic::AtomicBool::new(false)),
            handles: Vec::new(),
        }
    }

    /// Replace the discard sink (defaults to disabled, i.e. discarded bytes
    /// are dropped on the floor).
    pub async fn set_discard_sink(&self, sink: DiscardSink) {
        *self.discard_sink.lock().await = sink;
    }

    /// Obtain an enqueue capability for this downlinker's outgoing queue,
    /// to be handed to an [`crate::pipeline::Uplinker`] for loopback
    /// handshakes.
    #[must_use]
    pub fn handle(&self) -> DownlinkHandle {
        DownlinkHandle { outgoing: self.outgoing_tx.clone() }
    }

    /// Start the deframing and sending workers as background tasks.
    ///
    /// Calling this again before an intervening [`Downlinker::stop`] and
    /// [`Downlinker::join`] is a no-op: the outgoing receiver is consumed by
    /// the first call and there is nothing left to hand the second set of
    /// workers.
    pub fn start(&mut self) {
        let Some(outgoing_rx) = self.outgoing_rx.take() else {
            return;
        };
        self.running.store(true, std::sync::atomic::Ordering::SeqCst);

        let deframe_handle = spawn_deframing_worker(
            Arc::clone(&self.adapter),
            Arc::clone(&self.framer),
            self.outgoing_tx.clone(),
            Arc::clone(&self.discard_sink),
            Arc::clone(&self.running),
            self.config.read_timeout,
        );
        let send_handle =
            spawn_sending_worker(outgoing_rx, Arc::clone(&self.ground), Arc::clone(&self.running));

        self.handles.push(deframe_handle);
        self.handles.push(send_handle);
    }

    /// Clear the run flag. Workers observe this on their next loop
    /// iteration and exit; call [`Downlinker::join`] afterward to wait for
    /// them.
    pub fn stop(&self) {
        self.running.store(false, std::sync::atomic::Ordering::SeqCst);
    }

    /// Wait for both workers to exit after [`Downlinker::stop`].
    pub async fn join(&mut self) {
        for handle in self.handles.drain(..) {
            let _ = handle.await;
        }
    }
}

fn spawn_deframing_worker<A, F>(
    adapter: Arc<Mutex<A>>,
    framer: Arc<Mutex<F>>,
    outgoing: mpsc::Sender<Bytes>,
    discard_sink: Arc<Mutex<DiscardSink>>,
    running: Arc<std::sync::atomic::AtomicBool>,
    read_timeout: Duration,
) -> JoinHandle<()>
where
    A: ByteAdapter + 'static,
    F: FramerDeframer + 'static,
{
    tokio::spawn(async move {
        while running.load(std::sync::atomic::Ordering::SeqCst) {
            let bytes = adapter.lock().await.read(read_timeout).await;
            if bytes.is_empty() {
                continue;
            }

            let result = framer.lock().await.deframe(&bytes);

            if !result.discarded.is_empty() {
                discard_sink.lock().await.write(&result.discarded).await;
            }

            for frame in result.frames {
                match outgoing.try_send(frame) {
                    Ok(()) => {},
                    Err(TrySendError::Full(_)) => {
                        warn!(queue = "outgoing", "downlink queue full, dropping frame");
                    },
                    Err(TrySendError::Closed(_)) => break,
                }
            }
        }
    })
}

fn spawn_sending_worker<G>(
    mut outgoing: mpsc::Receiver<Bytes>,
    ground: Arc<Mutex<G>>,
    running: Arc<std::sync::atomic::AtomicBool>,
) -> JoinHandle<()>
where
    G: GroundHandler + 'static,
{
    tokio::spawn(async move {
        while running.load(std::sync::atomic::Ordering::SeqCst) {
            let first = match tokio::time::timeout(SEND_BATCH_WINDOW, outgoing.recv()).await {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(_elapsed) => continue,
            };

            let mut batch = vec![first];
            while let Ok(frame) = outgoing.try_recv() {
                batch.push(frame);
            }

            ground.lock().await.send_all(&batch).await;
        }
    })
}

/// Runtime configuration for an [`Uplinker`].
pub struct UplinkConfig {
    /// Number of write attempts made per uplinked payload before dropping
    /// it. Defaults to [`RETRY_COUNT`].
    pub retry_count: u32,
}

impl Default for UplinkConfig {
    fn default() -> Self {
        Self { retry_count: RETRY_COUNT }
    }
}

/// Uplink pipeline: drain ground → frame → write → retry → loopback
/// handshake.
pub struct Uplinker<G, F, A> {
    ground: Arc<Mutex<G>>,
    framer: Arc<Mutex<F>>,
    adapter: Arc<Mutex<A>>,
    downlink: DownlinkHandle,
    config: UplinkConfig,
    running: Arc<std::sync::atomic::AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl<G, F, A> Uplinker<G, F, A>
where
    G: GroundHandler + 'static,
    F: FramerDeframer + 'static,
    A: ByteAdapter + 'static,
{
    /// Build an uplinker. `downlink` is the enqueue capability onto the
    /// paired downlinker's outgoing queue, used to inject synthesized
    /// loopback handshakes.
    #[must_use]
    pub fn new(ground: G, framer: F, adapter: A, downlink: DownlinkHandle, config: UplinkConfig) -> Self {
        Self {
            ground: Arc::new(Mutex::new(ground)),
            framer: Arc::new(Mutex::new(framer)),
            adapter: Arc::new(Mutex::new(adapter)),
            downlink,
            config,
            running: Arc::new(std::sync::atomic::AtomicBool::new(false)),
            handle: None,
        }
    }

    /// Start the worker as a background task.
    pub fn start(&mut self) {
        self.running.store(true, std::sync::atomic::Ordering::SeqCst);
        let ground = Arc::clone(&self.ground);
        let framer = Arc::clone(&self.framer);
        let adapter = Arc::clone(&self.adapter);
        let downlink = self.downlink.clone();
        let running = Arc::clone(&self.running);
        let retry_count = self.config.retry_count;

        self.handle = Some(tokio::spawn(async move {
            while running.load(std::sync::atomic::Ordering::SeqCst) {
                let payloads = ground.lock().await.receive_all().await;
                for payload in payloads {
                    if payload.is_empty() {
                        continue;
                    }
                    uplink_one(&payload, &framer, &adapter, &downlink, retry_count).await;
                }
            }
        }));
    }

    /// Clear the run flag; call [`Uplinker::join`] afterward to wait for the
    /// worker to exit.
    pub fn stop(&self) {
        self.running.store(false, std::sync::atomic::Ordering::SeqCst);
    }

    /// Wait for the worker to exit after [`Uplinker::stop`].
    pub async fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

async fn uplink_one<F, A>(
    payload: &Bytes,
    framer: &Arc<Mutex<F>>,
    adapter: &Arc<Mutex<A>>,
    downlink: &DownlinkHandle,
    retry_count: u32,
) where
    F: FramerDeframer,
    A: ByteAdapter,
{
    let framed = match framer.lock().await.frame(payload) {
        Ok(framed) => framed,
        Err(err) => {
            warn!(error = %err, "uplink payload too large to frame, dropping");
            return;
        },
    };

    let mut succeeded = false;
    for attempt in 0..retry_count {
        if adapter.lock().await.write(&framed).await {
            succeeded = true;
            break;
        }
        warn!(attempt, "uplink write attempt failed, retrying");
    }

    if succeeded {
        let handshake = descriptor::handshake_from(payload);
        downlink.try_enqueue(Bytes::from(handshake));
    } else {
        warn!("uplink payload dropped after exhausting retries");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc as StdArc,
        atomic::{AtomicUsize, Ordering},
    };

    use async_trait::async_trait;
    use gds_proto::frame::ChecksumMode;

    use super::*;
    use crate::framer::FprimeFramer;

    struct CountingAdapter {
        attempts: StdArc<AtomicUsize>,
        succeed_after: usize,
    }

    #[async_trait]
    impl ByteAdapter for CountingAdapter {
        async fn open(&mut self) {}
        async fn close(&mut self) {}
        async fn read(&mut self, _timeout: Duration) -> Bytes {
            Bytes::new()
        }
        async fn write(&mut self, _frame: &[u8]) -> bool {
            let n = self.attempts.fetch_add(1, Ordering::SeqCst);
            n + 1 >= self.succeed_after
        }
    }

    struct OneShotGround {
        payload: Mutex<Option<Bytes>>,
    }

    #[async_trait]
    impl GroundHandler for OneShotGround {
        async fn open(&mut self) {}
        async fn close(&mut self) {}
        async fn receive_all(&mut self) -> Vec<Bytes> {
            if let Some(payload) = self.payload.lock().await.take() {
                vec![payload]
            } else {
                tokio::time::sleep(Duration::from_millis(5)).await;
                Vec::new()
            }
        }
        async fn send_all(&mut self, _frames: &[Bytes]) {}
    }

    #[tokio::test]
    async fn scenario_five_third_write_succeeds_enqueues_exactly_one_handshake() {
        let (tx, mut rx) = mpsc::channel::<Bytes>(4);
        let downlink = DownlinkHandle { outgoing: tx };

        let attempts = StdArc::new(AtomicUsize::new(0));
        let adapter = CountingAdapter { attempts: StdArc::clone(&attempts), succeed_after: 3 };
        let framer = FprimeFramer::new(ChecksumMode::Crc32);
        let ground = OneShotGround { payload: Mutex::new(Some(Bytes::from_static(b"cmd"))) };

        let payload = Bytes::from_static(b"cmd");
        uplink_one(
            &payload,
            &Arc::new(Mutex::new(framer)),
            &Arc::new(Mutex::new(adapter)),
            &downlink,
            RETRY_COUNT,
        )
        .await;

        drop(ground);

        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        let handshake = rx.try_recv().expect("exactly one handshake enqueued");
        assert_eq!(&handshake[..4], &descriptor::Descriptor::Handshake.to_u32().to_be_bytes());
        assert!(rx.try_recv().is_err(), "no second handshake enqueued");
    }

    #[tokio::test]
    async fn downlink_handle_drops_on_full_queue_and_preserves_order() {
        let (tx, mut rx) = mpsc::channel::<Bytes>(1);
        let handle = DownlinkHandle { outgoing: tx };

        assert!(handle.try_enqueue(Bytes::from_static(b"first")));
        assert!(!handle.try_enqueue(Bytes::from_static(b"second")));

        let received = rx.try_recv().unwrap();
        assert_eq!(&received[..], b"first");
        assert!(rx.try_recv().is_err());
    }
}
