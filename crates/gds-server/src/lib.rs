//! Wires the byte adapter, framer, uplink/downlink pipelines, internal
//! transport, dictionary, and session histories into one running ground
//! process.
//!
//! A `GdsServer` owns exactly one physical link (adapter, shared between the
//! downlinker that reads it and the uplinker that writes it) and one
//! internal-transport pairing (two ground-handler connections: one the
//! downlinker sends telemetry out over, one the uplinker receives commands
//! from). Downlinked frames are recorded into session histories and,
//! for file-transfer payloads, onto disk, via [`recording::RecordingGround`]
//! before being forwarded to real ground clients.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod dispatch;
pub mod error;
pub mod file_transfer;
pub mod records;
pub mod recording;
mod shared;

use std::sync::Arc;

use gds_core::{
    adapter::{ByteAdapter, IpAdapter, NullAdapter},
    framer::{FprimeFramer, FramerDeframer},
    ground::GroundHandler,
    pipeline::{DiscardSink, DownlinkConfig, Downlinker, UplinkConfig, Uplinker},
};
use gds_dictionary::Dictionary;
use gds_proto::RoutingTag;
use gds_transport::{
    tcp::{TcpGround, TcpRouter},
    zmq::ZmqGround,
};
use tokio::task::JoinHandle;

use crate::{
    config::{AdapterKind, FramerKind, GdsConfig, TransportKind},
    error::ServerError,
    file_transfer::FileReceiver,
    recording::{Histories, RecordingGround},
    shared::SharedAdapter,
};

type DynAdapter = SharedAdapter<Box<dyn ByteAdapter>>;
type DynFramer = Box<dyn FramerDeframer>;
type DynGround = Box<dyn GroundHandler>;

fn build_adapter(kind: &AdapterKind) -> Box<dyn ByteAdapter> {
    match kind {
        AdapterKind::Ip { addr } => Box::new(IpAdapter::new(addr.clone())),
        #[cfg(feature = "uart")]
        AdapterKind::Uart { path, baud_rate } => {
            Box::new(gds_core::adapter::UartAdapter::new(path.clone(), *baud_rate))
        },
        #[cfg(not(feature = "uart"))]
        AdapterKind::Uart { .. } => {
            tracing::warn!("uart adapter selected without the `uart` feature enabled, falling back to none");
            Box::new(NullAdapter)
        },
        AdapterKind::None => Box::new(NullAdapter),
    }
}

fn build_framer(kind: FramerKind) -> Box<dyn FramerDeframer> {
    match kind {
        FramerKind::Fprime { checksum } => Box::new(FprimeFramer::new(checksum)),
        FramerKind::Ccsds { apid } => Box::new(gds_core::CcsdsSpacePacketFramer::new(apid)),
        FramerKind::FprimeWrappedCcsds { checksum, apid } => Box::new(gds_core::ChainedFramer::new(
            FprimeFramer::new(checksum),
            gds_core::CcsdsSpacePacketFramer::new(apid),
        )),
    }
}

fn build_ground(kind: &TransportKind) -> Box<dyn GroundHandler> {
    match kind {
        TransportKind::Tcp { addr } => Box::new(TcpGround::new(addr.clone(), RoutingTag::FSW, RoutingTag::GUI)),
        TransportKind::Zmq { role } => Box::new(ZmqGround::new(role.clone(), RoutingTag::FSW, RoutingTag::GUI)),
    }
}

/// Periodically expire sessions untouched for longer than `window` across
/// every history. Ticks at a quarter of `window` (never faster than one
/// second), so a session is expired within one tick of crossing the
/// boundary without polling far more often than the window warrants.
fn spawn_expiry_worker(histories: Histories, window: std::time::Duration) -> JoinHandle<()> {
    let tick = (window / 4).max(std::time::Duration::from_secs(1));
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(tick).await;
            histories.channels.lock().await.expire(window);
            histories.events.lock().await.expire(window);
            histories.logs.lock().await.expire(window);
            histories.command_echoes.lock().await.expire(window);
        }
    })
}

/// A fully wired ground process: one adapter, one internal-transport
/// pairing, and the downlink/uplink pipelines connecting them.
pub struct GdsServer {
    downlinker: Downlinker<DynAdapter, DynFramer, RecordingGround<DynGround>>,
    uplinker: Uplinker<DynGround, DynFramer, DynAdapter>,
    router_handle: Option<JoinHandle<()>>,
    expiry_handle: JoinHandle<()>,
    /// Session histories populated from downlinked traffic.
    pub histories: Histories,
    /// The dictionary this process dispatches commands against.
    pub dictionary: Dictionary,
}

impl GdsServer {
    /// Build every component named by `config` and `dictionary`, ready to
    /// [`GdsServer::start`].
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] if the internal transport fails to bind, the
    /// discard sink cannot be opened, or the file-transfer root cannot be
    /// created.
    pub async fn build(config: GdsConfig, dictionary: Dictionary) -> Result<Self, ServerError> {
        tokio::fs::create_dir_all(&config.file_transfer_root)
            .await
            .map_err(ServerError::FileTransferRoot)?;

        let router_handle = if let TransportKind::Tcp { addr } = &config.transport {
            let router = TcpRouter::bind(addr).await.map_err(ServerError::Transport)?;
            Some(tokio::spawn(async move { router.run().await }))
        } else {
            None
        };

        let mut shared_adapter = SharedAdapter::new(build_adapter(&config.adapter));
        let downlink_framer = build_framer(config.framer);
        let uplink_framer = build_framer(config.framer);
        let mut downlink_ground = build_ground(&config.transport);
        let mut uplink_ground = build_ground(&config.transport);

        shared_adapter.open().await;
        downlink_ground.open().await;
        uplink_ground.open().await;

        let histories = Histories::new();
        let files = Arc::new(FileReceiver::new(config.file_transfer_root.clone()));
        let recording_ground = RecordingGround::new(downlink_ground, histories.clone(), files);

        let mut downlinker = Downlinker::new(
            shared_adapter.clone(),
            downlink_framer,
            recording_ground,
            DownlinkConfig { queue_depth: config.queue_depth, ..DownlinkConfig::default() },
        );

        if let Some(path) = &config.discarded_sink_path {
            let sink = DiscardSink::open(std::path::Path::new(path)).await;
            downlinker.set_discard_sink(sink).await;
        }

        let uplinker = Uplinker::new(
            uplink_ground,
            uplink_framer,
            shared_adapter,
            downlinker.handle(),
            UplinkConfig { retry_count: config.retry_count },
        );

        let expiry_handle = spawn_expiry_worker(histories.clone(), config.session_inactivity_window);

        Ok(Self { downlinker, uplinker, router_handle, expiry_handle, histories, dictionary })
    }

    /// Start the downlink and uplink pipeline workers as background tasks.
    pub fn start(&mut self) {
        self.downlinker.start();
        self.uplinker.start();
    }

    /// Clear both pipelines' run flags; call [`GdsServer::join`] afterward.
    pub fn stop(&self) {
        self.downlinker.stop();
        self.uplinker.stop();
        self.expiry_handle.abort();
        if let Some(handle) = &self.router_handle {
            handle.abort();
        }
    }

    /// Wait for both pipelines' workers to exit after [`GdsServer::stop`].
    pub async fn join(&mut self) {
        self.downlinker.join().await;
        self.uplinker.join().await;
    }
}
