//! Explicit configuration objects (§9): one struct per component, in place
//! of keyword-style construction. Every variant named here is a leaf type
//! selected once at startup; there is no deep dispatch hierarchy.

use std::time::Duration;

use gds_proto::frame::ChecksumMode;

/// Which [`gds_core::adapter::ByteAdapter`] variant to build.
#[derive(Debug, Clone)]
pub enum AdapterKind {
    /// TCP client to the flight-software binary (or a simulator).
    Ip {
        /// `host:port` to connect to.
        addr: String,
    },
    /// Serial port (requires the `uart` feature on `gds-core`).
    Uart {
        /// Device path, e.g. `/dev/ttyUSB0`.
        path: String,
        /// Baud rate.
        baud_rate: u32,
    },
    /// No physical link; all traffic is internal-transport loopback.
    None,
}

/// Which [`gds_core::framer::FramerDeframer`] variant to build.
#[derive(Debug, Clone, Copy)]
pub enum FramerKind {
    /// Default F´-style framer.
    Fprime {
        /// Checksum strategy for this peering.
        checksum: ChecksumMode,
    },
    /// CCSDS Space Packet framer, standalone (not nested inside another
    /// format).
    Ccsds {
        /// Application process id tagged onto every packet.
        apid: u16,
    },
    /// CCSDS Space Packets carried inside F´-style link frames: each space
    /// packet is the payload of an outer F´ link frame.
    FprimeWrappedCcsds {
        /// Checksum strategy for the outer F´ frame.
        checksum: ChecksumMode,
        /// Application process id tagged onto every inner packet.
        apid: u16,
    },
}

/// Which internal-transport binding the ground handler uses.
#[derive(Debug, Clone)]
pub enum TransportKind {
    /// Routed TCP pub/sub transport, connecting to `addr`.
    Tcp {
        /// `host:port` of the [`gds_transport::tcp::TcpRouter`].
        addr: String,
    },
    /// ZeroMQ transport.
    Zmq {
        /// Role and socket addresses for this endpoint.
        role: gds_transport::zmq::ZmqRole,
    },
}

/// Top-level configuration for one running ground process.
#[derive(Debug, Clone)]
pub struct GdsConfig {
    /// Byte adapter selection.
    pub adapter: AdapterKind,
    /// Framer/deframer selection.
    pub framer: FramerKind,
    /// Internal transport selection.
    pub transport: TransportKind,
    /// Attempts the uplinker makes before dropping a payload.
    pub retry_count: u32,
    /// Capacity of the downlink outgoing queue.
    pub queue_depth: usize,
    /// Inactivity window after which an untouched session is expired.
    pub session_inactivity_window: Duration,
    /// Optional path to sink bytes discarded while resyncing the deframer.
    pub discarded_sink_path: Option<String>,
    /// Root directory downlinked files are written under.
    pub file_transfer_root: String,
}

impl Default for GdsConfig {
    fn default() -> Self {
        Self {
            adapter: AdapterKind::None,
            framer: FramerKind::Fprime { checksum: ChecksumMode::Crc32 },
            transport: TransportKind::Tcp { addr: "127.0.0.1:50000".to_string() },
            retry_count: gds_core::pipeline::RETRY_COUNT,
            queue_depth: 256,
            session_inactivity_window: Duration::from_secs(60),
            discarded_sink_path: None,
            file_transfer_root: "./downlinked_files".to_string(),
        }
    }
}
