//! Ground process entrypoint.
//!
//! CLI surface intentionally stops at component selection (which adapter,
//! which framer, which internal transport, and their addresses): dictionary
//! ingestion, command dispatch, and the browser GUI this process serves are
//! all external collaborators out of scope for this binary's argument
//! parsing.

use std::{process::ExitCode, time::Duration};

use clap::{Parser, ValueEnum};
use gds_dictionary::Dictionary;
use gds_proto::frame::ChecksumMode;
use gds_server::{
    GdsServer,
    config::{AdapterKind, FramerKind, GdsConfig, TransportKind},
};
use gds_transport::zmq::ZmqRole;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AdapterArg {
    Ip,
    Uart,
    None,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ChecksumArg {
    Crc32,
    Permissive,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FramerArg {
    /// Default F´-style framer only.
    Fprime,
    /// CCSDS Space Packet framer only.
    Ccsds,
    /// CCSDS Space Packets nested inside F´-style link frames.
    FprimeWrappedCcsds,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TransportArg {
    Tcp,
    Zmq,
}

/// Ground-side data system: communications spine between a flight computer
/// and ground tooling.
#[derive(Debug, Parser)]
#[command(name = "gds-server", version, about)]
struct Cli {
    /// Byte adapter talking to the flight computer.
    #[arg(long, value_enum, default_value_t = AdapterArg::None)]
    adapter: AdapterArg,

    /// `host:port` for the `ip` adapter, or the serial device path for `uart`.
    #[arg(long)]
    adapter_addr: Option<String>,

    /// Baud rate for the `uart` adapter.
    #[arg(long, default_value_t = 115_200)]
    uart_baud: u32,

    /// Which `FramerDeframer` implementation to build.
    #[arg(long, value_enum, default_value_t = FramerArg::Fprime)]
    framer: FramerArg,

    /// Frame checksum mode, for framer variants with an outer F´ frame.
    #[arg(long, value_enum, default_value_t = ChecksumArg::Crc32)]
    checksum: ChecksumArg,

    /// Application process id tagged onto CCSDS space packets, for framer
    /// variants that produce them.
    #[arg(long, default_value_t = 0)]
    ccsds_apid: u16,

    /// Internal pub/sub transport.
    #[arg(long, value_enum, default_value_t = TransportArg::Tcp)]
    transport: TransportArg,

    /// `host:port` the routed TCP transport binds to.
    #[arg(long, default_value = "127.0.0.1:50000")]
    tcp_addr: String,

    /// This endpoint's ZMQ PUB address.
    #[arg(long, default_value = "tcp://127.0.0.1:50001")]
    zmq_pub_addr: String,

    /// This endpoint's ZMQ SUB address.
    #[arg(long, default_value = "tcp://127.0.0.1:50002")]
    zmq_sub_addr: String,

    /// Bind the ZMQ sockets instead of connecting to a peer that binds.
    #[arg(long)]
    zmq_bind: bool,

    /// Uplink write attempts per payload before dropping it.
    #[arg(long, default_value_t = gds_core::pipeline::RETRY_COUNT)]
    retry_count: u32,

    /// Capacity of the downlink outgoing queue.
    #[arg(long, default_value_t = 256)]
    queue_depth: usize,

    /// Inactivity window, in seconds, after which an untouched history
    /// session is expired.
    #[arg(long, default_value_t = 60)]
    session_inactivity_secs: u64,

    /// Path to sink bytes discarded while the deframer resyncs. Disabled if
    /// unset.
    #[arg(long)]
    discard_sink: Option<String>,

    /// Root directory downlinked files are written under.
    #[arg(long, default_value = "./downlinked_files")]
    file_transfer_root: String,

    /// `tracing-subscriber` env-filter directive.
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn adapter_kind(&self) -> AdapterKind {
        match self.adapter {
            AdapterArg::Ip => AdapterKind::Ip {
                addr: self.adapter_addr.clone().unwrap_or_else(|| "127.0.0.1:50010".to_string()),
            },
            AdapterArg::Uart => AdapterKind::Uart {
                path: self.adapter_addr.clone().unwrap_or_else(|| "/dev/ttyUSB0".to_string()),
                baud_rate: self.uart_baud,
            },
            AdapterArg::None => AdapterKind::None,
        }
    }

    fn framer_kind(&self) -> FramerKind {
        let checksum = match self.checksum {
            ChecksumArg::Crc32 => ChecksumMode::Crc32,
            ChecksumArg::Permissive => ChecksumMode::Permissive,
        };
        match self.framer {
            FramerArg::Fprime => FramerKind::Fprime { checksum },
            FramerArg::Ccsds => FramerKind::Ccsds { apid: self.ccsds_apid },
            FramerArg::FprimeWrappedCcsds => {
                FramerKind::FprimeWrappedCcsds { checksum, apid: self.ccsds_apid }
            },
        }
    }

    fn transport_kind(&self) -> TransportKind {
        match self.transport {
            TransportArg::Tcp => TransportKind::Tcp { addr: self.tcp_addr.clone() },
            TransportArg::Zmq => {
                let role = if self.zmq_bind {
                    ZmqRole::Bind { pub_addr: self.zmq_pub_addr.clone(), sub_addr: self.zmq_sub_addr.clone() }
                } else {
                    ZmqRole::Connect { pub_addr: self.zmq_pub_addr.clone(), sub_addr: self.zmq_sub_addr.clone() }
                };
                TransportKind::Zmq { role }
            },
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&cli.log_level))
        .init();

    let config = GdsConfig {
        adapter: cli.adapter_kind(),
        framer: cli.framer_kind(),
        transport: cli.transport_kind(),
        retry_count: cli.retry_count,
        queue_depth: cli.queue_depth,
        session_inactivity_window: Duration::from_secs(cli.session_inactivity_secs),
        discarded_sink_path: cli.discard_sink.clone(),
        file_transfer_root: cli.file_transfer_root.clone(),
    };

    // Dictionary ingestion (JSON/XML schema parsing) is out of scope for
    // this binary; a real deployment would load one here and hand it in.
    let dictionary = Dictionary::new(Vec::new(), Vec::new(), Vec::new());

    let mut server = match GdsServer::build(config, dictionary).await {
        Ok(server) => server,
        Err(err) => {
            error!(error = %err, "failed to start ground process");
            return ExitCode::FAILURE;
        },
    };

    server.start();
    info!("ground process started");

    if tokio::signal::ctrl_c().await.is_err() {
        error!("failed to install ctrl-c handler, shutting down anyway");
    }

    info!("shutting down");
    server.stop();
    server.join().await;

    ExitCode::SUCCESS
}
