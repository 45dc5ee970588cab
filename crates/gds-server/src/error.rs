//! Top-level server error: only startup failures reach this type. Everything
//! transient is handled inside the adapter, framer, or pipelines and never
//! propagates here.

use thiserror::Error;

/// Fatal startup errors. Reported once; the process exits non-zero.
#[derive(Error, Debug)]
pub enum ServerError {
    /// The internal transport could not bind its listener/socket.
    #[error("internal transport failed to start: {0}")]
    Transport(#[from] gds_transport::TransportError),

    /// The discard sink path could not be prepared.
    #[error("failed to open discard sink: {0}")]
    DiscardSink(#[source] std::io::Error),

    /// The file-transfer root directory could not be created.
    #[error("failed to prepare file-transfer root: {0}")]
    FileTransferRoot(#[source] std::io::Error),
}
