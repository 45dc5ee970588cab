//! Transport-level errors.
//!
//! Per the error-handling design, only startup failures (bind) are fatal;
//! everything else (a dropped peer, a malformed registration line) is
//! logged and handled locally by the transport, never surfaced here.

use thiserror::Error;

/// Errors that can terminate a transport at startup.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The TCP listener or ZMQ socket could not bind its configured
    /// address. Fatal: reported once, process exits non-zero.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address the transport attempted to bind.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The ZMQ backend failed to bind or connect a socket.
    #[error("zmq socket error: {0}")]
    Zmq(String),
}
