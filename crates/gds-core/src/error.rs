//! Error taxonomy for the communications spine.
//!
//! Mirrors the error kinds enumerated in the error-handling design: most are
//! recovered locally (logged and retried, or logged and dropped) and never
//! surfaced as a hard error; a few are reported to a caller as structured
//! data; only bind/startup failures are fatal.

use thiserror::Error;

/// Errors produced by the pipelines, adapters, and session histories in this
/// crate.
///
/// Most variants here are not meant to unwind a worker loop: `is_transient()`
/// and `is_fatal()` classify which ones a caller should retry-and-continue
/// versus terminate on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GdsError {
    /// Socket reset, timeout, or other transient I/O failure. Adapters
    /// recover by reconnecting internally; this variant exists mainly so a
    /// failed reconnect attempt can be logged with context.
    #[error("transient I/O error: {0}")]
    TransientIo(String),

    /// Checksum mismatch, length overflow, or invalid start marker while
    /// deframing. Never propagated past the deframer: the pool-scanning loop
    /// discards one byte and resyncs, logging this as a line, not an error
    /// return.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// A bounded queue was full and a frame or handshake was dropped.
    #[error("queue full, dropped frame ({queue})")]
    QueueFull {
        /// Name of the queue that rejected the enqueue, for log context.
        queue: &'static str,
    },

    /// Command-dispatch lookup failed: the named command or opcode is not in
    /// the consumed dictionary.
    #[error("unknown command: {0}")]
    DictionaryLookupMiss(String),

    /// One or more command arguments failed to coerce to their dictionary
    /// type. Carries every failure so the caller gets the full list, never a
    /// partial dispatch.
    #[error("argument coercion failed for {} argument(s)", .0.len())]
    ArgumentCoercion(Vec<String>),

    /// The internal transport could not bind its listener, or the dictionary
    /// could not be opened, at startup. Reported once; the process exits
    /// non-zero.
    #[error("fatal startup error: {0}")]
    Fatal(String),
}

impl GdsError {
    /// Returns true if this error is transient and recovered internally
    /// (reconnect, retry, or drop-and-continue) without surfacing to a
    /// caller as a hard failure.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::TransientIo(_) | Self::MalformedFrame(_) | Self::QueueFull { .. }
        )
    }

    /// Returns true if this error should terminate the process.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}

impl From<gds_proto::ProtoError> for GdsError {
    fn from(err: gds_proto::ProtoError) -> Self {
        Self::MalformedFrame(err.to_string())
    }
}

impl From<std::io::Error> for GdsError {
    fn from(err: std::io::Error) -> Self {
        Self::TransientIo(err.to_string())
    }
}

/// Convenience alias for results returning [`GdsError`].
pub type Result<T> = std::result::Result<T, GdsError>;
