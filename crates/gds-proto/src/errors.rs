//! Wire-format error types.

use thiserror::Error;

/// Errors produced while encoding or decoding wire bytes.
///
/// These are pure byte-level failures; deciding what to do about them
/// (resync, reconnect, log and continue) is a concern of the calling layer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProtoError {
    /// Payload exceeds the maximum length the core wire format can carry.
    #[error("payload of {len} bytes exceeds the maximum of {max} bytes")]
    PayloadTooLarge {
        /// Length of the rejected payload.
        len: u64,
        /// Maximum length accepted by the wire format.
        max: u64,
    },

    /// The internal-transport routing tag was not exactly 3 bytes.
    #[error("routing tag must be exactly {expected} bytes, got {actual}")]
    InvalidRoutingTag {
        /// Required tag length.
        expected: usize,
        /// Length actually supplied.
        actual: usize,
    },

    /// Bytes supplied to a single-shot decode did not contain a complete envelope.
    #[error("truncated envelope: expected at least {expected} bytes, got {actual}")]
    Truncated {
        /// Minimum bytes required.
        expected: usize,
        /// Bytes actually supplied.
        actual: usize,
    },
}

/// Convenience alias for results returning [`ProtoError`].
pub type Result<T> = std::result::Result<T, ProtoError>;
