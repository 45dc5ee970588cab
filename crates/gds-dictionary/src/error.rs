//! Dictionary-surface errors, reported to callers as structured data per
//! the error-handling design's "dictionary lookup miss" / "argument
//! coercion failure" kinds.

use thiserror::Error;

/// Errors produced by dictionary lookup and command-argument coercion.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DictionaryError {
    /// Neither a command name nor an opcode matching the request was found
    /// in the dictionary. The uplinker is never invoked for this error.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Neither an event id nor a qualified name matching the request was
    /// found.
    #[error("unknown event: {0}")]
    UnknownEvent(String),

    /// Neither a channel id nor a qualified name matching the request was
    /// found.
    #[error("unknown channel: {0}")]
    UnknownChannel(String),

    /// One or more arguments failed to coerce to their declared type.
    /// Carries every failure, never just the first: dispatch is never
    /// partial.
    #[error("argument coercion failed: {0:?}")]
    ArgumentCoercion(Vec<String>),

    /// The caller supplied a different number of arguments than the
    /// template declares.
    #[error("expected {expected} argument(s), got {actual}")]
    ArgumentCountMismatch {
        /// Number of arguments the template declares.
        expected: usize,
        /// Number of arguments the caller supplied.
        actual: usize,
    },
}
