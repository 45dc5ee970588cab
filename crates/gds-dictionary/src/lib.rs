//! The dictionary surface consumed by the ground-side data system.
//!
//! A dictionary is produced externally (by a JSON/XML schema parser that is
//! out of scope for this crate) and handed in as already-typed templates:
//! commands, events, and telemetry channels, each built from the same closed
//! algebra of value types. This crate owns only the types and the argument
//! coercion used by command dispatch; it never reads a schema file itself.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod coerce;
mod dictionary;
mod error;
mod template;
mod value;
pub mod wire;

pub use coerce::coerce_args;
pub use dictionary::Dictionary;
pub use error::DictionaryError;
pub use template::{ArgSpec, ChannelTemplate, CommandTemplate, EventTemplate, Limits, Severity};
pub use value::{IntRepr, Value, ValueType};
