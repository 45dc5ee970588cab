//! Wire formats for the ground-side data system.
//!
//! This crate is the pure, allocation-light byte layer: building and parsing
//! link frames (the default F´-style wire format), the internal-transport
//! envelope used by the routed TCP pub/sub server, and the 32-bit payload
//! descriptors consumed by upper layers. Nothing here touches I/O, threads,
//! or time; see `gds-core` for the stateful pool-scanning and pipeline logic
//! built on top of these primitives.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod descriptor;
pub mod envelope;
pub mod errors;
pub mod frame;

pub use descriptor::Descriptor;
pub use envelope::RoutingTag;
pub use errors::ProtoError;
