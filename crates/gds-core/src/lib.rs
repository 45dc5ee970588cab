//! Communications spine for the ground-side data system.
//!
//! The byte adapter, framer/deframer, ground-handler interface, and the
//! uplink/downlink pipelines built on top of them. Everything here is
//! transport-agnostic: concrete internal-transport bindings (routed TCP,
//! ZeroMQ) live in `gds-transport` and implement [`ground::GroundHandler`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod adapter;
pub mod ccsds;
pub mod env;
pub mod error;
pub mod framer;
pub mod ground;
pub mod pipeline;

pub use adapter::ByteAdapter;
pub use ccsds::CcsdsSpacePacketFramer;
pub use env::Environment;
pub use error::GdsError;
pub use framer::{ChainedFramer, FramerDeframer};
pub use ground::GroundHandler;
