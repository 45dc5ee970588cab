//! Internal publish/subscribe transport for the ground-side data system.
//!
//! Two interchangeable implementations of the same routing contract: a
//! routed TCP server/client pair ([`tcp`]) and an equivalent ZeroMQ binding
//! ([`zmq`]). Both expose a [`gds_core::ground::GroundHandler`] so the
//! uplink/downlink pipelines never know which one they are talking to.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod error;
pub mod tcp;
pub mod zmq;

pub use error::TransportError;
pub use gds_proto::RoutingTag;
