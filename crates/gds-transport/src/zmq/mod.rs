//! ZeroMQ internal transport (§4.7): broker-less PUB/SUB equivalent to the
//! routed TCP transport.

mod ground;

pub use ground::{ZmqGround, ZmqRole};
