//! Ground handler: the pipelines' view of the internal transport.
//!
//! Two variants share one interface. The TCP variant speaks the routed
//! envelope format from `gds_proto::envelope` over two tagged channels
//! (incoming as `FSW`, outgoing filtered for messages addressed to `FSW`);
//! the ZMQ variant binds PUB/SUB sockets directly and gets whole-message
//! semantics for free, so it never needs to re-synchronize a byte pool.

use async_trait::async_trait;
use bytes::Bytes;

/// Interface shared by every internal-transport binding used by the
/// pipelines.
#[async_trait]
pub trait GroundHandler: Send + Sync {
    /// Acquire the underlying transport connection(s). Idempotent.
    async fn open(&mut self);

    /// Release the underlying transport connection(s). Idempotent.
    async fn close(&mut self);

    /// Drain all ground-originated payloads currently available, blocking
    /// until at least one arrives or an internal poll timeout expires.
    /// Returns an empty vector on timeout; never fails.
    async fn receive_all(&mut self) -> Vec<Bytes>;

    /// Send a batch of downlinked frames to the internal transport. Framing
    /// (length-prefixing, where the underlying transport needs it) is the
    /// implementation's concern, not the caller's.
    async fn send_all(&mut self, frames: &[Bytes]);
}

#[async_trait]
impl GroundHandler for Box<dyn GroundHandler> {
    async fn open(&mut self) {
        (**self).open().await;
    }

    async fn close(&mut self) {
        (**self).close().await;
    }

    async fn receive_all(&mut self) -> Vec<Bytes> {
        (**self).receive_all().await
    }

    async fn send_all(&mut self, frames: &[Bytes]) {
        (**self).send_all(frames).await;
    }
}
