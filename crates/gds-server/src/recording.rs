//! Decorator over a [`GroundHandler`] that demultiplexes every outgoing
//! (downlinked) frame by its [`Descriptor`] and appends it to the matching
//! session history before forwarding it on to the wrapped ground handler.
//!
//! This is the seam chosen for history recording rather than a hook inside
//! `gds_core::pipeline::Downlinker`: the downlinker is transport-agnostic
//! and already complete, so recording is layered on as another
//! `GroundHandler` implementation wrapping the real one, exactly the way
//! the pipelines already treat TCP and ZMQ as interchangeable.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use gds_core::{env::SystemEnv, ground::GroundHandler};
use gds_proto::descriptor::Descriptor;
use gds_history::{History, SessionId};
use tokio::sync::Mutex;
use tracing::warn;

use crate::{
    file_transfer::FileReceiver,
    records::{ChannelSample, CommandEcho, EventRecord, LogRecord},
};

/// Shared handles onto the histories a [`RecordingGround`] appends to.
/// Cloneable: `gds-server`'s wiring keeps one set of clones to poll with a
/// [`SessionId`] while handing another set in here for recording.
#[derive(Clone)]
pub struct Histories {
    /// Downlinked telemetry channel samples.
    pub channels: Arc<Mutex<History<ChannelSample, SystemEnv>>>,
    /// Downlinked events.
    pub events: Arc<Mutex<History<EventRecord, SystemEnv>>>,
    /// Raw downlinked log payloads.
    pub logs: Arc<Mutex<History<LogRecord, SystemEnv>>>,
    /// Synthesized uplink handshakes.
    pub command_echoes: Arc<Mutex<History<CommandEcho, SystemEnv>>>,
}

impl Histories {
    /// Build four empty histories sharing nothing.
    #[must_use]
    pub fn new() -> Self {
        Self {
            channels: Arc::new(Mutex::new(History::new(SystemEnv))),
            events: Arc::new(Mutex::new(History::new(SystemEnv))),
            logs: Arc::new(Mutex::new(History::new(SystemEnv))),
            command_echoes: Arc::new(Mutex::new(History::new(SystemEnv))),
        }
    }

    /// Poll every history for `session`, e.g. for a hypothetical HTTP
    /// polling layer (out of scope here, per the history contract it would
    /// poll).
    pub async fn poll_all(
        &self,
        session: &SessionId,
    ) -> (
        gds_history::PollResponse<ChannelSample>,
        gds_history::PollResponse<EventRecord>,
        gds_history::PollResponse<LogRecord>,
        gds_history::PollResponse<CommandEcho>,
    ) {
        (
            self.channels.lock().await.retrieve(session.clone(), None),
            self.events.lock().await.retrieve(session.clone(), None),
            self.logs.lock().await.retrieve(session.clone(), None),
            self.command_echoes.lock().await.retrieve(session.clone(), None),
        )
    }
}

impl Default for Histories {
    fn default() -> Self {
        Self::new()
    }
}

/// Wraps a [`GroundHandler`], recording every downlinked frame into the
/// matching history (and, for file-transfer payloads, onto disk) before
/// forwarding it unchanged to the inner handler.
pub struct RecordingGround<G> {
    inner: G,
    histories: Histories,
    files: Arc<FileReceiver>,
}

impl<G> RecordingGround<G> {
    /// Wrap `inner`, recording into `histories` and writing downlinked
    /// files under `files`'s configured root.
    #[must_use]
    pub fn new(inner: G, histories: Histories, files: Arc<FileReceiver>) -> Self {
        Self { inner, histories, files }
    }

    async fn record(&self, frame: &Bytes) {
        if frame.len() < 4 {
            warn!("downlinked frame shorter than a descriptor, not recording");
            return;
        }
        let descriptor_value = u32::from_be_bytes([frame[0], frame[1], frame[2], frame[3]]);
        let rest = frame.slice(4..);

        match Descriptor::from_u32(descriptor_value) {
            Some(Descriptor::Channel) => {
                let Some((id, value)) = split_id(&rest) else {
                    warn!("channel payload shorter than an id, not recording");
                    return;
                };
                self.histories.channels.lock().await.append(ChannelSample { id, value });
            },
            Some(Descriptor::Event) => {
                let Some((id, args)) = split_id(&rest) else {
                    warn!("event payload shorter than an id, not recording");
                    return;
                };
                self.histories.events.lock().await.append(EventRecord { id, args });
            },
            Some(Descriptor::Log) => {
                self.histories.logs.lock().await.append(LogRecord { data: rest });
            },
            Some(Descriptor::Handshake) => {
                self.histories.command_echoes.lock().await.append(CommandEcho { echoed: rest });
            },
            Some(Descriptor::File) => {
                if let Err(err) = self.files.receive(&rest) {
                    warn!(error = %err, "failed to write downlinked file");
                }
            },
            Some(Descriptor::Command) => {
                warn!("command descriptor seen on downlink, not recording");
            },
            None => {
                warn!(descriptor = descriptor_value, "unknown descriptor, not recording");
            },
        }
    }
}

/// Split `payload` into a big-endian id and the remaining bytes.
fn split_id(payload: &Bytes) -> Option<(u32, Bytes)> {
    if payload.len() < 4 {
        return None;
    }
    let id = u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]);
    Some((id, payload.slice(4..)))
}

#[async_trait]
impl<G: GroundHandler> GroundHandler for RecordingGround<G> {
    async fn open(&mut self) {
        self.inner.open().await;
    }

    async fn close(&mut self) {
        self.inner.close().await;
    }

    async fn receive_all(&mut self) -> Vec<Bytes> {
        self.inner.receive_all().await
    }

    async fn send_all(&mut self, frames: &[Bytes]) {
        for frame in frames {
            self.record(frame).await;
        }
        self.inner.send_all(frames).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CapturingGround {
        sent: Vec<Bytes>,
    }

    #[async_trait]
    impl GroundHandler for CapturingGround {
        async fn open(&mut self) {}
        async fn close(&mut self) {}
        async fn receive_all(&mut self) -> Vec<Bytes> {
            Vec::new()
        }
        async fn send_all(&mut self, frames: &[Bytes]) {
            self.sent.extend_from_slice(frames);
        }
    }

    fn channel_frame(id: u32, value: &[u8]) -> Bytes {
        let mut bytes = Descriptor::Channel.to_u32().to_be_bytes().to_vec();
        bytes.extend_from_slice(&id.to_be_bytes());
        bytes.extend_from_slice(value);
        Bytes::from(bytes)
    }

    #[tokio::test]
    async fn channel_frame_is_recorded_and_forwarded() {
        let inner = CapturingGround { sent: Vec::new() };
        let histories = Histories::new();
        let files = Arc::new(FileReceiver::new(std::env::temp_dir()));
        let mut ground = RecordingGround::new(inner, histories.clone(), files);

        let frame = channel_frame(9, &[0xAA, 0xBB]);
        ground.send_all(&[frame.clone()]).await;

        assert_eq!(ground.inner.sent, vec![frame]);
        let session = SessionId::from("s");
        let polled = histories.channels.lock().await.retrieve(session, None);
        assert_eq!(polled.history, vec![ChannelSample { id: 9, value: Bytes::from_static(&[0xAA, 0xBB]) }]);
    }

    #[tokio::test]
    async fn unknown_descriptor_is_forwarded_but_not_recorded() {
        let inner = CapturingGround { sent: Vec::new() };
        let histories = Histories::new();
        let files = Arc::new(FileReceiver::new(std::env::temp_dir()));
        let mut ground = RecordingGround::new(inner, histories.clone(), files);

        let frame = Bytes::from_static(&[0xFF, 0xFF, 0xFF, 0xFF]);
        ground.send_all(&[frame]).await;

        let session = SessionId::from("s");
        assert!(histories.logs.lock().await.retrieve(session, None).history.is_empty());
    }
}
