//! Record types appended to the per-kind session histories as downlinked
//! frames are demultiplexed by their [`Descriptor`](gds_proto::descriptor::Descriptor).
//!
//! Decoding a channel or event payload into dictionary-typed [`gds_dictionary::Value`]s
//! requires the inverse of `gds_dictionary::wire::encode_value`, which is not
//! part of this repository's scope (the dictionary crate owns encoding for
//! command dispatch only); these records carry the raw post-descriptor bytes
//! so a dictionary-aware consumer can decode them against the matching
//! template by id.

use bytes::Bytes;

/// One downlinked telemetry channel sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSample {
    /// Channel id, identifying the [`gds_dictionary::ChannelTemplate`] this
    /// sample was encoded against.
    pub id: u32,
    /// Raw encoded value bytes, immediately following the id.
    pub value: Bytes,
}

/// One downlinked event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    /// Event id, identifying the [`gds_dictionary::EventTemplate`] this
    /// event was encoded against.
    pub id: u32,
    /// Raw encoded argument bytes, immediately following the id.
    pub args: Bytes,
}

/// One raw log payload, carried through unprocessed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Raw payload bytes, descriptor already stripped.
    pub data: Bytes,
}

/// One synthesized uplink handshake, echoing the uplinked payload it
/// acknowledges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEcho {
    /// The uplinked payload this handshake echoes, descriptor already
    /// stripped.
    pub echoed: Bytes,
}
