//! Internal-transport envelope.
//!
//! Every message exchanged with the routed internal transport (TCP variant;
//! see `gds-transport-tcp`) is wrapped in a small fixed envelope:
//!
//! ```text
//! START(4B) | TAG(3B) | BODY
//! ```
//!
//! `START` is the literal ASCII bytes `A5A5`, matching the registration
//! handshake's textual style (`Register <TAG>\n`). `TAG` is a 3-byte routing
//! token (`GUI`, `FSW`, ...) naming the destination of `BODY`. The ZMQ
//! transport (`gds-transport-zmq`) does not use this envelope at all: it
//! relies on whole-message PUB/SUB semantics and a topic-filter prefix
//! instead, so there is no START/length framing to get wrong.

use bytes::{BufMut, Bytes, BytesMut};

use crate::errors::{ProtoError, Result};

/// Literal start marker for the internal TCP transport envelope.
pub const START_MARKER: [u8; 4] = *b"A5A5";

/// Length of a routing tag, in bytes.
pub const TAG_LEN: usize = 3;

/// A short byte token labeling a message on the internal transport.
///
/// Every client registers with an incoming tag and sends with an outgoing
/// tag; the server delivers a message only to clients whose incoming tag
/// equals the sender's declared outgoing tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoutingTag(pub [u8; TAG_LEN]);

impl RoutingTag {
    /// The ground-side GUI/CLI/test-harness tag.
    pub const GUI: Self = Self(*b"GUI");
    /// The flight-software-side tag.
    pub const FSW: Self = Self(*b"FSW");

    /// Build a tag from a byte slice, validating its length.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::InvalidRoutingTag`] if `bytes.len() != 3`.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != TAG_LEN {
            return Err(ProtoError::InvalidRoutingTag { expected: TAG_LEN, actual: bytes.len() });
        }
        let mut tag = [0u8; TAG_LEN];
        tag.copy_from_slice(bytes);
        Ok(Self(tag))
    }

    /// Raw bytes of this tag.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; TAG_LEN] {
        &self.0
    }
}

impl std::fmt::Display for RoutingTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// Encode `body` into an internal-transport envelope addressed to `tag`.
#[must_use]
pub fn encode(tag: RoutingTag, body: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(START_MARKER.len() + TAG_LEN + body.len());
    buf.put_slice(&START_MARKER);
    buf.put_slice(tag.as_bytes());
    buf.put_slice(body);
    buf.freeze()
}

/// Outcome of scanning for one envelope at the front of a byte pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeOutcome {
    /// A complete envelope was recognized. Note this only validates the
    /// presence of `START` and `TAG`; `body` runs to the end of whatever
    /// slice was handed in (the TCP transport reads whole `recv()` chunks,
    /// it does not length-prefix the body).
    Envelope {
        /// Destination routing tag.
        tag: RoutingTag,
        /// Message body (everything after `START | TAG`).
        body: Bytes,
    },
    /// Fewer than `START_MARKER.len() + TAG_LEN` bytes are available.
    Incomplete,
    /// The leading bytes are not the expected `START` marker.
    BadMarker,
}

/// Parse one envelope from the front of `input`.
#[must_use]
pub fn decode(input: &[u8]) -> EnvelopeOutcome {
    let prefix_len = START_MARKER.len() + TAG_LEN;
    if input.len() < prefix_len {
        return EnvelopeOutcome::Incomplete;
    }
    if !input.starts_with(&START_MARKER) {
        return EnvelopeOutcome::BadMarker;
    }
    let mut tag_bytes = [0u8; TAG_LEN];
    tag_bytes.copy_from_slice(&input[START_MARKER.len()..prefix_len]);
    EnvelopeOutcome::Envelope {
        tag: RoutingTag(tag_bytes),
        body: Bytes::copy_from_slice(&input[prefix_len..]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_then_decode_recovers_tag_and_body() {
        let body = b"some ground-originated bytes";
        let wire = encode(RoutingTag::FSW, body);
        match decode(&wire) {
            EnvelopeOutcome::Envelope { tag, body: got } => {
                assert_eq!(tag, RoutingTag::FSW);
                assert_eq!(&got[..], body);
            },
            other => panic!("expected Envelope, got {other:?}"),
        }
    }

    #[test]
    fn short_input_is_incomplete() {
        assert_eq!(decode(b"A5A5G"), EnvelopeOutcome::Incomplete);
    }

    #[test]
    fn bad_marker_is_rejected() {
        let mut wire = encode(RoutingTag::GUI, b"x").to_vec();
        wire[0] = b'X';
        assert_eq!(decode(&wire), EnvelopeOutcome::BadMarker);
    }

    #[test]
    fn empty_body_decodes_cleanly() {
        let wire = encode(RoutingTag::GUI, b"");
        match decode(&wire) {
            EnvelopeOutcome::Envelope { tag, body } => {
                assert_eq!(tag, RoutingTag::GUI);
                assert!(body.is_empty());
            },
            other => panic!("expected Envelope, got {other:?}"),
        }
    }

    #[test]
    fn invalid_tag_length_is_rejected() {
        assert!(RoutingTag::from_slice(b"GU").is_err());
        assert!(RoutingTag::from_slice(b"GUII").is_err());
        assert!(RoutingTag::from_slice(b"GUI").is_ok());
    }
}
