//! Framer/deframer: the stateful pool-scanning loop built on the pure
//! byte-level transforms in `gds_proto::frame`.
//!
//! The deframer owns a growable byte pool between reads. Each call to
//! `deframe` appends newly read bytes, then repeatedly: scans for the start
//! marker (discarding anything before it), checks whether a complete frame
//! is present, and on checksum mismatch discards exactly one byte and
//! resumes scanning from the next. This is the same pool regardless of how
//! the caller chunked its reads, which is what makes deframing
//! chunking-invariant (§8).

use bytes::{Bytes, BytesMut};
use gds_proto::frame::{self, ChecksumMode, ParseOutcome};

/// A `FramerDeframer` variant, selected once at peering time and never
/// renegotiated mid-stream.
///
/// Additional wire formats (CCSDS Space Packet, Space Data Link) are
/// additional implementations of this trait; they may be chained so the
/// output of one becomes the input to the next.
pub trait FramerDeframer: Send {
    /// Build a complete wire frame from a payload.
    ///
    /// # Errors
    ///
    /// Returns an error if `payload` exceeds the format's maximum length.
    fn frame(&self, payload: &[u8]) -> gds_proto::errors::Result<Bytes>;

    /// Feed newly read bytes into the pool and drain as many complete
    /// frames as are available.
    ///
    /// Returns the frames produced (in pool order) and the bytes discarded
    /// while resyncing (garbage before the first marker, plus any bytes
    /// dropped one-at-a-time on checksum mismatch).
    fn deframe(&mut self, bytes: &[u8]) -> DeframeResult;
}

/// Output of one `deframe` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeframeResult {
    /// Frames recovered from the pool, in the order produced.
    pub frames: Vec<Bytes>,
    /// Bytes discarded while resyncing, concatenated in discard order.
    pub discarded: Vec<u8>,
}

impl FramerDeframer for Box<dyn FramerDeframer> {
    fn frame(&self, payload: &[u8]) -> gds_proto::errors::Result<Bytes> {
        (**self).frame(payload)
    }

    fn deframe(&mut self, bytes: &[u8]) -> DeframeResult {
        (**self).deframe(bytes)
    }
}

/// Default F´-style framer/deframer (see `gds_proto::frame`).
pub struct FprimeFramer {
    mode: ChecksumMode,
    pool: BytesMut,
    max_payload_len: u64,
}

impl FprimeFramer {
    /// Build a framer using the given checksum mode. The checksum mode is
    /// fixed for this peering; it is never inferred per-frame.
    #[must_use]
    pub fn new(mode: ChecksumMode) -> Self {
        Self { mode, pool: BytesMut::new(), max_payload_len: frame::MAX_PAYLOAD_LEN }
    }

    /// Find the index of `frame::START_MARKER` in `pool`, if present.
    fn find_marker(&self) -> Option<usize> {
        if self.pool.len() < frame::START_LEN {
            return None;
        }
        self.pool
            .windows(frame::START_LEN)
            .position(|window| window == frame::START_MARKER)
    }
}

impl FramerDeframer for FprimeFramer {
    fn frame(&self, payload: &[u8]) -> gds_proto::errors::Result<Bytes> {
        frame::frame(payload, self.mode)
    }

    fn deframe(&mut self, bytes: &[u8]) -> DeframeResult {
        self.pool.extend_from_slice(bytes);

        let mut result = DeframeResult::default();

        loop {
            let Some(marker_at) = self.find_marker() else {
                // No marker in the pool at all: everything we have so far
                // that is shorter than the marker might still become one
                // once more bytes arrive, so only discard the unambiguous
                // prefix that could never contain a marker start.
                if self.pool.len() >= frame::START_LEN {
                    let keep_from = self.pool.len() - (frame::START_LEN - 1);
                    result.discarded.extend_from_slice(&self.pool[..keep_from]);
                    let remainder = self.pool.split_off(keep_from);
                    self.pool = remainder;
                }
                break;
            };

            if marker_at > 0 {
                result.discarded.extend_from_slice(&self.pool[..marker_at]);
                let remainder = self.pool.split_off(marker_at);
                self.pool = remainder;
            }

            // `len` above a 32-bit garbage value is still rejected inside
            // `parse_one`, which reports it as Incomplete; a LENGTH that
            // large can never be satisfied, so without the max-length guard
            // below we would wait forever on that marker instead of
            // resyncing past it.
            if self.pool.len() >= frame::HEADER_LEN {
                let declared_len = u32::from_be_bytes([
                    self.pool[frame::START_LEN],
                    self.pool[frame::START_LEN + 1],
                    self.pool[frame::START_LEN + 2],
                    self.pool[frame::START_LEN + 3],
                ]) as u64;
                if declared_len >= self.max_payload_len {
                    result.discarded.push(self.pool[0]);
                    let remainder = self.pool.split_off(1);
                    self.pool = remainder;
                    continue;
                }
            }

            match frame::parse_one(&self.pool, self.mode) {
                ParseOutcome::Frame { payload, consumed } => {
                    result.frames.push(payload);
                    let remainder = self.pool.split_off(consumed);
                    self.pool = remainder;
                },
                ParseOutcome::Incomplete => break,
                ParseOutcome::ChecksumMismatch => {
                    result.discarded.push(self.pool[0]);
                    let remainder = self.pool.split_off(1);
                    self.pool = remainder;
                },
            }
        }

        result
    }
}

/// Chains two `FramerDeframer`s so the output of one becomes the input of
/// the other (§4.2: plugin variants "may be chained").
///
/// `frame` applies the inner formatter first, then wraps its output with
/// the outer one — so the outer format is the one that actually hits the
/// wire. `deframe` reverses that: bytes come off the wire in the outer
/// format first, and whatever payloads that yields are fed through the
/// inner deframer to recover the innermost payload. This matches the data
/// flow of, say, a CCSDS Space Packet carried inside an F´-style link frame.
pub struct ChainedFramer<Outer, Inner> {
    outer: Outer,
    inner: Inner,
}

impl<Outer, Inner> ChainedFramer<Outer, Inner>
where
    Outer: FramerDeframer,
    Inner: FramerDeframer,
{
    /// Build a chain: `outer` is the format nearest the wire, `inner` is
    /// nested inside its payloads.
    pub fn new(outer: Outer, inner: Inner) -> Self {
        Self { outer, inner }
    }
}

impl<Outer, Inner> FramerDeframer for ChainedFramer<Outer, Inner>
where
    Outer: FramerDeframer,
    Inner: FramerDeframer,
{
    fn frame(&self, payload: &[u8]) -> gds_proto::errors::Result<Bytes> {
        let inner_wire = self.inner.frame(payload)?;
        self.outer.frame(&inner_wire)
    }

    fn deframe(&mut self, bytes: &[u8]) -> DeframeResult {
        let outer_result = self.outer.deframe(bytes);

        let mut result = DeframeResult { discarded: outer_result.discarded, frames: Vec::new() };
        for outer_frame in outer_result.frames {
            let inner_result = self.inner.deframe(&outer_frame);
            result.discarded.extend_from_slice(&inner_result.discarded);
            result.frames.extend(inner_result.frames);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use gds_proto::frame::{ChecksumMode, frame};

    use super::*;

    #[test]
    fn scenario_one_frame_then_deframe_round_trips() {
        let payload = [0x00, 0x00, 0x00, 0x01, 0xAA];
        let wire = frame(&payload, ChecksumMode::Crc32).unwrap();
        let mut deframer = FprimeFramer::new(ChecksumMode::Crc32);
        let result = deframer.deframe(&wire);
        assert_eq!(result.frames, vec![Bytes::copy_from_slice(&payload)]);
        assert!(result.discarded.is_empty());
    }

    #[test]
    fn scenario_two_garbage_prefix_is_discarded_and_recorded() {
        let garbage = [0xDE, 0xAD, 0xBE, 0xEF];
        let payload = b"telemetry";
        let wire = frame(payload, ChecksumMode::Crc32).unwrap();
        let mut input = garbage.to_vec();
        input.extend_from_slice(&wire);

        let mut deframer = FprimeFramer::new(ChecksumMode::Crc32);
        let result = deframer.deframe(&input);

        assert_eq!(result.frames, vec![Bytes::copy_from_slice(payload)]);
        assert_eq!(result.discarded, garbage);
    }

    #[test]
    fn truncated_frame_missing_one_byte_returns_no_frames_and_no_discard() {
        let wire = frame(b"abc", ChecksumMode::Crc32).unwrap();
        let short = &wire[..wire.len() - 1];

        let mut deframer = FprimeFramer::new(ChecksumMode::Crc32);
        let result = deframer.deframe(short);

        assert!(result.frames.is_empty());
        assert!(result.discarded.is_empty());
    }

    #[test]
    fn checksum_bitflip_resyncs_and_recovers_next_frame() {
        let mut bad = frame(b"first", ChecksumMode::Crc32).unwrap().to_vec();
        let last = bad.len() - 1;
        bad[last] ^= 0xFF;
        let good = frame(b"second", ChecksumMode::Crc32).unwrap();

        let mut input = bad;
        input.extend_from_slice(&good);

        let mut deframer = FprimeFramer::new(ChecksumMode::Crc32);
        let result = deframer.deframe(&input);

        assert_eq!(result.frames, vec![Bytes::from_static(b"second")]);
        assert!(!result.discarded.is_empty());
    }

    #[test]
    fn byte_by_byte_chunking_produces_the_same_frames_as_one_shot() {
        let garbage = [0x11, 0x22];
        let payload_a = b"alpha";
        let payload_b = b"beta";
        let wire_a = frame(payload_a, ChecksumMode::Crc32).unwrap();
        let wire_b = frame(payload_b, ChecksumMode::Crc32).unwrap();

        let mut input = garbage.to_vec();
        input.extend_from_slice(&wire_a);
        input.extend_from_slice(&wire_b);

        let mut one_shot = FprimeFramer::new(ChecksumMode::Crc32);
        let one_shot_result = one_shot.deframe(&input);

        let mut chunked = FprimeFramer::new(ChecksumMode::Crc32);
        let mut frames = Vec::new();
        let mut discarded = Vec::new();
        for byte in &input {
            let result = chunked.deframe(std::slice::from_ref(byte));
            frames.extend(result.frames);
            discarded.extend(result.discarded);
        }

        assert_eq!(frames, one_shot_result.frames);
        assert_eq!(discarded, one_shot_result.discarded);
    }

    #[test]
    fn empty_payload_frames_and_deframes_cleanly() {
        let wire = frame(b"", ChecksumMode::Crc32).unwrap();
        let mut deframer = FprimeFramer::new(ChecksumMode::Crc32);
        let result = deframer.deframe(&wire);
        assert_eq!(result.frames, vec![Bytes::new()]);
    }

    #[test]
    fn chained_framer_nests_ccsds_inside_fprime_and_recovers_the_innermost_payload() {
        use crate::ccsds::CcsdsSpacePacketFramer;

        let mut chain =
            ChainedFramer::new(FprimeFramer::new(ChecksumMode::Crc32), CcsdsSpacePacketFramer::new(0x42));

        let wire = chain.frame(b"telemetry sample").unwrap();
        let result = chain.deframe(&wire);
        assert_eq!(result.frames, vec![Bytes::from_static(b"telemetry sample")]);
        assert!(result.discarded.is_empty());
    }
}
