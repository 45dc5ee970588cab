//! CCSDS Space Packet `FramerDeframer` (§4.2 plugin variant).
//!
//! Grounded in the CCSDS Space Packet Protocol primary header: a 6-byte
//! header (version, type, secondary-header flag, and APID packed into the
//! first 16 bits; sequence flags and sequence count into the next 16;
//! packet data length, encoded as `length - 1`, in the final 16) followed
//! by the user data. Unlike the F´-style framer, a space packet carries its
//! own length field rather than a start marker, so deframing here is pure
//! length-based segmentation: there is no byte-at-a-time resync, only
//! waiting for enough bytes to complete the declared length.

use std::sync::atomic::{AtomicU16, Ordering};

use bytes::{Bytes, BytesMut};

use crate::framer::{DeframeResult, FramerDeframer};

const PRIMARY_HEADER_LEN: usize = 6;
const SEQUENCE_COUNT_MODULUS: u16 = 1 << 14;
const VERSION_AND_TYPE: u16 = 0b000_1_0 << 11; // version 0, type TC (1), no secondary header
const SEQUENCE_FLAGS_UNSEGMENTED: u16 = 0b11 << 14;

/// Frames payloads as standalone CCSDS space packets (command/`TC` type, no
/// secondary header). Deframes a byte pool containing zero or more
/// back-to-back space packets.
pub struct CcsdsSpacePacketFramer {
    apid: u16,
    sequence_count: AtomicU16,
    pool: BytesMut,
}

impl CcsdsSpacePacketFramer {
    /// Build a framer tagging every packet with `apid` (application process
    /// id, masked to its 11-bit field).
    #[must_use]
    pub fn new(apid: u16) -> Self {
        Self { apid: apid & 0x07FF, sequence_count: AtomicU16::new(0), pool: BytesMut::new() }
    }

    fn next_sequence_count(&self) -> u16 {
        let mut current = self.sequence_count.load(Ordering::Relaxed);
        loop {
            let next = (current + 1) % SEQUENCE_COUNT_MODULUS;
            match self.sequence_count.compare_exchange_weak(
                current,
                next,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return current,
                Err(observed) => current = observed,
            }
        }
    }
}

impl FramerDeframer for CcsdsSpacePacketFramer {
    fn frame(&self, payload: &[u8]) -> gds_proto::errors::Result<Bytes> {
        if payload.is_empty() || payload.len() > u16::MAX as usize {
            return Err(gds_proto::errors::ProtoError::PayloadTooLarge {
                len: payload.len() as u64,
                max: u64::from(u16::MAX),
            });
        }

        let word1 = VERSION_AND_TYPE | self.apid;
        let sequence = self.next_sequence_count();
        let word2 = SEQUENCE_FLAGS_UNSEGMENTED | sequence;
        let data_len = (payload.len() - 1) as u16;

        let mut wire = Vec::with_capacity(PRIMARY_HEADER_LEN + payload.len());
        wire.extend_from_slice(&word1.to_be_bytes());
        wire.extend_from_slice(&word2.to_be_bytes());
        wire.extend_from_slice(&data_len.to_be_bytes());
        wire.extend_from_slice(payload);
        Ok(Bytes::from(wire))
    }

    fn deframe(&mut self, bytes: &[u8]) -> DeframeResult {
        self.pool.extend_from_slice(bytes);

        let mut result = DeframeResult::default();
        loop {
            if self.pool.len() < PRIMARY_HEADER_LEN {
                break;
            }
            let data_len = u16::from_be_bytes([self.pool[4], self.pool[5]]) as usize + 1;
            let total_len = PRIMARY_HEADER_LEN + data_len;
            if self.pool.len() < total_len {
                break;
            }

            let payload = Bytes::copy_from_slice(&self.pool[PRIMARY_HEADER_LEN..total_len]);
            result.frames.push(payload);
            let remainder = self.pool.split_off(total_len);
            self.pool = remainder;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_then_deframe_round_trips_one_packet() {
        let framer_side = CcsdsSpacePacketFramer::new(0x042);
        let wire = framer_side.frame(b"hello").unwrap();

        let mut deframer_side = CcsdsSpacePacketFramer::new(0x042);
        let result = deframer_side.deframe(&wire);
        assert_eq!(result.frames, vec![Bytes::from_static(b"hello")]);
    }

    #[test]
    fn sequence_count_increments_and_wraps() {
        let framer = CcsdsSpacePacketFramer::new(1);
        let first = framer.frame(b"a").unwrap();
        let second = framer.frame(b"a").unwrap();
        let seq_of = |wire: &Bytes| u16::from_be_bytes([wire[2], wire[3]]) & 0x3FFF;
        assert_eq!(seq_of(&first) + 1, seq_of(&second));
    }

    #[test]
    fn truncated_packet_yields_no_frames() {
        let framer_side = CcsdsSpacePacketFramer::new(7);
        let wire = framer_side.frame(b"payload").unwrap();

        let mut deframer_side = CcsdsSpacePacketFramer::new(7);
        let result = deframer_side.deframe(&wire[..wire.len() - 1]);
        assert!(result.frames.is_empty());
    }

    #[test]
    fn back_to_back_packets_both_recovered() {
        let framer_side = CcsdsSpacePacketFramer::new(7);
        let mut input = framer_side.frame(b"first").unwrap().to_vec();
        input.extend_from_slice(&framer_side.frame(b"second").unwrap());

        let mut deframer_side = CcsdsSpacePacketFramer::new(7);
        let result = deframer_side.deframe(&input);
        assert_eq!(result.frames, vec![Bytes::from_static(b"first"), Bytes::from_static(b"second")]);
    }

    #[test]
    fn empty_payload_is_rejected() {
        let framer_side = CcsdsSpacePacketFramer::new(0);
        assert!(framer_side.frame(b"").is_err());
    }
}
