//! Payload descriptors.
//!
//! Every payload that flows through the communications spine begins with a
//! 32-bit descriptor identifying its kind. The descriptor is not part of the
//! frame wire format (see [`crate::frame`]) but is consumed by upper layers:
//! the uplinker reads it to decide whether a packet is command-like, and
//! synthesizes it when building loopback handshakes.

/// A 32-bit tag at the start of a payload identifying its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Descriptor {
    /// An uplinked command packet.
    Command = 0,
    /// A downlinked telemetry channel packet.
    Channel = 1,
    /// A downlinked event packet.
    Event = 2,
    /// A file-transfer data packet (upload or download).
    File = 3,
    /// A log packet carrying raw/unprocessed data.
    Log = 4,
    /// A synthesized handshake packet, echoing an uplinked payload.
    Handshake = 5,
}

impl Descriptor {
    /// Parse a descriptor from its wire value.
    ///
    /// Returns `None` for values outside the closed set understood by this
    /// deployment; callers typically treat that as "pass through unexamined"
    /// rather than an error, since the descriptor set may grow.
    #[must_use]
    pub const fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Command),
            1 => Some(Self::Channel),
            2 => Some(Self::Event),
            3 => Some(Self::File),
            4 => Some(Self::Log),
            5 => Some(Self::Handshake),
            _ => None,
        }
    }

    /// Wire value for this descriptor.
    #[must_use]
    pub const fn to_u32(self) -> u32 {
        self as u32
    }
}

/// Prefix `payload` with the handshake descriptor, producing a loopback frame body.
///
/// Mirrors the ground system's synthesized handshake: flight software is not
/// expected to emit its own acknowledgement, so the uplinker fabricates one by
/// echoing the uplinked bytes back down prefixed with [`Descriptor::Handshake`].
#[must_use]
pub fn handshake_from(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + payload.len());
    out.extend_from_slice(&Descriptor::Handshake.to_u32().to_be_bytes());
    out.extend_from_slice(payload);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_known_values() {
        for d in [
            Descriptor::Command,
            Descriptor::Channel,
            Descriptor::Event,
            Descriptor::File,
            Descriptor::Log,
            Descriptor::Handshake,
        ] {
            assert_eq!(Descriptor::from_u32(d.to_u32()), Some(d));
        }
    }

    #[test]
    fn unknown_value_is_none() {
        assert_eq!(Descriptor::from_u32(99), None);
    }

    #[test]
    fn handshake_prefixes_descriptor() {
        let payload = [0xAAu8, 0xBB, 0xCC];
        let framed = handshake_from(&payload);
        assert_eq!(&framed[0..4], &Descriptor::Handshake.to_u32().to_be_bytes());
        assert_eq!(&framed[4..], &payload);
    }
}
