//! File transfer contract (§6): uplink accepts `(source, destination)`;
//! downlink writes files under a configured root directory. File-transfer
//! packets are a distinct descriptor prefix, routed through the same
//! framing layer as every other payload.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use gds_proto::descriptor::Descriptor;

/// Build an upload payload: reads `source` from disk and wraps it with the
/// [`Descriptor::File`] prefix and a length-prefixed destination path, ready
/// to hand to a ground client's `send` for the uplinker to frame and write.
///
/// # Errors
///
/// Propagates any I/O error reading `source`.
pub fn encode_upload(source: &Path, destination: &str) -> std::io::Result<Bytes> {
    let contents = std::fs::read(source)?;
    let dest_bytes = destination.as_bytes();

    let mut payload = Vec::with_capacity(4 + 2 + dest_bytes.len() + contents.len());
    payload.extend_from_slice(&Descriptor::File.to_u32().to_be_bytes());
    payload.extend_from_slice(&(dest_bytes.len() as u16).to_be_bytes());
    payload.extend_from_slice(dest_bytes);
    payload.extend_from_slice(&contents);

    Ok(Bytes::from(payload))
}

/// Errors writing a downlinked file-transfer packet.
#[derive(Debug, thiserror::Error)]
pub enum FileTransferError {
    /// The payload was too short to contain a descriptor and destination
    /// length.
    #[error("truncated file-transfer packet")]
    Truncated,
    /// The destination path escaped the configured root directory.
    #[error("destination path escapes the file-transfer root")]
    PathEscapesRoot,
    /// Writing the file failed.
    #[error("failed to write file: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes downlinked file-transfer packets under a configured root
/// directory.
pub struct FileReceiver {
    root: PathBuf,
}

impl FileReceiver {
    /// Build a receiver writing under `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Parse a downlinked file-transfer payload (descriptor already
    /// stripped by the caller, i.e. `payload` starts at the destination
    /// length field) and write its contents under this receiver's root.
    ///
    /// # Errors
    ///
    /// Returns [`FileTransferError::Truncated`] if the packet is shorter
    /// than its declared destination length, [`FileTransferError::PathEscapesRoot`]
    /// if the destination path would resolve outside `root` (e.g. via
    /// `..`), or [`FileTransferError::Io`] if the write fails.
    pub fn receive(&self, payload: &[u8]) -> Result<PathBuf, FileTransferError> {
        if payload.len() < 2 {
            return Err(FileTransferError::Truncated);
        }
        let dest_len = u16::from_be_bytes([payload[0], payload[1]]) as usize;
        if payload.len() < 2 + dest_len {
            return Err(FileTransferError::Truncated);
        }

        let destination = String::from_utf8_lossy(&payload[2..2 + dest_len]);
        let contents = &payload[2 + dest_len..];

        let dest_path = Path::new(destination.as_ref());
        if dest_path.components().any(|c| matches!(c, std::path::Component::ParentDir)) {
            return Err(FileTransferError::PathEscapesRoot);
        }

        let full_path = self.root.join(dest_path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&full_path, contents)?;
        Ok(full_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_then_receive_round_trips_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.bin");
        std::fs::write(&source, b"telemetry dump").unwrap();

        let payload = encode_upload(&source, "uplinked/source.bin").unwrap();
        // Strip the descriptor the way the downlink decoder would.
        let without_descriptor = &payload[4..];

        let root = dir.path().join("received");
        let receiver = FileReceiver::new(&root);
        let written = receiver.receive(without_descriptor).unwrap();

        assert_eq!(std::fs::read(written).unwrap(), b"telemetry dump");
    }

    #[test]
    fn path_traversal_destination_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let receiver = FileReceiver::new(dir.path());

        let destination = "../escape.bin";
        let mut payload = (destination.len() as u16).to_be_bytes().to_vec();
        payload.extend_from_slice(destination.as_bytes());
        payload.extend_from_slice(b"data");

        assert!(matches!(receiver.receive(&payload), Err(FileTransferError::PathEscapesRoot)));
    }

    #[test]
    fn truncated_packet_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let receiver = FileReceiver::new(dir.path());
        assert!(matches!(receiver.receive(&[0x00]), Err(FileTransferError::Truncated)));
    }
}
