//! Byte adapters: the bottom of the stack, talking raw bytes to the physical
//! link.
//!
//! An adapter never exposes I/O failures to its caller as an error return:
//! `read` returns an empty byte sequence on timeout or transient failure,
//! and `write` returns `false` on any failure. Reconnection is the
//! adapter's own concern.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::{io::AsyncWriteExt, net::TcpStream};
use tracing::warn;

/// Capability set shared by every byte adapter variant.
///
/// `open`/`close` are idempotent: calling either when already in the target
/// state is a no-op, and both are safe to call on any exit path (including
/// after a failed `open`).
#[async_trait]
pub trait ByteAdapter: Send + Sync {
    /// Acquire the underlying resource (connect, open the serial port, ...).
    /// Idempotent.
    async fn open(&mut self);

    /// Release the underlying resource. Idempotent; safe to call whether or
    /// not `open` succeeded.
    async fn close(&mut self);

    /// Block up to `timeout` waiting for bytes. On expiry, or on any
    /// transient I/O failure, returns an empty [`Bytes`] rather than an
    /// error; the adapter reconnects internally and logs the failure.
    async fn read(&mut self, timeout: Duration) -> Bytes;

    /// Write a complete frame. Returns `true` iff the entire frame was
    /// accepted by the link. Never panics or propagates link failure;
    /// reconnects internally and returns `false`.
    async fn write(&mut self, frame: &[u8]) -> bool;
}

#[async_trait]
impl ByteAdapter for Box<dyn ByteAdapter> {
    async fn open(&mut self) {
        (**self).open().await;
    }

    async fn close(&mut self) {
        (**self).close().await;
    }

    async fn read(&mut self, timeout: Duration) -> Bytes {
        (**self).read(timeout).await
    }

    async fn write(&mut self, frame: &[u8]) -> bool {
        (**self).write(frame).await
    }
}

/// `ip` adapter: a TCP client connected to the flight-software binary (or a
/// simulator standing in for it).
pub struct IpAdapter {
    addr: String,
    stream: Option<TcpStream>,
}

impl IpAdapter {
    /// Build an adapter that will connect to `addr` (`host:port`) on `open`.
    #[must_use]
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into(), stream: None }
    }

    async fn reconnect(&mut self) {
        match TcpStream::connect(&self.addr).await {
            Ok(stream) => self.stream = Some(stream),
            Err(err) => {
                warn!(addr = %self.addr, error = %err, "ip adapter reconnect failed");
                self.stream = None;
            },
        }
    }
}

#[async_trait]
impl ByteAdapter for IpAdapter {
    async fn open(&mut self) {
        if self.stream.is_none() {
            self.reconnect().await;
        }
    }

    async fn close(&mut self) {
        self.stream = None;
    }

    async fn read(&mut self, timeout: Duration) -> Bytes {
        use tokio::io::AsyncReadExt;

        let Some(stream) = self.stream.as_mut() else {
            self.reconnect().await;
            return Bytes::new();
        };

        let mut buf = vec![0u8; 64 * 1024];
        match tokio::time::timeout(timeout, stream.read(&mut buf)).await {
            Ok(Ok(0)) => {
                // Peer closed; reconnect on the next call.
                self.stream = None;
                Bytes::new()
            },
            Ok(Ok(n)) => {
                buf.truncate(n);
                Bytes::from(buf)
            },
            Ok(Err(err)) => {
                warn!(error = %err, "ip adapter read failed");
                self.stream = None;
                Bytes::new()
            },
            Err(_elapsed) => Bytes::new(),
        }
    }

    async fn write(&mut self, frame: &[u8]) -> bool {
        let Some(stream) = self.stream.as_mut() else {
            self.reconnect().await;
            return false;
        };

        match stream.write_all(frame).await {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "ip adapter write failed");
                self.stream = None;
                false
            },
        }
    }
}

/// `uart` adapter: a serial port connected to the flight-software binary
/// over a physical or virtual UART.
#[cfg(feature = "uart")]
pub struct UartAdapter {
    path: String,
    baud_rate: u32,
    port: Option<tokio_serial::SerialStream>,
}

#[cfg(feature = "uart")]
impl UartAdapter {
    /// Build an adapter that will open `path` (e.g. `/dev/ttyUSB0`) at
    /// `baud_rate` on `open`.
    #[must_use]
    pub fn new(path: impl Into<String>, baud_rate: u32) -> Self {
        Self { path: path.into(), baud_rate, port: None }
    }

    fn reconnect(&mut self) {
        use tokio_serial::SerialPortBuilderExt;

        match tokio_serial::new(&self.path, self.baud_rate).open_native_async() {
            Ok(port) => self.port = Some(port),
            Err(err) => {
                warn!(path = %self.path, error = %err, "uart adapter reconnect failed");
                self.port = None;
            },
        }
    }
}

#[cfg(feature = "uart")]
#[async_trait]
impl ByteAdapter for UartAdapter {
    async fn open(&mut self) {
        if self.port.is_none() {
            self.reconnect();
        }
    }

    async fn close(&mut self) {
        self.port = None;
    }

    async fn read(&mut self, timeout: Duration) -> Bytes {
        use tokio::io::AsyncReadExt;

        let Some(port) = self.port.as_mut() else {
            self.reconnect();
            return Bytes::new();
        };

        let mut buf = vec![0u8; 64 * 1024];
        match tokio::time::timeout(timeout, port.read(&mut buf)).await {
            Ok(Ok(0)) => {
                self.port = None;
                Bytes::new()
            },
            Ok(Ok(n)) => {
                buf.truncate(n);
                Bytes::from(buf)
            },
            Ok(Err(err)) => {
                warn!(error = %err, "uart adapter read failed");
                self.port = None;
                Bytes::new()
            },
            Err(_elapsed) => Bytes::new(),
        }
    }

    async fn write(&mut self, frame: &[u8]) -> bool {
        let Some(port) = self.port.as_mut() else {
            self.reconnect();
            return false;
        };

        match port.write_all(frame).await {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "uart adapter write failed");
                self.port = None;
                false
            },
        }
    }
}

/// `none` adapter: disabled link. Every `read` immediately returns empty
/// (after honoring the requested timeout), every `write` returns `false`.
/// Useful when a deployment runs only the internal transport with no
/// physical link (all-loopback testing, GUI-only sessions).
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAdapter;

#[async_trait]
impl ByteAdapter for NullAdapter {
    async fn open(&mut self) {}

    async fn close(&mut self) {}

    async fn read(&mut self, timeout: Duration) -> Bytes {
        tokio::time::sleep(timeout).await;
        Bytes::new()
    }

    async fn write(&mut self, _frame: &[u8]) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn null_adapter_read_times_out_empty() {
        let mut adapter = NullAdapter;
        let bytes = adapter.read(Duration::from_millis(1)).await;
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn null_adapter_write_always_fails() {
        let mut adapter = NullAdapter;
        assert!(!adapter.write(b"anything").await);
    }

    #[tokio::test]
    async fn ip_adapter_without_a_listener_fails_write_and_returns_empty_read() {
        let mut adapter = IpAdapter::new("127.0.0.1:1");
        adapter.open().await;
        assert!(!adapter.write(b"x").await);
        let bytes = adapter.read(Duration::from_millis(10)).await;
        assert!(bytes.is_empty());
    }
}
