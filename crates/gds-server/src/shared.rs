//! A [`ByteAdapter`] wrapper shared between the downlink and uplink
//! pipelines, which otherwise each take ownership of their own adapter.
//!
//! Both pipelines drive the same physical link (one serial port, one TCP
//! socket to flight software): the downlinker reads it, the uplinker writes
//! it. `SharedAdapter` lets both hold a handle to the one underlying
//! adapter instead of opening the link twice.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use gds_core::adapter::ByteAdapter;
use tokio::sync::Mutex;

/// Cloneable handle onto one shared [`ByteAdapter`]. Every clone serializes
/// through the same internal mutex, so reads and writes never interleave
/// mid-operation.
pub struct SharedAdapter<A> {
    inner: std::sync::Arc<Mutex<A>>,
}

impl<A> Clone for SharedAdapter<A> {
    fn clone(&self) -> Self {
        Self { inner: std::sync::Arc::clone(&self.inner) }
    }
}

impl<A> SharedAdapter<A> {
    /// Wrap `adapter` for sharing.
    pub fn new(adapter: A) -> Self {
        Self { inner: std::sync::Arc::new(Mutex::new(adapter)) }
    }
}

#[async_trait]
impl<A: ByteAdapter> ByteAdapter for SharedAdapter<A> {
    async fn open(&mut self) {
        self.inner.lock().await.open().await;
    }

    async fn close(&mut self) {
        self.inner.lock().await.close().await;
    }

    async fn read(&mut self, timeout: Duration) -> Bytes {
        self.inner.lock().await.read(timeout).await
    }

    async fn write(&mut self, frame: &[u8]) -> bool {
        self.inner.lock().await.write(frame).await
    }
}
