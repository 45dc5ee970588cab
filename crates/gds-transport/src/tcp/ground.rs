//! The TCP [`GroundHandler`]: the pipelines' view of a [`TcpClient`]
//! connection to the internal transport, registered as the flight-software
//! side.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use gds_core::ground::GroundHandler;
use gds_proto::RoutingTag;

use crate::tcp::client::TcpClient;

/// How long [`TcpGround::receive_all`] waits for the first message before
/// returning empty.
const POLL_TIMEOUT: Duration = Duration::from_millis(10);

/// TCP-backed ground handler: connects to the internal transport router as
/// `incoming`, and addresses everything it sends to `outgoing`.
pub struct TcpGround {
    addr: String,
    incoming: RoutingTag,
    outgoing: RoutingTag,
    client: Option<TcpClient>,
}

impl TcpGround {
    /// Build a ground handler that will connect to `addr` on [`open`](Self::open).
    #[must_use]
    pub fn new(addr: impl Into<String>, incoming: RoutingTag, outgoing: RoutingTag) -> Self {
        Self { addr: addr.into(), incoming, outgoing, client: None }
    }
}

#[async_trait]
impl GroundHandler for TcpGround {
    async fn open(&mut self) {
        if self.client.is_some() {
            return;
        }
        match TcpClient::connect(&self.addr, self.incoming).await {
            Ok(client) => self.client = Some(client),
            Err(err) => tracing::warn!(error = %err, addr = %self.addr, "tcp ground connect failed"),
        }
    }

    async fn close(&mut self) {
        self.client = None;
    }

    async fn receive_all(&mut self) -> Vec<Bytes> {
        let Some(client) = self.client.as_mut() else {
            tokio::time::sleep(POLL_TIMEOUT).await;
            return Vec::new();
        };
        client.recv_all(POLL_TIMEOUT).await
    }

    async fn send_all(&mut self, frames: &[Bytes]) {
        let Some(client) = self.client.as_mut() else {
            return;
        };
        for frame in frames {
            if !client.send(self.outgoing, frame).await {
                tracing::warn!("tcp ground send failed, will reconnect on next open");
                self.client = None;
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::tcp::router::TcpRouter;

    #[tokio::test]
    async fn round_trips_a_message_through_a_real_router() {
        let router = TcpRouter::bind("127.0.0.1:0").await.unwrap();
        let addr = router.local_addr().unwrap();
        tokio::spawn(async move { router.run().await });

        let mut fsw_ground = TcpGround::new(addr.to_string(), RoutingTag::FSW, RoutingTag::FSW);
        fsw_ground.open().await;

        let mut gui_ground = TcpGround::new(addr.to_string(), RoutingTag::GUI, RoutingTag::GUI);
        gui_ground.open().await;

        tokio::time::sleep(Duration::from_millis(30)).await;

        // GUI sends a command to FSW.
        let mut gui_client = crate::tcp::client::TcpClient::connect(&addr.to_string(), RoutingTag::GUI)
            .await
            .unwrap();
        gui_client.send(RoutingTag::FSW, b"cmd").await;

        let received = fsw_ground.receive_all().await;
        assert_eq!(received, vec![Bytes::from_static(b"cmd")]);
        let _ = gui_ground;
    }
}
