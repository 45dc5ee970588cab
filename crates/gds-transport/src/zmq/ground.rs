//! The ZeroMQ [`GroundHandler`] (§4.7): two sockets per endpoint (PUB out,
//! SUB in), no broker, whole-message semantics. Subscription filter equals
//! the incoming routing tag; the outgoing tag is prefixed onto every
//! published message as its topic.
//!
//! Per the pinned Open Question, every deployment uses the two-URL form:
//! one address for this endpoint's outbound (PUB) socket, one for its
//! inbound (SUB) socket, connecting to the peer's PUB. Exactly one
//! endpoint in a pairing binds; the other connects.

use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use gds_core::ground::GroundHandler;
use gds_proto::RoutingTag;
use zeromq::{Socket, SocketRecv, SocketSend, ZmqMessage};

/// How long [`ZmqGround::receive_all`] waits for the first message before
/// returning empty. ZMQ sockets have no intrinsic recv timeout, so this is
/// enforced with an async timeout around `recv`.
const POLL_TIMEOUT: Duration = Duration::from_millis(10);

/// Which side of a ZMQ pairing this endpoint plays. High-water marks are
/// left at the library default of unlimited, matching the spec's note that
/// there is no broker to apply backpressure against.
#[derive(Debug, Clone)]
pub enum ZmqRole {
    /// This endpoint binds both its PUB and SUB sockets.
    Bind {
        /// Address this endpoint's PUB socket binds to.
        pub_addr: String,
        /// Address this endpoint's SUB socket binds to.
        sub_addr: String,
    },
    /// This endpoint connects both its PUB and SUB sockets to a peer that
    /// binds.
    Connect {
        /// Address this endpoint's PUB socket connects to.
        pub_addr: String,
        /// Address this endpoint's SUB socket connects to.
        sub_addr: String,
    },
}

/// ZMQ-backed ground handler.
pub struct ZmqGround {
    role: ZmqRole,
    incoming: RoutingTag,
    outgoing: RoutingTag,
    sockets: Option<(zeromq::PubSocket, zeromq::SubSocket)>,
}

impl ZmqGround {
    /// Build a ground handler that will bind or connect its sockets on
    /// [`open`](Self::open).
    #[must_use]
    pub fn new(role: ZmqRole, incoming: RoutingTag, outgoing: RoutingTag) -> Self {
        Self { role, incoming, outgoing, sockets: None }
    }

    fn topic_bytes(&self) -> Vec<u8> {
        self.incoming.as_bytes().to_vec()
    }
}

#[async_trait]
impl GroundHandler for ZmqGround {
    async fn open(&mut self) {
        if self.sockets.is_some() {
            return;
        }

        let mut pub_socket = zeromq::PubSocket::new();
        let mut sub_socket = zeromq::SubSocket::new();

        let result = match &self.role {
            ZmqRole::Bind { pub_addr, sub_addr } => {
                async { pub_socket.bind(pub_addr).await?; sub_socket.bind(sub_addr).await }.await
            },
            ZmqRole::Connect { pub_addr, sub_addr } => {
                async { pub_socket.connect(pub_addr).await?; sub_socket.connect(sub_addr).await }.await
            },
        };

        if let Err(err) = result {
            tracing::warn!(error = %err, "zmq ground open failed");
            return;
        }

        if let Err(err) = sub_socket.subscribe(&String::from_utf8_lossy(&self.topic_bytes())).await {
            tracing::warn!(error = %err, "zmq subscribe failed");
            return;
        }

        self.sockets = Some((pub_socket, sub_socket));
    }

    async fn close(&mut self) {
        self.sockets = None;
    }

    async fn receive_all(&mut self) -> Vec<Bytes> {
        let Some((_, sub_socket)) = self.sockets.as_mut() else {
            tokio::time::sleep(POLL_TIMEOUT).await;
            return Vec::new();
        };

        let mut batch = Vec::new();
        match tokio::time::timeout(POLL_TIMEOUT, sub_socket.recv()).await {
            Ok(Ok(msg)) => {
                if let Some(body) = strip_topic(msg, self.incoming) {
                    batch.push(body);
                }
            },
            Ok(Err(err)) => tracing::warn!(error = %err, "zmq recv failed"),
            Err(_elapsed) => {},
        }
        batch
    }

    async fn send_all(&mut self, frames: &[Bytes]) {
        let Some((pub_socket, _)) = self.sockets.as_mut() else {
            return;
        };
        for frame in frames {
            let mut wire = BytesMut::with_capacity(self.outgoing.as_bytes().len() + frame.len());
            wire.extend_from_slice(self.outgoing.as_bytes());
            wire.extend_from_slice(frame);

            if let Err(err) = pub_socket.send(ZmqMessage::from(wire.freeze())).await {
                tracing::warn!(error = %err, "zmq send failed");
            }
        }
    }
}

fn strip_topic(msg: ZmqMessage, expected: RoutingTag) -> Option<Bytes> {
    let frames: Vec<Bytes> = msg.into_vec();
    let whole = frames.first()?;
    let tag_len = expected.as_bytes().len();
    if whole.len() < tag_len {
        return None;
    }
    Some(whole.slice(tag_len..))
}
