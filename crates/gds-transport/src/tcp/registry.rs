//! Pure routing-table logic for the TCP router: which peers are registered
//! under which tag, and where to forward a message addressed to a tag.
//!
//! Kept free of I/O so the delivery policy (deliver to every peer whose
//! incoming tag matches; drop a peer whose outbound queue can't keep up) is
//! testable without sockets.

use std::collections::HashMap;

use bytes::Bytes;
use gds_proto::RoutingTag;
use tokio::sync::mpsc;

/// Opaque identifier for one accepted connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerId(pub u64);

/// Routing table: tag → connected peers, plus the reverse index needed to
/// fully deregister a peer on disconnect.
#[derive(Default)]
pub struct Registry {
    by_tag: HashMap<RoutingTag, HashMap<PeerId, mpsc::Sender<Bytes>>>,
    tag_of: HashMap<PeerId, RoutingTag>,
}

impl Registry {
    /// Build an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `peer` under `tag`, with `outbound` as its per-connection
    /// send queue.
    pub fn register(&mut self, peer: PeerId, tag: RoutingTag, outbound: mpsc::Sender<Bytes>) {
        self.by_tag.entry(tag).or_default().insert(peer, outbound);
        self.tag_of.insert(peer, tag);
    }

    /// Remove `peer` from every tag it was registered under. Safe to call
    /// on an id that is not (or no longer) registered.
    pub fn unregister(&mut self, peer: PeerId) {
        if let Some(tag) = self.tag_of.remove(&peer)
            && let Some(peers) = self.by_tag.get_mut(&tag)
        {
            peers.remove(&peer);
        }
    }

    /// Forward `body` to every peer registered under `tag`. Peers whose
    /// outbound queue is full or closed are reported back to the caller
    /// (who owns untagging and closing their connection) rather than being
    /// removed here, keeping this method free of side effects beyond the
    /// sends themselves.
    #[must_use]
    pub fn route(&self, tag: RoutingTag, body: &Bytes) -> Vec<PeerId> {
        let Some(peers) = self.by_tag.get(&tag) else {
            return Vec::new();
        };

        let mut unresponsive = Vec::new();
        for (&peer, outbound) in peers {
            if outbound.try_send(body.clone()).is_err() {
                unresponsive.push(peer);
            }
        }
        unresponsive
    }

    /// Number of peers currently registered under `tag` (test/diagnostic
    /// use).
    #[must_use]
    pub fn count(&self, tag: RoutingTag) -> usize {
        self.by_tag.get(&tag).map_or(0, HashMap::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scenario_six_message_reaches_only_the_matching_tag() {
        let mut registry = Registry::new();
        let (gui_tx, mut gui_rx) = mpsc::channel(4);
        let (fsw_tx, mut fsw_rx) = mpsc::channel(4);

        registry.register(PeerId(1), RoutingTag::GUI, gui_tx);
        registry.register(PeerId(2), RoutingTag::FSW, fsw_tx);

        let dropped = registry.route(RoutingTag::GUI, &Bytes::from_static(b"hello"));
        assert!(dropped.is_empty());

        assert_eq!(gui_rx.try_recv().unwrap(), Bytes::from_static(b"hello"));
        assert!(fsw_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn unregister_removes_peer_from_its_tag() {
        let mut registry = Registry::new();
        let (tx, _rx) = mpsc::channel(4);
        registry.register(PeerId(1), RoutingTag::GUI, tx);
        assert_eq!(registry.count(RoutingTag::GUI), 1);

        registry.unregister(PeerId(1));
        assert_eq!(registry.count(RoutingTag::GUI), 0);
    }

    #[tokio::test]
    async fn full_queue_reports_peer_as_unresponsive() {
        let mut registry = Registry::new();
        let (tx, _rx) = mpsc::channel(1);
        registry.register(PeerId(1), RoutingTag::GUI, tx);

        // Fill the queue without draining it.
        let first = registry.route(RoutingTag::GUI, &Bytes::from_static(b"a"));
        assert!(first.is_empty());

        let second = registry.route(RoutingTag::GUI, &Bytes::from_static(b"b"));
        assert_eq!(second, vec![PeerId(1)]);
    }
}
