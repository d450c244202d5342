//! Network-free tests of the notify policy (property 6, scenario S6):
//! `notify` never calls out over the wire, so a fake [`PeerClient`] that
//! panics if it's ever invoked is enough to prove that.

use async_trait::async_trait;

use chord_node::id::Id;
use chord_node::node_ref::NodeRef;
use chord_node::{Node, PeerClient};

struct UnreachableClient;

#[async_trait]
impl PeerClient for UnreachableClient {
    async fn get_successor(&self, _peer: &NodeRef) -> chord_node::error::ChordResult<NodeRef> {
        unreachable!("notify must not perform outbound RPCs")
    }
    async fn get_predecessor(
        &self,
        _peer: &NodeRef,
    ) -> chord_node::error::ChordResult<Option<NodeRef>> {
        unreachable!("notify must not perform outbound RPCs")
    }
    async fn find_successor(
        &self,
        _peer: &NodeRef,
        _target: Id,
        _hops: u32,
    ) -> chord_node::error::ChordResult<(u32, NodeRef)> {
        unreachable!("notify must not perform outbound RPCs")
    }
    async fn get_successors(&self, _peer: &NodeRef) -> chord_node::error::ChordResult<Vec<NodeRef>> {
        unreachable!("notify must not perform outbound RPCs")
    }
    async fn notify(&self, _peer: &NodeRef, _candidate: &NodeRef) -> chord_node::error::ChordResult<()> {
        unreachable!("notify must not perform outbound RPCs")
    }
}

fn node_with_id(port: u16, id_seed: u8) -> NodeRef {
    let mut bytes = [0u8; 20];
    bytes[19] = id_seed;
    NodeRef::with_id("127.0.0.1", port, Id::from_bytes(bytes))
}

#[tokio::test]
async fn notify_advances_predecessor_only_within_range() {
    let local = node_with_id(52000, 100);
    let node = Node::new(local.clone(), UnreachableClient);

    assert!(node.routing().predecessor().await.is_none());

    let x = node_with_id(52001, 50);
    node.notify(x.clone()).await;
    assert_eq!(node.routing().predecessor().await, Some(x.clone()));

    // Y's id (10) is not in (50, 100]; predecessor should stay at X.
    let y = node_with_id(52002, 10);
    node.notify(y).await;
    assert_eq!(node.routing().predecessor().await, Some(x.clone()));

    // Z's id (80) is in (50, 100]; predecessor should advance to Z.
    let z = node_with_id(52003, 80);
    node.notify(z.clone()).await;
    assert_eq!(node.routing().predecessor().await, Some(z));
}

#[tokio::test]
async fn notify_ignores_invalid_node_refs() {
    let local = node_with_id(52010, 100);
    let node = Node::new(local, UnreachableClient);

    let invalid = NodeRef::with_id("", 0, Id::from_bytes([0u8; 20]));
    node.notify(invalid).await;
    assert!(node.routing().predecessor().await.is_none());
}

#[tokio::test]
async fn solo_ring_resolves_any_id_to_local_with_zero_hops() {
    let local = node_with_id(52020, 100);
    let node = Node::new(local.clone(), UnreachableClient);

    for seed in [0u8, 1, 99, 200, 255] {
        let mut bytes = [0u8; 20];
        bytes[19] = seed;
        let (hops, successor) = node.find_successor(Id::from_bytes(bytes), 0).await.unwrap();
        assert_eq!(hops, 0);
        assert_eq!(successor, local);
    }
}
