//! Network-backed integration tests: real tonic servers on localhost,
//! stabilization driven synchronously through `Stabilizer::run_once`.

mod common;

use chord_node::{GrpcPeerClient, Node, NodeRef, Stabilizer};

fn stabilizer_for(node: &Node<GrpcPeerClient>) -> Stabilizer<GrpcPeerClient> {
    Stabilizer::new(node.clone())
}

#[tokio::test]
async fn solo_node_finds_itself() {
    let (node, _handle) = common::start_node(51001).await;
    let (hops, successor) = node.find_successor(node.local().id(), 0).await.unwrap();
    assert_eq!(hops, 0);
    assert_eq!(successor, *node.local());
    assert!(node.routing().predecessor().await.is_none());
}

#[tokio::test]
async fn two_node_join_converges_to_mutual_successors() {
    let (a, _ha) = common::start_node(51010).await;
    let (b, _hb) = common::start_node(51011).await;

    assert!(b.join(a.local().clone()).await);

    let stabilizers = vec![stabilizer_for(&a), stabilizer_for(&b)];
    common::stabilize_ring(&stabilizers, 10).await;

    assert_eq!(a.routing().successor().await, *b.local());
    assert_eq!(b.routing().successor().await, *a.local());
    assert_eq!(a.routing().predecessor().await, Some(b.local().clone()));
    assert_eq!(b.routing().predecessor().await, Some(a.local().clone()));
}

#[tokio::test]
async fn three_node_ring_forms_cyclic_order() {
    let (a, _ha) = common::start_node(51020).await;
    let (b, _hb) = common::start_node(51021).await;
    let (c, _hc) = common::start_node(51022).await;

    assert!(b.join(a.local().clone()).await);
    assert!(c.join(a.local().clone()).await);

    let stabilizers = vec![stabilizer_for(&a), stabilizer_for(&b), stabilizer_for(&c)];
    common::stabilize_ring(&stabilizers, 20).await;

    // Every node's successor's predecessor should be itself (property 7).
    for (node, label) in [(&a, "A"), (&b, "B"), (&c, "C")] {
        let successor_addr = node.routing().successor().await;
        let successor = [&a, &b, &c]
            .into_iter()
            .find(|n| *n.local() == successor_addr)
            .unwrap_or_else(|| panic!("{label}'s successor {successor_addr} is not one of A/B/C"));
        assert_eq!(
            successor.routing().predecessor().await.as_ref(),
            Some(node.local()),
            "{label}'s successor's predecessor should be {label} itself"
        );
    }
}

#[tokio::test]
async fn successor_failure_is_recovered_from_cache() {
    let (a, _ha) = common::start_node(51030).await;
    let (b, hb) = common::start_node(51031).await;
    let (c, _hc) = common::start_node(51032).await;

    assert!(b.join(a.local().clone()).await);
    assert!(c.join(a.local().clone()).await);

    let stabilizers = vec![stabilizer_for(&a), stabilizer_for(&b), stabilizer_for(&c)];
    common::stabilize_ring(&stabilizers, 20).await;

    // Kill B's server so every RPC to it starts failing.
    hb.abort();
    drop(b);

    // Give a few more rounds for whichever node had B as its successor to
    // notice and fail over onto a cache entry.
    common::stabilize_ring(&stabilizers, 10).await;

    for node in [&a, &c] {
        let successor = node.routing().successor().await;
        assert_ne!(successor.port(), 51031, "node should have failed over off the dead peer");
    }
}

#[tokio::test]
async fn find_successor_resolves_to_the_owning_node_without_a_forward_loop() {
    let (a, _ha) = common::start_node(51040).await;
    let (b, _hb) = common::start_node(51041).await;

    assert!(b.join(a.local().clone()).await);
    let stabilizers = vec![stabilizer_for(&a), stabilizer_for(&b)];
    common::stabilize_ring(&stabilizers, 10).await;

    // Looking up an arbitrary id from either side should terminate with a
    // bounded hop count and never exceed what a 2-node ring should need.
    let target = chord_node::id::Id::compute("some-key", 1);
    let (hops_from_a, owner_from_a) = a.find_successor(target, 0).await.unwrap();
    let (hops_from_b, owner_from_b) = b.find_successor(target, 0).await.unwrap();

    assert!(hops_from_a <= 1);
    assert!(hops_from_b <= 1);
    assert_eq!(owner_from_a, owner_from_b);
}
