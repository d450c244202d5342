use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tonic::transport::Server;

use chord_node::{ChordService, GrpcPeerClient, Node, NodeRef, Stabilizer};
use chord_proto::chord::chord_server::ChordServer;

/// Starts a node bound to a fixed `127.0.0.1` port in a background task and
/// returns it alongside the server's `JoinHandle` so the test can abort it.
pub async fn start_node(port: u16) -> (Node<GrpcPeerClient>, tokio::task::JoinHandle<()>) {
    let local = NodeRef::new("127.0.0.1", port);
    let node = Node::new(local.clone(), GrpcPeerClient::new());

    let addr: SocketAddr = local.addr().parse().unwrap();
    let listener = TcpListener::bind(addr).await.unwrap();

    let service = ChordService::new(node.clone());
    let handle = tokio::spawn(async move {
        Server::builder()
            .add_service(ChordServer::new(service))
            .serve_with_incoming(tokio_stream::wrappers::TcpListenerStream::new(listener))
            .await
            .unwrap();
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    (node, handle)
}

/// Drives `rounds` rounds of stabilization across every node, in the same
/// spirit as the real periodic tasks but synchronous and fast.
pub async fn stabilize_ring(stabilizers: &[Stabilizer<GrpcPeerClient>], rounds: usize) {
    for _ in 0..rounds {
        for s in stabilizers {
            s.run_once().await;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
