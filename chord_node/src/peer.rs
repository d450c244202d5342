//! The peer-client abstraction (`spec.md` §4.7): outbound RPCs to any
//! [`NodeRef`]. The lookup engine, stabilizer and notify/join logic only
//! ever depend on the [`PeerClient`] trait, never on `tonic` directly — the
//! one production implementation, [`GrpcPeerClient`], is the reference
//! transport binding described in `SPEC_FULL.md` §6.

use async_trait::async_trait;
use tonic::transport::{Channel, Endpoint};
use tonic::{Request, Status};

use chord_proto::chord::chord_client::ChordClient;
use chord_proto::chord::{Empty, FindSuccessorRequest, NodeInfo};

use crate::constants::RPC_TIMEOUT;
use crate::error::{ChordError, ChordResult};
use crate::id::Id;
use crate::node_ref::NodeRef;

#[async_trait]
pub trait PeerClient: Send + Sync {
    async fn get_successor(&self, peer: &NodeRef) -> ChordResult<NodeRef>;
    async fn get_predecessor(&self, peer: &NodeRef) -> ChordResult<Option<NodeRef>>;
    async fn find_successor(&self, peer: &NodeRef, target: Id, hops: u32)
        -> ChordResult<(u32, NodeRef)>;
    async fn get_successors(&self, peer: &NodeRef) -> ChordResult<Vec<NodeRef>>;
    async fn notify(&self, peer: &NodeRef, candidate: &NodeRef) -> ChordResult<()>;

    /// Cheapest possible liveness probe: a bare `getSuccessor()` call whose
    /// result is discarded. Used by the stabilizer and by
    /// `closestPrecedingFinger` wherever the spec asks for "any RPC that
    /// returns a value".
    async fn is_alive(&self, peer: &NodeRef) -> bool {
        self.get_successor(peer).await.is_ok()
    }
}

pub fn node_ref_to_wire(n: &NodeRef) -> NodeInfo {
    NodeInfo {
        host: n.host().to_string(),
        port: n.port() as u32,
        id: n.id().to_hex(),
    }
}

pub fn wire_to_node_ref(info: NodeInfo) -> ChordResult<NodeRef> {
    let port: u16 = info
        .port
        .try_into()
        .map_err(|_| ChordError::InvalidRequest(format!("port {} out of range", info.port)))?;
    let id = Id::from_hex(&info.id)
        .map_err(|e| ChordError::InvalidRequest(format!("bad identifier in NodeInfo: {e}")))?;
    Ok(NodeRef::with_id(info.host, port, id))
}

/// One gRPC connection per call, matching the "short-lived per-call clients
/// are also valid" allowance of `spec.md` §5.
#[derive(Clone, Default)]
pub struct GrpcPeerClient;

impl GrpcPeerClient {
    pub fn new() -> Self {
        GrpcPeerClient
    }

    async fn connect(&self, peer: &NodeRef) -> ChordResult<ChordClient<Channel>> {
        let endpoint = Endpoint::from_shared(format!("http://{}", peer.addr()))
            .map_err(|e| ChordError::InvalidRequest(e.to_string()))?
            .timeout(RPC_TIMEOUT)
            .connect_timeout(RPC_TIMEOUT);

        endpoint.connect().await.map_err(|e| ChordError::PeerUnreachable {
            addr: peer.addr(),
            source: Status::unavailable(e.to_string()),
        })
    }

    fn unreachable(peer: &NodeRef, source: Status) -> ChordError {
        ChordError::PeerUnreachable {
            addr: peer.addr(),
            source,
        }
    }
}

#[async_trait]
impl PeerClient for GrpcPeerClient {
    async fn get_successor(&self, peer: &NodeRef) -> ChordResult<NodeRef> {
        let mut client = self.connect(peer).await?;
        let response = client
            .get_successor(Request::new(Empty {}))
            .await
            .map_err(|e| Self::unreachable(peer, e))?;
        wire_to_node_ref(response.into_inner())
    }

    async fn get_predecessor(&self, peer: &NodeRef) -> ChordResult<Option<NodeRef>> {
        let mut client = self.connect(peer).await?;
        match client.get_predecessor(Request::new(Empty {})).await {
            Ok(response) => Ok(Some(wire_to_node_ref(response.into_inner())?)),
            Err(status) if status.code() == tonic::Code::NotFound => Ok(None),
            Err(status) => Err(Self::unreachable(peer, status)),
        }
    }

    async fn find_successor(
        &self,
        peer: &NodeRef,
        target: Id,
        hops: u32,
    ) -> ChordResult<(u32, NodeRef)> {
        let mut client = self.connect(peer).await?;
        let request = Request::new(FindSuccessorRequest {
            id: target.to_hex(),
            hops,
        });
        let response = client
            .find_successor(request)
            .await
            .map_err(|e| Self::unreachable(peer, e))?
            .into_inner();

        let successor = response
            .successor
            .ok_or_else(|| ChordError::InvalidRequest("find_successor response missing node".into()))?;
        Ok((response.hops, wire_to_node_ref(successor)?))
    }

    async fn get_successors(&self, peer: &NodeRef) -> ChordResult<Vec<NodeRef>> {
        let mut client = self.connect(peer).await?;
        let response = client
            .get_successors(Request::new(Empty {}))
            .await
            .map_err(|e| Self::unreachable(peer, e))?
            .into_inner();

        response
            .successors
            .into_iter()
            .map(wire_to_node_ref)
            .collect()
    }

    async fn notify(&self, peer: &NodeRef, candidate: &NodeRef) -> ChordResult<()> {
        let mut client = self.connect(peer).await?;
        client
            .notify(Request::new(node_ref_to_wire(candidate)))
            .await
            .map_err(|e| Self::unreachable(peer, e))?;
        Ok(())
    }
}
