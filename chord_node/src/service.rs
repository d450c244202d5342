//! The inbound gRPC adapter: translates `chord_proto::chord::chord_server::Chord`
//! calls into calls on [`Node`], and translates the answers back onto the
//! wire. Kept deliberately thin — all decision-making lives in `node.rs`.

use tonic::{Request, Response, Status};

use chord_proto::chord::chord_server::Chord;
use chord_proto::chord::{
    Empty, FindSuccessorRequest, FindSuccessorResponse, NodeInfo, SuccessorList,
};

use crate::id::Id;
use crate::node::Node;
use crate::peer::{node_ref_to_wire, wire_to_node_ref, PeerClient};

pub struct ChordService<C: PeerClient> {
    node: Node<C>,
}

impl<C: PeerClient + 'static> ChordService<C> {
    pub fn new(node: Node<C>) -> Self {
        ChordService { node }
    }
}

#[tonic::async_trait]
impl<C: PeerClient + 'static> Chord for ChordService<C> {
    async fn get_successor(&self, _request: Request<Empty>) -> Result<Response<NodeInfo>, Status> {
        let successor = self.node.routing().successor().await;
        Ok(Response::new(node_ref_to_wire(&successor)))
    }

    async fn get_predecessor(&self, _request: Request<Empty>) -> Result<Response<NodeInfo>, Status> {
        match self.node.routing().predecessor().await {
            Some(p) => Ok(Response::new(node_ref_to_wire(&p))),
            None => Err(Status::not_found("no predecessor set")),
        }
    }

    async fn find_successor(
        &self,
        request: Request<FindSuccessorRequest>,
    ) -> Result<Response<FindSuccessorResponse>, Status> {
        let req = request.into_inner();
        let target = Id::from_hex(&req.id)
            .map_err(|e| Status::invalid_argument(format!("bad identifier: {e}")))?;

        let (hops, successor) = self
            .node
            .find_successor(target, req.hops)
            .await
            .map_err(|e| Status::internal(e.to_string()))?;

        Ok(Response::new(FindSuccessorResponse {
            hops,
            successor: Some(node_ref_to_wire(&successor)),
        }))
    }

    async fn get_successors(&self, _request: Request<Empty>) -> Result<Response<SuccessorList>, Status> {
        let successors = self.node.routing().successors().await;
        Ok(Response::new(SuccessorList {
            successors: successors.iter().map(node_ref_to_wire).collect(),
        }))
    }

    async fn notify(&self, request: Request<NodeInfo>) -> Result<Response<Empty>, Status> {
        let candidate = wire_to_node_ref(request.into_inner())
            .map_err(|e| Status::invalid_argument(e.to_string()))?;
        self.node.notify(candidate).await;
        Ok(Response::new(Empty {}))
    }
}
