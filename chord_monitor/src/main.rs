//! A read-only operator console (`SPEC_FULL.md` §4.10): nodes push their
//! state to us over gRPC, and we serve the latest snapshot of every node
//! that has reported in over a small HTTP API. No write path back into the
//! ring — that would duplicate the RPCs `chord_client` already exposes.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tonic::{transport::Server, Request, Response, Status};
use tower_http::cors::CorsLayer;
use tracing::info;

use chord_proto::chord::{
    chord_monitor_server::{ChordMonitor, ChordMonitorServer},
    Empty, NodeInfo, NodeState,
};

#[derive(Default)]
struct MonitorState {
    nodes: HashMap<String, NodeState>,
}

type SharedState = Arc<Mutex<MonitorState>>;

struct MonitorService {
    state: SharedState,
}

#[tonic::async_trait]
impl ChordMonitor for MonitorService {
    async fn report_state(&self, request: Request<NodeState>) -> Result<Response<Empty>, Status> {
        let node_state = request.into_inner();
        let key = node_state
            .node
            .as_ref()
            .map(|n| format!("{}:{}", n.host, n.port))
            .ok_or_else(|| Status::invalid_argument("NodeState missing node"))?;

        info!("received state report from {key}");
        self.state.lock().unwrap().nodes.insert(key, node_state);
        Ok(Response::new(Empty {}))
    }
}

#[derive(Serialize, Clone)]
struct NodeInfoDto {
    host: String,
    port: u32,
    id: String,
}

impl From<&NodeInfo> for NodeInfoDto {
    fn from(info: &NodeInfo) -> Self {
        NodeInfoDto {
            host: info.host.clone(),
            port: info.port,
            id: info.id.clone(),
        }
    }
}

#[derive(Serialize, Clone)]
struct NodeStateDto {
    addr: String,
    predecessor: Option<NodeInfoDto>,
    successors: Vec<NodeInfoDto>,
    finger_table: Vec<NodeInfoDto>,
}

impl From<&NodeState> for NodeStateDto {
    fn from(state: &NodeState) -> Self {
        let node = state.node.as_ref();
        NodeStateDto {
            addr: node
                .map(|n| format!("{}:{}", n.host, n.port))
                .unwrap_or_default(),
            predecessor: state.predecessor.as_ref().map(Into::into),
            successors: state.successors.iter().map(Into::into).collect(),
            finger_table: state.finger_table.iter().map(Into::into).collect(),
        }
    }
}

async fn get_state(State(state): State<SharedState>) -> Json<Vec<NodeStateDto>> {
    let state = state.lock().unwrap();
    Json(state.nodes.values().map(Into::into).collect())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let state: SharedState = Arc::new(Mutex::new(MonitorState::default()));

    let grpc_state = state.clone();
    tokio::spawn(async move {
        let addr: SocketAddr = "0.0.0.0:50051".parse().unwrap();
        info!("monitor gRPC listening on {addr}");
        Server::builder()
            .add_service(ChordMonitorServer::new(MonitorService { state: grpc_state }))
            .serve(addr)
            .await
            .expect("monitor gRPC server crashed");
    });

    let app = Router::new()
        .route("/api/state", get(get_state))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    info!("monitor HTTP listening on {addr}");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
