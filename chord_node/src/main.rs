use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use log::{info, warn};
use tonic::transport::{Channel, Endpoint, Server};
use tonic::Request;

use chord_node::constants::{DEFAULT_PORT, LOCALHOST};
use chord_node::peer::node_ref_to_wire;
use chord_node::{ChordService, GrpcPeerClient, Node, NodeRef, Stabilizer};

use chord_proto::chord::chord_monitor_client::ChordMonitorClient;
use chord_proto::chord::NodeState;

const MONITOR_REPORT_PERIOD: Duration = Duration::from_secs(3);

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// host:port of an existing ring member to join through. Omit to start
    /// (or be rediscovered as) a new, single-node ring.
    #[arg(short, long)]
    join: Option<String>,

    /// host:port of a chord_monitor instance to report routing state to.
    #[arg(short, long)]
    monitor: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let local = NodeRef::new(LOCALHOST, args.port);
    info!("starting node {local}");

    let node = Node::new(local.clone(), GrpcPeerClient::new());

    if let Some(join_addr) = args.join {
        let (host, port) = split_host_port(&join_addr)?;
        let seed = NodeRef::new(&host, port);
        if node.join(seed.clone()).await {
            info!("joined ring via {seed}");
        } else {
            info!("join via {seed} failed, starting standalone");
        }
    }

    let stabilizer = Stabilizer::new(node.clone());
    stabilizer.start();

    if let Some(monitor_addr) = args.monitor {
        tokio::spawn(report_to_monitor(node.clone(), monitor_addr));
    }

    let addr: SocketAddr = format!("{LOCALHOST}:{}", args.port).parse()?;
    info!("listening on {addr}");

    let service = ChordService::new(node.clone());

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutting down, notifying neighbors");
        node.depart().await;
    };

    Server::builder()
        .add_service(chord_proto::chord::chord_server::ChordServer::new(service))
        .serve_with_shutdown(addr, shutdown)
        .await?;

    stabilizer.stop();
    Ok(())
}

fn split_host_port(addr: &str) -> anyhow::Result<(String, u16)> {
    let (host, port) = addr
        .rsplit_once(':')
        .ok_or_else(|| anyhow::anyhow!("expected host:port, got {addr:?}"))?;
    Ok((host.to_string(), port.parse()?))
}

/// Periodically pushes a routing-state snapshot to `chord_monitor`.
/// Best-effort: a monitor that is down or unreachable just means the next
/// tick tries again.
async fn report_to_monitor(node: Node<GrpcPeerClient>, monitor_addr: String) {
    let endpoint = match Endpoint::from_shared(format!("http://{monitor_addr}")) {
        Ok(e) => e.timeout(Duration::from_secs(2)),
        Err(e) => {
            warn!("invalid monitor address {monitor_addr:?}: {e}");
            return;
        }
    };

    let mut ticker = tokio::time::interval(MONITOR_REPORT_PERIOD);
    loop {
        ticker.tick().await;

        let state = NodeState {
            node: Some(node_ref_to_wire(node.local())),
            predecessor: node.routing().predecessor().await.as_ref().map(node_ref_to_wire),
            successors: node.routing().successors().await.iter().map(node_ref_to_wire).collect(),
            finger_table: node
                .routing()
                .finger_table()
                .await
                .iter()
                .map(|f| node_ref_to_wire(&f.successor))
                .collect(),
        };

        if let Err(e) = send_report(&endpoint, state).await {
            warn!("failed to report state to monitor at {monitor_addr}: {e}");
        }
    }
}

async fn send_report(endpoint: &Endpoint, state: NodeState) -> Result<(), tonic::Status> {
    let channel: Channel = endpoint
        .connect()
        .await
        .map_err(|e| tonic::Status::unavailable(e.to_string()))?;
    let mut client = ChordMonitorClient::new(channel);
    client.report_state(Request::new(state)).await?;
    Ok(())
}
