//! A small RPC driver for poking at a running ring node from the command
//! line: the five `Chord` service methods, one subcommand each.

use clap::{Parser, Subcommand};
use tonic::Request;

use chord_proto::chord::chord_client::ChordClient;
use chord_proto::chord::{Empty, FindSuccessorRequest, NodeInfo};
use chord_node::id::Id;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// host:port of the node to query.
    #[arg(short, long, default_value = "127.0.0.1:5000")]
    node: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask the node for its current successor.
    GetSuccessor,
    /// Ask the node for its current predecessor, if it has one.
    GetPredecessor,
    /// Ask the node for its successor-cache contents.
    GetSuccessors,
    /// Resolve the successor of an identifier. Accepts either a 40-hex-digit
    /// identifier or a host:port, which is hashed the same way a node would.
    FindSuccessor { target: String },
    /// Tell the node that `candidate` believes it might be its predecessor.
    Notify { candidate_host: String, candidate_port: u16 },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut client = ChordClient::connect(format!("http://{}", cli.node)).await?;

    match cli.command {
        Commands::GetSuccessor => {
            let resp = client.get_successor(Request::new(Empty {})).await?;
            print_node("successor", &resp.into_inner());
        }
        Commands::GetPredecessor => match client.get_predecessor(Request::new(Empty {})).await {
            Ok(resp) => print_node("predecessor", &resp.into_inner()),
            Err(status) if status.code() == tonic::Code::NotFound => {
                println!("no predecessor set");
            }
            Err(status) => return Err(status.into()),
        },
        Commands::GetSuccessors => {
            let resp = client.get_successors(Request::new(Empty {})).await?;
            for (i, n) in resp.into_inner().successors.iter().enumerate() {
                print_node(&format!("successors[{i}]"), n);
            }
        }
        Commands::FindSuccessor { target } => {
            let id = parse_target(&target)?;
            let request = Request::new(FindSuccessorRequest { id: id.to_hex(), hops: 0 });
            let resp = client.find_successor(request).await?.into_inner();
            println!("resolved in {} hop(s)", resp.hops);
            if let Some(n) = &resp.successor {
                print_node("successor", n);
            }
        }
        Commands::Notify { candidate_host, candidate_port } => {
            let id = Id::compute(&candidate_host, candidate_port);
            let candidate = NodeInfo {
                host: candidate_host,
                port: candidate_port as u32,
                id: id.to_hex(),
            };
            client.notify(Request::new(candidate)).await?;
            println!("notified");
        }
    }

    Ok(())
}

fn parse_target(s: &str) -> anyhow::Result<Id> {
    if let Ok(id) = Id::from_hex(s) {
        return Ok(id);
    }
    let (host, port) = s
        .rsplit_once(':')
        .ok_or_else(|| anyhow::anyhow!("expected a 40-hex-digit id or host:port, got {s:?}"))?;
    Ok(Id::compute(host, port.parse()?))
}

fn print_node(label: &str, n: &NodeInfo) {
    println!("{label}: {}:{} #{}", n.host, n.port, n.id);
}
