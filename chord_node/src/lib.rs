//! Core Chord ring engine: identifiers, routing state, the lookup/notify/join
//! logic, the periodic stabilizer, and the gRPC bindings that connect them to
//! the wire. The `chord_node` binary (`main.rs`) wires these together into a
//! long-running server; `chord_node`-the-library is what integration tests
//! and `chord_monitor` link against directly.

pub mod constants;
pub mod error;
pub mod id;
pub mod node;
pub mod node_ref;
pub mod peer;
pub mod routing;
pub mod service;
pub mod stabilizer;

pub use node::Node;
pub use node_ref::NodeRef;
pub use peer::{GrpcPeerClient, PeerClient};
pub use service::ChordService;
pub use stabilizer::Stabilizer;
