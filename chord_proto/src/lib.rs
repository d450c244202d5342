//! Generated wire types and the `Chord`/`ChordMonitor` gRPC service
//! contracts. This crate carries no ring logic — see `chord_node` for the
//! identifier algebra, routing state and stabilizer that sit behind it.

pub mod chord {
    tonic::include_proto!("chord");
}
