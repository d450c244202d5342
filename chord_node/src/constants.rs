use std::time::Duration;

use crate::id::BITS;

/// `M` — number of entries in the finger table, one per bit of the
/// identifier space.
pub const FINGER_TABLE_SIZE: usize = BITS;

/// `S` — number of entries kept in the successor cache.
pub const SUCCESSOR_LIST_SIZE: usize = 3;

/// Safety ceiling on recursive `FindSuccessor` hops (`2 * M`).
pub const MAX_HOPS: u32 = 2 * FINGER_TABLE_SIZE as u32;

/// Per-RPC timeout: an unresponsive peer past this is treated as dead.
pub const RPC_TIMEOUT: Duration = Duration::from_secs(2);

pub const UPDATE_FINGER_TABLE_PERIOD: Duration = Duration::from_secs(1);
pub const STABILIZE_PREDECESSOR_PERIOD: Duration = Duration::from_secs(5);
pub const STABILIZE_SUCCESSOR_PERIOD: Duration = Duration::from_secs(5);
pub const REJOIN_PERIOD: Duration = Duration::from_secs(30);

pub const DEFAULT_PORT: u16 = 5000;
pub const LOCALHOST: &str = "127.0.0.1";
