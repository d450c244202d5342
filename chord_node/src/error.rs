use thiserror::Error;

/// Error taxonomy for the overlay core. Internal invariant violations (a bug,
/// not a runtime condition) are deliberately not a variant here — those fail
/// loudly via `panic!`/`debug_assert!` instead of being threaded through
/// `Result`.
#[derive(Debug, Error)]
pub enum ChordError {
    #[error("peer {addr} unreachable: {source}")]
    PeerUnreachable {
        addr: String,
        #[source]
        source: tonic::Status,
    },

    #[error("ring consistency check failed: no live successor responded")]
    RingInconsistent,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("lookup exceeded hop limit of {limit}")]
    HopLimitExceeded { limit: u32 },
}

pub type ChordResult<T> = Result<T, ChordError>;
