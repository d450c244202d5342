//! The routing state store (`spec.md` §4.2): local identity plus the
//! mutable fields that the stabilizer, the notify handler and lookup engine
//! read and write. Mutation only ever happens through the writer methods
//! below; nothing outside this module touches `Inner` directly, and no
//! writer ever awaits anything other than the lock itself.

use crate::constants::{FINGER_TABLE_SIZE, SUCCESSOR_LIST_SIZE};
use crate::id::Id;
use crate::node_ref::NodeRef;
use tokio::sync::RwLock;

#[derive(Clone, Debug)]
pub struct FingerEntry {
    pub start: Id,
    pub successor: NodeRef,
}

struct Inner {
    seed: NodeRef,
    predecessor: Option<NodeRef>,
    successors: Vec<NodeRef>,
    finger_table: Vec<FingerEntry>,
    next_finger: usize,
    has_rejoin_run: bool,
}

pub struct RoutingState {
    local: NodeRef,
    inner: RwLock<Inner>,
}

impl RoutingState {
    /// Solo-ring initial state: every finger and every successor-cache slot
    /// points at `local`, predecessor is null.
    pub fn new(local: NodeRef) -> Self {
        let finger_table = (0..FINGER_TABLE_SIZE)
            .map(|i| FingerEntry {
                start: local.id().add_power_of_two(i as u32),
                successor: local.clone(),
            })
            .collect();
        let successors = vec![local.clone(); SUCCESSOR_LIST_SIZE];

        RoutingState {
            local: local.clone(),
            inner: RwLock::new(Inner {
                seed: local,
                predecessor: None,
                successors,
                finger_table,
                next_finger: 0,
                has_rejoin_run: false,
            }),
        }
    }

    pub fn local(&self) -> &NodeRef {
        &self.local
    }

    // --- read accessors -----------------------------------------------

    pub async fn successor(&self) -> NodeRef {
        self.inner.read().await.successors[0].clone()
    }

    pub async fn predecessor(&self) -> Option<NodeRef> {
        self.inner.read().await.predecessor.clone()
    }

    pub async fn successors(&self) -> Vec<NodeRef> {
        self.inner.read().await.successors.clone()
    }

    pub async fn finger_table(&self) -> Vec<FingerEntry> {
        self.inner.read().await.finger_table.clone()
    }

    pub async fn finger(&self, i: usize) -> FingerEntry {
        self.inner.read().await.finger_table[i].clone()
    }

    pub async fn seed(&self) -> NodeRef {
        self.inner.read().await.seed.clone()
    }

    pub async fn has_rejoin_run(&self) -> bool {
        self.inner.read().await.has_rejoin_run
    }

    // --- writers --------------------------------------------------------

    /// Stores `n` in successor-cache slot 0. Panics on an invalid `NodeRef` —
    /// per the spec this is an internal invariant violation, a bug, not a
    /// recoverable runtime condition.
    pub async fn set_successor(&self, n: NodeRef) {
        assert!(n.is_valid(), "refusing to set an invalid successor: {n:?}");
        let mut inner = self.inner.write().await;
        inner.successors[0] = n;
    }

    pub async fn set_predecessor(&self, n: Option<NodeRef>) {
        if let Some(ref n) = n {
            assert!(n.is_valid(), "refusing to set an invalid predecessor: {n:?}");
        }
        let mut inner = self.inner.write().await;
        inner.predecessor = n;
    }

    pub async fn replace_finger(&self, i: usize, n: NodeRef) {
        let mut inner = self.inner.write().await;
        inner.finger_table[i].successor = n;
    }

    /// Replaces the whole successor cache, truncating/padding to
    /// `SUCCESSOR_LIST_SIZE` with `local` if the caller supplied fewer.
    pub async fn replace_successors(&self, mut new: Vec<NodeRef>) {
        new.truncate(SUCCESSOR_LIST_SIZE);
        while new.len() < SUCCESSOR_LIST_SIZE {
            new.push(self.local.clone());
        }
        let mut inner = self.inner.write().await;
        inner.successors = new;
    }

    pub async fn set_seed(&self, n: NodeRef) {
        let mut inner = self.inner.write().await;
        inner.seed = n;
    }

    /// Returns the finger index due for a refresh and advances the
    /// round-robin cursor, wrapping at `FINGER_TABLE_SIZE`.
    pub async fn take_next_finger_to_update(&self) -> usize {
        let mut inner = self.inner.write().await;
        if inner.next_finger >= FINGER_TABLE_SIZE {
            inner.next_finger = 0;
        }
        let i = inner.next_finger;
        inner.next_finger += 1;
        i
    }

    /// Flips `has_rejoin_run` to true, returning whether it was already set
    /// (i.e. whether this is the first call since startup).
    pub async fn mark_rejoin_ran(&self) -> bool {
        let mut inner = self.inner.write().await;
        let was_set = inner.has_rejoin_run;
        inner.has_rejoin_run = true;
        was_set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local() -> NodeRef {
        NodeRef::new("127.0.0.1", 5000)
    }

    #[tokio::test]
    async fn solo_ring_points_everything_at_local() {
        let state = RoutingState::new(local());
        assert_eq!(state.successor().await, *state.local());
        assert!(state.predecessor().await.is_none());
        for s in state.successors().await {
            assert_eq!(s, *state.local());
        }
        for f in state.finger_table().await {
            assert_eq!(f.successor, *state.local());
        }
    }

    #[tokio::test]
    async fn finger_starts_match_the_formula() {
        let local_ref = local();
        let state = RoutingState::new(local_ref.clone());
        for (i, f) in state.finger_table().await.iter().enumerate() {
            assert_eq!(f.start, local_ref.id().add_power_of_two(i as u32));
        }
    }

    #[tokio::test]
    async fn next_finger_round_robins() {
        let state = RoutingState::new(local());
        for expected in 0..FINGER_TABLE_SIZE {
            assert_eq!(state.take_next_finger_to_update().await, expected);
        }
        assert_eq!(state.take_next_finger_to_update().await, 0);
    }

    #[tokio::test]
    #[should_panic(expected = "invalid successor")]
    async fn set_successor_rejects_invalid_noderef() {
        let state = RoutingState::new(local());
        state.set_successor(NodeRef::new("", 0)).await;
    }

    #[tokio::test]
    async fn rejoin_flag_flips_once() {
        let state = RoutingState::new(local());
        assert!(!state.has_rejoin_run().await);
        assert!(!state.mark_rejoin_ran().await);
        assert!(state.has_rejoin_run().await);
        assert!(state.mark_rejoin_ran().await);
    }
}
