//! The lookup engine, notify handler and join procedure: the part of the
//! core that decides *what to do*, independent of both the transport
//! (`peer::PeerClient`) and the wire format.

use std::sync::Arc;

use log::{debug, warn};

use crate::constants::{FINGER_TABLE_SIZE, MAX_HOPS, SUCCESSOR_LIST_SIZE};
use crate::error::{ChordError, ChordResult};
use crate::id::{finger_in_range, is_id_in_range, Id};
use crate::node_ref::NodeRef;
use crate::peer::PeerClient;
use crate::routing::RoutingState;

/// A ring peer: routing state plus the capability to call other peers.
/// Generic over the peer-client implementation so tests can substitute a
/// network-free fake; `chord_node`'s binary instantiates this with
/// `peer::GrpcPeerClient`.
#[derive(Clone)]
pub struct Node<C: PeerClient> {
    routing: Arc<RoutingState>,
    client: Arc<C>,
}

impl<C: PeerClient + 'static> Node<C> {
    pub fn new(local: NodeRef, client: C) -> Self {
        Node {
            routing: Arc::new(RoutingState::new(local)),
            client: Arc::new(client),
        }
    }

    pub fn routing(&self) -> &RoutingState {
        &self.routing
    }

    pub fn local(&self) -> &NodeRef {
        self.routing.local()
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Resolves the successor of `target`. Iterative from the caller's point
    /// of view, recursive across the ring: each hop either answers locally or
    /// forwards to a closer peer and returns *that* peer's answer untouched.
    ///
    /// The target identifier is always the one the original caller asked
    /// for — never `local.id()` — which matters: forwarding with the wrong
    /// id would make every lookup resolve to whichever peer answers first
    /// instead of the peer that actually owns `target`.
    pub async fn find_successor(&self, target: Id, hops: u32) -> ChordResult<(u32, NodeRef)> {
        if hops > MAX_HOPS {
            return Err(ChordError::HopLimitExceeded { limit: MAX_HOPS });
        }

        let successor = self.routing.successor().await;
        if is_id_in_range(target, self.local().id(), successor.id()) {
            return Ok((hops, successor));
        }

        let candidate = self.closest_preceding_finger(target).await;
        if candidate == *self.local() {
            // closestPrecedingFinger exhausted every live candidate: answer
            // locally rather than forwarding an RPC to ourselves.
            return Ok((hops, successor));
        }

        debug!(
            "{}: forwarding find_successor({}) to {} (hop {})",
            self.local(),
            target,
            candidate,
            hops + 1
        );
        self.client.find_successor(&candidate, target, hops + 1).await
    }

    /// Highest-to-lowest finger scan for the peer closest to `target` without
    /// passing it, falling back to the successor cache, falling back to
    /// `local`.
    pub async fn closest_preceding_finger(&self, target: Id) -> NodeRef {
        let local = self.local().clone();

        for i in (0..FINGER_TABLE_SIZE).rev() {
            let finger = self.routing.finger(i).await;
            let candidate = finger.successor;
            if candidate == local {
                continue;
            }
            if !finger_in_range(candidate.id(), local.id(), target) {
                continue;
            }
            if self.client.is_alive(&candidate).await {
                return candidate;
            }
        }

        for candidate in self.routing.successors().await {
            if candidate == local {
                continue;
            }
            if !finger_in_range(candidate.id(), local.id(), target) {
                continue;
            }
            if self.client.is_alive(&candidate).await {
                return candidate;
            }
        }

        local
    }

    /// A peer believes it might be our predecessor. Idempotent, safe against
    /// repeated or out-of-order callers.
    pub async fn notify(&self, candidate: NodeRef) {
        if !candidate.is_valid() {
            warn!("{}: ignoring notify from invalid NodeRef {candidate:?}", self.local());
            return;
        }

        let current = self.routing.predecessor().await;
        let should_update = match &current {
            None => true,
            Some(pred) => is_id_in_range(candidate.id(), pred.id(), self.local().id()),
        };

        if should_update {
            debug!("{}: predecessor advances to {}", self.local(), candidate);
            self.routing.set_predecessor(Some(candidate)).await;
        }
    }

    /// Joins the ring through `seed`. Leaves `predecessor` untouched: the
    /// existing predecessor of the new successor learns about us through
    /// `notify`.
    pub async fn join(&self, seed: NodeRef) -> bool {
        self.routing.set_seed(seed.clone()).await;

        if !self.client.is_alive(&seed).await {
            warn!("{}: seed {} is unreachable", self.local(), seed);
            return false;
        }

        match self.client.find_successor(&seed, self.local().id(), 0).await {
            Ok((_, successor)) => {
                self.routing.set_successor(successor.clone()).await;
                debug!("{}: joined via {}, successor is {}", self.local(), seed, successor);
                true
            }
            Err(e) => {
                warn!("{}: join via {} failed: {e}", self.local(), seed);
                false
            }
        }
    }

    /// Best-effort departure: tell the current successor and predecessor
    /// we're leaving. No key handoff — there is no storage layer in this
    /// core.
    pub async fn depart(&self) {
        let successor = self.routing.successor().await;
        let predecessor = self.routing.predecessor().await;

        if successor != *self.local() {
            if let Err(e) = self.client.notify(&successor, self.local()).await {
                warn!("{}: departure notify to successor {successor} failed: {e}", self.local());
            }
        }
        if let Some(pred) = predecessor {
            if pred != *self.local() {
                if let Err(e) = self.client.notify(&pred, self.local()).await {
                    warn!("{}: departure notify to predecessor {pred} failed: {e}", self.local());
                }
            }
        }
    }

    /// Cache-refresh helper shared by the stabilizer (`spec.md` §4.6.3):
    /// `successors[0] = s`, `successors[i] = remote[i-1]` for `i in 1..S`.
    pub(crate) async fn refresh_successor_cache_from(&self, s: &NodeRef) -> ChordResult<()> {
        let remote = self.client.get_successors(s).await?;
        let mut new_successors = Vec::with_capacity(SUCCESSOR_LIST_SIZE);
        new_successors.push(s.clone());
        new_successors.extend(remote.into_iter().take(SUCCESSOR_LIST_SIZE - 1));
        self.routing.replace_successors(new_successors).await;
        Ok(())
    }
}
