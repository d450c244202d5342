//! The four periodic maintenance tasks (`spec.md` §4.6). Each task is a
//! single sequential loop around a `tokio::time::interval`, which is what
//! gives "serialization with itself": the next tick can't start running
//! until the previous tick's body has returned.

use std::sync::Mutex as StdMutex;

use log::{debug, error, warn};
use tokio::task::JoinHandle;
use tokio::time::interval;

use crate::constants::{
    REJOIN_PERIOD, STABILIZE_PREDECESSOR_PERIOD, STABILIZE_SUCCESSOR_PERIOD,
    UPDATE_FINGER_TABLE_PERIOD,
};
use crate::id::is_id_in_range;
use crate::node::Node;
use crate::peer::PeerClient;

pub struct Stabilizer<C: PeerClient> {
    node: Node<C>,
    handles: StdMutex<Vec<JoinHandle<()>>>,
}

impl<C: PeerClient + 'static> Stabilizer<C> {
    pub fn new(node: Node<C>) -> Self {
        Stabilizer {
            node,
            handles: StdMutex::new(Vec::new()),
        }
    }

    /// Launches all four tasks. Stops any previously-started set first, so
    /// calling `start()` twice does not leave duplicate tasks running.
    pub fn start(&self) {
        self.stop();

        let mut handles = Vec::with_capacity(4);
        handles.push(spawn_loop(self.node.clone(), UPDATE_FINGER_TABLE_PERIOD, |n| async move {
            update_finger_table(&n).await;
        }));
        handles.push(spawn_loop(self.node.clone(), STABILIZE_PREDECESSOR_PERIOD, |n| async move {
            stabilize_predecessors(&n).await;
        }));
        handles.push(spawn_loop(self.node.clone(), STABILIZE_SUCCESSOR_PERIOD, |n| async move {
            stabilize_successors(&n).await;
        }));
        handles.push(spawn_loop(self.node.clone(), REJOIN_PERIOD, |n| async move {
            rejoin(&n).await;
        }));

        *self.handles.lock().unwrap() = handles;
    }

    /// Cancels all four tasks. Idempotent.
    pub fn stop(&self) {
        for handle in self.handles.lock().unwrap().drain(..) {
            handle.abort();
        }
    }

    /// Runs one round of `updateFingerTable`, `stabilizePredecessors` and
    /// `stabilizeSuccessors` directly, without waiting on their timers.
    /// Exposed for integration tests that need to drive convergence in a
    /// handful of rounds instead of sleeping out the real periods.
    pub async fn run_once(&self) {
        update_finger_table(&self.node).await;
        stabilize_predecessors(&self.node).await;
        stabilize_successors(&self.node).await;
    }
}

impl<C: PeerClient> Drop for Stabilizer<C> {
    fn drop(&mut self) {
        for handle in self.handles.lock().unwrap().drain(..) {
            handle.abort();
        }
    }
}

fn spawn_loop<C, F, Fut>(node: Node<C>, period: std::time::Duration, body: F) -> JoinHandle<()>
where
    C: PeerClient + 'static,
    F: Fn(Node<C>) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = ()> + Send,
{
    tokio::spawn(async move {
        let mut ticker = interval(period);
        loop {
            ticker.tick().await;
            body(node.clone()).await;
        }
    })
}

/// `updateFingerTable` (`spec.md` §4.6.1).
async fn update_finger_table<C: PeerClient + 'static>(node: &Node<C>) {
    let i = node.routing().take_next_finger_to_update().await;
    let start = node.routing().finger(i).await.start;

    match node.find_successor(start, 0).await {
        Ok((_, successor)) => {
            debug!("{}: finger[{i}] -> {successor}", node.local());
            node.routing().replace_finger(i, successor).await;
        }
        Err(e) => {
            warn!("{}: failed to refresh finger[{i}]: {e}", node.local());
        }
    }
}

/// `stabilizePredecessors` (`spec.md` §4.6.2).
async fn stabilize_predecessors<C: PeerClient + 'static>(node: &Node<C>) {
    let Some(predecessor) = node.routing().predecessor().await else {
        return;
    };

    if !node.client().is_alive(&predecessor).await {
        warn!("{}: predecessor {predecessor} stopped responding", node.local());
        node.routing().set_predecessor(None).await;
    }
}

/// `stabilizeSuccessors` (`spec.md` §4.6.3).
async fn stabilize_successors<C: PeerClient + 'static>(node: &Node<C>) {
    let successor = node.routing().successor().await;

    match node.client().get_predecessor(&successor).await {
        Ok(Some(x)) => {
            let adopted = if is_id_in_range(x.id(), node.local().id(), successor.id()) {
                node.routing().set_successor(x.clone()).await;
                x
            } else {
                successor
            };

            if let Err(e) = node.client().notify(&adopted, node.local()).await {
                debug!("{}: notify to successor {adopted} failed: {e}", node.local());
            }
            if let Err(e) = node.refresh_successor_cache_from(&adopted).await {
                warn!("{}: failed to refresh successor cache from {adopted}: {e}", node.local());
            }
        }
        Ok(None) => {
            if let Err(e) = node.client().notify(&successor, node.local()).await {
                debug!("{}: notify to successor {successor} failed: {e}", node.local());
            }
            if let Err(e) = node.refresh_successor_cache_from(&successor).await {
                warn!("{}: failed to refresh successor cache from {successor}: {e}", node.local());
            }
        }
        Err(_) => {
            recover_from_dead_successor(node).await;
        }
    }
}

async fn recover_from_dead_successor<C: PeerClient + 'static>(node: &Node<C>) {
    for candidate in node.routing().successors().await {
        if candidate == *node.local() {
            continue;
        }
        if !node.client().is_alive(&candidate).await {
            continue;
        }

        node.routing().set_successor(candidate.clone()).await;
        if let Err(e) = node.client().notify(&candidate, node.local()).await {
            debug!("{}: notify to new successor {candidate} failed: {e}", node.local());
        }
        if let Err(e) = node.refresh_successor_cache_from(&candidate).await {
            warn!("{}: failed to refresh successor cache from {candidate}: {e}", node.local());
        }
        return;
    }

    error!("{}: ring consistency error, no live successor in cache", node.local());
    let seed = node.routing().seed().await;
    node.join(seed).await;
}

/// `reJoin` (`spec.md` §4.6.4). The first tick after startup is a grace
/// period: it only flips `hasReJoinRun` and returns.
async fn rejoin<C: PeerClient + 'static>(node: &Node<C>) {
    if !node.routing().mark_rejoin_ran().await {
        return;
    }

    let seed = node.routing().seed().await;
    let (_, seed_successor) = match node.find_successor(seed.id(), 0).await {
        Ok(result) => result,
        Err(e) => {
            warn!("{}: reJoin lookup of seed failed: {e}", node.local());
            return;
        }
    };

    if seed_successor.id() == seed.id() {
        // The seed is still reachable through the ring; nothing to do.
        return;
    }

    if node.client().is_alive(&seed).await {
        error!(
            "{}: ring appears partitioned from seed {seed}, rejoining",
            node.local()
        );
        node.join(seed).await;
    }
}
