//! Snapshot watches.
//!
//! A transport serving proxies subscribes to a node with
//! [`WatchManager::create_watch`] and receives every snapshot published for
//! that node afterwards.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tracing::{debug, trace, warn};
use xds_core::NodeHash;

use crate::Snapshot;

/// Unique identifier for a watch subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(u64);

impl WatchId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the numeric value of this watch ID.
    #[inline]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for WatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "watch-{}", self.0)
    }
}

/// Receiving end of a watch.
#[derive(Debug)]
pub struct Watch {
    id: WatchId,
    node_hash: NodeHash,
    receiver: mpsc::Receiver<Arc<Snapshot>>,
}

impl Watch {
    /// Get the unique identifier for this watch.
    #[inline]
    pub fn id(&self) -> WatchId {
        self.id
    }

    /// Get the node hash this watch is subscribed to.
    #[inline]
    pub fn node_hash(&self) -> NodeHash {
        self.node_hash
    }

    /// Receive the next snapshot.
    ///
    /// Returns `None` once the watch has been cancelled.
    pub async fn recv(&mut self) -> Option<Arc<Snapshot>> {
        self.receiver.recv().await
    }

    /// Take a pending snapshot without waiting.
    pub fn try_recv(&mut self) -> Result<Arc<Snapshot>, mpsc::error::TryRecvError> {
        self.receiver.try_recv()
    }
}

#[derive(Debug, Clone)]
struct WatchSender {
    id: WatchId,
    sender: mpsc::Sender<Arc<Snapshot>>,
}

impl WatchSender {
    /// Offer a snapshot. Returns `false` when the receiver is gone.
    ///
    /// A full channel drops the update; the proxy only ever needs the
    /// newest snapshot and the next publish supersedes it.
    fn offer(&self, snapshot: Arc<Snapshot>) -> bool {
        match self.sender.try_send(snapshot) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                trace!(watch_id = %self.id, "watch channel full, skipping update");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }
}

/// Tracks watches per node and fans snapshots out to them.
#[derive(Debug)]
pub struct WatchManager {
    watches: Mutex<HashMap<NodeHash, Vec<WatchSender>>>,
    channel_buffer: usize,
}

impl Default for WatchManager {
    fn default() -> Self {
        Self::new()
    }
}

impl WatchManager {
    /// Create a new watch manager with default settings.
    pub fn new() -> Self {
        Self::with_buffer_size(16)
    }

    /// Create a new watch manager with a custom channel buffer size.
    pub fn with_buffer_size(buffer_size: usize) -> Self {
        Self {
            watches: Mutex::new(HashMap::new()),
            channel_buffer: buffer_size.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<NodeHash, Vec<WatchSender>>> {
        // The map stays valid even if a holder panicked.
        self.watches.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribe to snapshots for a node.
    pub fn create_watch(&self, node_hash: NodeHash) -> Watch {
        let id = WatchId::next();
        let (sender, receiver) = mpsc::channel(self.channel_buffer);

        self.lock()
            .entry(node_hash)
            .or_default()
            .push(WatchSender { id, sender });

        debug!(watch_id = %id, node = %node_hash, "created watch");

        Watch {
            id,
            node_hash,
            receiver,
        }
    }

    /// Cancel a watch subscription.
    pub fn cancel_watch(&self, watch_id: WatchId) {
        let mut watches = self.lock();
        for senders in watches.values_mut() {
            if let Some(pos) = senders.iter().position(|s| s.id == watch_id) {
                senders.swap_remove(pos);
                debug!(watch_id = %watch_id, "cancelled watch");
                return;
            }
        }

        warn!(watch_id = %watch_id, "attempted to cancel unknown watch");
    }

    /// Send a snapshot to every watch of a node, dropping closed ones.
    ///
    /// Returns the number of watches that were offered the snapshot.
    pub fn notify(&self, node_hash: NodeHash, snapshot: Arc<Snapshot>) -> usize {
        let senders: Vec<WatchSender> = self.lock().get(&node_hash).cloned().unwrap_or_default();
        if senders.is_empty() {
            return 0;
        }

        let closed: Vec<WatchId> = senders
            .iter()
            .filter(|s| !s.offer(Arc::clone(&snapshot)))
            .map(|s| s.id)
            .collect();

        if !closed.is_empty() {
            if let Some(senders) = self.lock().get_mut(&node_hash) {
                senders.retain(|s| !closed.contains(&s.id));
            }
            debug!(count = closed.len(), "removed closed watches");
        }

        let delivered = senders.len() - closed.len();
        trace!(node = %node_hash, watch_count = delivered, "notified watches");
        delivered
    }

    /// Get the number of active watches for a node.
    pub fn watch_count(&self, node_hash: NodeHash) -> usize {
        self.lock().get(&node_hash).map_or(0, Vec::len)
    }

    /// Get the total number of active watches across all nodes.
    pub fn total_watch_count(&self) -> usize {
        self.lock().values().map(Vec::len).sum()
    }
}
