//! Cache trait and ShardedCache implementation.
//!
//! The cache holds the currently published snapshot for each proxy node.
//! [`ShardedCache`] uses `DashMap` so a transport can read snapshots while
//! the processor publishes new ones.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, trace, warn};
use xds_core::{NodeHash, XdsError, XdsResult};

use crate::snapshot::Snapshot;
use crate::stats::CacheStats;
use crate::watch::{Watch, WatchId, WatchManager};

/// Trait for snapshot caches.
pub trait Cache: Send + Sync {
    /// Get the snapshot published for a node.
    fn get_snapshot(&self, node: NodeHash) -> Option<Arc<Snapshot>>;

    /// Validate and publish a snapshot for a node, notifying its watches.
    ///
    /// A snapshot that fails [`Snapshot::validate`] is rejected and the
    /// previously published snapshot stays in place.
    fn set_snapshot(&self, node: NodeHash, snapshot: Snapshot) -> XdsResult<()>;

    /// Clear the snapshot for a node.
    fn clear_snapshot(&self, node: NodeHash);

    /// Get the number of cached snapshots.
    fn snapshot_count(&self) -> usize;
}

/// A concurrent snapshot cache keyed by node.
///
/// `DashMap` references are never held across a watch notification.
#[derive(Debug)]
pub struct ShardedCache {
    snapshots: DashMap<NodeHash, Arc<Snapshot>>,
    watches: WatchManager,
    stats: CacheStats,
}

impl Default for ShardedCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ShardedCache {
    /// Create a new sharded cache with default settings.
    pub fn new() -> Self {
        Self::with_capacity(16)
    }

    /// Create a new sharded cache with a specific initial capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            snapshots: DashMap::with_capacity(capacity),
            watches: WatchManager::new(),
            stats: CacheStats::new(),
        }
    }

    /// Create a cache whose watches buffer up to `buffer` snapshots.
    pub fn with_watch_buffer(buffer: usize) -> Self {
        Self {
            snapshots: DashMap::new(),
            watches: WatchManager::with_buffer_size(buffer),
            stats: CacheStats::new(),
        }
    }

    /// Get the watch manager.
    #[inline]
    pub fn watches(&self) -> &WatchManager {
        &self.watches
    }

    /// Get cache statistics.
    #[inline]
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Subscribe to snapshots published for a node.
    ///
    /// Only snapshots published after this call are delivered; read the
    /// current one with [`Cache::get_snapshot`].
    #[inline]
    pub fn create_watch(&self, node: NodeHash) -> Watch {
        self.watches.create_watch(node)
    }

    /// Cancel a watch.
    #[inline]
    pub fn cancel_watch(&self, watch_id: WatchId) {
        self.watches.cancel_watch(watch_id)
    }

    /// Check if a snapshot exists for a node.
    pub fn has_snapshot(&self, node: NodeHash) -> bool {
        self.snapshots.contains_key(&node)
    }

    /// Version of the snapshot currently published for a node.
    pub fn version(&self, node: NodeHash) -> Option<String> {
        self.snapshots.get(&node).map(|r| r.version().to_string())
    }
}

impl Cache for ShardedCache {
    fn get_snapshot(&self, node: NodeHash) -> Option<Arc<Snapshot>> {
        // Clone the Arc and drop the shard guard immediately.
        let result = self.snapshots.get(&node).map(|r| Arc::clone(&*r));

        if result.is_some() {
            self.stats.record_hit();
            trace!(node = %node, "cache hit");
        } else {
            self.stats.record_miss();
            trace!(node = %node, "cache miss");
        }

        result
    }

    fn set_snapshot(&self, node: NodeHash, snapshot: Snapshot) -> XdsResult<()> {
        if let Err(err) = snapshot.validate() {
            self.stats.record_rejected();
            warn!(node = %node, version = %snapshot.version(), error = %err, "rejected snapshot");
            return Err(err);
        }
        if snapshot.version().is_empty() {
            self.stats.record_rejected();
            return Err(XdsError::InvalidResource {
                type_url: String::new(),
                name: node.to_string(),
                reason: "snapshot version must not be empty".to_string(),
            });
        }

        let snapshot = Arc::new(snapshot);
        self.snapshots.insert(node, Arc::clone(&snapshot));
        self.stats.record_set();

        debug!(
            node = %node,
            version = %snapshot.version(),
            resources = snapshot.total_resources(),
            "set snapshot"
        );

        let delivered = self.watches.notify(node, snapshot);
        self.stats.record_notifications(delivered as u64);
        Ok(())
    }

    fn clear_snapshot(&self, node: NodeHash) {
        if self.snapshots.remove(&node).is_some() {
            self.stats.record_clear();
            debug!(node = %node, "cleared snapshot");
        }
    }

    fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }
}
