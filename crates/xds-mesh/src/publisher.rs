//! Hand-off of finished snapshots to the data plane.

use xds_cache::{Cache, ShardedCache, Snapshot};
use xds_core::{NodeHash, XdsResult};

/// Delivers snapshots to the transport serving a proxy node.
///
/// A rejected snapshot is reported as an error and never retried
/// verbatim; the next batch builds a new one.
pub trait SnapshotPublisher: Send + Sync {
    /// Publish `snapshot` for `node`.
    fn publish(&self, node: NodeHash, snapshot: Snapshot) -> XdsResult<()>;
}

impl SnapshotPublisher for ShardedCache {
    fn publish(&self, node: NodeHash, snapshot: Snapshot) -> XdsResult<()> {
        self.set_snapshot(node, snapshot)
    }
}

impl<P: SnapshotPublisher + ?Sized> SnapshotPublisher for std::sync::Arc<P> {
    fn publish(&self, node: NodeHash, snapshot: Snapshot) -> XdsResult<()> {
        (**self).publish(node, snapshot)
    }
}
