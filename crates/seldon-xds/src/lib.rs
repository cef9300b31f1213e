//! # seldon-xds
//!
//! xDS control plane for a model-serving mesh.
//!
//! The scheduler decides which server replicas run which model versions;
//! this library projects those decisions into Envoy configuration
//! (clusters, routes, listeners and TLS secrets) and publishes it as
//! versioned snapshots.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use seldon_xds::prelude::*;
//!
//! # async fn run() -> XdsResult<()> {
//! let config = MeshConfig::from_env()?;
//! let store = Arc::new(InMemoryStore::new());
//! let snapshots = Arc::new(ShardedCache::new());
//!
//! let processor = Arc::new(IncrementalProcessor::new(&config, store, snapshots.clone())?);
//! let (sink, events) = event_channel(config.event_buffer);
//! tokio::spawn(async move { processor.run(events).await });
//!
//! sink.model_updated("iris").await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - `xds-core` - errors, node identity, snapshot versions, the `Resource` trait
//! - `xds-types` - the Envoy v3 messages the mesh emits
//! - `xds-cache` - validated snapshots and the per-node snapshot cache
//! - `xds-mesh` - configuration cache, resource builders and incremental processor
//!
//! This crate re-exports all of them.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub use xds_cache as cache;
pub use xds_core as core;
pub use xds_mesh as mesh;
pub use xds_types as types;

/// Prelude module for convenient imports.
///
/// ```rust
/// use seldon_xds::prelude::*;
/// ```
pub mod prelude {
    pub use xds_core::{
        BoxResource, NodeHash, NodeId, ProtoResource, Resource, ResourceRef, SnapshotVersion,
        TypeUrl, XdsError, XdsResult,
    };

    pub use xds_cache::{Cache, CacheStats, ShardedCache, Snapshot, SnapshotBuilder, Watch, WatchId};

    pub use xds_mesh::{
        event_channel, CertificateProvider, EventSink, Experiment, ExperimentKind,
        ExperimentStore, IncrementalProcessor, InMemoryStore, MeshConfig, ModelSnapshot,
        ModelStore, ModelVersion, PipelineStore, ReplicaState, ServerReplica, ServerSnapshot,
        SnapshotPublisher, UpdateEvent, XdsCache,
    };
}

/// Version information for this crate.
pub mod version {
    /// Crate version.
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");

    /// Minimum supported Rust version.
    pub const MSRV: &str = "1.75";

    /// Get version info as a string.
    pub fn version_string() -> String {
        format!("seldon-xds {VERSION} (MSRV {MSRV})")
    }
}

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use std::sync::Arc;

    #[test]
    fn prelude_imports_work() {
        let cache = ShardedCache::new();
        let node = NodeHash::from_id("seldon-mesh");

        cache
            .set_snapshot(node, Snapshot::builder().version("1").build())
            .unwrap();
        assert_eq!(cache.get_snapshot(node).unwrap().version(), "1");
    }

    #[test]
    fn processor_publishes_listeners_before_any_model() {
        let config = MeshConfig::default();
        let snapshots = Arc::new(ShardedCache::new());
        let processor =
            IncrementalProcessor::new(&config, Arc::new(InMemoryStore::new()), snapshots.clone())
                .unwrap();

        processor.publish().unwrap();

        let snapshot = snapshots.get_snapshot(processor.node()).unwrap();
        assert_eq!(snapshot.get_resources(TypeUrl::LISTENER).unwrap().len(), 2);
        assert_eq!(snapshot.get_resources(TypeUrl::CLUSTER).unwrap().len(), 4);
    }

    #[test]
    fn version_info() {
        assert!(super::version::version_string().contains("seldon-xds"));
    }
}
