//! # xds-cache
//!
//! Snapshot storage for the mesh control plane.
//!
//! - [`Snapshot`] - immutable, versioned set of clusters, routes, listeners and secrets
//! - [`ShardedCache`] - DashMap-based store of the published snapshot per proxy node
//! - [`Watch`] - subscription to snapshots published for a node
//!
//! A snapshot is validated before it is stored: every resource it
//! references must be part of it, so a proxy never sees a route pointing at
//! a cluster it was not sent.
//!
//! ## Example
//!
//! ```rust
//! use xds_cache::{Cache, ShardedCache, Snapshot};
//! use xds_core::{NodeHash, TypeUrl};
//!
//! let cache = ShardedCache::new();
//! let node = NodeHash::from_id("seldon-mesh");
//!
//! let snapshot = Snapshot::builder()
//!     .version("1")
//!     .resources(TypeUrl::CLUSTER, vec![])
//!     .build();
//!
//! cache.set_snapshot(node, snapshot).unwrap();
//! assert_eq!(cache.version(node).as_deref(), Some("1"));
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod snapshot;
mod stats;
mod watch;

pub use cache::{Cache, ShardedCache};
pub use snapshot::{SharedSnapshot, Snapshot, SnapshotBuilder, SnapshotResources};
pub use stats::CacheStats;
pub use watch::{Watch, WatchId, WatchManager};
