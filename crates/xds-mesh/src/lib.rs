//! # xds-mesh
//!
//! Keeps an Envoy proxy's configuration in step with a model-serving
//! scheduler.
//!
//! - [`XdsCache`] - desired listeners, routes, clusters and secrets, with
//!   route-to-cluster reference counting
//! - [`builders`] - turn the cache's records into Envoy messages: weighted
//!   clusters, sticky-session routes, mirrors, TLS transport sockets
//! - [`IncrementalProcessor`] - debounces store events, rebuilds affected
//!   routes and publishes one validated snapshot per batch
//! - [`ModelStore`], [`PipelineStore`], [`ExperimentStore`] - what the
//!   processor needs from the scheduler, with [`InMemoryStore`] for tests
//! - [`MeshConfig`] - listener, gateway, access-log and TLS settings
//!
//! ## Example
//!
//! ```rust
//! use xds_mesh::{MeshConfig, TrafficSplit, Transport, XdsCache};
//!
//! let mut cache = XdsCache::new(&MeshConfig::default());
//! let (http, grpc) = xds_mesh::names::cluster_names("mlserver", &[0]);
//!
//! cache.add_cluster(&http, "iris", "iris", 1, Transport::Http);
//! cache.add_cluster(&grpc, "iris", "iris", 1, Transport::Grpc);
//! cache.add_endpoint(&http, "mlserver-0.svc", 9000).unwrap();
//! cache.add_endpoint(&grpc, "mlserver-0.svc", 9500).unwrap();
//! cache.add_route_traffic(
//!     "iris",
//!     TrafficSplit {
//!         model_name: "iris".into(),
//!         model_version: 1,
//!         weight: 100,
//!         http_cluster: http,
//!         grpc_cluster: grpc,
//!     },
//!     false,
//!     false,
//! )
//! .unwrap();
//!
//! let snapshot = cache.snapshot("1").unwrap();
//! assert_eq!(snapshot.version(), "1");
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod builders;
mod cache;
mod certs;
mod config;
mod metrics;
mod model;
pub mod names;
mod processor;
mod publisher;
mod store;

pub use cache::{
    XdsCache, DOWNSTREAM_CLIENT_PREFIX, DOWNSTREAM_SERVER_PREFIX, UPSTREAM_CLIENT_PREFIX,
    UPSTREAM_SERVER_PREFIX,
};
pub use certs::{CertificateKeyPair, CertificateProvider, PemFileCertificates, StaticCertificates};
pub use config::{
    EnvoyConfig, ListenerConfig, MeshConfig, PipelineGatewayConfig, SecurityConfig,
    SecurityProtocol,
};
pub use metrics::ProcessorMetrics;
pub use model::{
    Cluster, Endpoint, Listener, PipelineRoute, PipelineTrafficSplit, Route, RouteVersionKey,
    Secret, TrafficSplit, Transport,
};
pub use processor::{
    event_channel, traffic_share, EventSink, IncrementalProcessor, UpdateEvent, EXPERIMENT_ACTIVE,
};
pub use publisher::SnapshotPublisher;
pub use store::{
    Candidate, Experiment, ExperimentKind, ExperimentStatus, ExperimentStore, InMemoryStore,
    Mirror, ModelLock, ModelSnapshot, ModelStore, ModelVersion, Pipeline, PipelineStore,
    ReplicaState, ServerReplica, ServerSnapshot,
};
