//! Shared fixtures.

use std::sync::Arc;

use seldon_xds::cache::SnapshotResources;
use seldon_xds::mesh::ModelLock;
use seldon_xds::prelude::*;
use seldon_xds::types::envoy::config::route::v3::RouteConfiguration;

/// Store, snapshot cache and processor for one proxy node.
pub struct Mesh {
    pub store: Arc<InMemoryStore>,
    pub snapshots: Arc<ShardedCache>,
    pub processor: Arc<IncrementalProcessor>,
}

impl Mesh {
    /// A mesh with server `mlserver` of `replicas` replicas.
    pub fn new(replicas: usize) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let mut server = ServerSnapshot::new("mlserver");
        for i in 0..replicas {
            server = server.with_replica(
                i,
                ServerReplica::new(format!("mlserver-{i}.seldon.svc"), 9000, 9500),
            );
        }
        store.upsert_server(server);

        let snapshots = Arc::new(ShardedCache::new());
        let processor = IncrementalProcessor::new(
            &MeshConfig::default(),
            Arc::clone(&store),
            snapshots.clone(),
        )
        .unwrap();

        Self {
            store,
            snapshots,
            processor: Arc::new(processor),
        }
    }

    /// The snapshot currently published for the processor's node.
    pub fn published(&self) -> Arc<Snapshot> {
        self.snapshots.get_snapshot(self.processor.node()).unwrap()
    }

    /// Report a model replica loaded, as an agent would.
    pub fn load(&self, model: &str, version: u32, replicas: &[usize]) {
        let _lock = ModelLock::acquire(self.store.as_ref(), model);
        let mut snapshot = self
            .store
            .get_model(model)
            .unwrap()
            .unwrap_or_else(|| ModelSnapshot::new(model, vec![]));
        if snapshot.version(version).is_none() {
            snapshot.versions.push(ModelVersion::new(version, "mlserver"));
        }
        let v = snapshot
            .versions
            .iter_mut()
            .find(|v| v.version == version)
            .unwrap();
        for r in replicas {
            v.replicas.insert(*r, ReplicaState::Loaded);
        }
        self.store.upsert_model(snapshot);
    }
}

/// The primary route configuration of a snapshot.
pub fn primary_routes(snapshot: &Snapshot) -> RouteConfiguration {
    route_config(snapshot.get_resources(TypeUrl::ROUTE).unwrap(), "listener_0")
}

/// The mirror route configuration of a snapshot.
pub fn mirror_routes(snapshot: &Snapshot) -> RouteConfiguration {
    route_config(snapshot.get_resources(TypeUrl::ROUTE).unwrap(), "listener_1")
}

fn route_config(resources: &SnapshotResources, name: &str) -> RouteConfiguration {
    resources
        .get(name)
        .unwrap()
        .as_any()
        .downcast_ref::<ProtoResource<RouteConfiguration>>()
        .unwrap()
        .message()
        .clone()
}

/// Names of the routes in a route configuration's only virtual host.
pub fn route_names(config: &RouteConfiguration) -> Vec<String> {
    config.virtual_hosts[0]
        .routes
        .iter()
        .map(|r| r.name.clone())
        .collect()
}
