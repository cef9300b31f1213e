//! The scheduling store seen from the control plane.
//!
//! The store owns models, servers, pipelines and experiments and decides
//! which replicas run what. The processor reads snapshots of that state,
//! holds a per-model lock while it rebuilds a model's routes and reports
//! replica states back. [`InMemoryStore`] implements every trait for tests
//! and local runs.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::{Condvar, Mutex, PoisonError};

use dashmap::DashMap;
use tracing::debug;
use xds_core::{XdsError, XdsResult};

/// Lifecycle state of one model version on one server replica.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ReplicaState {
    /// No state recorded.
    #[default]
    Unknown,
    /// Load asked of the server.
    LoadRequested,
    /// Server is loading.
    Loading,
    /// Loaded, not yet routed.
    Loaded,
    /// Load failed.
    LoadFailed,
    /// Waiting for the proxy to stop routing before unloading.
    UnloadEnvoyRequested,
    /// Unload asked of the server.
    UnloadRequested,
    /// Server is unloading.
    Unloading,
    /// Unloaded.
    Unloaded,
    /// Unload failed.
    UnloadFailed,
    /// Loaded and routed.
    Available,
    /// Loaded but the proxy could not be updated.
    LoadedUnavailable,
    /// Being drained before removal.
    Draining,
}

impl ReplicaState {
    /// Whether the proxy may send this replica traffic.
    #[must_use]
    pub fn can_receive_traffic(self) -> bool {
        matches!(
            self,
            Self::Loaded | Self::Available | Self::LoadedUnavailable | Self::Draining
        )
    }
}

impl fmt::Display for ReplicaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One version of a model as scheduled.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModelVersion {
    /// Version number.
    pub version: u32,
    /// Server the version is scheduled on.
    pub server: String,
    /// Replica index to state.
    pub replicas: BTreeMap<usize, ReplicaState>,
    /// The version has been available to callers.
    pub available: bool,
    /// Tag responses for payload logging.
    pub log_payloads: bool,
}

impl ModelVersion {
    /// A version on `server` with no replicas.
    pub fn new(version: u32, server: impl Into<String>) -> Self {
        Self {
            version,
            server: server.into(),
            ..Default::default()
        }
    }

    /// Set a replica's state.
    #[must_use]
    pub fn with_replica(mut self, index: usize, state: ReplicaState) -> Self {
        self.replicas.insert(index, state);
        self
    }

    /// Mark the version available.
    #[must_use]
    pub fn with_available(mut self, available: bool) -> Self {
        self.available = available;
        self
    }

    /// Replicas that should receive traffic, in index order.
    ///
    /// Draining replicas are used only when nothing else is loaded.
    pub fn assignment(&self) -> Vec<usize> {
        let live: Vec<usize> = self
            .replicas
            .iter()
            .filter(|(_, s)| {
                matches!(
                    s,
                    ReplicaState::Loaded | ReplicaState::Available | ReplicaState::LoadedUnavailable
                )
            })
            .map(|(i, _)| *i)
            .collect();
        if live.is_empty() {
            self.replicas_in_state(ReplicaState::Draining)
        } else {
            live
        }
    }

    /// Replicas currently in `state`.
    pub fn replicas_in_state(&self, state: ReplicaState) -> Vec<usize> {
        self.replicas
            .iter()
            .filter(|(_, s)| **s == state)
            .map(|(i, _)| *i)
            .collect()
    }

    /// State of a replica, `Unknown` if it has none.
    #[must_use]
    pub fn replica_state(&self, index: usize) -> ReplicaState {
        self.replicas.get(&index).copied().unwrap_or_default()
    }

    /// Whether any replica can receive traffic.
    #[must_use]
    pub fn has_live_replicas(&self) -> bool {
        self.replicas.values().any(|s| s.can_receive_traffic())
    }
}

/// A model and its versions, oldest first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModelSnapshot {
    /// Model name.
    pub name: String,
    /// Versions, oldest first.
    pub versions: Vec<ModelVersion>,
    /// Marked for deletion.
    pub deleted: bool,
}

impl ModelSnapshot {
    /// A model with the given versions.
    pub fn new(name: impl Into<String>, versions: Vec<ModelVersion>) -> Self {
        Self {
            name: name.into(),
            versions,
            deleted: false,
        }
    }

    /// The newest version.
    #[must_use]
    pub fn latest(&self) -> Option<&ModelVersion> {
        self.versions.last()
    }

    /// The newest version that has been available.
    #[must_use]
    pub fn last_available(&self) -> Option<&ModelVersion> {
        self.versions.iter().rev().find(|v| v.available)
    }

    /// A specific version.
    #[must_use]
    pub fn version(&self, version: u32) -> Option<&ModelVersion> {
        self.versions.iter().find(|v| v.version == version)
    }

    /// Whether any version of the model can take traffic.
    #[must_use]
    pub fn can_receive_traffic(&self) -> bool {
        self.last_available().is_some() || self.latest().is_some_and(ModelVersion::has_live_replicas)
    }
}

/// Network location of one server replica.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerReplica {
    /// Inference service host.
    pub inference_svc: String,
    /// REST port.
    pub http_port: u32,
    /// gRPC port.
    pub grpc_port: u32,
}

impl ServerReplica {
    /// Create a replica.
    pub fn new(inference_svc: impl Into<String>, http_port: u32, grpc_port: u32) -> Self {
        Self {
            inference_svc: inference_svc.into(),
            http_port,
            grpc_port,
        }
    }
}

/// A server and its replicas by index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ServerSnapshot {
    /// Server name.
    pub name: String,
    /// Replicas by index.
    pub replicas: BTreeMap<usize, ServerReplica>,
}

impl ServerSnapshot {
    /// A server with no replicas.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            replicas: BTreeMap::new(),
        }
    }

    /// Add a replica.
    #[must_use]
    pub fn with_replica(mut self, index: usize, replica: ServerReplica) -> Self {
        self.replicas.insert(index, replica);
        self
    }
}

/// A pipeline, served through the pipeline gateway.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pipeline {
    /// Pipeline name.
    pub name: String,
    /// Marked for deletion.
    pub deleted: bool,
}

/// What an experiment splits traffic between.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExperimentKind {
    /// Model versions.
    #[default]
    Model,
    /// Pipelines.
    Pipeline,
}

/// A weighted experiment candidate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    /// Model or pipeline name.
    pub name: String,
    /// Percentage of traffic.
    pub weight: u32,
}

/// Mirrored experiment traffic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mirror {
    /// Model or pipeline name.
    pub name: String,
    /// Percentage of requests to copy.
    pub percent: u32,
}

/// A traffic-split experiment.
///
/// With a `default` the experiment takes over that model's or pipeline's
/// own route; otherwise it is served on `{name}.experiment`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Experiment {
    /// Experiment name.
    pub name: String,
    /// Models or pipelines.
    pub kind: ExperimentKind,
    /// Baseline whose route the experiment replaces.
    pub default: Option<String>,
    /// Weighted candidates.
    pub candidates: Vec<Candidate>,
    /// Mirror target.
    pub mirror: Option<Mirror>,
    /// Marked for deletion.
    pub deleted: bool,
}

/// Model and server state.
pub trait ModelStore: Send + Sync {
    /// Model by name, `None` if the store has never heard of it.
    fn get_model(&self, name: &str) -> XdsResult<Option<ModelSnapshot>>;

    /// Server by name.
    fn get_server(&self, name: &str) -> XdsResult<ServerSnapshot>;

    /// Block until the model's lock is held.
    fn lock_model(&self, name: &str);

    /// Release the model's lock.
    fn unlock_model(&self, name: &str);

    /// Move a replica from `expected` to `desired`.
    #[allow(clippy::too_many_arguments)]
    fn update_model_state(
        &self,
        model: &str,
        version: u32,
        server: &str,
        replica: usize,
        expected: ReplicaState,
        desired: ReplicaState,
        reason: &str,
    ) -> XdsResult<()>;
}

/// Pipeline state.
pub trait PipelineStore: Send + Sync {
    /// Pipeline by name.
    fn get_pipeline(&self, name: &str) -> XdsResult<Option<Pipeline>>;
}

/// Experiment state.
pub trait ExperimentStore: Send + Sync {
    /// Experiment by name.
    fn get_experiment(&self, name: &str) -> XdsResult<Option<Experiment>>;

    /// Active model experiment whose default is `model`.
    fn experiment_for_baseline_model(&self, model: &str) -> Option<Experiment>;

    /// Active pipeline experiment whose default is `pipeline`.
    fn experiment_for_baseline_pipeline(&self, pipeline: &str) -> Option<Experiment>;

    /// Record whether the experiment's routes are in place.
    fn set_status(&self, name: &str, active: bool, reason: &str) -> XdsResult<()>;
}

/// Holds a model's store lock until dropped.
pub struct ModelLock<'a> {
    store: &'a dyn ModelStore,
    name: &'a str,
}

impl<'a> ModelLock<'a> {
    /// Lock `name` in `store`.
    pub fn acquire(store: &'a dyn ModelStore, name: &'a str) -> Self {
        store.lock_model(name);
        Self { store, name }
    }
}

impl Drop for ModelLock<'_> {
    fn drop(&mut self) {
        self.store.unlock_model(self.name);
    }
}

/// Reported state of an experiment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExperimentStatus {
    /// Routes are in place.
    pub active: bool,
    /// Human-readable reason.
    pub reason: String,
}

/// Store kept entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    models: DashMap<String, ModelSnapshot>,
    servers: DashMap<String, ServerSnapshot>,
    pipelines: DashMap<String, Pipeline>,
    experiments: DashMap<String, Experiment>,
    experiment_status: DashMap<String, ExperimentStatus>,
    locked: Mutex<HashSet<String>>,
    unlocked: Condvar,
}

impl InMemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a model.
    pub fn upsert_model(&self, model: ModelSnapshot) {
        self.models.insert(model.name.clone(), model);
    }

    /// Forget a model.
    pub fn remove_model(&self, name: &str) {
        self.models.remove(name);
    }

    /// Insert or replace a server.
    pub fn upsert_server(&self, server: ServerSnapshot) {
        self.servers.insert(server.name.clone(), server);
    }

    /// Forget a server.
    pub fn remove_server(&self, name: &str) {
        self.servers.remove(name);
    }

    /// Insert or replace a pipeline.
    pub fn upsert_pipeline(&self, pipeline: Pipeline) {
        self.pipelines.insert(pipeline.name.clone(), pipeline);
    }

    /// Insert or replace an experiment.
    pub fn upsert_experiment(&self, experiment: Experiment) {
        self.experiments.insert(experiment.name.clone(), experiment);
    }

    /// Current state of a replica.
    #[must_use]
    pub fn replica_state(&self, model: &str, version: u32, replica: usize) -> Option<ReplicaState> {
        let m = self.models.get(model)?;
        m.version(version).map(|v| v.replica_state(replica))
    }

    /// Last reported status of an experiment.
    #[must_use]
    pub fn experiment_status(&self, name: &str) -> Option<ExperimentStatus> {
        self.experiment_status.get(name).map(|s| s.clone())
    }

    fn baseline_experiment(&self, kind: ExperimentKind, baseline: &str) -> Option<Experiment> {
        self.experiments
            .iter()
            .find(|e| e.kind == kind && !e.deleted && e.default.as_deref() == Some(baseline))
            .map(|e| e.value().clone())
    }
}

impl ModelStore for InMemoryStore {
    fn get_model(&self, name: &str) -> XdsResult<Option<ModelSnapshot>> {
        Ok(self.models.get(name).map(|m| m.clone()))
    }

    fn get_server(&self, name: &str) -> XdsResult<ServerSnapshot> {
        self.servers
            .get(name)
            .map(|s| s.clone())
            .ok_or_else(|| XdsError::ServerNotFound {
                server: name.to_string(),
            })
    }

    fn lock_model(&self, name: &str) {
        let mut locked = self.locked.lock().unwrap_or_else(PoisonError::into_inner);
        while locked.contains(name) {
            locked = self
                .unlocked
                .wait(locked)
                .unwrap_or_else(PoisonError::into_inner);
        }
        locked.insert(name.to_string());
    }

    fn unlock_model(&self, name: &str) {
        let mut locked = self.locked.lock().unwrap_or_else(PoisonError::into_inner);
        locked.remove(name);
        self.unlocked.notify_all();
    }

    fn update_model_state(
        &self,
        model: &str,
        version: u32,
        server: &str,
        replica: usize,
        expected: ReplicaState,
        desired: ReplicaState,
        reason: &str,
    ) -> XdsResult<()> {
        let mut entry = self.models.get_mut(model).ok_or_else(|| XdsError::ModelNotFound {
            model: model.to_string(),
        })?;
        let v = entry
            .versions
            .iter_mut()
            .find(|v| v.version == version && v.server == server)
            .ok_or_else(|| {
                XdsError::store(format!("model {model} has no version {version} on {server}"))
            })?;

        let current = v.replicas.get(&replica).copied().unwrap_or_default();
        if current != expected {
            return Err(XdsError::store(format!(
                "replica {server}/{replica} of {model}:{version} is {current}, expected {expected}"
            )));
        }
        debug!(model, version, replica, from = %current, to = %desired, reason, "replica state");
        v.replicas.insert(replica, desired);
        if desired == ReplicaState::Available {
            v.available = true;
        }
        Ok(())
    }
}

impl PipelineStore for InMemoryStore {
    fn get_pipeline(&self, name: &str) -> XdsResult<Option<Pipeline>> {
        Ok(self.pipelines.get(name).map(|p| p.clone()))
    }
}

impl ExperimentStore for InMemoryStore {
    fn get_experiment(&self, name: &str) -> XdsResult<Option<Experiment>> {
        Ok(self.experiments.get(name).map(|e| e.clone()))
    }

    fn experiment_for_baseline_model(&self, model: &str) -> Option<Experiment> {
        self.baseline_experiment(ExperimentKind::Model, model)
    }

    fn experiment_for_baseline_pipeline(&self, pipeline: &str) -> Option<Experiment> {
        self.baseline_experiment(ExperimentKind::Pipeline, pipeline)
    }

    fn set_status(&self, name: &str, active: bool, reason: &str) -> XdsResult<()> {
        self.experiment_status.insert(
            name.to_string(),
            ExperimentStatus {
                active,
                reason: reason.to_string(),
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn assignment_prefers_loaded_over_draining() {
        let v = ModelVersion::new(1, "s")
            .with_replica(2, ReplicaState::Draining)
            .with_replica(0, ReplicaState::Available)
            .with_replica(1, ReplicaState::Loading);
        assert_eq!(v.assignment(), vec![0]);

        let draining = ModelVersion::new(1, "s").with_replica(3, ReplicaState::Draining);
        assert_eq!(draining.assignment(), vec![3]);
        assert!(ModelVersion::new(1, "s").assignment().is_empty());
    }

    #[test]
    fn last_available_and_traffic() {
        let model = ModelSnapshot::new(
            "m",
            vec![
                ModelVersion::new(1, "s")
                    .with_replica(0, ReplicaState::Available)
                    .with_available(true),
                ModelVersion::new(2, "s").with_replica(1, ReplicaState::Loading),
            ],
        );
        assert_eq!(model.latest().unwrap().version, 2);
        assert_eq!(model.last_available().unwrap().version, 1);
        assert!(model.can_receive_traffic());

        let loading = ModelSnapshot::new(
            "m",
            vec![ModelVersion::new(1, "s").with_replica(0, ReplicaState::Loading)],
        );
        assert!(!loading.can_receive_traffic());
    }

    #[test]
    fn update_model_state_checks_expected() {
        let store = InMemoryStore::new();
        store.upsert_model(ModelSnapshot::new(
            "m",
            vec![ModelVersion::new(1, "s").with_replica(0, ReplicaState::Loaded)],
        ));

        assert!(store
            .update_model_state("m", 1, "s", 0, ReplicaState::Loading, ReplicaState::Available, "")
            .is_err());
        store
            .update_model_state("m", 1, "s", 0, ReplicaState::Loaded, ReplicaState::Available, "")
            .unwrap();
        assert_eq!(store.replica_state("m", 1, 0), Some(ReplicaState::Available));
        assert!(store.get_model("m").unwrap().unwrap().versions[0].available);
    }

    #[test]
    fn missing_server_is_not_found() {
        let store = InMemoryStore::new();
        assert!(matches!(
            store.get_server("nope"),
            Err(XdsError::ServerNotFound { .. })
        ));
    }

    #[test]
    fn baseline_experiment_lookup_ignores_deleted() {
        let store = InMemoryStore::new();
        store.upsert_experiment(Experiment {
            name: "ab".to_string(),
            default: Some("m".to_string()),
            ..Default::default()
        });
        assert!(store.experiment_for_baseline_model("m").is_some());
        assert!(store.experiment_for_baseline_pipeline("m").is_none());

        store.upsert_experiment(Experiment {
            name: "ab".to_string(),
            default: Some("m".to_string()),
            deleted: true,
            ..Default::default()
        });
        assert!(store.experiment_for_baseline_model("m").is_none());
    }

    #[test]
    fn model_lock_excludes_other_holders() {
        let store = Arc::new(InMemoryStore::new());
        let guard = ModelLock::acquire(store.as_ref(), "m");

        let contender = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                let _lock = ModelLock::acquire(store.as_ref(), "m");
            })
        };
        std::thread::sleep(Duration::from_millis(20));
        assert!(!contender.is_finished());

        drop(guard);
        contender.join().unwrap();
    }
}
