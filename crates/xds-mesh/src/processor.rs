//! Incremental processor: scheduling events in, versioned snapshots out.
//!
//! Update events are coalesced into a pending set. When the batch window
//! expires every pending key is resolved against the store, its routes and
//! clusters are rebuilt in the [`XdsCache`], and one validated snapshot is
//! published for the whole batch. Replica states are then reported back to
//! the store: `Available` when the snapshot went out, `LoadedUnavailable`
//! with the failure reason when it did not.
//!
//! A batch that fails to publish keeps its keys pending and is retried
//! after another batch window. Rebuilding a key always starts by removing
//! its route, so retries never double-apply traffic.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use xds_cache::ShardedCache;
//! use xds_mesh::{event_channel, IncrementalProcessor, InMemoryStore, MeshConfig};
//!
//! # async fn run() -> xds_core::XdsResult<()> {
//! let config = MeshConfig::from_env()?;
//! let store = Arc::new(InMemoryStore::new());
//! let snapshots = Arc::new(ShardedCache::new());
//!
//! let processor = Arc::new(IncrementalProcessor::new(&config, store, snapshots)?);
//! let (sink, events) = event_channel(config.event_buffer);
//! let worker = tokio::spawn({
//!     let processor = Arc::clone(&processor);
//!     async move { processor.run(events).await }
//! });
//!
//! sink.model_updated("iris").await?;
//! drop(sink);
//! worker.await.ok();
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::time;
use tracing::{debug, error, info, warn};
use xds_core::{NodeHash, NodeId, SnapshotVersion, XdsError, XdsResult};

use crate::cache::XdsCache;
use crate::config::MeshConfig;
use crate::metrics::ProcessorMetrics;
use crate::model::{Endpoint, PipelineTrafficSplit, TrafficSplit, Transport};
use crate::names::{cluster_names, experiment_route_name, pipeline_route_name};
use crate::publisher::SnapshotPublisher;
use crate::store::{
    Experiment, ExperimentKind, ExperimentStore, ModelLock, ModelSnapshot, ModelStore,
    ModelVersion, PipelineStore, ReplicaState, ServerSnapshot,
};

/// Status reported for an experiment whose routes are in place.
pub const EXPERIMENT_ACTIVE: &str = "experiment active";

/// Something in the store changed.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UpdateEvent {
    /// A model, its versions or its replicas changed.
    Model(String),
    /// A pipeline was created, changed or deleted.
    Pipeline(String),
    /// An experiment was created, changed or deleted.
    Experiment(String),
}

impl UpdateEvent {
    /// Name of the model, pipeline or experiment.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Model(name) | Self::Pipeline(name) | Self::Experiment(name) => name,
        }
    }

    /// Event kind, used as a metrics label.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Model(_) => "model",
            Self::Pipeline(_) => "pipeline",
            Self::Experiment(_) => "experiment",
        }
    }
}

impl fmt::Display for UpdateEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind(), self.name())
    }
}

/// Sending half of the event channel, handed to the store.
///
/// Dropping every sink stops [`IncrementalProcessor::run`] once pending
/// work is flushed.
#[derive(Clone, Debug)]
pub struct EventSink {
    tx: mpsc::Sender<UpdateEvent>,
}

impl EventSink {
    /// Deliver an event, waiting for channel capacity.
    pub async fn notify(&self, event: UpdateEvent) -> XdsResult<()> {
        self.tx.send(event).await.map_err(|_| XdsError::Shutdown)
    }

    /// Deliver an event without waiting.
    pub fn try_notify(&self, event: UpdateEvent) -> XdsResult<()> {
        self.tx.try_send(event).map_err(|err| match err {
            mpsc::error::TrySendError::Full(event) => XdsError::Backpressure {
                message: format!("event channel full, dropped {event}"),
            },
            mpsc::error::TrySendError::Closed(_) => XdsError::Shutdown,
        })
    }

    /// A model changed.
    pub async fn model_updated(&self, model: impl Into<String>) -> XdsResult<()> {
        self.notify(UpdateEvent::Model(model.into())).await
    }

    /// A pipeline changed.
    pub async fn pipeline_updated(&self, pipeline: impl Into<String>) -> XdsResult<()> {
        self.notify(UpdateEvent::Pipeline(pipeline.into())).await
    }

    /// An experiment changed.
    pub async fn experiment_updated(&self, experiment: impl Into<String>) -> XdsResult<()> {
        self.notify(UpdateEvent::Experiment(experiment.into())).await
    }

    /// Force a model to be rebuilt in the next batch.
    pub async fn sync(&self, model: impl Into<String>) -> XdsResult<()> {
        self.model_updated(model).await
    }
}

/// A bounded event channel.
#[must_use]
pub fn event_channel(capacity: usize) -> (EventSink, mpsc::Receiver<UpdateEvent>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (EventSink { tx }, rx)
}

/// Split `weight` between the latest and the last available version in
/// proportion to their live replicas. Returns `(latest, last_available)`.
///
/// ```rust
/// assert_eq!(xds_mesh::traffic_share(3, 1, 100), (75, 25));
/// assert_eq!(xds_mesh::traffic_share(0, 0, 100), (100, 0));
/// ```
#[must_use]
pub fn traffic_share(latest_replicas: usize, last_replicas: usize, weight: u32) -> (u32, u32) {
    let total = latest_replicas + last_replicas;
    if total == 0 {
        return (weight, 0);
    }
    let last = (last_replicas as u64 * u64::from(weight)) / total as u64;
    let last = u32::try_from(last).unwrap_or(weight);
    (weight - last, last)
}

struct State {
    cache: XdsCache,
    version: SnapshotVersion,
    pending: BTreeSet<UpdateEvent>,
}

/// What a batch touched, reported once it is published or has failed.
#[derive(Default)]
struct Batch {
    models: BTreeSet<(String, u32)>,
    experiments: Vec<(String, Result<(), String>)>,
}

/// Keeps one proxy node's configuration in step with the store.
pub struct IncrementalProcessor {
    node: NodeId,
    batch_wait: Duration,
    models: Arc<dyn ModelStore>,
    pipelines: Arc<dyn PipelineStore>,
    experiments: Arc<dyn ExperimentStore>,
    publisher: Arc<dyn SnapshotPublisher>,
    metrics: ProcessorMetrics,
    state: Mutex<State>,
}

impl fmt::Debug for IncrementalProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IncrementalProcessor")
            .field("node", &self.node)
            .field("batch_wait", &self.batch_wait)
            .finish_non_exhaustive()
    }
}

impl IncrementalProcessor {
    /// Validate `config`, set up TLS from the environment and create a
    /// processor backed by `store`.
    pub fn new<S>(
        config: &MeshConfig,
        store: Arc<S>,
        publisher: Arc<dyn SnapshotPublisher>,
    ) -> XdsResult<Self>
    where
        S: ModelStore + PipelineStore + ExperimentStore + 'static,
    {
        config.validate()?;
        let mut cache = XdsCache::new(config);
        cache.setup_tls(&config.security)?;
        Ok(Self::with_cache(config, cache, store, publisher))
    }

    /// Create a processor around an already prepared cache.
    pub fn with_cache<S>(
        config: &MeshConfig,
        cache: XdsCache,
        store: Arc<S>,
        publisher: Arc<dyn SnapshotPublisher>,
    ) -> Self
    where
        S: ModelStore + PipelineStore + ExperimentStore + 'static,
    {
        let models: Arc<dyn ModelStore> = store.clone();
        let pipelines: Arc<dyn PipelineStore> = store.clone();
        let experiments: Arc<dyn ExperimentStore> = store;
        Self {
            node: NodeId::new(config.node_id.clone()),
            batch_wait: config.batch_wait(),
            models,
            pipelines,
            experiments,
            publisher,
            metrics: ProcessorMetrics::new(),
            state: Mutex::new(State {
                cache,
                version: SnapshotVersion::new(),
                pending: BTreeSet::new(),
            }),
        }
    }

    /// Node the snapshots are published for.
    #[inline]
    #[must_use]
    pub fn node(&self) -> NodeHash {
        self.node.hash()
    }

    /// Id of the node the snapshots are published for.
    #[must_use]
    pub fn node_id(&self) -> &str {
        self.node.id()
    }

    /// Processor metrics.
    #[inline]
    pub fn metrics(&self) -> &ProcessorMetrics {
        &self.metrics
    }

    /// Last published snapshot version, `0` before the first publish.
    #[must_use]
    pub fn snapshot_version(&self) -> u64 {
        self.state().version.current()
    }

    /// Keys waiting for the next batch.
    #[must_use]
    pub fn pending(&self) -> Vec<UpdateEvent> {
        self.state().pending.iter().cloned().collect()
    }

    /// Read the configuration cache.
    pub fn inspect<R>(&self, f: impl FnOnce(&XdsCache) -> R) -> R {
        f(&self.state().cache)
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add an event to the pending batch.
    pub fn enqueue(&self, event: UpdateEvent) {
        self.metrics.event_received(event.kind());
        debug!(event = %event, "queued update");
        self.state().pending.insert(event);
    }

    /// Rebuild one model and publish right away.
    pub fn sync(&self, model: &str) -> XdsResult<()> {
        self.enqueue(UpdateEvent::Model(model.to_string()));
        self.flush()
    }

    /// Publish the cache as it stands, without touching pending keys.
    pub fn publish(&self) -> XdsResult<u64> {
        let mut state = self.state();
        self.publish_locked(&mut state)
    }

    /// Re-read certificate material and publish it.
    ///
    /// If any secret cannot be read nothing is published and the previous
    /// material stays in place.
    pub fn rotate_secrets(&self) -> XdsResult<u64> {
        let mut state = self.state();
        state.cache.rotate_secrets()?;
        self.publish_locked(&mut state)
    }

        /// Process every event until the channel closes.
    ///
    /// The current configuration is published first so a proxy that
    /// connects before any model exists still gets its listeners.
    pub async fn run(&self, mut events: mpsc::Receiver<UpdateEvent>) {
        if let Err(err) = self.publish() {
            error!(error = %err, "initial snapshot not published");
        }
        info!(node = %self.node, batch_wait = ?self.batch_wait, "processor started");

        let timer = time::sleep(self.batch_wait);
        tokio::pin!(timer);
        let mut armed = false;

        loop {
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else { break };
                    self.enqueue(event);
                    if !armed {
                        timer.as_mut().reset(time::Instant::now() + self.batch_wait);
                        armed = true;
                    }
                }
                () = &mut timer, if armed => {
                    armed = false;
                    if self.flush().is_err() {
                        timer.as_mut().reset(time::Instant::now() + self.batch_wait);
                        armed = true;
                    }
                }
            }
        }

        if !self.state().pending.is_empty() {
            // Outcome already logged.
            let _ = self.flush();
        }
        info!(node = %self.node, "event channel closed, processor stopped");
    }

    /// Apply every pending key and publish one snapshot for the batch.
    ///
    /// On failure the keys stay pending and the error is returned.
    pub fn flush(&self) -> XdsResult<()> {
        let started = Instant::now();
        let mut guard = self.state();
        let state = &mut *guard;
        if state.pending.is_empty() {
            return Ok(());
        }

        let mut batch = Batch::default();
        for key in &state.pending {
            match key {
                UpdateEvent::Model(name) => {
                    if let Some(version) = self.apply_model(&mut state.cache, name) {
                        batch.models.insert((name.clone(), version));
                    }
                }
                UpdateEvent::Pipeline(name) => self.apply_pipeline(&mut state.cache, name),
                UpdateEvent::Experiment(name) => {
                    self.apply_experiment(&mut state.cache, name, &mut batch);
                }
            }
        }

        let keys = state.pending.len();
        let outcome = self.publish_locked(state);
        match &outcome {
            Ok(version) => {
                state.pending.clear();
                self.metrics.batch_published(keys, started.elapsed(), *version);
                info!(version, keys, "published snapshot");
            }
            Err(err) => {
                self.metrics.batch_failed(keys, started.elapsed());
                error!(error = %err, keys, "snapshot not published, keeping batch pending");
            }
        }
        drop(guard);

        let failure = outcome.as_ref().err().map(ToString::to_string);
        self.report_models(&batch.models, failure.as_deref());
        self.report_experiments(batch.experiments, failure.as_deref());
        outcome.map(|_| ())
    }

    fn publish_locked(&self, state: &mut State) -> XdsResult<u64> {
        let mut next = state.version;
        let version = next.next_version();
        state.cache.verify_references()?;
        let snapshot = state.cache.snapshot(version)?;
        self.publisher.publish(self.node.hash(), snapshot)?;
        state.version = next;

        self.metrics.resources(
            state.cache.cluster_count(),
            state.cache.route_count(),
            state.cache.pipeline_route_count(),
        );
        Ok(next.current())
    }

    /// Rebuild a model's route. Returns the latest version when there is
    /// one to report on.
    fn apply_model(&self, cache: &mut XdsCache, name: &str) -> Option<u32> {
        let _lock = ModelLock::acquire(self.models.as_ref(), name);

        if let Err(err) = cache.remove_route(name) {
            error!(model = %name, error = %err, "failed to remove model route");
            return None;
        }

        let model = match self.models.get_model(name) {
            Ok(Some(model)) => model,
            Ok(None) => {
                debug!(model = %name, "model gone, route removed");
                return None;
            }
            Err(err) => {
                warn!(model = %name, error = %err, "failed to resolve model, route removed");
                return None;
            }
        };
        let latest = model.latest()?.version;

        if let Err(err) = self.route_model(cache, &model) {
            if err.is_resolution_failure() {
                debug!(model = %name, reason = %err, "model not routable");
            } else {
                warn!(model = %name, error = %err, "failed to add model traffic");
            }
            if let Err(err) = cache.remove_route(name) {
                error!(model = %name, error = %err, "failed to remove model route");
            }
        }
        Some(latest)
    }

    fn route_model(&self, cache: &mut XdsCache, model: &ModelSnapshot) -> XdsResult<()> {
        if let Some(experiment) = self.experiments.experiment_for_baseline_model(&model.name) {
            match self.add_baseline_traffic(cache, model, &experiment) {
                Ok(()) => return Ok(()),
                Err(err) => {
                    debug!(
                        model = %model.name,
                        experiment = %experiment.name,
                        reason = %err,
                        "reverting to model traffic only"
                    );
                    cache.remove_route(&model.name)?;
                }
            }
        }
        self.add_model_traffic(cache, &model.name, model, 100, false)?;
        if has_splits(cache, &model.name) {
            Ok(())
        } else {
            Err(XdsError::NoLiveReplica {
                model: model.name.clone(),
                version: model.latest().map_or(0, |v| v.version),
            })
        }
    }

    fn add_baseline_traffic(
        &self,
        cache: &mut XdsCache,
        baseline: &ModelSnapshot,
        experiment: &Experiment,
    ) -> XdsResult<()> {
        check_baseline(experiment, &baseline.name)?;
        info!(model = %baseline.name, experiment = %experiment.name, "routing baseline through experiment");
        self.add_model_candidates(cache, &baseline.name, experiment)
    }

    fn add_model_candidates(
        &self,
        cache: &mut XdsCache,
        route_name: &str,
        experiment: &Experiment,
    ) -> XdsResult<()> {
        let mut unserved = None;
        for candidate in &experiment.candidates {
            let model = self.resolve_model(&candidate.name)?;
            self.add_model_traffic(cache, route_name, &model, candidate.weight, false)?;
            unserved.get_or_insert_with(|| {
                (model.name.clone(), model.latest().map_or(0, |v| v.version))
            });
        }
        if !has_splits(cache, route_name) {
            let (model, version) = unserved.unwrap_or_else(|| (experiment.name.clone(), 0));
            return Err(XdsError::NoLiveReplica { model, version });
        }
        if let Some(mirror) = &experiment.mirror {
            let model = self.resolve_model(&mirror.name)?;
            self.add_model_traffic(cache, route_name, &model, mirror.percent, true)?;
        }
        Ok(())
    }

    fn resolve_model(&self, name: &str) -> XdsResult<ModelSnapshot> {
        self.models
            .get_model(name)?
            .ok_or_else(|| XdsError::ModelNotFound {
                model: name.to_string(),
            })
    }

    /// Send `weight` percent of `route_name` to the model, split between
    /// the latest and the last available version during a rollout.
    fn add_model_traffic(
        &self,
        cache: &mut XdsCache,
        route_name: &str,
        model: &ModelSnapshot,
        weight: u32,
        is_mirror: bool,
    ) -> XdsResult<()> {
        let latest = model
            .latest()
            .filter(|_| model.can_receive_traffic())
            .ok_or_else(|| XdsError::NoLiveReplica {
                model: model.name.clone(),
                version: model.latest().map_or(0, |v| v.version),
            })?;
        let server = self.models.get_server(&latest.server)?;

        match model.last_available().filter(|last| last.version != latest.version) {
            Some(last) => {
                let (latest_weight, last_weight) =
                    traffic_share(latest.assignment().len(), last.assignment().len(), weight);
                let last_server = self.models.get_server(&last.server)?;
                debug!(
                    model = %model.name,
                    latest = latest.version,
                    latest_weight,
                    last_available = last.version,
                    last_weight,
                    "splitting traffic during rollout"
                );
                let name = &model.name;
                add_version_traffic(cache, route_name, name, last, &last_server, last_weight, is_mirror)?;
                add_version_traffic(cache, route_name, name, latest, &server, latest_weight, is_mirror)
            }
            None => {
                add_version_traffic(cache, route_name, &model.name, latest, &server, weight, is_mirror)
            }
        }
    }

    fn apply_pipeline(&self, cache: &mut XdsCache, name: &str) {
        let route_name = pipeline_route_name(name);
        cache.remove_pipeline_route(&route_name);

        let pipeline = match self.pipelines.get_pipeline(name) {
            Ok(Some(pipeline)) if !pipeline.deleted => pipeline,
            Ok(_) => {
                debug!(pipeline = %name, "pipeline gone, route removed");
                return;
            }
            Err(err) => {
                warn!(pipeline = %name, error = %err, "failed to resolve pipeline, route removed");
                return;
            }
        };

        if let Some(experiment) = self.experiments.experiment_for_baseline_pipeline(&pipeline.name) {
            match check_baseline(&experiment, &pipeline.name).and_then(|()| pipeline_splits(&experiment)) {
                Ok((splits, mirror)) => {
                    info!(pipeline = %name, experiment = %experiment.name, "routing baseline through experiment");
                    cache.add_pipeline_route(&route_name, splits, mirror);
                    return;
                }
                Err(err) => {
                    warn!(pipeline = %name, experiment = %experiment.name, error = %err, "ignoring experiment");
                }
            }
        }
        cache.add_pipeline_route(&route_name, vec![PipelineTrafficSplit::new(&pipeline.name, 100)], None);
    }

    fn apply_experiment(&self, cache: &mut XdsCache, name: &str, batch: &mut Batch) {
        let route_name = experiment_route_name(name);
        let experiment = match self.experiments.get_experiment(name) {
            Ok(Some(experiment)) => experiment,
            Ok(None) => {
                debug!(experiment = %name, "experiment gone, route removed");
                remove_experiment_routes(cache, &route_name);
                return;
            }
            Err(err) => {
                warn!(experiment = %name, error = %err, "failed to resolve experiment, route removed");
                remove_experiment_routes(cache, &route_name);
                batch.experiments.push((name.to_string(), Err(err.to_string())));
                return;
            }
        };

        // The baseline's own route changes whenever the experiment does.
        if let Some(default) = &experiment.default {
            match experiment.kind {
                ExperimentKind::Model => {
                    if let Some(version) = self.apply_model(cache, default) {
                        batch.models.insert((default.clone(), version));
                    }
                }
                ExperimentKind::Pipeline => self.apply_pipeline(cache, default),
            }
        }

        remove_experiment_routes(cache, &route_name);
        if experiment.deleted {
            debug!(experiment = %name, "experiment deleted, route removed");
            return;
        }

        let outcome = self.add_experiment_traffic(cache, &experiment, &route_name);
        if let Err(err) = &outcome {
            warn!(experiment = %name, error = %err, "failed to add experiment traffic");
            remove_experiment_routes(cache, &route_name);
        }
        batch
            .experiments
            .push((name.to_string(), outcome.map_err(|err| err.to_string())));
    }

    fn add_experiment_traffic(
        &self,
        cache: &mut XdsCache,
        experiment: &Experiment,
        route_name: &str,
    ) -> XdsResult<()> {
        match experiment.kind {
            ExperimentKind::Pipeline => {
                let (splits, mirror) = pipeline_splits(experiment)?;
                cache.add_pipeline_route(route_name, splits, mirror);
                Ok(())
            }
            ExperimentKind::Model => {
                if experiment.candidates.is_empty() {
                    return Err(no_candidates(experiment));
                }
                self.add_model_candidates(cache, route_name, experiment)
            }
        }
    }

    fn report_models(&self, versions: &BTreeSet<(String, u32)>, failure: Option<&str>) {
        let (desired, reason) = match failure {
            None => (ReplicaState::Available, ""),
            Some(reason) => (ReplicaState::LoadedUnavailable, reason),
        };

        for (name, version) in versions {
            let _lock = ModelLock::acquire(self.models.as_ref(), name);

            let Some(model_version) = self
                .models
                .get_model(name)
                .ok()
                .flatten()
                .and_then(|m| m.version(*version).cloned())
            else {
                debug!(model = %name, version, "model version gone, nothing to report");
                continue;
            };
            if let Err(err) = self.models.get_server(&model_version.server) {
                debug!(model = %name, version, error = %err, "server gone, nothing to report");
                continue;
            }

            for replica in model_version.assignment() {
                let current = model_version.replica_state(replica);
                if current == ReplicaState::Draining {
                    debug!(model = %name, version, replica, "skipping draining replica");
                    continue;
                }
                if let Err(err) = self.models.update_model_state(
                    name,
                    *version,
                    &model_version.server,
                    replica,
                    current,
                    desired,
                    reason,
                ) {
                    warn!(model = %name, version, replica, to = %desired, error = %err, "failed to update replica state");
                }
            }

            for replica in model_version.replicas_in_state(ReplicaState::UnloadEnvoyRequested) {
                if let Err(err) = self.models.update_model_state(
                    name,
                    *version,
                    &model_version.server,
                    replica,
                    ReplicaState::UnloadEnvoyRequested,
                    ReplicaState::UnloadRequested,
                    "",
                ) {
                    warn!(model = %name, version, replica, error = %err, "failed to resume unload");
                }
            }
        }
    }

    fn report_experiments(&self, outcomes: Vec<(String, Result<(), String>)>, failure: Option<&str>) {
        for (name, outcome) in outcomes {
            let (active, reason) = match (failure, outcome) {
                (Some(failure), _) => (false, failure.to_string()),
                (None, Ok(())) => (true, EXPERIMENT_ACTIVE.to_string()),
                (None, Err(reason)) => (false, reason),
            };
            if let Err(err) = self.experiments.set_status(&name, active, &reason) {
                error!(experiment = %name, error = %err, "failed to set experiment status");
            }
        }
    }
}

/// Add clusters, endpoints and a traffic split for one model version.
///
/// A version with no assigned replicas is skipped.
fn add_version_traffic(
    cache: &mut XdsCache,
    route_name: &str,
    model_name: &str,
    version: &ModelVersion,
    server: &ServerSnapshot,
    weight: u32,
    is_mirror: bool,
) -> XdsResult<()> {
    let assignment = version.assignment();
    if assignment.is_empty() {
        debug!(route = %route_name, model = %model_name, version = version.version, "no assigned replicas");
        return Ok(());
    }

    let (http_cluster, grpc_cluster) = cluster_names(&server.name, &assignment);
    for (cluster, transport) in [(&http_cluster, Transport::Http), (&grpc_cluster, Transport::Grpc)] {
        cache.add_cluster(cluster, route_name, model_name, version.version, transport);
        let mut endpoints = Vec::with_capacity(assignment.len());
        for index in &assignment {
            let Some(replica) = server.replicas.get(index) else {
                warn!(server = %server.name, replica = *index, "invalid replica index");
                continue;
            };
            let port = match transport {
                Transport::Http => replica.http_port,
                Transport::Grpc => replica.grpc_port,
            };
            endpoints.push(Endpoint::new(replica.inference_svc.clone(), port));
        }
        cache.set_endpoints(cluster, endpoints)?;
    }

    cache.add_route_traffic(
        route_name,
        TrafficSplit {
            model_name: model_name.to_string(),
            model_version: version.version,
            weight,
            http_cluster,
            grpc_cluster,
        },
        version.log_payloads,
        is_mirror,
    )
}

/// Whether `route_name` carries weighted traffic. Versions without
/// assigned replicas add no split.
fn has_splits(cache: &XdsCache, route_name: &str) -> bool {
    cache.route(route_name).is_some_and(|r| !r.splits.is_empty())
}

fn check_baseline(experiment: &Experiment, baseline: &str) -> XdsResult<()> {
    match experiment.default.as_deref() {
        None => Err(XdsError::store(format!(
            "experiment {} has no baseline for {baseline}",
            experiment.name
        ))),
        Some(default) if default != baseline => Err(XdsError::store(format!(
            "experiment {} has baseline {default}, expected {baseline}",
            experiment.name
        ))),
        Some(_) if experiment.deleted => Err(XdsError::store(format!(
            "experiment {} on {baseline} is deleted",
            experiment.name
        ))),
        Some(_) => Ok(()),
    }
}

fn pipeline_splits(
    experiment: &Experiment,
) -> XdsResult<(Vec<PipelineTrafficSplit>, Option<PipelineTrafficSplit>)> {
    if experiment.candidates.is_empty() {
        return Err(no_candidates(experiment));
    }
    let splits = experiment
        .candidates
        .iter()
        .map(|c| PipelineTrafficSplit::new(&c.name, c.weight))
        .collect();
    let mirror = experiment
        .mirror
        .as_ref()
        .map(|m| PipelineTrafficSplit::new(&m.name, m.percent));
    Ok((splits, mirror))
}

fn no_candidates(experiment: &Experiment) -> XdsError {
    XdsError::store(format!("experiment {} has no candidates", experiment.name))
}

fn remove_experiment_routes(cache: &mut XdsCache, route_name: &str) {
    if let Err(err) = cache.remove_route(route_name) {
        error!(route = %route_name, error = %err, "failed to remove experiment route");
    }
    cache.remove_pipeline_route(route_name);
}
