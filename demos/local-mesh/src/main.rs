//! Local mesh demo.
//!
//! Runs the incremental processor against an in-memory store, plays the
//! part of a scheduler and agent (placing a model, rolling out a second
//! version, starting an A/B experiment) and logs each snapshot a proxy
//! watching node `seldon-mesh` would receive.
//!
//! ## Running
//!
//! ```bash
//! RUST_LOG=info,xds_mesh=debug cargo run -p local-mesh
//! ```
//!
//! Settings come from `SELDON_XDS_*` environment variables; see
//! `MeshConfig::from_env`.

use std::sync::Arc;

use seldon_xds::mesh::{Candidate, ModelLock};
use seldon_xds::prelude::*;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const SERVER: &str = "mlserver";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    info!("{}", seldon_xds::version::version_string());

    let config = MeshConfig::from_env()?;
    let store = Arc::new(InMemoryStore::new());
    let snapshots = Arc::new(ShardedCache::new());
    let processor = Arc::new(IncrementalProcessor::new(
        &config,
        Arc::clone(&store),
        snapshots.clone(),
    )?);

    let mut server = ServerSnapshot::new(SERVER);
    for i in 0..3 {
        server = server.with_replica(i, ServerReplica::new(format!("{SERVER}-{i}.seldon.svc"), 9000, 9500));
    }
    store.upsert_server(server);

    let mut watch = snapshots.create_watch(processor.node());
    tokio::spawn(async move {
        while let Some(snapshot) = watch.recv().await {
            info!(
                version = %snapshot.version(),
                resources = snapshot.total_resources(),
                "proxy received snapshot"
            );
        }
    });

    let (sink, events) = event_channel(config.event_buffer);
    let worker = tokio::spawn({
        let processor = Arc::clone(&processor);
        async move { processor.run(events).await }
    });

    let settle = config.batch_wait() * 2;

    info!("placing iris:1 on two replicas");
    load(&store, "iris", 1, &[0, 1]);
    sink.model_updated("iris").await?;
    tokio::time::sleep(settle).await;

    info!("rolling out iris:2 on one replica");
    load(&store, "iris", 2, &[2]);
    sink.model_updated("iris").await?;
    tokio::time::sleep(settle).await;

    info!("starting experiment iris-vs-wine");
    load(&store, "wine", 1, &[2]);
    sink.model_updated("wine").await?;
    store.upsert_experiment(Experiment {
        name: "iris-vs-wine".to_string(),
        default: Some("iris".to_string()),
        candidates: vec![
            Candidate { name: "iris".to_string(), weight: 80 },
            Candidate { name: "wine".to_string(), weight: 20 },
        ],
        ..Default::default()
    });
    sink.experiment_updated("iris-vs-wine").await?;
    tokio::time::sleep(settle).await;

    match store.experiment_status("iris-vs-wine") {
        Some(status) => info!(active = status.active, reason = %status.reason, "experiment status"),
        None => warn!("experiment status not reported"),
    }
    info!(
        version = processor.snapshot_version(),
        batches = processor.metrics().batches(),
        "mesh synchronized, press ctrl-c to exit"
    );

    signal::ctrl_c().await?;
    drop(sink);
    worker.await?;
    info!("shut down");
    Ok(())
}

/// Mark replicas of a model version loaded, as an agent would.
fn load(store: &InMemoryStore, model: &str, version: u32, replicas: &[usize]) {
    let _lock = ModelLock::acquire(store, model);
    let mut snapshot = match store.get_model(model) {
        Ok(Some(snapshot)) => snapshot,
        _ => ModelSnapshot::new(model, vec![]),
    };
    let mut model_version = snapshot
        .version(version)
        .cloned()
        .unwrap_or_else(|| ModelVersion::new(version, SERVER));
    for replica in replicas {
        model_version = model_version.with_replica(*replica, ReplicaState::Loaded);
    }
    snapshot.versions.retain(|v| v.version != version);
    snapshot.versions.push(model_version);
    snapshot.versions.sort_by_key(|v| v.version);
    store.upsert_model(snapshot);
}
