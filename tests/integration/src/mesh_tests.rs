//! End-to-end processor scenarios against the published snapshot.

use std::time::Duration;

use seldon_xds::mesh::builders::cluster_references;
use seldon_xds::mesh::names::cluster_names;
use seldon_xds::mesh::{Candidate, Mirror, Pipeline};
use seldon_xds::prelude::*;

use crate::common::{mirror_routes, primary_routes, route_names, Mesh};

#[test]
fn model_lifecycle_publishes_and_cleans_up() {
    let mesh = Mesh::new(2);
    mesh.load("iris", 1, &[0, 1]);

    mesh.processor.sync("iris").unwrap();

    let snapshot = mesh.published();
    assert_eq!(mesh.processor.node_id(), "seldon-mesh");
    assert_eq!(snapshot.version(), "1");
    assert_eq!(route_names(&primary_routes(&snapshot)), vec!["iris_http", "iris_grpc"]);

    let (http, grpc) = cluster_names("mlserver", &[0, 1]);
    let clusters = snapshot.get_resources(TypeUrl::CLUSTER).unwrap();
    assert!(clusters.contains(&http) && clusters.contains(&grpc));
    assert_eq!(clusters.len(), 6);
    assert_eq!(mesh.store.replica_state("iris", 1, 1), Some(ReplicaState::Available));

    mesh.store.remove_model("iris");
    mesh.processor.sync("iris").unwrap();

    let snapshot = mesh.published();
    assert_eq!(snapshot.version(), "2");
    assert!(route_names(&primary_routes(&snapshot)).is_empty());
    assert_eq!(snapshot.get_resources(TypeUrl::CLUSTER).unwrap().len(), 4);
}

#[test]
fn models_on_same_replicas_share_clusters() {
    let mesh = Mesh::new(3);
    mesh.load("a", 1, &[2, 0]);
    mesh.load("b", 1, &[0, 2]);
    mesh.load("c", 1, &[1]);

    for model in ["a", "b", "c"] {
        mesh.processor.enqueue(UpdateEvent::Model(model.to_string()));
    }
    mesh.processor.flush().unwrap();

    let snapshot = mesh.published();
    // Two shared model clusters per transport plus the four infrastructure clusters.
    assert_eq!(snapshot.get_resources(TypeUrl::CLUSTER).unwrap().len(), 8);
    assert_eq!(snapshot.version(), "1");

    mesh.store.remove_model("a");
    mesh.processor.sync("a").unwrap();

    let (http, _) = cluster_names("mlserver", &[0, 2]);
    assert!(mesh.published().get_resources(TypeUrl::CLUSTER).unwrap().contains(&http));
}

#[test]
fn experiment_emits_sticky_routes_and_mirror() {
    let mesh = Mesh::new(3);
    mesh.load("a", 1, &[0]);
    mesh.load("b", 1, &[1]);
    mesh.load("shadow", 1, &[2]);
    mesh.store.upsert_experiment(Experiment {
        name: "ab".to_string(),
        default: Some("a".to_string()),
        candidates: vec![
            Candidate { name: "a".to_string(), weight: 50 },
            Candidate { name: "b".to_string(), weight: 50 },
        ],
        mirror: Some(Mirror { name: "shadow".to_string(), percent: 20 }),
        ..Default::default()
    });

    mesh.processor.enqueue(UpdateEvent::Experiment("ab".to_string()));
    mesh.processor.flush().unwrap();

    let snapshot = mesh.published();
    let primary = primary_routes(&snapshot);
    let names = route_names(&primary);
    // Both "a" and "ab.experiment": two sticky routes per split and
    // transport, then the weighted route per transport.
    assert_eq!(names.len(), 12);
    assert_eq!(names.iter().filter(|n| n.ends_with("_experiment")).count(), 8);
    assert_eq!(route_names(&mirror_routes(&snapshot)).len(), 4);

    let (shadow_http, _) = cluster_names("mlserver", &[2]);
    assert!(!cluster_references(&primary).contains(&shadow_http));
    assert!(cluster_references(&mirror_routes(&snapshot)).contains(&shadow_http));
    assert!(snapshot.validate().is_ok());
    assert!(mesh.store.experiment_status("ab").unwrap().active);
}

#[test]
fn pipeline_routes_target_gateway() {
    let mesh = Mesh::new(1);
    mesh.store.upsert_pipeline(Pipeline { name: "fraud".to_string(), deleted: false });

    mesh.processor.enqueue(UpdateEvent::Pipeline("fraud".to_string()));
    mesh.processor.flush().unwrap();

    let primary = primary_routes(&mesh.published());
    assert_eq!(
        route_names(&primary),
        vec!["fraud.pipeline_http", "fraud.pipeline_grpc"]
    );
    let refs = cluster_references(&primary);
    assert!(refs.contains("pipelinegateway_http"));
    assert!(refs.contains("pipelinegateway_grpc"));
}

#[test]
fn rollout_shifts_traffic_with_replicas() {
    let mesh = Mesh::new(4);
    mesh.load("m", 1, &[0, 1, 2]);
    mesh.processor.sync("m").unwrap();

    // Version 1 is now available; version 2 starts loading on one replica.
    mesh.load("m", 2, &[3]);
    mesh.processor.sync("m").unwrap();

    let weights: Vec<_> = mesh.processor.inspect(|cache| {
        cache
            .route("m")
            .unwrap()
            .splits
            .iter()
            .map(|s| (s.model_version, s.weight))
            .collect()
    });
    assert_eq!(weights, vec![(1, 75), (2, 25)]);
    assert_eq!(route_names(&primary_routes(&mesh.published())).len(), 6);
}

#[tokio::test]
async fn watch_sees_each_batch() {
    let mesh = Mesh::new(1);
    let mut watch = mesh.snapshots.create_watch(mesh.processor.node());
    let (sink, events) = event_channel(64);
    let worker = tokio::spawn({
        let processor = mesh.processor.clone();
        async move { processor.run(events).await }
    });

    let initial = tokio::time::timeout(Duration::from_secs(2), watch.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(initial.version(), "1");

    mesh.load("iris", 1, &[0]);
    for _ in 0..10 {
        sink.model_updated("iris").await.unwrap();
    }
    let batch = tokio::time::timeout(Duration::from_secs(2), watch.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(batch.version(), "2");
    assert_eq!(route_names(&primary_routes(&batch)).len(), 2);

    drop(sink);
    worker.await.unwrap();
    assert_eq!(mesh.processor.snapshot_version(), 2);
}

#[test]
fn snapshot_versions_increase() {
    let mesh = Mesh::new(1);
    mesh.load("m", 1, &[0]);
    let mut last = 0;
    for _ in 0..5 {
        mesh.processor.sync("m").unwrap();
        let version: u64 = mesh.published().version().parse().unwrap();
        assert!(version > last);
        last = version;
    }
}
