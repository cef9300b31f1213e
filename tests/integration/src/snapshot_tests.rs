//! Contents and validation of snapshots built from the configuration cache.

use std::sync::Arc;

use seldon_xds::mesh::names::cluster_names;
use seldon_xds::mesh::{StaticCertificates, TrafficSplit, Transport};
use seldon_xds::prelude::*;
use seldon_xds::types::envoy::config::cluster::v3::Cluster as EnvoyCluster;

use crate::common::{primary_routes, route_names};

fn iris_cache() -> XdsCache {
    let mut cache = XdsCache::new(&MeshConfig::default());
    let (http, grpc) = cluster_names("mlserver", &[0]);
    cache.add_cluster(&http, "iris", "iris", 1, Transport::Http);
    cache.add_cluster(&grpc, "iris", "iris", 1, Transport::Grpc);
    cache.add_endpoint(&http, "mlserver-0.seldon.svc", 9000).unwrap();
    cache.add_endpoint(&grpc, "mlserver-0.seldon.svc", 9500).unwrap();
    cache.add_route_traffic(
        "iris",
        TrafficSplit {
            model_name: "iris".into(),
            model_version: 1,
            weight: 100,
            http_cluster: http,
            grpc_cluster: grpc,
        },
        false,
        false,
    )
    .unwrap();
    cache
}

fn cluster(snapshot: &Snapshot, name: &str) -> EnvoyCluster {
    snapshot
        .get_resources(TypeUrl::CLUSTER)
        .unwrap()
        .get(name)
        .unwrap()
        .as_any()
        .downcast_ref::<ProtoResource<EnvoyCluster>>()
        .unwrap()
        .message()
        .clone()
}

#[test]
fn empty_cache_still_serves_listeners() {
    let snapshot = XdsCache::new(&MeshConfig::default()).snapshot("1").unwrap();

    let listeners = snapshot.get_resources(TypeUrl::LISTENER).unwrap();
    assert!(listeners.contains("seldon_http"));
    assert!(listeners.contains("seldon_mirrors"));

    let clusters = snapshot.get_resources(TypeUrl::CLUSTER).unwrap();
    for name in ["pipelinegateway_http", "pipelinegateway_grpc", "mirror_http", "mirror_grpc"] {
        assert!(clusters.contains(name), "missing {name}");
    }
    assert!(snapshot.get_resources(TypeUrl::SECRET).unwrap().is_empty());
    assert!(route_names(&primary_routes(&snapshot)).is_empty());
    assert!(snapshot.validate().is_ok());
}

#[test]
fn model_snapshot_is_consistent() {
    let snapshot = iris_cache().snapshot("7").unwrap();

    assert_eq!(snapshot.version(), "7");
    assert_eq!(snapshot.total_resources(), 2 + 2 + 6);
    assert!(snapshot.dangling_references().is_empty());
    assert_eq!(route_names(&primary_routes(&snapshot)), vec!["iris_http", "iris_grpc"]);
}

#[test]
fn upstream_tls_adds_secrets_and_transport_sockets() {
    let mut cache = iris_cache();
    cache
        .enable_upstream_tls(Arc::new(
            StaticCertificates::new("cert-pem", "key-pem").with_ca("ca-pem"),
        ))
        .unwrap();
    assert!(cache.upstream_tls_active());
    assert!(!cache.downstream_tls_active());

    let snapshot = cache.snapshot("2").unwrap();
    let secrets = snapshot.get_resources(TypeUrl::SECRET).unwrap();
    assert!(secrets.contains("upstream_client"));
    assert!(secrets.contains("upstream_server"));

    let (http, _) = cluster_names("mlserver", &[0]);
    assert!(cluster(&snapshot, &http).transport_socket.is_some());
    assert!(cluster(&snapshot, "pipelinegateway_http").transport_socket.is_some());
    // Mirror traffic stays on the local listener.
    assert!(cluster(&snapshot, "mirror_http").transport_socket.is_none());
    assert!(snapshot.validate().is_ok());
}

#[test]
fn downstream_tls_secrets_are_published() {
    let mut cache = XdsCache::new(&MeshConfig::default());
    cache
        .enable_downstream_tls(Arc::new(StaticCertificates::new("cert", "key")))
        .unwrap();

    let snapshot = cache.snapshot("1").unwrap();
    let secrets = snapshot.get_resources(TypeUrl::SECRET).unwrap();
    assert_eq!(secrets.len(), 1);
    assert!(secrets.contains("downstream_server"));
}

#[test]
fn snapshot_cache_keeps_previous_on_rejection() {
    let snapshots = ShardedCache::new();
    let node = NodeHash::from_id("seldon-mesh");

    snapshots.set_snapshot(node, iris_cache().snapshot("1").unwrap()).unwrap();
    assert!(snapshots.set_snapshot(node, Snapshot::builder().build()).is_err());

    assert_eq!(snapshots.version(node).as_deref(), Some("1"));
    assert_eq!(snapshots.stats().snapshots_rejected(), 1);
}
