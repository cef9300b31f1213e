//! Larger meshes and concurrent snapshot consumers.

use std::sync::Arc;
use std::time::Instant;

use seldon_xds::prelude::*;

use crate::common::{primary_routes, Mesh};

#[test]
fn thousand_models_in_one_batch() {
    let mesh = Mesh::new(8);
    for i in 0..1000 {
        mesh.load(&format!("model-{i}"), 1, &[i % 8, (i + 1) % 8]);
        mesh.processor.enqueue(UpdateEvent::Model(format!("model-{i}")));
    }

    let started = Instant::now();
    mesh.processor.flush().unwrap();
    let elapsed = started.elapsed();

    let snapshot = mesh.published();
    assert_eq!(snapshot.version(), "1");
    assert_eq!(primary_routes(&snapshot).virtual_hosts[0].routes.len(), 2000);
    // Eight distinct adjacent replica pairs, two transports each, plus infrastructure.
    assert_eq!(snapshot.get_resources(TypeUrl::CLUSTER).unwrap().len(), 8 * 2 + 4);
    assert_eq!(mesh.store.replica_state("model-999", 1, 7), Some(ReplicaState::Available));
    assert!(elapsed.as_secs() < 10, "batch took {elapsed:?}");
}

#[test]
fn removing_half_the_models_keeps_snapshot_valid() {
    let mesh = Mesh::new(4);
    for i in 0..200 {
        mesh.load(&format!("m{i}"), 1, &[i % 4]);
        mesh.processor.enqueue(UpdateEvent::Model(format!("m{i}")));
    }
    mesh.processor.flush().unwrap();

    for i in (0..200).step_by(2) {
        mesh.store.remove_model(&format!("m{i}"));
        mesh.processor.enqueue(UpdateEvent::Model(format!("m{i}")));
    }
    mesh.processor.flush().unwrap();

    let snapshot = mesh.published();
    assert_eq!(snapshot.version(), "2");
    assert!(snapshot.validate().is_ok());
    assert_eq!(primary_routes(&snapshot).virtual_hosts[0].routes.len(), 200);
    // Odd models only sit on replicas 1 and 3.
    assert_eq!(snapshot.get_resources(TypeUrl::CLUSTER).unwrap().len(), 2 * 2 + 4);
}

#[test]
fn many_nodes_share_one_snapshot_cache() {
    let snapshots = Arc::new(ShardedCache::new());
    let snapshot = XdsCache::new(&MeshConfig::default()).snapshot("1").unwrap();

    let handles: Vec<_> = (0..16)
        .map(|t| {
            let snapshots = Arc::clone(&snapshots);
            let snapshot = snapshot.clone();
            std::thread::spawn(move || {
                for n in 0..64 {
                    let node = NodeHash::from_id(&format!("proxy-{t}-{n}"));
                    snapshots.set_snapshot(node, snapshot.clone()).unwrap();
                    assert!(snapshots.get_snapshot(node).is_some());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(snapshots.snapshot_count(), 16 * 64);
    assert_eq!(snapshots.stats().snapshots_set(), 16 * 64);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn watchers_on_many_nodes_all_notified() {
    let snapshots = Arc::new(ShardedCache::new());
    let nodes: Vec<_> = (0..32)
        .map(|i| NodeHash::from_id(&format!("proxy-{i}")))
        .collect();
    let mut watches: Vec<_> = nodes.iter().map(|n| snapshots.create_watch(*n)).collect();

    let snapshot = XdsCache::new(&MeshConfig::default()).snapshot("9").unwrap();
    for node in &nodes {
        snapshots.set_snapshot(*node, snapshot.clone()).unwrap();
    }

    for watch in &mut watches {
        assert_eq!(watch.recv().await.unwrap().version(), "9");
    }
    assert_eq!(snapshots.stats().notifications_sent(), 32);
}
