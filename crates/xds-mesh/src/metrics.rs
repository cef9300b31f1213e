//! Processor metrics.
//!
//! Recorded through the `metrics` facade; install any recorder (for
//! example a Prometheus exporter) to collect them.
//!
//! - `seldon_xds_batches_total` - batches drained, labelled by `outcome`
//! - `seldon_xds_batch_keys` - pending keys per batch
//! - `seldon_xds_batch_duration_seconds` - drain time
//! - `seldon_xds_publish_failures_total` - snapshots not published
//! - `seldon_xds_snapshot_version` - last published version
//! - `seldon_xds_resources` - published resources, labelled by `kind`
//! - `seldon_xds_events_total` - update events received, labelled by `kind`

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, gauge, histogram};

/// Counters and gauges for one processor.
#[derive(Debug, Clone, Default)]
pub struct ProcessorMetrics {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    batches: AtomicU64,
    publish_failures: AtomicU64,
}

impl ProcessorMetrics {
    /// Fresh metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// An update event arrived.
    pub fn event_received(&self, kind: &'static str) {
        counter!("seldon_xds_events_total", "kind" => kind).increment(1);
    }

    /// A batch was published.
    pub fn batch_published(&self, keys: usize, elapsed: Duration, version: u64) {
        self.inner.batches.fetch_add(1, Ordering::Relaxed);
        counter!("seldon_xds_batches_total", "outcome" => "published").increment(1);
        histogram!("seldon_xds_batch_keys").record(keys as f64);
        histogram!("seldon_xds_batch_duration_seconds").record(elapsed.as_secs_f64());
        gauge!("seldon_xds_snapshot_version").set(version as f64);
    }

    /// A batch failed to publish and its keys stay pending.
    pub fn batch_failed(&self, keys: usize, elapsed: Duration) {
        self.inner.batches.fetch_add(1, Ordering::Relaxed);
        self.inner.publish_failures.fetch_add(1, Ordering::Relaxed);
        counter!("seldon_xds_batches_total", "outcome" => "failed").increment(1);
        counter!("seldon_xds_publish_failures_total").increment(1);
        histogram!("seldon_xds_batch_keys").record(keys as f64);
        histogram!("seldon_xds_batch_duration_seconds").record(elapsed.as_secs_f64());
    }

    /// Resource counts of the published snapshot.
    pub fn resources(&self, clusters: usize, routes: usize, pipelines: usize) {
        gauge!("seldon_xds_resources", "kind" => "cluster").set(clusters as f64);
        gauge!("seldon_xds_resources", "kind" => "route").set(routes as f64);
        gauge!("seldon_xds_resources", "kind" => "pipeline").set(pipelines as f64);
    }

    /// Batches drained so far.
    #[must_use]
    pub fn batches(&self) -> u64 {
        self.inner.batches.load(Ordering::Relaxed)
    }

    /// Batches that failed to publish.
    #[must_use]
    pub fn publish_failures(&self) -> u64 {
        self.inner.publish_failures.load(Ordering::Relaxed)
    }
}
