//! Desired proxy state: listeners, routes, clusters and secrets.
//!
//! These are plain records. [`XdsCache`](crate::XdsCache) keeps them
//! consistent with each other and the builders turn them into Envoy
//! messages.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use xds_core::XdsResult;

use crate::certs::{CertificateKeyPair, CertificateProvider};

/// Upstream protocol of a cluster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Transport {
    /// HTTP/1.1 (REST inference).
    Http,
    /// HTTP/2 (gRPC inference).
    Grpc,
}

impl Transport {
    /// Both transports, HTTP first.
    pub const ALL: [Transport; 2] = [Transport::Http, Transport::Grpc];

    /// Whether this is the gRPC leg.
    #[inline]
    #[must_use]
    pub fn is_grpc(self) -> bool {
        matches!(self, Transport::Grpc)
    }

    /// Suffix used in route and cluster names.
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            Transport::Http => "http",
            Transport::Grpc => "grpc",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// An upstream host and port.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Endpoint {
    /// Host name or address.
    pub host: String,
    /// Port.
    pub port: u32,
}

impl Endpoint {
    /// Create an endpoint.
    pub fn new(host: impl Into<String>, port: u32) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Identity of the endpoint within a cluster, `host:port`.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// One route's claim on a cluster.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteVersionKey {
    /// Route name.
    pub route: String,
    /// Model (or pipeline) name.
    pub model: String,
    /// Model version.
    pub version: u32,
}

impl RouteVersionKey {
    /// Create a key.
    pub fn new(route: impl Into<String>, model: impl Into<String>, version: u32) -> Self {
        Self {
            route: route.into(),
            model: model.into(),
            version,
        }
    }
}

/// An upstream cluster and the routes that keep it alive.
///
/// A cluster lives in the cache only while `routes` is non-empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cluster {
    /// Cluster name.
    pub name: String,
    /// Upstream protocol.
    pub transport: Transport,
    /// Endpoints keyed by `host:port`.
    pub endpoints: BTreeMap<String, Endpoint>,
    /// Routes referencing this cluster.
    pub routes: BTreeSet<RouteVersionKey>,
}

impl Cluster {
    /// An empty cluster.
    pub fn new(name: impl Into<String>, transport: Transport) -> Self {
        Self {
            name: name.into(),
            transport,
            endpoints: BTreeMap::new(),
            routes: BTreeSet::new(),
        }
    }

    /// Add an endpoint; re-adding the same `host:port` is a no-op.
    pub fn add_endpoint(&mut self, endpoint: Endpoint) {
        self.endpoints.entry(endpoint.key()).or_insert(endpoint);
    }

    /// Replace every endpoint.
    pub fn set_endpoints(&mut self, endpoints: impl IntoIterator<Item = Endpoint>) {
        self.endpoints = endpoints.into_iter().map(|e| (e.key(), e)).collect();
    }
}

/// Share of a route's traffic sent to one model version.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrafficSplit {
    /// Model name.
    pub model_name: String,
    /// Model version.
    pub model_version: u32,
    /// Weight, as a percentage of the route's traffic.
    pub weight: u32,
    /// Cluster serving REST requests.
    pub http_cluster: String,
    /// Cluster serving gRPC requests.
    pub grpc_cluster: String,
}

impl TrafficSplit {
    /// Cluster for the given transport.
    #[must_use]
    pub fn cluster(&self, transport: Transport) -> &str {
        match transport {
            Transport::Http => &self.http_cluster,
            Transport::Grpc => &self.grpc_cluster,
        }
    }

    /// Whether this split is for the given model version.
    #[must_use]
    pub fn is_for(&self, model: &str, version: u32) -> bool {
        self.model_name == model && self.model_version == version
    }
}

/// Model route: weighted traffic splits plus an optional mirror.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Route {
    /// Route name, matched against the `seldon-model` header.
    pub name: String,
    /// Weighted splits, in insertion order.
    pub splits: Vec<TrafficSplit>,
    /// Traffic duplicated to the mirror listener.
    pub mirror: Option<TrafficSplit>,
    /// Tag responses for payload logging.
    pub log_payloads: bool,
}

impl Route {
    /// An empty route.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            splits: Vec::new(),
            mirror: None,
            log_payloads: false,
        }
    }

    /// More than one split: sticky-session routes are required.
    #[inline]
    #[must_use]
    pub fn is_experiment(&self) -> bool {
        self.splits.len() > 1
    }

    /// Sum of split weights.
    #[must_use]
    pub fn total_weight(&self) -> u32 {
        self.splits.iter().map(|s| s.weight).sum()
    }

    /// Every split, the mirror last.
    pub fn all_splits(&self) -> impl Iterator<Item = &TrafficSplit> {
        self.splits.iter().chain(self.mirror.iter())
    }
}

/// Share of a pipeline route's traffic sent to one pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineTrafficSplit {
    /// Pipeline name.
    pub pipeline_name: String,
    /// Weight, as a percentage.
    pub weight: u32,
}

impl PipelineTrafficSplit {
    /// Create a split.
    pub fn new(pipeline_name: impl Into<String>, weight: u32) -> Self {
        Self {
            pipeline_name: pipeline_name.into(),
            weight,
        }
    }
}

/// Pipeline route, served by the pipeline gateway.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineRoute {
    /// Route name, e.g. `fraud.pipeline`.
    pub name: String,
    /// Weighted splits.
    pub splits: Vec<PipelineTrafficSplit>,
    /// Traffic duplicated to the mirror listener.
    pub mirror: Option<PipelineTrafficSplit>,
}

impl PipelineRoute {
    /// An empty pipeline route.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            splits: Vec::new(),
            mirror: None,
        }
    }

    /// More than one split.
    #[inline]
    #[must_use]
    pub fn is_experiment(&self) -> bool {
        self.splits.len() > 1
    }

    /// Sum of split weights.
    #[must_use]
    pub fn total_weight(&self) -> u32 {
        self.splits.iter().map(|s| s.weight).sum()
    }
}

/// A bound socket and the route configuration it serves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Listener {
    /// Listener name.
    pub name: String,
    /// Bind address.
    pub address: String,
    /// Bind port.
    pub port: u32,
    /// Route configuration served over RDS.
    pub route_config_name: String,
}

/// TLS material published over SDS.
///
/// The provider is read when the secret is loaded and on [`Secret::reload`].
/// Snapshots only see the bytes held here.
#[derive(Clone)]
pub struct Secret {
    /// Secret carrying the certificate chain and key.
    pub name: String,
    /// Secret carrying the trusted CA, if peers are verified.
    pub validation_secret_name: Option<String>,
    provider: Arc<dyn CertificateProvider>,
    certificate: Option<CertificateKeyPair>,
    ca: Option<Vec<u8>>,
}

impl Secret {
    /// Read the provider's current material into a new secret.
    pub fn load(
        name: impl Into<String>,
        validation_secret_name: Option<String>,
        provider: Arc<dyn CertificateProvider>,
    ) -> XdsResult<Self> {
        let certificate = provider.certificate()?;
        let ca = provider.validation_certificate()?;
        Ok(Self {
            name: name.into(),
            validation_secret_name,
            provider,
            certificate,
            ca,
        })
    }

    /// Read the provider again. On error the held material is unchanged.
    pub fn reload(&mut self) -> XdsResult<()> {
        let certificate = self.provider.certificate()?;
        let ca = self.provider.validation_certificate()?;
        self.certificate = certificate;
        self.ca = ca;
        Ok(())
    }

    /// Certificate presented to peers, `None` for a plaintext leg.
    #[must_use]
    pub fn certificate(&self) -> Option<&CertificateKeyPair> {
        self.certificate.as_ref()
    }

    /// CA bundle used to verify peers.
    #[must_use]
    pub fn validation_certificate(&self) -> Option<&[u8]> {
        self.ca.as_deref()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secret")
            .field("name", &self.name)
            .field("validation_secret_name", &self.validation_secret_name)
            .field("certificate", &self.certificate)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certs::PemFileCertificates;

    #[test]
    fn endpoint_key_is_host_port() {
        assert_eq!(Endpoint::new("agent-0.mlserver", 9000).key(), "agent-0.mlserver:9000");
    }

    #[test]
    fn cluster_endpoint_upsert() {
        let mut cluster = Cluster::new("mlserver_abc_http", Transport::Http);
        cluster.add_endpoint(Endpoint::new("agent-0", 9000));
        cluster.add_endpoint(Endpoint::new("agent-0", 9000));
        cluster.add_endpoint(Endpoint::new("agent-1", 9000));
        assert_eq!(cluster.endpoints.len(), 2);
    }

    #[test]
    fn route_experiment_and_weight() {
        let mut route = Route::new("iris");
        assert!(!route.is_experiment());
        for (version, weight) in [(1, 25), (2, 75)] {
            route.splits.push(TrafficSplit {
                model_name: "iris".into(),
                model_version: version,
                weight,
                http_cluster: "c_http".into(),
                grpc_cluster: "c_grpc".into(),
            });
        }
        assert!(route.is_experiment());
        assert_eq!(route.total_weight(), 100);
        assert!(route.splits[1].is_for("iris", 2));
        assert_eq!(route.splits[0].cluster(Transport::Grpc), "c_grpc");
    }

    #[test]
    fn cluster_set_endpoints_replaces_all() {
        let mut cluster = Cluster::new("mlserver_abc_http", Transport::Http);
        cluster.add_endpoint(Endpoint::new("agent-0", 9000));
        cluster.set_endpoints([Endpoint::new("agent-0-moved", 9000)]);
        let keys: Vec<_> = cluster.endpoints.keys().cloned().collect();
        assert_eq!(keys, vec!["agent-0-moved:9000"]);
    }

    #[test]
    fn secret_holds_material_until_reload() {
        let dir = tempfile::tempdir().unwrap();
        let crt = dir.path().join("tls.crt");
        let key = dir.path().join("tls.key");
        std::fs::write(&crt, b"crt-1").unwrap();
        std::fs::write(&key, b"key-1").unwrap();
        let provider = PemFileCertificates::new(&crt, &key, None);
        let mut secret = Secret::load("upstream_client", None, Arc::new(provider)).unwrap();

        std::fs::write(&crt, b"crt-2").unwrap();
        assert_eq!(secret.certificate().unwrap().certificate_chain, b"crt-1");

        secret.reload().unwrap();
        assert_eq!(secret.certificate().unwrap().certificate_chain, b"crt-2");

        std::fs::remove_file(&key).unwrap();
        assert!(secret.reload().is_err());
        assert_eq!(secret.certificate().unwrap().private_key, b"key-1");
        assert!(secret.validation_certificate().is_none());
    }
}
