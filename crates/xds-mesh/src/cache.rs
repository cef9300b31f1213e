//! The configuration cache: desired listeners, routes, clusters and secrets.
//!
//! [`XdsCache`] is owned by one processor and mutated only through the
//! methods here, which keep routes and clusters consistent with each other:
//!
//! - every cluster a route split or mirror names exists
//! - every cluster is referenced by at least one route
//!
//! The `*_contents` methods turn the current state into emission-ready
//! resources and [`XdsCache::snapshot`] bundles them into a validated
//! [`Snapshot`].

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{debug, info, warn};
use xds_cache::Snapshot;
use xds_core::{BoxResource, ProtoResource, ResourceRef, TypeUrl, XdsError, XdsResult};

use crate::builders::{
    cluster_references, make_cluster, make_http_listener, make_route_configurations,
    secret_resources,
};
use crate::certs::{CertificateProvider, PemFileCertificates};
use crate::config::{
    EnvoyConfig, MeshConfig, PipelineGatewayConfig, SecurityConfig, SecurityProtocol,
};
use crate::model::{
    Cluster, Endpoint, Listener, PipelineRoute, PipelineTrafficSplit, Route, RouteVersionKey,
    Secret, TrafficSplit, Transport,
};
use crate::names::{
    mirror_cluster, pipeline_gateway_cluster, DEFAULT_LISTENER_NAME, DEFAULT_ROUTE_CONFIG_NAME,
    DOWNSTREAM_CLIENT_SECRET, DOWNSTREAM_SERVER_SECRET, MIRROR_LISTENER_NAME,
    MIRROR_ROUTE_CONFIG_NAME, UPSTREAM_CLIENT_SECRET, UPSTREAM_SERVER_SECRET,
};

/// Environment prefix of the certificate Envoy presents to model servers.
pub const UPSTREAM_CLIENT_PREFIX: &str = "ENVOY_UPSTREAM_CLIENT";
/// Environment prefix of the CA model servers are verified against.
pub const UPSTREAM_SERVER_PREFIX: &str = "ENVOY_UPSTREAM_SERVER";
/// Environment prefix of the certificate Envoy presents to callers.
pub const DOWNSTREAM_SERVER_PREFIX: &str = "ENVOY_DOWNSTREAM_SERVER";
/// Environment prefix of the CA callers are verified against.
pub const DOWNSTREAM_CLIENT_PREFIX: &str = "ENVOY_DOWNSTREAM_CLIENT";

/// Desired proxy configuration for one node.
#[derive(Debug)]
pub struct XdsCache {
    listeners: BTreeMap<String, Listener>,
    routes: BTreeMap<String, Route>,
    pipelines: BTreeMap<String, PipelineRoute>,
    clusters: BTreeMap<String, Cluster>,
    secrets: BTreeMap<String, Secret>,
    pipeline_gateway: PipelineGatewayConfig,
    mirror_endpoint: Endpoint,
    envoy: EnvoyConfig,
}

impl XdsCache {
    /// A cache holding the primary and mirror listeners and nothing else.
    pub fn new(config: &MeshConfig) -> Self {
        let listeners = [
            Listener {
                name: DEFAULT_LISTENER_NAME.to_string(),
                address: config.listeners.address.clone(),
                port: config.listeners.http_port,
                route_config_name: DEFAULT_ROUTE_CONFIG_NAME.to_string(),
            },
            Listener {
                name: MIRROR_LISTENER_NAME.to_string(),
                address: config.listeners.address.clone(),
                port: config.listeners.mirror_port,
                route_config_name: MIRROR_ROUTE_CONFIG_NAME.to_string(),
            },
        ]
        .into_iter()
        .map(|l| (l.name.clone(), l))
        .collect();

        Self {
            listeners,
            routes: BTreeMap::new(),
            pipelines: BTreeMap::new(),
            clusters: BTreeMap::new(),
            secrets: BTreeMap::new(),
            pipeline_gateway: config.pipeline_gateway.clone(),
            mirror_endpoint: Endpoint::new(
                config.listeners.address.clone(),
                config.listeners.mirror_port,
            ),
            envoy: config.envoy.clone(),
        }
    }

    /// Install TLS secrets for each leg set to SSL, reading certificate
    /// locations from the environment.
    pub fn setup_tls(&mut self, security: &SecurityConfig) -> XdsResult<()> {
        self.setup_tls_with(security, |key| std::env::var(key).ok())
    }

    pub(crate) fn setup_tls_with(
        &mut self,
        security: &SecurityConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> XdsResult<()> {
        if security.upstream == SecurityProtocol::Ssl {
            info!("upstream TLS active");
            let provider = PemFileCertificates::from_lookup(
                UPSTREAM_CLIENT_PREFIX,
                UPSTREAM_SERVER_PREFIX,
                &lookup,
            )?;
            self.enable_upstream_tls(Arc::new(provider))?;
        }
        if security.downstream == SecurityProtocol::Ssl {
            info!("downstream TLS active");
            let provider = PemFileCertificates::from_lookup(
                DOWNSTREAM_SERVER_PREFIX,
                DOWNSTREAM_CLIENT_PREFIX,
                &lookup,
            )?;
            self.enable_downstream_tls(Arc::new(provider))?;
        }
        Ok(())
    }

    /// Clusters present `provider`'s certificate and verify servers.
    ///
    /// The material is read now; a read failure leaves the cache unchanged.
    pub fn enable_upstream_tls(&mut self, provider: Arc<dyn CertificateProvider>) -> XdsResult<()> {
        self.insert_secret(Secret::load(
            UPSTREAM_CLIENT_SECRET,
            Some(UPSTREAM_SERVER_SECRET.to_string()),
            provider,
        )?);
        Ok(())
    }

    /// Listeners terminate TLS with `provider`'s certificate.
    pub fn enable_downstream_tls(&mut self, provider: Arc<dyn CertificateProvider>) -> XdsResult<()> {
        self.insert_secret(Secret::load(
            DOWNSTREAM_SERVER_SECRET,
            Some(DOWNSTREAM_CLIENT_SECRET.to_string()),
            provider,
        )?);
        Ok(())
    }

    fn insert_secret(&mut self, secret: Secret) {
        debug!(secret = %secret.name, "installing secret");
        self.secrets.insert(secret.name.clone(), secret);
    }

    /// Re-read every secret's certificate material.
    ///
    /// All secrets are read before any is replaced, so on error the cache
    /// keeps serving the previous material.
    pub fn rotate_secrets(&mut self) -> XdsResult<()> {
        let mut rotated = self.secrets.clone();
        for secret in rotated.values_mut() {
            secret.reload()?;
        }
        info!(secrets = rotated.len(), "certificate material rotated");
        self.secrets = rotated;
        Ok(())
    }

    /// Add or update a model version's share of a route.
    ///
    /// The route is created if absent. A split for the same model version
    /// is replaced, so repeating a call leaves the route unchanged. With
    /// `is_mirror` the split becomes the route's mirror. `log_payloads`
    /// only ever switches logging on.
    ///
    /// A mirror is refused for a route that has no splits yet, so no route
    /// ever exists without weighted traffic.
    pub fn add_route_traffic(
        &mut self,
        route_name: &str,
        split: TrafficSplit,
        log_payloads: bool,
        is_mirror: bool,
    ) -> XdsResult<()> {
        if is_mirror && self.routes.get(route_name).map_or(true, |r| r.splits.is_empty()) {
            return Err(XdsError::InvalidResource {
                type_url: TypeUrl::ROUTE.to_string(),
                name: route_name.to_string(),
                reason: format!(
                    "mirror to {}:{} without traffic splits",
                    split.model_name, split.model_version
                ),
            });
        }

        let route = self
            .routes
            .entry(route_name.to_string())
            .or_insert_with(|| Route::new(route_name));

        route.log_payloads |= log_payloads;

        if is_mirror {
            route.mirror = Some(split);
        } else if let Some(existing) = route
            .splits
            .iter_mut()
            .find(|s| s.is_for(&split.model_name, split.model_version))
        {
            *existing = split;
        } else {
            route.splits.push(split);
        }
        Ok(())
    }

    /// Create a cluster if absent and record that `route_name` uses it for
    /// the given model version.
    pub fn add_cluster(
        &mut self,
        name: &str,
        route_name: &str,
        model_name: &str,
        version: u32,
        transport: Transport,
    ) {
        self.clusters
            .entry(name.to_string())
            .or_insert_with(|| Cluster::new(name, transport))
            .routes
            .insert(RouteVersionKey::new(route_name, model_name, version));
    }

    /// Add an endpoint to an existing cluster.
    pub fn add_endpoint(&mut self, cluster_name: &str, host: &str, port: u32) -> XdsResult<()> {
        let cluster =
            self.clusters
                .get_mut(cluster_name)
                .ok_or_else(|| XdsError::ResourceNotFound {
                    type_url: TypeUrl::CLUSTER.to_string(),
                    name: cluster_name.to_string(),
                })?;
        cluster.add_endpoint(Endpoint::new(host, port));
        Ok(())
    }

    /// Replace the endpoints of an existing cluster.
    ///
    /// A cluster name fixes the replica set but not where those replicas
    /// live, so every rebuild resets the endpoints to the current ones.
    pub fn set_endpoints(
        &mut self,
        cluster_name: &str,
        endpoints: impl IntoIterator<Item = Endpoint>,
    ) -> XdsResult<()> {
        let cluster =
            self.clusters
                .get_mut(cluster_name)
                .ok_or_else(|| XdsError::ResourceNotFound {
                    type_url: TypeUrl::CLUSTER.to_string(),
                    name: cluster_name.to_string(),
                })?;
        cluster.set_endpoints(endpoints);
        Ok(())
    }

    /// Remove a route and release its claim on every cluster it used.
    ///
    /// Clusters left without routes are removed. A missing route is not an
    /// error. A missing cluster is, and nothing is changed in that case.
    pub fn remove_route(&mut self, route_name: &str) -> XdsResult<()> {
        let Some(route) = self.routes.get(route_name) else {
            warn!(route = %route_name, "no route to remove");
            self.release_claims(route_name);
            return Ok(());
        };

        for split in route.all_splits() {
            for transport in Transport::ALL {
                let cluster = split.cluster(transport);
                if !self.clusters.contains_key(cluster) {
                    return Err(XdsError::DanglingClusterReference {
                        route: route_name.to_string(),
                        cluster: cluster.to_string(),
                    });
                }
            }
        }

        self.routes.remove(route_name);
        info!(route = %route_name, "removing route");
        self.release_claims(route_name);
        Ok(())
    }

    /// Drop every claim `route_name` holds on a cluster, including claims
    /// made by a rebuild that failed before its split was recorded.
    fn release_claims(&mut self, route_name: &str) {
        self.clusters.retain(|name, cluster| {
            cluster.routes.retain(|key| key.route != route_name);
            if cluster.routes.is_empty() {
                debug!(cluster = %name, "removing unreferenced cluster");
                false
            } else {
                true
            }
        });
    }

    /// Replace a pipeline route.
    pub fn add_pipeline_route(
        &mut self,
        route_name: &str,
        splits: Vec<PipelineTrafficSplit>,
        mirror: Option<PipelineTrafficSplit>,
    ) {
        self.pipelines.insert(
            route_name.to_string(),
            PipelineRoute {
                name: route_name.to_string(),
                splits,
                mirror,
            },
        );
    }

    /// Remove a pipeline route, returning whether it existed.
    pub fn remove_pipeline_route(&mut self, route_name: &str) -> bool {
        let removed = self.pipelines.remove(route_name).is_some();
        if removed {
            info!(route = %route_name, "removed pipeline route");
        }
        removed
    }

    /// Route by name.
    #[must_use]
    pub fn route(&self, name: &str) -> Option<&Route> {
        self.routes.get(name)
    }

    /// Pipeline route by name.
    #[must_use]
    pub fn pipeline_route(&self, name: &str) -> Option<&PipelineRoute> {
        self.pipelines.get(name)
    }

    /// Cluster by name.
    #[must_use]
    pub fn cluster(&self, name: &str) -> Option<&Cluster> {
        self.clusters.get(name)
    }

    /// Listener by name.
    #[must_use]
    pub fn listener(&self, name: &str) -> Option<&Listener> {
        self.listeners.get(name)
    }

    /// Secret by name.
    #[must_use]
    pub fn secret(&self, name: &str) -> Option<&Secret> {
        self.secrets.get(name)
    }

    /// Model routes in name order.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.values()
    }

    /// Pipeline routes in name order.
    pub fn pipeline_routes(&self) -> impl Iterator<Item = &PipelineRoute> {
        self.pipelines.values()
    }

    /// Model clusters in name order.
    pub fn clusters(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters.values()
    }

    /// Number of model routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Number of pipeline routes.
    #[must_use]
    pub fn pipeline_route_count(&self) -> usize {
        self.pipelines.len()
    }

    /// Number of model clusters.
    #[must_use]
    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    /// Whether TLS is configured towards model servers.
    #[must_use]
    pub fn upstream_tls_active(&self) -> bool {
        self.secrets.contains_key(UPSTREAM_CLIENT_SECRET)
    }

    /// Whether listeners terminate TLS.
    #[must_use]
    pub fn downstream_tls_active(&self) -> bool {
        self.secrets.contains_key(DOWNSTREAM_SERVER_SECRET)
    }

    /// Check that routes and clusters agree.
    ///
    /// Every cluster named by a split or mirror must exist and every
    /// cluster must have at least one route.
    pub fn verify_references(&self) -> XdsResult<()> {
        let mut missing = BTreeSet::new();
        for route in self.routes.values() {
            for split in route.all_splits() {
                for transport in Transport::ALL {
                    let cluster = split.cluster(transport);
                    if !self.clusters.contains_key(cluster) {
                        missing.insert(ResourceRef::cluster(cluster).to_string());
                    }
                }
            }
        }
        for cluster in self.clusters.values() {
            if cluster.routes.is_empty() {
                return Err(XdsError::InvalidResource {
                    type_url: TypeUrl::CLUSTER.to_string(),
                    name: cluster.name.clone(),
                    reason: "cluster has no routes".to_string(),
                });
            }
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(XdsError::InconsistentSnapshot {
                missing: missing.into_iter().collect(),
            })
        }
    }

    fn upstream_secret(&self) -> Option<&Secret> {
        self.secrets.get(UPSTREAM_CLIENT_SECRET)
    }

    fn downstream_secret(&self) -> Option<&Secret> {
        self.secrets.get(DOWNSTREAM_SERVER_SECRET)
    }

    /// Clusters, including the pipeline-gateway and mirror clusters.
    pub fn cluster_contents(&self) -> XdsResult<Vec<BoxResource>> {
        let secret = self.upstream_secret();
        let secret_refs = secret_references(secret);
        let gateway = &self.pipeline_gateway;

        let mut contents = Vec::with_capacity(self.clusters.len() + 4);
        let mut push = |name: &str,
                        endpoints: Vec<&Endpoint>,
                        transport: Transport,
                        secret: Option<&Secret>|
         -> XdsResult<()> {
            let cluster = make_cluster(name, endpoints, transport, secret)?;
            let refs = if secret.is_some() {
                secret_refs.clone()
            } else {
                Vec::new()
            };
            contents.push(ProtoResource::new(name, cluster).with_references(refs).boxed());
            Ok(())
        };

        let gateway_http = Endpoint::new(gateway.host.clone(), gateway.http_port);
        let gateway_grpc = Endpoint::new(gateway.host.clone(), gateway.grpc_port);
        push(
            pipeline_gateway_cluster(Transport::Http),
            vec![&gateway_http],
            Transport::Http,
            secret,
        )?;
        push(
            pipeline_gateway_cluster(Transport::Grpc),
            vec![&gateway_grpc],
            Transport::Grpc,
            secret,
        )?;
        // mirror traffic loops back to the local mirror listener
        for transport in Transport::ALL {
            push(
                mirror_cluster(transport),
                vec![&self.mirror_endpoint],
                transport,
                None,
            )?;
        }

        for cluster in self.clusters.values() {
            push(
                cluster.name.as_str(),
                cluster.endpoints.values().collect(),
                cluster.transport,
                secret,
            )?;
        }
        Ok(contents)
    }

    /// The primary and mirror route configurations.
    pub fn route_contents(&self) -> XdsResult<Vec<BoxResource>> {
        let (primary, mirror) =
            make_route_configurations(self.routes.values(), self.pipelines.values());
        Ok([primary, mirror]
            .into_iter()
            .map(|config| {
                let refs: Vec<_> = cluster_references(&config)
                    .into_iter()
                    .map(ResourceRef::cluster)
                    .collect();
                ProtoResource::new(config.name.clone(), config)
                    .with_references(refs)
                    .boxed()
            })
            .collect())
    }

    /// The listeners, with TLS when downstream TLS is active.
    pub fn listener_contents(&self) -> XdsResult<Vec<BoxResource>> {
        let secret = self.downstream_secret();
        let secret_refs = secret_references(secret);
        self.listeners
            .values()
            .map(|listener| {
                let built = make_http_listener(listener, secret, &self.envoy)?;
                let refs = std::iter::once(ResourceRef::route(&listener.route_config_name))
                    .chain(secret_refs.iter().cloned());
                Ok(ProtoResource::new(listener.name.clone(), built)
                    .with_references(refs)
                    .boxed())
            })
            .collect()
    }

    /// SDS secrets for every installed certificate, from the material read
    /// at install or the last [`rotate_secrets`](Self::rotate_secrets).
    pub fn secret_contents(&self) -> XdsResult<Vec<BoxResource>> {
        Ok(self
            .secrets
            .values()
            .flat_map(secret_resources)
            .map(|secret| ProtoResource::new(secret.name.clone(), secret).boxed())
            .collect())
    }

    /// Bundle the current state into a validated snapshot.
    pub fn snapshot(&self, version: impl Into<String>) -> XdsResult<Snapshot> {
        Snapshot::builder()
            .version(version)
            .resources(TypeUrl::CLUSTER, self.cluster_contents()?)
            .resources(TypeUrl::ROUTE, self.route_contents()?)
            .resources(TypeUrl::LISTENER, self.listener_contents()?)
            .resources(TypeUrl::SECRET, self.secret_contents()?)
            .build_validated()
    }
}

/// Names of the SDS secrets a TLS context built from `secret` refers to.
fn secret_references(secret: Option<&Secret>) -> Vec<ResourceRef> {
    secret
        .map(secret_resources)
        .unwrap_or_default()
        .into_iter()
        .map(|s| ResourceRef::secret(s.name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certs::StaticCertificates;
    use crate::names::{cluster_names, MIRROR_HTTP_CLUSTER, PIPELINE_GATEWAY_GRPC_CLUSTER};

    fn cache() -> XdsCache {
        XdsCache::new(&MeshConfig::default())
    }

    fn split(
        model: &str,
        version: u32,
        weight: u32,
        server: &str,
        replicas: &[usize],
    ) -> TrafficSplit {
        let (http_cluster, grpc_cluster) = cluster_names(server, replicas);
        TrafficSplit {
            model_name: model.to_string(),
            model_version: version,
            weight,
            http_cluster,
            grpc_cluster,
        }
    }

    /// Route `route` to `split`, with its clusters and one endpoint each.
    fn add_model(cache: &mut XdsCache, route: &str, split: TrafficSplit, mirror: bool) {
        for transport in Transport::ALL {
            let cluster = split.cluster(transport).to_string();
            cache.add_cluster(&cluster, route, &split.model_name, split.model_version, transport);
            cache.add_endpoint(&cluster, "server-0.svc", 9000).unwrap();
        }
        cache.add_route_traffic(route, split, false, mirror).unwrap();
    }

    fn names(resources: &[BoxResource]) -> Vec<String> {
        resources.iter().map(|r| r.name().to_string()).collect()
    }

    #[test]
    fn new_cache_has_listeners_and_infra_clusters() {
        let cache = cache();

        assert!(cache.listener(DEFAULT_LISTENER_NAME).is_some());
        assert_eq!(
            cache.listener(MIRROR_LISTENER_NAME).unwrap().route_config_name,
            MIRROR_ROUTE_CONFIG_NAME
        );
        assert_eq!(
            names(&cache.cluster_contents().unwrap()),
            vec!["pipelinegateway_http", "pipelinegateway_grpc", "mirror_http", "mirror_grpc"]
        );
        assert!(cache.secret_contents().unwrap().is_empty());
        assert!(cache.snapshot("1").is_ok());
    }

    #[test]
    fn model_route_end_to_end() {
        let mut cache = cache();
        add_model(&mut cache, "m", split("m", 1, 100, "s", &[0]), false);
        cache.add_endpoint(&cluster_names("s", &[0]).0, "server-1.svc", 9000).unwrap();

        let route = cache.route("m").unwrap();
        assert_eq!(route.splits.len(), 1);
        assert_eq!(route.splits[0].weight, 100);
        assert_eq!(cache.cluster_count(), 2);
        assert_eq!(
            cache.cluster(&cluster_names("s", &[0]).0).unwrap().endpoints.len(),
            2
        );
        cache.verify_references().unwrap();

        cache.remove_route("m").unwrap();
        assert!(cache.route("m").is_none());
        assert_eq!(cache.cluster_count(), 0);
        cache.verify_references().unwrap();
    }

    #[test]
    fn add_route_traffic_is_idempotent() {
        let mut cache = cache();
        let s = split("m", 1, 100, "s", &[0]);
        cache.add_route_traffic("m", s.clone(), false, false).unwrap();
        cache.add_route_traffic("m", s, false, false).unwrap();
        assert_eq!(cache.route("m").unwrap().splits.len(), 1);

        cache.add_route_traffic("m", split("m", 1, 60, "s", &[0]), false, false).unwrap();
        assert_eq!(cache.route("m").unwrap().splits[0].weight, 60);
    }

    #[test]
    fn log_payloads_is_sticky() {
        let mut cache = cache();
        cache.add_route_traffic("m", split("m", 1, 50, "s", &[0]), true, false).unwrap();
        cache.add_route_traffic("m", split("m", 2, 50, "s", &[1]), false, false).unwrap();
        assert!(cache.route("m").unwrap().log_payloads);
    }

    #[test]
    fn shared_cluster_survives_partial_removal() {
        let mut cache = cache();
        add_model(&mut cache, "a", split("a", 1, 100, "s", &[0, 1]), false);
        add_model(&mut cache, "b", split("b", 1, 100, "s", &[1, 0]), false);

        assert_eq!(cache.cluster_count(), 2);
        let (http, _) = cluster_names("s", &[0, 1]);
        assert_eq!(cache.cluster(&http).unwrap().routes.len(), 2);

        cache.remove_route("a").unwrap();
        assert_eq!(cache.cluster(&http).unwrap().routes.len(), 1);

        cache.remove_route("b").unwrap();
        assert!(cache.cluster(&http).is_none());
    }

    #[test]
    fn remove_route_with_missing_cluster_fails_without_change() {
        let mut cache = cache();
        cache.add_route_traffic("m", split("m", 1, 100, "s", &[0]), false, false).unwrap();

        match cache.remove_route("m") {
            Err(XdsError::DanglingClusterReference { route, .. }) => assert_eq!(route, "m"),
            other => panic!("expected dangling reference, got {other:?}"),
        }
        assert!(cache.route("m").is_some());
        assert!(cache.verify_references().is_err());
    }

    #[test]
    fn remove_missing_route_is_ok() {
        let mut cache = cache();
        assert!(cache.remove_route("nope").is_ok());
    }

    #[test]
    fn remove_route_releases_claims_without_splits() {
        let mut cache = cache();
        let (http, _) = cluster_names("s", &[0]);
        cache.add_cluster(&http, "m", "m", 1, Transport::Http);

        cache.remove_route("m").unwrap();
        assert!(cache.cluster(&http).is_none());
    }

    #[test]
    fn mirror_split_shares_cluster_with_primary() {
        let mut cache = cache();
        let s = split("m", 1, 100, "s", &[0]);
        add_model(&mut cache, "m", s.clone(), false);
        add_model(&mut cache, "m", split("m", 1, 10, "s", &[0]), true);

        cache.remove_route("m").unwrap();
        assert_eq!(cache.cluster_count(), 0);
    }

    #[test]
    fn mirror_without_splits_is_refused() {
        let mut cache = cache();
        let mirror = split("shadow", 1, 10, "s", &[1]);

        assert!(matches!(
            cache.add_route_traffic("m", mirror.clone(), false, true),
            Err(XdsError::InvalidResource { .. })
        ));
        assert!(cache.route("m").is_none());

        add_model(&mut cache, "m", split("m", 1, 100, "s", &[0]), false);
        cache.add_route_traffic("m", mirror, false, true).unwrap();
        assert!(cache.route("m").unwrap().mirror.is_some());
    }

    #[test]
    fn set_endpoints_replaces_moved_replicas() {
        let mut cache = cache();
        add_model(&mut cache, "a", split("a", 1, 100, "s", &[0]), false);
        add_model(&mut cache, "b", split("b", 1, 100, "s", &[0]), false);
        let (http, _) = cluster_names("s", &[0]);

        cache
            .set_endpoints(&http, [Endpoint::new("server-0-new.svc", 9000)])
            .unwrap();

        let endpoints: Vec<_> = cache.cluster(&http).unwrap().endpoints.keys().cloned().collect();
        assert_eq!(endpoints, vec!["server-0-new.svc:9000"]);
        assert!(matches!(
            cache.set_endpoints("ghost", []),
            Err(XdsError::ResourceNotFound { .. })
        ));
    }

    #[test]
    fn add_endpoint_requires_cluster() {
        let mut cache = cache();
        assert!(matches!(
            cache.add_endpoint("ghost", "h", 1),
            Err(XdsError::ResourceNotFound { .. })
        ));
    }

    #[test]
    fn route_contents_reference_clusters() {
        let mut cache = cache();
        add_model(&mut cache, "m", split("m", 1, 100, "s", &[0]), false);
        cache.add_pipeline_route(
            "p.pipeline",
            vec![PipelineTrafficSplit::new("p", 100)],
            None,
        );

        let routes = cache.route_contents().unwrap();
        assert_eq!(names(&routes), vec!["listener_0", "listener_1"]);
        let refs = routes[0].references();
        assert!(refs.contains(&ResourceRef::cluster(PIPELINE_GATEWAY_GRPC_CLUSTER)));
        assert!(refs.contains(&ResourceRef::cluster(cluster_names("s", &[0]).1)));

        let snapshot = cache.snapshot("7").unwrap();
        assert_eq!(snapshot.version(), "7");
        assert_eq!(snapshot.get_resources(TypeUrl::CLUSTER).unwrap().len(), 6);

        assert!(cache.remove_pipeline_route("p.pipeline"));
        assert!(!cache.remove_pipeline_route("p.pipeline"));
    }

    #[test]
    fn tls_secrets_are_emitted_and_referenced() {
        let mut cache = cache();
        let provider = Arc::new(
            StaticCertificates::new(b"crt".to_vec(), b"key".to_vec()).with_ca(b"ca".to_vec()),
        );
        cache.enable_upstream_tls(provider.clone()).unwrap();
        cache.enable_downstream_tls(provider).unwrap();
        assert!(cache.upstream_tls_active());
        assert!(cache.downstream_tls_active());

        let secrets = cache.secret_contents().unwrap();
        assert_eq!(
            names(&secrets),
            vec![
                "downstream_client",
                "downstream_server",
                "upstream_server",
                "upstream_client"
            ]
        );

        let clusters = cache.cluster_contents().unwrap();
        let mirror = clusters.iter().find(|c| c.name() == MIRROR_HTTP_CLUSTER).unwrap();
        assert!(mirror.references().is_empty());
        assert!(clusters[0]
            .references()
            .contains(&ResourceRef::secret(UPSTREAM_CLIENT_SECRET)));

        cache.snapshot("1").unwrap();
    }

    #[test]
    fn tls_without_certificate_is_plaintext() {
        let mut cache = cache();
        cache.enable_upstream_tls(Arc::new(StaticCertificates::empty())).unwrap();

        assert!(cache.secret_contents().unwrap().is_empty());
        assert!(cache.cluster_contents().unwrap()[0].references().is_empty());
        cache.snapshot("1").unwrap();
    }

    #[test]
    fn setup_tls_reads_certificate_paths() {
        let dir = tempfile::tempdir().unwrap();
        let crt = dir.path().join("tls.crt");
        let key = dir.path().join("tls.key");
        std::fs::write(&crt, b"crt").unwrap();
        std::fs::write(&key, b"key").unwrap();

        let security = SecurityConfig {
            upstream: SecurityProtocol::Ssl,
            downstream: SecurityProtocol::Plaintext,
        };
        let lookup = |k: &str| match k {
            "ENVOY_UPSTREAM_CLIENT_TLS_CRT_PATH" => Some(crt.display().to_string()),
            "ENVOY_UPSTREAM_CLIENT_TLS_KEY_PATH" => Some(key.display().to_string()),
            _ => None,
        };

        let mut cache = cache();
        cache.setup_tls_with(&security, lookup).unwrap();
        assert!(cache.upstream_tls_active());
        assert!(!cache.downstream_tls_active());
        assert!(cache.secret(UPSTREAM_CLIENT_SECRET).is_some());
    }

    #[test]
    fn rotation_failure_keeps_tls() {
        let dir = tempfile::tempdir().unwrap();
        let crt = dir.path().join("tls.crt");
        let key = dir.path().join("tls.key");
        std::fs::write(&crt, b"crt-1").unwrap();
        std::fs::write(&key, b"key-1").unwrap();

        let mut cache = cache();
        cache
            .enable_upstream_tls(Arc::new(PemFileCertificates::new(&crt, &key, None)))
            .unwrap();

        std::fs::remove_file(&crt).unwrap();
        cache.snapshot("1").unwrap();
        assert!(matches!(cache.rotate_secrets(), Err(XdsError::Configuration(_))));
        assert!(cache.cluster_contents().unwrap()[0]
            .references()
            .contains(&ResourceRef::secret(UPSTREAM_CLIENT_SECRET)));
        assert_eq!(names(&cache.secret_contents().unwrap()), vec!["upstream_client"]);

        std::fs::write(&crt, b"crt-2").unwrap();
        cache.rotate_secrets().unwrap();
        let secret = cache.secret(UPSTREAM_CLIENT_SECRET).unwrap();
        assert_eq!(secret.certificate().unwrap().certificate_chain, b"crt-2");
    }

    #[test]
    fn enable_tls_with_unreadable_files_fails() {
        let mut cache = cache();
        let provider = PemFileCertificates::new("/nonexistent/tls.crt", "/nonexistent/tls.key", None);
        assert!(cache.enable_downstream_tls(Arc::new(provider)).is_err());
        assert!(!cache.downstream_tls_active());
    }

    #[test]
    fn setup_tls_fails_without_paths() {
        let security = SecurityConfig {
            upstream: SecurityProtocol::Plaintext,
            downstream: SecurityProtocol::Ssl,
        };
        let mut cache = cache();
        assert!(matches!(
            cache.setup_tls_with(&security, |_| None),
            Err(XdsError::Configuration(_))
        ));
    }
}
