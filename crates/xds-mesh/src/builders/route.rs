//! Route configurations: weighted splits, mirrors and sticky sessions.
//!
//! Every model or pipeline route becomes one weighted-cluster route per
//! transport on the primary listener. Experiments (more than one split)
//! get a sticky-session route per split and transport, placed ahead of the
//! weighted route so a client carrying an `x-seldon-route` marker keeps
//! hitting the version it was first given. A mirror split becomes a
//! request-mirror policy on the primary route plus a route of its own on
//! the mirror listener.

use std::collections::BTreeSet;

use prost_types::Duration;
use xds_types::envoy::config::core::v3::{HeaderValueOption, RuntimeFractionalPercent};
use xds_types::envoy::config::route::v3::{
    retry_policy, route, route_action, route_match, weighted_cluster, HeaderMatcher,
    Route as EnvoyRoute, RouteAction, RouteConfiguration, RouteMatch, RetryPolicy, VirtualHost,
    WeightedCluster,
};
use xds_types::envoy::r#type::matcher::v3::StringMatcher;
use xds_types::envoy::r#type::v3::{fractional_percent, FractionalPercent};

use crate::model::{PipelineRoute, PipelineTrafficSplit, Route, TrafficSplit, Transport};
use crate::names::{
    envoy_route_name, mirror_cluster, pipeline_gateway_cluster, pipeline_route_name,
    sticky_route_name, versioned_model_name, wrap_route_header, DEFAULT_ROUTE_CONFIG_NAME,
    DEFAULT_VIRTUAL_HOST, GRPC_PATH_PREFIX, HTTP_PATH_PREFIX, MIRROR_ROUTE_CONFIG_NAME,
    MIRROR_VIRTUAL_HOST, SELDON_INTERNAL_MODEL_HEADER, SELDON_LOGGING_HEADER, SELDON_MODEL_HEADER,
    SELDON_ROUTE_HEADER,
};

const RETRY_ON: &str = "5xx,connect-failure";
const NUM_RETRIES: u32 = 5;
const RETRY_BASE_INTERVAL_NANOS: i32 = 500_000_000;

/// Number of Envoy routes each route configuration will hold.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RouteCounts {
    /// Routes on the primary listener.
    pub primary: usize,
    /// Routes on the mirror listener.
    pub mirror: usize,
}

/// Exact route counts: two per route, two per experiment split, two per mirror.
pub fn route_counts<'a>(
    routes: impl IntoIterator<Item = &'a Route>,
    pipelines: impl IntoIterator<Item = &'a PipelineRoute>,
) -> RouteCounts {
    let mut counts = RouteCounts::default();
    let mut add = |splits: usize, mirrored: bool| {
        counts.primary += 2;
        if splits > 1 {
            counts.primary += 2 * splits;
        }
        if mirrored {
            counts.mirror += 2;
        }
    };
    for r in routes {
        add(r.splits.len(), r.mirror.is_some());
    }
    for p in pipelines {
        add(p.splits.len(), p.mirror.is_some());
    }
    counts
}

fn path_prefix(transport: Transport) -> route_match::PathSpecifier {
    let prefix = match transport {
        Transport::Http => HTTP_PATH_PREFIX,
        Transport::Grpc => GRPC_PATH_PREFIX,
    };
    route_match::PathSpecifier::Prefix(prefix.to_string())
}

fn no_timeout() -> Option<Duration> {
    Some(Duration::default())
}

fn logging_header() -> HeaderValueOption {
    HeaderValueOption::new(SELDON_LOGGING_HEADER, "true")
}

/// Requests without a sticky marker, addressed to `route_name`.
fn unpinned_match(route_name: &str, transport: Transport) -> RouteMatch {
    RouteMatch {
        path_specifier: Some(path_prefix(transport)),
        headers: vec![
            HeaderMatcher::string(SELDON_MODEL_HEADER, StringMatcher::exact(route_name)),
            HeaderMatcher::present(SELDON_ROUTE_HEADER, false),
        ],
        ..Default::default()
    }
}

/// Mirror `weight` percent of requests to the mirror listener.
pub fn mirror_policies(weight: u32, transport: Transport) -> Vec<route_action::RequestMirrorPolicy> {
    vec![route_action::RequestMirrorPolicy {
        cluster: mirror_cluster(transport).to_string(),
        runtime_fraction: Some(RuntimeFractionalPercent {
            default_value: Some(FractionalPercent {
                numerator: weight,
                denominator: fractional_percent::DenominatorType::Hundred as i32,
            }),
            ..Default::default()
        }),
        ..Default::default()
    }]
}

fn weighted_action(
    clusters: Vec<weighted_cluster::ClusterWeight>,
    mirror_weight: Option<u32>,
    transport: Transport,
    retry_policy: Option<RetryPolicy>,
) -> RouteAction {
    let total_weight = clusters.iter().filter_map(|c| c.weight).sum();
    RouteAction {
        timeout: no_timeout(),
        retry_policy,
        request_mirror_policies: mirror_weight
            .map(|w| mirror_policies(w, transport))
            .unwrap_or_default(),
        cluster_specifier: Some(route_action::ClusterSpecifier::WeightedClusters(
            WeightedCluster {
                clusters,
                total_weight: Some(total_weight),
                ..Default::default()
            },
        )),
    }
}

/// Weighted split over model versions.
///
/// Each entry tells the agent which version to run through
/// `seldon-internal-model` and returns the sticky marker for that version.
pub fn weighted_model_action(
    splits: &[TrafficSplit],
    mirror: Option<&TrafficSplit>,
    transport: Transport,
) -> RouteAction {
    let clusters = splits
        .iter()
        .map(|split| {
            let versioned = versioned_model_name(&split.model_name, split.model_version);
            weighted_cluster::ClusterWeight {
                name: split.cluster(transport).to_string(),
                weight: Some(split.weight),
                request_headers_to_remove: vec![SELDON_INTERNAL_MODEL_HEADER.to_string()],
                request_headers_to_add: vec![HeaderValueOption::new(
                    SELDON_INTERNAL_MODEL_HEADER,
                    versioned.clone(),
                )],
                response_headers_to_add: vec![HeaderValueOption::new(
                    SELDON_ROUTE_HEADER,
                    wrap_route_header(&versioned),
                )],
                ..Default::default()
            }
        })
        .collect();

    let retry = RetryPolicy {
        retry_on: RETRY_ON.to_string(),
        num_retries: Some(NUM_RETRIES),
        retry_back_off: Some(retry_policy::RetryBackOff {
            base_interval: Some(Duration {
                seconds: 0,
                nanos: RETRY_BASE_INTERVAL_NANOS,
            }),
            ..Default::default()
        }),
        ..Default::default()
    };

    weighted_action(clusters, mirror.map(|m| m.weight), transport, Some(retry))
}

/// Weighted split over pipelines, all served by the pipeline gateway.
pub fn weighted_pipeline_action(
    splits: &[PipelineTrafficSplit],
    mirror: Option<&PipelineTrafficSplit>,
    transport: Transport,
) -> RouteAction {
    let clusters = splits
        .iter()
        .map(|split| {
            let internal = pipeline_route_name(&split.pipeline_name);
            weighted_cluster::ClusterWeight {
                name: pipeline_gateway_cluster(transport).to_string(),
                weight: Some(split.weight),
                response_headers_to_add: vec![HeaderValueOption::new(
                    SELDON_ROUTE_HEADER,
                    wrap_route_header(&internal),
                )],
                request_headers_to_add: vec![HeaderValueOption::new(
                    SELDON_INTERNAL_MODEL_HEADER,
                    internal,
                )],
                ..Default::default()
            }
        })
        .collect();

    weighted_action(clusters, mirror.map(|m| m.weight), transport, None)
}

fn direct_action(cluster: &str) -> Option<route::Action> {
    Some(route::Action::Route(RouteAction {
        timeout: no_timeout(),
        cluster_specifier: Some(route_action::ClusterSpecifier::Cluster(cluster.to_string())),
        ..Default::default()
    }))
}

/// Weighted route for a model route on the primary listener.
pub fn model_route(route: &Route, transport: Transport) -> EnvoyRoute {
    EnvoyRoute {
        name: envoy_route_name(&route.name, transport, false),
        r#match: Some(unpinned_match(&route.name, transport)),
        response_headers_to_add: if route.log_payloads {
            vec![logging_header()]
        } else {
            Vec::new()
        },
        action: Some(route::Action::Route(weighted_model_action(
            &route.splits,
            route.mirror.as_ref(),
            transport,
        ))),
        ..Default::default()
    }
}

/// Route on the mirror listener for a model route's mirror split.
pub fn model_mirror_route(route: &Route, transport: Transport) -> Option<EnvoyRoute> {
    let mirror = route.mirror.as_ref()?;
    Some(EnvoyRoute {
        name: envoy_route_name(&route.name, transport, true),
        r#match: Some(unpinned_match(&route.name, transport)),
        response_headers_to_add: if route.log_payloads {
            vec![logging_header()]
        } else {
            Vec::new()
        },
        action: Some(route::Action::Route(weighted_model_action(
            std::slice::from_ref(mirror),
            None,
            transport,
        ))),
        ..Default::default()
    })
}

/// Route pinning a client to one model version of an experiment.
pub fn model_sticky_route(
    route_name: &str,
    log_payloads: bool,
    split: &TrafficSplit,
    transport: Transport,
) -> EnvoyRoute {
    let versioned = versioned_model_name(&split.model_name, split.model_version);
    let mut response_headers_to_add = vec![HeaderValueOption::new(
        SELDON_ROUTE_HEADER,
        wrap_route_header(&versioned),
    )];
    if log_payloads {
        response_headers_to_add.push(logging_header());
    }

    EnvoyRoute {
        name: sticky_route_name(route_name, transport),
        r#match: Some(RouteMatch {
            path_specifier: Some(path_prefix(transport)),
            headers: vec![
                HeaderMatcher::string(SELDON_MODEL_HEADER, StringMatcher::exact(route_name)),
                HeaderMatcher::string(
                    SELDON_ROUTE_HEADER,
                    StringMatcher::contains(wrap_route_header(&versioned)),
                ),
            ],
            ..Default::default()
        }),
        request_headers_to_add: vec![
            HeaderValueOption::new(SELDON_INTERNAL_MODEL_HEADER, versioned),
            HeaderValueOption::new(SELDON_MODEL_HEADER, split.model_name.clone()),
        ],
        response_headers_to_add,
        action: direct_action(split.cluster(transport)),
        ..Default::default()
    }
}

/// Weighted route for a pipeline route on the primary listener.
pub fn pipeline_route(route: &PipelineRoute, transport: Transport) -> EnvoyRoute {
    EnvoyRoute {
        name: envoy_route_name(&route.name, transport, false),
        r#match: Some(unpinned_match(&route.name, transport)),
        action: Some(route::Action::Route(weighted_pipeline_action(
            &route.splits,
            route.mirror.as_ref(),
            transport,
        ))),
        ..Default::default()
    }
}

/// Route on the mirror listener for a pipeline route's mirror split.
pub fn pipeline_mirror_route(route: &PipelineRoute, transport: Transport) -> Option<EnvoyRoute> {
    let mirror = route.mirror.as_ref()?;
    Some(EnvoyRoute {
        name: envoy_route_name(&route.name, transport, true),
        r#match: Some(unpinned_match(&route.name, transport)),
        action: Some(route::Action::Route(weighted_pipeline_action(
            std::slice::from_ref(mirror),
            None,
            transport,
        ))),
        ..Default::default()
    })
}

/// Route pinning a client to one pipeline of an experiment.
pub fn pipeline_sticky_route(
    route_name: &str,
    split: &PipelineTrafficSplit,
    transport: Transport,
) -> EnvoyRoute {
    let internal = pipeline_route_name(&split.pipeline_name);
    EnvoyRoute {
        name: sticky_route_name(route_name, transport),
        r#match: Some(RouteMatch {
            path_specifier: Some(path_prefix(transport)),
            headers: vec![
                HeaderMatcher::string(
                    SELDON_ROUTE_HEADER,
                    StringMatcher::contains(wrap_route_header(&internal)),
                ),
                HeaderMatcher::string(SELDON_MODEL_HEADER, StringMatcher::exact(route_name)),
            ],
            ..Default::default()
        }),
        response_headers_to_add: vec![HeaderValueOption::new(
            SELDON_ROUTE_HEADER,
            wrap_route_header(&internal),
        )],
        request_headers_to_add: vec![HeaderValueOption::new(
            SELDON_INTERNAL_MODEL_HEADER,
            internal,
        )],
        action: direct_action(pipeline_gateway_cluster(transport)),
        ..Default::default()
    }
}

fn route_configuration(name: &str, virtual_host: &str, routes: Vec<EnvoyRoute>) -> RouteConfiguration {
    RouteConfiguration {
        name: name.to_string(),
        virtual_hosts: vec![VirtualHost {
            name: virtual_host.to_string(),
            domains: vec!["*".to_string()],
            routes,
        }],
    }
}

/// The primary (`listener_0`) and mirror (`listener_1`) route configurations.
pub fn make_route_configurations<'a>(
    routes: impl IntoIterator<Item = &'a Route> + Clone,
    pipelines: impl IntoIterator<Item = &'a PipelineRoute> + Clone,
) -> (RouteConfiguration, RouteConfiguration) {
    let counts = route_counts(routes.clone(), pipelines.clone());
    let mut primary = Vec::with_capacity(counts.primary);
    let mut mirrors = Vec::with_capacity(counts.mirror);

    for r in routes {
        if r.is_experiment() {
            for split in &r.splits {
                for transport in Transport::ALL {
                    primary.push(model_sticky_route(&r.name, r.log_payloads, split, transport));
                }
            }
        }
        for transport in Transport::ALL {
            primary.push(model_route(r, transport));
        }
        for transport in Transport::ALL {
            mirrors.extend(model_mirror_route(r, transport));
        }
    }

    for p in pipelines {
        if p.is_experiment() {
            for split in &p.splits {
                for transport in Transport::ALL {
                    primary.push(pipeline_sticky_route(&p.name, split, transport));
                }
            }
        }
        for transport in Transport::ALL {
            primary.push(pipeline_route(p, transport));
        }
        for transport in Transport::ALL {
            mirrors.extend(pipeline_mirror_route(p, transport));
        }
    }

    (
        route_configuration(DEFAULT_ROUTE_CONFIG_NAME, DEFAULT_VIRTUAL_HOST, primary),
        route_configuration(MIRROR_ROUTE_CONFIG_NAME, MIRROR_VIRTUAL_HOST, mirrors),
    )
}

/// Every cluster a route configuration can send traffic to.
pub fn cluster_references(config: &RouteConfiguration) -> BTreeSet<String> {
    let mut clusters = BTreeSet::new();
    let actions = config
        .virtual_hosts
        .iter()
        .flat_map(|vh| vh.routes.iter())
        .filter_map(|r| match &r.action {
            Some(route::Action::Route(action)) => Some(action),
            None => None,
        });

    for action in actions {
        match &action.cluster_specifier {
            Some(route_action::ClusterSpecifier::Cluster(name)) => {
                clusters.insert(name.clone());
            }
            Some(route_action::ClusterSpecifier::WeightedClusters(weighted)) => {
                clusters.extend(weighted.clusters.iter().map(|c| c.name.clone()));
            }
            Some(route_action::ClusterSpecifier::ClusterHeader(_)) | None => {}
        }
        clusters.extend(action.request_mirror_policies.iter().map(|m| m.cluster.clone()));
    }
    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names::{MIRROR_GRPC_CLUSTER, PIPELINE_GATEWAY_HTTP_CLUSTER};
    use xds_types::envoy::config::route::v3::header_matcher::HeaderMatchSpecifier;
    use xds_types::envoy::r#type::matcher::v3::string_matcher::MatchPattern;

    fn split(model: &str, version: u32, weight: u32) -> TrafficSplit {
        TrafficSplit {
            model_name: model.to_string(),
            model_version: version,
            weight,
            http_cluster: format!("{model}_{version}_http"),
            grpc_cluster: format!("{model}_{version}_grpc"),
        }
    }

    fn experiment(versions: &[(u32, u32)]) -> Route {
        let mut route = Route::new("iris");
        route.splits = versions.iter().map(|(v, w)| split("iris", *v, *w)).collect();
        route
    }

    fn weighted(action: &RouteAction) -> &WeightedCluster {
        match &action.cluster_specifier {
            Some(route_action::ClusterSpecifier::WeightedClusters(w)) => w,
            other => panic!("expected weighted clusters, got {other:?}"),
        }
    }

    fn action(route: &EnvoyRoute) -> &RouteAction {
        match &route.action {
            Some(route::Action::Route(a)) => a,
            None => panic!("route without action"),
        }
    }

    #[test]
    fn weights_are_conserved() {
        let route = experiment(&[(1, 20), (2, 30), (3, 50)]);
        let action = weighted_model_action(&route.splits, None, Transport::Http);
        let weighted = weighted(&action);

        assert_eq!(weighted.clusters.len(), 3);
        assert_eq!(weighted.total_weight, Some(route.total_weight()));
        assert_eq!(weighted.clusters[1].weight, Some(30));
        assert_eq!(weighted.clusters[1].name, "iris_2_http");
        assert_eq!(
            weighted.clusters[1].request_headers_to_add[0].header.as_ref().unwrap().value,
            "iris_2"
        );
        assert_eq!(
            weighted.clusters[1].response_headers_to_add[0].header.as_ref().unwrap().value,
            ":iris_2:"
        );
        assert_eq!(action.retry_policy.as_ref().unwrap().num_retries, Some(5));
    }

    #[test]
    fn mirror_policy_uses_mirror_cluster() {
        let route = experiment(&[(1, 100)]);
        let mirror = split("shadow", 1, 25);
        let action = weighted_model_action(&route.splits, Some(&mirror), Transport::Grpc);

        assert_eq!(action.request_mirror_policies.len(), 1);
        let policy = &action.request_mirror_policies[0];
        assert_eq!(policy.cluster, MIRROR_GRPC_CLUSTER);
        let fraction = policy.runtime_fraction.as_ref().unwrap().default_value.as_ref().unwrap();
        assert_eq!(fraction.numerator, 25);
        assert_eq!(
            fraction.denominator,
            fractional_percent::DenominatorType::Hundred as i32
        );
    }

    #[test]
    fn sticky_routes_per_version_and_transport() {
        let route = experiment(&[(1, 50), (2, 50)]);
        let (primary, mirror) = make_route_configurations([&route], []);
        let routes = &primary.virtual_hosts[0].routes;

        // two sticky routes per version, then the weighted http and grpc routes
        assert_eq!(routes.len(), 2 * 2 + 2);
        let names: Vec<_> = routes.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "iris_http_experiment",
                "iris_grpc_experiment",
                "iris_http_experiment",
                "iris_grpc_experiment",
                "iris_http",
                "iris_grpc",
            ]
        );
        assert!(mirror.virtual_hosts[0].routes.is_empty());

        let sticky = &routes[2];
        let headers = &sticky.r#match.as_ref().unwrap().headers;
        match &headers[1].header_match_specifier {
            Some(HeaderMatchSpecifier::StringMatch(m)) => {
                assert_eq!(m.match_pattern, Some(MatchPattern::Contains(":iris_2:".into())));
            }
            other => panic!("unexpected matcher {other:?}"),
        }
        assert!(matches!(
            &action(sticky).cluster_specifier,
            Some(route_action::ClusterSpecifier::Cluster(c)) if c == "iris_2_http"
        ));
    }

    #[test]
    fn single_split_has_no_sticky_routes() {
        let route = experiment(&[(1, 100)]);
        let (primary, _) = make_route_configurations([&route], []);
        assert_eq!(primary.virtual_hosts[0].routes.len(), 2);
    }

    #[test]
    fn log_payloads_tags_responses() {
        let mut route = experiment(&[(1, 50), (2, 50)]);
        route.log_payloads = true;

        let main = model_route(&route, Transport::Http);
        assert_eq!(
            main.response_headers_to_add[0].header.as_ref().unwrap().key,
            SELDON_LOGGING_HEADER
        );

        let sticky = model_sticky_route(&route.name, true, &route.splits[0], Transport::Http);
        let keys: Vec<_> = sticky
            .response_headers_to_add
            .iter()
            .map(|h| h.header.as_ref().unwrap().key.as_str())
            .collect();
        assert_eq!(keys, vec![SELDON_ROUTE_HEADER, SELDON_LOGGING_HEADER]);
        assert_eq!(sticky.request_headers_to_add.len(), 2);
    }

    #[test]
    fn counts_match_built_routes_with_mirrors() {
        let mut model = experiment(&[(1, 60), (2, 40)]);
        model.mirror = Some(split("shadow", 1, 10));
        let mut pipeline = PipelineRoute::new("fraud.pipeline");
        pipeline.splits.push(PipelineTrafficSplit::new("fraud", 100));
        pipeline.mirror = Some(PipelineTrafficSplit::new("fraud-v2", 5));

        let counts = route_counts([&model], [&pipeline]);
        let (primary, mirror) = make_route_configurations([&model], [&pipeline]);

        assert_eq!(counts.primary, primary.virtual_hosts[0].routes.len());
        assert_eq!(counts.mirror, mirror.virtual_hosts[0].routes.len());
        assert_eq!(counts, RouteCounts { primary: 8, mirror: 4 });
    }

    #[test]
    fn pipeline_routes_use_gateway() {
        let mut pipeline = PipelineRoute::new("ab.experiment");
        pipeline.splits = vec![
            PipelineTrafficSplit::new("fraud", 50),
            PipelineTrafficSplit::new("fraud-v2", 50),
        ];
        let (primary, _) = make_route_configurations([], [&pipeline]);

        let refs = cluster_references(&primary);
        assert_eq!(
            refs.into_iter().collect::<Vec<_>>(),
            vec!["pipelinegateway_grpc".to_string(), PIPELINE_GATEWAY_HTTP_CLUSTER.to_string()]
        );

        let sticky = pipeline_sticky_route(&pipeline.name, &pipeline.splits[1], Transport::Http);
        assert_eq!(
            sticky.request_headers_to_add[0].header.as_ref().unwrap().value,
            "fraud-v2.pipeline"
        );
    }

    #[test]
    fn references_include_mirrors() {
        let mut model = experiment(&[(1, 100)]);
        model.mirror = Some(split("shadow", 1, 10));
        let (primary, mirror) = make_route_configurations([&model], []);

        let refs = cluster_references(&primary);
        assert!(refs.contains("iris_1_http"));
        assert!(refs.contains("mirror_http"));
        assert!(!refs.contains("shadow_1_http"));
        assert!(cluster_references(&mirror).contains("shadow_1_grpc"));
    }
}
