//! Clusters and their load assignments.

use std::collections::HashMap;

use prost_types::Duration;
use xds_core::XdsResult;
use xds_types::envoy::config::cluster::v3::{
    circuit_breakers, cluster, CircuitBreakers, Cluster as EnvoyCluster,
};
use xds_types::envoy::config::core::v3::{Address, Http2ProtocolOptions};
use xds_types::envoy::config::endpoint::v3::{
    lb_endpoint, ClusterLoadAssignment, Endpoint as EnvoyEndpoint, LbEndpoint,
    LocalityLbEndpoints,
};
use xds_types::envoy::extensions::upstreams::http::v3::{
    http_protocol_options, HttpProtocolOptions,
};

use super::pack;
use super::tls::upstream_transport_socket;
use crate::model::{Endpoint, Secret, Transport};

const HTTP_PROTOCOL_OPTIONS_KEY: &str = "envoy.extensions.upstreams.http.v3.HttpProtocolOptions";
const CONNECT_TIMEOUT_SECS: i64 = 5;
const DNS_REFRESH_SECS: i64 = 2;
const MAX_RETRIES: u32 = 5;

/// Build a STRICT_DNS, least-request cluster.
///
/// gRPC clusters are forced to HTTP/2 through explicit protocol options.
/// With a secret holding a certificate, the cluster talks TLS.
pub fn make_cluster<'a>(
    name: &str,
    endpoints: impl IntoIterator<Item = &'a Endpoint>,
    transport: Transport,
    client_secret: Option<&Secret>,
) -> XdsResult<EnvoyCluster> {
    let mut typed_extension_protocol_options = HashMap::new();
    if transport.is_grpc() {
        let options = HttpProtocolOptions {
            upstream_protocol_options: Some(
                http_protocol_options::UpstreamProtocolOptions::ExplicitHttpConfig(
                    http_protocol_options::ExplicitHttpConfig {
                        protocol_config: Some(
                            http_protocol_options::explicit_http_config::ProtocolConfig::Http2ProtocolOptions(
                                Http2ProtocolOptions::default(),
                            ),
                        ),
                    },
                ),
            ),
        };
        typed_extension_protocol_options
            .insert(HTTP_PROTOCOL_OPTIONS_KEY.to_string(), pack(&options)?);
    }

    Ok(EnvoyCluster {
        name: name.to_string(),
        connect_timeout: Some(Duration {
            seconds: CONNECT_TIMEOUT_SECS,
            nanos: 0,
        }),
        cluster_discovery_type: Some(cluster::ClusterDiscoveryType::Type(
            cluster::DiscoveryType::StrictDns as i32,
        )),
        lb_policy: cluster::LbPolicy::LeastRequest as i32,
        load_assignment: Some(make_load_assignment(name, endpoints)),
        dns_lookup_family: cluster::DnsLookupFamily::V4Only as i32,
        dns_refresh_rate: Some(Duration {
            seconds: DNS_REFRESH_SECS,
            nanos: 0,
        }),
        typed_extension_protocol_options,
        transport_socket: upstream_transport_socket(client_secret)?,
        circuit_breakers: Some(CircuitBreakers {
            thresholds: vec![circuit_breakers::Thresholds {
                max_retries: Some(MAX_RETRIES),
                ..Default::default()
            }],
        }),
    })
}

/// Single-locality load assignment over `endpoints`.
pub fn make_load_assignment<'a>(
    cluster_name: &str,
    endpoints: impl IntoIterator<Item = &'a Endpoint>,
) -> ClusterLoadAssignment {
    let lb_endpoints = endpoints
        .into_iter()
        .map(|e| LbEndpoint {
            host_identifier: Some(lb_endpoint::HostIdentifier::Endpoint(EnvoyEndpoint {
                address: Some(Address::tcp(e.host.clone(), e.port)),
                ..Default::default()
            })),
            ..Default::default()
        })
        .collect();

    ClusterLoadAssignment {
        cluster_name: cluster_name.to_string(),
        endpoints: vec![LocalityLbEndpoints {
            lb_endpoints,
            ..Default::default()
        }],
    }
}
