//! # xds-types
//!
//! Envoy v3 protobuf messages used by the Seldon mesh control plane.
//!
//! This crate carries the subset of the Envoy data-plane API the mesh
//! emits:
//!
//! - Clusters and load assignments (CDS)
//! - Route configurations with weighted clusters, mirrors and retries (RDS)
//! - Listeners with the HTTP connection manager, tap, lua and router filters (LDS)
//! - TLS secrets and transport socket contexts (SDS)
//!
//! Messages are written with the `prost` derives, so field tags match the
//! upstream `.proto` files and the wire encoding is interchangeable with
//! generated code. Every message that is packed into a
//! [`prost_types::Any`] implements [`prost::Name`] with its
//! `type.googleapis.com/...` URL.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)] // Field docs live in the Envoy API reference

// Re-export prost types for convenience
pub use prost::Message;
pub use prost_types::{Any, Duration};

/// Implements [`prost::Name`] with a `type.googleapis.com` type URL.
macro_rules! envoy_name {
    ($ty:ty, $package:literal, $name:literal) => {
        impl ::prost::Name for $ty {
            const NAME: &'static str = $name;
            const PACKAGE: &'static str = $package;

            fn full_name() -> ::std::string::String {
                ::std::format!("{}.{}", $package, $name)
            }

            fn type_url() -> ::std::string::String {
                ::std::format!("type.googleapis.com/{}.{}", $package, $name)
            }
        }
    };
}

pub mod envoy {
    //! Envoy API packages.

    pub mod r#type {
        //! `envoy.type`

        pub mod v3 {
            //! `envoy.type.v3`

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct FractionalPercent {
                #[prost(uint32, tag = "1")]
                pub numerator: u32,
                #[prost(enumeration = "fractional_percent::DenominatorType", tag = "2")]
                pub denominator: i32,
            }

            pub mod fractional_percent {
                #[derive(
                    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration,
                )]
                #[repr(i32)]
                pub enum DenominatorType {
                    Hundred = 0,
                    TenThousand = 1,
                    Million = 2,
                }
            }
        }

        pub mod matcher {
            //! `envoy.type.matcher`

            pub mod v3 {
                //! `envoy.type.matcher.v3`

                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct StringMatcher {
                    #[prost(bool, tag = "6")]
                    pub ignore_case: bool,
                    #[prost(oneof = "string_matcher::MatchPattern", tags = "1, 2, 3, 7")]
                    pub match_pattern: Option<string_matcher::MatchPattern>,
                }

                pub mod string_matcher {
                    #[derive(Clone, PartialEq, ::prost::Oneof)]
                    pub enum MatchPattern {
                        #[prost(string, tag = "1")]
                        Exact(String),
                        #[prost(string, tag = "2")]
                        Prefix(String),
                        #[prost(string, tag = "3")]
                        Suffix(String),
                        #[prost(string, tag = "7")]
                        Contains(String),
                    }
                }

                impl StringMatcher {
                    /// Exact, case-sensitive match.
                    pub fn exact(value: impl Into<String>) -> Self {
                        Self {
                            ignore_case: false,
                            match_pattern: Some(string_matcher::MatchPattern::Exact(value.into())),
                        }
                    }

                    /// Substring match.
                    pub fn contains(value: impl Into<String>) -> Self {
                        Self {
                            ignore_case: false,
                            match_pattern: Some(string_matcher::MatchPattern::Contains(
                                value.into(),
                            )),
                        }
                    }

                    /// Prefix match.
                    pub fn prefix(value: impl Into<String>, ignore_case: bool) -> Self {
                        Self {
                            ignore_case,
                            match_pattern: Some(string_matcher::MatchPattern::Prefix(value.into())),
                        }
                    }
                }
            }
        }
    }

    pub mod config {
        //! Envoy configuration types.

        pub mod core {
            //! `envoy.config.core`

            pub mod v3 {
                //! `envoy.config.core.v3`

                use crate::envoy::r#type::v3::FractionalPercent;

                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct Address {
                    #[prost(oneof = "address::Address", tags = "1")]
                    pub address: Option<address::Address>,
                }

                pub mod address {
                    #[derive(Clone, PartialEq, ::prost::Oneof)]
                    pub enum Address {
                        #[prost(message, tag = "1")]
                        SocketAddress(super::SocketAddress),
                    }
                }

                impl Address {
                    /// A TCP socket address.
                    pub fn tcp(host: impl Into<String>, port: u32) -> Self {
                        Self {
                            address: Some(address::Address::SocketAddress(SocketAddress {
                                protocol: socket_address::Protocol::Tcp as i32,
                                address: host.into(),
                                port_specifier: Some(socket_address::PortSpecifier::PortValue(
                                    port,
                                )),
                            })),
                        }
                    }
                }

                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct SocketAddress {
                    #[prost(enumeration = "socket_address::Protocol", tag = "1")]
                    pub protocol: i32,
                    #[prost(string, tag = "2")]
                    pub address: String,
                    #[prost(oneof = "socket_address::PortSpecifier", tags = "3, 4")]
                    pub port_specifier: Option<socket_address::PortSpecifier>,
                }

                pub mod socket_address {
                    #[derive(
                        Clone,
                        Copy,
                        Debug,
                        PartialEq,
                        Eq,
                        Hash,
                        PartialOrd,
                        Ord,
                        ::prost::Enumeration,
                    )]
                    #[repr(i32)]
                    pub enum Protocol {
                        Tcp = 0,
                        Udp = 1,
                    }

                    #[derive(Clone, PartialEq, ::prost::Oneof)]
                    pub enum PortSpecifier {
                        #[prost(uint32, tag = "3")]
                        PortValue(u32),
                        #[prost(string, tag = "4")]
                        NamedPort(String),
                    }
                }

                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct HeaderValue {
                    #[prost(string, tag = "1")]
                    pub key: String,
                    #[prost(string, tag = "2")]
                    pub value: String,
                }

                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct HeaderValueOption {
                    #[prost(message, optional, tag = "1")]
                    pub header: Option<HeaderValue>,
                    #[prost(
                        enumeration = "header_value_option::HeaderAppendAction",
                        tag = "3"
                    )]
                    pub append_action: i32,
                }

                pub mod header_value_option {
                    #[derive(
                        Clone,
                        Copy,
                        Debug,
                        PartialEq,
                        Eq,
                        Hash,
                        PartialOrd,
                        Ord,
                        ::prost::Enumeration,
                    )]
                    #[repr(i32)]
                    pub enum HeaderAppendAction {
                        AppendIfExistsOrAdd = 0,
                        AddIfAbsent = 1,
                        OverwriteIfExistsOrAdd = 2,
                        OverwriteIfExists = 3,
                    }
                }

                impl HeaderValueOption {
                    /// A header added with the default append action.
                    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
                        Self {
                            header: Some(HeaderValue {
                                key: key.into(),
                                value: value.into(),
                            }),
                            append_action: 0,
                        }
                    }
                }

                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct DataSource {
                    #[prost(oneof = "data_source::Specifier", tags = "1, 2, 3, 4")]
                    pub specifier: Option<data_source::Specifier>,
                }

                pub mod data_source {
                    #[derive(Clone, PartialEq, ::prost::Oneof)]
                    pub enum Specifier {
                        #[prost(string, tag = "1")]
                        Filename(String),
                        #[prost(bytes = "vec", tag = "2")]
                        InlineBytes(Vec<u8>),
                        #[prost(string, tag = "3")]
                        InlineString(String),
                        #[prost(string, tag = "4")]
                        EnvironmentVariable(String),
                    }
                }

                impl DataSource {
                    pub fn inline_bytes(bytes: impl Into<Vec<u8>>) -> Self {
                        Self {
                            specifier: Some(data_source::Specifier::InlineBytes(bytes.into())),
                        }
                    }

                    pub fn inline_string(value: impl Into<String>) -> Self {
                        Self {
                            specifier: Some(data_source::Specifier::InlineString(value.into())),
                        }
                    }
                }

                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct TransportSocket {
                    #[prost(string, tag = "1")]
                    pub name: String,
                    #[prost(oneof = "transport_socket::ConfigType", tags = "3")]
                    pub config_type: Option<transport_socket::ConfigType>,
                }

                pub mod transport_socket {
                    #[derive(Clone, PartialEq, ::prost::Oneof)]
                    pub enum ConfigType {
                        #[prost(message, tag = "3")]
                        TypedConfig(::prost_types::Any),
                    }
                }

                #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
                #[repr(i32)]
                pub enum ApiVersion {
                    Auto = 0,
                    V2 = 1,
                    V3 = 2,
                }

                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct ConfigSource {
                    #[prost(message, optional, tag = "4")]
                    pub initial_fetch_timeout: Option<::prost_types::Duration>,
                    #[prost(enumeration = "ApiVersion", tag = "6")]
                    pub resource_api_version: i32,
                    #[prost(oneof = "config_source::ConfigSourceSpecifier", tags = "1, 2, 3")]
                    pub config_source_specifier: Option<config_source::ConfigSourceSpecifier>,
                }

                pub mod config_source {
                    #[derive(Clone, PartialEq, ::prost::Oneof)]
                    pub enum ConfigSourceSpecifier {
                        #[prost(string, tag = "1")]
                        Path(String),
                        #[prost(message, tag = "2")]
                        ApiConfigSource(super::ApiConfigSource),
                        #[prost(message, tag = "3")]
                        Ads(super::AggregatedConfigSource),
                    }
                }

                #[derive(Clone, Copy, PartialEq, ::prost::Message)]
                pub struct AggregatedConfigSource {}

                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct ApiConfigSource {
                    #[prost(enumeration = "api_config_source::ApiType", tag = "1")]
                    pub api_type: i32,
                    #[prost(enumeration = "ApiVersion", tag = "8")]
                    pub transport_api_version: i32,
                    #[prost(string, repeated, tag = "2")]
                    pub cluster_names: Vec<String>,
                    #[prost(message, repeated, tag = "4")]
                    pub grpc_services: Vec<GrpcService>,
                    #[prost(bool, tag = "7")]
                    pub set_node_on_first_message_only: bool,
                }

                pub mod api_config_source {
                    #[derive(
                        Clone,
                        Copy,
                        Debug,
                        PartialEq,
                        Eq,
                        Hash,
                        PartialOrd,
                        Ord,
                        ::prost::Enumeration,
                    )]
                    #[repr(i32)]
                    pub enum ApiType {
                        DeprecatedAndUnavailableDoNotUse = 0,
                        Rest = 1,
                        Grpc = 2,
                        DeltaGrpc = 3,
                        AggregatedGrpc = 5,
                        AggregatedDeltaGrpc = 6,
                    }
                }

                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct GrpcService {
                    #[prost(message, optional, tag = "3")]
                    pub timeout: Option<::prost_types::Duration>,
                    #[prost(oneof = "grpc_service::TargetSpecifier", tags = "1")]
                    pub target_specifier: Option<grpc_service::TargetSpecifier>,
                }

                pub mod grpc_service {
                    #[derive(Clone, PartialEq, ::prost::Message)]
                    pub struct EnvoyGrpc {
                        #[prost(string, tag = "1")]
                        pub cluster_name: String,
                        #[prost(string, tag = "2")]
                        pub authority: String,
                    }

                    #[derive(Clone, PartialEq, ::prost::Oneof)]
                    pub enum TargetSpecifier {
                        #[prost(message, tag = "1")]
                        EnvoyGrpc(EnvoyGrpc),
                    }
                }

                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct RuntimeFractionalPercent {
                    #[prost(message, optional, tag = "1")]
                    pub default_value: Option<FractionalPercent>,
                    #[prost(string, tag = "2")]
                    pub runtime_key: String,
                }

                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct RuntimeUInt32 {
                    #[prost(uint32, tag = "2")]
                    pub default_value: u32,
                    #[prost(string, tag = "3")]
                    pub runtime_key: String,
                }

                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct Http1ProtocolOptions {
                    #[prost(message, optional, tag = "1")]
                    pub allow_absolute_url: Option<bool>,
                }

                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct Http2ProtocolOptions {
                    #[prost(message, optional, tag = "2")]
                    pub max_concurrent_streams: Option<u32>,
                }

                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct SubstitutionFormatString {
                    #[prost(bool, tag = "3")]
                    pub omit_empty_values: bool,
                    #[prost(oneof = "substitution_format_string::Format", tags = "5")]
                    pub format: Option<substitution_format_string::Format>,
                }

                pub mod substitution_format_string {
                    #[derive(Clone, PartialEq, ::prost::Oneof)]
                    pub enum Format {
                        #[prost(message, tag = "5")]
                        TextFormatSource(super::DataSource),
                    }
                }
            }
        }

        pub mod route {
            //! `envoy.config.route`

            pub mod v3 {
                //! `envoy.config.route.v3`

                use crate::envoy::config::core::v3::{HeaderValueOption, RuntimeFractionalPercent};
                use crate::envoy::r#type::matcher::v3::StringMatcher;

                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct RouteConfiguration {
                    #[prost(string, tag = "1")]
                    pub name: String,
                    #[prost(message, repeated, tag = "2")]
                    pub virtual_hosts: Vec<VirtualHost>,
                }

                envoy_name!(RouteConfiguration, "envoy.config.route.v3", "RouteConfiguration");

                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct VirtualHost {
                    #[prost(string, tag = "1")]
                    pub name: String,
                    #[prost(string, repeated, tag = "2")]
                    pub domains: Vec<String>,
                    #[prost(message, repeated, tag = "3")]
                    pub routes: Vec<Route>,
                }

                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct Route {
                    #[prost(string, tag = "14")]
                    pub name: String,
                    #[prost(message, optional, tag = "1")]
                    pub r#match: Option<RouteMatch>,
                    #[prost(message, repeated, tag = "9")]
                    pub request_headers_to_add: Vec<HeaderValueOption>,
                    #[prost(string, repeated, tag = "12")]
                    pub request_headers_to_remove: Vec<String>,
                    #[prost(message, repeated, tag = "10")]
                    pub response_headers_to_add: Vec<HeaderValueOption>,
                    #[prost(string, repeated, tag = "11")]
                    pub response_headers_to_remove: Vec<String>,
                    #[prost(oneof = "route::Action", tags = "2")]
                    pub action: Option<route::Action>,
                }

                pub mod route {
                    #[derive(Clone, PartialEq, ::prost::Oneof)]
                    pub enum Action {
                        #[prost(message, tag = "2")]
                        Route(super::RouteAction),
                    }
                }

                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct RouteMatch {
                    #[prost(message, optional, tag = "4")]
                    pub case_sensitive: Option<bool>,
                    #[prost(message, optional, tag = "9")]
                    pub runtime_fraction: Option<RuntimeFractionalPercent>,
                    #[prost(message, repeated, tag = "6")]
                    pub headers: Vec<HeaderMatcher>,
                    #[prost(oneof = "route_match::PathSpecifier", tags = "1, 2")]
                    pub path_specifier: Option<route_match::PathSpecifier>,
                }

                pub mod route_match {
                    #[derive(Clone, PartialEq, ::prost::Oneof)]
                    pub enum PathSpecifier {
                        #[prost(string, tag = "1")]
                        Prefix(String),
                        #[prost(string, tag = "2")]
                        Path(String),
                    }
                }

                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct HeaderMatcher {
                    #[prost(string, tag = "1")]
                    pub name: String,
                    #[prost(bool, tag = "8")]
                    pub invert_match: bool,
                    #[prost(bool, tag = "14")]
                    pub treat_missing_header_as_empty: bool,
                    #[prost(oneof = "header_matcher::HeaderMatchSpecifier", tags = "7, 13")]
                    pub header_match_specifier: Option<header_matcher::HeaderMatchSpecifier>,
                }

                pub mod header_matcher {
                    #[derive(Clone, PartialEq, ::prost::Oneof)]
                    pub enum HeaderMatchSpecifier {
                        #[prost(bool, tag = "7")]
                        PresentMatch(bool),
                        #[prost(message, tag = "13")]
                        StringMatch(super::StringMatcher),
                    }
                }

                impl HeaderMatcher {
                    /// Match on a header value.
                    pub fn string(name: impl Into<String>, matcher: StringMatcher) -> Self {
                        Self {
                            name: name.into(),
                            header_match_specifier: Some(
                                header_matcher::HeaderMatchSpecifier::StringMatch(matcher),
                            ),
                            ..Default::default()
                        }
                    }

                    /// Match on header presence (`true`) or absence (`false`).
                    pub fn present(name: impl Into<String>, present: bool) -> Self {
                        Self {
                            name: name.into(),
                            header_match_specifier: Some(
                                header_matcher::HeaderMatchSpecifier::PresentMatch(present),
                            ),
                            ..Default::default()
                        }
                    }
                }

                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct RouteAction {
                    #[prost(message, optional, tag = "8")]
                    pub timeout: Option<::prost_types::Duration>,
                    #[prost(message, optional, tag = "9")]
                    pub retry_policy: Option<RetryPolicy>,
                    #[prost(message, repeated, tag = "30")]
                    pub request_mirror_policies: Vec<route_action::RequestMirrorPolicy>,
                    #[prost(oneof = "route_action::ClusterSpecifier", tags = "1, 2, 3")]
                    pub cluster_specifier: Option<route_action::ClusterSpecifier>,
                }

                pub mod route_action {
                    use crate::envoy::config::core::v3::RuntimeFractionalPercent;

                    #[derive(Clone, PartialEq, ::prost::Message)]
                    pub struct RequestMirrorPolicy {
                        #[prost(string, tag = "1")]
                        pub cluster: String,
                        #[prost(message, optional, tag = "3")]
                        pub runtime_fraction: Option<RuntimeFractionalPercent>,
                        #[prost(message, optional, tag = "4")]
                        pub trace_sampled: Option<bool>,
                    }

                    #[derive(Clone, PartialEq, ::prost::Oneof)]
                    pub enum ClusterSpecifier {
                        #[prost(string, tag = "1")]
                        Cluster(String),
                        #[prost(string, tag = "2")]
                        ClusterHeader(String),
                        #[prost(message, tag = "3")]
                        WeightedClusters(super::WeightedCluster),
                    }
                }

                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct WeightedCluster {
                    #[prost(message, repeated, tag = "1")]
                    pub clusters: Vec<weighted_cluster::ClusterWeight>,
                    #[prost(message, optional, tag = "3")]
                    pub total_weight: Option<u32>,
                    #[prost(string, tag = "2")]
                    pub runtime_key_prefix: String,
                }

                pub mod weighted_cluster {
                    use crate::envoy::config::core::v3::HeaderValueOption;

                    #[derive(Clone, PartialEq, ::prost::Message)]
                    pub struct ClusterWeight {
                        #[prost(string, tag = "1")]
                        pub name: String,
                        #[prost(message, optional, tag = "2")]
                        pub weight: Option<u32>,
                        #[prost(message, repeated, tag = "4")]
                        pub request_headers_to_add: Vec<HeaderValueOption>,
                        #[prost(string, repeated, tag = "9")]
                        pub request_headers_to_remove: Vec<String>,
                        #[prost(message, repeated, tag = "5")]
                        pub response_headers_to_add: Vec<HeaderValueOption>,
                        #[prost(string, repeated, tag = "6")]
                        pub response_headers_to_remove: Vec<String>,
                    }
                }

                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct RetryPolicy {
                    #[prost(string, tag = "1")]
                    pub retry_on: String,
                    #[prost(message, optional, tag = "2")]
                    pub num_retries: Option<u32>,
                    #[prost(message, optional, tag = "3")]
                    pub per_try_timeout: Option<::prost_types::Duration>,
                    #[prost(message, optional, tag = "8")]
                    pub retry_back_off: Option<retry_policy::RetryBackOff>,
                }

                pub mod retry_policy {
                    #[derive(Clone, PartialEq, ::prost::Message)]
                    pub struct RetryBackOff {
                        #[prost(message, optional, tag = "1")]
                        pub base_interval: Option<::prost_types::Duration>,
                        #[prost(message, optional, tag = "2")]
                        pub max_interval: Option<::prost_types::Duration>,
                    }
                }
            }
        }

        pub mod cluster {
            //! `envoy.config.cluster`

            pub mod v3 {
                //! `envoy.config.cluster.v3`

                use std::collections::HashMap;

                use crate::envoy::config::core::v3::TransportSocket;
                use crate::envoy::config::endpoint::v3::ClusterLoadAssignment;

                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct Cluster {
                    #[prost(string, tag = "1")]
                    pub name: String,
                    #[prost(message, optional, tag = "4")]
                    pub connect_timeout: Option<::prost_types::Duration>,
                    #[prost(enumeration = "cluster::LbPolicy", tag = "6")]
                    pub lb_policy: i32,
                    #[prost(message, optional, tag = "33")]
                    pub load_assignment: Option<ClusterLoadAssignment>,
                    #[prost(message, optional, tag = "10")]
                    pub circuit_breakers: Option<CircuitBreakers>,
                    #[prost(map = "string, message", tag = "36")]
                    pub typed_extension_protocol_options: HashMap<String, ::prost_types::Any>,
                    #[prost(message, optional, tag = "16")]
                    pub dns_refresh_rate: Option<::prost_types::Duration>,
                    #[prost(enumeration = "cluster::DnsLookupFamily", tag = "17")]
                    pub dns_lookup_family: i32,
                    #[prost(message, optional, tag = "24")]
                    pub transport_socket: Option<TransportSocket>,
                    #[prost(oneof = "cluster::ClusterDiscoveryType", tags = "2")]
                    pub cluster_discovery_type: Option<cluster::ClusterDiscoveryType>,
                }

                envoy_name!(Cluster, "envoy.config.cluster.v3", "Cluster");

                pub mod cluster {
                    #[derive(
                        Clone,
                        Copy,
                        Debug,
                        PartialEq,
                        Eq,
                        Hash,
                        PartialOrd,
                        Ord,
                        ::prost::Enumeration,
                    )]
                    #[repr(i32)]
                    pub enum DiscoveryType {
                        Static = 0,
                        StrictDns = 1,
                        LogicalDns = 2,
                        Eds = 3,
                        OriginalDst = 4,
                    }

                    #[derive(
                        Clone,
                        Copy,
                        Debug,
                        PartialEq,
                        Eq,
                        Hash,
                        PartialOrd,
                        Ord,
                        ::prost::Enumeration,
                    )]
                    #[repr(i32)]
                    pub enum LbPolicy {
                        RoundRobin = 0,
                        LeastRequest = 1,
                        RingHash = 2,
                        Random = 3,
                        Maglev = 5,
                        ClusterProvided = 6,
                        LoadBalancingPolicyConfig = 7,
                    }

                    #[derive(
                        Clone,
                        Copy,
                        Debug,
                        PartialEq,
                        Eq,
                        Hash,
                        PartialOrd,
                        Ord,
                        ::prost::Enumeration,
                    )]
                    #[repr(i32)]
                    pub enum DnsLookupFamily {
                        Auto = 0,
                        V4Only = 1,
                        V6Only = 2,
                        V4Preferred = 3,
                        All = 4,
                    }

                    #[derive(Clone, PartialEq, ::prost::Oneof)]
                    pub enum ClusterDiscoveryType {
                        #[prost(enumeration = "DiscoveryType", tag = "2")]
                        Type(i32),
                    }
                }

                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct CircuitBreakers {
                    #[prost(message, repeated, tag = "1")]
                    pub thresholds: Vec<circuit_breakers::Thresholds>,
                }

                pub mod circuit_breakers {
                    #[derive(Clone, PartialEq, ::prost::Message)]
                    pub struct Thresholds {
                        #[prost(message, optional, tag = "2")]
                        pub max_connections: Option<u32>,
                        #[prost(message, optional, tag = "3")]
                        pub max_pending_requests: Option<u32>,
                        #[prost(message, optional, tag = "4")]
                        pub max_requests: Option<u32>,
                        #[prost(message, optional, tag = "5")]
                        pub max_retries: Option<u32>,
                    }
                }
            }
        }

        pub mod endpoint {
            //! `envoy.config.endpoint`

            pub mod v3 {
                //! `envoy.config.endpoint.v3`

                use crate::envoy::config::core::v3::Address;

                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct ClusterLoadAssignment {
                    #[prost(string, tag = "1")]
                    pub cluster_name: String,
                    #[prost(message, repeated, tag = "2")]
                    pub endpoints: Vec<LocalityLbEndpoints>,
                }

                envoy_name!(
                    ClusterLoadAssignment,
                    "envoy.config.endpoint.v3",
                    "ClusterLoadAssignment"
                );

                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct LocalityLbEndpoints {
                    #[prost(message, repeated, tag = "2")]
                    pub lb_endpoints: Vec<LbEndpoint>,
                    #[prost(message, optional, tag = "3")]
                    pub load_balancing_weight: Option<u32>,
                    #[prost(uint32, tag = "5")]
                    pub priority: u32,
                }

                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct LbEndpoint {
                    #[prost(message, optional, tag = "4")]
                    pub load_balancing_weight: Option<u32>,
                    #[prost(oneof = "lb_endpoint::HostIdentifier", tags = "1")]
                    pub host_identifier: Option<lb_endpoint::HostIdentifier>,
                }

                pub mod lb_endpoint {
                    #[derive(Clone, PartialEq, ::prost::Oneof)]
                    pub enum HostIdentifier {
                        #[prost(message, tag = "1")]
                        Endpoint(super::Endpoint),
                    }
                }

                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct Endpoint {
                    #[prost(message, optional, tag = "1")]
                    pub address: Option<Address>,
                    #[prost(string, tag = "3")]
                    pub hostname: String,
                }
            }
        }

        pub mod listener {
            //! `envoy.config.listener`

            pub mod v3 {
                //! `envoy.config.listener.v3`

                use crate::envoy::config::core::v3::{Address, TransportSocket};

                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct Listener {
                    #[prost(string, tag = "1")]
                    pub name: String,
                    #[prost(message, optional, tag = "2")]
                    pub address: Option<Address>,
                    #[prost(string, tag = "28")]
                    pub stat_prefix: String,
                    #[prost(message, repeated, tag = "3")]
                    pub filter_chains: Vec<FilterChain>,
                }

                envoy_name!(Listener, "envoy.config.listener.v3", "Listener");

                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct FilterChain {
                    #[prost(message, repeated, tag = "3")]
                    pub filters: Vec<Filter>,
                    #[prost(message, optional, tag = "6")]
                    pub transport_socket: Option<TransportSocket>,
                    #[prost(string, tag = "7")]
                    pub name: String,
                }

                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct Filter {
                    #[prost(string, tag = "1")]
                    pub name: String,
                    #[prost(oneof = "filter::ConfigType", tags = "4")]
                    pub config_type: Option<filter::ConfigType>,
                }

                pub mod filter {
                    #[derive(Clone, PartialEq, ::prost::Oneof)]
                    pub enum ConfigType {
                        #[prost(message, tag = "4")]
                        TypedConfig(::prost_types::Any),
                    }
                }
            }
        }

        pub mod accesslog {
            //! `envoy.config.accesslog`

            pub mod v3 {
                //! `envoy.config.accesslog.v3`

                use crate::envoy::config::core::v3::RuntimeUInt32;
                use crate::envoy::config::route::v3::HeaderMatcher;

                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct AccessLog {
                    #[prost(string, tag = "1")]
                    pub name: String,
                    #[prost(message, optional, tag = "2")]
                    pub filter: Option<AccessLogFilter>,
                    #[prost(oneof = "access_log::ConfigType", tags = "4")]
                    pub config_type: Option<access_log::ConfigType>,
                }

                pub mod access_log {
                    #[derive(Clone, PartialEq, ::prost::Oneof)]
                    pub enum ConfigType {
                        #[prost(message, tag = "4")]
                        TypedConfig(::prost_types::Any),
                    }
                }

                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct AccessLogFilter {
                    #[prost(oneof = "access_log_filter::FilterSpecifier", tags = "1, 6, 7, 8, 10")]
                    pub filter_specifier: Option<access_log_filter::FilterSpecifier>,
                }

                pub mod access_log_filter {
                    #[derive(Clone, PartialEq, ::prost::Oneof)]
                    pub enum FilterSpecifier {
                        #[prost(message, tag = "1")]
                        StatusCodeFilter(super::StatusCodeFilter),
                        #[prost(message, tag = "6")]
                        AndFilter(super::AndFilter),
                        #[prost(message, tag = "7")]
                        OrFilter(super::OrFilter),
                        #[prost(message, tag = "8")]
                        HeaderFilter(super::HeaderFilter),
                        #[prost(message, tag = "10")]
                        GrpcStatusFilter(super::GrpcStatusFilter),
                    }
                }

                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct ComparisonFilter {
                    #[prost(enumeration = "comparison_filter::Op", tag = "1")]
                    pub op: i32,
                    #[prost(message, optional, tag = "2")]
                    pub value: Option<RuntimeUInt32>,
                }

                pub mod comparison_filter {
                    #[derive(
                        Clone,
                        Copy,
                        Debug,
                        PartialEq,
                        Eq,
                        Hash,
                        PartialOrd,
                        Ord,
                        ::prost::Enumeration,
                    )]
                    #[repr(i32)]
                    pub enum Op {
                        Eq = 0,
                        Ge = 1,
                        Le = 2,
                        Ne = 3,
                    }
                }

                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct StatusCodeFilter {
                    #[prost(message, optional, tag = "1")]
                    pub comparison: Option<ComparisonFilter>,
                }

                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct AndFilter {
                    #[prost(message, repeated, tag = "1")]
                    pub filters: Vec<AccessLogFilter>,
                }

                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct OrFilter {
                    #[prost(message, repeated, tag = "2")]
                    pub filters: Vec<AccessLogFilter>,
                }

                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct HeaderFilter {
                    #[prost(message, optional, tag = "1")]
                    pub header: Option<HeaderMatcher>,
                }

                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct GrpcStatusFilter {
                    #[prost(enumeration = "grpc_status_filter::Status", repeated, tag = "1")]
                    pub statuses: Vec<i32>,
                    #[prost(bool, tag = "2")]
                    pub exclude: bool,
                }

                pub mod grpc_status_filter {
                    #[derive(
                        Clone,
                        Copy,
                        Debug,
                        PartialEq,
                        Eq,
                        Hash,
                        PartialOrd,
                        Ord,
                        ::prost::Enumeration,
                    )]
                    #[repr(i32)]
                    pub enum Status {
                        Ok = 0,
                        Canceled = 1,
                        Unknown = 2,
                        InvalidArgument = 3,
                        DeadlineExceeded = 4,
                        NotFound = 5,
                        AlreadyExists = 6,
                        PermissionDenied = 7,
                        ResourceExhausted = 8,
                        FailedPrecondition = 9,
                        Aborted = 10,
                        OutOfRange = 11,
                        Unimplemented = 12,
                        Internal = 13,
                        Unavailable = 14,
                        DataLoss = 15,
                        Unauthenticated = 16,
                    }
                }
            }
        }

        pub mod common {
            //! `envoy.config.common`

            pub mod matcher {
                //! `envoy.config.common.matcher`

                pub mod v3 {
                    //! `envoy.config.common.matcher.v3`

                    use crate::envoy::config::route::v3::HeaderMatcher;

                    #[derive(Clone, PartialEq, ::prost::Message)]
                    pub struct MatchPredicate {
                        #[prost(oneof = "match_predicate::Rule", tags = "1, 2, 4, 5, 7")]
                        pub rule: Option<match_predicate::Rule>,
                    }

                    pub mod match_predicate {
                        #[derive(Clone, PartialEq, ::prost::Message)]
                        pub struct MatchSet {
                            #[prost(message, repeated, tag = "1")]
                            pub rules: Vec<super::MatchPredicate>,
                        }

                        #[derive(Clone, PartialEq, ::prost::Oneof)]
                        pub enum Rule {
                            #[prost(message, tag = "1")]
                            OrMatch(MatchSet),
                            #[prost(message, tag = "2")]
                            AndMatch(MatchSet),
                            #[prost(bool, tag = "4")]
                            AnyMatch(bool),
                            #[prost(message, tag = "5")]
                            HttpRequestHeadersMatch(super::HttpHeadersMatch),
                            #[prost(message, tag = "7")]
                            HttpResponseHeadersMatch(super::HttpHeadersMatch),
                        }
                    }

                    #[derive(Clone, PartialEq, ::prost::Message)]
                    pub struct HttpHeadersMatch {
                        #[prost(message, repeated, tag = "1")]
                        pub headers: Vec<HeaderMatcher>,
                    }
                }
            }
        }

        pub mod tap {
            //! `envoy.config.tap`

            pub mod v3 {
                //! `envoy.config.tap.v3`

                use crate::envoy::config::common::matcher::v3::MatchPredicate;

                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct TapConfig {
                    #[prost(message, optional, tag = "4")]
                    pub r#match: Option<MatchPredicate>,
                    #[prost(message, optional, tag = "2")]
                    pub output_config: Option<OutputConfig>,
                }

                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct OutputConfig {
                    #[prost(message, repeated, tag = "1")]
                    pub sinks: Vec<OutputSink>,
                    #[prost(message, optional, tag = "2")]
                    pub max_buffered_rx_bytes: Option<u32>,
                    #[prost(message, optional, tag = "3")]
                    pub max_buffered_tx_bytes: Option<u32>,
                    #[prost(bool, tag = "4")]
                    pub streaming: bool,
                }

                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct OutputSink {
                    #[prost(enumeration = "output_sink::Format", tag = "1")]
                    pub format: i32,
                    #[prost(oneof = "output_sink::OutputSinkType", tags = "3")]
                    pub output_sink_type: Option<output_sink::OutputSinkType>,
                }

                pub mod output_sink {
                    #[derive(
                        Clone,
                        Copy,
                        Debug,
                        PartialEq,
                        Eq,
                        Hash,
                        PartialOrd,
                        Ord,
                        ::prost::Enumeration,
                    )]
                    #[repr(i32)]
                    pub enum Format {
                        JsonBodyAsBytes = 0,
                        JsonBodyAsString = 1,
                        ProtoBinary = 2,
                        ProtoBinaryLengthDelimited = 3,
                        ProtoText = 4,
                    }

                    #[derive(Clone, PartialEq, ::prost::Oneof)]
                    pub enum OutputSinkType {
                        #[prost(message, tag = "3")]
                        FilePerTap(super::FilePerTapSink),
                    }
                }

                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct FilePerTapSink {
                    #[prost(string, tag = "1")]
                    pub path_prefix: String,
                }
            }
        }
    }

    pub mod extensions {
        //! Envoy extension types.

        pub mod filters {
            //! Network and HTTP filters.

            pub mod network {
                //! Network filters.

                pub mod http_connection_manager {
                    //! `envoy.extensions.filters.network.http_connection_manager`

                    pub mod v3 {
                        //! `envoy.extensions.filters.network.http_connection_manager.v3`

                        use crate::envoy::config::accesslog::v3::AccessLog;
                        use crate::envoy::config::core::v3::ConfigSource;

                        #[derive(Clone, PartialEq, ::prost::Message)]
                        pub struct HttpConnectionManager {
                            #[prost(
                                enumeration = "http_connection_manager::CodecType",
                                tag = "1"
                            )]
                            pub codec_type: i32,
                            #[prost(string, tag = "2")]
                            pub stat_prefix: String,
                            #[prost(message, repeated, tag = "5")]
                            pub http_filters: Vec<HttpFilter>,
                            #[prost(message, repeated, tag = "13")]
                            pub access_log: Vec<AccessLog>,
                            #[prost(message, optional, tag = "15")]
                            pub generate_request_id: Option<bool>,
                            #[prost(bool, tag = "37")]
                            pub always_set_request_id_in_response: bool,
                            #[prost(oneof = "http_connection_manager::RouteSpecifier", tags = "3")]
                            pub route_specifier: Option<http_connection_manager::RouteSpecifier>,
                        }

                        envoy_name!(
                            HttpConnectionManager,
                            "envoy.extensions.filters.network.http_connection_manager.v3",
                            "HttpConnectionManager"
                        );

                        pub mod http_connection_manager {
                            #[derive(
                                Clone,
                                Copy,
                                Debug,
                                PartialEq,
                                Eq,
                                Hash,
                                PartialOrd,
                                Ord,
                                ::prost::Enumeration,
                            )]
                            #[repr(i32)]
                            pub enum CodecType {
                                Auto = 0,
                                Http1 = 1,
                                Http2 = 2,
                                Http3 = 3,
                            }

                            #[derive(Clone, PartialEq, ::prost::Oneof)]
                            pub enum RouteSpecifier {
                                #[prost(message, tag = "3")]
                                Rds(super::Rds),
                            }
                        }

                        #[derive(Clone, PartialEq, ::prost::Message)]
                        pub struct Rds {
                            #[prost(message, optional, tag = "1")]
                            pub config_source: Option<ConfigSource>,
                            #[prost(string, tag = "2")]
                            pub route_config_name: String,
                        }

                        #[derive(Clone, PartialEq, ::prost::Message)]
                        pub struct HttpFilter {
                            #[prost(string, tag = "1")]
                            pub name: String,
                            #[prost(bool, tag = "6")]
                            pub is_optional: bool,
                            #[prost(oneof = "http_filter::ConfigType", tags = "4")]
                            pub config_type: Option<http_filter::ConfigType>,
                        }

                        pub mod http_filter {
                            #[derive(Clone, PartialEq, ::prost::Oneof)]
                            pub enum ConfigType {
                                #[prost(message, tag = "4")]
                                TypedConfig(::prost_types::Any),
                            }
                        }
                    }
                }
            }

            pub mod http {
                //! HTTP filters.

                pub mod router {
                    //! `envoy.extensions.filters.http.router`

                    pub mod v3 {
                        //! `envoy.extensions.filters.http.router.v3`

                        #[derive(Clone, PartialEq, ::prost::Message)]
                        pub struct Router {
                            #[prost(message, optional, tag = "1")]
                            pub dynamic_stats: Option<bool>,
                            #[prost(bool, tag = "2")]
                            pub start_child_span: bool,
                        }

                        envoy_name!(Router, "envoy.extensions.filters.http.router.v3", "Router");
                    }
                }

                pub mod lua {
                    //! `envoy.extensions.filters.http.lua`

                    pub mod v3 {
                        //! `envoy.extensions.filters.http.lua.v3`

                        use crate::envoy::config::core::v3::DataSource;

                        #[derive(Clone, PartialEq, ::prost::Message)]
                        pub struct Lua {
                            #[prost(message, optional, tag = "3")]
                            pub default_source_code: Option<DataSource>,
                            #[prost(string, tag = "4")]
                            pub stat_prefix: String,
                        }

                        envoy_name!(Lua, "envoy.extensions.filters.http.lua.v3", "Lua");
                    }
                }

                pub mod tap {
                    //! `envoy.extensions.filters.http.tap`

                    pub mod v3 {
                        //! `envoy.extensions.filters.http.tap.v3`

                        use crate::envoy::extensions::common::tap::v3::CommonExtensionConfig;

                        #[derive(Clone, PartialEq, ::prost::Message)]
                        pub struct Tap {
                            #[prost(message, optional, tag = "1")]
                            pub common_config: Option<CommonExtensionConfig>,
                            #[prost(bool, tag = "2")]
                            pub record_headers_received_time: bool,
                        }

                        envoy_name!(Tap, "envoy.extensions.filters.http.tap.v3", "Tap");
                    }
                }
            }
        }

        pub mod common {
            //! Shared extension configuration.

            pub mod tap {
                //! `envoy.extensions.common.tap`

                pub mod v3 {
                    //! `envoy.extensions.common.tap.v3`

                    use crate::envoy::config::tap::v3::TapConfig;

                    #[derive(Clone, PartialEq, ::prost::Message)]
                    pub struct CommonExtensionConfig {
                        #[prost(oneof = "common_extension_config::ConfigType", tags = "2")]
                        pub config_type: Option<common_extension_config::ConfigType>,
                    }

                    pub mod common_extension_config {
                        #[derive(Clone, PartialEq, ::prost::Oneof)]
                        pub enum ConfigType {
                            #[prost(message, tag = "2")]
                            StaticConfig(super::TapConfig),
                        }
                    }
                }
            }
        }

        pub mod access_loggers {
            //! Access loggers.

            pub mod file {
                //! `envoy.extensions.access_loggers.file`

                pub mod v3 {
                    //! `envoy.extensions.access_loggers.file.v3`

                    use crate::envoy::config::core::v3::SubstitutionFormatString;

                    #[derive(Clone, PartialEq, ::prost::Message)]
                    pub struct FileAccessLog {
                        #[prost(string, tag = "1")]
                        pub path: String,
                        #[prost(oneof = "file_access_log::AccessLogFormat", tags = "5")]
                        pub access_log_format: Option<file_access_log::AccessLogFormat>,
                    }

                    envoy_name!(
                        FileAccessLog,
                        "envoy.extensions.access_loggers.file.v3",
                        "FileAccessLog"
                    );

                    pub mod file_access_log {
                        #[derive(Clone, PartialEq, ::prost::Oneof)]
                        pub enum AccessLogFormat {
                            #[prost(message, tag = "5")]
                            LogFormat(super::SubstitutionFormatString),
                        }
                    }
                }
            }
        }

        pub mod upstreams {
            //! Upstream protocol options.

            pub mod http {
                //! `envoy.extensions.upstreams.http`

                pub mod v3 {
                    //! `envoy.extensions.upstreams.http.v3`

                    #[derive(Clone, PartialEq, ::prost::Message)]
                    pub struct HttpProtocolOptions {
                        #[prost(oneof = "http_protocol_options::UpstreamProtocolOptions", tags = "3")]
                        pub upstream_protocol_options:
                            Option<http_protocol_options::UpstreamProtocolOptions>,
                    }

                    envoy_name!(
                        HttpProtocolOptions,
                        "envoy.extensions.upstreams.http.v3",
                        "HttpProtocolOptions"
                    );

                    pub mod http_protocol_options {
                        use crate::envoy::config::core::v3::{
                            Http1ProtocolOptions, Http2ProtocolOptions,
                        };

                        #[derive(Clone, PartialEq, ::prost::Message)]
                        pub struct ExplicitHttpConfig {
                            #[prost(oneof = "explicit_http_config::ProtocolConfig", tags = "1, 2")]
                            pub protocol_config: Option<explicit_http_config::ProtocolConfig>,
                        }

                        pub mod explicit_http_config {
                            use super::{Http1ProtocolOptions, Http2ProtocolOptions};

                            #[derive(Clone, PartialEq, ::prost::Oneof)]
                            pub enum ProtocolConfig {
                                #[prost(message, tag = "1")]
                                HttpProtocolOptions(Http1ProtocolOptions),
                                #[prost(message, tag = "2")]
                                Http2ProtocolOptions(Http2ProtocolOptions),
                            }
                        }

                        #[derive(Clone, PartialEq, ::prost::Oneof)]
                        pub enum UpstreamProtocolOptions {
                            #[prost(message, tag = "3")]
                            ExplicitHttpConfig(ExplicitHttpConfig),
                        }
                    }
                }
            }
        }

        pub mod transport_sockets {
            //! Transport sockets.

            pub mod tls {
                //! `envoy.extensions.transport_sockets.tls`

                pub mod v3 {
                    //! `envoy.extensions.transport_sockets.tls.v3`

                    use crate::envoy::config::core::v3::{ConfigSource, DataSource};

                    #[derive(Clone, PartialEq, ::prost::Message)]
                    pub struct Secret {
                        #[prost(string, tag = "1")]
                        pub name: String,
                        #[prost(oneof = "secret::Type", tags = "2, 4")]
                        pub r#type: Option<secret::Type>,
                    }

                    envoy_name!(Secret, "envoy.extensions.transport_sockets.tls.v3", "Secret");

                    pub mod secret {
                        #[derive(Clone, PartialEq, ::prost::Oneof)]
                        pub enum Type {
                            #[prost(message, tag = "2")]
                            TlsCertificate(super::TlsCertificate),
                            #[prost(message, tag = "4")]
                            ValidationContext(super::CertificateValidationContext),
                        }
                    }

                    #[derive(Clone, PartialEq, ::prost::Message)]
                    pub struct TlsCertificate {
                        #[prost(message, optional, tag = "1")]
                        pub certificate_chain: Option<DataSource>,
                        #[prost(message, optional, tag = "2")]
                        pub private_key: Option<DataSource>,
                    }

                    #[derive(Clone, PartialEq, ::prost::Message)]
                    pub struct CertificateValidationContext {
                        #[prost(message, optional, tag = "1")]
                        pub trusted_ca: Option<DataSource>,
                    }

                    #[derive(Clone, PartialEq, ::prost::Message)]
                    pub struct SdsSecretConfig {
                        #[prost(string, tag = "1")]
                        pub name: String,
                        #[prost(message, optional, tag = "2")]
                        pub sds_config: Option<ConfigSource>,
                    }

                    #[derive(Clone, PartialEq, ::prost::Message)]
                    pub struct CommonTlsContext {
                        #[prost(message, repeated, tag = "6")]
                        pub tls_certificate_sds_secret_configs: Vec<SdsSecretConfig>,
                        #[prost(string, repeated, tag = "4")]
                        pub alpn_protocols: Vec<String>,
                        #[prost(oneof = "common_tls_context::ValidationContextType", tags = "7")]
                        pub validation_context_type:
                            Option<common_tls_context::ValidationContextType>,
                    }

                    pub mod common_tls_context {
                        #[derive(Clone, PartialEq, ::prost::Oneof)]
                        pub enum ValidationContextType {
                            #[prost(message, tag = "7")]
                            ValidationContextSdsSecretConfig(super::SdsSecretConfig),
                        }
                    }

                    #[derive(Clone, PartialEq, ::prost::Message)]
                    pub struct UpstreamTlsContext {
                        #[prost(message, optional, tag = "1")]
                        pub common_tls_context: Option<CommonTlsContext>,
                        #[prost(string, tag = "2")]
                        pub sni: String,
                    }

                    envoy_name!(
                        UpstreamTlsContext,
                        "envoy.extensions.transport_sockets.tls.v3",
                        "UpstreamTlsContext"
                    );

                    #[derive(Clone, PartialEq, ::prost::Message)]
                    pub struct DownstreamTlsContext {
                        #[prost(message, optional, tag = "1")]
                        pub common_tls_context: Option<CommonTlsContext>,
                        #[prost(message, optional, tag = "2")]
                        pub require_client_certificate: Option<bool>,
                    }

                    envoy_name!(
                        DownstreamTlsContext,
                        "envoy.extensions.transport_sockets.tls.v3",
                        "DownstreamTlsContext"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use prost::Name;

    use super::envoy::config::cluster::v3::Cluster;
    use super::envoy::config::core::v3::{address, socket_address, Address};
    use super::envoy::config::route::v3::{
        header_matcher::HeaderMatchSpecifier, HeaderMatcher, RouteConfiguration,
    };
    use super::envoy::extensions::transport_sockets::tls::v3::Secret;
    use super::envoy::r#type::matcher::v3::StringMatcher;
    use super::*;

    #[test]
    fn type_urls_use_googleapis_prefix() {
        assert_eq!(
            Cluster::type_url(),
            "type.googleapis.com/envoy.config.cluster.v3.Cluster"
        );
        assert_eq!(
            RouteConfiguration::type_url(),
            "type.googleapis.com/envoy.config.route.v3.RouteConfiguration"
        );
        assert_eq!(
            Secret::type_url(),
            "type.googleapis.com/envoy.extensions.transport_sockets.tls.v3.Secret"
        );
    }

    #[test]
    fn pack_and_unpack_cluster() {
        let cluster = Cluster {
            name: "iris_http".to_string(),
            lb_policy: envoy::config::cluster::v3::cluster::LbPolicy::LeastRequest as i32,
            ..Default::default()
        };
        let any = Any::from_msg(&cluster).unwrap();
        let decoded: Cluster = any.to_msg().unwrap();
        assert_eq!(decoded, cluster);
        assert_eq!(
            decoded.lb_policy(),
            envoy::config::cluster::v3::cluster::LbPolicy::LeastRequest
        );
    }

    #[test]
    fn tcp_address_helper() {
        let addr = Address::tcp("0.0.0.0", 9000);
        match addr.address {
            Some(address::Address::SocketAddress(sock)) => {
                assert_eq!(sock.address, "0.0.0.0");
                assert_eq!(
                    sock.port_specifier,
                    Some(socket_address::PortSpecifier::PortValue(9000))
                );
            }
            other => panic!("unexpected address {other:?}"),
        }
    }

    #[test]
    fn header_matcher_helpers() {
        let m = HeaderMatcher::string("seldon-model", StringMatcher::exact("iris"));
        assert!(matches!(
            m.header_match_specifier,
            Some(HeaderMatchSpecifier::StringMatch(_))
        ));
        let p = HeaderMatcher::present("x-seldon-route", false);
        assert_eq!(
            p.header_match_specifier,
            Some(HeaderMatchSpecifier::PresentMatch(false))
        );
    }
}
