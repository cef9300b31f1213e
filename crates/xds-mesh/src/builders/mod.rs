//! Construction of Envoy messages from the mesh model.
//!
//! Everything here is a pure function of its inputs. Packing a message into
//! an `Any` can fail, so builders that do so return [`XdsResult`].

mod cluster;
mod filters;
mod listener;
mod route;
mod tls;

pub use cluster::{make_cluster, make_load_assignment};
pub use filters::{
    access_log, error_only_filter, lua_filter, router_filter, tap_filter, LUA_HEADER_SCRIPT,
    TAP_PATH_PREFIX,
};
pub use listener::make_http_listener;
pub use route::{
    cluster_references, make_route_configurations, mirror_policies, model_mirror_route,
    model_route, model_sticky_route, pipeline_mirror_route, pipeline_route,
    pipeline_sticky_route, route_counts, weighted_model_action, weighted_pipeline_action,
    RouteCounts,
};
pub use tls::{
    downstream_transport_socket, secret_resources, sds_config_source,
    upstream_transport_socket, TLS_TRANSPORT_SOCKET,
};

use prost_types::Any;
use xds_core::{XdsError, XdsResult};

/// Pack a message into an `Any`.
pub(crate) fn pack<M: prost::Name>(message: &M) -> XdsResult<Any> {
    Any::from_msg(message).map_err(|e| XdsError::encoding(M::type_url(), e))
}
