//! Names, headers and identifiers shared by the cache and the builders.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use sha2::{Digest, Sha256};

use crate::model::Transport;

/// Primary listener.
pub const DEFAULT_LISTENER_NAME: &str = "seldon_http";
/// Listener receiving mirrored traffic.
pub const MIRROR_LISTENER_NAME: &str = "seldon_mirrors";

/// Route configuration served by the primary listener.
pub const DEFAULT_ROUTE_CONFIG_NAME: &str = "listener_0";
/// Route configuration served by the mirror listener.
pub const MIRROR_ROUTE_CONFIG_NAME: &str = "listener_1";

/// Virtual host of the primary route configuration.
pub const DEFAULT_VIRTUAL_HOST: &str = "seldon_service";
/// Virtual host of the mirror route configuration.
pub const MIRROR_VIRTUAL_HOST: &str = "seldon_mirror";

/// Header selecting the model or pipeline route.
pub const SELDON_MODEL_HEADER: &str = "seldon-model";
/// Header telling the agent which model version to run.
pub const SELDON_INTERNAL_MODEL_HEADER: &str = "seldon-internal-model";
/// Sticky-session header, returned to the client and echoed back.
pub const SELDON_ROUTE_HEADER: &str = "x-seldon-route";
/// Header that marks a request or response for payload capture.
pub const SELDON_LOGGING_HEADER: &str = "Seldon-Logging";

/// Separator wrapped around values of [`SELDON_ROUTE_HEADER`].
pub const ROUTE_SEPARATOR: &str = ":";

/// Path prefix of REST inference requests.
pub const HTTP_PATH_PREFIX: &str = "/v2";
/// Path prefix of gRPC inference requests.
pub const GRPC_PATH_PREFIX: &str = "/inference.GRPCInferenceService";

/// Suffix of pipeline route names and of the model name they carry.
pub const PIPELINE_SUFFIX: &str = "pipeline";
/// Suffix of experiment route names.
pub const EXPERIMENT_SUFFIX: &str = "experiment";

/// Pipeline gateway, REST.
pub const PIPELINE_GATEWAY_HTTP_CLUSTER: &str = "pipelinegateway_http";
/// Pipeline gateway, gRPC.
pub const PIPELINE_GATEWAY_GRPC_CLUSTER: &str = "pipelinegateway_grpc";
/// Mirror listener, REST.
pub const MIRROR_HTTP_CLUSTER: &str = "mirror_http";
/// Mirror listener, gRPC.
pub const MIRROR_GRPC_CLUSTER: &str = "mirror_grpc";

/// Cluster through which Envoy fetches secrets.
pub const XDS_CLUSTER: &str = "xds_cluster";

/// Secret presented by the listeners.
pub const DOWNSTREAM_SERVER_SECRET: &str = "downstream_server";
/// CA used to verify downstream clients.
pub const DOWNSTREAM_CLIENT_SECRET: &str = "downstream_client";
/// CA used to verify upstream servers.
pub const UPSTREAM_SERVER_SECRET: &str = "upstream_server";
/// Secret presented to upstream servers.
pub const UPSTREAM_CLIENT_SECRET: &str = "upstream_client";

/// `{model}_{version}`, the name an agent loads a model version under.
#[must_use]
pub fn versioned_model_name(model: &str, version: u32) -> String {
    format!("{model}_{version}")
}

/// `:{key}:`, the sticky-session marker for one model version or pipeline.
#[must_use]
pub fn wrap_route_header(key: &str) -> String {
    format!("{ROUTE_SEPARATOR}{key}{ROUTE_SEPARATOR}")
}

/// Route and internal model name of a pipeline, `{pipeline}.pipeline`.
#[must_use]
pub fn pipeline_route_name(pipeline: &str) -> String {
    format!("{pipeline}.{PIPELINE_SUFFIX}")
}

/// Route name of an experiment, `{experiment}.experiment`.
#[must_use]
pub fn experiment_route_name(experiment: &str) -> String {
    format!("{experiment}.{EXPERIMENT_SUFFIX}")
}

/// Envoy route name, e.g. `iris_http` or `iris_grpc_mirror`.
#[must_use]
pub fn envoy_route_name(route: &str, transport: Transport, mirror: bool) -> String {
    if mirror {
        format!("{route}_{transport}_mirror")
    } else {
        format!("{route}_{transport}")
    }
}

/// Envoy route name of a sticky-session route, e.g. `iris_http_experiment`.
#[must_use]
pub fn sticky_route_name(route: &str, transport: Transport) -> String {
    format!("{route}_{transport}_{EXPERIMENT_SUFFIX}")
}

/// Pipeline gateway cluster for a transport.
#[must_use]
pub fn pipeline_gateway_cluster(transport: Transport) -> &'static str {
    match transport {
        Transport::Http => PIPELINE_GATEWAY_HTTP_CLUSTER,
        Transport::Grpc => PIPELINE_GATEWAY_GRPC_CLUSTER,
    }
}

/// Mirror cluster for a transport.
#[must_use]
pub fn mirror_cluster(transport: Transport) -> &'static str {
    match transport {
        Transport::Http => MIRROR_HTTP_CLUSTER,
        Transport::Grpc => MIRROR_GRPC_CLUSTER,
    }
}

/// Hash of a replica set: base64 SHA-256 of the sorted, comma-joined indices.
///
/// Assignment order does not matter.
#[must_use]
pub fn replica_set_hash(replicas: &[usize]) -> String {
    let mut sorted = replicas.to_vec();
    sorted.sort_unstable();
    let joined = sorted
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",");
    STANDARD.encode(Sha256::digest(joined.as_bytes()))
}

/// HTTP and gRPC cluster names for a server's replica set.
///
/// Model versions placed on the same replicas of the same server share
/// these clusters.
#[must_use]
pub fn cluster_names(server: &str, replicas: &[usize]) -> (String, String) {
    let base = format!("{server}_{}", replica_set_hash(replicas));
    (format!("{base}_http"), format!("{base}_grpc"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cluster_names_ignore_assignment_order() {
        assert_eq!(
            cluster_names("mlserver", &[2, 0, 1]),
            cluster_names("mlserver", &[0, 1, 2])
        );
    }

    #[test]
    fn cluster_names_change_with_replica_set() {
        let (http_a, grpc_a) = cluster_names("mlserver", &[0, 1]);
        let (http_b, _) = cluster_names("mlserver", &[0, 2]);
        let (http_c, _) = cluster_names("triton", &[0, 1]);

        assert_ne!(http_a, http_b);
        assert_ne!(http_a, http_c);
        assert!(http_a.starts_with("mlserver_"));
        assert!(http_a.ends_with("_http"));
        assert_eq!(http_a.trim_end_matches("_http"), grpc_a.trim_end_matches("_grpc"));
    }

    #[test]
    fn replica_hash_is_sha256_base64() {
        // sha256("0") in standard base64.
        assert_eq!(
            replica_set_hash(&[0]),
            "X+zrZv/IbzjZUnhsbWlsecLbwjndTpG0ZynXOif7V+k="
        );
    }

    #[test]
    fn route_names() {
        assert_eq!(versioned_model_name("iris", 3), "iris_3");
        assert_eq!(wrap_route_header("iris_3"), ":iris_3:");
        assert_eq!(pipeline_route_name("fraud"), "fraud.pipeline");
        assert_eq!(experiment_route_name("ab"), "ab.experiment");
        assert_eq!(envoy_route_name("iris", Transport::Grpc, true), "iris_grpc_mirror");
        assert_eq!(envoy_route_name("iris", Transport::Http, false), "iris_http");
        assert_eq!(sticky_route_name("iris", Transport::Http), "iris_http_experiment");
    }
}
