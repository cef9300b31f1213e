//! TLS transport sockets and SDS secrets.

use xds_core::XdsResult;
use xds_types::envoy::config::core::v3::{
    api_config_source, config_source, grpc_service, transport_socket, ApiConfigSource,
    ApiVersion, ConfigSource, DataSource, GrpcService, TransportSocket,
};
use xds_types::envoy::extensions::transport_sockets::tls::v3::{
    common_tls_context, secret, CertificateValidationContext, CommonTlsContext,
    DownstreamTlsContext, SdsSecretConfig, Secret as EnvoySecret, TlsCertificate,
    UpstreamTlsContext,
};

use super::pack;
use crate::model::Secret;
use crate::names::XDS_CLUSTER;

/// Name of the TLS transport socket extension.
pub const TLS_TRANSPORT_SOCKET: &str = "envoy.transport_sockets.tls";

/// Secrets are fetched over gRPC from the control plane's own cluster.
pub fn sds_config_source() -> ConfigSource {
    ConfigSource {
        resource_api_version: ApiVersion::V3 as i32,
        config_source_specifier: Some(config_source::ConfigSourceSpecifier::ApiConfigSource(
            ApiConfigSource {
                api_type: api_config_source::ApiType::Grpc as i32,
                transport_api_version: ApiVersion::V3 as i32,
                grpc_services: vec![GrpcService {
                    target_specifier: Some(grpc_service::TargetSpecifier::EnvoyGrpc(
                        grpc_service::EnvoyGrpc {
                            cluster_name: XDS_CLUSTER.to_string(),
                            ..Default::default()
                        },
                    )),
                    ..Default::default()
                }],
                ..Default::default()
            },
        )),
        ..Default::default()
    }
}

fn sds_secret(name: &str) -> SdsSecretConfig {
    SdsSecretConfig {
        name: name.to_string(),
        sds_config: Some(sds_config_source()),
    }
}

/// `None` when the secret holds no certificate: the leg stays plaintext.
fn common_tls_context(secret: Option<&Secret>) -> Option<CommonTlsContext> {
    let secret = secret?;
    secret.certificate()?;

    let validation_context_type = match &secret.validation_secret_name {
        Some(name) if secret.validation_certificate().is_some() => Some(
            common_tls_context::ValidationContextType::ValidationContextSdsSecretConfig(
                sds_secret(name),
            ),
        ),
        _ => None,
    };

    Some(CommonTlsContext {
        tls_certificate_sds_secret_configs: vec![sds_secret(&secret.name)],
        validation_context_type,
        ..Default::default()
    })
}

fn transport_socket<M: prost::Name>(context: &M) -> XdsResult<TransportSocket> {
    Ok(TransportSocket {
        name: TLS_TRANSPORT_SOCKET.to_string(),
        config_type: Some(transport_socket::ConfigType::TypedConfig(pack(context)?)),
    })
}

/// Transport socket for clusters (Envoy as client).
pub fn upstream_transport_socket(secret: Option<&Secret>) -> XdsResult<Option<TransportSocket>> {
    common_tls_context(secret)
        .map(|common| {
            transport_socket(&UpstreamTlsContext {
                common_tls_context: Some(common),
                ..Default::default()
            })
        })
        .transpose()
}

/// Transport socket for listeners (Envoy as server).
pub fn downstream_transport_socket(
    secret: Option<&Secret>,
) -> XdsResult<Option<TransportSocket>> {
    common_tls_context(secret)
        .map(|common| {
            transport_socket(&DownstreamTlsContext {
                common_tls_context: Some(common),
                ..Default::default()
            })
        })
        .transpose()
}

/// SDS resources for a secret: the validation context first, if any, then
/// the certificate.
pub fn secret_resources(secret: &Secret) -> Vec<EnvoySecret> {
    let Some(pair) = secret.certificate() else {
        return Vec::new();
    };

    let mut secrets = Vec::with_capacity(2);
    if let (Some(name), Some(ca)) = (
        &secret.validation_secret_name,
        secret.validation_certificate(),
    ) {
        secrets.push(EnvoySecret {
            name: name.clone(),
            r#type: Some(secret::Type::ValidationContext(CertificateValidationContext {
                trusted_ca: Some(DataSource::inline_bytes(ca.to_vec())),
            })),
        });
    }
    secrets.push(EnvoySecret {
        name: secret.name.clone(),
        r#type: Some(secret::Type::TlsCertificate(TlsCertificate {
            certificate_chain: Some(DataSource::inline_bytes(pair.certificate_chain.clone())),
            private_key: Some(DataSource::inline_bytes(pair.private_key.clone())),
        })),
    });
    secrets
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::certs::StaticCertificates;
    use crate::names::{UPSTREAM_CLIENT_SECRET, UPSTREAM_SERVER_SECRET};

    fn upstream_secret(certs: StaticCertificates) -> Secret {
        Secret::load(
            UPSTREAM_CLIENT_SECRET,
            Some(UPSTREAM_SERVER_SECRET.to_string()),
            Arc::new(certs),
        )
        .unwrap()
    }

    fn unpack_upstream(socket: TransportSocket) -> UpstreamTlsContext {
        assert_eq!(socket.name, TLS_TRANSPORT_SOCKET);
        match socket.config_type {
            Some(transport_socket::ConfigType::TypedConfig(any)) => any.to_msg().unwrap(),
            None => panic!("transport socket without config"),
        }
    }

    #[test]
    fn no_secret_means_plaintext() {
        assert!(upstream_transport_socket(None).unwrap().is_none());
        assert!(downstream_transport_socket(None).unwrap().is_none());

        let empty = upstream_secret(StaticCertificates::empty());
        assert!(upstream_transport_socket(Some(&empty)).unwrap().is_none());
        assert!(secret_resources(&empty).is_empty());
    }

    #[test]
    fn upstream_socket_with_validation() {
        let secret = upstream_secret(StaticCertificates::new("crt", "key").with_ca("ca"));
        let context = unpack_upstream(upstream_transport_socket(Some(&secret)).unwrap().unwrap());
        let common = context.common_tls_context.unwrap();

        assert_eq!(common.tls_certificate_sds_secret_configs.len(), 1);
        assert_eq!(common.tls_certificate_sds_secret_configs[0].name, UPSTREAM_CLIENT_SECRET);
        match common.validation_context_type {
            Some(common_tls_context::ValidationContextType::ValidationContextSdsSecretConfig(
                sds,
            )) => assert_eq!(sds.name, UPSTREAM_SERVER_SECRET),
            None => panic!("expected validation context"),
        }
    }

    #[test]
    fn upstream_socket_without_ca_skips_validation() {
        let secret = upstream_secret(StaticCertificates::new("crt", "key"));
        let context = unpack_upstream(upstream_transport_socket(Some(&secret)).unwrap().unwrap());
        assert!(context.common_tls_context.unwrap().validation_context_type.is_none());
    }

    #[test]
    fn secret_resources_carry_inline_bytes() {
        let with_ca = upstream_secret(StaticCertificates::new("crt", "key").with_ca("ca"));
        let secrets = secret_resources(&with_ca);
        let names: Vec<_> = secrets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec![UPSTREAM_SERVER_SECRET, UPSTREAM_CLIENT_SECRET]);

        match &secrets[1].r#type {
            Some(secret::Type::TlsCertificate(cert)) => {
                assert_eq!(cert.private_key, Some(DataSource::inline_bytes("key")));
            }
            other => panic!("unexpected secret type {other:?}"),
        }

        let without_ca = upstream_secret(StaticCertificates::new("crt", "key"));
        assert_eq!(secret_resources(&without_ca).len(), 1);
    }

    #[test]
    fn sds_config_uses_xds_cluster() {
        match sds_config_source().config_source_specifier {
            Some(config_source::ConfigSourceSpecifier::ApiConfigSource(api)) => {
                assert_eq!(api.api_type, api_config_source::ApiType::Grpc as i32);
                assert_eq!(api.grpc_services.len(), 1);
            }
            other => panic!("unexpected config source {other:?}"),
        }
    }
}
