//! Listener construction.

use xds_core::XdsResult;
use xds_types::envoy::config::core::v3::{
    config_source, Address, AggregatedConfigSource, ApiVersion, ConfigSource,
};
use xds_types::envoy::config::listener::v3::{filter, Filter, FilterChain, Listener as EnvoyListener};
use xds_types::envoy::extensions::filters::network::http_connection_manager::v3::{
    http_connection_manager, HttpConnectionManager, Rds,
};

use super::filters::{access_log, lua_filter, router_filter, tap_filter};
use super::pack;
use super::tls::downstream_transport_socket;
use crate::config::EnvoyConfig;
use crate::model::{Listener, Secret};

const HTTP_CONNECTION_MANAGER: &str = "envoy.filters.network.http_connection_manager";

/// Route configurations are fetched over the aggregated stream.
fn ads_config_source() -> ConfigSource {
    ConfigSource {
        resource_api_version: ApiVersion::V3 as i32,
        config_source_specifier: Some(config_source::ConfigSourceSpecifier::Ads(
            AggregatedConfigSource {},
        )),
        ..Default::default()
    }
}

/// An HTTP listener serving `listener.route_config_name` over RDS.
///
/// Filters run tap, lua, router in that order. With a downstream secret the
/// filter chain terminates TLS.
pub fn make_http_listener(
    listener: &Listener,
    server_secret: Option<&Secret>,
    envoy: &EnvoyConfig,
) -> XdsResult<EnvoyListener> {
    let manager = HttpConnectionManager {
        codec_type: http_connection_manager::CodecType::Auto as i32,
        stat_prefix: listener.name.clone(),
        http_filters: vec![tap_filter()?, lua_filter()?, router_filter()?],
        access_log: access_log(envoy)?.into_iter().collect(),
        generate_request_id: Some(false),
        always_set_request_id_in_response: false,
        route_specifier: Some(http_connection_manager::RouteSpecifier::Rds(Rds {
            config_source: Some(ads_config_source()),
            route_config_name: listener.route_config_name.clone(),
        })),
    };

    Ok(EnvoyListener {
        name: listener.name.clone(),
        address: Some(Address::tcp(listener.address.clone(), listener.port)),
        filter_chains: vec![FilterChain {
            filters: vec![Filter {
                name: HTTP_CONNECTION_MANAGER.to_string(),
                config_type: Some(filter::ConfigType::TypedConfig(pack(&manager)?)),
            }],
            transport_socket: downstream_transport_socket(server_secret)?,
            ..Default::default()
        }],
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::builders::TLS_TRANSPORT_SOCKET;
    use crate::certs::StaticCertificates;
    use crate::names::{DEFAULT_LISTENER_NAME, DEFAULT_ROUTE_CONFIG_NAME, DOWNSTREAM_SERVER_SECRET};

    fn listener() -> Listener {
        Listener {
            name: DEFAULT_LISTENER_NAME.to_string(),
            address: "0.0.0.0".to_string(),
            port: 9000,
            route_config_name: DEFAULT_ROUTE_CONFIG_NAME.to_string(),
        }
    }

    fn manager(l: &EnvoyListener) -> HttpConnectionManager {
        let filter = &l.filter_chains[0].filters[0];
        assert_eq!(filter.name, HTTP_CONNECTION_MANAGER);
        match &filter.config_type {
            Some(filter::ConfigType::TypedConfig(any)) => any.to_msg().unwrap(),
            None => panic!("listener filter without config"),
        }
    }

    #[test]
    fn listener_serves_route_config_over_ads() {
        let envoy = EnvoyConfig {
            enable_access_log: false,
            ..Default::default()
        };
        let built = make_http_listener(&listener(), None, &envoy).unwrap();

        assert_eq!(built.name, DEFAULT_LISTENER_NAME);
        assert_eq!(built.address, Some(Address::tcp("0.0.0.0", 9000)));
        assert!(built.filter_chains[0].transport_socket.is_none());

        let hcm = manager(&built);
        assert_eq!(hcm.stat_prefix, DEFAULT_LISTENER_NAME);
        assert_eq!(hcm.generate_request_id, Some(false));
        assert!(hcm.access_log.is_empty());
        let names: Vec<_> = hcm.http_filters.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "envoy.filters.http.tap",
                "envoy.filters.http.lua",
                "envoy.filters.http.router"
            ]
        );
        match hcm.route_specifier {
            Some(http_connection_manager::RouteSpecifier::Rds(rds)) => {
                assert_eq!(rds.route_config_name, DEFAULT_ROUTE_CONFIG_NAME);
                assert_eq!(rds.config_source, Some(ads_config_source()));
            }
            None => panic!("listener without RDS"),
        }
    }

    #[test]
    fn listener_attaches_access_log() {
        let built = make_http_listener(&listener(), None, &EnvoyConfig::default()).unwrap();
        let hcm = manager(&built);
        assert_eq!(hcm.access_log.len(), 1);
        assert!(hcm.access_log[0].filter.is_some());
    }

    #[test]
    fn listener_terminates_tls_with_secret() {
        let secret = Secret::load(
            DOWNSTREAM_SERVER_SECRET,
            None,
            Arc::new(StaticCertificates::new(b"crt".to_vec(), b"key".to_vec())),
        )
        .unwrap();
        let built =
            make_http_listener(&listener(), Some(&secret), &EnvoyConfig::default()).unwrap();
        let socket = built.filter_chains[0].transport_socket.as_ref().unwrap();
        assert_eq!(socket.name, TLS_TRANSPORT_SOCKET);
    }
}
