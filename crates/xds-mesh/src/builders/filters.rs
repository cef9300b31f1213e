//! HTTP filters and access logging for the mesh listeners.

use xds_core::XdsResult;
use xds_types::envoy::config::accesslog::v3::{
    access_log, access_log_filter::FilterSpecifier, comparison_filter, grpc_status_filter,
    AccessLog, AccessLogFilter, AndFilter, ComparisonFilter, GrpcStatusFilter, HeaderFilter,
    OrFilter, StatusCodeFilter,
};
use xds_types::envoy::config::common::matcher::v3::{
    match_predicate, HttpHeadersMatch, MatchPredicate,
};
use xds_types::envoy::config::core::v3::{
    substitution_format_string, DataSource, RuntimeUInt32, SubstitutionFormatString,
};
use xds_types::envoy::config::route::v3::HeaderMatcher;
use xds_types::envoy::config::tap::v3::{
    output_sink, FilePerTapSink, OutputConfig, OutputSink, TapConfig,
};
use xds_types::envoy::extensions::access_loggers::file::v3::{file_access_log, FileAccessLog};
use xds_types::envoy::extensions::common::tap::v3::{
    common_extension_config, CommonExtensionConfig,
};
use xds_types::envoy::extensions::filters::http::lua::v3::Lua;
use xds_types::envoy::extensions::filters::http::router::v3::Router;
use xds_types::envoy::extensions::filters::http::tap::v3::Tap;
use xds_types::envoy::extensions::filters::network::http_connection_manager::v3::{
    http_filter, HttpFilter,
};
use xds_types::envoy::r#type::matcher::v3::StringMatcher;

use super::pack;
use crate::config::EnvoyConfig;
use crate::names::SELDON_LOGGING_HEADER;

const TAP_FILTER: &str = "envoy.filters.http.tap";
const LUA_FILTER: &str = "envoy.filters.http.lua";
const ROUTER_FILTER: &str = "envoy.filters.http.router";
const FILE_ACCESS_LOGGER: &str = "envoy.access_loggers.file";

/// Prefix of the per-request files written by the tap filter.
pub const TAP_PATH_PREFIX: &str = "/tmp/request-log";

const ACCESS_LOG_FORMAT: &str = "[%START_TIME%] \"%REQ(:METHOD)% %REQ(X-ENVOY-ORIGINAL-PATH?:PATH)% %PROTOCOL%\" %RESPONSE_CODE% %GRPC_STATUS_NUMBER% %RESPONSE_FLAGS% %BYTES_RECEIVED% %BYTES_SENT% %DURATION% %RESP(X-ENVOY-UPSTREAM-SERVICE-TIME)% \"%REQ(X-FORWARDED-FOR)%\" \"%REQ(USER-AGENT)%\" \"%REQ(X-REQUEST-ID)%\" \"%REQ(:AUTHORITY)%\" \"%UPSTREAM_HOST%\"\n";

/// Derives `seldon-model` from the request path when a client sent neither
/// `seldon-model` nor `x-seldon-route`.
///
/// `/v2/models/{m}/...` yields `m`; `/v2/pipelines/{p}/...` yields
/// `p.pipeline`.
pub const LUA_HEADER_SCRIPT: &str = r#"function envoy_on_request(request_handle)
  local modelHeader = request_handle:headers():get("seldon-model")
  local routeHeader = request_handle:headers():get("x-seldon-route")
  if (modelHeader == nil or modelHeader == '') and (routeHeader == nil or routeHeader == '') then
    local path = request_handle:headers():get(":path")
    local i, j = string.find(path,"/v2/models/")
    if i == 1 then
      local s = string.sub(path,j+1)
      i, j = string.find(s, "/")
      if i then
        local model = string.sub(s,0,i-1)
        request_handle:headers():add("seldon-model",model)
      else
        request_handle:headers():add("seldon-model",s)
      end
    else
      i, j = string.find(path,"/v2/pipelines/")
      if i == 1 then
        local s = string.sub(path,j+1)
        i, j = string.find(s, "/")
        if i then
          local pipeline = string.sub(s,0,i-1)
          request_handle:headers():add("seldon-model",pipeline..".pipeline")
        else
          request_handle:headers():add("seldon-model",s..".pipeline")
        end
      end
    end
  end
end
"#;

fn http_filter(name: &str, config: prost_types::Any) -> HttpFilter {
    HttpFilter {
        name: name.to_string(),
        config_type: Some(http_filter::ConfigType::TypedConfig(config)),
        ..Default::default()
    }
}

fn logging_header_present() -> HttpHeadersMatch {
    HttpHeadersMatch {
        headers: vec![HeaderMatcher::present(SELDON_LOGGING_HEADER, true)],
    }
}

/// Tap filter capturing exchanges that carry `Seldon-Logging` on either the
/// response or the request.
pub fn tap_filter() -> XdsResult<HttpFilter> {
    let tap = Tap {
        common_config: Some(CommonExtensionConfig {
            config_type: Some(common_extension_config::ConfigType::StaticConfig(TapConfig {
                r#match: Some(MatchPredicate {
                    rule: Some(match_predicate::Rule::OrMatch(match_predicate::MatchSet {
                        rules: vec![
                            MatchPredicate {
                                rule: Some(match_predicate::Rule::HttpResponseHeadersMatch(
                                    logging_header_present(),
                                )),
                            },
                            MatchPredicate {
                                rule: Some(match_predicate::Rule::HttpRequestHeadersMatch(
                                    logging_header_present(),
                                )),
                            },
                        ],
                    })),
                }),
                output_config: Some(OutputConfig {
                    sinks: vec![OutputSink {
                        output_sink_type: Some(output_sink::OutputSinkType::FilePerTap(
                            FilePerTapSink {
                                path_prefix: TAP_PATH_PREFIX.to_string(),
                            },
                        )),
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
            })),
        }),
        ..Default::default()
    };
    Ok(http_filter(TAP_FILTER, pack(&tap)?))
}

/// Lua filter running [`LUA_HEADER_SCRIPT`].
pub fn lua_filter() -> XdsResult<HttpFilter> {
    let lua = Lua {
        default_source_code: Some(DataSource::inline_string(LUA_HEADER_SCRIPT)),
        ..Default::default()
    };
    Ok(http_filter(LUA_FILTER, pack(&lua)?))
}

/// Terminal router filter.
pub fn router_filter() -> XdsResult<HttpFilter> {
    Ok(http_filter(ROUTER_FILTER, pack(&Router::default())?))
}

fn filter(specifier: FilterSpecifier) -> AccessLogFilter {
    AccessLogFilter {
        filter_specifier: Some(specifier),
    }
}

fn grpc_content_type(invert_match: bool) -> AccessLogFilter {
    let mut header = HeaderMatcher::string(
        "content-type",
        StringMatcher::prefix("application/grpc", true),
    );
    header.invert_match = invert_match;
    filter(FilterSpecifier::HeaderFilter(HeaderFilter {
        header: Some(header),
    }))
}

/// Log only failed exchanges.
///
/// An HTTP exchange fails with a status of 400 or above; a gRPC exchange
/// fails with any gRPC status other than OK. gRPC is told apart by its
/// `application/grpc` content type.
pub fn error_only_filter() -> AccessLogFilter {
    let http_errors = filter(FilterSpecifier::AndFilter(AndFilter {
        filters: vec![
            filter(FilterSpecifier::StatusCodeFilter(StatusCodeFilter {
                comparison: Some(ComparisonFilter {
                    op: comparison_filter::Op::Ge as i32,
                    value: Some(RuntimeUInt32 {
                        default_value: 400,
                        runtime_key: "status_code".to_string(),
                    }),
                }),
            })),
            grpc_content_type(true),
        ],
    }));

    let grpc_errors = filter(FilterSpecifier::AndFilter(AndFilter {
        filters: vec![
            filter(FilterSpecifier::GrpcStatusFilter(GrpcStatusFilter {
                statuses: vec![grpc_status_filter::Status::Ok as i32],
                exclude: true,
            })),
            grpc_content_type(false),
        ],
    }));

    filter(FilterSpecifier::OrFilter(OrFilter {
        filters: vec![http_errors, grpc_errors],
    }))
}

/// File access log for a listener, or `None` when access logging is off.
pub fn access_log(config: &EnvoyConfig) -> XdsResult<Option<AccessLog>> {
    if !config.enable_access_log {
        return Ok(None);
    }

    let file = FileAccessLog {
        path: config.access_log_path.clone(),
        access_log_format: Some(file_access_log::AccessLogFormat::LogFormat(
            SubstitutionFormatString {
                format: Some(substitution_format_string::Format::TextFormatSource(
                    DataSource::inline_string(ACCESS_LOG_FORMAT),
                )),
                ..Default::default()
            },
        )),
    };

    Ok(Some(AccessLog {
        name: FILE_ACCESS_LOGGER.to_string(),
        filter: (!config.include_successful_requests).then(error_only_filter),
        config_type: Some(access_log::ConfigType::TypedConfig(pack(&file)?)),
    }))
}
