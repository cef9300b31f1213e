//! Mesh configuration.
//!
//! Defaults suit a single Envoy next to the scheduler. Every field can be
//! overridden from the environment with [`MeshConfig::from_env`].

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use xds_core::{XdsError, XdsResult};

/// Plaintext or TLS for one leg of the proxy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SecurityProtocol {
    /// No TLS.
    #[default]
    Plaintext,
    /// TLS with certificates from the environment.
    Ssl,
}

impl FromStr for SecurityProtocol {
    type Err = XdsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PLAINTEXT" => Ok(Self::Plaintext),
            "SSL" => Ok(Self::Ssl),
            other => Err(XdsError::Configuration(format!(
                "unknown security protocol {other:?}, expected SSL or PLAINTEXT"
            ))),
        }
    }
}

impl fmt::Display for SecurityProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plaintext => f.write_str("PLAINTEXT"),
            Self::Ssl => f.write_str("SSL"),
        }
    }
}

/// Listener bind settings.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address of both listeners.
    pub address: String,
    /// Port of the primary listener.
    pub http_port: u32,
    /// Port of the mirror listener.
    pub mirror_port: u32,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            http_port: 9000,
            mirror_port: 9001,
        }
    }
}

/// Where pipelines are served.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PipelineGatewayConfig {
    /// Gateway host.
    pub host: String,
    /// REST port.
    pub http_port: u32,
    /// gRPC port.
    pub grpc_port: u32,
}

impl Default for PipelineGatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            http_port: 9010,
            grpc_port: 9011,
        }
    }
}

/// Access logging on the listeners.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EnvoyConfig {
    /// Attach a file access log.
    pub enable_access_log: bool,
    /// Access log file.
    pub access_log_path: String,
    /// Log every request, not just failures.
    pub include_successful_requests: bool,
}

impl Default for EnvoyConfig {
    fn default() -> Self {
        Self {
            enable_access_log: true,
            access_log_path: "/tmp/envoy-accesslog.txt".to_string(),
            include_successful_requests: false,
        }
    }
}

/// TLS selection, read independently for each leg.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Envoy to model servers and the pipeline gateway.
    pub upstream: SecurityProtocol,
    /// Clients to Envoy.
    pub downstream: SecurityProtocol,
}

/// Configuration of the synchronization engine.
///
/// # Example
///
/// ```rust
/// use xds_mesh::MeshConfig;
///
/// let config = MeshConfig::default();
/// assert_eq!(config.batch_wait().as_millis(), 250);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    /// Proxy node the snapshots are published for.
    pub node_id: String,
    /// Debounce window in milliseconds.
    pub batch_wait_ms: u64,
    /// Capacity of the update event channel.
    pub event_buffer: usize,
    /// Listener settings.
    pub listeners: ListenerConfig,
    /// Pipeline gateway location.
    pub pipeline_gateway: PipelineGatewayConfig,
    /// Access logging.
    pub envoy: EnvoyConfig,
    /// TLS selection.
    pub security: SecurityConfig,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            node_id: "seldon-mesh".to_string(),
            batch_wait_ms: 250,
            event_buffer: 1024,
            listeners: ListenerConfig::default(),
            pipeline_gateway: PipelineGatewayConfig::default(),
            envoy: EnvoyConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> XdsResult<T>
where
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| XdsError::Configuration(format!("invalid {key}={value:?}: {e}")))
}

impl MeshConfig {
    /// Defaults overridden by environment variables, then validated.
    pub fn from_env() -> XdsResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns, then validated.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> XdsResult<Self> {
        let mut config = Self::default();

        if let Some(v) = lookup("SELDON_XDS_NODE_ID") {
            config.node_id = v;
        }
        if let Some(v) = lookup("SELDON_XDS_BATCH_WAIT_MS") {
            config.batch_wait_ms = parse("SELDON_XDS_BATCH_WAIT_MS", &v)?;
        }
        if let Some(v) = lookup("SELDON_XDS_EVENT_BUFFER") {
            config.event_buffer = parse("SELDON_XDS_EVENT_BUFFER", &v)?;
        }
        if let Some(v) = lookup("SELDON_ENVOY_ADDRESS") {
            config.listeners.address = v;
        }
        if let Some(v) = lookup("SELDON_ENVOY_HTTP_PORT") {
            config.listeners.http_port = parse("SELDON_ENVOY_HTTP_PORT", &v)?;
        }
        if let Some(v) = lookup("SELDON_ENVOY_MIRROR_PORT") {
            config.listeners.mirror_port = parse("SELDON_ENVOY_MIRROR_PORT", &v)?;
        }
        if let Some(v) = lookup("SELDON_PIPELINEGATEWAY_HOST") {
            config.pipeline_gateway.host = v;
        }
        if let Some(v) = lookup("SELDON_PIPELINEGATEWAY_HTTP_PORT") {
            config.pipeline_gateway.http_port = parse("SELDON_PIPELINEGATEWAY_HTTP_PORT", &v)?;
        }
        if let Some(v) = lookup("SELDON_PIPELINEGATEWAY_GRPC_PORT") {
            config.pipeline_gateway.grpc_port = parse("SELDON_PIPELINEGATEWAY_GRPC_PORT", &v)?;
        }
        if let Some(v) = lookup("SELDON_ENVOY_ENABLE_ACCESS_LOG") {
            config.envoy.enable_access_log = parse("SELDON_ENVOY_ENABLE_ACCESS_LOG", &v)?;
        }
        if let Some(v) = lookup("SELDON_ENVOY_ACCESS_LOG_PATH") {
            config.envoy.access_log_path = v;
        }
        if let Some(v) = lookup("SELDON_ENVOY_INCLUDE_SUCCESSFUL_REQUESTS") {
            config.envoy.include_successful_requests =
                parse("SELDON_ENVOY_INCLUDE_SUCCESSFUL_REQUESTS", &v)?;
        }
        if let Some(v) = lookup("ENVOY_UPSTREAM_SECURITY_PROTOCOL") {
            config.security.upstream = v.parse()?;
        }
        if let Some(v) = lookup("ENVOY_DOWNSTREAM_SECURITY_PROTOCOL") {
            config.security.downstream = v.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Debounce window.
    #[must_use]
    pub fn batch_wait(&self) -> Duration {
        Duration::from_millis(self.batch_wait_ms)
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> XdsResult<()> {
        let fail = |msg: &str| Err(XdsError::Configuration(msg.to_string()));

        if self.node_id.is_empty() {
            return fail("node_id must not be empty");
        }
        if self.batch_wait_ms == 0 {
            return fail("batch_wait_ms must be greater than zero");
        }
        if self.event_buffer == 0 {
            return fail("event_buffer must be greater than zero");
        }
        let ports = [
            self.listeners.http_port,
            self.listeners.mirror_port,
            self.pipeline_gateway.http_port,
            self.pipeline_gateway.grpc_port,
        ];
        if ports.iter().any(|p| *p == 0 || *p > u32::from(u16::MAX)) {
            return fail("ports must be between 1 and 65535");
        }
        if self.listeners.http_port == self.listeners.mirror_port {
            return fail("primary and mirror listener ports must differ");
        }
        if self.envoy.enable_access_log && self.envoy.access_log_path.is_empty() {
            return fail("access_log_path must be set when access logging is enabled");
        }
        Ok(())
    }
}
