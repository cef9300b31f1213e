//! Type URLs of the resources the mesh emits.

use std::borrow::Borrow;
use std::fmt;

/// Type URL of an xDS resource kind.
///
/// # Example
///
/// ```rust
/// use xds_core::TypeUrl;
///
/// let secrets = TypeUrl::new(TypeUrl::SECRET);
/// assert_eq!(secrets.short_name(), "Secret");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeUrl(String);

impl TypeUrl {
    /// Type URL for Cluster (CDS).
    pub const CLUSTER: &'static str = "type.googleapis.com/envoy.config.cluster.v3.Cluster";

    /// Type URL for RouteConfiguration (RDS).
    pub const ROUTE: &'static str =
        "type.googleapis.com/envoy.config.route.v3.RouteConfiguration";

    /// Type URL for Listener (LDS).
    pub const LISTENER: &'static str = "type.googleapis.com/envoy.config.listener.v3.Listener";

    /// Type URL for Secret (SDS).
    pub const SECRET: &'static str =
        "type.googleapis.com/envoy.extensions.transport_sockets.tls.v3.Secret";

    /// Every kind published in a mesh snapshot, in push order.
    pub const MESH_TYPES: [&'static str; 4] =
        [Self::CLUSTER, Self::ROUTE, Self::LISTENER, Self::SECRET];

    /// Create a new type URL from a string.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// Get the type URL as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The message name after the last `.`, e.g. `Cluster`.
    #[must_use]
    pub fn short_name(&self) -> &str {
        self.0
            .rsplit('/')
            .next()
            .and_then(|s| s.rsplit('.').next())
            .unwrap_or(&self.0)
    }
}

impl fmt::Display for TypeUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeUrl {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TypeUrl {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for TypeUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for TypeUrl {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_names() {
        let names: Vec<_> = TypeUrl::MESH_TYPES
            .iter()
            .map(|t| TypeUrl::new(*t).short_name().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["Cluster", "RouteConfiguration", "Listener", "Secret"]
        );
    }

    #[test]
    fn test_from_str() {
        let t: TypeUrl = TypeUrl::ROUTE.into();
        assert_eq!(t.as_str(), TypeUrl::ROUTE);
    }
}
