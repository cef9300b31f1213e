//! The [`Resource`] trait and the prost-backed [`ProtoResource`].

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::{TypeUrl, XdsError, XdsResult};

/// A reference from one resource to another, by type and name.
///
/// Snapshot validation uses these to check that nothing points at a
/// resource the snapshot does not carry.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceRef {
    /// Type URL of the referenced resource.
    pub type_url: TypeUrl,
    /// Name of the referenced resource.
    pub name: String,
}

impl ResourceRef {
    /// Reference to a resource of the given type.
    #[must_use]
    pub fn new(type_url: &str, name: impl Into<String>) -> Self {
        Self {
            type_url: TypeUrl::new(type_url),
            name: name.into(),
        }
    }

    /// Reference to a cluster.
    #[must_use]
    pub fn cluster(name: impl Into<String>) -> Self {
        Self::new(TypeUrl::CLUSTER, name)
    }

    /// Reference to a route configuration.
    #[must_use]
    pub fn route(name: impl Into<String>) -> Self {
        Self::new(TypeUrl::ROUTE, name)
    }

    /// Reference to a secret.
    #[must_use]
    pub fn secret(name: impl Into<String>) -> Self {
        Self::new(TypeUrl::SECRET, name)
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.type_url.short_name(), self.name)
    }
}

/// Trait for resources carried in a snapshot.
///
/// # Example
///
/// ```rust
/// use xds_core::{Resource, TypeUrl};
/// use std::any::Any as StdAny;
///
/// #[derive(Debug)]
/// struct StaticCluster {
///     name: String,
/// }
///
/// impl Resource for StaticCluster {
///     fn type_url(&self) -> &str {
///         TypeUrl::CLUSTER
///     }
///
///     fn name(&self) -> &str {
///         &self.name
///     }
///
///     fn encode(&self) -> Result<prost_types::Any, Box<dyn std::error::Error + Send + Sync>> {
///         Ok(prost_types::Any {
///             type_url: self.type_url().to_string(),
///             value: vec![],
///         })
///     }
///
///     fn as_any(&self) -> &dyn StdAny {
///         self
///     }
/// }
/// ```
pub trait Resource: Send + Sync + fmt::Debug {
    /// Get the type URL for this resource.
    fn type_url(&self) -> &str;

    /// Get the resource name.
    fn name(&self) -> &str;

    /// Encode the resource to a protobuf Any message.
    fn encode(&self) -> Result<prost_types::Any, Box<dyn std::error::Error + Send + Sync>>;

    /// Other resources this one points at.
    fn references(&self) -> &[ResourceRef] {
        &[]
    }

    /// Convert to Any for downcasting.
    fn as_any(&self) -> &dyn Any;
}

/// Shared handle to a resource.
pub type BoxResource = Arc<dyn Resource>;

/// A named prost message emitted as a resource.
///
/// The message must implement [`prost::Name`] with a full
/// `type.googleapis.com/...` type URL.
#[derive(Clone, Debug, PartialEq)]
pub struct ProtoResource<M> {
    name: String,
    type_url: String,
    message: M,
    references: Vec<ResourceRef>,
}

impl<M> ProtoResource<M>
where
    M: prost::Name + fmt::Debug + Send + Sync + 'static,
{
    /// Wrap a message under the given resource name.
    #[must_use]
    pub fn new(name: impl Into<String>, message: M) -> Self {
        Self {
            name: name.into(),
            type_url: M::type_url(),
            message,
            references: Vec::new(),
        }
    }

    /// Record the resources this message points at.
    #[must_use]
    pub fn with_references(mut self, references: impl IntoIterator<Item = ResourceRef>) -> Self {
        self.references.extend(references);
        self
    }

    /// The wrapped message.
    #[must_use]
    pub fn message(&self) -> &M {
        &self.message
    }

    /// Pack the message into an `Any`.
    pub fn to_any(&self) -> XdsResult<prost_types::Any> {
        prost_types::Any::from_msg(&self.message)
            .map_err(|e| XdsError::encoding(self.type_url.clone(), e))
    }

    /// Turn into a shared [`BoxResource`].
    #[must_use]
    pub fn boxed(self) -> BoxResource {
        Arc::new(self)
    }
}

impl<M> Resource for ProtoResource<M>
where
    M: prost::Name + fmt::Debug + Send + Sync + 'static,
{
    fn type_url(&self) -> &str {
        &self.type_url
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn encode(&self) -> Result<prost_types::Any, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.to_any()?)
    }

    fn references(&self) -> &[ResourceRef] {
        &self.references
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
