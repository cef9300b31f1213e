//! Error types for the mesh control plane.
//!
//! [`XdsError`] covers store resolution, cache bookkeeping, resource
//! construction and snapshot publication, and converts to a gRPC status
//! for whichever transport serves the snapshots.

/// Error type for mesh control plane operations.
///
/// Builders and cache operations return this instead of panicking, so a
/// malformed model definition never takes down the synchronization loop.
///
/// # Example
///
/// ```rust
/// use xds_core::XdsError;
///
/// fn require_replicas(model: &str, version: u32, replicas: usize) -> Result<(), XdsError> {
///     if replicas == 0 {
///         return Err(XdsError::NoLiveReplica {
///             model: model.to_string(),
///             version,
///         });
///     }
///     Ok(())
/// }
///
/// assert!(require_replicas("iris", 1, 0).is_err());
/// ```
#[derive(Debug, thiserror::Error)]
pub enum XdsError {
    /// Requested resource doesn't exist in the cache.
    #[error("resource not found: {type_url}/{name}")]
    ResourceNotFound {
        /// The type URL of the resource.
        type_url: String,
        /// The name of the resource.
        name: String,
    },

    /// Resource validation failed.
    #[error("invalid resource {type_url}/{name}: {reason}")]
    InvalidResource {
        /// The type URL of the resource.
        type_url: String,
        /// The name of the resource.
        name: String,
        /// Reason for validation failure.
        reason: String,
    },

    /// A route referenced a cluster that is no longer in the cache.
    ///
    /// This means cache bookkeeping was already broken before the call.
    #[error("route {route} references missing cluster {cluster}")]
    DanglingClusterReference {
        /// The route being removed.
        route: String,
        /// The cluster that could not be found.
        cluster: String,
    },

    /// A snapshot refers to resources it does not contain.
    #[error("inconsistent snapshot: missing {missing:?}")]
    InconsistentSnapshot {
        /// `type/name` of each missing resource.
        missing: Vec<String>,
    },

    /// The scheduling store has no such model.
    #[error("model not found: {model}")]
    ModelNotFound {
        /// Model name.
        model: String,
    },

    /// The scheduling store has no such server.
    #[error("server not found: {server}")]
    ServerNotFound {
        /// Server name.
        server: String,
    },

    /// A model version has no replica that can serve traffic.
    #[error("no live replica for model {model} version {version}")]
    NoLiveReplica {
        /// Model name.
        model: String,
        /// Model version.
        version: u32,
    },

    /// An external scheduling store call failed.
    #[error("store error: {message}")]
    Store {
        /// Description of the failure.
        message: String,
    },

    /// Protobuf encoding failed.
    #[error("encoding error for {type_url}: {message}")]
    EncodingError {
        /// The type URL being encoded.
        type_url: String,
        /// Error message.
        message: String,
    },

    /// Snapshot could not be handed to the publisher.
    #[error("publish error: {message}")]
    PublishError {
        /// Error message.
        message: String,
    },

    /// A bounded queue is full and the item was dropped.
    #[error("backpressure: {message}")]
    Backpressure {
        /// Error message.
        message: String,
    },

    /// Server is shutting down.
    #[error("control plane is shutting down")]
    Shutdown,

    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl XdsError {
    /// Create an encoding error for a message of the given type.
    pub fn encoding(type_url: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::EncodingError {
            type_url: type_url.into(),
            message: err.to_string(),
        }
    }

    /// Create a store error.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Whether the error means the model should simply not be routed.
    ///
    /// Resolution failures remove the model's route instead of failing the batch.
    #[must_use]
    pub fn is_resolution_failure(&self) -> bool {
        matches!(
            self,
            Self::ModelNotFound { .. }
                | Self::ServerNotFound { .. }
                | Self::NoLiveReplica { .. }
                | Self::Store { .. }
        )
    }
}

/// Convert to tonic::Status for gRPC responses.
impl From<XdsError> for tonic::Status {
    fn from(err: XdsError) -> Self {
        match &err {
            XdsError::InvalidResource { .. } | XdsError::EncodingError { .. } => {
                tonic::Status::invalid_argument(err.to_string())
            }
            XdsError::ResourceNotFound { .. }
            | XdsError::ModelNotFound { .. }
            | XdsError::ServerNotFound { .. } => tonic::Status::not_found(err.to_string()),
            XdsError::NoLiveReplica { .. } => tonic::Status::failed_precondition(err.to_string()),
            XdsError::DanglingClusterReference { .. } | XdsError::InconsistentSnapshot { .. } => {
                tonic::Status::internal(err.to_string())
            }
            XdsError::Store { .. } | XdsError::PublishError { .. } | XdsError::Shutdown => {
                tonic::Status::unavailable(err.to_string())
            }
            XdsError::Backpressure { .. } => tonic::Status::resource_exhausted(err.to_string()),
            XdsError::Configuration(_) => tonic::Status::invalid_argument(err.to_string()),
        }
    }
}
