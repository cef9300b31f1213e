//! # xds-core
//!
//! Shared vocabulary for the Seldon mesh control plane.
//!
//! - [`XdsError`] - error type for cache, builder and processor failures, with gRPC status mapping
//! - [`NodeId`] / [`NodeHash`] - the proxy identity a snapshot is published for
//! - [`SnapshotVersion`] - wrapping decimal version counter for published snapshots
//! - [`Resource`] - trait for anything that can be emitted in a snapshot
//! - [`ProtoResource`] - a named prost message packed as a [`Resource`]
//! - [`TypeUrl`] - type URLs of the resource kinds the mesh emits
//!
//! ## Example
//!
//! ```rust
//! use xds_core::{NodeId, SnapshotVersion};
//!
//! let node = NodeId::new("seldon-mesh");
//! let mut versions = SnapshotVersion::new();
//!
//! assert_eq!(node.id(), "seldon-mesh");
//! assert_eq!(versions.next_version(), "1");
//! assert_eq!(versions.next_version(), "2");
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod node;
mod resource;
mod type_url;
mod version;

pub use error::XdsError;
pub use node::{NodeHash, NodeId};
pub use resource::{BoxResource, ProtoResource, Resource, ResourceRef};
pub use type_url::TypeUrl;
pub use version::SnapshotVersion;

/// Result type alias using [`XdsError`].
pub type Result<T> = std::result::Result<T, XdsError>;

/// Alias for [`Result`], used throughout the mesh crates.
pub type XdsResult<T> = Result<T>;
