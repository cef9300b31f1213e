//! Snapshot: immutable, versioned set of mesh resources.
//!
//! A snapshot carries every cluster, route configuration, listener and
//! secret a proxy needs at one version. Resources are grouped by type URL
//! and kept in name order so emission is deterministic.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use xds_core::{BoxResource, ResourceRef, TypeUrl, XdsError, XdsResult};

/// Resources of one type within a snapshot.
#[derive(Debug, Clone, Default)]
pub struct SnapshotResources {
    /// Version string for this resource type.
    version: String,
    /// Resources keyed by name.
    resources: BTreeMap<String, BoxResource>,
}

impl SnapshotResources {
    /// Create a new empty resource collection.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            resources: BTreeMap::new(),
        }
    }

    /// Get the version for this resource type.
    #[inline]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Get the number of resources.
    #[inline]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Check if there are no resources.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Get a resource by name.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&BoxResource> {
        self.resources.get(name)
    }

    /// Whether a resource of this name is present.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.resources.contains_key(name)
    }

    /// Iterate over resources in name order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&String, &BoxResource)> {
        self.resources.iter()
    }

    /// Resource names in order.
    #[inline]
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.resources.keys()
    }

    /// All resources as a vec, in name order.
    pub fn to_vec(&self) -> Vec<BoxResource> {
        self.resources.values().cloned().collect()
    }
}

/// An immutable snapshot of mesh resources for a proxy node.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Global version for this snapshot.
    version: String,
    /// Resources grouped by type URL.
    resources: HashMap<TypeUrl, SnapshotResources>,
    /// Creation timestamp.
    created_at: std::time::Instant,
}

impl Snapshot {
    /// Create a new snapshot builder.
    pub fn builder() -> SnapshotBuilder {
        SnapshotBuilder::new()
    }

    /// Get the global version of this snapshot.
    #[inline]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Get the creation timestamp.
    #[inline]
    pub fn created_at(&self) -> std::time::Instant {
        self.created_at
    }

    /// Get resources for a specific type.
    #[inline]
    pub fn get_resources(&self, type_url: &str) -> Option<&SnapshotResources> {
        self.resources.get(type_url)
    }

    /// Get the version for a specific resource type.
    #[inline]
    pub fn get_version(&self, type_url: &str) -> Option<&str> {
        self.resources.get(type_url).map(|r| r.version.as_str())
    }

    /// Check if this snapshot contains a specific resource type.
    #[inline]
    pub fn contains_type(&self, type_url: &str) -> bool {
        self.resources.contains_key(type_url)
    }

    /// Whether a resource of the given type and name is present.
    pub fn contains(&self, reference: &ResourceRef) -> bool {
        self.resources
            .get(reference.type_url.as_str())
            .is_some_and(|r| r.contains(&reference.name))
    }

    /// Get all type URLs present in this snapshot.
    pub fn type_urls(&self) -> impl Iterator<Item = &TypeUrl> {
        self.resources.keys()
    }

    /// Get the total number of resources across all types.
    pub fn total_resources(&self) -> usize {
        self.resources.values().map(|r| r.len()).sum()
    }

    /// Check if this snapshot is empty (no resources).
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty() || self.resources.values().all(|r| r.is_empty())
    }

    /// References that point at resources this snapshot does not carry.
    pub fn dangling_references(&self) -> Vec<ResourceRef> {
        let mut missing: Vec<ResourceRef> = self
            .resources
            .values()
            .flat_map(|r| r.resources.values())
            .flat_map(|resource| resource.references().iter())
            .filter(|reference| !self.contains(reference))
            .cloned()
            .collect();
        missing.sort();
        missing.dedup();
        missing
    }

    /// Check referential integrity.
    ///
    /// Every cluster a route sends traffic to, every route configuration a
    /// listener serves and every secret a transport socket names must be in
    /// the snapshot.
    pub fn validate(&self) -> XdsResult<()> {
        let missing = self.dangling_references();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(XdsError::InconsistentSnapshot {
                missing: missing.iter().map(ToString::to_string).collect(),
            })
        }
    }
}

/// Builder for creating snapshots.
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    version: String,
    resources: HashMap<TypeUrl, SnapshotResources>,
}

impl SnapshotBuilder {
    /// Create a new snapshot builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the global version for this snapshot.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Add resources of a specific type.
    ///
    /// The version for this resource type is the global version.
    pub fn resources(
        mut self,
        type_url: &str,
        resources: impl IntoIterator<Item = BoxResource>,
    ) -> Self {
        let entry = self
            .resources
            .entry(TypeUrl::new(type_url))
            .or_insert_with(|| SnapshotResources::new(self.version.clone()));
        for resource in resources {
            entry
                .resources
                .insert(resource.name().to_string(), resource);
        }
        self
    }

    /// Add a single resource.
    pub fn resource(self, resource: BoxResource) -> Self {
        let type_url = resource.type_url().to_string();
        self.resources(&type_url, [resource])
    }

    /// Build the snapshot.
    pub fn build(self) -> Snapshot {
        let version = self.version;
        let resources = self
            .resources
            .into_iter()
            .map(|(type_url, mut r)| {
                r.version.clone_from(&version);
                (type_url, r)
            })
            .collect();
        Snapshot {
            version,
            resources,
            created_at: std::time::Instant::now(),
        }
    }

    /// Build the snapshot and check its referential integrity.
    pub fn build_validated(self) -> XdsResult<Snapshot> {
        let snapshot = self.build();
        snapshot.validate()?;
        Ok(snapshot)
    }
}

/// Wrapper around `Arc<Snapshot>` for convenient sharing.
pub type SharedSnapshot = Arc<Snapshot>;
