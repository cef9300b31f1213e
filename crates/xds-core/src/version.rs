//! Snapshot version counter.

use std::fmt;

/// Monotonic snapshot version for one proxy node.
///
/// Versions are rendered as decimal strings. The counter wraps to `0`
/// after `u64::MAX` rather than failing.
///
/// # Example
///
/// ```rust
/// use xds_core::SnapshotVersion;
///
/// let mut version = SnapshotVersion::starting_at(u64::MAX - 1);
/// assert_eq!(version.next_version(), u64::MAX.to_string());
/// assert_eq!(version.next_version(), "0");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SnapshotVersion(u64);

impl SnapshotVersion {
    /// A counter whose first issued version is `1`.
    #[must_use]
    pub fn new() -> Self {
        Self(0)
    }

    /// A counter that continues after `current`.
    #[must_use]
    pub fn starting_at(current: u64) -> Self {
        Self(current)
    }

    /// The most recently issued version.
    #[must_use]
    pub fn current(&self) -> u64 {
        self.0
    }

    /// Advance and return the new version string.
    pub fn next_version(&mut self) -> String {
        self.0 = self.0.wrapping_add(1);
        self.0.to_string()
    }
}

impl fmt::Display for SnapshotVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versions_increase() {
        let mut version = SnapshotVersion::new();
        let first: u64 = version.next_version().parse().unwrap();
        let second: u64 = version.next_version().parse().unwrap();
        assert!(second > first);
        assert_eq!(version.current(), 2);
    }

    #[test]
    fn test_version_wraps_to_zero() {
        let mut version = SnapshotVersion::starting_at(u64::MAX);
        assert_eq!(version.next_version(), "0");
        assert_eq!(version.next_version(), "1");
    }
}
