//! Partition name → active version mapping.

use dashmap::DashMap;
use smol_str::SmolStr;
use std::sync::Arc;
use stratus_core::PartitionKey;

/// Maps each managed partition name to its currently active version.
///
/// The registry holds at most one active version per name. Activation
/// advances every managed name to the deploy's target version; until then a
/// name may be absent, meaning no version of it has been activated yet.
///
/// Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct VersionRegistry {
    versions: Arc<DashMap<SmolStr, SmolStr>>,
}

impl VersionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the active version for `name`, if one has been set.
    pub fn active_version(&self, name: &str) -> Option<SmolStr> {
        self.versions.get(name).map(|v| v.value().clone())
    }

    /// Returns the physical partition key for `name` at its active version.
    pub fn active_partition(&self, name: &str) -> Option<PartitionKey> {
        self.active_version(name)
            .map(|version| PartitionKey::new(name, version))
    }

    /// Sets the active version for `name`, replacing any previous one.
    pub fn set_active(&self, name: impl Into<SmolStr>, version: impl Into<SmolStr>) {
        self.versions.insert(name.into(), version.into());
    }

    /// Returns every (name, active version) pair.
    pub fn snapshot(&self) -> Vec<(SmolStr, SmolStr)> {
        self.versions
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }
}
