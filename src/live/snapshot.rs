//! Immutable build result published by the live server.

use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::asset::Bundle;
use crate::versions::VersionMap;

/// Version map and bundle bytes of one rebuild.
///
/// Never mutated after construction; a rebuild publishes a whole new value,
/// so a reader holding an `Arc<Snapshot>` always sees names and bytes from
/// the same generation.
#[derive(Debug, Default)]
pub struct Snapshot {
    /// 0 for the empty startup snapshot, +1 per successful rebuild.
    pub generation: u64,
    pub versions: VersionMap,
    assets: FxHashMap<String, Arc<[u8]>>,
}

impl Snapshot {
    /// Snapshot served before the first successful build.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(generation: u64, bundles: Vec<Bundle>) -> Self {
        let mut versions = VersionMap::new();
        let mut assets = FxHashMap::default();
        for bundle in bundles {
            versions.insert(bundle.name.clone(), bundle.versioned);
            assets.insert(bundle.name, bundle.bytes);
        }
        Self {
            generation,
            versions,
            assets,
        }
    }

    /// Bytes of a bundle by its manifest name.
    pub fn bytes(&self, name: &str) -> Option<&Arc<[u8]>> {
        self.assets.get(name)
    }

    /// Find the bundle currently published as `versioned`.
    ///
    /// Returns `(bundle name, bytes)`.
    pub fn lookup(&self, versioned: &str) -> Option<(&str, &Arc<[u8]>)> {
        let name = self.versions.find_versioned(versioned)?;
        Some((name, self.assets.get(name)?))
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}
