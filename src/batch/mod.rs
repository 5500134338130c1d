//! Production build: every bundle to disk plus the version map.
//!
//! ```text
//! mend.json ─► Manifest ─► build_all ─► <output>/<versioned>...
//!                                   └─► mend-versions.json
//! ```
//!
//! All bundles are built in memory first. A single failure aborts the batch
//! before anything is written, so the output directory and the version map
//! never describe a half-built manifest.

#[cfg(test)]
mod tests;

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::asset::{Bundle, build_bundle};
use crate::core::BuildMode;
use crate::error::{MendError, Result};
use crate::manifest::Manifest;
use crate::processor::ProcessorRegistry;
use crate::versions::VersionMap;

/// Build every entry of a manifest. Stops at the first failing bundle.
pub fn build_all(
    manifest: &Manifest,
    registry: &ProcessorRegistry,
    mode: BuildMode,
    diagnostics: &mut dyn Write,
) -> Result<Vec<Bundle>> {
    manifest
        .iter()
        .map(|entry| build_bundle(entry, &manifest.base_dir, registry, mode, diagnostics))
        .collect()
}

/// Name → versioned name for a set of built bundles.
pub fn version_map(bundles: &[Bundle]) -> VersionMap {
    bundles
        .iter()
        .map(|b| (b.name.clone(), b.versioned.clone()))
        .collect()
}

/// Write each bundle to `<output_dir>/<versioned>`, creating directories as needed.
pub fn write_bundles(bundles: &[Bundle], output_dir: &Path) -> Result<()> {
    for bundle in bundles {
        let path = output_dir.join(&bundle.versioned);
        let write_err = |source| MendError::Write {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(&path, &bundle.bytes).map_err(write_err)?;
        crate::debug!("build"; "wrote {}", path.display());
    }
    Ok(())
}

/// Load `manifest_path`, build every bundle, write them under `output_dir`
/// and save the version map to `versions_path`.
pub fn build(
    manifest_path: &Path,
    versions_path: &Path,
    output_dir: &Path,
    registry: &ProcessorRegistry,
    diagnostics: &mut dyn Write,
) -> Result<VersionMap> {
    let manifest = Manifest::load(manifest_path)?;
    let bundles = build_all(&manifest, registry, BuildMode::PRODUCTION, diagnostics)?;

    fs::create_dir_all(output_dir).map_err(|source| MendError::Write {
        path: output_dir.to_path_buf(),
        source,
    })?;
    write_bundles(&bundles, output_dir)?;

    let versions = version_map(&bundles);
    versions.save(versions_path)?;
    Ok(versions)
}
