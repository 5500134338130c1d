//! Build a single bundle from its manifest entry.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::BuildMode;
use crate::error::{MendError, Result};
use crate::manifest::Entry;
use crate::processor::ProcessorRegistry;

use super::concat::concat_files;
use super::version::versioned_name;

/// One built bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    /// Bundle name from the manifest.
    pub name: String,
    /// Content-addressed output name, e.g. `app-1a2b3c4d.js`.
    pub versioned: String,
    /// Processed bytes.
    pub bytes: Arc<[u8]>,
}

/// Resolve the concrete, ordered list of source files for an entry.
///
/// A non-empty pattern wins over `files`. Pattern matches come back in the
/// glob engine's lexicographic order; no matches is an empty list.
pub fn resolve_files(entry: &Entry, base_dir: &Path) -> Result<Vec<PathBuf>> {
    let Some(pattern) = entry.pattern() else {
        return Ok(entry.files.iter().map(|f| base_dir.join(f)).collect());
    };

    let base = base_dir
        .to_str()
        .ok_or_else(|| MendError::NonUtf8Pattern(entry.name.clone()))?;
    let full = if base.is_empty() {
        pattern.to_string()
    } else {
        format!("{}/{}", glob::Pattern::escape(base.trim_end_matches('/')), pattern)
    };

    let paths = glob::glob(&full).map_err(|source| MendError::Pattern {
        bundle: entry.name.clone(),
        pattern: pattern.to_string(),
        source,
    })?;

    paths
        .map(|path| {
            path.map_err(|source| MendError::Glob {
                bundle: entry.name.clone(),
                source,
            })
        })
        .filter(|path| path.as_ref().map_or(true, |p| !p.is_dir()))
        .collect()
}

/// Resolve, concatenate, hash and process one entry.
///
/// The versioned name is derived from the source bytes before processing, so
/// processor upgrades never rename a bundle on their own.
pub fn build_bundle(
    entry: &Entry,
    base_dir: &Path,
    registry: &ProcessorRegistry,
    mode: BuildMode,
    diagnostics: &mut dyn Write,
) -> Result<Bundle> {
    let files = resolve_files(entry, base_dir)?;
    crate::debug!("bundle"; "{}: {} file(s)", entry.name, files.len());

    let (raw, hash) = concat_files(&files)?;
    let versioned = versioned_name(&entry.name, hash);

    let chain = registry.chain(&entry.processors, mode);
    let bytes = chain.apply(&entry.name, raw, diagnostics)?;

    Ok(Bundle {
        name: entry.name.clone(),
        versioned,
        bytes: bytes.into(),
    })
}
