//! `[build]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [build]
//! manifest = "assets/mend.json"     # Bundle manifest
//! versions = "mend-versions.json"   # Version map written by `mend build`
//! output = "public/assets"          # Directory receiving versioned bundles
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Batch build paths. Relative paths resolve against the config file's directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub manifest: PathBuf,
    pub versions: PathBuf,
    pub output: PathBuf,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            manifest: "mend.json".into(),
            versions: "mend-versions.json".into(),
            output: "_build".into(),
        }
    }
}
