//! Bundle manifest (`mend.json`).
//!
//! # Example
//!
//! ```json
//! {
//!     "app.js":   { "files": ["js/a.js", "js/b.js"], "processors": "minify-js" },
//!     "site.css": { "pattern": "css/*.css" }
//! }
//! ```
//!
//! Keys are bundle names; each key is copied into its entry's `name` on load
//! so an [`Entry`] is self-describing afterwards.

use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{MendError, Result};

/// How to build one bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Entry {
    /// Bundle identity, injected from the manifest key.
    #[serde(skip)]
    pub name: String,

    /// Source files relative to the manifest directory, in concatenation order.
    #[serde(alias = "Files", deserialize_with = "null_as_default")]
    pub files: Vec<String>,

    /// Glob relative to the manifest directory. Overrides `files` when non-empty.
    #[serde(alias = "Pattern")]
    pub pattern: Option<String>,

    /// Whitespace-separated processor names, applied left to right.
    #[serde(alias = "Processors", deserialize_with = "null_as_default")]
    pub processors: String,
}

impl Entry {
    /// The glob pattern, if one is set and non-empty.
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref().filter(|p| !p.is_empty())
    }
}

/// `null` reads as an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Bundle name → entry, plus the directory entries are resolved against.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    pub entries: BTreeMap<String, Entry>,
    pub base_dir: PathBuf,
}

impl Manifest {
    /// Read and parse a manifest file. `base_dir` becomes the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|e| MendError::ManifestRead(path.to_path_buf(), e))?;
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self::parse(&content, base_dir)
            .map_err(|e| MendError::ManifestParse(path.to_path_buf(), e))
    }

    /// Parse manifest JSON, injecting each key into its entry's name.
    pub fn parse(content: &str, base_dir: PathBuf) -> serde_json::Result<Self> {
        let mut entries: BTreeMap<String, Entry> = serde_json::from_str(content)?;
        for (name, entry) in &mut entries {
            entry.name.clone_from(name);
        }
        Ok(Self { entries, base_dir })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }
}
