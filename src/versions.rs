//! Bundle name → versioned file name (`mend-versions.json`).
//!
//! Written wholesale after every batch build, so bundles removed from the
//! manifest disappear from the map. Templates read it back to turn
//! `app.js` into `app-1a2b3c4d.js`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::{MendError, Result};

/// Maps a bundle name to the name of its current output file.
pub trait Versioner {
    /// Versioned file name for `name`, or `name` itself when unknown.
    fn version(&self, name: &str) -> String;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionMap(BTreeMap<String, String>);

impl VersionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, versioned: impl Into<String>) {
        self.0.insert(name.into(), versioned.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Bundle whose versioned name is exactly `versioned`.
    pub fn find_versioned(&self, versioned: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(_, v)| v.as_str() == versioned)
            .map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Pretty-printed JSON, tab indented, keys sorted.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
        let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut ser).map_err(MendError::EncodeVersions)?;
        Ok(out)
    }

    /// Replace the file at `path` with this map.
    pub fn save(&self, path: &Path) -> Result<()> {
        let data = self.to_json()?;
        let write_err = |source| MendError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(path, data).map_err(write_err)
    }

    /// Load a map written by [`VersionMap::save`].
    ///
    /// A missing file is an empty map. Malformed content is an error: the file
    /// is only ever written by this tool.
    pub fn load(path: &Path) -> Result<Self> {
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::new()),
            Err(source) => {
                return Err(MendError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        serde_json::from_slice(&data).map_err(|e| MendError::VersionMapParse(path.to_path_buf(), e))
    }
}

impl Versioner for VersionMap {
    fn version(&self, name: &str) -> String {
        self.get(name).unwrap_or(name).to_string()
    }
}

impl FromIterator<(String, String)> for VersionMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> VersionMap {
        let mut map = VersionMap::new();
        map.insert("site.css", "site-1f.css");
        map.insert("app.js", "app-cbf43926.js");
        map
    }

    #[test]
    fn test_json_layout() {
        let json = String::from_utf8(sample().to_json().unwrap()).unwrap();
        assert_eq!(
            json,
            "{\n\t\"app.js\": \"app-cbf43926.js\",\n\t\"site.css\": \"site-1f.css\"\n}"
        );
    }

    #[test]
    fn test_save_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out/mend-versions.json");
        sample().save(&path).unwrap();
        assert_eq!(VersionMap::load(&path).unwrap(), sample());
    }

    #[test]
    fn test_save_replaces_stale_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mend-versions.json");
        sample().save(&path).unwrap();

        let mut smaller = VersionMap::new();
        smaller.insert("app.js", "app-2.js");
        smaller.save(&path).unwrap();

        let loaded = VersionMap::load(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.get("site.css"), None);
    }

    #[test]
    fn test_load_missing_is_empty() {
        let dir = TempDir::new().unwrap();
        let map = VersionMap::load(&dir.path().join("nope.json")).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn test_load_malformed_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mend-versions.json");
        fs::write(&path, "[1, 2").unwrap();
        assert!(matches!(
            VersionMap::load(&path),
            Err(MendError::VersionMapParse(..))
        ));
    }

    #[test]
    fn test_versioner() {
        let map = sample();
        assert_eq!(map.version("app.js"), "app-cbf43926.js");
        assert_eq!(map.version("other.js"), "other.js");
        assert_eq!(map.find_versioned("site-1f.css"), Some("site.css"));
        assert_eq!(map.find_versioned("site.css"), None);
    }
}
