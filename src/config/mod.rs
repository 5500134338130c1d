//! Project configuration (`mend.toml`).
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Section definitions
//! │   ├── build      # [build]
//! │   ├── serve      # [serve]
//! │   └── processors # [processors.<name>]
//! ├── error          # ConfigError, ConfigDiagnostics
//! └── mod.rs         # MendConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section              | Purpose                                        |
//! |----------------------|------------------------------------------------|
//! | `[build]`            | Manifest, version map and output paths         |
//! | `[serve]`            | Development server (port, root, watch, reload) |
//! | `[processors.<name>]`| External command stages                        |
//!
//! The file is optional: a missing `mend.toml` yields the defaults, rooted at
//! the directory the file would have been in.

mod error;
pub mod section;

pub use error::{ConfigDiagnostic, ConfigDiagnostics, ConfigError};
pub use section::{BuildConfig, ProcessorConfig, ServeConfig};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::processor::{CommandProcessor, ProcessorRegistry};
use crate::utils::path::{normalize_path, resolve_against};

/// Root configuration structure representing `mend.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MendConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Directory relative paths resolve against: parent of the config file
    #[serde(skip)]
    pub root: PathBuf,

    pub build: BuildConfig,

    pub serve: ServeConfig,

    /// External command stages by name
    pub processors: BTreeMap<String, ProcessorConfig>,
}

impl MendConfig {
    /// Load the config at `path`, or the defaults when it does not exist.
    ///
    /// Unknown fields are reported as warnings; validation errors are
    /// collected and returned together.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let root = normalize_path(
            path.parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new(".")),
        );
        let config_path = root.join(path.file_name().unwrap_or_default());
        let mut config = if config_path.is_file() {
            Self::from_path(&config_path)?
        } else {
            crate::debug!("config"; "{} not found, using defaults", path.display());
            Self::default()
        };

        config.root = root;
        config.config_path = config_path;
        config.validate()?;
        Ok(config)
    }

    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    pub fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        crate::log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {field}");
        }
    }

    /// Check every section; warnings are printed, errors returned.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();

        for (name, processor) in &self.processors {
            processor.validate(name, &mut diag);
        }
        if self.serve.reload && self.serve.reload_port == self.serve.port && self.serve.port != 0 {
            diag.error_with_hint(
                "serve.reload_port",
                format!("reload_port {} is the same as port", self.serve.reload_port),
                "pick a different port for the live reload server",
            );
        }

        diag.print_warnings();
        diag.into_result()
    }

    /// Resolve a config-relative path.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        resolve_against(path, &self.root)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.resolve(&self.build.manifest)
    }

    pub fn versions_path(&self) -> PathBuf {
        self.resolve(&self.build.versions)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.resolve(&self.build.output)
    }

    /// Static fallback directory for `mend serve`, if configured.
    pub fn serve_root(&self) -> Option<PathBuf> {
        self.serve.root.as_deref().map(|root| self.resolve(root))
    }

    /// Built-in stages plus every configured command.
    ///
    /// Commands run with the config directory as their working directory, so
    /// `node_modules/.bin/...` style programs resolve.
    pub fn registry(&self) -> ProcessorRegistry {
        let mut registry = ProcessorRegistry::with_builtins();
        for (name, processor) in &self.processors {
            let Some(command) = CommandProcessor::from_slice(&processor.command) else {
                continue;
            };
            let command = command.cwd(&self.root);
            if processor.live {
                registry.register(name.clone(), command);
            } else {
                registry.register_production(name.clone(), command);
            }
        }
        registry
    }
}

/// Parse a config snippet, failing on unknown fields.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> MendConfig {
    let (parsed, ignored) = MendConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BuildMode;
    use tempfile::TempDir;

    #[test]
    fn test_invalid_toml() {
        let result = MendConfig::parse_with_ignored("[build\nmanifest = \"x\"");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_unknown_fields_collected() {
        let content = "[build]\nmanifest = \"a.json\"\nbogus = 1\n\n[unknown_section]\nx = 1";
        let (config, ignored) = MendConfig::parse_with_ignored(content).unwrap();
        assert_eq!(config.build.manifest, Path::new("a.json"));
        assert!(ignored.iter().any(|f| f.contains("bogus")));
        assert!(ignored.iter().any(|f| f.contains("unknown_section")));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = MendConfig::load(&dir.path().join("mend.toml")).unwrap();
        assert_eq!(config.build, BuildConfig::default());
        assert_eq!(config.serve, ServeConfig::default());
        assert_eq!(
            config.manifest_path(),
            dir.path().canonicalize().unwrap().join("mend.json")
        );
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mend.toml");
        fs::write(
            &path,
            "[build]\nmanifest = \"assets/mend.json\"\noutput = \"/tmp/mend-out\"\n\n[serve]\nroot = \"public\"",
        )
        .unwrap();

        let config = MendConfig::load(&path).unwrap();
        let root = dir.path().canonicalize().unwrap();
        assert_eq!(config.root, root);
        assert_eq!(config.manifest_path(), root.join("assets/mend.json"));
        assert_eq!(config.versions_path(), root.join("mend-versions.json"));
        assert_eq!(config.output_dir(), PathBuf::from("/tmp/mend-out"));
        assert_eq!(config.serve_root(), Some(root.join("public")));
    }

    #[test]
    fn test_load_reports_validation_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mend.toml");
        fs::write(
            &path,
            "[serve]\nport = 4000\nreload_port = 4000\n\n[processors.empty]\ncommand = []",
        )
        .unwrap();

        let Err(ConfigError::Diagnostics(diag)) = MendConfig::load(&path) else {
            panic!("expected diagnostics");
        };
        assert_eq!(diag.errors().len(), 2);
    }

    #[test]
    fn test_registry_from_config() {
        let config = test_parse_config(
            "[processors.cat]\ncommand = [\"cat\"]\n\n[processors.prod-only]\ncommand = [\"cat\"]\nlive = false",
        );
        let registry = config.registry();
        assert!(registry.contains("cat"));
        assert!(registry.contains("prod-only"));
        assert!(registry.contains("minify-js"));

        let live = registry.chain("cat prod-only minify-js", BuildMode::DEVELOPMENT);
        assert_eq!(live.names().collect::<Vec<_>>(), ["cat"]);
        let full = registry.chain("cat prod-only minify-js", BuildMode::PRODUCTION);
        assert_eq!(full.names().count(), 3);
    }
}
