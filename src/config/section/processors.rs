//! `[processors.<name>]` sections: external command stages.
//!
//! # Example
//!
//! ```toml
//! [processors.uglify]
//! command = ["npx", "uglifyjs", "--compress"]
//!
//! [processors.autoprefix]
//! command = ["postcss", "--use", "autoprefixer"]
//! live = false                # Skip in `mend serve`
//! ```
//!
//! Each command reads the bundle on stdin and writes the result to stdout.

use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;

/// Runners that fetch the actual tool on demand.
const PACKAGE_RUNNERS: &[&str] = &["npx", "bunx", "pnpx", "yarn", "dlx"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Program and arguments.
    pub command: Vec<String>,

    /// Also run in the live server.
    pub live: bool,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            command: Vec::new(),
            live: true,
        }
    }
}

impl ProcessorConfig {
    pub fn validate(&self, name: &str, diag: &mut ConfigDiagnostics) {
        let field = format!("processors.{name}.command");

        if name.is_empty() || name.contains(char::is_whitespace) {
            diag.error(
                format!("processors.{name}"),
                "processor names cannot be empty or contain whitespace",
            );
        }

        let Some(cmd) = self.command.first() else {
            diag.error(field, "command is empty");
            return;
        };

        if which::which(cmd).is_err() {
            if PACKAGE_RUNNERS.contains(&cmd.as_str()) {
                return;
            }
            diag.warn(field, format!("`{cmd}` not found in PATH"));
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{ConfigDiagnostics, test_parse_config};

    #[test]
    fn test_processor_config() {
        let config = test_parse_config(
            "[processors.uglify]\ncommand = [\"uglifyjs\", \"-c\"]\n\n[processors.prefix]\ncommand = [\"postcss\"]\nlive = false",
        );

        let uglify = &config.processors["uglify"];
        assert_eq!(uglify.command, ["uglifyjs", "-c"]);
        assert!(uglify.live);
        assert!(!config.processors["prefix"].live);
    }

    #[test]
    fn test_empty_command_is_error() {
        let config = test_parse_config("[processors.broken]\nlive = true");
        let mut diag = ConfigDiagnostics::new();
        config.processors["broken"].validate("broken", &mut diag);
        assert!(diag.has_errors());
        assert_eq!(diag.errors()[0].field, "processors.broken.command");
    }

    #[test]
    fn test_missing_program_is_warning() {
        let config =
            test_parse_config("[processors.x]\ncommand = [\"mend-test-no-such-program\"]");
        let mut diag = ConfigDiagnostics::new();
        config.processors["x"].validate("x", &mut diag);
        assert!(!diag.has_errors());
        assert_eq!(diag.warnings().len(), 1);
    }

    #[test]
    fn test_name_with_space_is_error() {
        let config = test_parse_config("[processors.\"a b\"]\ncommand = [\"cat\"]");
        let mut diag = ConfigDiagnostics::new();
        config.processors["a b"].validate("a b", &mut diag);
        assert!(diag.has_errors());
    }
}
