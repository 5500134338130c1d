//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use mender::config::MendConfig;
use mender::utils::path::normalize_path;
use std::net::IpAddr;
use std::path::PathBuf;

/// Content-addressed asset bundler
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path
    #[arg(short = 'C', long, default_value = "mend.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Build every bundle to disk and write the version map
    #[command(visible_alias = "b")]
    Build {
        #[command(flatten)]
        args: BuildArgs,
    },

    /// Serve bundles from memory, rebuilding on change
    #[command(visible_alias = "s")]
    Serve {
        #[command(flatten)]
        args: ServeArgs,
    },
}

/// `mend build` arguments
#[derive(clap::Args, Debug, Clone)]
pub struct BuildArgs {
    /// Manifest file
    #[arg(short = 'f', long, value_hint = clap::ValueHint::FilePath)]
    pub manifest: Option<PathBuf>,

    /// Where to write the version map
    #[arg(short = 'o', long, value_hint = clap::ValueHint::FilePath)]
    pub versions: Option<PathBuf>,

    /// Directory receiving the versioned bundles
    #[arg(value_name = "OUTPUT_DIR", value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long)]
    pub verbose: bool,
}

/// `mend serve` arguments
#[derive(clap::Args, Debug, Clone)]
pub struct ServeArgs {
    /// Manifest file
    #[arg(short = 'f', long, value_hint = clap::ValueHint::FilePath)]
    pub manifest: Option<PathBuf>,

    /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
    #[arg(short, long)]
    pub interface: Option<IpAddr>,

    /// Port number to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Static directory served when no bundle matches
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub root: Option<PathBuf>,

    /// Rebuild bundles when their inputs change
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub watch: Option<bool>,

    /// Reload connected browsers after a rebuild
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub reload: Option<bool>,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long)]
    pub verbose: bool,
}

impl Cli {
    pub fn verbose(&self) -> bool {
        match &self.command {
            Commands::Build { args } => args.verbose,
            Commands::Serve { args } => args.verbose,
        }
    }

    /// Override config values with the flags given on the command line.
    ///
    /// Paths on the command line are relative to the working directory, not
    /// to the config file, so they are made absolute here.
    pub fn apply(&self, config: &mut MendConfig) {
        match &self.command {
            Commands::Build { args } => {
                override_path(&mut config.build.manifest, &args.manifest);
                override_path(&mut config.build.versions, &args.versions);
                override_path(&mut config.build.output, &args.output);
            }
            Commands::Serve { args } => {
                override_path(&mut config.build.manifest, &args.manifest);
                if let Some(interface) = args.interface {
                    config.serve.interface = interface;
                }
                if let Some(port) = args.port {
                    config.serve.port = port;
                }
                if let Some(root) = &args.root {
                    config.serve.root = Some(normalize_path(root));
                }
                if let Some(watch) = args.watch {
                    config.serve.watch = watch;
                }
                if let Some(reload) = args.reload {
                    config.serve.reload = reload;
                }
            }
        }
    }
}

fn override_path(target: &mut PathBuf, value: &Option<PathBuf>) {
    if let Some(path) = value {
        *target = normalize_path(path);
    }
}
