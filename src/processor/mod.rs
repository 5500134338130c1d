//! Named byte-stream processors and their composition.
//!
//! A [`ProcessorRegistry`] maps names to stages. A bundle's processor string
//! (`"minify-js uglifyjs"`) is resolved against it into a [`Chain`]:
//!
//! ```text
//! concatenated source ─► stage 1 ─► buffer ─► stage 2 ─► ... ─► bundle bytes
//! ```
//!
//! Stages run one after another, each on the fully materialised output of the
//! previous one. Unknown names are skipped; an empty chain passes the input
//! through unchanged.

mod command;
mod minify;

pub use command::CommandProcessor;
pub use minify::{MinifyCss, MinifyJs};

use rustc_hash::FxHashMap;
use std::fmt;
use std::io::Write;
use std::process::ExitStatus;
use std::sync::Arc;
use thiserror::Error;

use crate::core::BuildMode;
use crate::error::{MendError, Result};

/// Failure of a single stage. Any partial output is discarded by the chain.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to run `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` exited with {status}{}", fmt_stderr(.stderr))]
    Exit {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn fmt_stderr(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!("\n{stderr}")
    }
}

/// A single transformation stage.
///
/// Receives the complete input, appends its result to `output` and may write
/// human-readable diagnostics to `diagnostics`.
pub trait Processor: Send + Sync {
    fn run(
        &self,
        input: &[u8],
        output: &mut Vec<u8>,
        diagnostics: &mut dyn Write,
    ) -> Result<(), ProcessError>;
}

/// Processor backed by a closure, see [`from_fn`].
pub struct FnProcessor<F>(F);

/// Wrap a closure as a [`Processor`].
///
/// ```ignore
/// registry.register("banner", processor::from_fn(|input, out, _| {
///     out.extend_from_slice(b"/* built by mend */\n");
///     out.extend_from_slice(input);
///     Ok(())
/// }));
/// ```
pub fn from_fn<F>(f: F) -> FnProcessor<F>
where
    F: Fn(&[u8], &mut Vec<u8>, &mut dyn Write) -> Result<(), ProcessError> + Send + Sync,
{
    FnProcessor(f)
}

impl<F> Processor for FnProcessor<F>
where
    F: Fn(&[u8], &mut Vec<u8>, &mut dyn Write) -> Result<(), ProcessError> + Send + Sync,
{
    fn run(
        &self,
        input: &[u8],
        output: &mut Vec<u8>,
        diagnostics: &mut dyn Write,
    ) -> Result<(), ProcessError> {
        (self.0)(input, output, diagnostics)
    }
}

// ============================================================================
// Registry
// ============================================================================

struct Registration {
    stage: Arc<dyn Processor>,
    /// Also runs when building for the live server.
    live: bool,
}

/// Name → processor table, built once and shared by every build.
#[derive(Default)]
pub struct ProcessorRegistry {
    stages: FxHashMap<String, Registration>,
}

impl ProcessorRegistry {
    /// Empty registry: every chain is the identity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in minifiers (`minify-js`, `minify-css`).
    ///
    /// Minifiers are production-only; the live server serves unminified
    /// bundles.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_production("minify-js", MinifyJs);
        registry.register_production("minify-css", MinifyCss);
        registry
    }

    /// Register a stage that runs in every build mode.
    pub fn register(&mut self, name: impl Into<String>, stage: impl Processor + 'static) -> &mut Self {
        self.insert(name.into(), Arc::new(stage), true)
    }

    /// Register a stage that is skipped by live (development) builds.
    pub fn register_production(
        &mut self,
        name: impl Into<String>,
        stage: impl Processor + 'static,
    ) -> &mut Self {
        self.insert(name.into(), Arc::new(stage), false)
    }

    fn insert(&mut self, name: String, stage: Arc<dyn Processor>, live: bool) -> &mut Self {
        if self.stages.insert(name.clone(), Registration { stage, live }).is_some() {
            crate::debug!("processor"; "`{}` re-registered", name);
        }
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.stages.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.stages.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Resolve a whitespace-separated processor string into a chain.
    ///
    /// Unknown names, and production-only stages in a live build, are skipped.
    pub fn chain(&self, names: &str, mode: BuildMode) -> Chain {
        let stages = names
            .split_whitespace()
            .filter_map(|name| match self.stages.get(name) {
                Some(reg) if reg.live || !mode.is_dev() => {
                    Some((name.to_string(), Arc::clone(&reg.stage)))
                }
                Some(_) => {
                    crate::debug!("processor"; "skipping production-only `{}`", name);
                    None
                }
                None => {
                    crate::debug!("processor"; "unknown processor `{}` ignored", name);
                    None
                }
            })
            .collect();
        Chain { stages }
    }
}

impl fmt::Debug for ProcessorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessorRegistry")
            .field("stages", &self.names())
            .finish()
    }
}

// ============================================================================
// Chain
// ============================================================================

/// Resolved stages of one bundle, in declaration order.
#[derive(Clone, Default)]
pub struct Chain {
    stages: Vec<(String, Arc<dyn Processor>)>,
}

impl Chain {
    /// No stages: `apply` returns its input untouched.
    pub fn is_identity(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(|(name, _)| name.as_str())
    }

    /// Run every stage left to right, each on the previous stage's full output.
    ///
    /// The first failing stage aborts the chain; its partial output is dropped.
    pub fn apply(&self, bundle: &str, input: Vec<u8>, diagnostics: &mut dyn Write) -> Result<Vec<u8>> {
        let mut buffer = input;
        for (name, stage) in &self.stages {
            let mut output = Vec::with_capacity(buffer.len());
            stage
                .run(&buffer, &mut output, diagnostics)
                .map_err(|source| MendError::Processor {
                    bundle: bundle.to_string(),
                    processor: name.clone(),
                    source,
                })?;
            buffer = output;
        }
        Ok(buffer)
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
