//! Development server state: serve bundles from memory, rebuild on change.
//!
//! ```text
//!            ┌──────────── watch thread ────────────┐
//!  notify ──►│ settle ─► rebuild ─► store ─► notify │
//!            └──────────────────────┬───────────────┘
//!                                   ▼
//!                       ArcSwap<Snapshot> ◄── lookup / handle (HTTP workers)
//! ```
//!
//! Every rebuild runs in [`BuildMode::DEVELOPMENT`], so production-only stages
//! such as minifiers are skipped. A rebuild is all-or-nothing: until it
//! succeeds, requests keep seeing the previous snapshot. Nothing is written
//! to disk.

mod http;
mod snapshot;
mod watch;


pub use http::{Asset, Fallback, request_path};
pub use snapshot::Snapshot;
pub use watch::{WatchHandle, watch_paths};

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use crate::batch;
use crate::core::BuildMode;
use crate::error::{Result, chain};
use crate::manifest::Manifest;
use crate::processor::ProcessorRegistry;
use crate::versions::Versioner;

/// Quiet period after the last change before a rebuild starts.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

type ChangeHook = Box<dyn Fn(&Snapshot) + Send + Sync>;

/// Cheap to clone; clones share the same snapshot and watch state.
#[derive(Clone)]
pub struct LiveServer {
    shared: Arc<Shared>,
}

struct Shared {
    manifest_path: PathBuf,
    /// Overrides the manifest's own directory for relative file paths.
    base_dir: Option<PathBuf>,
    registry: Arc<ProcessorRegistry>,
    snapshot: ArcSwap<Snapshot>,
    fallback: Option<Box<dyn Fallback>>,
    on_change: Option<ChangeHook>,
    debounce: Duration,
    /// Held for the whole of a rebuild, which also serialises rebuilds.
    diagnostics: Mutex<Box<dyn Write + Send>>,
}

pub struct LiveServerBuilder {
    manifest_path: PathBuf,
    base_dir: Option<PathBuf>,
    registry: Option<Arc<ProcessorRegistry>>,
    fallback: Option<Box<dyn Fallback>>,
    on_change: Option<ChangeHook>,
    debounce: Duration,
    diagnostics: Option<Box<dyn Write + Send>>,
}

impl LiveServerBuilder {
    /// Resolve manifest paths against `dir` instead of the manifest's directory.
    pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Processor registry. Defaults to [`ProcessorRegistry::with_builtins`].
    pub fn registry(mut self, registry: impl Into<Arc<ProcessorRegistry>>) -> Self {
        self.registry = Some(registry.into());
        self
    }

    /// Handler for requests that match no bundle.
    pub fn fallback(mut self, fallback: impl Fallback + 'static) -> Self {
        self.fallback = Some(Box::new(fallback));
        self
    }

    /// Called with the new snapshot after every successful watch-triggered rebuild.
    pub fn on_change(mut self, hook: impl Fn(&Snapshot) + Send + Sync + 'static) -> Self {
        self.on_change = Some(Box::new(hook));
        self
    }

    pub fn debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Sink for processor stderr. Defaults to the process stderr.
    pub fn diagnostics(mut self, sink: impl Write + Send + 'static) -> Self {
        self.diagnostics = Some(Box::new(sink));
        self
    }

    /// Create the server and run the first build.
    ///
    /// A failing first build is reported and leaves the server with an empty
    /// snapshot; the watch loop can still recover once the inputs are fixed.
    pub fn build(self) -> LiveServer {
        let server = LiveServer {
            shared: Arc::new(Shared {
                manifest_path: self.manifest_path,
                base_dir: self.base_dir,
                registry: self
                    .registry
                    .unwrap_or_else(|| Arc::new(ProcessorRegistry::with_builtins())),
                snapshot: ArcSwap::from_pointee(Snapshot::empty()),
                fallback: self.fallback,
                on_change: self.on_change,
                debounce: self.debounce,
                diagnostics: Mutex::new(
                    self.diagnostics.unwrap_or_else(|| Box::new(io::stderr())),
                ),
            }),
        };

        match server.rebuild() {
            Ok(snapshot) => crate::logger::status_success(&format!(
                "built {} bundle(s)",
                snapshot.len()
            )),
            Err(e) => crate::logger::status_error("initial build failed", &chain(&e)),
        }
        server
    }
}

impl LiveServer {
    pub fn builder(manifest_path: impl Into<PathBuf>) -> LiveServerBuilder {
        LiveServerBuilder {
            manifest_path: manifest_path.into(),
            base_dir: None,
            registry: None,
            fallback: None,
            on_change: None,
            debounce: DEFAULT_DEBOUNCE,
            diagnostics: None,
        }
    }

    pub fn manifest_path(&self) -> &Path {
        &self.shared.manifest_path
    }

    /// Snapshot currently being served.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.shared.snapshot.load_full()
    }

    /// Re-read the manifest and rebuild every bundle.
    ///
    /// On success the new snapshot replaces the current one in a single
    /// atomic store. On failure the current snapshot stays in place.
    pub fn rebuild(&self) -> Result<Arc<Snapshot>> {
        let mut diagnostics = self.shared.diagnostics.lock();

        let manifest = self.load_manifest()?;
        let bundles = batch::build_all(
            &manifest,
            &self.shared.registry,
            BuildMode::DEVELOPMENT,
            &mut **diagnostics,
        )?;

        let generation = self.shared.snapshot.load().generation + 1;
        let snapshot = Arc::new(Snapshot::new(generation, bundles));
        self.shared.snapshot.store(Arc::clone(&snapshot));
        crate::debug!("watch"; "published generation {}", generation);
        Ok(snapshot)
    }

    fn load_manifest(&self) -> Result<Manifest> {
        let mut manifest = Manifest::load(&self.shared.manifest_path)?;
        if let Some(dir) = &self.shared.base_dir {
            manifest.base_dir.clone_from(dir);
        }
        Ok(manifest)
    }

    /// Rebuild triggered by the watch loop: report the outcome and run the
    /// change hook on success.
    fn refresh(&self) {
        match self.rebuild() {
            Ok(snapshot) => {
                crate::logger::status_success(&format!(
                    "rebuilt {} bundle(s)",
                    snapshot.len()
                ));
                if let Some(hook) = &self.shared.on_change {
                    hook(&snapshot);
                }
            }
            Err(e) => crate::logger::status_error("rebuild failed", &chain(&e)),
        }
    }
}

impl Versioner for LiveServer {
    fn version(&self, name: &str) -> String {
        self.snapshot().versions.version(name)
    }
}
