//! Watch loop: one-shot file watch, settle, rebuild, re-arm.
//!
//! Each cycle watches exactly the manifest and the files it currently
//! resolves to (non-recursive), so files added to a bundle or matched by a
//! new glob are picked up on the next cycle. The previous watcher stays
//! armed through the rebuild and is replaced only once the next one is
//! armed; a change seen while rebuilding starts the next cycle right away.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use rustc_hash::FxHashSet;

use super::LiveServer;
use crate::asset::resolve_files;
use crate::manifest::Manifest;

/// Wait before retrying when no watcher can be created.
const RETRY_DELAY: Duration = Duration::from_secs(1);

enum Signal {
    Fs(notify::Result<Event>),
    Stop,
}

/// Stops a running watch loop. Clones control the same loop.
#[derive(Clone)]
pub struct WatchHandle {
    tx: Sender<Signal>,
    thread: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl WatchHandle {
    /// Ask the loop to exit. Returns immediately; an in-flight rebuild
    /// finishes first.
    pub fn stop(&self) {
        let _ = self.tx.send(Signal::Stop);
    }

    /// Wait for the loop thread to exit.
    pub fn join(&self) {
        if let Some(thread) = self.thread.lock().take() {
            let _ = thread.join();
        }
    }
}

impl LiveServer {
    /// Start the watch loop on its own thread.
    pub fn watch(&self) -> std::io::Result<WatchHandle> {
        let (tx, rx) = channel::unbounded();
        let server = self.clone();
        let events = tx.clone();
        let thread = thread::Builder::new()
            .name("mend-watch".into())
            .spawn(move || watch_loop(&server, &events, &rx))?;

        Ok(WatchHandle {
            tx,
            thread: Arc::new(Mutex::new(Some(thread))),
        })
    }

    fn current_watch_paths(&self) -> Vec<PathBuf> {
        watch_paths(&self.shared.manifest_path, self.shared.base_dir.as_deref())
    }
}

/// Manifest path plus every input file the manifest currently resolves to.
///
/// Entries that fail to resolve contribute nothing; the manifest itself is
/// always included so fixing it triggers a rebuild.
pub fn watch_paths(manifest_path: &Path, base_dir: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = vec![manifest_path.to_path_buf()];

    let manifest = match Manifest::load(manifest_path) {
        Ok(manifest) => manifest,
        Err(e) => {
            crate::debug!("watch"; "{}", e);
            return paths;
        }
    };
    let base_dir = base_dir.unwrap_or(&manifest.base_dir);

    let mut seen = FxHashSet::default();
    seen.insert(manifest_path.to_path_buf());
    for entry in manifest.iter() {
        match resolve_files(entry, base_dir) {
            Ok(files) => paths.extend(files.into_iter().filter(|f| seen.insert(f.clone()))),
            Err(e) => crate::debug!("watch"; "{}", e),
        }
    }
    paths
}

fn watch_loop(server: &LiveServer, events: &Sender<Signal>, rx: &Receiver<Signal>) {
    let mut watcher: Option<RecommendedWatcher> = None;
    loop {
        let paths = server.current_watch_paths();
        match arm(&paths, events) {
            Ok(next) => watcher = Some(next),
            Err(e) => {
                crate::log!("watch"; "cannot create watcher: {}", e);
                if watcher.is_none() {
                    if !sleep_unless_stopped(rx, RETRY_DELAY) {
                        return;
                    }
                    continue;
                }
            }
        }

        let changed = match take_pending(rx) {
            Pending::Stop => return,
            Pending::Changed => true,
            Pending::Quiet => false,
        };
        if changed {
            crate::debug!("watch"; "changed during rebuild");
        } else {
            match wait_for_change(rx) {
                Wait::Stop => return,
                Wait::Failed(e) => {
                    crate::log!("watch"; "watch error: {}", e);
                    watcher = None;
                    if !sleep_unless_stopped(rx, server.shared.debounce) {
                        return;
                    }
                    continue;
                }
                Wait::Changed(paths) => {
                    crate::debug!("watch"; "changed: {:?}", paths);
                }
            }
        }

        if !settle(rx, server.shared.debounce) {
            return;
        }
        server.refresh();
    }
}

fn arm(paths: &[PathBuf], events: &Sender<Signal>) -> notify::Result<RecommendedWatcher> {
    let tx = events.clone();
    let mut watcher = notify::recommended_watcher(move |res| {
        let _ = tx.send(Signal::Fs(res));
    })?;

    let mut watched = 0usize;
    for path in paths {
        match watcher.watch(path, RecursiveMode::NonRecursive) {
            Ok(()) => watched += 1,
            Err(e) => crate::debug!("watch"; "cannot watch {}: {}", path.display(), e),
        }
    }
    crate::debug!("watch"; "watching {} of {} path(s)", watched, paths.len());
    Ok(watcher)
}

enum Wait {
    Changed(Vec<PathBuf>),
    Failed(notify::Error),
    Stop,
}

enum Pending {
    Changed,
    Quiet,
    Stop,
}

/// Drain events queued since the last rebuild started.
///
/// A relevant one means an input may have changed after it was read.
fn take_pending(rx: &Receiver<Signal>) -> Pending {
    let mut pending = Pending::Quiet;
    while let Ok(signal) = rx.try_recv() {
        match signal {
            Signal::Stop => return Pending::Stop,
            Signal::Fs(Ok(event)) if is_relevant(&event) => pending = Pending::Changed,
            Signal::Fs(Ok(_)) => {}
            Signal::Fs(Err(e)) => crate::debug!("watch"; "{}", e),
        }
    }
    pending
}

/// Block until a relevant filesystem event, a watcher error, or a stop request.
fn wait_for_change(rx: &Receiver<Signal>) -> Wait {
    loop {
        match rx.recv() {
            Ok(Signal::Fs(Ok(event))) if is_relevant(&event) => return Wait::Changed(event.paths),
            Ok(Signal::Fs(Ok(_))) => {}
            Ok(Signal::Fs(Err(e))) => return Wait::Failed(e),
            Ok(Signal::Stop) | Err(_) => return Wait::Stop,
        }
    }
}

/// Absorb further events until none has arrived for `quiet`.
///
/// Returns `false` when stop was requested meanwhile.
fn settle(rx: &Receiver<Signal>, quiet: Duration) -> bool {
    let mut deadline = Instant::now() + quiet;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok(Signal::Fs(Ok(event))) if is_relevant(&event) => {
                deadline = Instant::now() + quiet;
            }
            Ok(Signal::Fs(_)) => {}
            Ok(Signal::Stop) | Err(RecvTimeoutError::Disconnected) => return false,
            Err(RecvTimeoutError::Timeout) => return true,
        }
    }
}

/// Sleep for `delay`, waking early on stop. Returns `false` when stopped.
fn sleep_unless_stopped(rx: &Receiver<Signal>, delay: Duration) -> bool {
    let deadline = Instant::now() + delay;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok(Signal::Fs(_)) => {}
            Ok(Signal::Stop) | Err(RecvTimeoutError::Disconnected) => return false,
            Err(RecvTimeoutError::Timeout) => return true,
        }
    }
}

/// Reads and metadata-only changes (permissions, timestamps) never alter
/// bundle content.
fn is_relevant(event: &Event) -> bool {
    !matches!(
        event.kind,
        EventKind::Access(_) | EventKind::Modify(ModifyKind::Metadata(_))
    )
}
