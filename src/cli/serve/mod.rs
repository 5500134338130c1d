//! `mend serve`: bundles from memory, live rebuild and browser reload.
//!
//! ```text
//! request ─► /__mend/reload.js ─► reload client
//!        └─► LiveServer::handle ─► bundle
//!                               └─► StaticDir (serve.root) ─► file | 404
//! ```

mod lifecycle;
mod path;
mod response;

use anyhow::{Context, Result};
use mender::config::MendConfig;
use mender::core::{is_shutdown, register_server, register_watcher};
use mender::embed::serve::{RELOAD_JS_PATH, script_tag};
use mender::live::{LiveServer, WatchHandle};
use mender::reload::ReloadHub;
use mender::{debug, log};
use std::sync::Arc;
use tiny_http::{Request, Server};

use path::StaticDir;

/// Worker threads answering HTTP requests.
const REQUEST_THREADS: usize = 4;

pub fn serve(config: &MendConfig) -> Result<()> {
    let (server, addr) = lifecycle::bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);
    register_server(Arc::clone(&server));

    let hub = if config.serve.reload {
        let hub = ReloadHub::start(config.serve.interface, config.serve.reload_port)
            .context("failed to start live reload server")?;
        debug!("reload"; "ws://{}:{}", config.serve.interface, hub.port());
        Some(hub)
    } else {
        None
    };

    let live = build_live_server(config, hub.clone());
    let watcher = if config.serve.watch {
        let handle = live.watch().context("failed to start watch loop")?;
        register_watcher(handle.clone());
        Some(handle)
    } else {
        None
    };

    log!("serve"; "http://{}", addr);
    if hub.is_some() {
        log!("serve"; "live reload: {}", script_tag());
    }

    run_request_loop(&server, &live, hub.as_ref().map(ReloadHub::port))?;
    shutdown(watcher);
    Ok(())
}

fn build_live_server(config: &MendConfig, hub: Option<ReloadHub>) -> LiveServer {
    let mut builder = LiveServer::builder(config.manifest_path())
        .registry(config.registry())
        .debounce(config.serve.debounce());

    if let Some(root) = config.serve_root() {
        debug!("serve"; "static root: {}", root.display());
        builder = builder.fallback(StaticDir::new(root, hub.is_some()));
    }
    if let Some(hub) = hub {
        builder = builder.on_change(move |snapshot| hub.reload(snapshot.generation));
    }
    builder.build()
}

fn run_request_loop(server: &Server, live: &LiveServer, ws_port: Option<u16>) -> Result<()> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(REQUEST_THREADS)
        .build()
        .context("failed to create request thread pool")?;

    for request in server.incoming_requests() {
        let live = live.clone();
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &live, ws_port) {
                log!("serve"; "request error: {e:#}");
            }
        });
    }
    Ok(())
}

fn handle_request(request: Request, live: &LiveServer, ws_port: Option<u16>) -> Result<()> {
    if is_shutdown() {
        return response::respond_unavailable(request);
    }

    if let Some(port) = ws_port
        && request.url().split('?').next() == Some(RELOAD_JS_PATH)
    {
        return response::respond_reload_js(request, port);
    }

    match live.handle(request)? {
        Some(request) => response::respond_not_found(request),
        None => Ok(()),
    }
}

fn shutdown(watcher: Option<WatchHandle>) {
    if let Some(watcher) = watcher {
        watcher.stop();
        watcher.join();
    }
    log!("serve"; "stopped");
}
