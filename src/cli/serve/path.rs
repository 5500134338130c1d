//! Static fallback directory.

use anyhow::Result;
use mender::live::Fallback;
use mender::utils::path::resolve_in_root;
use std::path::PathBuf;
use tiny_http::Request;

use super::response;

/// Serves files under `root` for requests no bundle matched.
pub struct StaticDir {
    root: PathBuf,
    /// Inject the reload client into HTML pages.
    inject_reload: bool,
}

impl StaticDir {
    pub fn new(root: PathBuf, inject_reload: bool) -> Self {
        Self {
            root,
            inject_reload,
        }
    }
}

impl Fallback for StaticDir {
    fn serve(&self, request: Request) -> Result<()> {
        match resolve_in_root(request.url(), &self.root) {
            Some(path) => response::respond_file(request, &path, self.inject_reload),
            None => response::respond_not_found(request),
        }
    }
}
