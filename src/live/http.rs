//! Serving snapshot bundles over HTTP.

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use percent_encoding::percent_decode_str;
use tiny_http::{Header, Method, Request, Response, StatusCode};

use super::LiveServer;

/// Handler for requests that match no bundle.
///
/// Receives the request untouched, including its original URL.
pub trait Fallback: Send + Sync {
    fn serve(&self, request: Request) -> Result<()>;
}

impl<F> Fallback for F
where
    F: Fn(Request) -> Result<()> + Send + Sync,
{
    fn serve(&self, request: Request) -> Result<()> {
        self(request)
    }
}

/// A bundle resolved from a request path.
#[derive(Debug, Clone)]
pub struct Asset {
    pub name: String,
    pub versioned: String,
    pub bytes: Arc<[u8]>,
    pub content_type: &'static str,
}

/// Versioned name addressed by a request URL: query and fragment dropped,
/// percent-decoded, leading `/` removed.
pub fn request_path(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let decoded = percent_decode_str(path).decode_utf8_lossy();
    decoded.strip_prefix('/').unwrap_or(&decoded).to_string()
}

impl LiveServer {
    /// Resolve a request URL against the current snapshot.
    pub fn lookup(&self, url: &str) -> Option<Asset> {
        let path = request_path(url);
        let snapshot = self.snapshot();
        let (name, bytes) = snapshot.lookup(&path)?;
        Some(Asset {
            name: name.to_string(),
            content_type: crate::utils::mime::from_path(Path::new(&path)),
            versioned: path,
            bytes: Arc::clone(bytes),
        })
    }

    /// Serve a bundle, or pass the request to the fallback.
    ///
    /// Returns the request back when nothing handled it (no matching bundle
    /// and no fallback), leaving the not-found response to the caller.
    pub fn handle(&self, request: Request) -> Result<Option<Request>> {
        match self.lookup(request.url()) {
            Some(asset) => {
                respond_asset(request, asset)?;
                Ok(None)
            }
            None => match &self.shared.fallback {
                Some(fallback) => fallback.serve(request).map(|()| None),
                None => Ok(Some(request)),
            },
        }
    }
}

fn respond_asset(request: Request, asset: Asset) -> Result<()> {
    crate::debug!("serve"; "{} -> {}", asset.versioned, asset.name);

    if request.method() == &Method::Head {
        let response = Response::empty(StatusCode(200))
            .with_header(make_header("Content-Type", asset.content_type))
            .with_header(make_header("Cache-Control", "no-cache"));
        request.respond(response)?;
        return Ok(());
    }

    let length = asset.bytes.len();
    let response = Response::new(
        StatusCode(200),
        vec![
            make_header("Content-Type", asset.content_type),
            make_header("Cache-Control", "no-cache"),
        ],
        Cursor::new(asset.bytes),
        Some(length),
        None,
    );
    request.respond(response)?;
    Ok(())
}

fn make_header(key: &'static str, value: &'static str) -> Header {
    Header::from_bytes(key, value).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_path() {
        assert_eq!(request_path("/app-1a.js"), "app-1a.js");
        assert_eq!(request_path("/js/app-1a.js?v=2"), "js/app-1a.js");
        assert_eq!(request_path("/site-2b.css#top"), "site-2b.css");
        assert_eq!(request_path("/a%20b-1.css"), "a b-1.css");
        assert_eq!(request_path("//double-1.js"), "/double-1.js");
        assert_eq!(request_path("/"), "");
    }
}
