//! HTTP response handlers.

use anyhow::{Context, Result};
use mender::embed::serve::{RELOAD_JS, ReloadVars, script_tag};
use mender::utils::mime::{self, types};
use std::{fs, path::Path};
use tiny_http::{Header, Method, Request, Response, StatusCode};

/// Respond with a static file, optionally injecting the reload client into HTML.
pub fn respond_file(request: Request, path: &Path, inject_reload: bool) -> Result<()> {
    let content_type = mime::from_path(path);

    if is_head_request(&request) {
        return send_head(request, 200, content_type);
    }

    let body = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let body = if inject_reload && content_type == types::HTML {
        inject_reload_script(body)
    } else {
        body
    };
    send_body(request, 200, content_type, body)
}

/// Add the reload client tag before `</body>`, or at the end without one.
fn inject_reload_script(body: Vec<u8>) -> Vec<u8> {
    let html = match String::from_utf8(body) {
        Ok(html) => html,
        Err(e) => return e.into_bytes(),
    };
    let tag = script_tag();
    let html = match html.rfind("</body>") {
        Some(pos) => format!("{}{}{}", &html[..pos], tag, &html[pos..]),
        None => html + &tag,
    };
    html.into_bytes()
}

pub fn respond_not_found(request: Request) -> Result<()> {
    if is_head_request(&request) {
        return send_head(request, 404, types::PLAIN);
    }
    send_body(request, 404, types::PLAIN, b"404 Not Found".to_vec())
}

/// Respond with 503 Service Unavailable (server shutting down).
pub fn respond_unavailable(request: Request) -> Result<()> {
    send_body(request, 503, types::PLAIN, b"503 Service Unavailable".to_vec())
}

/// Respond with reload.js rendered for the bound WebSocket port.
pub fn respond_reload_js(request: Request, ws_port: u16) -> Result<()> {
    if is_head_request(&request) {
        return send_head(request, 200, types::JAVASCRIPT);
    }
    let body = RELOAD_JS.render(&ReloadVars { ws_port });
    send_body(request, 200, types::JAVASCRIPT, body.into_bytes())
}

fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

fn send_head(request: Request, status: u16, content_type: &'static str) -> Result<()> {
    let response = Response::empty(StatusCode(status))
        .with_header(make_header("Content-Type", content_type));
    request.respond(response)?;
    Ok(())
}

fn send_body(
    request: Request,
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
) -> Result<()> {
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(make_header("Content-Type", content_type))
        .with_header(make_header("Cache-Control", "no-cache"));
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
    fn test_inject_reload_script() {
        let out = inject_reload_script(b"<html><body><p>hi</p></body></html>".to_vec());
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("<html><body><p>hi</p>{}</body></html>", script_tag())
        );

        let out = inject_reload_script(b"<p>fragment</p>".to_vec());
        assert!(String::from_utf8(out).unwrap().ends_with(&script_tag()));

        let binary = vec![0xff, 0xfe, 0x00];
        assert_eq!(inject_reload_script(binary.clone()), binary);
    }
}
