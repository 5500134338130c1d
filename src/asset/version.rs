//! Content-addressed output names for cache busting.
//!
//! `js/app.js` with checksum `0x1a2b3c` becomes `js/app-1a2b3c.js`. When the
//! concatenated source changes, the name changes and browsers re-fetch.

/// Split a bundle name at the last `.` of its final path component.
///
/// Returns `(base, extension)` where the extension keeps its dot.
pub fn split_ext(name: &str) -> (&str, &str) {
    let file_start = name.rfind('/').map_or(0, |i| i + 1);
    match name[file_start..].rfind('.') {
        Some(dot) => name.split_at(file_start + dot),
        None => (name, ""),
    }
}

/// `base-<hex hash><ext>`, hash in lowercase hex without padding.
pub fn versioned_name(name: &str, hash: u32) -> String {
    let (base, ext) = split_ext(name);
    format!("{base}-{hash:x}{ext}")
}
