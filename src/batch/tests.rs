use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use super::*;
use crate::processor::{ProcessError, from_fn};

/// Project layout:
///
/// ```text
/// assets/
/// ├── mend.json
/// ├── js/{a,b}.js
/// └── css/{base,theme}.css
/// ```
fn make_project() -> (TempDir, PathBuf) {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("assets");
    fs::create_dir_all(root.join("js")).unwrap();
    fs::create_dir_all(root.join("css")).unwrap();

    fs::write(root.join("js/a.js"), "var a = 1;\n").unwrap();
    fs::write(root.join("js/b.js"), "var b = 2;\n").unwrap();
    fs::write(root.join("css/theme.css"), "a { color: red; }\n").unwrap();
    fs::write(root.join("css/base.css"), "body { margin: 0; }\n").unwrap();

    fs::write(
        root.join("mend.json"),
        r#"{
            "js/app.js": { "files": ["js/b.js", "js/a.js"], "processors": "banner" },
            "site.css": { "pattern": "css/*.css" }
        }"#,
    )
    .unwrap();

    (temp, root)
}

fn registry() -> ProcessorRegistry {
    let mut registry = ProcessorRegistry::new();
    registry.register(
        "banner",
        from_fn(|input, out, _| {
            out.extend_from_slice(b"/* app */\n");
            out.extend_from_slice(input);
            Ok(())
        }),
    );
    registry
}

fn hex(bytes: &[u8]) -> String {
    format!("{:x}", crc32fast::hash(bytes))
}

fn list_files(dir: &Path) -> Vec<String> {
    let mut files = Vec::new();
    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        for entry in fs::read_dir(&current).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                stack.push(path);
            } else {
                let rel = path.strip_prefix(dir).unwrap();
                files.push(rel.to_string_lossy().replace('\\', "/"));
            }
        }
    }
    files.sort();
    files
}

#[test]
fn test_build_end_to_end() {
    let (temp, root) = make_project();
    let out = temp.path().join("_build");
    let versions_path = temp.path().join("mend-versions.json");

    let versions = build(
        &root.join("mend.json"),
        &versions_path,
        &out,
        &registry(),
        &mut io::sink(),
    )
    .unwrap();

    let app_src = b"var b = 2;\nvar a = 1;\n";
    let css_src = b"body { margin: 0; }\na { color: red; }\n";
    let app_name = format!("js/app-{}.js", hex(app_src));
    let css_name = format!("site-{}.css", hex(css_src));

    assert_eq!(versions.get("js/app.js"), Some(app_name.as_str()));
    assert_eq!(versions.get("site.css"), Some(css_name.as_str()));

    let mut expected_files = vec![app_name.clone(), css_name.clone()];
    expected_files.sort();
    assert_eq!(list_files(&out), expected_files);

    let app = fs::read(out.join(&app_name)).unwrap();
    assert_eq!(app, b"/* app */\nvar b = 2;\nvar a = 1;\n");
    let css = fs::read(out.join(&css_name)).unwrap();
    assert_eq!(css, css_src);

    assert_eq!(VersionMap::load(&versions_path).unwrap(), versions);
}

#[test]
fn test_build_twice_is_stable() {
    let (temp, root) = make_project();
    let manifest = root.join("mend.json");
    let first = build(
        &manifest,
        &temp.path().join("v1.json"),
        &temp.path().join("out1"),
        &registry(),
        &mut io::sink(),
    )
    .unwrap();
    let second = build(
        &manifest,
        &temp.path().join("v2.json"),
        &temp.path().join("out2"),
        &registry(),
        &mut io::sink(),
    )
    .unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_failure_writes_nothing() {
    let (temp, root) = make_project();
    fs::write(
        root.join("mend.json"),
        r#"{
            "a.js": { "files": ["js/a.js"] },
            "z.js": { "files": ["js/a.js"], "processors": "broken" }
        }"#,
    )
    .unwrap();

    let mut registry = registry();
    registry.register(
        "broken",
        from_fn(|_, _, _| Err(ProcessError::Failed("exit status 2".into()))),
    );

    let out = temp.path().join("_build");
    let versions_path = temp.path().join("mend-versions.json");
    let err = build(
        &root.join("mend.json"),
        &versions_path,
        &out,
        &registry,
        &mut io::sink(),
    )
    .unwrap_err();

    assert!(matches!(err, MendError::Processor { .. }));
    assert!(!out.exists());
    assert!(!versions_path.exists());
}

#[test]
fn test_missing_manifest() {
    let temp = TempDir::new().unwrap();
    let err = build(
        &temp.path().join("mend.json"),
        &temp.path().join("v.json"),
        &temp.path().join("out"),
        &ProcessorRegistry::new(),
        &mut io::sink(),
    )
    .unwrap_err();
    assert!(matches!(err, MendError::ManifestRead(..)));
}

#[test]
fn test_version_map_from_bundles() {
    let bundles = vec![Bundle {
        name: "app.js".into(),
        versioned: "app-1.js".into(),
        bytes: Vec::<u8>::new().into(),
    }];
    let map = version_map(&bundles);
    assert_eq!(map.get("app.js"), Some("app-1.js"));
}
