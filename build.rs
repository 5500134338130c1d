//! Build script minifying the embedded live reload client.

use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;
use std::fs;
use std::path::Path;

const RELOAD_JS: &str = "src/embed/serve/reload.js";
const WS_PORT_PLACEHOLDER: &str = "__MEND_WS_PORT__";

fn main() {
    let out_dir = std::env::var("OUT_DIR").unwrap();
    let out_path = Path::new(&out_dir);

    minify_reload_js(RELOAD_JS, &out_path.join("reload.min.js"));

    println!("cargo:rerun-if-changed={RELOAD_JS}");
}

fn minify_js(source: &str) -> String {
    let allocator = Allocator::default();
    let source_type = SourceType::mjs();

    let ret = Parser::new(&allocator, source, source_type).parse();
    assert!(ret.errors.is_empty(), "Parse errors: {:?}", ret.errors);

    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);

    Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code
}

/// The port placeholder must survive minification untouched.
fn minify_reload_js(input: &str, output: &Path) {
    let source = fs::read_to_string(input).expect("Failed to read reload.js");
    let code = minify_js(&source);
    assert_eq!(
        code.matches(WS_PORT_PLACEHOLDER).count(),
        1,
        "minified reload.js must keep exactly one {WS_PORT_PLACEHOLDER} placeholder"
    );
    fs::write(output, code).expect("Failed to write minified reload.js");
}
