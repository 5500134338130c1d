//! Built-in minifiers for JS and CSS bundles.
//!
//! Uses oxc for JavaScript and lightningcss for CSS.

use std::io::Write;

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

use super::{ProcessError, Processor};

/// `minify-js`: parse, compress and mangle JavaScript.
pub struct MinifyJs;

/// `minify-css`: reprint a stylesheet in minified form.
pub struct MinifyCss;

impl Processor for MinifyJs {
    fn run(
        &self,
        input: &[u8],
        output: &mut Vec<u8>,
        diagnostics: &mut dyn Write,
    ) -> Result<(), ProcessError> {
        let source = as_utf8(input, "minify-js")?;
        let code = minify_js(source).inspect_err(|msg| {
            let _ = writeln!(diagnostics, "minify-js: {msg}");
        })?;
        output.extend_from_slice(code.as_bytes());
        Ok(())
    }
}

impl Processor for MinifyCss {
    fn run(
        &self,
        input: &[u8],
        output: &mut Vec<u8>,
        diagnostics: &mut dyn Write,
    ) -> Result<(), ProcessError> {
        let source = as_utf8(input, "minify-css")?;
        let code = minify_css(source).inspect_err(|msg| {
            let _ = writeln!(diagnostics, "minify-css: {msg}");
        })?;
        output.extend_from_slice(code.as_bytes());
        Ok(())
    }
}

fn as_utf8<'a>(input: &'a [u8], stage: &str) -> Result<&'a str, ProcessError> {
    std::str::from_utf8(input)
        .map_err(|e| ProcessError::Failed(format!("{stage}: input is not UTF-8: {e}")))
}

/// Minify JavaScript source code.
fn minify_js(source: &str) -> Result<String, ProcessError> {
    let allocator = Allocator::default();
    let source_type = SourceType::mjs();
    let ret = Parser::new(&allocator, source, source_type).parse();
    if let Some(first) = ret.errors.first() {
        return Err(ProcessError::Failed(format!(
            "parse error: {first} ({} total)",
            ret.errors.len()
        )));
    }
    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code;
    Ok(code)
}

/// Minify CSS source code.
fn minify_css(source: &str) -> Result<String, ProcessError> {
    let stylesheet = StyleSheet::parse(source, ParserOptions::default())
        .map_err(|e| ProcessError::Failed(format!("parse error: {e}")))?;
    let result = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .map_err(|e| ProcessError::Failed(format!("print error: {e}")))?;
    Ok(result.code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_minify_css() {
        let mut out = Vec::new();
        MinifyCss
            .run(b"body {\n  color: red;\n}\n", &mut out, &mut io::sink())
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "body{color:red}");
    }

    #[test]
    fn test_minify_js_shrinks() {
        let source = b"function greet(name) {\n  // say hello\n  return 'hello ' + name;\n}\nconsole.log(greet('world'));\n";
        let mut out = Vec::new();
        MinifyJs.run(source, &mut out, &mut io::sink()).unwrap();
        let code = String::from_utf8(out).unwrap();
        assert!(code.len() < source.len());
        assert!(!code.contains("say hello"));
    }

    #[test]
    fn test_minify_js_parse_error() {
        let mut out = Vec::new();
        let mut diag = Vec::new();
        let err = MinifyJs.run(b"function (", &mut out, &mut diag).unwrap_err();
        assert!(matches!(err, ProcessError::Failed(_)));
        assert!(String::from_utf8(diag).unwrap().starts_with("minify-js: "));
    }

    #[test]
    fn test_non_utf8_rejected() {
        let mut out = Vec::new();
        let err = MinifyCss.run(&[0xff, 0xfe], &mut out, &mut io::sink()).unwrap_err();
        assert!(err.to_string().contains("not UTF-8"));
    }
}
