// src/pipeline/minify.rs

//! Minification of compiled output.
//!
//! Uses lightningcss for CSS and oxc for JavaScript.

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

use crate::pipeline::{FileSet, Stage, StageContext, StageError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinifyTarget {
    Css,
    Js,
}

/// `minify`: only inserted into style and script pipelines when
/// `production_ready` is set.
#[derive(Debug, Clone, Copy)]
pub struct Minify {
    target: MinifyTarget,
}

impl Minify {
    pub fn new(target: MinifyTarget) -> Self {
        Self { target }
    }
}

impl Stage for Minify {
    fn name(&self) -> &'static str {
        match self.target {
            MinifyTarget::Css => "minify(css)",
            MinifyTarget::Js => "minify(js)",
        }
    }

    fn apply(&self, mut files: FileSet, _ctx: &StageContext) -> Result<FileSet, StageError> {
        for file in &mut files {
            let minified = match self.target {
                MinifyTarget::Css => minify_css(file.text()?),
                MinifyTarget::Js => minify_js(file.text()?),
            };

            let minified = minified.map_err(|message| StageError::Minify {
                file: file.source.clone(),
                message,
            })?;
            file.set_text(minified);
        }
        Ok(files)
    }
}

/// Minify CSS source code.
pub fn minify_css(source: &str) -> Result<String, String> {
    let stylesheet =
        StyleSheet::parse(source, ParserOptions::default()).map_err(|e| e.to_string())?;
    let result = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .map_err(|e| e.to_string())?;
    Ok(result.code)
}

/// Minify JavaScript source code.
pub fn minify_js(source: &str) -> Result<String, String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::cjs()).parse();
    if let Some(err) = ret.errors.first() {
        return Err(err.to_string());
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::SourceFile;

    #[test]
    fn css_is_compacted() {
        let out = minify_css("body {\n  margin: 0px;\n}\n").unwrap();
        assert_eq!(out, "body{margin:0}");
    }

    #[test]
    fn js_keeps_behavior_and_shrinks() {
        let source = "function greet(name) {\n  var message = 'hi ' + name;\n  console.log(message);\n}\ngreet('x');\n";
        let out = minify_js(source).unwrap();
        assert!(out.len() < source.len());
        assert!(out.contains("console.log"));
    }

    #[test]
    fn parse_failure_is_a_minify_error() {
        let files = vec![SourceFile::new("/src/app.js", "app.js", b"function (".to_vec())];
        let ctx = StageContext::new("/src", "js");

        let err = Minify::new(MinifyTarget::Js).apply(files, &ctx).unwrap_err();
        assert!(matches!(err, StageError::Minify { .. }), "{err}");
    }
}
