// src/pipeline/include.rs

//! Inline include / bundling of script files.
//!
//! Recognised directives, each on a line of its own:
//!
//! ```text
//! //= include vendor/jquery.js
//! //= require lib/**/*.js
//! /*= include "polyfills.js" */
//! #= require util.js
//! ```
//!
//! Paths are relative to the file containing the directive. A glob expands
//! to all matching files in sorted order. `include` always inlines;
//! `require` inlines a given file at most once per output file.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::pipeline::source::expand_glob;
use crate::pipeline::{FileSet, Stage, StageContext, StageError};
use crate::watch::path_utils::slash_path;

static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(//|/\*|#)=\s*(include|require)\s+(.+?)\s*$").expect("valid directive regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Directive {
    Include,
    Require,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Include;

impl Stage for Include {
    fn name(&self) -> &'static str {
        "include"
    }

    fn apply(&self, mut files: FileSet, ctx: &StageContext) -> Result<FileSet, StageError> {
        for file in &mut files {
            let mut expander = Expander::default();
            let text = file.text()?.to_owned();
            let expanded = expander.expand(&file.source, &text)?;

            if let Some(map) = file.source_map.as_mut() {
                for (path, content) in expander.inlined {
                    let source = path
                        .strip_prefix(&ctx.root)
                        .map(slash_path)
                        .unwrap_or_else(|_| slash_path(&path));
                    map.add_source(source, content);
                }
            }

            file.set_text(expanded);
        }
        Ok(files)
    }
}

#[derive(Default)]
struct Expander {
    required: HashSet<PathBuf>,
    stack: Vec<PathBuf>,
    inlined: Vec<(PathBuf, String)>,
}

impl Expander {
    fn expand(&mut self, path: &Path, text: &str) -> Result<String, StageError> {
        let identity = canonical(path);
        if self.stack.contains(&identity) {
            return Err(include_error(path, "include cycle detected"));
        }
        self.stack.push(identity.clone());
        self.required.insert(identity);

        let dir = path.parent().unwrap_or(Path::new("."));
        let mut out = String::with_capacity(text.len());

        for line in text.split_inclusive('\n') {
            let Some((directive, target)) = parse_directive(line) else {
                out.push_str(line);
                continue;
            };

            let is_glob = target.contains(['*', '?', '[', '{']);
            for target in resolve_targets(dir, path, &target)? {
                let identity = canonical(&target);
                // A glob may match the including file itself.
                if is_glob && self.stack.contains(&identity) {
                    continue;
                }
                if directive == Directive::Require && self.required.contains(&identity) {
                    continue;
                }

                let content = fs::read_to_string(&target)
                    .map_err(|e| StageError::io(&target, e))?;
                let inlined = self.expand(&target, &content)?;
                self.inlined.push((target, content));

                out.push_str(&inlined);
                if !inlined.ends_with('\n') {
                    out.push('\n');
                }
            }
        }

        self.stack.pop();
        Ok(out)
    }
}

fn parse_directive(line: &str) -> Option<(Directive, String)> {
    let caps = DIRECTIVE.captures(line.trim_end_matches(['\r', '\n']))?;

    let mut target = caps[3].trim();
    if &caps[1] == "/*" {
        target = target.strip_suffix("*/").unwrap_or(target).trim();
    }
    let target = target.trim_matches(|c| c == '"' || c == '\'');

    let directive = match &caps[2] {
        "require" => Directive::Require,
        _ => Directive::Include,
    };
    Some((directive, target.to_string()))
}

fn resolve_targets(dir: &Path, from: &Path, target: &str) -> Result<Vec<PathBuf>, StageError> {
    let matches = expand_glob(dir, target)?;

    if matches.is_empty() && !target.contains(['*', '?', '[', '{']) {
        return Err(include_error(
            from,
            &format!("included file not found: {target}"),
        ));
    }

    Ok(matches.into_iter().map(|(path, _)| path).collect())
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

fn include_error(file: &Path, message: &str) -> StageError {
    StageError::Include {
        file: file.to_path_buf(),
        message: message.to_string(),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::SourceFile;
    use tempfile::TempDir;

    fn write(dir: &TempDir, rel: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    fn bundle(dir: &TempDir, entry: &Path) -> Result<String, StageError> {
        let contents = fs::read(entry).unwrap();
        let files = vec![SourceFile::new(entry, "app.js", contents)];
        let ctx = StageContext::new(dir.path(), "js");
        let files = Include.apply(files, &ctx)?;
        Ok(String::from_utf8(files[0].contents.clone()).unwrap())
    }

    #[test]
    fn parses_all_directive_forms() {
        assert_eq!(
            parse_directive("//= include vendor/a.js\n"),
            Some((Directive::Include, "vendor/a.js".to_string()))
        );
        assert_eq!(
            parse_directive("/*= require \"b.js\" */"),
            Some((Directive::Require, "b.js".to_string()))
        );
        assert_eq!(
            parse_directive("  #= require util.js"),
            Some((Directive::Require, "util.js".to_string()))
        );
        assert_eq!(parse_directive("// include nothing"), None);
    }

    #[test]
    fn inlines_relative_to_including_file() {
        let dir = TempDir::new().unwrap();
        write(&dir, "js/lib/b.js", "b();");
        write(&dir, "js/lib/a.js", "//= include b.js\na();\n");
        let entry = write(&dir, "js/app.js", "//= include lib/a.js\nmain();\n");

        assert_eq!(bundle(&dir, &entry).unwrap(), "b();\na();\nmain();\n");
    }

    #[test]
    fn glob_expands_sorted_and_require_dedupes() {
        let dir = TempDir::new().unwrap();
        write(&dir, "js/lib/2.js", "two();\n");
        write(&dir, "js/lib/1.js", "one();\n");
        let entry = write(
            &dir,
            "js/app.js",
            "//= require lib/*.js\n//= require lib/1.js\n//= include lib/1.js\n",
        );

        assert_eq!(
            bundle(&dir, &entry).unwrap(),
            "one();\ntwo();\none();\n"
        );
    }

    #[test]
    fn missing_file_is_an_include_error() {
        let dir = TempDir::new().unwrap();
        let entry = write(&dir, "js/app.js", "//= include nope.js\n");

        let err = bundle(&dir, &entry).unwrap_err();
        assert!(matches!(err, StageError::Include { .. }), "{err}");
        assert!(err.to_string().contains("nope.js"));
    }

    #[test]
    fn cycles_are_rejected() {
        let dir = TempDir::new().unwrap();
        write(&dir, "js/a.js", "//= include b.js\n");
        write(&dir, "js/b.js", "//= include a.js\n");
        let entry = dir.path().join("js/a.js");

        let err = bundle(&dir, &entry).unwrap_err();
        assert!(err.to_string().contains("cycle"), "{err}");
    }
}
