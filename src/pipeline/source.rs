// src/pipeline/source.rs

//! Source file discovery for pipelines.
//!
//! Each include pattern has a *glob base*: the leading path components that
//! contain no glob syntax. Matched files keep their path relative to that
//! base, so `less/**/*.less` matching `less/site/header.less` is written as
//! `site/header.css` under the output directory. A literal pattern such as
//! `less/main.less` has `less` as its base.

use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use globset::{GlobSet, GlobSetBuilder};

use crate::pipeline::{FileSet, SourceFile, StageError};
use crate::watch::path_utils::slash_path;
use crate::watch::patterns::{compile_glob, normalize_pattern, split_patterns};

const GLOB_META: [char; 4] = ['*', '?', '[', '{'];

fn is_glob(component: &str) -> bool {
    component.contains(GLOB_META)
}

/// Leading literal directory of a pattern.
pub fn glob_base(pattern: &str) -> PathBuf {
    let pattern = normalize_pattern(pattern);
    let components: Vec<&str> = pattern.split('/').collect();

    let literal = components.iter().take_while(|c| !is_glob(c)).count();
    let take = if literal == components.len() {
        // Fully literal: the base is the containing directory.
        literal.saturating_sub(1)
    } else {
        literal
    };

    components[..take].iter().collect()
}

/// Files under `dir` matching `pattern` (relative to `dir`), sorted.
///
/// Returns `(absolute path, path relative to the pattern's glob base)`.
pub fn expand_glob(dir: &Path, pattern: &str) -> Result<Vec<(PathBuf, PathBuf)>, StageError> {
    let pattern = normalize_pattern(pattern);
    let base = dir.join(glob_base(pattern));

    if !is_glob(pattern) {
        let path = dir.join(pattern);
        if !path.is_file() {
            return Ok(Vec::new());
        }
        let rel = path.strip_prefix(&base).unwrap_or(&path).to_path_buf();
        return Ok(vec![(path, rel)]);
    }

    let matcher = compile_glob(pattern)
        .map_err(|source| StageError::Glob {
            pattern: pattern.to_string(),
            source,
        })?
        .compile_matcher();

    let mut matched = Vec::new();
    for path in walk_files(&base)? {
        let Ok(rel_to_dir) = path.strip_prefix(dir) else {
            continue;
        };
        if matcher.is_match(slash_path(rel_to_dir)) {
            let rel = path.strip_prefix(&base).unwrap_or(&path).to_path_buf();
            matched.push((path, rel));
        }
    }

    matched.sort();
    Ok(matched)
}

/// Read every file matched by `patterns` (relative to `root`).
///
/// A file matched by more than one include pattern is read once, with the
/// relative path of the first pattern that matched it. A missing base
/// directory yields no files rather than an error.
pub fn collect_sources(root: &Path, patterns: &[String]) -> Result<FileSet, StageError> {
    let (include, exclude) = split_patterns(patterns);
    let exclude = build_exclude_set(&exclude)?;

    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for pattern in include {
        for (path, relative) in expand_glob(root, pattern)? {
            let rel_to_root = path.strip_prefix(root).map(slash_path).unwrap_or_default();
            if exclude.is_match(&rel_to_root) || !seen.insert(path.clone()) {
                continue;
            }

            let contents = fs::read(&path).map_err(|e| StageError::io(&path, e))?;
            files.push(SourceFile::new(path, relative, contents));
        }
    }

    Ok(files)
}

fn build_exclude_set(patterns: &[&str]) -> Result<GlobSet, StageError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = compile_glob(pattern).map_err(|source| StageError::Glob {
            pattern: pattern.to_string(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| StageError::Glob {
        pattern: patterns.join(", "),
        source,
    })
}

/// All regular files below `start` (recursively). Missing `start` is empty.
///
/// Symlinked directories are followed, but each physical directory is
/// visited once, so links pointing back up the tree cannot loop.
fn walk_files(start: &Path) -> Result<Vec<PathBuf>, StageError> {
    let mut files = Vec::new();
    let mut visited = HashSet::new();
    let mut stack = vec![start.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let identity = dir.canonicalize().unwrap_or_else(|_| dir.clone());
        if !visited.insert(identity) {
            continue;
        }

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => return Err(StageError::io(&dir, e)),
        };

        for entry in entries {
            let path = entry.map_err(|e| StageError::io(&dir, e))?.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.is_file() {
                files.push(path);
            }
        }
    }

    Ok(files)
}
