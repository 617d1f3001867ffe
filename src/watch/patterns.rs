// src/watch/patterns.rs

use std::fmt;

use anyhow::{Context, Result};
use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};

/// Compile a single glob the way every pattern in a config is interpreted:
/// relative to the project root, `*` does not cross `/`, `**` does, and a
/// leading `./` is ignored.
pub fn compile_glob(pattern: &str) -> std::result::Result<Glob, globset::Error> {
    GlobBuilder::new(normalize_pattern(pattern))
        .literal_separator(true)
        .build()
}

/// Strip a leading `./` (repeatedly) from a pattern.
pub fn normalize_pattern(pattern: &str) -> &str {
    let mut p = pattern.trim();
    while let Some(rest) = p.strip_prefix("./") {
        p = rest;
    }
    p
}

/// Split a pattern list into includes and (`!`-prefixed) excludes.
pub fn split_patterns(patterns: &[String]) -> (Vec<&str>, Vec<&str>) {
    let mut include = Vec::new();
    let mut exclude = Vec::new();
    for pattern in patterns {
        match pattern.strip_prefix('!') {
            Some(negated) => exclude.push(negated),
            None => include.push(pattern.as_str()),
        }
    }
    (include, exclude)
}

/// Compiled include/exclude globs for one pattern list.
///
/// Paths passed to [`PatternSet::matches`] are relative to the project root
/// and use forward slashes, e.g. `"less/site/header.less"`.
#[derive(Clone)]
pub struct PatternSet {
    raw: Vec<String>,
    include: GlobSet,
    exclude: Option<GlobSet>,
}

impl fmt::Debug for PatternSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternSet")
            .field("patterns", &self.raw)
            .finish_non_exhaustive()
    }
}

impl PatternSet {
    pub fn new(patterns: &[String]) -> Result<Self> {
        let (include, exclude) = split_patterns(patterns);

        let include = build_globset(&include).context("building include globset")?;
        let exclude = if exclude.is_empty() {
            None
        } else {
            Some(build_globset(&exclude).context("building exclude globset")?)
        };

        Ok(Self {
            raw: patterns.to_vec(),
            include,
            exclude,
        })
    }

    pub fn patterns(&self) -> &[String] {
        &self.raw
    }

    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.include.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }
}

/// Build a GlobSet from simple string patterns.
pub fn build_globset(patterns: &[&str]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = compile_glob(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
