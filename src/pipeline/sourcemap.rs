// src/pipeline/sourcemap.rs

use std::path::{Component, Path, PathBuf};

use serde::Serialize;

use crate::watch::path_utils::slash_path;
use crate::pipeline::{FileSet, SourceFile, Stage, StageContext, StageError};

/// Version 3 source map document.
///
/// Compilers are opaque to the pipeline, so no segment mappings are
/// produced; the map records which sources contributed to an output file and
/// embeds their original contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    pub version: u8,
    pub file: String,
    pub sources: Vec<String>,
    pub sources_content: Vec<String>,
    pub names: Vec<String>,
    pub mappings: String,
}

impl SourceMap {
    pub fn new(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            version: 3,
            file: String::new(),
            sources: vec![source.into()],
            sources_content: vec![content.into()],
            names: Vec::new(),
            mappings: String::new(),
        }
    }

    /// Record an additional contributing source (e.g. an inlined include).
    pub fn add_source(&mut self, source: impl Into<String>, content: impl Into<String>) {
        let source = source.into();
        if !self.sources.contains(&source) {
            self.sources.push(source);
            self.sources_content.push(content.into());
        }
    }
}

/// `sourcemap-init`: start tracking each file's original source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceMapInit;

impl Stage for SourceMapInit {
    fn name(&self) -> &'static str {
        "sourcemap-init"
    }

    fn apply(&self, mut files: FileSet, ctx: &StageContext) -> Result<FileSet, StageError> {
        for file in &mut files {
            let source = file
                .source
                .strip_prefix(&ctx.root)
                .map(slash_path)
                .unwrap_or_else(|_| slash_path(&file.source));
            let content = String::from_utf8_lossy(&file.contents).into_owned();
            file.source_map = Some(SourceMap::new(source, content));
        }
        Ok(files)
    }
}

/// `sourcemap-emit`: write each tracked map as `<dir>/<relative>.map` next
/// to the outputs and reference it from the output file.
#[derive(Debug, Clone)]
pub struct SourceMapEmit {
    dir: PathBuf,
}

impl SourceMapEmit {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: normalize_dir(dir.as_ref()),
        }
    }
}

impl Stage for SourceMapEmit {
    fn name(&self) -> &'static str {
        "sourcemap-emit"
    }

    fn apply(&self, files: FileSet, _ctx: &StageContext) -> Result<FileSet, StageError> {
        let mut out = Vec::with_capacity(files.len() * 2);

        for mut file in files {
            let Some(mut map) = file.source_map.take() else {
                out.push(file);
                continue;
            };

            let map_rel = self
                .dir
                .join(format!("{}.map", slash_path(&file.relative)));
            map.file = file
                .relative
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            let url = map_url(&file.relative, &map_rel);
            let comment = match file.extension() {
                Some("css") => format!("\n/*# sourceMappingURL={url} */\n"),
                _ => format!("\n//# sourceMappingURL={url}\n"),
            };
            file.contents.extend_from_slice(comment.as_bytes());

            let json = serde_json::to_vec(&map).map_err(|e| StageError::Compile {
                file: file.source.clone(),
                message: format!("serializing source map: {e}"),
            })?;
            let map_file = SourceFile::new(file.source.clone(), map_rel, json);

            out.push(file);
            out.push(map_file);
        }

        Ok(out)
    }
}

/// Drop `.` and root components so the map directory stays inside the
/// output directory (`./maps` -> `maps`, `./` -> ``).
fn normalize_dir(dir: &Path) -> PathBuf {
    dir.components()
        .filter(|c| matches!(c, Component::Normal(_) | Component::ParentDir))
        .collect()
}

/// URL of `map_rel` as seen from the directory containing `file_rel`.
fn map_url(file_rel: &Path, map_rel: &Path) -> String {
    let depth = file_rel
        .parent()
        .map(|p| p.components().count())
        .unwrap_or(0);
    format!("{}{}", "../".repeat(depth), slash_path(map_rel))
}
