// src/pipeline/mod.rs

//! Transform pipelines.
//!
//! A [`Pipeline`] reads the files matched by its source patterns into an
//! in-memory [`FileSet`] and folds it through an ordered list of [`Stage`]s.
//! The fold short-circuits on the first [`StageError`], which is returned to
//! the caller tagged with the failing stage's name. Containment and
//! reporting of that error is the job of [`crate::report::Interceptor`].
//!
//! Canonical stage lists per resource category are assembled in [`builder`].

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::types::Category;

pub mod builder;
pub mod compile;
pub mod header;
pub mod image;
pub mod include;
pub mod minify;
pub mod source;
pub mod sourcemap;
pub mod write;

pub use builder::PipelineBuilder;
pub use sourcemap::SourceMap;

/// One file flowing through a pipeline.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Absolute path the file was read from.
    pub source: PathBuf,
    /// Path relative to the pipeline's output directory.
    pub relative: PathBuf,
    pub contents: Vec<u8>,
    /// Present between `sourcemap-init` and `sourcemap-emit`.
    pub source_map: Option<SourceMap>,
}

impl SourceFile {
    pub fn new(source: impl Into<PathBuf>, relative: impl Into<PathBuf>, contents: Vec<u8>) -> Self {
        Self {
            source: source.into(),
            relative: relative.into(),
            contents,
            source_map: None,
        }
    }

    /// Contents as UTF-8 text.
    pub fn text(&self) -> Result<&str, StageError> {
        std::str::from_utf8(&self.contents).map_err(|_| StageError::Encoding {
            file: self.source.clone(),
        })
    }

    pub fn set_text(&mut self, text: String) {
        self.contents = text.into_bytes();
    }

    pub fn set_extension(&mut self, ext: &str) {
        self.relative.set_extension(ext);
    }

    pub fn extension(&self) -> Option<&str> {
        self.relative.extension().and_then(|e| e.to_str())
    }
}

pub type FileSet = Vec<SourceFile>;

/// Per-invocation context handed to every stage.
#[derive(Debug, Clone)]
pub struct StageContext {
    /// Project root; source patterns and output directories are relative to it.
    pub root: PathBuf,
    /// Name of the task running the pipeline.
    pub task: String,
}

impl StageContext {
    pub fn new(root: impl Into<PathBuf>, task: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            task: task.into(),
        }
    }
}

/// A build error raised by a stage.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("{}: {message}", file.display())]
    Compile { file: PathBuf, message: String },

    #[error("{}: {message}", file.display())]
    Include { file: PathBuf, message: String },

    #[error("{}: {message}", file.display())]
    Minify { file: PathBuf, message: String },

    #[error("{}: {source}", file.display())]
    Image {
        file: PathBuf,
        #[source]
        source: ::image::ImageError,
    },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid glob pattern '{pattern}': {source}")]
    Glob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("{}: contents are not valid UTF-8", file.display())]
    Encoding { file: PathBuf },

    #[error("failed to run '{command}': {source}")]
    Command {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

impl StageError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        StageError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A [`StageError`] together with the name of the stage that raised it.
#[derive(Debug, Error)]
#[error("stage '{stage}' failed: {error}")]
pub struct StageFailure {
    pub stage: &'static str,
    #[source]
    pub error: StageError,
}

/// One step of a pipeline.
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, files: FileSet, ctx: &StageContext) -> Result<FileSet, StageError>;
}

/// Positional marker for where error containment starts in a canonical stage
/// list. Passes files through untouched; the containment itself wraps the
/// whole pipeline (see [`crate::report::Interceptor::guard`]).
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorGuard;

impl Stage for ErrorGuard {
    fn name(&self) -> &'static str {
        "error-guard"
    }

    fn apply(&self, files: FileSet, _ctx: &StageContext) -> Result<FileSet, StageError> {
        Ok(files)
    }
}

/// Summary of a pipeline run that reached its final stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOutput {
    pub files: usize,
}

/// An ordered list of stages applied to the files matched by `sources`.
pub struct Pipeline {
    name: String,
    category: Category,
    sources: Vec<String>,
    stages: Vec<Box<dyn Stage>>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("sources", &self.sources)
            .field("stages", &self.stage_names())
            .finish()
    }
}

impl Pipeline {
    pub fn new(name: impl Into<String>, category: Category, sources: Vec<String>) -> Self {
        Self {
            name: name.into(),
            category,
            sources,
            stages: Vec::new(),
        }
    }

    /// Append a stage.
    pub fn stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Read the source files and fold them through every stage in order.
    pub fn run(&self, ctx: &StageContext) -> Result<PipelineOutput, StageFailure> {
        let files = source::collect_sources(&ctx.root, &self.sources).map_err(|error| {
            StageFailure {
                stage: "source",
                error,
            }
        })?;

        debug!(
            pipeline = %self.name,
            category = %self.category,
            files = files.len(),
            "pipeline sources collected"
        );

        let files = self.stages.iter().try_fold(files, |files, stage| {
            debug!(pipeline = %self.name, stage = stage.name(), files = files.len(), "applying stage");
            stage.apply(files, ctx).map_err(|error| StageFailure {
                stage: stage.name(),
                error,
            })
        })?;

        info!(pipeline = %self.name, files = files.len(), "pipeline finished");

        Ok(PipelineOutput { files: files.len() })
    }
}
