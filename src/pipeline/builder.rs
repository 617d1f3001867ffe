// src/pipeline/builder.rs

//! Canonical pipelines per resource category.
//!
//! Stage order matters: source-map capture wraps compilation, the header is
//! injected after compilation/minification, and the map reference is
//! appended last before writing.

use crate::config::ConfigFile;
use crate::errors::Result;
use crate::paths::PathResolver;
use crate::pipeline::compile::{LessCompile, ScssCompile};
use crate::pipeline::header::HeaderInject;
use crate::pipeline::image::{ImageOptions, OptimizeImages};
use crate::pipeline::include::Include;
use crate::pipeline::minify::{Minify, MinifyTarget};
use crate::pipeline::sourcemap::{SourceMapEmit, SourceMapInit};
use crate::pipeline::write::WriteOutput;
use crate::pipeline::{ErrorGuard, Pipeline};
use crate::types::{Category, Preprocessor, SourceKind};

/// Fixed map directory of the script pipeline, relative to its output.
pub const SCRIPT_MAP_DIR: &str = "./maps";

#[derive(Debug)]
pub struct PipelineBuilder<'a> {
    cfg: &'a ConfigFile,
    paths: PathResolver,
}

impl<'a> PipelineBuilder<'a> {
    pub fn new(cfg: &'a ConfigFile) -> Self {
        Self {
            cfg,
            paths: PathResolver::new(cfg),
        }
    }

    /// error-guard → sourcemap-init → compile → [minify] → header-inject →
    /// sourcemap-emit(configured path) → write(styles dir)
    pub fn styles(&self, preprocessor: Preprocessor) -> Result<Pipeline> {
        let out_dir = self.paths.resolve_output_directory(Category::Styles)?;
        let name = self.cfg.task_names.for_preprocessor(preprocessor);
        let sources = self
            .cfg
            .input_patterns(preprocessor.source_kind())
            .to_vec();

        let pipeline = Pipeline::new(name, Category::Styles, sources)
            .stage(ErrorGuard)
            .stage(SourceMapInit);

        let pipeline = match preprocessor {
            Preprocessor::Less => pipeline.stage(LessCompile::new(&self.cfg.compilers.less_command)),
            Preprocessor::Scss => pipeline.stage(ScssCompile),
        };

        let pipeline = if self.cfg.production_ready {
            pipeline.stage(Minify::new(MinifyTarget::Css))
        } else {
            pipeline
        };

        Ok(pipeline
            .stage(HeaderInject::from_config(&self.cfg.header_comment))
            .stage(SourceMapEmit::new(&self.cfg.source_maps.path))
            .stage(WriteOutput::new(out_dir)))
    }

    /// sourcemap-init → error-guard → include → [minify] → header-inject →
    /// sourcemap-emit("./maps") → write(scripts dir)
    pub fn scripts(&self) -> Result<Pipeline> {
        let out_dir = self.paths.resolve_output_directory(Category::Scripts)?;
        let sources = self.cfg.input_patterns(SourceKind::Scripts).to_vec();

        let pipeline = Pipeline::new(&self.cfg.task_names.js, Category::Scripts, sources)
            .stage(SourceMapInit)
            .stage(ErrorGuard)
            .stage(Include);

        let pipeline = if self.cfg.production_ready {
            pipeline.stage(Minify::new(MinifyTarget::Js))
        } else {
            pipeline
        };

        Ok(pipeline
            .stage(HeaderInject::from_config(&self.cfg.header_comment))
            .stage(SourceMapEmit::new(SCRIPT_MAP_DIR))
            .stage(WriteOutput::new(out_dir)))
    }

    /// error-guard → optimize(progressive, interlaced) → write(images dir)
    pub fn images(&self) -> Result<Pipeline> {
        let out_dir = self.paths.resolve_output_directory(Category::Images)?;
        let sources = self.cfg.input_patterns(SourceKind::Images).to_vec();

        Ok(
            Pipeline::new(&self.cfg.task_names.images, Category::Images, sources)
                .stage(ErrorGuard)
                .stage(OptimizeImages::new(ImageOptions::default()))
                .stage(WriteOutput::new(out_dir)),
        )
    }
}
