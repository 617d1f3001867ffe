// src/pipeline/write.rs

use std::fs;
use std::path::PathBuf;

use tracing::debug;

use crate::pipeline::{FileSet, Stage, StageContext, StageError};

/// `write(dir)`: the sink of every pipeline. `dir` is relative to the
/// project root and is typically a resolved output directory.
#[derive(Debug, Clone)]
pub struct WriteOutput {
    dir: PathBuf,
}

impl WriteOutput {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl Stage for WriteOutput {
    fn name(&self) -> &'static str {
        "write"
    }

    fn apply(&self, files: FileSet, ctx: &StageContext) -> Result<FileSet, StageError> {
        let out_dir = ctx.root.join(&self.dir);

        for file in &files {
            let path = out_dir.join(&file.relative);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| StageError::io(parent, e))?;
            }
            fs::write(&path, &file.contents).map_err(|e| StageError::io(&path, e))?;
            debug!(task = %ctx.task, path = ?path, bytes = file.contents.len(), "wrote output");
        }

        Ok(files)
    }
}
