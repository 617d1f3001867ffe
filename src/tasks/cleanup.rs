// src/tasks/cleanup.rs

use std::fs;
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use tracing::{debug, info};

use crate::engine::{TaskAction, TaskOutcome};
use crate::errors::{BazbuildError, Result};
use crate::paths::PathResolver;
use crate::types::Category;

/// Empties the output directory of every category.
///
/// Missing files and directories are not errors, so running it twice in a
/// row succeeds. The directories themselves are kept.
#[derive(Debug, Clone)]
pub struct Cleanup {
    dirs: Vec<PathBuf>,
}

impl Cleanup {
    pub fn new(root: &Path, paths: &PathResolver) -> Result<Self> {
        let dirs = Category::ALL
            .into_iter()
            .map(|category| Ok(root.join(paths.resolve_output_directory(category)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { dirs })
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Synchronous body of the task; returns the number of removed entries.
    pub fn clean(&self) -> Result<usize> {
        let mut removed = 0;
        for dir in &self.dirs {
            removed += empty_dir(dir)?;
        }
        Ok(removed)
    }
}

fn empty_dir(dir: &Path) -> Result<usize> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!(dir = ?dir, "output directory missing; nothing to clean");
            return Ok(0);
        }
        Err(source) => {
            return Err(BazbuildError::CleanupIo {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    let mut removed = 0;
    for entry in entries {
        let entry = entry.map_err(|source| BazbuildError::CleanupIo {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();

        let result = match entry.file_type() {
            Ok(ft) if ft.is_dir() => fs::remove_dir_all(&path),
            Ok(_) => fs::remove_file(&path),
            Err(err) => Err(err),
        };

        match result {
            Ok(()) => removed += 1,
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(source) => return Err(BazbuildError::CleanupIo { path, source }),
        }
    }

    Ok(removed)
}

impl TaskAction for Cleanup {
    fn run(&self) -> Pin<Box<dyn Future<Output = Result<TaskOutcome>> + Send + '_>> {
        Box::pin(async move {
            let removed = self.clean()?;
            info!(removed, dirs = ?self.dirs, "output directories cleaned");
            Ok(TaskOutcome::Success)
        })
    }

    fn describe(&self) -> String {
        let dirs: Vec<String> = self.dirs.iter().map(|d| d.display().to_string()).collect();
        format!("cleanup: {}", dirs.join(", "))
    }
}
