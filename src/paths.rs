// src/paths.rs

//! Output path resolution.
//!
//! Pure string arithmetic over the configured depth prefix and folder/file
//! names. No normalization is performed and nothing touches the disk; callers
//! create directories and write files themselves.

use std::collections::BTreeMap;

use crate::config::ConfigFile;
use crate::errors::{BazbuildError, Result};
use crate::types::Category;

#[derive(Debug, Clone)]
pub struct PathResolver {
    depth: String,
    folders: BTreeMap<String, String>,
    files: BTreeMap<String, String>,
}

impl PathResolver {
    pub fn new(cfg: &ConfigFile) -> Self {
        Self::from_parts(
            cfg.output_path_depth.clone(),
            cfg.output_folders.clone(),
            cfg.output_files.clone(),
        )
    }

    pub fn from_parts(
        depth: impl Into<String>,
        folders: BTreeMap<String, String>,
        files: BTreeMap<String, String>,
    ) -> Self {
        Self {
            depth: depth.into(),
            folders,
            files,
        }
    }

    /// `depth + output_folders[category]`.
    pub fn resolve_output_directory(&self, category: Category) -> Result<String> {
        self.resolve_output_directory_by_name(category.as_str())
    }

    pub fn resolve_output_directory_by_name(&self, category: &str) -> Result<String> {
        let folder = self
            .folders
            .get(category)
            .ok_or_else(|| BazbuildError::UnknownCategory(category.to_string()))?;
        Ok(format!("{}{}", self.depth, folder))
    }

    /// Root-relative single-file path, `"/" + output_files[category]`.
    pub fn resolve_output_file(&self, category: Category) -> Result<String> {
        self.resolve_output_file_by_name(category.as_str())
    }

    pub fn resolve_output_file_by_name(&self, category: &str) -> Result<String> {
        let file = self
            .files
            .get(category)
            .ok_or_else(|| BazbuildError::UnknownCategory(category.to_string()))?;
        Ok(format!("/{file}"))
    }
}
