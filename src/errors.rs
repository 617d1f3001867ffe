// src/errors.rs

//! Crate-wide error types.
//!
//! Setup-time failures (configuration, unknown names, cleanup I/O) are
//! [`BazbuildError`]s and abort the process. Failures inside a running
//! pipeline are [`crate::pipeline::StageError`]s and never leave the error
//! interceptor.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BazbuildError {
    #[error("Configuration file not found: {0:?}")]
    ConfigMissing(PathBuf),

    #[error("Malformed configuration: {0}")]
    ConfigMalformed(String),

    #[error("Unknown resource category: {0}")]
    UnknownCategory(String),

    #[error("Task not found: {0}")]
    UnknownTask(String),

    #[error("Cycle detected between composite tasks: {0}")]
    TaskCycle(String),

    #[error("Cleanup failed for {path:?}: {source}")]
    CleanupIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Run {run_id} aborted: {message}")]
    RunAborted { run_id: u64, message: String },

    #[error("File watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<toml::de::Error> for BazbuildError {
    fn from(err: toml::de::Error) -> Self {
        BazbuildError::ConfigMalformed(err.to_string())
    }
}

impl From<serde_json::Error> for BazbuildError {
    fn from(err: serde_json::Error) -> Self {
        BazbuildError::ConfigMalformed(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BazbuildError>;
