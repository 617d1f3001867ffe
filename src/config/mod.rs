// src/config/mod.rs

//! Configuration loading and validation.
//!
//! - `model.rs` holds the serde-backed document (`RawConfigFile`) and the
//!   validated, immutable `ConfigFile`.
//! - `loader.rs` reads a document from disk.
//! - `validate.rs` turns a raw document into a `ConfigFile`.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, DEFAULT_CONFIG_FILE};
pub use model::{
    CompilerSection, ConfigFile, HeaderComment, NotifySection, PathsSection, Patterns,
    RawConfigFile, SourceMapSection, TaskNames,
};
