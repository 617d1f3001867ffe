// src/config/loader.rs

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{BazbuildError, Result};

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs deserialization (TOML, or JSON for a `.json` file); it
/// does **not** perform semantic validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(BazbuildError::ConfigMissing(path.to_path_buf()));
    }

    let contents = fs::read_to_string(path)?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let config: RawConfigFile = if is_json {
        serde_json::from_str(&contents)?
    } else {
        toml::from_str(&contents)?
    };

    debug!(?path, json = is_json, "configuration parsed");
    Ok(config)
}

/// Load a configuration file from path and validate it.
///
/// Either the whole document is valid and a [`ConfigFile`] is returned, or
/// nothing is:
///
/// - missing file -> [`BazbuildError::ConfigMissing`]
/// - parse error or missing required keys -> [`BazbuildError::ConfigMalformed`]
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    ConfigFile::try_from(raw_config)
}

/// Default configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "Bazbuild.toml";
