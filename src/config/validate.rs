// src/config/validate.rs

use std::collections::{BTreeMap, HashSet};

use globset::Glob;

use crate::config::model::{ConfigFile, Patterns, RawConfigFile, TaskNames};
use crate::errors::{BazbuildError, Result};
use crate::types::{Category, SourceKind};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = BazbuildError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_task_names(&raw.task_names)?;
        validate_output_folders(&raw)?;

        let input = collect_patterns("paths.input", &raw.paths.input)?;
        let watch = collect_patterns("paths.watch", &raw.paths.watch)?;
        validate_input_patterns(&raw, &input, &watch)?;

        Ok(ConfigFile {
            production_ready: raw.production_ready,
            output_path_depth: raw.output_path_depth,
            preprocessor: raw.css_preprocessor,
            task_names: raw.task_names,
            output_folders: raw.output_folders,
            output_files: raw.output_files,
            input,
            watch,
            source_maps: raw.source_maps,
            header_comment: raw.header_comment,
            compilers: raw.compilers,
            notify: raw.notify,
        })
    }
}

fn malformed(msg: impl Into<String>) -> BazbuildError {
    BazbuildError::ConfigMalformed(msg.into())
}

fn validate_task_names(names: &TaskNames) -> Result<()> {
    let mut seen = HashSet::new();

    for (role, name) in names.roles() {
        if name.trim().is_empty() {
            return Err(malformed(format!(
                "[task_names].{role} must not be empty"
            )));
        }
        if name == TaskNames::WATCH || name == TaskNames::DEFAULT {
            return Err(malformed(format!(
                "[task_names].{role} uses the reserved task name '{name}'"
            )));
        }
        if !seen.insert(name) {
            return Err(malformed(format!(
                "task name '{name}' is used by more than one role in [task_names]"
            )));
        }
    }

    Ok(())
}

fn validate_output_folders(raw: &RawConfigFile) -> Result<()> {
    for category in Category::ALL {
        if !raw.output_folders.contains_key(category.as_str()) {
            return Err(malformed(format!(
                "[output_folders] has no entry for '{category}'"
            )));
        }
    }

    for (category, folder) in &raw.output_folders {
        let stripped = folder.trim().trim_matches(|c: char| c == '.' || c == '/');
        if stripped.is_empty() {
            return Err(malformed(format!(
                "[output_folders].{category} must name a directory, got '{folder}'"
            )));
        }
    }

    for key in raw.output_folders.keys().chain(raw.output_files.keys()) {
        if key.parse::<Category>().is_err() {
            return Err(malformed(format!(
                "unknown resource category '{key}' (expected styles, scripts or images)"
            )));
        }
    }

    Ok(())
}

fn collect_patterns(
    section: &str,
    raw: &BTreeMap<String, Patterns>,
) -> Result<BTreeMap<SourceKind, Vec<String>>> {
    let mut out = BTreeMap::new();

    for (key, patterns) in raw {
        let kind = parse_source_kind(key).ok_or_else(|| {
            malformed(format!(
                "[{section}] has unknown key '{key}' (expected less, scss, scripts or images)"
            ))
        })?;

        let list: Vec<String> = patterns.as_slice().to_vec();
        for pattern in &list {
            let glob = pattern.strip_prefix('!').unwrap_or(pattern);
            Glob::new(glob).map_err(|e| {
                malformed(format!("[{section}].{key}: invalid glob '{pattern}': {e}"))
            })?;
        }

        out.insert(kind, list);
    }

    Ok(out)
}

fn validate_input_patterns(
    raw: &RawConfigFile,
    input: &BTreeMap<SourceKind, Vec<String>>,
    watch: &BTreeMap<SourceKind, Vec<String>>,
) -> Result<()> {
    let has_includes = |kind: &SourceKind| {
        input
            .get(kind)
            .is_some_and(|list| list.iter().any(|p| !p.starts_with('!')))
    };

    if !input.keys().any(has_includes) {
        return Err(malformed("[paths.input] must contain at least one pattern"));
    }

    let required = [
        raw.css_preprocessor.source_kind(),
        SourceKind::Scripts,
        SourceKind::Images,
    ];
    for kind in required {
        if !has_includes(&kind) {
            return Err(malformed(format!(
                "[paths.input] has no patterns for '{kind}'"
            )));
        }
    }

    for kind in input.keys() {
        if watch.get(kind).is_none_or(|list| list.is_empty()) {
            return Err(malformed(format!(
                "[paths.watch] has no patterns for '{kind}'"
            )));
        }
    }

    Ok(())
}

fn parse_source_kind(key: &str) -> Option<SourceKind> {
    // Legacy documents use `less-files`, `js-files`, ...
    let key = key.trim().trim_end_matches("-files");
    match key {
        "less" => Some(SourceKind::Less),
        "scss" | "sass" => Some(SourceKind::Scss),
        "scripts" | "js" => Some(SourceKind::Scripts),
        "images" | "image" => Some(SourceKind::Images),
        _ => None,
    }
}
