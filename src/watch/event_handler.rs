// src/watch/event_handler.rs

//! Turning filesystem events into run requests.

use std::path::Path;

use notify::Event;
use tracing::{debug, warn};

use crate::config::ConfigFile;
use crate::engine::TaskName;
use crate::errors::Result;
use crate::types::SourceKind;
use crate::watch::path_utils::relative_str;
use crate::watch::patterns::PatternSet;

/// Watch patterns of one source kind and the tasks they trigger.
#[derive(Debug, Clone)]
pub struct WatchBinding {
    pub kind: SourceKind,
    pub patterns: PatternSet,
    pub tasks: Vec<TaskName>,
}

impl WatchBinding {
    pub fn new(kind: SourceKind, patterns: PatternSet, tasks: Vec<TaskName>) -> Self {
        Self {
            kind,
            patterns,
            tasks,
        }
    }

    pub fn matches(&self, rel_path: &str) -> bool {
        self.patterns.matches(rel_path)
    }
}

/// One binding per source kind with watch patterns.
///
/// Both style kinds trigger the styles task, which compiles whichever
/// preprocessor is configured.
pub fn bindings_from_config(cfg: &ConfigFile) -> Result<Vec<WatchBinding>> {
    let names = &cfg.task_names;
    let mut bindings = Vec::new();

    for kind in SourceKind::ALL {
        let patterns = cfg.watch_patterns(kind);
        if patterns.is_empty() {
            continue;
        }

        let task = match kind {
            SourceKind::Less | SourceKind::Scss => &names.styles,
            SourceKind::Scripts => &names.js,
            SourceKind::Images => &names.images,
        };

        bindings.push(WatchBinding::new(
            kind,
            PatternSet::new(patterns)?,
            vec![task.clone()],
        ));
    }

    Ok(bindings)
}

/// Task lists to request for a single notify event.
///
/// Access-only events are ignored. Each binding with at least one matching
/// path contributes one request, in binding order.
pub fn process_event(root: &Path, event: &Event, bindings: &[WatchBinding]) -> Vec<Vec<TaskName>> {
    if event.kind.is_access() {
        return Vec::new();
    }

    let rel_paths: Vec<String> = event
        .paths
        .iter()
        .filter_map(|path| {
            let rel = relative_str(root, path);
            if rel.is_none() {
                warn!(?path, ?root, "could not relativize path against root");
            }
            rel
        })
        .collect();

    if rel_paths.is_empty() {
        return Vec::new();
    }

    bindings
        .iter()
        .filter(|binding| rel_paths.iter().any(|rel| binding.matches(rel)))
        .map(|binding| {
            debug!(kind = %binding.kind, paths = ?rel_paths, tasks = ?binding.tasks, "watch binding matched");
            binding.tasks.clone()
        })
        .collect()
}
