// src/tasks/mod.rs

//! The concrete build tasks and their registration.
//!
//! | task (default name) | behavior |
//! |---|---|
//! | `less` / `scss` | style pipeline for that dialect |
//! | `styles` | composite of the configured dialect's pipeline only |
//! | `js` | script pipeline |
//! | `images` | image pipeline |
//! | `cleanup` | empties the output directories |
//! | `watch` | activates the watch dispatcher once |
//! | `dev-build` | `styles`, `js`, `images` |
//! | `default` | `watch`, `cleanup`, `dev-build` |

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Mutex;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::{ConfigFile, TaskNames};
use crate::engine::{RuntimeEvent, TaskAction, TaskBehavior, TaskOutcome, TaskRegistry};
use crate::errors::{BazbuildError, Result};
use crate::paths::PathResolver;
use crate::pipeline::PipelineBuilder;
use crate::report::{GuardedPipeline, Interceptor};
use crate::types::Preprocessor;
use crate::watch::{bindings_from_config, Subscription, WatchDispatcher};

pub mod cleanup;

pub use cleanup::Cleanup;

/// Leaf task running one guarded pipeline.
#[derive(Debug, Clone)]
pub struct PipelineTask {
    guarded: GuardedPipeline,
}

impl PipelineTask {
    pub fn new(guarded: GuardedPipeline) -> Self {
        Self { guarded }
    }

    pub fn guarded(&self) -> &GuardedPipeline {
        &self.guarded
    }
}

impl TaskAction for PipelineTask {
    fn run(&self) -> Pin<Box<dyn Future<Output = Result<TaskOutcome>> + Send + '_>> {
        Box::pin(async move { Ok(self.guarded.run().await) })
    }

    fn describe(&self) -> String {
        let pipeline = self.guarded.pipeline();
        format!(
            "pipeline [{}] {:?}: {}",
            pipeline.category(),
            pipeline.sources(),
            pipeline.stage_names().join(" -> ")
        )
    }
}

/// Leaf task that starts file watching on its first run.
///
/// Later runs are no-ops. The subscription lives as long as the task.
pub struct WatchActivation {
    dispatcher: WatchDispatcher,
    subscription: Mutex<Option<Subscription>>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
}

impl WatchActivation {
    pub fn new(dispatcher: WatchDispatcher, runtime_tx: mpsc::Sender<RuntimeEvent>) -> Self {
        Self {
            dispatcher,
            subscription: Mutex::new(None),
            runtime_tx,
        }
    }

    pub fn is_active(&self) -> bool {
        self.subscription
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    fn activate_once(&self) -> Result<bool> {
        let mut slot = self
            .subscription
            .lock()
            .map_err(|_| BazbuildError::Other(anyhow::anyhow!("watch subscription lock poisoned")))?;

        if slot.is_some() {
            return Ok(false);
        }
        *slot = Some(self.dispatcher.activate()?);
        Ok(true)
    }
}

impl std::fmt::Debug for WatchActivation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchActivation")
            .field("dispatcher", &self.dispatcher)
            .field("active", &self.is_active())
            .finish()
    }
}

impl TaskAction for WatchActivation {
    fn run(&self) -> Pin<Box<dyn Future<Output = Result<TaskOutcome>> + Send + '_>> {
        Box::pin(async move {
            if !self.activate_once()? {
                debug!("watchers already active");
                return Ok(TaskOutcome::Success);
            }

            if self.runtime_tx.send(RuntimeEvent::WatchActivated).await.is_err() {
                debug!("runtime gone; watch activation not reported");
            }
            Ok(TaskOutcome::Success)
        })
    }

    fn describe(&self) -> String {
        let kinds: Vec<String> = self
            .dispatcher
            .bindings()
            .iter()
            .map(|b| format!("{} {:?} -> {:?}", b.kind, b.patterns.patterns(), b.tasks))
            .collect();
        format!("watch: {}", kinds.join(", "))
    }
}

/// Build and validate the registry of every task.
pub fn setup_registry(
    cfg: &ConfigFile,
    root: &Path,
    interceptor: &Interceptor,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> Result<TaskRegistry> {
    let names = &cfg.task_names;
    let builder = PipelineBuilder::new(cfg);
    let mut registry = TaskRegistry::new();

    for preprocessor in [Preprocessor::Less, Preprocessor::Scss] {
        if cfg.input_patterns(preprocessor.source_kind()).is_empty() {
            continue;
        }
        let pipeline = builder.styles(preprocessor)?;
        registry.register(
            names.for_preprocessor(preprocessor),
            TaskBehavior::leaf(PipelineTask::new(interceptor.guard(pipeline, root))),
        );
    }

    registry.register(
        &names.styles,
        TaskBehavior::composite([names.for_preprocessor(cfg.preprocessor)]),
    );

    registry.register(
        &names.js,
        TaskBehavior::leaf(PipelineTask::new(interceptor.guard(builder.scripts()?, root))),
    );

    registry.register(
        &names.images,
        TaskBehavior::leaf(PipelineTask::new(interceptor.guard(builder.images()?, root))),
    );

    registry.register(
        &names.cleanup,
        TaskBehavior::leaf(Cleanup::new(root, &PathResolver::new(cfg))?),
    );

    let dispatcher = WatchDispatcher::new(root, bindings_from_config(cfg)?, runtime_tx.clone());
    registry.register(
        TaskNames::WATCH,
        TaskBehavior::leaf(WatchActivation::new(dispatcher, runtime_tx)),
    );

    registry.register(
        &names.dev_build,
        TaskBehavior::composite([&names.styles, &names.js, &names.images]),
    );
    registry.register(
        TaskNames::DEFAULT,
        TaskBehavior::composite([TaskNames::WATCH, names.cleanup.as_str(), names.dev_build.as_str()]),
    );

    registry.validate()?;

    info!(tasks = registry.iter().count(), preprocessor = %cfg.preprocessor, "task registry ready");

    Ok(registry)
}
