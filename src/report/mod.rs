// src/report/mod.rs

//! Containment of build errors.
//!
//! A pipeline wrapped by the [`Interceptor`] never fails its caller: a stage
//! error (or a panic inside a stage) is turned into exactly one
//! [`ErrorRecord`], handed to every configured [`ErrorSink`], and the run
//! resolves as [`TaskOutcome::Failed`]. Watchers and later runs are
//! unaffected.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::error;

use crate::config::ConfigFile;
use crate::engine::TaskOutcome;
use crate::pipeline::{Pipeline, StageContext};

pub mod notify;

pub use notify::{CommandNotifier, Notifier, NotifySink, TerminalNotifier};

/// One contained build error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    pub task: String,
    pub stage: String,
    pub message: String,
}

/// Destination for contained build errors.
pub trait ErrorSink: Send + Sync {
    fn report(&self, record: &ErrorRecord);
}

/// Writes records to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl ErrorSink for LogSink {
    fn report(&self, record: &ErrorRecord) {
        error!(task = %record.task, stage = %record.stage, "{}", record.message);
    }
}

#[derive(Clone, Default)]
pub struct Interceptor {
    sinks: Vec<Arc<dyn ErrorSink>>,
}

impl std::fmt::Debug for Interceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interceptor")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl Interceptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log sink plus the configured notifier.
    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self::new()
            .with_sink(LogSink)
            .with_sink(NotifySink::from_config(&cfg.notify))
    }

    pub fn with_sink(mut self, sink: impl ErrorSink + 'static) -> Self {
        self.sinks.push(Arc::new(sink));
        self
    }

    /// Wrap `pipeline` so that running it under `root` never fails.
    pub fn guard(&self, pipeline: Pipeline, root: impl Into<PathBuf>) -> GuardedPipeline {
        GuardedPipeline {
            pipeline: Arc::new(pipeline),
            root: root.into(),
            sinks: self.sinks.clone(),
        }
    }

    fn dispatch(sinks: &[Arc<dyn ErrorSink>], record: &ErrorRecord) {
        for sink in sinks {
            sink.report(record);
        }
    }
}

/// A pipeline whose build errors are contained and reported.
#[derive(Clone)]
pub struct GuardedPipeline {
    pipeline: Arc<Pipeline>,
    root: PathBuf,
    sinks: Vec<Arc<dyn ErrorSink>>,
}

impl std::fmt::Debug for GuardedPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardedPipeline")
            .field("pipeline", &self.pipeline)
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl GuardedPipeline {
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Run the pipeline on a blocking thread.
    pub async fn run(&self) -> TaskOutcome {
        let pipeline = Arc::clone(&self.pipeline);
        let ctx = StageContext::new(&self.root, pipeline.name());

        let joined = tokio::task::spawn_blocking(move || pipeline.run(&ctx)).await;

        let record = match joined {
            Ok(Ok(_output)) => return TaskOutcome::Success,
            Ok(Err(failure)) => ErrorRecord {
                task: self.pipeline.name().to_string(),
                stage: failure.stage.to_string(),
                message: failure.error.to_string(),
            },
            Err(join_err) => ErrorRecord {
                task: self.pipeline.name().to_string(),
                stage: String::from("panic"),
                message: panic_message(join_err),
            },
        };

        Interceptor::dispatch(&self.sinks, &record);
        TaskOutcome::Failed
    }
}

fn panic_message(err: tokio::task::JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }
    let payload = err.into_panic();
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        String::from("stage panicked")
    }
}
