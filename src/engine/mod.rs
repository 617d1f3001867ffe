// src/engine/mod.rs

//! Orchestration engine for bazbuild.
//!
//! This module ties together:
//! - the task registry and sequencer ([`registry`])
//! - the runtime event loop that reacts to:
//!   - run requests (startup tasks, file-watch triggers)
//!   - run completion
//!   - watch activation
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

/// Canonical task name type used throughout the engine.
pub type TaskName = String;

/// Identifier of one requested run, assigned by the core.
pub type RunId = u64;

/// Outcome of a single leaf task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    /// The task hit a build error that was contained and reported.
    Failed,
}

/// Why a run was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// Tasks named on the command line at startup.
    Manual,
    /// Triggered due to a filesystem event.
    FileWatch,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// Every task ran; `failed` leaves had contained build errors.
    Completed { failed: usize },
    /// A fatal error stopped the sequence.
    Aborted(String),
}

/// Events flowing into the runtime from the CLI, watchers and runs.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// Run these tasks, in order, as one independent sequence.
    RunRequested {
        tasks: Vec<TaskName>,
        reason: TriggerReason,
    },
    /// A previously started run has finished.
    RunFinished { run_id: RunId, status: RunStatus },
    /// A watch subscription is now active; the process stays alive.
    WatchActivated,
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod registry;
pub mod runtime;

pub use core::{CoreCommand, CoreRuntime, CoreStep};
pub use registry::{RunReport, TaskAction, TaskBehavior, TaskRegistry};
pub use runtime::{RegistryLauncher, RunLauncher, Runtime, ScheduledRun};
