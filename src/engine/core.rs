// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible for
//! reading events from channels, launching runs and handling Ctrl+C.
//!
//! The core is unit tested without any Tokio, channels, filesystem, or
//! pipelines.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::engine::{RunId, RunStatus, RuntimeEvent, TaskName, TriggerReason};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Start an independent run of `tasks`.
    StartRun {
        run_id: RunId,
        tasks: Vec<TaskName>,
        reason: TriggerReason,
    },
    /// Request that the process exits.
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn continue_with(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }

    fn exit() -> Self {
        Self {
            commands: vec![CoreCommand::RequestExit],
            keep_running: false,
        }
    }
}

/// Pure core runtime state.
///
/// Tracks the runs in flight and whether a watcher keeps the process alive.
/// Runs never wait on each other: every request starts immediately.
#[derive(Debug, Default)]
pub struct CoreRuntime {
    next_run_id: RunId,
    in_flight: BTreeMap<RunId, Vec<TaskName>>,
    watching: bool,
    aborted: Option<(RunId, String)>,
}

impl CoreRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// No run in flight and nothing to watch for.
    pub fn is_idle(&self) -> bool {
        self.in_flight.is_empty() && !self.watching
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_watching(&self) -> bool {
        self.watching
    }

    /// The first run that ended with a fatal error, if any.
    pub fn aborted(&self) -> Option<(RunId, &str)> {
        self.aborted.as_ref().map(|(id, msg)| (*id, msg.as_str()))
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::RunRequested { tasks, reason } => {
                if tasks.is_empty() {
                    debug!(?reason, "ignoring empty run request");
                    return self.after_change();
                }

                let run_id = self.next_run_id;
                self.next_run_id += 1;
                self.in_flight.insert(run_id, tasks.clone());

                debug!(run_id, ?tasks, ?reason, in_flight = self.in_flight.len(), "run requested");

                CoreStep::continue_with(vec![CoreCommand::StartRun {
                    run_id,
                    tasks,
                    reason,
                }])
            }
            RuntimeEvent::RunFinished { run_id, status } => {
                let Some(tasks) = self.in_flight.remove(&run_id) else {
                    warn!(run_id, "finish reported for unknown run");
                    return self.after_change();
                };

                match status {
                    RunStatus::Completed { failed } => {
                        info!(run_id, ?tasks, failed, "run completed");
                        self.after_change()
                    }
                    RunStatus::Aborted(message) => {
                        if self.aborted.is_none() {
                            self.aborted = Some((run_id, message));
                        }
                        CoreStep::exit()
                    }
                }
            }
            RuntimeEvent::WatchActivated => {
                self.watching = true;
                CoreStep::continue_with(Vec::new())
            }
            RuntimeEvent::ShutdownRequested => CoreStep {
                commands: Vec::new(),
                keep_running: false,
            },
        }
    }

    fn after_change(&self) -> CoreStep {
        if self.is_idle() {
            CoreStep::exit()
        } else {
            CoreStep::continue_with(Vec::new())
        }
    }
}
