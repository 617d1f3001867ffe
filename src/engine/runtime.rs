// src/engine/runtime.rs

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::engine::{RunId, RunStatus, RuntimeEvent, TaskName, TaskRegistry, TriggerReason};
use crate::errors::{BazbuildError, Result};

use super::core::CoreRuntime;
use super::CoreCommand;

/// A run the core decided to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledRun {
    pub run_id: RunId,
    pub tasks: Vec<TaskName>,
    pub reason: TriggerReason,
}

/// Trait abstracting how runs are started.
///
/// Implementations must eventually report `RuntimeEvent::RunFinished` for
/// every launched run. Production code uses [`RegistryLauncher`]; tests can
/// provide one that completes runs without touching the filesystem.
pub trait RunLauncher: Send {
    fn launch(&mut self, run: ScheduledRun) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Launches each run as its own tokio task on a shared [`TaskRegistry`].
pub struct RegistryLauncher {
    registry: Arc<TaskRegistry>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
}

impl RegistryLauncher {
    pub fn new(registry: Arc<TaskRegistry>, runtime_tx: mpsc::Sender<RuntimeEvent>) -> Self {
        Self {
            registry,
            runtime_tx,
        }
    }
}

impl RunLauncher for RegistryLauncher {
    fn launch(&mut self, run: ScheduledRun) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let registry = Arc::clone(&self.registry);
        let tx = self.runtime_tx.clone();

        Box::pin(async move {
            tokio::spawn(async move {
                let status = match registry.run(&run.tasks).await {
                    Ok(report) => RunStatus::Completed {
                        failed: report.failures().len(),
                    },
                    Err(err) => {
                        error!(run_id = run.run_id, tasks = ?run.tasks, "run aborted: {err}");
                        RunStatus::Aborted(err.to_string())
                    }
                };

                if tx
                    .send(RuntimeEvent::RunFinished {
                        run_id: run.run_id,
                        status,
                    })
                    .await
                    .is_err()
                {
                    debug!(run_id = run.run_id, "runtime gone before run finished");
                }
            });
            Ok(())
        })
    }
}

/// Drives the core in response to `RuntimeEvent`s and delegates actual run
/// execution to a `RunLauncher`.
pub struct Runtime<L: RunLauncher> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    launcher: L,
}

impl<L: RunLauncher> fmt::Debug for Runtime<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<L: RunLauncher> Runtime<L> {
    pub fn new(core: CoreRuntime, event_rx: mpsc::Receiver<RuntimeEvent>, launcher: L) -> Self {
        Self {
            core,
            event_rx,
            launcher,
        }
    }

    /// Main event loop.
    ///
    /// Returns once the core reports idle (no run in flight, no active
    /// watcher), on shutdown, or with an error if a run was aborted.
    pub async fn run(mut self) -> Result<()> {
        info!("bazbuild runtime started");

        loop {
            let Some(event) = self.event_rx.recv().await else {
                info!("runtime event channel closed; exiting");
                break;
            };

            debug!(?event, "runtime received event");

            let step = self.core.step(event);

            for command in step.commands {
                self.execute_command(command).await?;
            }

            if !step.keep_running {
                break;
            }
        }

        info!("runtime exiting");

        match self.core.aborted() {
            Some((run_id, message)) => Err(BazbuildError::RunAborted {
                run_id,
                message: message.to_string(),
            }),
            None => Ok(()),
        }
    }

    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::StartRun {
                run_id,
                tasks,
                reason,
            } => {
                info!(run_id, ?tasks, ?reason, "starting run");
                self.launcher
                    .launch(ScheduledRun {
                        run_id,
                        tasks,
                        reason,
                    })
                    .await?;
            }
            CoreCommand::RequestExit => {
                debug!("core issued RequestExit command");
            }
        }
        Ok(())
    }
}
