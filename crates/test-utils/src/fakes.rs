use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bazbuild::engine::{
    RunLauncher, RunStatus, RuntimeEvent, ScheduledRun, TaskAction, TaskOutcome,
};
use bazbuild::errors::Result;
use bazbuild::pipeline::{FileSet, Stage, StageContext, StageError};
use bazbuild::report::{ErrorRecord, ErrorSink};
use tokio::sync::mpsc;

/// Shared, ordered log of task names.
pub type CompletionLog = Arc<Mutex<Vec<String>>>;

/// A leaf action that sleeps, then appends its name to a shared log.
pub struct RecordingAction {
    name: String,
    log: CompletionLog,
    delay: Duration,
    outcome: TaskOutcome,
}

impl RecordingAction {
    pub fn new(name: &str, log: &CompletionLog) -> Self {
        Self {
            name: name.to_string(),
            log: Arc::clone(log),
            delay: Duration::ZERO,
            outcome: TaskOutcome::Success,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing(mut self) -> Self {
        self.outcome = TaskOutcome::Failed;
        self
    }
}

impl TaskAction for RecordingAction {
    fn run(&self) -> Pin<Box<dyn Future<Output = Result<TaskOutcome>> + Send + '_>> {
        Box::pin(async move {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.log.lock().unwrap().push(self.name.clone());
            Ok(self.outcome)
        })
    }

    fn describe(&self) -> String {
        format!("recording {}", self.name)
    }
}

/// Error sink that keeps every record it receives.
#[derive(Clone, Default)]
pub struct RecordingSink {
    records: Arc<Mutex<Vec<ErrorRecord>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<ErrorRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl ErrorSink for RecordingSink {
    fn report(&self, record: &ErrorRecord) {
        self.records.lock().unwrap().push(record.clone());
    }
}

/// A stage that always fails with a compile error.
pub struct FailingStage {
    message: String,
}

impl FailingStage {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

impl Stage for FailingStage {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn apply(&self, _files: FileSet, _ctx: &StageContext) -> std::result::Result<FileSet, StageError> {
        Err(StageError::Compile {
            file: PathBuf::from("injected"),
            message: self.message.clone(),
        })
    }
}

/// A stage that panics.
pub struct PanickingStage;

impl Stage for PanickingStage {
    fn name(&self) -> &'static str {
        "panicking"
    }

    fn apply(&self, _files: FileSet, _ctx: &StageContext) -> std::result::Result<FileSet, StageError> {
        panic!("stage blew up")
    }
}

/// A launcher that:
/// - records which runs were started
/// - immediately reports each run as completed.
pub struct FakeLauncher {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    launched: Arc<Mutex<Vec<ScheduledRun>>>,
}

impl FakeLauncher {
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>, launched: Arc<Mutex<Vec<ScheduledRun>>>) -> Self {
        Self {
            runtime_tx,
            launched,
        }
    }
}

impl RunLauncher for FakeLauncher {
    fn launch(&mut self, run: ScheduledRun) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let launched = Arc::clone(&self.launched);

        Box::pin(async move {
            let run_id = run.run_id;
            launched.lock().unwrap().push(run);

            tx.send(RuntimeEvent::RunFinished {
                run_id,
                status: RunStatus::Completed { failed: 0 },
            })
            .await
            .map_err(anyhow::Error::from)?;
            Ok(())
        })
    }
}
