// src/watch/watcher.rs

use std::path::PathBuf;
use std::sync::Arc;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::engine::{RuntimeEvent, TriggerReason};
use crate::errors::Result;
use crate::watch::event_handler::{process_event, WatchBinding};

/// An active watch. Dropping it (or calling [`Subscription::cancel`]) stops
/// file watching.
pub struct Subscription {
    _watcher: RecommendedWatcher,
    forward: JoinHandle<()>,
}

impl Subscription {
    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.forward.abort();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish()
    }
}

/// Observes the project root and requests a run of the bound tasks whenever
/// a watched file changes.
#[derive(Debug, Clone)]
pub struct WatchDispatcher {
    root: PathBuf,
    bindings: Arc<Vec<WatchBinding>>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
}

impl WatchDispatcher {
    pub fn new(
        root: impl Into<PathBuf>,
        bindings: Vec<WatchBinding>,
        runtime_tx: mpsc::Sender<RuntimeEvent>,
    ) -> Self {
        Self {
            root: root.into(),
            bindings: Arc::new(bindings),
            runtime_tx,
        }
    }

    pub fn bindings(&self) -> &[WatchBinding] {
        &self.bindings
    }

    /// Start watching. Must be called from within a tokio runtime.
    pub fn activate(&self) -> Result<Subscription> {
        let root = self.root.canonicalize().unwrap_or_else(|_| self.root.clone());

        // Channel from the blocking notify callback into the async world.
        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if let Err(err) = event_tx.send(event) {
                        eprintln!("bazbuild: failed to forward notify event: {err}");
                    }
                }
                Err(err) => eprintln!("bazbuild: file watch error: {err}"),
            },
            Config::default(),
        )?;

        watcher.watch(&root, RecursiveMode::Recursive)?;

        info!(root = ?root, bindings = self.bindings.len(), "file watcher started");

        let bindings = Arc::clone(&self.bindings);
        let runtime_tx = self.runtime_tx.clone();

        let forward = tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                debug!(?event, "received notify event");

                for tasks in process_event(&root, &event, &bindings) {
                    let request = RuntimeEvent::RunRequested {
                        tasks,
                        reason: TriggerReason::FileWatch,
                    };
                    if runtime_tx.send(request).await.is_err() {
                        debug!("runtime gone; stopping watch forwarding");
                        return;
                    }
                }
            }
            debug!("watcher event loop finished");
        });

        Ok(Subscription {
            _watcher: watcher,
            forward,
        })
    }
}
