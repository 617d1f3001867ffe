// src/engine/registry.rs

//! Named tasks and their sequential execution.
//!
//! A task is either a leaf with an action, or a composite listing other task
//! names. Running a list of names executes them strictly one after another;
//! a composite completes only after all of its children have, in order.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::{debug, info, warn};

use crate::engine::{TaskName, TaskOutcome};
use crate::errors::{BazbuildError, Result};

/// Work performed by a leaf task.
///
/// `Ok(TaskOutcome::Failed)` is a contained build failure; `Err` is fatal and
/// aborts the surrounding run.
pub trait TaskAction: Send + Sync {
    fn run(&self) -> Pin<Box<dyn Future<Output = Result<TaskOutcome>> + Send + '_>>;

    /// One-line description for `--dry-run`.
    fn describe(&self) -> String {
        String::from("action")
    }
}

#[derive(Clone)]
pub enum TaskBehavior {
    Leaf(Arc<dyn TaskAction>),
    Composite(Vec<TaskName>),
}

impl TaskBehavior {
    pub fn leaf(action: impl TaskAction + 'static) -> Self {
        TaskBehavior::Leaf(Arc::new(action))
    }

    pub fn composite<I, S>(children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskName>,
    {
        TaskBehavior::Composite(children.into_iter().map(Into::into).collect())
    }
}

impl fmt::Debug for TaskBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskBehavior::Leaf(action) => f.debug_tuple("Leaf").field(&action.describe()).finish(),
            TaskBehavior::Composite(children) => f.debug_tuple("Composite").field(children).finish(),
        }
    }
}

/// Leaf outcomes of one run, in completion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    entries: Vec<(TaskName, TaskOutcome)>,
}

impl RunReport {
    pub fn entries(&self) -> &[(TaskName, TaskOutcome)] {
        &self.entries
    }

    /// Leaf names in the order they completed.
    pub fn completed(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn failures(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, outcome)| *outcome == TaskOutcome::Failed)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn is_success(&self) -> bool {
        self.entries
            .iter()
            .all(|(_, outcome)| *outcome == TaskOutcome::Success)
    }
}

#[derive(Debug, Default, Clone)]
pub struct TaskRegistry {
    tasks: BTreeMap<TaskName, TaskBehavior>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name`, replacing any previous definition.
    pub fn register(&mut self, name: impl Into<TaskName>, behavior: TaskBehavior) -> Option<TaskBehavior> {
        let name = name.into();
        let previous = self.tasks.insert(name.clone(), behavior);
        if previous.is_some() {
            debug!(task = %name, "task definition replaced");
        }
        previous
    }

    pub fn get(&self, name: &str) -> Option<&TaskBehavior> {
        self.tasks.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TaskBehavior)> {
        self.tasks.iter().map(|(name, b)| (name.as_str(), b))
    }

    /// Every composite child exists and composites do not form a cycle.
    pub fn validate(&self) -> Result<()> {
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

        for name in self.tasks.keys() {
            graph.add_node(name.as_str());
        }

        for (name, behavior) in &self.tasks {
            let TaskBehavior::Composite(children) = behavior else {
                continue;
            };
            for child in children {
                if !self.tasks.contains_key(child) {
                    return Err(BazbuildError::UnknownTask(format!(
                        "'{child}' (referenced by '{name}')"
                    )));
                }
                graph.add_edge(name.as_str(), child.as_str(), ());
            }
        }

        match toposort(&graph, None) {
            Ok(_) => Ok(()),
            Err(cycle) => Err(BazbuildError::TaskCycle(cycle.node_id().to_string())),
        }
    }

    /// Run `names` strictly in order.
    ///
    /// All names are looked up before anything runs. Contained failures are
    /// recorded and the sequence continues; a fatal error stops it.
    pub async fn run(&self, names: &[TaskName]) -> Result<RunReport> {
        if let Some(unknown) = names.iter().find(|n| !self.tasks.contains_key(n.as_str())) {
            return Err(BazbuildError::UnknownTask(unknown.clone()));
        }

        let mut report = RunReport::default();
        for name in names {
            self.run_task(name, &mut report).await?;
        }

        let failures = report.failures();
        if failures.is_empty() {
            debug!(?names, "sequence finished");
        } else {
            warn!(?names, ?failures, "sequence finished with build errors");
        }

        Ok(report)
    }

    fn run_task<'a>(
        &'a self,
        name: &'a str,
        report: &'a mut RunReport,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let behavior = self
                .tasks
                .get(name)
                .ok_or_else(|| BazbuildError::UnknownTask(name.to_string()))?;

            info!(task = name, "starting");
            let started = Instant::now();

            match behavior {
                TaskBehavior::Leaf(action) => {
                    let outcome = action.run().await?;
                    report.entries.push((name.to_string(), outcome));
                }
                TaskBehavior::Composite(children) => {
                    for child in children {
                        self.run_task(child, report).await?;
                    }
                }
            }

            info!(task = name, elapsed = ?started.elapsed(), "finished");
            Ok(())
        })
    }
}
