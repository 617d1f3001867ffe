// tests/registry_sequencing.rs

use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bazbuild::engine::{TaskAction, TaskBehavior, TaskOutcome, TaskRegistry};
use bazbuild::errors::{BazbuildError, Result};
use bazbuild_test_utils::fakes::{CompletionLog, RecordingAction};
use bazbuild_test_utils::{init_tracing, with_timeout};

fn dev_build_registry(log: &CompletionLog, delays_ms: [u64; 3]) -> TaskRegistry {
    let mut registry = TaskRegistry::new();
    let leaves = ["styles", "scripts", "images"];

    for (name, delay) in leaves.iter().zip(delays_ms) {
        registry.register(
            *name,
            TaskBehavior::leaf(
                RecordingAction::new(name, log).with_delay(Duration::from_millis(delay)),
            ),
        );
    }
    registry.register("dev-build", TaskBehavior::composite(leaves));
    registry
}

struct FatalAction;

impl TaskAction for FatalAction {
    fn run(&self) -> Pin<Box<dyn Future<Output = Result<TaskOutcome>> + Send + '_>> {
        Box::pin(async {
            Err(BazbuildError::CleanupIo {
                path: PathBuf::from("dist/css"),
                source: io::Error::from(io::ErrorKind::PermissionDenied),
            })
        })
    }
}

#[tokio::test]
async fn dev_build_completes_in_declared_order_regardless_of_duration() {
    init_tracing();

    for delays in [[60, 5, 20], [0, 40, 0], [5, 5, 50]] {
        let log = CompletionLog::default();
        let registry = dev_build_registry(&log, delays);
        registry.validate().unwrap();

        let report = with_timeout(registry.run(&["dev-build".to_string()]))
            .await
            .unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["styles", "scripts", "images"]);
        assert_eq!(report.completed(), vec!["styles", "scripts", "images"]);
        assert!(report.is_success());
    }
}

#[tokio::test]
async fn nested_composites_run_depth_first() {
    let log = CompletionLog::default();
    let mut registry = dev_build_registry(&log, [0, 0, 0]);
    registry.register("cleanup", TaskBehavior::leaf(RecordingAction::new("cleanup", &log)));
    registry.register("default", TaskBehavior::composite(["cleanup", "dev-build"]));
    registry.validate().unwrap();

    with_timeout(registry.run(&["default".to_string()]))
        .await
        .unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec!["cleanup", "styles", "scripts", "images"]
    );
}

#[tokio::test]
async fn unknown_task_fails_before_anything_runs() {
    let log = CompletionLog::default();
    let registry = dev_build_registry(&log, [0, 0, 0]);

    let result = registry
        .run(&["styles".to_string(), "fonts".to_string()])
        .await;

    assert!(matches!(result, Err(BazbuildError::UnknownTask(name)) if name == "fonts"));
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn contained_failure_does_not_stop_the_sequence() {
    let log = CompletionLog::default();
    let mut registry = dev_build_registry(&log, [0, 0, 0]);
    registry.register(
        "scripts",
        TaskBehavior::leaf(RecordingAction::new("scripts", &log).failing()),
    );

    let report = registry.run(&["dev-build".to_string()]).await.unwrap();

    assert_eq!(report.completed(), vec!["styles", "scripts", "images"]);
    assert_eq!(report.failures(), vec!["scripts"]);
    assert!(!report.is_success());
}

#[tokio::test]
async fn fatal_error_aborts_the_sequence() {
    let log = CompletionLog::default();
    let mut registry = dev_build_registry(&log, [0, 0, 0]);
    registry.register("cleanup", TaskBehavior::leaf(FatalAction));
    registry.register("default", TaskBehavior::composite(["cleanup", "dev-build"]));

    let result = registry.run(&["default".to_string()]).await;

    assert!(matches!(result, Err(BazbuildError::CleanupIo { .. })));
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn reregistering_replaces_the_definition() {
    let log: CompletionLog = Arc::new(Mutex::new(Vec::new()));
    let mut registry = TaskRegistry::new();

    assert!(registry
        .register("js", TaskBehavior::leaf(RecordingAction::new("old", &log)))
        .is_none());
    assert!(registry
        .register("js", TaskBehavior::composite(["images"]))
        .is_some());

    assert!(matches!(registry.get("js"), Some(TaskBehavior::Composite(c)) if c == &["images"]));
}

#[test]
fn validate_rejects_dangling_references() {
    let mut registry = TaskRegistry::new();
    registry.register("default", TaskBehavior::composite(["watch", "missing"]));
    registry.register("watch", TaskBehavior::composite(Vec::<String>::new()));

    match registry.validate() {
        Err(BazbuildError::UnknownTask(msg)) => assert!(msg.contains("missing"), "{msg}"),
        other => panic!("expected UnknownTask, got {other:?}"),
    }
}

#[test]
fn validate_rejects_composite_cycles() {
    let mut registry = TaskRegistry::new();
    registry.register("a", TaskBehavior::composite(["b"]));
    registry.register("b", TaskBehavior::composite(["a"]));

    assert!(matches!(registry.validate(), Err(BazbuildError::TaskCycle(_))));
}
