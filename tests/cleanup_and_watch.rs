// tests/cleanup_and_watch.rs

use std::time::Duration;

use bazbuild::engine::{RuntimeEvent, TaskOutcome, TriggerReason};
use bazbuild::report::Interceptor;
use bazbuild::tasks::setup_registry;
use bazbuild::types::SourceKind;
use bazbuild::watch::{bindings_from_config, WatchDispatcher};
use bazbuild_test_utils::builders::{ConfigFileBuilder, ProjectDir};
use bazbuild_test_utils::{init_tracing, with_timeout};
use tokio::sync::mpsc;

#[tokio::test]
async fn cleanup_twice_in_a_row_succeeds() {
    init_tracing();
    let project = ProjectDir::new();
    project.write("dist/css/site.css", "body{}");
    project.write("dist/js/maps/app.js.map", "{}");
    project.write("dist/img/logo.png", [0u8; 4]);
    project.write("dist/keep.txt", "not an output folder");

    let cfg = ConfigFileBuilder::new().build();
    let (tx, _rx) = mpsc::channel(8);
    let registry = setup_registry(&cfg, project.root(), &Interceptor::new(), tx).unwrap();

    for _ in 0..2 {
        let report = with_timeout(registry.run(&["cleanup".to_string()]))
            .await
            .unwrap();
        assert_eq!(
            report.entries(),
            &[("cleanup".to_string(), TaskOutcome::Success)]
        );
    }

    assert!(project.path("dist/css").is_dir());
    assert!(!project.exists("dist/css/site.css"));
    assert!(!project.exists("dist/js/maps"));
    assert!(!project.exists("dist/img/logo.png"));
    assert!(project.exists("dist/keep.txt"));
}

#[test]
fn style_bindings_trigger_the_styles_task() {
    let cfg = ConfigFileBuilder::new().task_name("js", "scripts").build();
    let bindings = bindings_from_config(&cfg).unwrap();

    let tasks_for = |kind: SourceKind| {
        bindings
            .iter()
            .find(|b| b.kind == kind)
            .map(|b| b.tasks.clone())
            .unwrap()
    };

    assert_eq!(tasks_for(SourceKind::Less), vec!["styles".to_string()]);
    assert_eq!(tasks_for(SourceKind::Scss), vec!["styles".to_string()]);
    assert_eq!(tasks_for(SourceKind::Scripts), vec!["scripts".to_string()]);
    assert_eq!(tasks_for(SourceKind::Images), vec!["images".to_string()]);

    let less = bindings.iter().find(|b| b.kind == SourceKind::Less).unwrap();
    assert!(less.matches("less/partials/nav.less"));
    assert!(!less.matches("js/app.js"));
}

#[tokio::test]
async fn watch_task_activates_once() {
    let project = ProjectDir::new();
    let cfg = ConfigFileBuilder::new().build();
    let (tx, mut rx) = mpsc::channel(8);
    let registry = setup_registry(&cfg, project.root(), &Interceptor::new(), tx).unwrap();

    for _ in 0..2 {
        with_timeout(registry.run(&["watch".to_string()]))
            .await
            .unwrap();
    }

    assert!(matches!(rx.try_recv(), Ok(RuntimeEvent::WatchActivated)));
    assert!(rx.try_recv().is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn file_change_requests_bound_task() {
    init_tracing();
    let project = ProjectDir::new();
    project.write("js/app.js", "a();\n");

    let cfg = ConfigFileBuilder::new().build();
    let (tx, mut rx) = mpsc::channel(64);
    let dispatcher = WatchDispatcher::new(project.root(), bindings_from_config(&cfg).unwrap(), tx);

    let subscription = dispatcher.activate().unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    project.write("js/app.js", "b();\n");

    let event = with_timeout(rx.recv()).await.unwrap();
    match event {
        RuntimeEvent::RunRequested { tasks, reason } => {
            assert_eq!(tasks, vec!["js".to_string()]);
            assert_eq!(reason, TriggerReason::FileWatch);
        }
        other => panic!("expected RunRequested, got {other:?}"),
    }

    subscription.cancel();
}
