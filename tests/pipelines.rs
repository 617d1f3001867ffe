// tests/pipelines.rs

use std::fs;

use bazbuild::config::ConfigFile;
use bazbuild::engine::{RuntimeEvent, TaskBehavior, TaskOutcome, TaskRegistry};
use bazbuild::pipeline::header::HeaderInject;
use bazbuild::pipeline::{PipelineBuilder, SourceFile, Stage, StageContext};
use bazbuild::report::Interceptor;
use bazbuild::tasks::setup_registry;
use bazbuild::types::Preprocessor;
use bazbuild_test_utils::builders::{ConfigFileBuilder, ProjectDir};
use bazbuild_test_utils::fakes::RecordingSink;
use bazbuild_test_utils::{init_tracing, with_timeout};
use tokio::sync::mpsc;

fn registry_for(cfg: &ConfigFile, project: &ProjectDir, sink: &RecordingSink) -> TaskRegistry {
    let (tx, _rx) = mpsc::channel::<RuntimeEvent>(8);
    let interceptor = Interceptor::new().with_sink(sink.clone());
    setup_registry(cfg, project.root(), &interceptor, tx).unwrap()
}

async fn run(registry: &TaskRegistry, task: &str) -> Vec<(String, TaskOutcome)> {
    with_timeout(registry.run(&[task.to_string()]))
        .await
        .unwrap()
        .entries()
        .to_vec()
}

#[test]
fn canonical_stage_orders() {
    let cfg = ConfigFileBuilder::new().build();
    let builder = PipelineBuilder::new(&cfg);

    assert_eq!(
        builder.styles(Preprocessor::Less).unwrap().stage_names(),
        vec![
            "error-guard",
            "sourcemap-init",
            "compile(less)",
            "header-inject",
            "sourcemap-emit",
            "write"
        ]
    );
    assert_eq!(
        builder.scripts().unwrap().stage_names(),
        vec![
            "sourcemap-init",
            "error-guard",
            "include",
            "header-inject",
            "sourcemap-emit",
            "write"
        ]
    );
    assert_eq!(
        builder.images().unwrap().stage_names(),
        vec!["error-guard", "optimize", "write"]
    );
}

#[test]
fn production_inserts_minify_before_header() {
    let cfg = ConfigFileBuilder::new().production(true).build();
    let builder = PipelineBuilder::new(&cfg);

    assert_eq!(
        builder.styles(Preprocessor::Scss).unwrap().stage_names(),
        vec![
            "error-guard",
            "sourcemap-init",
            "compile(scss)",
            "minify(css)",
            "header-inject",
            "sourcemap-emit",
            "write"
        ]
    );
    assert!(builder
        .scripts()
        .unwrap()
        .stage_names()
        .windows(2)
        .any(|w| w == ["include", "minify(js)"]));
}

#[test]
fn styles_task_selects_exactly_one_dialect() {
    let sink = RecordingSink::new();
    let project = ProjectDir::new();

    for (preprocessor, expected) in [(Preprocessor::Less, "less"), (Preprocessor::Scss, "scss")] {
        let cfg = ConfigFileBuilder::new().preprocessor(preprocessor).build();
        let registry = registry_for(&cfg, &project, &sink);

        match registry.get("styles") {
            Some(TaskBehavior::Composite(children)) => assert_eq!(children, &[expected]),
            other => panic!("styles should be a composite, got {other:?}"),
        }
        // Both dialect tasks stay individually invokable.
        assert!(registry.contains("less"));
        assert!(registry.contains("scss"));
    }
}

fn composite_children(registry: &TaskRegistry, name: &str) -> Vec<String> {
    match registry.get(name) {
        Some(TaskBehavior::Composite(children)) => children.clone(),
        other => panic!("{name} should be a composite, got {other:?}"),
    }
}

#[test]
fn entry_points_are_wired_in_order() {
    let sink = RecordingSink::new();
    let project = ProjectDir::new();
    let registry = registry_for(&ConfigFileBuilder::new().build(), &project, &sink);

    assert_eq!(
        composite_children(&registry, "dev-build"),
        vec!["styles", "js", "images"]
    );
    assert_eq!(
        composite_children(&registry, "default"),
        vec!["watch", "cleanup", "dev-build"]
    );
}

#[test]
fn renamed_roles_keep_entry_point_order() {
    let sink = RecordingSink::new();
    let project = ProjectDir::new();
    let cfg = ConfigFileBuilder::new()
        .task_name("styles", "css")
        .task_name("js", "scripts")
        .task_name("images", "img")
        .task_name("cleanup", "clean")
        .task_name("dev_build", "build")
        .build();
    let registry = registry_for(&cfg, &project, &sink);

    assert_eq!(
        composite_children(&registry, "build"),
        vec!["css", "scripts", "img"]
    );
    assert_eq!(
        composite_children(&registry, "default"),
        vec!["watch", "clean", "build"]
    );
    assert!(!registry.contains("dev-build"));
}

#[tokio::test]
async fn scss_styles_never_invoke_less() {
    init_tracing();
    let project = ProjectDir::new();
    project.write("scss/site.scss", "$c: red;\nbody { color: $c; }\n");
    project.write("scss/_partial.scss", "a { b: c; }\n");
    project.write("less/site.less", "@c: blue;\nbody { color: @c; }\n");

    let cfg = ConfigFileBuilder::new()
        .preprocessor(Preprocessor::Scss)
        .less_command("bazbuild-no-such-lessc")
        .build();
    let sink = RecordingSink::new();
    let registry = registry_for(&cfg, &project, &sink);

    let entries = run(&registry, "styles").await;

    assert_eq!(entries, vec![("scss".to_string(), TaskOutcome::Success)]);
    assert!(sink.records().is_empty(), "{:?}", sink.records());

    let css = project.read("dist/css/site.css");
    assert!(css.contains("color: red"), "{css}");
    assert!(css.ends_with("/*# sourceMappingURL=site.css.map */\n"), "{css}");
    assert!(project.exists("dist/css/site.css.map"));
    assert!(!project.exists("dist/css/_partial.css"));
}

#[tokio::test]
async fn missing_less_compiler_is_a_contained_error() {
    let project = ProjectDir::new();
    project.write("less/site.less", "body { color: blue; }\n");

    let cfg = ConfigFileBuilder::new()
        .less_command("bazbuild-no-such-lessc")
        .build();
    let sink = RecordingSink::new();
    let registry = registry_for(&cfg, &project, &sink);

    let entries = run(&registry, "styles").await;

    assert_eq!(entries, vec![("less".to_string(), TaskOutcome::Failed)]);
    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].stage, "compile(less)");
}

#[tokio::test]
async fn header_is_the_first_line_of_scripts() {
    let project = ProjectDir::new();
    project.write("js/app.js", "var answer = 42;\n");

    let cfg = ConfigFileBuilder::new().header("Generated").build();
    let sink = RecordingSink::new();
    let registry = registry_for(&cfg, &project, &sink);

    run(&registry, "js").await;

    let out = project.read("dist/js/app.js");
    assert_eq!(out.lines().next(), Some("/* Generated */"));
    assert!(out.starts_with("/* Generated */\nvar answer = 42;\n"), "{out}");
}

#[test]
fn disabled_header_leaves_contents_byte_identical() {
    let original = b"\xef\xbb\xbfconsole.log('hi')\r\n".to_vec();
    let files = vec![SourceFile::new("/p/js/a.js", "a.js", original.clone())];
    let ctx = StageContext::new("/p", "js");

    let out = HeaderInject::new("").apply(files, &ctx).unwrap();
    assert_eq!(out[0].contents, original);
}

#[tokio::test]
async fn scripts_emit_source_maps_under_maps() {
    let project = ProjectDir::new();
    project.write("js/app.js", "var a = 1;\n");

    let cfg = ConfigFileBuilder::new().build();
    let sink = RecordingSink::new();
    let registry = registry_for(&cfg, &project, &sink);

    run(&registry, "js").await;

    let out = project.read("dist/js/app.js");
    assert_eq!(out, "var a = 1;\n\n//# sourceMappingURL=maps/app.js.map\n");

    let map: serde_json::Value =
        serde_json::from_str(&project.read("dist/js/maps/app.js.map")).unwrap();
    assert_eq!(map["version"], 3);
    assert_eq!(map["file"], "app.js");
    assert_eq!(map["sources"][0], "js/app.js");
    assert_eq!(map["sourcesContent"][0], "var a = 1;\n");
}

#[tokio::test]
async fn includes_are_expanded_in_order() {
    let project = ProjectDir::new();
    project.write(
        "js/app.js",
        "//= include lib/b.js\n//= require lib/*.js\nmain();\n",
    );
    project.write("js/lib/a.js", "a();\n");
    project.write("js/lib/b.js", "//= require c.js\nb();\n");
    project.write("js/lib/c.js", "c();\n");

    let cfg = ConfigFileBuilder::new().build();
    let sink = RecordingSink::new();
    let registry = registry_for(&cfg, &project, &sink);

    let entries = run(&registry, "js").await;
    assert_eq!(entries, vec![("js".to_string(), TaskOutcome::Success)]);

    let out = project.read("dist/js/app.js");
    let body = out.split("\n//# sourceMappingURL").next().unwrap();
    // b pulls in c; the glob then only adds a, since b and c were already required.
    assert_eq!(body, "c();\nb();\na();\nmain();\n");

    let map: serde_json::Value =
        serde_json::from_str(&project.read("dist/js/maps/app.js.map")).unwrap();
    let sources: Vec<&str> = map["sources"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|s| s.as_str())
        .collect();
    assert!(sources.contains(&"js/lib/c.js"), "{sources:?}");
}

#[tokio::test]
async fn missing_include_is_a_contained_error() {
    let project = ProjectDir::new();
    project.write("js/app.js", "//= include nowhere.js\n");

    let cfg = ConfigFileBuilder::new().build();
    let sink = RecordingSink::new();
    let registry = registry_for(&cfg, &project, &sink);

    let entries = run(&registry, "js").await;

    assert_eq!(entries, vec![("js".to_string(), TaskOutcome::Failed)]);
    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].stage, "include");
    assert!(records[0].message.contains("nowhere.js"));
}

#[tokio::test]
async fn production_scripts_are_minified_below_the_header() {
    let project = ProjectDir::new();
    let source = "function add(first, second) {\n    return first + second;\n}\nconsole.log(add(1, 2));\n";
    project.write("js/app.js", source);

    let cfg = ConfigFileBuilder::new()
        .production(true)
        .header("Generated")
        .build();
    let sink = RecordingSink::new();
    let registry = registry_for(&cfg, &project, &sink);

    let entries = run(&registry, "js").await;
    assert_eq!(entries, vec![("js".to_string(), TaskOutcome::Success)]);

    let out = project.read("dist/js/app.js");
    assert!(out.starts_with("/* Generated */\n"), "{out}");
    assert!(out.contains("//# sourceMappingURL=maps/app.js.map"));
    let body = out.split("\n//# sourceMappingURL").next().unwrap();
    assert!(body.len() < "/* Generated */\n".len() + source.len(), "{body}");
}

#[tokio::test]
async fn images_are_copied_to_the_image_folder() {
    let project = ProjectDir::new();
    // Not a decodable image format; passes through unchanged.
    project.write("img/icons/logo.svg", "<svg xmlns=\"http://www.w3.org/2000/svg\"/>");

    let cfg = ConfigFileBuilder::new().build();
    let sink = RecordingSink::new();
    let registry = registry_for(&cfg, &project, &sink);

    let entries = run(&registry, "images").await;

    assert_eq!(entries, vec![("images".to_string(), TaskOutcome::Success)]);
    assert_eq!(
        fs::read(project.path("dist/img/icons/logo.svg")).unwrap(),
        b"<svg xmlns=\"http://www.w3.org/2000/svg\"/>"
    );
}
