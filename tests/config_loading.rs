// tests/config_loading.rs

use std::io::Write;

use bazbuild::config::load_and_validate;
use bazbuild::errors::BazbuildError;
use bazbuild::types::{Preprocessor, SourceKind};
use bazbuild_test_utils::builders::ConfigFileBuilder;
use tempfile::NamedTempFile;

const VALID_TOML: &str = r#"
production_ready = true
output_path_depth = "../"
css_preprocessor = "scss"

[task_names]
styles = "styles"
less = "less"
scss = "scss"
js = "js"
images = "images"
cleanup = "cleanup"
dev_build = "dev-build"

[output_folders]
styles = "css/"
scripts = "js/"
images = "img/"

[output_files]
styles = "style.css"

[paths.input]
scss = "scss/main.scss"
scripts = ["js/*.js", "!js/_*.js"]
images = "img/**/*"

[paths.watch]
scss = "scss/**/*.scss"
scripts = "js/**/*.js"
images = "img/**/*"

[header_comment]
allow = true
body = "Generated"
"#;

fn toml_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn test_valid_toml_loads() {
    let file = toml_file(VALID_TOML);
    let cfg = load_and_validate(file.path()).unwrap();

    assert!(cfg.production_ready);
    assert_eq!(cfg.output_path_depth, "../");
    assert_eq!(cfg.preprocessor, Preprocessor::Scss);
    assert_eq!(
        cfg.input_patterns(SourceKind::Scripts),
        &["js/*.js".to_string(), "!js/_*.js".to_string()]
    );
    assert_eq!(cfg.header_comment.text(), "/* Generated */\n");
    assert_eq!(cfg.source_maps.path, "./");
    assert_eq!(cfg.compilers.less_command, "lessc");
}

#[test]
fn test_missing_file_is_config_missing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Bazbuild.toml");

    match load_and_validate(&path) {
        Err(BazbuildError::ConfigMissing(p)) => assert_eq!(p, path),
        other => panic!("expected ConfigMissing, got {other:?}"),
    }
}

#[test]
fn test_unparseable_toml_is_malformed() {
    let file = toml_file("production_ready = [unterminated");

    match load_and_validate(file.path()) {
        Err(BazbuildError::ConfigMalformed(_)) => {}
        other => panic!("expected ConfigMalformed, got {other:?}"),
    }
}

#[test]
fn test_missing_task_role_is_malformed() {
    let without_js = VALID_TOML.replace("js = \"js\"\n", "");
    let file = toml_file(&without_js);

    match load_and_validate(file.path()) {
        Err(BazbuildError::ConfigMalformed(msg)) => assert!(msg.contains("js"), "{msg}"),
        other => panic!("expected ConfigMalformed, got {other:?}"),
    }
}

#[test]
fn test_reserved_task_name_is_rejected() {
    let result = ConfigFileBuilder::new().task_name("cleanup", "watch").try_build();

    match result {
        Err(BazbuildError::ConfigMalformed(msg)) => assert!(msg.contains("reserved"), "{msg}"),
        other => panic!("expected ConfigMalformed, got {other:?}"),
    }
}

#[test]
fn test_duplicate_task_names_are_rejected() {
    let result = ConfigFileBuilder::new().task_name("images", "js").try_build();
    assert!(matches!(result, Err(BazbuildError::ConfigMalformed(_))));
}

#[test]
fn test_missing_output_folder_is_rejected() {
    let result = ConfigFileBuilder::new()
        .without_output_folder("images")
        .try_build();

    match result {
        Err(BazbuildError::ConfigMalformed(msg)) => assert!(msg.contains("images"), "{msg}"),
        other => panic!("expected ConfigMalformed, got {other:?}"),
    }
}

#[test]
fn test_empty_output_folder_is_rejected() {
    for folder in ["", "  ", "./", "/"] {
        let result = ConfigFileBuilder::new()
            .depth("")
            .output_folder("scripts", folder)
            .try_build();

        match result {
            Err(BazbuildError::ConfigMalformed(msg)) => assert!(msg.contains("scripts"), "{msg}"),
            other => panic!("expected ConfigMalformed for {folder:?}, got {other:?}"),
        }
    }
}

#[test]
fn test_selected_preprocessor_needs_inputs() {
    let result = ConfigFileBuilder::new()
        .preprocessor(Preprocessor::Scss)
        .without_input("scss")
        .try_build();

    assert!(matches!(result, Err(BazbuildError::ConfigMalformed(_))));

    // The unselected dialect may be absent.
    ConfigFileBuilder::new()
        .preprocessor(Preprocessor::Scss)
        .without_input("less")
        .build();
}

#[test]
fn test_input_without_watch_patterns_is_rejected() {
    let result = ConfigFileBuilder::new().watch("scripts", &[]).try_build();
    assert!(matches!(result, Err(BazbuildError::ConfigMalformed(_))));
}

#[test]
fn test_invalid_glob_is_rejected() {
    let result = ConfigFileBuilder::new()
        .input("scripts", &["js/[unclosed.js"])
        .try_build();
    assert!(matches!(result, Err(BazbuildError::ConfigMalformed(_))));
}

#[test]
fn test_legacy_json_document_loads() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(
        file,
        r#"{{
  "production-ready": false,
  "output-path-depth": "../",
  "css-preprocessor": {{ "scss": true }},
  "task-names": {{
    "styles": "styles", "less": "less", "scss": "scss", "js": "js",
    "images": "images", "cleanup": "cleanup", "dev-build": "dev-build"
  }},
  "output-folders": {{ "styles": "css/", "scripts": "js/", "images": "img/" }},
  "paths": {{
    "input-paths": {{
      "scss-files": "scss/main.scss",
      "js-files": ["js/*.js"],
      "image-files": "img/**/*"
    }},
    "watch-paths": {{
      "scss-files": "scss/**/*.scss",
      "js-files": "js/**/*.js",
      "image-files": "img/**/*"
    }}
  }},
  "source-maps": {{ "source-map-path": "./maps" }},
  "header-comment": {{ "allow": false, "body": "unused" }}
}}"#
    )
    .unwrap();

    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.preprocessor, Preprocessor::Scss);
    assert_eq!(cfg.task_names.dev_build, "dev-build");
    assert_eq!(cfg.input_patterns(SourceKind::Images), &["img/**/*".to_string()]);
    assert_eq!(cfg.source_maps.path, "./maps");
    assert_eq!(cfg.header_comment.text(), "");
}
