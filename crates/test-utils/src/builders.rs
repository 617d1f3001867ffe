#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use bazbuild::config::{
    CompilerSection, ConfigFile, HeaderComment, NotifySection, PathsSection, Patterns,
    RawConfigFile, SourceMapSection, TaskNames,
};
use bazbuild::types::Preprocessor;
use tempfile::TempDir;

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from a complete, valid document:
/// - outputs under `dist/` (`css/`, `js/`, `img/`)
/// - inputs `less/*.less`, `scss/*.scss`, `js/*.js`, `img/**/*`
/// - watch patterns mirroring the inputs with `**`
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

fn one(pattern: &str) -> Patterns {
    Patterns::One(pattern.to_string())
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        let output_folders = BTreeMap::from([
            ("styles".to_string(), "css/".to_string()),
            ("scripts".to_string(), "js/".to_string()),
            ("images".to_string(), "img/".to_string()),
        ]);

        let input = BTreeMap::from([
            ("less".to_string(), one("less/*.less")),
            ("scss".to_string(), one("scss/*.scss")),
            ("scripts".to_string(), one("js/*.js")),
            ("images".to_string(), one("img/**/*")),
        ]);
        let watch = BTreeMap::from([
            ("less".to_string(), one("less/**/*.less")),
            ("scss".to_string(), one("scss/**/*.scss")),
            ("scripts".to_string(), one("js/**/*.js")),
            ("images".to_string(), one("img/**/*")),
        ]);

        Self {
            config: RawConfigFile {
                production_ready: false,
                output_path_depth: "dist/".to_string(),
                css_preprocessor: Preprocessor::Less,
                task_names: TaskNames::default(),
                output_folders,
                output_files: BTreeMap::new(),
                paths: PathsSection { input, watch },
                source_maps: SourceMapSection::default(),
                header_comment: HeaderComment::default(),
                compilers: CompilerSection::default(),
                notify: NotifySection::default(),
            },
        }
    }

    pub fn preprocessor(mut self, preprocessor: Preprocessor) -> Self {
        self.config.css_preprocessor = preprocessor;
        self
    }

    pub fn production(mut self, production_ready: bool) -> Self {
        self.config.production_ready = production_ready;
        self
    }

    pub fn depth(mut self, depth: &str) -> Self {
        self.config.output_path_depth = depth.to_string();
        self
    }

    pub fn output_folder(mut self, category: &str, folder: &str) -> Self {
        self.config
            .output_folders
            .insert(category.to_string(), folder.to_string());
        self
    }

    pub fn without_output_folder(mut self, category: &str) -> Self {
        self.config.output_folders.remove(category);
        self
    }

    pub fn output_file(mut self, category: &str, file: &str) -> Self {
        self.config
            .output_files
            .insert(category.to_string(), file.to_string());
        self
    }

    pub fn input(mut self, kind: &str, patterns: &[&str]) -> Self {
        self.config.paths.input.insert(kind.to_string(), many(patterns));
        self
    }

    pub fn without_input(mut self, kind: &str) -> Self {
        self.config.paths.input.remove(kind);
        self
    }

    pub fn watch(mut self, kind: &str, patterns: &[&str]) -> Self {
        self.config.paths.watch.insert(kind.to_string(), many(patterns));
        self
    }

    pub fn header(mut self, body: &str) -> Self {
        self.config.header_comment = HeaderComment {
            allow: true,
            body: body.to_string(),
        };
        self
    }

    pub fn source_map_path(mut self, path: &str) -> Self {
        self.config.source_maps.path = path.to_string();
        self
    }

    pub fn less_command(mut self, command: &str) -> Self {
        self.config.compilers.less_command = command.to_string();
        self
    }

    pub fn task_name(mut self, role: &str, name: &str) -> Self {
        let names = &mut self.config.task_names;
        let slot = match role {
            "styles" => &mut names.styles,
            "less" => &mut names.less,
            "scss" => &mut names.scss,
            "js" => &mut names.js,
            "images" => &mut names.images,
            "cleanup" => &mut names.cleanup,
            "dev_build" => &mut names.dev_build,
            other => panic!("unknown task role {other}"),
        };
        *slot = name.to_string();
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn try_build(self) -> bazbuild::errors::Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build().expect("test config should be valid")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn many(patterns: &[&str]) -> Patterns {
    Patterns::Many(patterns.iter().map(|p| p.to_string()).collect())
}

/// A temporary project directory with helpers for source files.
pub struct ProjectDir {
    dir: TempDir,
}

impl ProjectDir {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp project"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Write `contents` to `rel`, creating parent directories.
    pub fn write(&self, rel: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, contents).expect("write project file");
        path
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path(rel))
            .unwrap_or_else(|e| panic!("read {rel}: {e}"))
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.path(rel).exists()
    }
}

impl Default for ProjectDir {
    fn default() -> Self {
        Self::new()
    }
}
