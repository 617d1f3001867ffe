// src/config/model.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};

use crate::types::{Preprocessor, SourceKind};

/// Top-level configuration as read from disk, before validation.
///
/// ```toml
/// production_ready = false
/// output_path_depth = "../"
/// css_preprocessor = "scss"
///
/// [task_names]
/// styles = "styles"
/// less = "less"
/// scss = "scss"
/// js = "js"
/// images = "images"
/// cleanup = "cleanup"
/// dev_build = "dev-build"
///
/// [output_folders]
/// styles = "css/"
/// scripts = "js/"
/// images = "img/"
///
/// [paths.input]
/// scss = "scss/main.scss"
/// scripts = ["js/*.js", "!js/_*.js"]
/// images = "img/**/*.png"
///
/// [paths.watch]
/// scss = "scss/**/*.scss"
/// scripts = "js/**/*.js"
/// images = "img/**/*"
/// ```
///
/// The kebab-case spellings of the legacy JSON document (`task-names`,
/// `output-folders`, ...) are accepted as aliases.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default, alias = "production-ready")]
    pub production_ready: bool,

    #[serde(default, alias = "output-path-depth")]
    pub output_path_depth: String,

    /// `"less"` / `"scss"`, or the legacy `{ "scss": true }` form.
    #[serde(
        default,
        alias = "css-preprocessor",
        deserialize_with = "deserialize_preprocessor"
    )]
    pub css_preprocessor: Preprocessor,

    #[serde(alias = "task-names")]
    pub task_names: TaskNames,

    /// Category name -> folder name.
    #[serde(alias = "output-folders")]
    pub output_folders: BTreeMap<String, String>,

    /// Category name -> single output file name.
    #[serde(default, alias = "output-files")]
    pub output_files: BTreeMap<String, String>,

    pub paths: PathsSection,

    #[serde(default, alias = "source-maps")]
    pub source_maps: SourceMapSection,

    #[serde(default, alias = "header-comment")]
    pub header_comment: HeaderComment,

    #[serde(default)]
    pub compilers: CompilerSection,

    #[serde(default)]
    pub notify: NotifySection,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PreprocessorSpec {
    Name(String),
    Flags {
        #[serde(default)]
        scss: bool,
    },
}

fn deserialize_preprocessor<'de, D>(deserializer: D) -> Result<Preprocessor, D::Error>
where
    D: Deserializer<'de>,
{
    match PreprocessorSpec::deserialize(deserializer)? {
        PreprocessorSpec::Name(name) => name.parse().map_err(serde::de::Error::custom),
        PreprocessorSpec::Flags { scss: true } => Ok(Preprocessor::Scss),
        PreprocessorSpec::Flags { scss: false } => Ok(Preprocessor::Less),
    }
}

/// `[task_names]`: logical role -> externally invokable task name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TaskNames {
    pub styles: String,
    pub less: String,
    pub scss: String,
    pub js: String,
    pub images: String,
    pub cleanup: String,
    #[serde(alias = "dev-build")]
    pub dev_build: String,
}

impl TaskNames {
    /// Name of the watch activation task. Not configurable.
    pub const WATCH: &'static str = "watch";
    /// Name of the default entry point. Not configurable.
    pub const DEFAULT: &'static str = "default";

    /// Role label / configured name pairs, in declaration order.
    pub fn roles(&self) -> [(&'static str, &str); 7] {
        [
            ("styles", &self.styles),
            ("less", &self.less),
            ("scss", &self.scss),
            ("js", &self.js),
            ("images", &self.images),
            ("cleanup", &self.cleanup),
            ("dev_build", &self.dev_build),
        ]
    }

    /// Task name of the pipeline compiling the given style dialect.
    pub fn for_preprocessor(&self, preprocessor: Preprocessor) -> &str {
        match preprocessor {
            Preprocessor::Less => &self.less,
            Preprocessor::Scss => &self.scss,
        }
    }
}

impl Default for TaskNames {
    fn default() -> Self {
        Self {
            styles: "styles".to_string(),
            less: "less".to_string(),
            scss: "scss".to_string(),
            js: "js".to_string(),
            images: "images".to_string(),
            cleanup: "cleanup".to_string(),
            dev_build: "dev-build".to_string(),
        }
    }
}

/// One glob pattern or a list of them. Entries starting with `!` exclude.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Patterns {
    One(String),
    Many(Vec<String>),
}

impl Patterns {
    pub fn as_slice(&self) -> &[String] {
        match self {
            Patterns::One(p) => std::slice::from_ref(p),
            Patterns::Many(list) => list,
        }
    }
}

/// `[paths]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsSection {
    /// Source kind name -> patterns compiled by the pipelines.
    #[serde(default, alias = "input-paths")]
    pub input: BTreeMap<String, Patterns>,

    /// Source kind name -> patterns that trigger a rebuild.
    #[serde(default, alias = "watch-paths")]
    pub watch: BTreeMap<String, Patterns>,
}

/// `[source_maps]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceMapSection {
    /// Where style source maps go, relative to the style output directory.
    #[serde(default = "default_source_map_path", alias = "source-map-path")]
    pub path: String,
}

fn default_source_map_path() -> String {
    "./".to_string()
}

impl Default for SourceMapSection {
    fn default() -> Self {
        Self {
            path: default_source_map_path(),
        }
    }
}

/// `[header_comment]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HeaderComment {
    #[serde(default)]
    pub allow: bool,
    #[serde(default)]
    pub body: String,
}

impl HeaderComment {
    /// The text prepended to every compiled style/script file.
    ///
    /// Empty when `allow` is false.
    pub fn text(&self) -> String {
        if self.allow {
            format!("/* {} */\n", self.body)
        } else {
            String::new()
        }
    }
}

/// `[compilers]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct CompilerSection {
    /// Executable used for LESS compilation. Reads stdin, writes CSS to stdout.
    #[serde(default = "default_less_command")]
    pub less_command: String,
}

fn default_less_command() -> String {
    "lessc".to_string()
}

impl Default for CompilerSection {
    fn default() -> Self {
        Self {
            less_command: default_less_command(),
        }
    }
}

/// `[notify]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotifySection {
    /// External notifier, invoked as `<command> <title> <message>`.
    /// If unset, build errors are shown as a banner on the terminal.
    #[serde(default)]
    pub command: Option<String>,
}

/// Validated configuration. Immutable for the lifetime of a run and passed
/// by reference into every component that needs it.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub production_ready: bool,
    pub output_path_depth: String,
    pub preprocessor: Preprocessor,
    pub task_names: TaskNames,
    pub output_folders: BTreeMap<String, String>,
    pub output_files: BTreeMap<String, String>,
    pub input: BTreeMap<SourceKind, Vec<String>>,
    pub watch: BTreeMap<SourceKind, Vec<String>>,
    pub source_maps: SourceMapSection,
    pub header_comment: HeaderComment,
    pub compilers: CompilerSection,
    pub notify: NotifySection,
}

impl ConfigFile {
    /// Input patterns for a source kind; empty if none were configured.
    pub fn input_patterns(&self, kind: SourceKind) -> &[String] {
        self.input.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Watch patterns for a source kind; empty if none were configured.
    pub fn watch_patterns(&self, kind: SourceKind) -> &[String] {
        self.watch.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Override the production flag (used by `--production`).
    pub fn with_production_ready(mut self, production_ready: bool) -> Self {
        self.production_ready = production_ready;
        self
    }
}
