// src/pipeline/compile.rs

//! Style compilation stages.
//!
//! SCSS is compiled in-process with `grass`. LESS has no native compiler, so
//! the configured `lessc`-compatible executable is fed the source on stdin.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::pipeline::{FileSet, Stage, StageContext, StageError};

/// `compile(scss)`.
///
/// Partials (`_name.scss`) are only meant to be imported and are dropped
/// from the file set.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScssCompile;

impl Stage for ScssCompile {
    fn name(&self) -> &'static str {
        "compile(scss)"
    }

    fn apply(&self, files: FileSet, ctx: &StageContext) -> Result<FileSet, StageError> {
        let mut out = Vec::with_capacity(files.len());

        for mut file in files {
            if is_partial(&file.relative) {
                debug!(file = ?file.relative, "skipping scss partial");
                continue;
            }

            let dir = file.source.parent().unwrap_or(&ctx.root).to_path_buf();
            let options = grass::Options::default()
                .load_path(&dir)
                .load_path(&ctx.root);

            let css = grass::from_string(file.text()?.to_owned(), &options).map_err(|e| {
                StageError::Compile {
                    file: file.source.clone(),
                    message: e.to_string(),
                }
            })?;

            file.set_text(css);
            file.set_extension("css");
            out.push(file);
        }

        Ok(out)
    }
}

fn is_partial(relative: &Path) -> bool {
    relative
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('_'))
}

/// `compile(less)` through an external compiler.
///
/// The command is invoked as `<command...> --include-path=<file dir> -`
/// with the source on stdin and is expected to print CSS on stdout.
#[derive(Debug, Clone)]
pub struct LessCompile {
    command: String,
}

impl LessCompile {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    fn compile(&self, source: &[u8], include_dir: &Path, file: &Path) -> Result<String, StageError> {
        let mut parts = self.command.split_whitespace();
        let program = parts.next().ok_or_else(|| StageError::Compile {
            file: file.to_path_buf(),
            message: "[compilers].less_command is empty".to_string(),
        })?;

        let command_err = |source| StageError::Command {
            command: self.command.clone(),
            source,
        };

        let mut child = Command::new(program)
            .args(parts)
            .arg(format!("--include-path={}", include_dir.display()))
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(command_err)?;

        // Feed stdin from a separate thread so a full stdout pipe cannot
        // deadlock the write.
        let writer = child.stdin.take().map(|mut stdin| {
            let input = source.to_vec();
            std::thread::spawn(move || stdin.write_all(&input))
        });

        let output = child.wait_with_output().map_err(command_err)?;

        if let Some(handle) = writer {
            if let Ok(Err(e)) = handle.join() {
                debug!(error = %e, "less compiler closed stdin early");
            }
        }

        if !output.status.success() {
            return Err(StageError::Compile {
                file: file.to_path_buf(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Stage for LessCompile {
    fn name(&self) -> &'static str {
        "compile(less)"
    }

    fn apply(&self, mut files: FileSet, ctx: &StageContext) -> Result<FileSet, StageError> {
        for file in &mut files {
            let dir = file.source.parent().unwrap_or(&ctx.root).to_path_buf();
            let css = self.compile(&file.contents, &dir, &file.source)?;
            file.set_text(css);
            file.set_extension("css");
        }
        Ok(files)
    }
}

