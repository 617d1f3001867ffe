// src/pipeline/header.rs

use crate::config::HeaderComment;
use crate::pipeline::{FileSet, Stage, StageContext, StageError};

/// `header-inject`: prepend a fixed text to every file.
///
/// With an empty text the stage is a no-op and contents stay byte-identical.
#[derive(Debug, Clone, Default)]
pub struct HeaderInject {
    text: String,
}

impl HeaderInject {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn from_config(header: &HeaderComment) -> Self {
        Self::new(header.text())
    }
}

impl Stage for HeaderInject {
    fn name(&self) -> &'static str {
        "header-inject"
    }

    fn apply(&self, mut files: FileSet, _ctx: &StageContext) -> Result<FileSet, StageError> {
        if self.text.is_empty() {
            return Ok(files);
        }

        for file in &mut files {
            let mut contents = Vec::with_capacity(self.text.len() + file.contents.len());
            contents.extend_from_slice(self.text.as_bytes());
            contents.append(&mut file.contents);
            file.contents = contents;
        }
        Ok(files)
    }
}
