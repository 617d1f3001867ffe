use std::fmt;
use std::str::FromStr;

/// Resource category: the unit at which output folders and pipelines are
/// defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Styles,
    Scripts,
    Images,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Styles, Category::Scripts, Category::Images];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Styles => "styles",
            Category::Scripts => "scripts",
            Category::Images => "images",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "styles" => Ok(Category::Styles),
            "scripts" => Ok(Category::Scripts),
            "images" => Ok(Category::Images),
            other => Err(other.to_string()),
        }
    }
}

/// Key space of `[paths.input]` / `[paths.watch]`.
///
/// Both style dialects map onto [`Category::Styles`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceKind {
    Less,
    Scss,
    Scripts,
    Images,
}

impl SourceKind {
    pub const ALL: [SourceKind; 4] = [
        SourceKind::Less,
        SourceKind::Scss,
        SourceKind::Scripts,
        SourceKind::Images,
    ];

    pub fn category(&self) -> Category {
        match self {
            SourceKind::Less | SourceKind::Scss => Category::Styles,
            SourceKind::Scripts => Category::Scripts,
            SourceKind::Images => Category::Images,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Less => "less",
            SourceKind::Scss => "scss",
            SourceKind::Scripts => "scripts",
            SourceKind::Images => "images",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which style dialect the `styles` task compiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preprocessor {
    Less,
    Scss,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Preprocessor::Less
    }
}

impl Preprocessor {
    pub fn source_kind(&self) -> SourceKind {
        match self {
            Preprocessor::Less => SourceKind::Less,
            Preprocessor::Scss => SourceKind::Scss,
        }
    }
}

impl fmt::Display for Preprocessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.source_kind().as_str())
    }
}

impl FromStr for Preprocessor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "less" => Ok(Preprocessor::Less),
            "scss" | "sass" => Ok(Preprocessor::Scss),
            other => Err(format!(
                "invalid css_preprocessor: {other} (expected \"less\" or \"scss\")"
            )),
        }
    }
}
