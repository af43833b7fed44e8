//! Screenplay data model shared by the reader and the generators.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One conversion run: the source `.fdx` file plus metadata given on the command line.
#[derive(Debug, Clone)]
pub struct Screenplay {
    pub source: PathBuf,
    /// Source file name without the `.fdx` extension. Names the final artifacts.
    pub base_name: String,
    pub title: String,
    pub author: String,
    pub cover: PathBuf,
}

impl Screenplay {
    pub fn new(
        source: impl Into<PathBuf>,
        title: impl Into<String>,
        author: impl Into<String>,
        cover: impl Into<PathBuf>,
    ) -> Self {
        let source = source.into();
        let base_name = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "screenplay".to_string());
        Screenplay {
            source,
            base_name,
            title: title.into(),
            author: author.into(),
            cover: cover.into(),
        }
    }

    /// File name of the cover image as it is referenced inside the packages.
    pub fn cover_file_name(&self) -> String {
        self.cover
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "cover.jpg".to_string())
    }

    /// Final artifact name, e.g. `pilot.epub`.
    pub fn artifact_name(&self, extension: &str) -> String {
        format!("{}.{}", self.base_name, extension)
    }
}

/// The six paragraph kinds a screenplay is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    SceneHeading,
    Action,
    Character,
    Parenthetical,
    Dialogue,
    Transition,
}

impl ElementKind {
    /// Map the `Type` attribute of a Final Draft `Paragraph`.
    pub fn from_fdx_type(value: &str) -> Option<Self> {
        match value {
            "Scene Heading" => Some(ElementKind::SceneHeading),
            "Action" => Some(ElementKind::Action),
            "Character" => Some(ElementKind::Character),
            "Parenthetical" => Some(ElementKind::Parenthetical),
            "Dialogue" => Some(ElementKind::Dialogue),
            "Transition" => Some(ElementKind::Transition),
            _ => None,
        }
    }

    /// CSS class used for this kind in the generated markup.
    pub fn css_class(self) -> &'static str {
        match self {
            ElementKind::SceneHeading => "sceneheading",
            ElementKind::Action => "action",
            ElementKind::Character => "character",
            ElementKind::Parenthetical => "parenthetical",
            ElementKind::Dialogue => "dialogue",
            ElementKind::Transition => "transition",
        }
    }
}

/// One typed paragraph with its concatenated text runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub kind: ElementKind,
    pub text: String,
}

impl Element {
    pub fn new(kind: ElementKind, text: impl Into<String>) -> Self {
        Element {
            kind,
            text: text.into(),
        }
    }
}

/// Reader output: elements in source order plus the paragraph types that were skipped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    pub elements: Vec<Element>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unrecognized: Vec<String>,
}

impl Document {
    pub fn scene_count(&self) -> usize {
        self.elements
            .iter()
            .filter(|e| e.kind == ElementKind::SceneHeading)
            .count()
    }
}

/// True when `path` has the given extension (case-sensitive, without the dot).
pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(extension)
}
