//! Generator protocol: the callback set every output format implements, the
//! dispatcher that drives it from the element list, and the per-variant
//! conversion driver (scratch directory, finalize, artifact copy, cleanup).

mod error;
pub mod markup;
pub mod ncx;

pub use error::GenerationError;

use crate::config::Options;
use crate::epub::EpubGenerator;
use crate::mobi::MobiGenerator;
use crate::model::{Element, ElementKind, Screenplay};
use crate::reader;
use log::debug;
use std::path::{Path, PathBuf};

/// Callbacks invoked once per element, in source order, followed by [`Generator::finalize`].
///
/// The per-kind defaults append `<p class="kind">text</p>` to the body stream;
/// formats override the ones they render differently.
pub trait Generator {
    /// Body markup stream the default callbacks append to.
    fn body_mut(&mut self) -> &mut String;

    fn scene_heading(&mut self, text: &str, anchor: &str, scene: u32);

    fn action(&mut self, text: &str) {
        markup::paragraph(self.body_mut(), ElementKind::Action.css_class(), text);
    }

    fn character(&mut self, text: &str) {
        markup::paragraph(self.body_mut(), ElementKind::Character.css_class(), text);
    }

    fn parenthetical(&mut self, text: &str) {
        markup::paragraph(self.body_mut(), ElementKind::Parenthetical.css_class(), text);
    }

    fn dialogue(&mut self, text: &str) {
        markup::paragraph(self.body_mut(), ElementKind::Dialogue.css_class(), text);
    }

    fn transition(&mut self, text: &str) {
        markup::paragraph(self.body_mut(), ElementKind::Transition.css_class(), text);
    }

    /// Write every part into `scratch` and build the package. Returns the artifact path inside `scratch`.
    fn finalize(self, scratch: &Path) -> Result<PathBuf, GenerationError>
    where
        Self: Sized;
}

/// Running scene number; the first scene heading is scene 1.
#[derive(Debug, Default)]
pub struct SceneCounter {
    current: u32,
}

impl SceneCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance to the next scene and return its number.
    pub fn advance(&mut self) -> u32 {
        self.current += 1;
        self.current
    }

    pub fn current(&self) -> u32 {
        self.current
    }
}

/// Anchor naming a scene in the body, the TOC and the navigation map.
pub fn scene_anchor(scene: u32) -> String {
    format!("scene_{}", scene)
}

/// Feed `elements` to `generator` in order. Returns the number of scenes seen.
pub fn dispatch<G: Generator + ?Sized>(elements: &[Element], generator: &mut G) -> u32 {
    let mut counter = SceneCounter::new();
    for element in elements {
        let text = element.text.as_str();
        match element.kind {
            ElementKind::SceneHeading => {
                let scene = counter.advance();
                generator.scene_heading(text, &scene_anchor(scene), scene);
            }
            ElementKind::Action => generator.action(text),
            ElementKind::Character => generator.character(text),
            ElementKind::Parenthetical => generator.parenthetical(text),
            ElementKind::Dialogue => generator.dialogue(text),
            ElementKind::Transition => generator.transition(text),
        }
    }
    counter.current()
}

/// Output package kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// Kindle book built by the external converter.
    Mobi,
    /// EPUB 2 zip container.
    Epub,
}

impl Variant {
    pub fn extension(self) -> &'static str {
        match self {
            Variant::Mobi => "mobi",
            Variant::Epub => "epub",
        }
    }

    pub fn scratch_dir_name(self) -> &'static str {
        match self {
            Variant::Mobi => "__mobi",
            Variant::Epub => "__epub",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Variant::Mobi => "Kindle",
            Variant::Epub => "Epub",
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Build one output variant from scratch. Returns the path of the final artifact
/// (`<output_dir>/<base_name>.<ext>`).
///
/// Any failure aborts this variant only; nothing is shared with the other one.
pub fn convert(
    variant: Variant,
    screenplay: &Screenplay,
    options: &Options,
) -> Result<PathBuf, GenerationError> {
    match variant {
        Variant::Mobi => generate(
            variant,
            MobiGenerator::new(screenplay, options),
            screenplay,
            options,
        ),
        Variant::Epub => generate(
            variant,
            EpubGenerator::new(screenplay, options),
            screenplay,
            options,
        ),
    }
}

fn generate<G: Generator>(
    variant: Variant,
    mut generator: G,
    screenplay: &Screenplay,
    options: &Options,
) -> Result<PathBuf, GenerationError> {
    let document = reader::read_document(&screenplay.source)?;

    let scratch = options.output_dir.join(variant.scratch_dir_name());
    reset_dir(&scratch)?;

    let scenes = dispatch(&document.elements, &mut generator);
    debug!("{}: dispatched {} scene(s)", variant, scenes);

    let artifact = generator.finalize(&scratch)?;
    if !artifact.is_file() {
        return Err(GenerationError::MissingArtifact { path: artifact });
    }

    let target = options
        .output_dir
        .join(screenplay.artifact_name(variant.extension()));
    copy_file(&artifact, &target)?;
    debug!("{}: copied {} to {}", variant, artifact.display(), target.display());

    if !options.keep_intermediate {
        remove_dir(&scratch)?;
    }
    Ok(target)
}

/// Delete `dir` recursively if present, then create it (and its parents) empty.
pub(crate) fn reset_dir(dir: &Path) -> Result<(), GenerationError> {
    remove_dir(dir)?;
    create_dir(dir)
}

pub(crate) fn remove_dir(dir: &Path) -> Result<(), GenerationError> {
    if dir.is_dir() {
        std::fs::remove_dir_all(dir).map_err(|e| GenerationError::RemoveDir {
            path: dir.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}

pub(crate) fn create_dir(dir: &Path) -> Result<(), GenerationError> {
    std::fs::create_dir_all(dir).map_err(|e| GenerationError::CreateDir {
        path: dir.to_path_buf(),
        source: e,
    })
}

/// Write `contents` to `path`, creating missing parent directories.
pub(crate) fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> Result<(), GenerationError> {
    if let Some(parent) = path.parent() {
        create_dir(parent)?;
    }
    std::fs::write(path, contents).map_err(|e| GenerationError::Write {
        path: path.to_path_buf(),
        source: e,
    })
}

pub(crate) fn copy_file(from: &Path, to: &Path) -> Result<(), GenerationError> {
    if let Some(parent) = to.parent() {
        create_dir(parent)?;
    }
    std::fs::copy(from, to)
        .map(|_| ())
        .map_err(|e| GenerationError::Copy {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source: e,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records every callback as `kind:text` for order checks.
    #[derive(Default)]
    struct Recorder {
        body: String,
        calls: Vec<String>,
    }

    impl Generator for Recorder {
        fn body_mut(&mut self) -> &mut String {
            &mut self.body
        }

        fn scene_heading(&mut self, text: &str, anchor: &str, scene: u32) {
            self.calls.push(format!("scene:{}:{}:{}", text, anchor, scene));
        }

        fn action(&mut self, text: &str) {
            self.calls.push(format!("action:{}", text));
        }

        fn character(&mut self, text: &str) {
            self.calls.push(format!("character:{}", text));
        }

        fn parenthetical(&mut self, text: &str) {
            self.calls.push(format!("parenthetical:{}", text));
        }

        fn dialogue(&mut self, text: &str) {
            self.calls.push(format!("dialogue:{}", text));
        }

        fn transition(&mut self, text: &str) {
            self.calls.push(format!("transition:{}", text));
        }

        fn finalize(self, scratch: &Path) -> Result<PathBuf, GenerationError> {
            Ok(scratch.join("recorded"))
        }
    }

    /// Uses only the default per-kind callbacks.
    #[derive(Default)]
    struct Plain {
        body: String,
    }

    impl Generator for Plain {
        fn body_mut(&mut self) -> &mut String {
            &mut self.body
        }

        fn scene_heading(&mut self, text: &str, anchor: &str, _scene: u32) {
            markup::id_anchor(&mut self.body, anchor);
            markup::paragraph(&mut self.body, "sceneheading", text);
        }

        fn finalize(self, scratch: &Path) -> Result<PathBuf, GenerationError> {
            Ok(scratch.to_path_buf())
        }
    }

    #[test]
    fn scene_counter_starts_at_one() {
        let mut counter = SceneCounter::new();
        assert_eq!(counter.current(), 0);
        assert_eq!(counter.advance(), 1);
        assert_eq!(counter.advance(), 2);
        assert_eq!(scene_anchor(2), "scene_2");
    }

    #[test]
    fn dispatch_calls_one_callback_per_element_in_order() {
        let elements = vec![
            Element::new(ElementKind::SceneHeading, "INT. HOUSE"),
            Element::new(ElementKind::Action, "He walks in."),
            Element::new(ElementKind::Character, "JOHN"),
            Element::new(ElementKind::Parenthetical, "(softly)"),
            Element::new(ElementKind::Dialogue, "Hello."),
            Element::new(ElementKind::Transition, "CUT TO:"),
            Element::new(ElementKind::SceneHeading, "EXT. YARD"),
        ];
        let mut rec = Recorder::default();
        let scenes = dispatch(&elements, &mut rec);
        assert_eq!(scenes, 2);
        assert_eq!(
            rec.calls,
            vec![
                "scene:INT. HOUSE:scene_1:1",
                "action:He walks in.",
                "character:JOHN",
                "parenthetical:(softly)",
                "dialogue:Hello.",
                "transition:CUT TO:",
                "scene:EXT. YARD:scene_2:2",
            ]
        );
    }

    #[test]
    fn dispatch_restarts_numbering_each_pass() {
        let elements = vec![Element::new(ElementKind::SceneHeading, "A")];
        let mut first = Recorder::default();
        let mut second = Recorder::default();
        dispatch(&elements, &mut first);
        dispatch(&elements, &mut second);
        assert_eq!(first.calls, second.calls);
        assert_eq!(second.calls[0], "scene:A:scene_1:1");
    }

    #[test]
    fn default_callbacks_write_styled_paragraphs() {
        let elements = vec![
            Element::new(ElementKind::Action, "Rain & wind."),
            Element::new(ElementKind::Dialogue, "<whispers>"),
        ];
        let mut plain = Plain::default();
        dispatch(&elements, &mut plain);
        assert_eq!(
            plain.body,
            "<p class=\"action\">Rain &amp; wind.</p>\n<p class=\"dialogue\">&lt;whispers&gt;</p>\n"
        );
    }

    #[test]
    fn variant_names() {
        assert_eq!(Variant::Mobi.extension(), "mobi");
        assert_eq!(Variant::Epub.scratch_dir_name(), "__epub");
        assert_eq!(Variant::Mobi.to_string(), "mobi");
    }

    #[test]
    fn reset_dir_removes_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = dir.path().join("__epub");
        write_file(&scratch.join("OPS/stale.xml"), "old").unwrap();
        reset_dir(&scratch).unwrap();
        assert!(scratch.is_dir());
        assert_eq!(std::fs::read_dir(&scratch).unwrap().count(), 0);
    }

    #[test]
    fn convert_reports_document_errors() {
        let dir = tempfile::tempdir().unwrap();
        let screenplay = Screenplay::new(dir.path().join("missing.fdx"), "T", "A", "c.jpg");
        let options = Options {
            output_dir: dir.path().to_path_buf(),
            ..Options::default()
        };
        let result = convert(Variant::Epub, &screenplay, &options);
        assert!(matches!(result, Err(GenerationError::Document(_))));
        assert!(!dir.path().join("missing.epub").exists());
    }
}
