//! fdx2ebook: convert Final Draft (.fdx) screenplays into EPUB and Kindle ebooks.

pub mod cli;
pub mod config;
pub mod epub;
pub mod generator;
pub mod mobi;
pub mod model;
pub mod reader;

// Re-exports for CLI and consumers.
pub use config::Options;
pub use epub::EpubGenerator;
pub use generator::{
    convert, dispatch, scene_anchor, GenerationError, Generator, SceneCounter, Variant,
};
pub use mobi::MobiGenerator;
pub use model::{Document, Element, ElementKind, Screenplay};
pub use reader::{parse_document, read_document, DocumentError};
