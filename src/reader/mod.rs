//! Final Draft (.fdx) reader. Turns `FinalDraft/Content/Paragraph` nodes into typed elements.

mod error;

pub use error::DocumentError;

use crate::model::{Document, Element, ElementKind};
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use log::{debug, warn};
use std::borrow::Cow;
use std::path::Path;

const ROOT: &str = "FinalDraft";
const CONTENT: &str = "Content";
const PARAGRAPH: &str = "Paragraph";
const TEXT: &str = "Text";
const TYPE_ATTR: &str = "Type";

/// Load and parse a screenplay from disk.
///
/// The bytes are decoded to UTF-8 first: a byte order mark wins, then the
/// `encoding` of the XML declaration, then UTF-8.
pub fn read_document(path: &Path) -> Result<Document, DocumentError> {
    let bytes = std::fs::read(path).map_err(|e| DocumentError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let xml = decode_xml(&bytes);
    let document = parse_document(&xml)?;
    debug!(
        "Read {} element(s), {} scene(s) from {}",
        document.elements.len(),
        document.scene_count(),
        path.display()
    );
    Ok(document)
}

fn decode_xml(bytes: &[u8]) -> Cow<'_, str> {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return encoding.decode_with_bom_removal(bytes).0;
    }
    let declared = declared_encoding(bytes).and_then(|label| Encoding::for_label(label.as_bytes()));
    let encoding = declared.unwrap_or(UTF_8);
    let (text, malformed) = encoding.decode_without_bom_handling(bytes);
    if malformed && declared.is_none() {
        debug!("Screenplay is not valid UTF-8 and declares no encoding; reading it as windows-1252");
        return WINDOWS_1252.decode_without_bom_handling(bytes).0;
    }
    text
}

/// `encoding="..."` from the XML declaration, if the document starts with one.
fn declared_encoding(bytes: &[u8]) -> Option<&str> {
    let head = &bytes[..bytes.len().min(100)];
    let decl = head.strip_prefix(b"<?xml")?;
    let decl = &decl[..decl.windows(2).position(|w| w == b"?>")?];
    let at = decl
        .windows(9)
        .position(|w| w.eq_ignore_ascii_case(b"encoding="))?;
    let value = &decl[at + 9..];
    let quote = *value.first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let end = value[1..].iter().position(|&b| b == quote)?;
    std::str::from_utf8(&value[1..end + 1]).ok()
}

/// Parse Final Draft XML already in memory.
///
/// Paragraphs with an unknown or missing `Type` are skipped and listed in
/// [`Document::unrecognized`]; they never abort the parse.
pub fn parse_document(xml: &str) -> Result<Document, DocumentError> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    let tree = roxmltree::Document::parse_with_options(xml, options)
        .map_err(|e| DocumentError::Xml { source: e })?;

    let root = tree.root_element();
    if !root.has_tag_name(ROOT) {
        return Err(DocumentError::NotFinalDraft {
            found: root.tag_name().name().to_string(),
        });
    }

    let mut document = Document::default();
    let paragraphs = root
        .children()
        .filter(|n| n.has_tag_name(CONTENT))
        .flat_map(|content| content.children().filter(|n| n.has_tag_name(PARAGRAPH)));

    for paragraph in paragraphs {
        let type_name = paragraph.attribute(TYPE_ATTR).unwrap_or("");
        let Some(kind) = ElementKind::from_fdx_type(type_name) else {
            warn!("Skipping paragraph of unsupported type '{}'", type_name);
            document.unrecognized.push(type_name.to_string());
            continue;
        };
        document.elements.push(Element::new(kind, paragraph_text(paragraph)));
    }

    Ok(document)
}

/// Concatenate every `Text` run under a paragraph, in document order.
fn paragraph_text(paragraph: roxmltree::Node<'_, '_>) -> String {
    paragraph
        .children()
        .filter(|n| n.has_tag_name(TEXT))
        .flat_map(|run| run.descendants().filter(|n| n.is_text()))
        .filter_map(|n| n.text())
        .collect()
}
