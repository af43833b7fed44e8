//! Kindle generator. Builds one reflowable XHTML book (title block, scene TOC,
//! body) with its OPF, NCX and stylesheet, then hands it to the converter.

pub mod kindlegen;

use crate::config::Options;
use crate::generator::markup::{self, xml_escape};
use crate::generator::ncx::NavMap;
use crate::generator::{copy_file, write_file, GenerationError, Generator};
use crate::model::{ElementKind, Screenplay};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

const BOOK_HTML: &str = "book.html";
const OPF: &str = "ebook.opf";
const NCX: &str = "root.ncx";
const CSS: &str = "main.css";
/// Name the converter gives its output for `ebook.opf`.
const ARTIFACT: &str = "ebook.mobi";

const MAIN_CSS: &str = r#".character {
  text-indent: 0em;
  text-align: center;
  margin-top: 10px;
}

.parenthetical {
  font-style: italic;
  font-size: 80%;
}

.dialogue {
}

.sceneheading {
  margin-top: 100px;
  text-indent: 0em;
  font-weight: bold;
}

.action {
  text-indent: 0em;
  margin-top: 10px;
}

.transition {
  text-align: right;
}
"#;

pub struct MobiGenerator<'a> {
    screenplay: &'a Screenplay,
    options: &'a Options,
    date: NaiveDate,
    body: String,
    toc: String,
    nav: NavMap,
}

impl<'a> MobiGenerator<'a> {
    pub fn new(screenplay: &'a Screenplay, options: &'a Options) -> Self {
        MobiGenerator {
            screenplay,
            options,
            date: chrono::Local::now().date_naive(),
            body: String::new(),
            toc: String::new(),
            nav: NavMap::new("titlePage", "title", &format!("{}#title", BOOK_HTML)),
        }
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn toc(&self) -> &str {
        &self.toc
    }

    pub fn nav_map(&self) -> &NavMap {
        &self.nav
    }

    fn identifier(&self) -> String {
        format!("{}-{}", self.date.format("%Y/%m/%d"), self.screenplay.base_name)
    }

    /// Title block, scene list and body assembled into the single book document.
    pub fn book_html(&self) -> String {
        let title = xml_escape(&self.screenplay.title);
        let author = xml_escape(&self.screenplay.author);
        format!(
            r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Strict//EN"
   "http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd">
<html xmlns="http://www.w3.org/1999/xhtml" xml:lang="{lang}">
<head>
  <link rel="stylesheet" href="{css}" type="text/css" />
  <title>{title}</title>
  <meta http-equiv="Content-Type" content="application/xhtml+xml; charset=utf-8" />
</head>
<body>
<div class="document">
<a name="title"/>
<h1 weight="50" class="center">{title}</h1>
<h3 class="right">{author}</h3>
<mbp:pagebreak/>
<a name="TOC"/>
<h2>Scenes</h2>
{toc}<a name="start"/>
<a name="section"/>
<mbp:pagebreak/>
{body}</div>
</body>
</html>
"#,
            lang = xml_escape(&self.options.language),
            css = CSS,
            title = title,
            author = author,
            toc = self.toc,
            body = self.body,
        )
    }

    pub fn opf(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<package version="2.0" unique-identifier="bookId" xmlns="http://www.idpf.org/2007/opf">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:opf="http://www.idpf.org/2007/opf">
    <dc:title>{title}</dc:title>
    <dc:language>{lang}</dc:language>
    <dc:identifier opf:scheme="URI" id="bookId">{id}</dc:identifier>
    <dc:creator opf:role="aut">{author}</dc:creator>
    <dc:publisher>{publisher}</dc:publisher>
    <dc:date opf:event="publication">{date}</dc:date>
    <dc:description>Book generated by {publisher}</dc:description>
    <meta name="cover" content="id-cover-image"/>
  </metadata>
  <manifest>
    <item id="id-cover-image" href="{cover}" media-type="image/jpeg"/>
    <item id="ncx" href="{ncx}" media-type="application/x-dtbncx+xml"/>
    <item id="css-main" href="{css}" media-type="text/css"/>
    <item id="book" href="{book}" media-type="application/xhtml+xml"/>
  </manifest>
  <spine toc="ncx">
    <itemref idref="book"/>
  </spine>
  <guide>
    <reference type="title-page" title="Title Page" href="{book}#title"/>
    <reference type="toc" title="Table of Content" href="{book}#TOC"/>
  </guide>
</package>
"#,
            title = xml_escape(&self.screenplay.title),
            lang = xml_escape(&self.options.language),
            id = xml_escape(&self.identifier()),
            author = xml_escape(&self.screenplay.author),
            publisher = xml_escape(&self.options.publisher),
            date = self.date.format("%Y-%m-%d"),
            cover = xml_escape(&self.screenplay.cover_file_name()),
            ncx = NCX,
            css = CSS,
            book = BOOK_HTML,
        )
    }

    pub fn ncx(&self) -> String {
        self.nav.render(
            &self.identifier(),
            &self.screenplay.title,
            &self.screenplay.author,
        )
    }
}

impl Generator for MobiGenerator<'_> {
    fn body_mut(&mut self) -> &mut String {
        &mut self.body
    }

    fn scene_heading(&mut self, text: &str, anchor: &str, scene: u32) {
        markup::named_anchor(&mut self.body, anchor);
        markup::paragraph(&mut self.body, ElementKind::SceneHeading.css_class(), text);
        self.toc.push_str(&format!(
            "<p width=\"-30\" style=\"text-align: left;\"><a href=\"#{}\">{}</a></p>\n",
            anchor,
            xml_escape(text)
        ));
        self.nav.push_scene(anchor, scene, text, BOOK_HTML);
    }

    fn parenthetical(&mut self, text: &str) {
        markup::double_blockquote(
            &mut self.body,
            ElementKind::Parenthetical.css_class(),
            text,
        );
    }

    fn dialogue(&mut self, text: &str) {
        markup::double_blockquote(&mut self.body, ElementKind::Dialogue.css_class(), text);
    }

    fn finalize(self, scratch: &Path) -> Result<PathBuf, GenerationError> {
        copy_file(
            &self.screenplay.cover,
            &scratch.join(self.screenplay.cover_file_name()),
        )?;
        write_file(&scratch.join(CSS), MAIN_CSS)?;
        write_file(&scratch.join(OPF), self.opf())?;
        write_file(&scratch.join(NCX), self.ncx())?;
        write_file(&scratch.join(BOOK_HTML), self.book_html())?;

        kindlegen::run_converter(&self.options.kindlegen, OPF, scratch, self.options.verbose)?;
        Ok(scratch.join(ARTIFACT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::dispatch;
    use crate::model::Element;
    use std::collections::BTreeSet;

    fn screenplay() -> Screenplay {
        Screenplay::new("pilot.fdx", "T", "A", "art/c.jpg")
    }

    fn sample() -> Vec<Element> {
        vec![
            Element::new(ElementKind::SceneHeading, "INT. HOUSE"),
            Element::new(ElementKind::Action, "He walks in."),
            Element::new(ElementKind::Character, "JOHN"),
            Element::new(ElementKind::Parenthetical, "(beat)"),
            Element::new(ElementKind::Dialogue, "Hello."),
            Element::new(ElementKind::SceneHeading, "EXT. YARD"),
            Element::new(ElementKind::Transition, "FADE OUT."),
        ]
    }

    /// Values of `attr="..."` occurrences whose value starts with `prefix`.
    fn attr_values(markup: &str, attr: &str, prefix: &str) -> BTreeSet<String> {
        let needle = format!("{}=\"{}", attr, prefix);
        markup
            .match_indices(&needle)
            .filter_map(|(i, _)| {
                let start = i + attr.len() + 2;
                markup[start..].find('"').map(|end| markup[start..start + end].to_string())
            })
            .collect()
    }

    #[test]
    fn scene_heading_emits_anchor_toc_line_and_nav_point() {
        let sp = screenplay();
        let options = Options::default();
        let mut generator = MobiGenerator::new(&sp, &options);
        dispatch(&sample(), &mut generator);

        assert!(generator.body().contains("<a name=\"scene_1\"/>\n<p class=\"sceneheading\">INT. HOUSE</p>"));
        assert!(generator.toc().contains("<a href=\"#scene_2\">EXT. YARD</a>"));
        let scenes = generator.nav_map().scenes();
        assert_eq!(scenes.len(), 2);
        assert_eq!(scenes[0].play_order, 1);
        assert_eq!(scenes[1].src, "book.html#scene_2");
    }

    #[test]
    fn toc_and_nav_anchors_match_body_anchors() {
        let sp = screenplay();
        let options = Options::default();
        let mut generator = MobiGenerator::new(&sp, &options);
        dispatch(&sample(), &mut generator);

        let body_anchors = attr_values(generator.body(), "name", "scene_");
        let toc_anchors: BTreeSet<String> = attr_values(generator.toc(), "href", "#scene_")
            .into_iter()
            .map(|a| a.trim_start_matches('#').to_string())
            .collect();
        let nav_anchors: BTreeSet<String> =
            generator.nav_map().scenes().iter().map(|p| p.id.clone()).collect();
        assert_eq!(body_anchors.len(), 2);
        assert_eq!(body_anchors, toc_anchors);
        assert_eq!(body_anchors, nav_anchors);
    }

    #[test]
    fn dialogue_and_parenthetical_are_double_quoted() {
        let sp = screenplay();
        let options = Options::default();
        let mut generator = MobiGenerator::new(&sp, &options);
        dispatch(&sample(), &mut generator);
        assert!(generator
            .body()
            .contains("<blockquote><blockquote class=\"dialogue\">Hello.</blockquote></blockquote>"));
        assert!(generator
            .body()
            .contains("<blockquote><blockquote class=\"parenthetical\">(beat)</blockquote></blockquote>"));
        assert!(generator.body().contains("<p class=\"transition\">FADE OUT.</p>"));
    }

    #[test]
    fn book_html_orders_title_toc_then_body() {
        let sp = Screenplay::new("pilot.fdx", "Tom & Jerry", "A", "c.jpg");
        let options = Options::default();
        let mut generator = MobiGenerator::new(&sp, &options);
        dispatch(&sample(), &mut generator);
        let html = generator.book_html();
        let title = html.find("<a name=\"title\"/>").unwrap();
        let toc = html.find("<a name=\"TOC\"/>").unwrap();
        let first_toc_line = html.find("href=\"#scene_1\"").unwrap();
        let start = html.find("<a name=\"start\"/>").unwrap();
        let first_scene = html.find("<a name=\"scene_1\"/>").unwrap();
        assert!(title < toc && toc < first_toc_line && first_toc_line < start && start < first_scene);
        assert!(html.contains("<title>Tom &amp; Jerry</title>"));
    }

    #[test]
    fn opf_references_cover_by_file_name() {
        let sp = screenplay();
        let options = Options::default();
        let generator = MobiGenerator::new(&sp, &options);
        let opf = generator.opf();
        assert!(opf.contains(r#"href="c.jpg" media-type="image/jpeg""#));
        assert!(opf.contains(r#"<itemref idref="book"/>"#));
        assert!(opf.contains("<dc:publisher>fdx2ebook</dc:publisher>"));
    }

    #[test]
    fn ncx_without_scenes_has_only_title_page() {
        let sp = screenplay();
        let options = Options::default();
        let mut generator = MobiGenerator::new(&sp, &options);
        dispatch(&[Element::new(ElementKind::Action, "Nothing happens.")], &mut generator);
        let ncx = generator.ncx();
        assert_eq!(ncx.matches("<navPoint").count(), 1);
        assert!(ncx.contains(r#"<content src="book.html#title"/>"#));
        assert!(generator.toc().is_empty());
    }
}
