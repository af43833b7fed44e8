//! EPUB 2 generator. Writes cover, title page and content parts with OPF, NCX
//! and stylesheet into the scratch directory, then zips them (mimetype first, stored).

use crate::config::Options;
use crate::generator::markup::{self, xml_escape};
use crate::generator::ncx::NavMap;
use crate::generator::{copy_file, write_file, GenerationError, Generator};
use crate::model::{ElementKind, Screenplay};
use chrono::NaiveDate;
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const MIMETYPE: &[u8] = b"application/epub+zip";

const CONTAINER: &str = "META-INF/container.xml";
const OPF: &str = "OPS/root.opf";
const NCX: &str = "OPS/root.ncx";
const CSS: &str = "OPS/css/main.css";
const COVER_PAGE: &str = "OPS/cover.xml";
const TITLE_PAGE: &str = "OPS/title.xml";
const CONTENT: &str = "OPS/content.xml";
const IMAGES_DIR: &str = "OPS/images";

/// Content file name as seen from the OPS directory (NCX and OPF hrefs).
const CONTENT_HREF: &str = "content.xml";

const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OPS/root.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>
"#;

const MAIN_CSS: &str = r#"p {
    line-height:120%;
    margin: 0px;
    padding: 0px;
}

.coverTitle {
    margin: 10px;
    padding: 10px;
    height: 150px;
    font-size:250%;
    text-align: center;
}

.coverAuthor {
    margin: 10px;
    padding: 10px;
    height: 150px;
    text-align: right;
}

.character {
  text-indent: 0em;
  text-align: center;
  margin-top: 10px;
}

.parenthetical {
  margin-left: 50px;
  text-indent: 0em;
  font-style: italic;
  font-size: 80%;
}

.dialogue {
  margin-left: 50px;
  text-indent: 0em;
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

pub struct EpubGenerator<'a> {
    screenplay: &'a Screenplay,
    options: &'a Options,
    date: NaiveDate,
    body: String,
    nav: NavMap,
}

impl<'a> EpubGenerator<'a> {
    pub fn new(screenplay: &'a Screenplay, options: &'a Options) -> Self {
        EpubGenerator {
            screenplay,
            options,
            date: chrono::Local::now().date_naive(),
            body: String::new(),
            nav: NavMap::new("titlepage", "id-000", "title.xml"),
        }
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn nav_map(&self) -> &NavMap {
        &self.nav
    }

    fn identifier(&self) -> String {
        format!("{}-{}", self.date.format("%Y/%m/%d"), self.screenplay.base_name)
    }

    fn cover_href(&self) -> String {
        format!("images/{}", self.screenplay.cover_file_name())
    }

    /// XHTML page wrapping `body`, styled with the shared stylesheet.
    fn page(&self, title: &str, body_attrs: &str, body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml" xml:lang="{lang}">
<head>
  <link rel="stylesheet" href="css/main.css" type="text/css" />
  <title>{title}</title>
  <meta http-equiv="Content-Type" content="application/xhtml+xml; charset=utf-8" />
</head>
<body{body_attrs}>
<div class="document">
{body}</div>
</body>
</html>
"#,
            lang = xml_escape(&self.options.language),
            title = xml_escape(title),
            body_attrs = body_attrs,
            body = body,
        )
    }

    pub fn title_page(&self) -> String {
        let body = format!(
            "<p class=\"coverTitle\">{}</p>\n<p class=\"coverAuthor\">{}</p>\n",
            xml_escape(&self.screenplay.title),
            xml_escape(&self.screenplay.author)
        );
        self.page("Title Page", "", &body)
    }

    pub fn cover_page(&self) -> String {
        let body = format!(
            r#"<div style="text-align: center; page-break-after: always;">
 <img src="{}" alt="cover" style="height: 100%; max-width: 100%;"/>
</div>
"#,
            xml_escape(&self.cover_href())
        );
        self.page(
            "Cover",
            r#" style="margin: 0; padding: 0; text-align: center;""#,
            &body,
        )
    }

    pub fn content_page(&self) -> String {
        self.page(&self.screenplay.title, "", &self.body)
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
    <meta name="cover" content="cover-image"/>
  </metadata>
  <manifest>
    <item id="cover" href="cover.xml" media-type="application/xhtml+xml"/>
    <item id="cover-image" href="{cover}" media-type="image/jpeg"/>
    <item id="titlepage" href="title.xml" media-type="application/xhtml+xml"/>
    <item id="css-main" href="css/main.css" media-type="text/css"/>
    <item id="content" href="{content}" media-type="application/xhtml+xml"/>
    <item id="ncx" href="root.ncx" media-type="application/x-dtbncx+xml"/>
  </manifest>
  <spine toc="ncx">
    <itemref idref="cover"/>
    <itemref idref="titlepage"/>
    <itemref idref="content"/>
  </spine>
  <guide>
    <reference type="cover" title="Cover" href="cover.xml"/>
    <reference type="title-page" title="Title Page" href="title.xml"/>
    <reference type="text" title="{title}" href="{content}"/>
  </guide>
</package>
"#,
            title = xml_escape(&self.screenplay.title),
            lang = xml_escape(&self.options.language),
            id = xml_escape(&self.identifier()),
            author = xml_escape(&self.screenplay.author),
            publisher = xml_escape(&self.options.publisher),
            date = self.date.format("%Y-%m-%d"),
            cover = xml_escape(&self.cover_href()),
            content = CONTENT_HREF,
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

impl Generator for EpubGenerator<'_> {
    fn body_mut(&mut self) -> &mut String {
        &mut self.body
    }

    fn scene_heading(&mut self, text: &str, anchor: &str, scene: u32) {
        markup::id_anchor(&mut self.body, anchor);
        markup::paragraph(&mut self.body, ElementKind::SceneHeading.css_class(), text);
        self.nav.push_scene(anchor, scene, text, CONTENT_HREF);
    }

    fn finalize(self, scratch: &Path) -> Result<PathBuf, GenerationError> {
        let cover_entry = format!("{}/{}", IMAGES_DIR, self.screenplay.cover_file_name());
        copy_file(&self.screenplay.cover, &scratch.join(&cover_entry))?;

        let parts = [
            (CONTAINER, CONTAINER_XML.to_string()),
            (OPF, self.opf()),
            (NCX, self.ncx()),
            (CSS, MAIN_CSS.to_string()),
            (COVER_PAGE, self.cover_page()),
            (TITLE_PAGE, self.title_page()),
            (CONTENT, self.content_page()),
        ];
        for (name, contents) in &parts {
            write_file(&scratch.join(name), contents)?;
        }

        let mut entries: Vec<String> = parts.iter().map(|(name, _)| name.to_string()).collect();
        entries.push(cover_entry);

        let artifact = scratch.join(self.screenplay.artifact_name("epub"));
        write_package(scratch, &entries, &artifact)?;
        Ok(artifact)
    }
}

/// Zip `entries` (paths relative to `scratch`) into `artifact`, after an
/// uncompressed `mimetype` entry as the container format requires.
pub fn write_package(
    scratch: &Path,
    entries: &[String],
    artifact: &Path,
) -> Result<(), GenerationError> {
    let write_error = |e: std::io::Error| GenerationError::Write {
        path: artifact.to_path_buf(),
        source: e,
    };

    let file = std::fs::File::create(artifact).map_err(write_error)?;
    let mut zip = ZipWriter::new(file);

    let options_stored = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored)
        .unix_permissions(0o644);
    let options_deflate = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .unix_permissions(0o644);

    zip.start_file("mimetype", options_stored)?;
    zip.write_all(MIMETYPE).map_err(write_error)?;

    for entry in entries {
        let path = scratch.join(entry);
        let data = std::fs::read(&path).map_err(|e| GenerationError::Write {
            path: path.clone(),
            source: e,
        })?;
        zip.start_file(entry.as_str(), options_deflate)?;
        zip.write_all(&data).map_err(write_error)?;
    }

    zip.finish()?;
    Ok(())
}
