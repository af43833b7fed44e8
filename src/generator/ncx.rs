//! NCX navigation map: a fixed title-page point followed by one point per scene.

use super::markup::xml_escape;

/// One `navPoint` of the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavPoint {
    pub id: String,
    pub class: Option<&'static str>,
    pub play_order: u32,
    pub label: String,
    pub src: String,
}

#[derive(Debug, Clone)]
pub struct NavMap {
    title_page: NavPoint,
    scenes: Vec<NavPoint>,
}

impl NavMap {
    /// `class` and `id` of the title-page point differ between Kindle and EPUB readers.
    pub fn new(class: &'static str, id: &str, src: &str) -> Self {
        NavMap {
            title_page: NavPoint {
                id: id.to_string(),
                class: Some(class),
                play_order: 0,
                label: "Title Page".to_string(),
                src: src.to_string(),
            },
            scenes: Vec::new(),
        }
    }

    /// `document` is the content file the anchor lives in.
    pub fn push_scene(&mut self, anchor: &str, play_order: u32, label: &str, document: &str) {
        self.scenes.push(NavPoint {
            id: anchor.to_string(),
            class: None,
            play_order,
            label: label.to_string(),
            src: format!("{}#{}", document, anchor),
        });
    }

    pub fn scenes(&self) -> &[NavPoint] {
        &self.scenes
    }

    /// All points in play order, title page first.
    pub fn points(&self) -> impl Iterator<Item = &NavPoint> {
        std::iter::once(&self.title_page).chain(self.scenes.iter())
    }

    pub fn render(&self, uid: &str, title: &str, author: &str) -> String {
        let mut nav_points = String::new();
        for point in self.points() {
            let class_attr = point
                .class
                .map(|c| format!(" class=\"{}\"", c))
                .unwrap_or_default();
            nav_points.push_str(&format!(
                r#"    <navPoint{} id="{}" playOrder="{}">
      <navLabel>
        <text>{}</text>
      </navLabel>
      <content src="{}"/>
    </navPoint>
"#,
                class_attr,
                xml_escape(&point.id),
                point.play_order,
                xml_escape(&point.label),
                xml_escape(&point.src)
            ));
        }
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE ncx PUBLIC "-//NISO//DTD ncx 2005-1//EN"
"http://www.daisy.org/z3986/2005/ncx-2005-1.dtd">
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1" xml:lang="en-us">
  <head>
    <meta name="dtb:uid" content="{}"/>
    <meta name="dtb:depth" content="1"/>
    <meta name="dtb:totalPageCount" content="0"/>
    <meta name="dtb:maxPageNumber" content="0"/>
  </head>
  <docTitle>
    <text>{}</text>
  </docTitle>
  <docAuthor>
    <text>{}</text>
  </docAuthor>
  <navMap>
{}  </navMap>
</ncx>
"#,
            xml_escape(uid),
            xml_escape(title),
            xml_escape(author),
            nav_points
        )
    }
}
