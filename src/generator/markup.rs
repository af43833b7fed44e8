//! Small XHTML builders shared by both generators. Every helper escapes its text.

pub fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

pub fn paragraph(out: &mut String, class: &str, text: &str) {
    out.push_str(&format!("<p class=\"{}\">{}</p>\n", class, xml_escape(text)));
}

/// Reflowable-reader quoting: two nested blockquotes, the inner one styled.
pub fn double_blockquote(out: &mut String, class: &str, text: &str) {
    out.push_str(&format!(
        "<blockquote><blockquote class=\"{}\">{}</blockquote></blockquote>\n",
        class,
        xml_escape(text)
    ));
}

/// Kindle-style named anchor.
pub fn named_anchor(out: &mut String, name: &str) {
    out.push_str(&format!("<a name=\"{}\"/>\n", name));
}

/// XHTML id anchor.
pub fn id_anchor(out: &mut String, id: &str) {
    out.push_str(&format!("<a id=\"{}\"/>\n", id));
}
