//! Outer-HTML serialization.

use crate::tokenizer::is_raw_text_tag;
use crate::tokenizer::is_void;
use tf_dom::Document;
use tf_dom::NodeId;
use tf_dom::NodeKind;

/// Serializes `node` and its subtree. The document node serializes as its
/// children.
pub fn serialize(document: &Document, node: NodeId) -> String {
    let mut out = String::new();
    write_node(document, node, false, &mut out);
    out
}

pub fn serialize_children(document: &Document, node: NodeId) -> String {
    let mut out = String::new();
    let raw = document.tag_name(node).is_some_and(is_raw_text_tag);
    for child in document.children(node) {
        write_node(document, *child, raw, &mut out);
    }
    out
}

fn write_node(document: &Document, node: NodeId, raw_text: bool, out: &mut String) {
    match document.kind(node) {
        Ok(NodeKind::Document) => out.push_str(&serialize_children(document, node)),
        Ok(NodeKind::Text(text)) => {
            if raw_text {
                out.push_str(text);
            } else {
                escape_into(text, false, out);
            }
        }
        Ok(NodeKind::Element(data)) => {
            out.push('<');
            out.push_str(&data.tag);
            for (name, value) in &data.attributes {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                escape_into(value, true, out);
                out.push('"');
            }
            out.push('>');

            if is_void(&data.tag) {
                return;
            }

            out.push_str(&serialize_children(document, node));
            out.push_str("</");
            out.push_str(&data.tag);
            out.push('>');
        }
        Err(_) => {}
    }
}

fn escape_into(input: &str, attribute: bool, out: &mut String) {
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::serialize;
    use crate::HtmlParser;
    use tf_dom::Document;

    #[test]
    fn round_trips_markup_structure() {
        let html = r#"<div id="c1" class="comment" data-level="0"><br><span>a &amp; b</span></div>"#;
        let Ok(doc) = HtmlParser.parse(html) else {
            panic!("parse failed");
        };
        assert_eq!(serialize(&doc, Document::ROOT), html);
    }

    #[test]
    fn escapes_script_free_text_but_not_style_bodies() {
        let mut doc = Document::new();
        let span = doc.create_element("span");
        let style = doc.create_element("style");
        let _ = doc.append_child(Document::ROOT, span);
        let _ = doc.append_child(Document::ROOT, style);
        let _ = doc.set_text_content(span, "<b>not markup</b>");
        let _ = doc.set_text_content(style, ".a > .b{}");
        let _ = doc.set_attribute(span, "title", "say \"hi\"");

        assert_eq!(
            serialize(&doc, Document::ROOT),
            "<span title=\"say &quot;hi&quot;\">&lt;b&gt;not markup&lt;/b&gt;</span><style>.a > .b{}</style>"
        );
    }
}
