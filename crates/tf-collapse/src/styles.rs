//! The shared presentation block: one `<style>` per document.

use crate::config::CollapseConfig;
use tf_core::FoldError;
use tf_core::FoldResult;
use tf_dom::Document;
use tf_dom::NodeId;

const FONT_SIZE: &str = "12px";
const COLOR_TEXT: &str = "#6c757d";
const COLOR_TEXT_HOVER: &str = "#495057";
const COLOR_COUNT: &str = "#007bff";
const COLOR_BG: &str = "#f8f9fa";
const COLOR_BG_HOVER: &str = "#e9ecef";
const COLOR_BORDER: &str = "#dee2e6";
const GLYPH_COLLAPSED: &str = "\u{25b6}";
const GLYPH_EXPANDED: &str = "\u{25bc}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleOutcome {
    AlreadyPresent(NodeId),
    Injected(NodeId),
}

impl StyleOutcome {
    pub fn node(self) -> NodeId {
        match self {
            Self::AlreadyPresent(node) | Self::Injected(node) => node,
        }
    }
}

pub fn stylesheet(config: &CollapseConfig) -> String {
    let button = config.button_class();
    let collapsed = config.button_collapsed_class();
    let expanded = config.button_expanded_class();
    let hidden = config.hidden_class();
    let count = config.count_class();

    format!(
        "
.{button} {{
    display: inline-block;
    cursor: pointer;
    user-select: none;
    font-size: {FONT_SIZE};
    color: {COLOR_TEXT};
    margin-left: 5px;
    padding: 2px 6px;
    border-radius: 3px;
    background-color: {COLOR_BG};
    border: 1px solid {COLOR_BORDER};
    transition: all 0.2s;
}}
.{button}:hover {{
    background-color: {COLOR_BG_HOVER};
    color: {COLOR_TEXT_HOVER};
}}
.{button}.{collapsed}::before {{
    content: '{GLYPH_COLLAPSED} ';
}}
.{button}.{expanded}::before {{
    content: '{GLYPH_EXPANDED} ';
}}
.{hidden} {{
    display: none !important;
}}
.{count} {{
    font-weight: bold;
    color: {COLOR_COUNT};
}}
"
    )
}

/// Adds the presentation block unless one with the reserved id exists.
///
/// The block goes into `<head>`, or the document element when the page has
/// no head.
pub fn ensure_styles(
    document: &mut Document,
    config: &CollapseConfig,
) -> FoldResult<StyleOutcome> {
    let style_id = config.style_id();
    if let Some(existing) = document.get_element_by_id(&style_id) {
        return Ok(StyleOutcome::AlreadyPresent(existing));
    }

    let Some(root) = document.head().or_else(|| document.document_element()) else {
        return Err(FoldError::new(
            "styles.no_root",
            "document has neither a head nor a document element",
        ));
    };

    let style = document.create_element("style");
    document.set_attribute(style, "id", &style_id)?;
    document.set_text_content(style, &stylesheet(config))?;
    document.append_child(root, style)?;
    Ok(StyleOutcome::Injected(style))
}
