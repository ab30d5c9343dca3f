//! Stylesheet parsing and a small visibility matcher over class selectors.

mod parser;

pub use parser::CssParser;

use core::fmt;
use tf_dom::Document;
use tf_dom::NodeId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssDeclaration {
    pub name: String,
    pub value: String,
    pub important: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssRule {
    pub selectors: Vec<String>,
    pub declarations: Vec<CssDeclaration>,
}

impl fmt::Display for CssRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{", self.selectors.join(","))?;
        for (index, declaration) in self.declarations.iter().enumerate() {
            if index > 0 {
                f.write_str(";")?;
            }
            write!(f, "{}:{}", declaration.name, declaration.value)?;
            if declaration.important {
                f.write_str(" !important")?;
            }
        }
        f.write_str("}")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleSheet {
    pub rules: Vec<CssRule>,
}

impl StyleSheet {
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Winning `display` value for an element carrying `classes`.
    ///
    /// Only compound class selectors (`.a.b`) take part; anything with a
    /// type, id, combinator or pseudo part is ignored. Important beats
    /// normal, then more classes beat fewer, then later beats earlier.
    pub fn display_for(&self, classes: &[&str]) -> Option<&str> {
        let mut winner: Option<((bool, usize, usize), &str)> = None;
        let mut order = 0_usize;

        for rule in &self.rules {
            for selector in &rule.selectors {
                let Some(required) = compound_classes(selector) else {
                    continue;
                };
                if !required.iter().all(|class| classes.contains(class)) {
                    continue;
                }

                for declaration in rule.declarations.iter().filter(|d| d.name == "display") {
                    order = order.saturating_add(1);
                    let rank = (declaration.important, required.len(), order);
                    if winner.is_none_or(|(best, _)| rank > best) {
                        winner = Some((rank, declaration.value.as_str()));
                    }
                }
            }
        }

        winner.map(|(_, value)| value)
    }

    pub fn hides(&self, classes: &[&str]) -> bool {
        self.display_for(classes)
            .is_some_and(|value| value.eq_ignore_ascii_case("none"))
    }
}

/// Every `<style>` block in the document, parsed as one sheet in order.
pub fn document_styles(document: &Document) -> StyleSheet {
    let source = document
        .descendants(Document::ROOT)
        .into_iter()
        .filter(|node| document.tag_name(*node) == Some("style"))
        .map(|node| document.text_content(node))
        .collect::<Vec<_>>()
        .join("\n");
    CssParser.parse(&source)
}

/// Whether `node` or one of its ancestors is `display: none` under the
/// document's own stylesheets.
pub fn computed_hidden(document: &Document, node: NodeId) -> bool {
    let sheet = document_styles(document);
    let mut cursor = Some(node);
    while let Some(current) = cursor {
        if document.is_element(current) && sheet.hides(&document.class_names(current)) {
            return true;
        }
        cursor = document.parent(current);
    }
    false
}

fn compound_classes(selector: &str) -> Option<Vec<&str>> {
    let rest = selector.strip_prefix('.')?;
    let classes: Vec<&str> = rest.split('.').collect();
    let valid = classes.iter().all(|class| {
        !class.is_empty()
            && class
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_'))
    });
    valid.then_some(classes)
}
