//! HTML tokenization, tree building and serialization.

mod serialize;
mod tokenizer;

pub use serialize::serialize;
pub use serialize::serialize_children;

use tf_core::FoldResult;
use tf_dom::Document;
use tf_dom::NodeId;
use tf_dom::Page;
use tokenizer::Token;

/// Parses raw HTML into a DOM document.
#[derive(Debug, Default)]
pub struct HtmlParser;

impl HtmlParser {
    pub fn parse(&self, input: &str) -> FoldResult<Document> {
        let mut document = Document::new();
        build_tree(&mut document, Document::ROOT, tokenizer::tokenize(input))?;
        Ok(document)
    }

    /// Parses `input` into a page that is still in the loading phase, the
    /// state scripts see when they run from `<head>`.
    pub fn parse_page(&self, input: &str) -> FoldResult<Page> {
        self.parse(input).map(Page::loading)
    }

    /// Parses a fragment into detached nodes owned by `document`, returned
    /// in source order and ready to be inserted anywhere.
    pub fn parse_fragment(
        &self,
        document: &mut Document,
        input: &str,
    ) -> FoldResult<Vec<NodeId>> {
        let scratch = document.create_element("template");
        build_tree(document, scratch, tokenizer::tokenize(input))?;

        let nodes = document.children(scratch).to_vec();
        for node in &nodes {
            document.remove_child(scratch, *node)?;
        }
        Ok(nodes)
    }
}

fn build_tree(document: &mut Document, root: NodeId, tokens: Vec<Token>) -> FoldResult<()> {
    let mut stack = vec![(root, String::new())];

    for token in tokens {
        let parent = stack.last().map(|(node, _)| *node).unwrap_or(root);
        match token {
            Token::Text(text) => {
                let node = document.create_text_node(text);
                document.append_child(parent, node)?;
            }
            Token::Start {
                name,
                attrs,
                self_closing,
            } => {
                let element = document.create_element(&name);
                for (attr, value) in &attrs {
                    document.set_attribute(element, attr, value)?;
                }
                document.append_child(parent, element)?;

                if !self_closing && !tokenizer::is_void(&name) {
                    stack.push((element, name));
                }
            }
            Token::End { name } => {
                // End tags without a matching open element are dropped;
                // otherwise every element opened after the match is closed.
                let Some(depth) = stack
                    .iter()
                    .skip(1)
                    .rposition(|(_, open)| *open == name)
                else {
                    continue;
                };
                stack.truncate(depth + 1);
            }
        }
    }

    Ok(())
}
