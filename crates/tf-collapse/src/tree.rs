//! Thread reconstruction from a flat, depth-tagged sibling list.
//!
//! The host page renders every comment as a sibling inside one container and
//! encodes nesting only through a depth attribute. A comment's replies are
//! the comments that follow it with a greater depth, up to the next comment
//! at its own depth or shallower. Jumps of more than one level are accepted
//! as-is: a comment two levels deeper is nobody's direct child.

use crate::config::CollapseConfig;
use tf_dom::Document;
use tf_dom::NodeId;

/// Forward walk over the sibling sequence a thread is encoded in.
pub trait SiblingWalk {
    type Item: Copy;

    fn next_sibling(&self, item: Self::Item) -> Option<Self::Item>;

    /// Non-comment siblings are skipped by the walk.
    fn is_comment(&self, item: Self::Item) -> bool;

    fn depth(&self, item: Self::Item) -> i64;
}

/// Comments that are exactly one level below `node`, in order.
pub fn direct_children<W>(walk: &W, node: W::Item) -> Vec<W::Item>
where
    W: SiblingWalk + ?Sized,
{
    let depth = walk.depth(node);
    let mut children = Vec::new();
    let mut cursor = walk.next_sibling(node);

    while let Some(item) = cursor {
        if walk.is_comment(item) {
            let next_depth = walk.depth(item);
            if next_depth <= depth {
                break;
            }
            if next_depth == depth.saturating_add(1) {
                children.push(item);
            }
        }
        cursor = walk.next_sibling(item);
    }

    children
}

/// Every reply below `node`, each child followed by its own replies.
pub fn all_descendants<W>(walk: &W, node: W::Item) -> Vec<W::Item>
where
    W: SiblingWalk + ?Sized,
{
    let mut out = Vec::new();
    let mut stack = direct_children(walk, node);
    stack.reverse();

    while let Some(item) = stack.pop() {
        out.push(item);
        let mut children = direct_children(walk, item);
        children.reverse();
        stack.extend(children);
    }

    out
}

/// Leading-integer parse of a depth attribute; anything unreadable is 0.
pub fn parse_depth(raw: Option<&str>) -> i64 {
    let Some(raw) = raw else {
        return 0;
    };
    let trimmed = raw.trim_start();
    let (sign, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1, &trimmed[1..]),
        Some(b'+') => (1, &trimmed[1..]),
        _ => (1, trimmed),
    };
    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end]
        .parse::<i64>()
        .map(|value| sign * value)
        .unwrap_or(0)
}

/// The live document, read through the configured host contract.
#[derive(Debug, Clone, Copy)]
pub struct DocumentWalk<'a> {
    document: &'a Document,
    config: &'a CollapseConfig,
}

impl<'a> DocumentWalk<'a> {
    pub fn new(document: &'a Document, config: &'a CollapseConfig) -> Self {
        Self { document, config }
    }
}

impl SiblingWalk for DocumentWalk<'_> {
    type Item = NodeId;

    fn next_sibling(&self, item: NodeId) -> Option<NodeId> {
        self.document.next_element_sibling(item)
    }

    fn is_comment(&self, item: NodeId) -> bool {
        self.document.has_class(item, &self.config.comment_class)
    }

    fn depth(&self, item: NodeId) -> i64 {
        parse_depth(self.document.get_attribute(item, &self.config.depth_attribute))
    }
}

/// In-memory sequence: `Some(depth)` for a comment, `None` for any other
/// sibling. Items are indices.
impl SiblingWalk for [Option<i64>] {
    type Item = usize;

    fn next_sibling(&self, item: usize) -> Option<usize> {
        let next = item.saturating_add(1);
        (next < self.len()).then_some(next)
    }

    fn is_comment(&self, item: usize) -> bool {
        matches!(self.get(item), Some(Some(_)))
    }

    fn depth(&self, item: usize) -> i64 {
        self.get(item).copied().flatten().unwrap_or(0)
    }
}
