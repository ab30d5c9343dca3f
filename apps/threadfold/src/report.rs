//! Plain-text view of the collapse state of every comment.

use std::fmt::Write;
use tf_collapse::CollapseConfig;
use tf_collapse::ThreadState;
use tf_collapse::button::thread_state;
use tf_collapse::tree::DocumentWalk;
use tf_collapse::tree::all_descendants;
use tf_collapse::tree::parse_depth;
use tf_css::computed_hidden;
use tf_dom::Document;

/// Deeper comments are drawn at this depth.
const MAX_INDENT_DEPTH: i64 = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRow {
    pub id: Option<String>,
    pub depth: i64,
    pub replies: usize,
    pub state: Option<ThreadState>,
    pub hidden: bool,
}

pub fn comment_rows(document: &Document, config: &CollapseConfig) -> Vec<CommentRow> {
    let Some(container) = document.get_element_by_id(&config.container_id) else {
        return Vec::new();
    };
    let walk = DocumentWalk::new(document, config);

    document
        .elements_by_class(container, &config.comment_class)
        .into_iter()
        .map(|node| CommentRow {
            id: document.element_id(node).map(str::to_owned),
            depth: parse_depth(document.get_attribute(node, &config.depth_attribute)),
            replies: all_descendants(&walk, node).len(),
            state: thread_state(document, config, node),
            hidden: computed_hidden(document, node),
        })
        .collect()
}

pub fn render_summary(rows: &[CommentRow]) -> String {
    let mut out = String::new();
    for row in rows {
        let indent = usize::try_from(row.depth.clamp(0, MAX_INDENT_DEPTH)).unwrap_or(0) * 2;
        let state = match row.state {
            Some(ThreadState::Expanded) => "expanded",
            Some(ThreadState::Collapsed) => "collapsed",
            None => "-",
        };
        let _ = writeln!(
            out,
            "{:indent$}{} replies={} toggle={}{}",
            "",
            row.id.as_deref().unwrap_or("(no id)"),
            row.replies,
            state,
            if row.hidden { " hidden" } else { "" },
        );
    }

    let toggles = rows.iter().filter(|row| row.state.is_some()).count();
    let hidden = rows.iter().filter(|row| row.hidden).count();
    let _ = writeln!(
        out,
        "{} comments, {toggles} toggles, {hidden} hidden",
        rows.len()
    );
    out
}
