//! Per-comment toggle: creation, click handling and the fold itself.

use crate::config::CollapseConfig;
use crate::tree::DocumentWalk;
use crate::tree::all_descendants;
use std::rc::Rc;
use tf_core::FoldResult;
use tf_dom::Document;
use tf_dom::Event;
use tf_dom::EventKind;
use tf_dom::EventListener;
use tf_dom::NodeId;

/// What [`attach`] did with one comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachOutcome {
    NotAnElement,
    AlreadyAttached,
    NoControls,
    NoReplies,
    Attached { descendants: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadState {
    Expanded,
    Collapsed,
}

/// Result of one fold or unfold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleReport {
    pub state: ThreadState,
    pub applied: usize,
    /// Stored ids that no longer resolve to an element.
    pub skipped: usize,
}

/// Gives `node` a toggle for its replies, once.
///
/// The existing toggle is found by looking for the button class under the
/// comment, so a toggle added by an earlier scan or another copy of this
/// script is respected.
pub fn attach(
    document: &mut Document,
    config: &Rc<CollapseConfig>,
    node: NodeId,
) -> FoldResult<AttachOutcome> {
    if !document.is_element(node) {
        return Ok(AttachOutcome::NotAnElement);
    }
    if find_button(document, config, node).is_some() {
        return Ok(AttachOutcome::AlreadyAttached);
    }
    let Some(controls) = document.first_by_class(node, &config.controls_class) else {
        return Ok(AttachOutcome::NoControls);
    };

    let descendants = all_descendants(&DocumentWalk::new(document, config), node);
    if descendants.is_empty() {
        return Ok(AttachOutcome::NoReplies);
    }

    let ids: Vec<&str> = descendants
        .iter()
        .filter_map(|descendant| document.element_id(*descendant))
        .collect();
    if !ids.is_empty() {
        let joined = ids.join(",");
        document.set_attribute(node, &config.descendants_attribute(), &joined)?;
    }

    let count = descendants.len();
    let button = build_button(document, config, count)?;
    let listener = click_listener(config, node, button);
    document.add_event_listener(button, EventKind::Click, listener)?;

    let first = document.first_child(controls);
    document.insert_before(controls, button, first)?;

    Ok(AttachOutcome::Attached { descendants: count })
}

/// Folds or unfolds the thread under `node`.
///
/// Descendants are resolved by stored id at click time; ids whose element is
/// gone are counted in `skipped` and do not stop the others.
pub fn toggle(
    document: &mut Document,
    config: &CollapseConfig,
    node: NodeId,
    button: NodeId,
) -> FoldResult<ToggleReport> {
    let thread_class = config.thread_collapsed_class();
    let was_collapsed = document.has_class(node, &thread_class);
    let collapse = !was_collapsed;

    let ids: Vec<String> = document
        .get_attribute(node, &config.descendants_attribute())
        .map(|value| {
            value
                .split(',')
                .filter(|id| !id.is_empty())
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default();

    document.toggle_class(node, &thread_class, Some(collapse))?;
    document.toggle_class(button, &config.button_collapsed_class(), Some(collapse))?;
    document.toggle_class(button, &config.button_expanded_class(), Some(!collapse))?;

    let hidden_class = config.hidden_class();
    let mut report = ToggleReport {
        state: if collapse {
            ThreadState::Collapsed
        } else {
            ThreadState::Expanded
        },
        applied: 0,
        skipped: 0,
    };
    for id in &ids {
        let Some(element) = document.get_element_by_id(id) else {
            report.skipped = report.skipped.saturating_add(1);
            continue;
        };
        match document.toggle_class(element, &hidden_class, Some(collapse)) {
            Ok(_) => report.applied = report.applied.saturating_add(1),
            Err(error) => {
                report.skipped = report.skipped.saturating_add(1);
                tracing::debug!(id = id.as_str(), %error, "descendant not toggled");
            }
        }
    }

    Ok(report)
}

/// `None` when `node` has no toggle.
pub fn thread_state(
    document: &Document,
    config: &CollapseConfig,
    node: NodeId,
) -> Option<ThreadState> {
    find_button(document, config, node)?;
    if document.has_class(node, &config.thread_collapsed_class()) {
        Some(ThreadState::Collapsed)
    } else {
        Some(ThreadState::Expanded)
    }
}

pub fn find_button(document: &Document, config: &CollapseConfig, node: NodeId) -> Option<NodeId> {
    document.first_by_class(node, &config.button_class())
}

/// `<span class="btn expanded" title=".."><span class="count">N</span> noun</span>`,
/// built from text nodes only.
fn build_button(
    document: &mut Document,
    config: &CollapseConfig,
    count: usize,
) -> FoldResult<NodeId> {
    let button = document.create_element("span");
    document.add_class(button, &config.button_class())?;
    document.add_class(button, &config.button_expanded_class())?;
    document.set_attribute(button, "title", &config.button_title)?;

    let count_span = document.create_element("span");
    document.add_class(count_span, &config.count_class())?;
    document.set_text_content(count_span, &count.to_string())?;
    document.append_child(button, count_span)?;

    let noun = document.create_text_node(format!(" {}", config.nouns.pick(count)));
    document.append_child(button, noun)?;

    Ok(button)
}

fn click_listener(config: &Rc<CollapseConfig>, node: NodeId, button: NodeId) -> EventListener {
    let config = Rc::clone(config);
    Rc::new(move |document: &mut Document, event: &mut Event| -> FoldResult<()> {
        event.prevent_default();
        event.stop_propagation();

        match toggle(document, &config, node, button) {
            Ok(report) => tracing::debug!(
                node,
                state = ?report.state,
                applied = report.applied,
                skipped = report.skipped,
                "thread toggled"
            ),
            Err(error) => tracing::error!(
                entry = "click",
                tag = config.log_tag.as_str(),
                node,
                %error,
                "error in collapse handler"
            ),
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::AttachOutcome;
    use super::ThreadState;
    use super::attach;
    use super::find_button;
    use super::thread_state;
    use super::toggle;
    use crate::config::CollapseConfig;
    use std::rc::Rc;
    use tf_dom::Document;
    use tf_dom::NodeId;
    use tf_html::HtmlParser;

    const THREAD: &str = r##"<div id="comments_list">
        <div id="a" class="comment" data-level="0"><div class="icms-comment-controls"><a href="#reply">reply</a></div></div>
        <div id="b" class="comment" data-level="1"><div class="icms-comment-controls"></div></div>
        <div class="comment" data-level="2"><div class="icms-comment-controls"></div></div>
        <div id="d" class="comment" data-level="1"><div class="icms-comment-controls"></div></div>
        <div id="e" class="comment" data-level="0"></div>
    </div>"##;

    fn fixture() -> (Document, Rc<CollapseConfig>) {
        let Ok(doc) = HtmlParser.parse(THREAD) else {
            panic!("parse failed");
        };
        (doc, Rc::new(CollapseConfig::default()))
    }

    fn by_id(doc: &Document, id: &str) -> NodeId {
        let Some(node) = doc.get_element_by_id(id) else {
            panic!("missing #{id}");
        };
        node
    }

    #[test]
    fn attaches_labelled_button_first_in_controls() {
        let (mut doc, config) = fixture();
        let a = by_id(&doc, "a");

        assert_eq!(
            attach(&mut doc, &config, a),
            Ok(AttachOutcome::Attached { descendants: 3 })
        );
        let Some(button) = find_button(&doc, &config, a) else {
            panic!("button missing");
        };
        let Some(controls) = doc.parent(button) else {
            panic!("button detached");
        };
        assert!(doc.has_class(controls, "icms-comment-controls"));
        assert_eq!(doc.first_child(controls), Some(button));
        assert_eq!(doc.text_content(button), "3 комментария");
        assert!(doc.has_class(button, "cpt-community-expanded"));
        assert_eq!(
            doc.get_attribute(button, "title"),
            Some("Свернуть/развернуть комментарии")
        );
        assert!(doc.first_by_class(button, "cpt-community-comment-replies-count").is_some());

        // The anonymous depth-2 reply is counted but has no id to store.
        assert_eq!(doc.get_attribute(a, "data-cpt-community-descendants"), Some("b,d"));
        assert_eq!(thread_state(&doc, &config, a), Some(ThreadState::Expanded));
    }

    #[test]
    fn skips_leaves_missing_controls_and_repeats() {
        let (mut doc, config) = fixture();
        let (a, d, e) = (by_id(&doc, "a"), by_id(&doc, "d"), by_id(&doc, "e"));

        assert_eq!(attach(&mut doc, &config, d), Ok(AttachOutcome::NoReplies));
        assert_eq!(attach(&mut doc, &config, e), Ok(AttachOutcome::NoControls));
        assert_eq!(
            attach(&mut doc, &config, Document::ROOT),
            Ok(AttachOutcome::NotAnElement)
        );
        assert!(attach(&mut doc, &config, a).is_ok());
        assert_eq!(attach(&mut doc, &config, a), Ok(AttachOutcome::AlreadyAttached));
        assert_eq!(doc.elements_by_class(a, "cpt-community-comment-collapse-btn").len(), 1);
        assert_eq!(thread_state(&doc, &config, d), None);
    }

    #[test]
    fn ids_are_not_written_when_no_reply_has_one() {
        let (mut doc, config) = fixture();
        let b = by_id(&doc, "b");
        assert_eq!(
            attach(&mut doc, &config, b),
            Ok(AttachOutcome::Attached { descendants: 1 })
        );
        assert_eq!(doc.get_attribute(b, "data-cpt-community-descendants"), None);
        let Some(button) = find_button(&doc, &config, b) else {
            panic!("button missing");
        };
        assert_eq!(doc.text_content(button), "1 комментарий");
    }

    #[test]
    fn toggle_round_trip_skips_stale_ids() {
        let (mut doc, config) = fixture();
        let a = by_id(&doc, "a");
        assert!(attach(&mut doc, &config, a).is_ok());
        let Some(button) = find_button(&doc, &config, a) else {
            panic!("button missing");
        };
        assert!(doc.set_attribute(a, "data-cpt-community-descendants", "b,gone,,d").is_ok());
        let (b, d) = (by_id(&doc, "b"), by_id(&doc, "d"));

        let Ok(folded) = toggle(&mut doc, &config, a, button) else {
            panic!("fold failed");
        };
        assert_eq!(folded.state, ThreadState::Collapsed);
        assert_eq!((folded.applied, folded.skipped), (2, 1));
        assert!(doc.has_class(b, "cpt-community-comment-collapsed"));
        assert!(doc.has_class(d, "cpt-community-comment-collapsed"));
        assert!(doc.has_class(a, "cpt-community-comment-thread-collapsed"));
        assert!(doc.has_class(button, "cpt-community-collapsed"));
        assert!(!doc.has_class(button, "cpt-community-expanded"));

        let Ok(unfolded) = toggle(&mut doc, &config, a, button) else {
            panic!("unfold failed");
        };
        assert_eq!(unfolded.state, ThreadState::Expanded);
        assert!(!doc.has_class(b, "cpt-community-comment-collapsed"));
        assert!(!doc.has_class(d, "cpt-community-comment-collapsed"));
        assert!(!doc.has_class(a, "cpt-community-comment-thread-collapsed"));
        assert!(doc.has_class(button, "cpt-community-expanded"));
        assert!(!doc.has_class(button, "cpt-community-collapsed"));
    }

    #[test]
    fn click_is_contained_and_toggles() {
        let (mut doc, config) = fixture();
        let a = by_id(&doc, "a");
        assert!(attach(&mut doc, &config, a).is_ok());
        let Some(button) = find_button(&doc, &config, a) else {
            panic!("button missing");
        };

        let Ok(outcome) = doc.click(button) else {
            panic!("click failed");
        };
        assert!(outcome.default_prevented);
        assert!(outcome.propagation_stopped);
        assert_eq!(outcome.listener_failures, 0);
        assert_eq!(thread_state(&doc, &config, a), Some(ThreadState::Collapsed));
    }
}
