//! Observation of the comment container for late-arriving comments.

use crate::config::CollapseConfig;
use std::rc::Rc;
use std::time::Duration;
use tf_core::FoldResult;
use tf_dom::Document;
use tf_dom::MutationCallback;
use tf_dom::MutationRecord;
use tf_dom::NodeId;
use tf_dom::ObserveOptions;
use tf_dom::ObserverId;
use tf_dom::Page;

/// Signal sent when a comment was inserted under the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentChanged {
    /// Added nodes that are, or contain, a comment.
    pub added: usize,
}

/// When a subscriber hears about a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Debounce {
    /// Inside the mutation callback.
    Immediate,
    /// On a one-shot timer per qualifying batch. Batches are not coalesced.
    Delay(Duration),
}

pub type ChangeHandler = Rc<dyn Fn(&mut Page, ContentChanged)>;

/// Inspects one delivered batch; `None` when no comment arrived.
pub fn content_changed(
    document: &Document,
    config: &CollapseConfig,
    records: &[MutationRecord],
) -> Option<ContentChanged> {
    let added = records
        .iter()
        .flat_map(|record| record.added.iter().copied())
        .filter(|node| brings_comment(document, config, *node))
        .count();
    (added > 0).then_some(ContentChanged { added })
}

fn brings_comment(document: &Document, config: &CollapseConfig, node: NodeId) -> bool {
    document.is_element(node)
        && (document.has_class(node, &config.comment_class)
            || document.first_by_class(node, &config.comment_class).is_some())
}

/// Observes `container` with subtree child-list options and forwards
/// qualifying batches to `handler` under `debounce`.
pub fn watch(
    page: &mut Page,
    config: &Rc<CollapseConfig>,
    container: NodeId,
    debounce: Debounce,
    handler: ChangeHandler,
) -> FoldResult<ObserverId> {
    let config = Rc::clone(config);
    let callback: MutationCallback = Rc::new(move |page: &mut Page, records: &[MutationRecord]| {
        let Some(signal) = content_changed(page.document(), &config, records) else {
            return;
        };
        tracing::debug!(entry = "mutation", added = signal.added, "new comments detected");

        match debounce {
            Debounce::Immediate => handler(page, signal),
            Debounce::Delay(delay) => {
                let handler = Rc::clone(&handler);
                page.set_timeout(delay, Box::new(move |page: &mut Page| handler(page, signal)));
            }
        }
    });

    page.observe(container, ObserveOptions::child_list_subtree(), callback)
}
