//! Whole-container pass that gives every qualifying comment its toggle.

use crate::button::AttachOutcome;
use crate::button::attach;
use crate::config::CollapseConfig;
use std::rc::Rc;
use tf_core::FoldResult;
use tf_dom::Document;
use tf_dom::NodeId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// False when the container was not on the page.
    pub container_found: bool,
    pub comments: usize,
    pub attached: usize,
    pub already_attached: usize,
    pub no_controls: usize,
    pub no_replies: usize,
    pub not_elements: usize,
    pub failures: usize,
}

impl ScanReport {
    fn record(&mut self, outcome: AttachOutcome) {
        let slot = match outcome {
            AttachOutcome::NotAnElement => &mut self.not_elements,
            AttachOutcome::AlreadyAttached => &mut self.already_attached,
            AttachOutcome::NoControls => &mut self.no_controls,
            AttachOutcome::NoReplies => &mut self.no_replies,
            AttachOutcome::Attached { .. } => &mut self.attached,
        };
        *slot = slot.saturating_add(1);
    }
}

pub fn scan(document: &mut Document, config: &Rc<CollapseConfig>) -> ScanReport {
    scan_from(document, config, "scan")
}

/// Attaches from the last comment to the first. A comment that fails is
/// logged under `entry` and the pass moves on.
pub(crate) fn scan_from(
    document: &mut Document,
    config: &Rc<CollapseConfig>,
    entry: &'static str,
) -> ScanReport {
    scan_with(document, config, entry, attach)
}

fn scan_with(
    document: &mut Document,
    config: &Rc<CollapseConfig>,
    entry: &'static str,
    mut attach_one: impl FnMut(
        &mut Document,
        &Rc<CollapseConfig>,
        NodeId,
    ) -> FoldResult<AttachOutcome>,
) -> ScanReport {
    let mut report = ScanReport::default();
    let Some(container) = document.get_element_by_id(&config.container_id) else {
        tracing::debug!(entry, container = config.container_id.as_str(), "no comment container");
        return report;
    };
    report.container_found = true;

    let comments = document.elements_by_class(container, &config.comment_class);
    report.comments = comments.len();

    for node in comments.into_iter().rev() {
        match attach_one(document, config, node) {
            Ok(outcome) => {
                tracing::trace!(entry, node, ?outcome, "comment processed");
                report.record(outcome);
            }
            Err(error) => {
                report.failures = report.failures.saturating_add(1);
                tracing::error!(
                    entry,
                    tag = config.log_tag.as_str(),
                    node,
                    %error,
                    "error adding collapse button"
                );
            }
        }
    }

    if report.attached > 0 || report.failures > 0 {
        tracing::info!(
            entry,
            comments = report.comments,
            attached = report.attached,
            failures = report.failures,
            "comment scan finished"
        );
    }
    report
}

#[cfg(test)]
mod tests {
    use super::scan;
    use super::scan_with;
    use crate::button::attach;
    use crate::button::find_button;
    use crate::config::CollapseConfig;
    use std::rc::Rc;
    use tf_core::FoldError;
    use tf_html::HtmlParser;

    const PAGE: &str = r#"<html><head></head><body><div id="comments_list">
        <div id="a" class="comment" data-level="0"><div class="icms-comment-controls"></div></div>
        <div id="b" class="comment" data-level="1"><div class="icms-comment-controls"></div></div>
        <div id="c" class="comment" data-level="2"><div class="icms-comment-controls"></div></div>
        <div id="d" class="comment" data-level="1"><div class="icms-comment-controls"></div></div>
        <div id="e" class="comment" data-level="0"><div class="icms-comment-controls"></div></div>
    </div></body></html>"#;

    #[test]
    fn missing_container_is_a_quiet_no_op() {
        let Ok(mut doc) = HtmlParser.parse("<html><body><div class='comment'></div></body></html>")
        else {
            panic!("parse failed");
        };
        let before = doc.node_count();
        let report = scan(&mut doc, &Rc::new(CollapseConfig::default()));
        assert!(!report.container_found);
        assert_eq!(report.comments, 0);
        assert_eq!(doc.node_count(), before);
    }

    #[test]
    fn counts_each_outcome() {
        let Ok(mut doc) = HtmlParser.parse(PAGE) else {
            panic!("parse failed");
        };
        let config = Rc::new(CollapseConfig::default());

        let first = scan(&mut doc, &config);
        assert_eq!(first.comments, 5);
        assert_eq!(first.attached, 2);
        assert_eq!(first.no_replies, 3);
        assert_eq!(first.failures, 0);

        let second = scan(&mut doc, &config);
        assert_eq!(second.attached, 0);
        assert_eq!(second.already_attached, 2);
        assert_eq!(
            doc.elements_by_class(tf_dom::Document::ROOT, "cpt-community-comment-collapse-btn")
                .len(),
            2
        );
    }

    #[test]
    fn one_failing_comment_does_not_stop_the_pass() {
        let Ok(mut doc) = HtmlParser.parse(PAGE) else {
            panic!("parse failed");
        };
        let config = Rc::new(CollapseConfig::default());
        let Some(b) = doc.get_element_by_id("b") else {
            panic!("missing #b");
        };

        let mut visited = Vec::new();
        let report = scan_with(&mut doc, &config, "scan", |doc, config, node| {
            visited.push(doc.element_id(node).map(str::to_owned));
            if node == b {
                return Err(FoldError::new("dom.hierarchy_request", "button rejected"));
            }
            attach(doc, config, node)
        });

        assert_eq!(report.comments, 5);
        assert_eq!(report.failures, 1);
        assert_eq!(report.attached, 1);
        assert_eq!(report.no_replies, 3);
        let order: Vec<Option<&str>> = visited.iter().map(Option::as_deref).collect();
        assert_eq!(order, vec![Some("e"), Some("d"), Some("c"), Some("b"), Some("a")]);
        assert!(find_button(&doc, &config, b).is_none());
        let Some(a) = doc.get_element_by_id("a") else {
            panic!("missing #a");
        };
        assert!(find_button(&doc, &config, a).is_some());
    }
}
