//! End-to-end behaviour on parsed pages driven through the event loop.

use crate::CollapseConfig;
use crate::Installation;
use crate::ThreadState;
use crate::button::find_button;
use crate::button::thread_state;
use crate::install;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;
use tf_core::FoldResult;
use tf_css::computed_hidden;
use tf_dom::Document;
use tf_dom::Event;
use tf_dom::EventKind;
use tf_dom::EventListener;
use tf_dom::NodeId;
use tf_dom::Page;
use tf_dom::ReadyState;
use tf_html::HtmlParser;

const THREAD: &str = r#"<!DOCTYPE html>
<html><head><title>Blog</title></head>
<body>
<div id="comments_list">
  <div id="A" class="comment" data-level="0"><p>root</p><div class="icms-comment-controls"></div></div>
  <div id="B" class="comment" data-level="1"><p>reply</p><div class="icms-comment-controls"></div></div>
  <div id="C" class="comment" data-level="2"><p>nested</p><div class="icms-comment-controls"></div></div>
  <div id="D" class="comment" data-level="1"><p>reply</p><div class="icms-comment-controls"></div></div>
  <div id="E" class="comment" data-level="0"><p>root</p><div class="icms-comment-controls"></div></div>
</div>
</body></html>"#;

fn loaded_page() -> Page {
    let Ok(doc) = HtmlParser.parse(THREAD) else {
        panic!("parse failed");
    };
    Page::new(doc)
}

fn installed() -> (Page, Installation) {
    let mut page = loaded_page();
    let Ok(installation) = install(&mut page, CollapseConfig::default()) else {
        panic!("install failed");
    };
    (page, installation)
}

fn by_id(page: &Page, id: &str) -> NodeId {
    let Some(node) = page.document().get_element_by_id(id) else {
        panic!("missing #{id}");
    };
    node
}

fn button_of(page: &Page, config: &CollapseConfig, id: &str) -> NodeId {
    let Some(button) = find_button(page.document(), config, by_id(page, id)) else {
        panic!("#{id} has no toggle");
    };
    button
}

fn button_count(page: &Page) -> usize {
    page.document()
        .elements_by_class(Document::ROOT, "cpt-community-comment-collapse-btn")
        .len()
}

fn style_count(page: &Page) -> usize {
    let doc = page.document();
    doc.descendants(Document::ROOT)
        .into_iter()
        .filter(|node| doc.get_attribute(*node, "id") == Some("cpt-community-collapse-styles"))
        .count()
}

#[test]
fn sample_thread_gets_toggles_on_a_and_b() {
    let (page, installation) = installed();
    let Some(report) = installation.initial_scan else {
        panic!("scan should run immediately on a parsed page");
    };
    assert_eq!(report.comments, 5);
    assert_eq!(report.attached, 2);
    assert!(installation.observer.is_some());
    assert!(installation.styles.is_some());

    let config = &installation.config;
    let doc = page.document();
    assert_eq!(doc.text_content(button_of(&page, config, "A")), "3 комментария");
    assert_eq!(doc.text_content(button_of(&page, config, "B")), "1 комментарий");
    for leaf in ["C", "D", "E"] {
        assert_eq!(thread_state(doc, config, by_id(&page, leaf)), None, "{leaf}");
    }
    assert_eq!(
        doc.get_attribute(by_id(&page, "A"), "data-cpt-community-descendants"),
        Some("B,C,D")
    );
    assert_eq!(
        doc.get_attribute(by_id(&page, "B"), "data-cpt-community-descendants"),
        Some("C")
    );
}

#[test]
fn rescanning_and_reinstalling_add_nothing() {
    let (mut page, installation) = installed();
    let again = crate::scanner::scan(page.document_mut(), &installation.config);
    assert_eq!(again.attached, 0);
    assert_eq!(again.already_attached, 2);

    let Ok(second) = install(&mut page, CollapseConfig::default()) else {
        panic!("second install failed");
    };
    assert!(matches!(
        second.styles,
        Some(crate::StyleOutcome::AlreadyPresent(_))
    ));
    assert_eq!(button_count(&page), 2);
    assert_eq!(style_count(&page), 1);
    assert!(second.observer.is_some());
    assert_eq!(second.observer, installation.observer);

    let list = by_id(&page, "comments_list");
    page.mutate(|doc| {
        let Ok(nodes) = HtmlParser.parse_fragment(
            doc,
            r#"<div id="F" class="comment" data-level="1"></div>"#,
        ) else {
            panic!("fragment failed");
        };
        for node in nodes {
            let _ = doc.append_child(list, node);
        }
    });
    assert_eq!(page.pending_timers(), 1);
}

#[test]
fn clicking_folds_through_the_stylesheet() {
    let (mut page, installation) = installed();
    let config = Rc::clone(&installation.config);
    let button = button_of(&page, &config, "A");
    let (b, c, d, e) = (
        by_id(&page, "B"),
        by_id(&page, "C"),
        by_id(&page, "D"),
        by_id(&page, "E"),
    );

    let Ok(outcome) = page.click(button) else {
        panic!("click failed");
    };
    assert!(outcome.default_prevented);
    let doc = page.document();
    assert_eq!(
        thread_state(doc, &config, by_id(&page, "A")),
        Some(ThreadState::Collapsed)
    );
    for hidden in [b, c, d] {
        assert!(computed_hidden(doc, hidden));
    }
    assert!(!computed_hidden(doc, e));
    assert!(!computed_hidden(doc, button));

    assert!(page.click(button).is_ok());
    let doc = page.document();
    for shown in [b, c, d, e] {
        assert!(!computed_hidden(doc, shown));
    }
}

#[test]
fn expanding_a_parent_reveals_a_folded_childs_replies() {
    let (mut page, installation) = installed();
    let config = Rc::clone(&installation.config);
    let button_a = button_of(&page, &config, "A");
    let button_b = button_of(&page, &config, "B");
    let c = by_id(&page, "C");

    assert!(page.click(button_b).is_ok());
    assert!(page.click(button_a).is_ok());
    assert!(page.click(button_a).is_ok());

    // Each toggle force-sets its own stored ids; B still reads as folded.
    let doc = page.document();
    assert!(!computed_hidden(doc, c));
    assert_eq!(
        thread_state(doc, &config, by_id(&page, "B")),
        Some(ThreadState::Collapsed)
    );
}

#[test]
fn click_never_reaches_host_handlers() {
    let (mut page, installation) = installed();
    let button = button_of(&page, &installation.config, "A");
    let host_clicks = Rc::new(Cell::new(0_u32));
    let counter = Rc::clone(&host_clicks);
    let host: EventListener =
        Rc::new(move |_: &mut Document, _: &mut Event| -> FoldResult<()> {
            counter.set(counter.get() + 1);
            Ok(())
        });
    let container = by_id(&page, "comments_list");
    assert!(page
        .document_mut()
        .add_event_listener(container, EventKind::Click, host)
        .is_ok());

    let Ok(outcome) = page.click(button) else {
        panic!("click failed");
    };
    assert!(outcome.propagation_stopped);
    assert_eq!(outcome.visited, vec![button]);
    assert_eq!(host_clicks.get(), 0);
}

#[test]
fn removed_descendant_does_not_break_toggle() {
    let (mut page, installation) = installed();
    let config = Rc::clone(&installation.config);
    let button = button_of(&page, &config, "A");
    let (list, c) = (by_id(&page, "comments_list"), by_id(&page, "C"));
    page.mutate(|doc| {
        let _ = doc.remove_child(list, c);
    });

    let Ok(outcome) = page.click(button) else {
        panic!("click failed");
    };
    assert_eq!(outcome.listener_failures, 0);
    let doc = page.document();
    assert!(computed_hidden(doc, by_id(&page, "B")));
    assert!(computed_hidden(doc, by_id(&page, "D")));
    assert!(!doc.has_class(c, "cpt-community-comment-collapsed"));
}

#[test]
fn inserted_reply_is_picked_up_after_the_debounce() {
    let (mut page, installation) = installed();
    let config = Rc::clone(&installation.config);
    let (list, e) = (by_id(&page, "comments_list"), by_id(&page, "E"));
    assert_eq!(thread_state(page.document(), &config, e), None);

    page.mutate(|doc| {
        let Ok(nodes) = HtmlParser.parse_fragment(
            doc,
            r#"<div id="F" class="comment" data-level="1"><div class="icms-comment-controls"></div></div>"#,
        ) else {
            panic!("fragment failed");
        };
        for node in nodes {
            let _ = doc.append_child(list, node);
        }
    });
    assert_eq!(page.pending_timers(), 1);

    page.advance_time(Duration::from_millis(99));
    assert_eq!(thread_state(page.document(), &config, e), None);

    page.advance_time(Duration::from_millis(1));
    assert_eq!(
        thread_state(page.document(), &config, e),
        Some(ThreadState::Expanded)
    );
    let doc = page.document();
    assert_eq!(doc.text_content(button_of(&page, &config, "E")), "1 комментарий");
    // The existing toggle on A keeps its original count.
    assert_eq!(doc.text_content(button_of(&page, &config, "A")), "3 комментария");
    assert_eq!(page.pending_timers(), 0);
}

#[test]
fn loading_page_waits_for_dom_content_loaded() {
    let Ok(mut page) = HtmlParser.parse_page(THREAD) else {
        panic!("parse failed");
    };
    let Ok(installation) = install(&mut page, CollapseConfig::default()) else {
        panic!("install failed");
    };
    assert_eq!(installation.initial_scan, None);
    assert_eq!(button_count(&page), 0);
    assert_eq!(page.ready_state(), ReadyState::Loading);

    page.finish_parsing();
    assert_eq!(button_count(&page), 2);
    assert_eq!(page.ready_state(), ReadyState::Complete);
    // Button insertion is observed but brings no comment, so nothing is queued.
    assert_eq!(page.pending_timers(), 0);
}

#[test]
fn invalid_namespace_is_rejected_before_touching_the_page() {
    let mut page = loaded_page();
    let before = page.document().node_count();
    let config = CollapseConfig {
        namespace: "bad namespace".to_owned(),
        ..CollapseConfig::default()
    };
    let Err(error) = install(&mut page, config) else {
        panic!("invalid namespace accepted");
    };
    assert_eq!(error.code, "config.invalid_namespace");
    assert_eq!(page.document().node_count(), before);
}

#[test]
fn page_without_head_or_container_still_installs() {
    let mut page = Page::new(Document::new());
    let Ok(installation) = install(&mut page, CollapseConfig::default()) else {
        panic!("install failed");
    };
    assert_eq!(installation.styles, None);
    assert_eq!(installation.observer, None);
    assert!(installation.initial_scan.is_some_and(|report| !report.container_found));
}
