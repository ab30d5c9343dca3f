//! Collapsible threads for flat, depth-tagged comment lists.
//!
//! [`install`] wires everything into a [`Page`]: the shared stylesheet, an
//! initial scan once the document is parsed, and a watcher that rescans when
//! the host page inserts more comments.

pub mod button;
pub mod config;
pub mod plural;
pub mod scanner;
pub mod styles;
pub mod tree;
pub mod watcher;

#[cfg(test)]
mod scenarios;

pub use button::AttachOutcome;
pub use button::ThreadState;
pub use config::CollapseConfig;
pub use scanner::ScanReport;
pub use styles::StyleOutcome;
pub use watcher::ContentChanged;
pub use watcher::Debounce;

use std::rc::Rc;
use tf_core::FoldResult;
use tf_dom::ObserverId;
use tf_dom::Page;
use tf_dom::ReadyState;

/// Handles to what [`install`] set up.
#[derive(Debug, Clone)]
pub struct Installation {
    pub config: Rc<CollapseConfig>,
    /// `None` when injection failed; the failure was logged.
    pub styles: Option<StyleOutcome>,
    /// `None` when the scan was deferred to DOMContentLoaded.
    pub initial_scan: Option<ScanReport>,
    /// `None` when the container was not on the page at install time. A
    /// repeated install reports the observer bound by the first one.
    pub observer: Option<ObserverId>,
}

/// Installs the collapser on `page`.
///
/// Only an invalid configuration is returned as an error. Everything after
/// that is best effort and logs its own failures.
pub fn install(page: &mut Page, config: CollapseConfig) -> FoldResult<Installation> {
    config.validate()?;
    let config = Rc::new(config);

    let styles = match styles::ensure_styles(page.document_mut(), &config) {
        Ok(outcome) => Some(outcome),
        Err(error) => {
            tracing::warn!(tag = config.log_tag.as_str(), %error, "failed to add styles");
            None
        }
    };

    let initial_scan = if page.ready_state() == ReadyState::Loading {
        let deferred = Rc::clone(&config);
        page.on_dom_content_loaded(Box::new(move |page: &mut Page| {
            scanner::scan_from(page.document_mut(), &deferred, "initial_scan");
        }));
        tracing::debug!(ready_state = page.ready_state().as_str(), "initial scan deferred");
        None
    } else {
        Some(scanner::scan_from(page.document_mut(), &config, "initial_scan"))
    };

    let watcher_key = config.watcher_global();
    let observer = match (
        page.global(&watcher_key),
        page.document().get_element_by_id(&config.container_id),
    ) {
        (Some(existing), _) => {
            tracing::debug!(observer = existing, "comment watcher already bound");
            Some(existing)
        }
        (None, Some(container)) => {
            let observer = watch_container(page, &config, container);
            if let Some(observer) = observer {
                page.set_global(&watcher_key, observer);
            }
            observer
        }
        (None, None) => None,
    };

    Ok(Installation {
        config,
        styles,
        initial_scan,
        observer,
    })
}

fn watch_container(
    page: &mut Page,
    config: &Rc<CollapseConfig>,
    container: tf_dom::NodeId,
) -> Option<ObserverId> {
    let rescan_config = Rc::clone(config);
    let handler: watcher::ChangeHandler = Rc::new(move |page: &mut Page, _: ContentChanged| {
        scanner::scan_from(page.document_mut(), &rescan_config, "rescan");
    });
    let debounce = Debounce::Delay(config.debounce());

    match watcher::watch(page, config, container, debounce, handler) {
        Ok(observer) => Some(observer),
        Err(error) => {
            tracing::error!(
                entry = "watch",
                tag = config.log_tag.as_str(),
                %error,
                "error initializing comment watcher"
            );
            None
        }
    }
}
