//! Host-page contract and the namespaced names derived from it.

use crate::plural::Nouns;
use serde::Deserialize;
use std::time::Duration;
use tf_core::FoldError;
use tf_core::FoldResult;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CollapseConfig {
    /// Prefix for every class, id and attribute this crate injects.
    pub namespace: String,
    /// Id of the element holding the flat comment list.
    pub container_id: String,
    pub comment_class: String,
    /// Attribute holding the integer nesting depth of a comment.
    pub depth_attribute: String,
    /// Class of the per-comment element the toggle is inserted into.
    pub controls_class: String,
    /// Delay between a qualifying insertion and the rescan, in milliseconds.
    pub debounce_ms: u64,
    pub nouns: Nouns,
    pub button_title: String,
    /// Tag attached to every error this crate logs.
    pub log_tag: String,
}

impl Default for CollapseConfig {
    fn default() -> Self {
        Self {
            namespace: "cpt-community-".to_owned(),
            container_id: "comments_list".to_owned(),
            comment_class: "comment".to_owned(),
            depth_attribute: "data-level".to_owned(),
            controls_class: "icms-comment-controls".to_owned(),
            debounce_ms: 100,
            nouns: Nouns::default(),
            button_title: "Свернуть/развернуть комментарии".to_owned(),
            log_tag: "CPT Community Extension".to_owned(),
        }
    }
}

impl CollapseConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn style_id(&self) -> String {
        format!("{}collapse-styles", self.namespace)
    }

    /// Page global holding the container watcher's observer id.
    pub fn watcher_global(&self) -> String {
        format!("{}collapse-watcher", self.namespace)
    }

    pub fn descendants_attribute(&self) -> String {
        format!("data-{}descendants", self.namespace)
    }

    /// Marks a single hidden comment.
    pub fn hidden_class(&self) -> String {
        format!("{}comment-collapsed", self.namespace)
    }

    /// Marks a comment whose thread is folded.
    pub fn thread_collapsed_class(&self) -> String {
        format!("{}comment-thread-collapsed", self.namespace)
    }

    pub fn button_class(&self) -> String {
        format!("{}comment-collapse-btn", self.namespace)
    }

    pub fn count_class(&self) -> String {
        format!("{}comment-replies-count", self.namespace)
    }

    pub fn button_collapsed_class(&self) -> String {
        format!("{}collapsed", self.namespace)
    }

    pub fn button_expanded_class(&self) -> String {
        format!("{}expanded", self.namespace)
    }

    pub fn validate(&self) -> FoldResult<()> {
        if self.namespace.is_empty() {
            return Err(FoldError::new(
                "config.invalid_namespace",
                "namespace must not be empty",
            ));
        }
        if let Some(bad) = self
            .namespace
            .chars()
            .find(|ch| !(ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_')))
        {
            return Err(FoldError::new(
                "config.invalid_namespace",
                format!("namespace `{}` contains `{bad}`", self.namespace),
            ));
        }
        if self.namespace.starts_with(|ch: char| ch.is_ascii_digit()) {
            return Err(FoldError::new(
                "config.invalid_namespace",
                format!("namespace `{}` starts with a digit", self.namespace),
            ));
        }

        let contract = [
            ("container_id", &self.container_id),
            ("comment_class", &self.comment_class),
            ("depth_attribute", &self.depth_attribute),
            ("controls_class", &self.controls_class),
        ];
        for (field, value) in contract {
            if value.trim().is_empty() || value.contains(char::is_whitespace) {
                return Err(FoldError::new(
                    "config.missing_contract",
                    format!("`{field}` must be a single non-empty name"),
                ));
            }
        }
        if !self.nouns.is_complete() {
            return Err(FoldError::new(
                "config.missing_contract",
                "all three noun forms are required",
            ));
        }

        Ok(())
    }
}
