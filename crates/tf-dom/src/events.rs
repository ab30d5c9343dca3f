//! Event listeners and bubbling dispatch.

use crate::Document;
use crate::NodeId;
use core::fmt;
use std::rc::Rc;
use tf_core::FoldResult;

/// Event types the document can dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Click => "click",
        }
    }
}

/// Listener callback. Listeners receive the document mutably so they can
/// rewrite classes and attributes in response to the event.
pub type EventListener = Rc<dyn Fn(&mut Document, &mut Event) -> FoldResult<()>>;

pub(crate) struct ListenerEntry {
    node: NodeId,
    kind: EventKind,
    listener: EventListener,
}

/// In-flight event state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    kind: EventKind,
    target: NodeId,
    current_target: NodeId,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn current_target(&self) -> NodeId {
        self.current_target
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Outcome of a dispatch, including every node whose listeners ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub default_prevented: bool,
    pub propagation_stopped: bool,
    pub visited: Vec<NodeId>,
    pub listeners_invoked: usize,
    pub listener_failures: usize,
}

impl fmt::Debug for ListenerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerEntry")
            .field("node", &self.node)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl Document {
    pub fn add_event_listener(
        &mut self,
        node: NodeId,
        kind: EventKind,
        listener: EventListener,
    ) -> FoldResult<()> {
        self.kind(node)?;
        self.listeners.push(ListenerEntry {
            node,
            kind,
            listener,
        });
        Ok(())
    }

    /// Dispatches `kind` at `target` and bubbles it through the ancestors.
    ///
    /// A failing listener is logged and counted; the remaining listeners and
    /// the bubble path still run.
    pub fn dispatch_event(
        &mut self,
        target: NodeId,
        kind: EventKind,
    ) -> FoldResult<DispatchOutcome> {
        self.kind(target)?;

        let mut path = Vec::new();
        let mut cursor = Some(target);
        while let Some(node) = cursor {
            path.push(node);
            cursor = self.parent(node);
        }

        let mut event = Event {
            kind,
            target,
            current_target: target,
            default_prevented: false,
            propagation_stopped: false,
        };
        let mut outcome = DispatchOutcome::default();

        for node in path {
            let handlers: Vec<EventListener> = self
                .listeners
                .iter()
                .filter(|entry| entry.node == node && entry.kind == kind)
                .map(|entry| Rc::clone(&entry.listener))
                .collect();
            if handlers.is_empty() {
                continue;
            }

            event.current_target = node;
            outcome.visited.push(node);
            for handler in handlers {
                outcome.listeners_invoked = outcome.listeners_invoked.saturating_add(1);
                if let Err(error) = handler(self, &mut event) {
                    outcome.listener_failures = outcome.listener_failures.saturating_add(1);
                    tracing::error!(
                        event = kind.as_str(),
                        node,
                        %error,
                        "event listener failed"
                    );
                }
            }

            if event.propagation_stopped {
                break;
            }
        }

        outcome.default_prevented = event.default_prevented;
        outcome.propagation_stopped = event.propagation_stopped;
        Ok(outcome)
    }

    pub fn click(&mut self, target: NodeId) -> FoldResult<DispatchOutcome> {
        self.dispatch_event(target, EventKind::Click)
    }
}
