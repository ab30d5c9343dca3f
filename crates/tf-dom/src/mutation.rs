//! Child-list mutation observation.
//!
//! Records are queued on the document and only delivered when the owning
//! [`Page`](crate::Page) reaches a microtask checkpoint.

use crate::Document;
use crate::NodeId;
use tf_core::FoldResult;

pub type ObserverId = u64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObserveOptions {
    pub child_list: bool,
    pub subtree: bool,
}

impl ObserveOptions {
    pub fn child_list_subtree() -> Self {
        Self {
            child_list: true,
            subtree: true,
        }
    }
}

/// One child-list change under `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub target: NodeId,
    pub added: Vec<NodeId>,
    pub removed: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Observation {
    id: ObserverId,
    target: NodeId,
    options: ObserveOptions,
}

impl Document {
    pub fn observe(&mut self, target: NodeId, options: ObserveOptions) -> FoldResult<ObserverId> {
        self.kind(target)?;
        let id = self.next_observer_id;
        self.next_observer_id = self.next_observer_id.saturating_add(1);
        self.observations.push(Observation {
            id,
            target,
            options,
        });
        Ok(id)
    }

    /// Stops observation and drops records not yet delivered.
    pub fn disconnect(&mut self, observer: ObserverId) {
        self.observations
            .retain(|observation| observation.id != observer);
        self.pending_records
            .retain(|(owner, _)| *owner != observer);
    }

    pub fn has_pending_records(&self) -> bool {
        !self.pending_records.is_empty()
    }

    pub fn take_mutation_records(&mut self) -> Vec<(ObserverId, MutationRecord)> {
        std::mem::take(&mut self.pending_records)
    }

    pub(crate) fn queue_child_list(
        &mut self,
        target: NodeId,
        added: Vec<NodeId>,
        removed: Vec<NodeId>,
    ) {
        if self.observations.is_empty() {
            return;
        }

        let interested: Vec<ObserverId> = self
            .observations
            .iter()
            .filter(|observation| observation.options.child_list)
            .filter(|observation| {
                observation.target == target
                    || (observation.options.subtree
                        && self.is_inclusive_ancestor(observation.target, target))
            })
            .map(|observation| observation.id)
            .collect();

        for observer in interested {
            self.pending_records.push((
                observer,
                MutationRecord {
                    target,
                    added: added.clone(),
                    removed: removed.clone(),
                },
            ));
        }
    }
}
