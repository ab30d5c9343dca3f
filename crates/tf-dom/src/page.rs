//! Single-threaded page event loop: ready state, one-shot timers and
//! batched mutation-observer delivery on a virtual clock.

use crate::DispatchOutcome;
use crate::Document;
use crate::MutationRecord;
use crate::NodeId;
use crate::ObserveOptions;
use crate::ObserverId;
use core::fmt;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;
use tf_core::FoldResult;

/// Upper bound on observer delivery rounds per checkpoint, so an observer
/// that keeps mutating its own target cannot spin forever.
const MAX_CHECKPOINT_ROUNDS: usize = 64;

pub type TimerId = u64;

/// Observer callback, invoked once per delivered batch.
pub type MutationCallback = Rc<dyn Fn(&mut Page, &[MutationRecord])>;

/// One-shot task run by the loop (timers, DOMContentLoaded).
pub type TaskCallback = Box<dyn FnOnce(&mut Page)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Loading,
    Interactive,
    Complete,
}

impl ReadyState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Interactive => "interactive",
            Self::Complete => "complete",
        }
    }
}

struct PendingTimer {
    id: TimerId,
    due: Duration,
    callback: TaskCallback,
}

/// A document plus the event loop that drives it.
pub struct Page {
    document: Document,
    ready_state: ReadyState,
    now: Duration,
    timers: Vec<PendingTimer>,
    next_timer_id: TimerId,
    observer_callbacks: HashMap<ObserverId, MutationCallback>,
    content_loaded: Vec<TaskCallback>,
    /// Page-wide named values, what scripts would hang off `window`.
    globals: HashMap<String, u64>,
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("document", &self.document)
            .field("ready_state", &self.ready_state)
            .field("now", &self.now)
            .field("pending_timers", &self.timers.len())
            .field("observers", &self.observer_callbacks.len())
            .field("globals", &self.globals)
            .finish()
    }
}

impl Page {
    /// A page whose document has already finished parsing.
    pub fn new(document: Document) -> Self {
        Self::with_state(document, ReadyState::Complete)
    }

    /// A page still in the parse phase; call [`Page::finish_parsing`] later.
    pub fn loading(document: Document) -> Self {
        Self::with_state(document, ReadyState::Loading)
    }

    fn with_state(document: Document, ready_state: ReadyState) -> Self {
        Self {
            document,
            ready_state,
            now: Duration::ZERO,
            timers: Vec::new(),
            next_timer_id: 1,
            observer_callbacks: HashMap::new(),
            content_loaded: Vec::new(),
            globals: HashMap::new(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn global(&self, name: &str) -> Option<u64> {
        self.globals.get(name).copied()
    }

    pub fn set_global(&mut self, name: &str, value: u64) {
        self.globals.insert(name.to_owned(), value);
    }

    pub fn on_dom_content_loaded(&mut self, callback: TaskCallback) {
        self.content_loaded.push(callback);
    }

    /// Ends the parse phase: fires DOMContentLoaded callbacks while
    /// interactive, then marks the page complete.
    pub fn finish_parsing(&mut self) {
        if self.ready_state != ReadyState::Loading {
            return;
        }

        self.ready_state = ReadyState::Interactive;
        let callbacks = std::mem::take(&mut self.content_loaded);
        for callback in callbacks {
            callback(self);
            self.microtask_checkpoint();
        }
        self.ready_state = ReadyState::Complete;
    }

    pub fn observe(
        &mut self,
        target: NodeId,
        options: ObserveOptions,
        callback: MutationCallback,
    ) -> FoldResult<ObserverId> {
        let id = self.document.observe(target, options)?;
        self.observer_callbacks.insert(id, callback);
        Ok(id)
    }

    pub fn disconnect(&mut self, observer: ObserverId) {
        self.document.disconnect(observer);
        self.observer_callbacks.remove(&observer);
    }

    /// Schedules a one-shot callback `delay` after the current virtual time.
    pub fn set_timeout(&mut self, delay: Duration, callback: TaskCallback) -> TimerId {
        let id = self.next_timer_id;
        self.next_timer_id = self.next_timer_id.saturating_add(1);
        self.timers.push(PendingTimer {
            id,
            due: self.now.saturating_add(delay),
            callback,
        });
        id
    }

    /// Runs host-page work against the document, then delivers any mutation
    /// batches it produced.
    pub fn mutate<R>(&mut self, work: impl FnOnce(&mut Document) -> R) -> R {
        let result = work(&mut self.document);
        self.microtask_checkpoint();
        result
    }

    /// Dispatches a user click, then delivers resulting mutation batches.
    pub fn click(&mut self, target: NodeId) -> FoldResult<DispatchOutcome> {
        let outcome = self.document.click(target);
        self.microtask_checkpoint();
        outcome
    }

    /// Delivers pending mutation batches and runs every timer already due.
    pub fn run_until_idle(&mut self) {
        self.advance_time(Duration::ZERO);
    }

    /// Moves the clock forward, running due timers in (due time, creation)
    /// order with a checkpoint after each.
    pub fn advance_time(&mut self, delta: Duration) {
        self.microtask_checkpoint();
        let target = self.now.saturating_add(delta);

        while let Some(index) = self.next_due_timer(target) {
            let timer = self.timers.remove(index);
            if timer.due > self.now {
                self.now = timer.due;
            }
            tracing::trace!(
                timer = timer.id,
                now_ms = self.now.as_millis() as u64,
                "timer fired"
            );
            (timer.callback)(self);
            self.microtask_checkpoint();
        }

        self.now = target;
    }

    /// Delivers queued mutation records to their observers, one batch per
    /// observer per round, until no new records appear.
    pub fn microtask_checkpoint(&mut self) {
        for _ in 0..MAX_CHECKPOINT_ROUNDS {
            let records = self.document.take_mutation_records();
            if records.is_empty() {
                return;
            }

            let mut order: Vec<ObserverId> = Vec::new();
            let mut batches: HashMap<ObserverId, Vec<MutationRecord>> = HashMap::new();
            for (observer, record) in records {
                if !batches.contains_key(&observer) {
                    order.push(observer);
                }
                batches.entry(observer).or_default().push(record);
            }

            for observer in order {
                let Some(callback) = self.observer_callbacks.get(&observer).map(Rc::clone) else {
                    continue;
                };
                let batch = batches.remove(&observer).unwrap_or_default();
                callback(self, &batch);
            }
        }

        tracing::warn!(
            rounds = MAX_CHECKPOINT_ROUNDS,
            "mutation delivery did not settle; remaining records deferred"
        );
    }

    fn next_due_timer(&self, target: Duration) -> Option<usize> {
        self.timers
            .iter()
            .enumerate()
            .filter(|(_, timer)| timer.due <= target)
            .min_by_key(|(_, timer)| (timer.due, timer.id))
            .map(|(index, _)| index)
    }
}
