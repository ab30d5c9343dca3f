//! DOM tree data structures.
//!
//! Nodes live in an arena owned by [`Document`] and are addressed by
//! [`NodeId`]. Node `0` is the document node itself. Detached nodes stay in
//! the arena and can be reinserted; nothing is ever freed while the document
//! is alive.

mod events;
mod mutation;
mod page;

pub use events::DispatchOutcome;
pub use events::Event;
pub use events::EventKind;
pub use events::EventListener;
pub use mutation::MutationRecord;
pub use mutation::ObserveOptions;
pub use mutation::ObserverId;
pub use page::MutationCallback;
pub use page::Page;
pub use page::ReadyState;
pub use page::TaskCallback;
pub use page::TimerId;

use core::fmt;
use std::collections::HashMap;
use tf_core::FoldError;
use tf_core::FoldResult;

/// ID used to address nodes in the DOM arena.
pub type NodeId = u64;

/// Payload carried by a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element(ElementData),
    Text(String),
}

/// Tag and attributes of an element, attributes kept in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
struct NodeSlot {
    kind: NodeKind,
    parent: Option<NodeId>,
    /// Position in the parent's child list; meaningless while detached.
    index: usize,
    children: Vec<NodeId>,
}

/// Arena-backed document with event listeners and mutation observation.
pub struct Document {
    nodes: Vec<NodeSlot>,
    /// Every element per `id` value, attached or not, in no particular order.
    ids: HashMap<String, Vec<NodeId>>,
    listeners: Vec<events::ListenerEntry>,
    observations: Vec<mutation::Observation>,
    pending_records: Vec<(ObserverId, MutationRecord)>,
    next_observer_id: ObserverId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.nodes.len())
            .field("ids", &self.ids.len())
            .field("listeners", &self.listeners.len())
            .field("observations", &self.observations)
            .field("pending_records", &self.pending_records.len())
            .finish()
    }
}

impl Document {
    /// The document node.
    pub const ROOT: NodeId = 0;

    pub fn new() -> Self {
        Self {
            nodes: vec![NodeSlot {
                kind: NodeKind::Document,
                parent: None,
                index: 0,
                children: Vec::new(),
            }],
            ids: HashMap::new(),
            listeners: Vec::new(),
            observations: Vec::new(),
            pending_records: Vec::new(),
            next_observer_id: 1,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        usize::try_from(node).is_ok_and(|index| index < self.nodes.len())
    }

    pub fn kind(&self, node: NodeId) -> FoldResult<&NodeKind> {
        self.slot(node).map(|slot| &slot.kind)
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        matches!(self.kind(node), Ok(NodeKind::Element(_)))
    }

    pub fn tag_name(&self, node: NodeId) -> Option<&str> {
        match self.kind(node) {
            Ok(NodeKind::Element(data)) => Some(data.tag.as_str()),
            _ => None,
        }
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push_node(NodeKind::Element(ElementData {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
        }))
    }

    pub fn create_text_node(&mut self, text: impl Into<String>) -> NodeId {
        self.push_node(NodeKind::Text(text.into()))
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.slot(node).ok().and_then(|slot| slot.parent)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.slot(node)
            .map(|slot| slot.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.children(node).first().copied()
    }

    pub fn next_element_sibling(&self, node: NodeId) -> Option<NodeId> {
        let slot = self.slot(node).ok()?;
        let siblings = self.children(slot.parent?);
        siblings
            .get(slot.index + 1..)?
            .iter()
            .copied()
            .find(|candidate| self.is_element(*candidate))
    }

    /// True when `node` is reachable from the document node.
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.is_inclusive_ancestor(Self::ROOT, node)
    }

    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> FoldResult<()> {
        self.insert_before(parent, child, None)
    }

    /// Inserts `child` into `parent` before `reference`, or at the end when
    /// `reference` is `None`. A child that is already attached elsewhere is
    /// moved.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> FoldResult<()> {
        match self.kind(parent)? {
            NodeKind::Document | NodeKind::Element(_) => {}
            NodeKind::Text(_) => {
                return Err(FoldError::new(
                    "dom.hierarchy_request",
                    format!("text node {parent} cannot have children"),
                ));
            }
        }
        if matches!(self.kind(child)?, NodeKind::Document) {
            return Err(FoldError::new(
                "dom.hierarchy_request",
                "the document node cannot be inserted",
            ));
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(FoldError::new(
                "dom.hierarchy_request",
                format!("node {child} is an inclusive ancestor of {parent}"),
            ));
        }
        if let Some(reference) = reference {
            if reference == child {
                return Ok(());
            }
            if self.parent(reference) != Some(parent) {
                return Err(FoldError::new(
                    "dom.not_found",
                    format!("node {reference} is not a child of {parent}"),
                ));
            }
        }

        if let Some(previous_parent) = self.parent(child) {
            self.detach(previous_parent, child)?;
        }

        let index = match reference {
            Some(reference) => self.slot(reference)?.index,
            None => self.children(parent).len(),
        };
        self.slot_mut(parent)?.children.insert(index, child);
        self.slot_mut(child)?.parent = Some(parent);
        self.reindex_children(parent, index)?;
        self.queue_child_list(parent, vec![child], Vec::new());
        Ok(())
    }

    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> FoldResult<()> {
        if self.parent(child) != Some(parent) {
            return Err(FoldError::new(
                "dom.not_found",
                format!("node {child} is not a child of {parent}"),
            ));
        }
        self.detach(parent, child)
    }

    pub fn get_attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        let NodeKind::Element(data) = self.kind(node).ok()? else {
            return None;
        };
        data.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> FoldResult<()> {
        let data = self.element_mut(node)?;
        let previous = match data.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => Some(std::mem::replace(existing, value.to_owned())),
            None => {
                data.attributes.push((name.to_owned(), value.to_owned()));
                None
            }
        };
        if name == "id" {
            self.reindex_id(node, previous.as_deref(), value);
        }
        Ok(())
    }

    /// The `id` attribute, if present and non-empty.
    pub fn element_id(&self, node: NodeId) -> Option<&str> {
        self.get_attribute(node, "id").filter(|id| !id.is_empty())
    }

    pub fn class_names(&self, node: NodeId) -> Vec<&str> {
        self.get_attribute(node, "class")
            .map(|value| value.split_ascii_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.get_attribute(node, "class")
            .is_some_and(|value| value.split_ascii_whitespace().any(|name| name == class))
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) -> FoldResult<()> {
        self.toggle_class(node, class, Some(true)).map(|_| ())
    }

    pub fn remove_class(&mut self, node: NodeId, class: &str) -> FoldResult<()> {
        self.toggle_class(node, class, Some(false)).map(|_| ())
    }

    /// `classList.toggle` semantics: with `force` the class is set to that
    /// state, otherwise flipped. Returns whether the class is now present.
    pub fn toggle_class(
        &mut self,
        node: NodeId,
        class: &str,
        force: Option<bool>,
    ) -> FoldResult<bool> {
        if class.is_empty() || class.contains(|ch: char| ch.is_ascii_whitespace()) {
            return Err(FoldError::new(
                "dom.invalid_token",
                format!("`{class}` is not a valid class token"),
            ));
        }

        let present = self.has_class(node, class);
        let wanted = force.unwrap_or(!present);
        if wanted == present {
            // Still validates that the node is an element.
            self.element_mut(node)?;
            return Ok(present);
        }

        let mut names: Vec<String> = self
            .class_names(node)
            .into_iter()
            .map(str::to_owned)
            .collect();
        if wanted {
            names.push(class.to_owned());
        } else {
            names.retain(|name| name != class);
        }
        self.set_attribute(node, "class", &names.join(" "))?;
        Ok(wanted)
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        if let Ok(NodeKind::Text(text)) = self.kind(node) {
            out.push_str(text);
            return out;
        }
        for descendant in self.descendants(node) {
            if let Ok(NodeKind::Text(text)) = self.kind(descendant) {
                out.push_str(text);
            }
        }
        out
    }

    /// Replaces every child of `node` with a single text node.
    pub fn set_text_content(&mut self, node: NodeId, text: &str) -> FoldResult<()> {
        if let NodeKind::Text(existing) = &mut self.slot_mut(node)?.kind {
            *existing = text.to_owned();
            return Ok(());
        }
        let children = self.children(node).to_vec();
        for child in children {
            self.detach(node, child)?;
        }
        if !text.is_empty() {
            let text_node = self.create_text_node(text);
            self.append_child(node, text_node)?;
        }
        Ok(())
    }

    /// Every node below `scope` in document order, `scope` excluded.
    pub fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(scope).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// First connected element whose `id` attribute equals `id`.
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        if id.is_empty() {
            return None;
        }
        self.ids
            .get(id)?
            .iter()
            .copied()
            .filter(|node| self.is_connected(*node))
            .min_by_key(|node| self.tree_path(*node))
    }

    pub fn elements_by_class(&self, scope: NodeId, class: &str) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|node| self.has_class(*node, class))
            .collect()
    }

    pub fn first_by_class(&self, scope: NodeId, class: &str) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|node| self.has_class(*node, class))
    }

    pub fn first_by_tag(&self, scope: NodeId, tag: &str) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|node| self.tag_name(*node) == Some(tag))
    }

    pub fn document_element(&self) -> Option<NodeId> {
        self.children(Self::ROOT)
            .iter()
            .copied()
            .find(|node| self.is_element(*node))
    }

    pub fn head(&self) -> Option<NodeId> {
        self.first_by_tag(Self::ROOT, "head")
    }

    fn push_node(&mut self, kind: NodeKind) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(NodeSlot {
            kind,
            parent: None,
            index: 0,
            children: Vec::new(),
        });
        id
    }

    fn detach(&mut self, parent: NodeId, child: NodeId) -> FoldResult<()> {
        let index = self.slot(child)?.index;
        let children = &mut self.slot_mut(parent)?.children;
        if children.get(index) != Some(&child) {
            return Err(FoldError::new(
                "dom.corrupt_index",
                format!("node {child} is not at position {index} of {parent}"),
            ));
        }
        children.remove(index);
        self.slot_mut(child)?.parent = None;
        self.reindex_children(parent, index)?;
        self.queue_child_list(parent, Vec::new(), vec![child]);
        Ok(())
    }

    /// Refreshes the stored positions of `parent`'s children from `from` on.
    fn reindex_children(&mut self, parent: NodeId, from: usize) -> FoldResult<()> {
        for position in from..self.children(parent).len() {
            let child = self.children(parent)[position];
            self.slot_mut(child)?.index = position;
        }
        Ok(())
    }

    fn reindex_id(&mut self, node: NodeId, previous: Option<&str>, current: &str) {
        if previous == Some(current) {
            return;
        }
        if let Some(previous) = previous {
            if let Some(nodes) = self.ids.get_mut(previous) {
                nodes.retain(|candidate| *candidate != node);
                if nodes.is_empty() {
                    self.ids.remove(previous);
                }
            }
        }
        self.ids.entry(current.to_owned()).or_default().push(node);
    }

    /// Child positions from the root down; ancestors sort before descendants
    /// and earlier siblings before later ones.
    fn tree_path(&self, node: NodeId) -> Vec<usize> {
        let mut path = Vec::new();
        let mut cursor = node;
        while let Ok(slot) = self.slot(cursor) {
            let Some(parent) = slot.parent else {
                break;
            };
            path.push(slot.index);
            cursor = parent;
        }
        path.reverse();
        path
    }

    fn slot(&self, node: NodeId) -> FoldResult<&NodeSlot> {
        usize::try_from(node)
            .ok()
            .and_then(|index| self.nodes.get(index))
            .ok_or_else(|| unknown_node(node))
    }

    fn slot_mut(&mut self, node: NodeId) -> FoldResult<&mut NodeSlot> {
        usize::try_from(node)
            .ok()
            .and_then(|index| self.nodes.get_mut(index))
            .ok_or_else(|| unknown_node(node))
    }

    fn element_mut(&mut self, node: NodeId) -> FoldResult<&mut ElementData> {
        match &mut self.slot_mut(node)?.kind {
            NodeKind::Element(data) => Ok(data),
            _ => Err(FoldError::new(
                "dom.not_an_element",
                format!("node {node} is not an element"),
            )),
        }
    }
}

fn unknown_node(node: NodeId) -> FoldError {
    FoldError::new("dom.unknown_node", format!("node {node} does not exist"))
}
