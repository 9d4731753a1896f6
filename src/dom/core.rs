use std::fmt;
use std::rc::Rc;

use serde::Serialize;
use thiserror::Error;

use super::events::{EventListener, ListenerId};
use super::selector::Selector;

/// Handle to a node stored in a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Payload carried by a real node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
    Comment(String),
}

impl NodeData {
    pub fn is_element(&self) -> bool {
        matches!(self, NodeData::Element { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("{0} does not exist")]
    UnknownNode(NodeId),
    #[error("{node} cannot be inserted under {parent}: it would become its own ancestor")]
    HierarchyRequest { parent: NodeId, node: NodeId },
    #[error("{child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },
    #[error("{0} is not an element")]
    NotAnElement(NodeId),
    #[error("{0} does not hold character data")]
    NotCharacterData(NodeId),
    #[error("event re-dispatch exceeded depth {0}")]
    DispatchDepthExceeded(usize),
}

pub(crate) struct ListenerEntry {
    pub(crate) id: ListenerId,
    pub(crate) event_type: String,
    pub(crate) listener: Rc<dyn EventListener>,
}

struct DomNode {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    listeners: Vec<ListenerEntry>,
}

impl DomNode {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: None,
            children: Vec::new(),
            listeners: Vec::new(),
        }
    }
}

/// Arena-backed document tree standing in for the browser DOM.
///
/// The document starts out as `<html><body></body></html>`. Nodes are never
/// freed; detached nodes simply stop being reachable from the root.
pub struct Document {
    nodes: Vec<DomNode>,
    root: NodeId,
    body: NodeId,
    next_listener: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            body: NodeId(0),
            next_listener: 0,
        };
        let root = doc.create_element("html");
        let body = doc.create_element("body");
        doc.nodes[body.0].parent = Some(root);
        doc.nodes[root.0].children.push(body);
        doc.root = root;
        doc.body = body;
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn create_element(&mut self, tag: impl Into<String>) -> NodeId {
        self.push(NodeData::Element {
            tag: tag.into(),
            attrs: Vec::new(),
        })
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Text(text.into()))
    }

    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Comment(text.into()))
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(DomNode::new(data));
        id
    }

    fn node(&self, id: NodeId) -> Result<&DomNode, DomError> {
        self.nodes.get(id.0).ok_or(DomError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut DomNode, DomError> {
        self.nodes.get_mut(id.0).ok_or(DomError::UnknownNode(id))
    }

    pub fn data(&self, id: NodeId) -> Result<&NodeData, DomError> {
        self.node(id).map(|node| &node.data)
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match self.data(id) {
            Ok(NodeData::Element { tag, .. }) => Some(tag.as_str()),
            _ => None,
        }
    }

    /// Replace the character data of a text or comment node.
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> Result<(), DomError> {
        match &mut self.node_mut(id)?.data {
            NodeData::Text(current) | NodeData::Comment(current) => {
                *current = text.into();
                Ok(())
            }
            NodeData::Element { .. } => Err(DomError::NotCharacterData(id)),
        }
    }

    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), DomError> {
        let attrs = self.attrs_mut(id)?;
        let name = name.into();
        let value = value.into();
        match attrs.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = value,
            None => attrs.push((name, value)),
        }
        Ok(())
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<bool, DomError> {
        let attrs = self.attrs_mut(id)?;
        let before = attrs.len();
        attrs.retain(|(key, _)| key != name);
        Ok(attrs.len() != before)
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn attributes(&self, id: NodeId) -> &[(String, String)] {
        match self.data(id) {
            Ok(NodeData::Element { attrs, .. }) => attrs,
            _ => &[],
        }
    }

    fn attrs_mut(&mut self, id: NodeId) -> Result<&mut Vec<(String, String)>, DomError> {
        match &mut self.node_mut(id)?.data {
            NodeData::Element { attrs, .. } => Ok(attrs),
            _ => Err(DomError::NotAnElement(id)),
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).ok().and_then(|node| node.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    /// Whether `id` is reachable from the document root.
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.contains(self.root, id)
    }

    /// Whether `node` is `ancestor` or one of its descendants.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// `id` followed by each physical ancestor up to the root.
    pub fn propagation_path(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            path.push(current);
            cursor = self.parent(current);
        }
        path
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` under `parent` ahead of `reference`, or at the end when
    /// `reference` is `None`. The child is moved if it already has a parent.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        self.check_insertable(parent, child)?;
        if let Some(reference) = reference {
            if self.parent(reference) != Some(parent) {
                return Err(DomError::NotAChild {
                    parent,
                    child: reference,
                });
            }
        }

        self.detach(child)?;
        let siblings = &mut self.node_mut(parent)?.children;
        let index = reference
            .and_then(|reference| siblings.iter().position(|id| *id == reference))
            .unwrap_or(siblings.len());
        siblings.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Swap `old` for `new` in `parent`'s child list, leaving `old` detached.
    pub fn replace_child(
        &mut self,
        parent: NodeId,
        new: NodeId,
        old: NodeId,
    ) -> Result<(), DomError> {
        if new == old {
            return Ok(());
        }
        self.insert_before(parent, new, Some(old))?;
        self.remove_child(parent, old)
    }

    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.node(child)?;
        let siblings = &mut self.node_mut(parent)?.children;
        let index = siblings
            .iter()
            .position(|id| *id == child)
            .ok_or(DomError::NotAChild { parent, child })?;
        siblings.remove(index);
        self.node_mut(child)?.parent = None;
        Ok(())
    }

    /// Remove `id` from whatever parent it has. Returns `false` when it was
    /// already parentless.
    pub fn detach(&mut self, id: NodeId) -> Result<bool, DomError> {
        match self.node(id)?.parent {
            Some(parent) => {
                self.remove_child(parent, id)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn check_insertable(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.node(child)?;
        if !self.node(parent)?.data.is_element() {
            return Err(DomError::NotAnElement(parent));
        }
        if self.contains(child, parent) {
            return Err(DomError::HierarchyRequest {
                parent,
                node: child,
            });
        }
        Ok(())
    }

    /// Pre-order walk of `id` and its descendants.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// First element in document order matching `selector`.
    ///
    /// Only compound selectors are understood; anything else matches nothing.
    pub fn query_selector(&self, selector: &str) -> Option<NodeId> {
        let selector = Selector::parse(selector)?;
        self.descendants(self.root)
            .into_iter()
            .find(|id| self.data(*id).map(|data| selector.matches(data)).unwrap_or(false))
    }

    pub fn add_event_listener(
        &mut self,
        id: NodeId,
        event_type: impl Into<String>,
        listener: Rc<dyn EventListener>,
    ) -> Result<ListenerId, DomError> {
        let listener_id = ListenerId::new(self.next_listener);
        let node = self.node_mut(id)?;
        node.listeners.push(ListenerEntry {
            id: listener_id,
            event_type: event_type.into(),
            listener,
        });
        self.next_listener += 1;
        Ok(listener_id)
    }

    pub fn remove_event_listener(
        &mut self,
        id: NodeId,
        listener: ListenerId,
    ) -> Result<bool, DomError> {
        let listeners = &mut self.node_mut(id)?.listeners;
        let before = listeners.len();
        listeners.retain(|entry| entry.id != listener);
        Ok(listeners.len() != before)
    }

    pub fn listener_count(&self, id: NodeId, event_type: &str) -> usize {
        self.node(id)
            .map(|node| {
                node.listeners
                    .iter()
                    .filter(|entry| entry.event_type == event_type)
                    .count()
            })
            .unwrap_or(0)
    }

    pub(crate) fn listeners_for(&self, id: NodeId, event_type: &str) -> Vec<Rc<dyn EventListener>> {
        self.node(id)
            .map(|node| {
                node.listeners
                    .iter()
                    .filter(|entry| entry.event_type == event_type)
                    .map(|entry| Rc::clone(&entry.listener))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_document_has_connected_body() {
        let doc = Document::new();
        assert_eq!(doc.tag(doc.root()), Some("html"));
        assert_eq!(doc.tag(doc.body()), Some("body"));
        assert!(doc.is_connected(doc.body()));
    }

    #[test]
    fn append_moves_node_between_parents() {
        let mut doc = Document::new();
        let a = doc.create_element("div");
        let b = doc.create_element("div");
        let child = doc.create_element("span");
        doc.append_child(doc.body(), a).unwrap();
        doc.append_child(doc.body(), b).unwrap();

        doc.append_child(a, child).unwrap();
        doc.append_child(b, child).unwrap();

        assert!(doc.children(a).is_empty());
        assert_eq!(doc.children(b), &[child]);
        assert_eq!(doc.parent(child), Some(b));
    }

    #[test]
    fn cannot_insert_into_own_subtree() {
        let mut doc = Document::new();
        let outer = doc.create_element("div");
        let inner = doc.create_element("div");
        doc.append_child(outer, inner).unwrap();

        let err = doc.append_child(inner, outer).unwrap_err();
        assert!(matches!(err, DomError::HierarchyRequest { .. }));
    }

    #[test]
    fn detach_is_noop_for_parentless_nodes() {
        let mut doc = Document::new();
        let node = doc.create_element("div");
        assert!(!doc.detach(node).unwrap());
        doc.append_child(doc.body(), node).unwrap();
        assert!(doc.detach(node).unwrap());
        assert!(!doc.is_connected(node));
    }

    #[test]
    fn replace_child_keeps_position() {
        let mut doc = Document::new();
        let first = doc.create_element("a");
        let second = doc.create_element("b");
        let third = doc.create_element("c");
        let replacement = doc.create_element("d");
        for node in [first, second, third] {
            doc.append_child(doc.body(), node).unwrap();
        }

        doc.replace_child(doc.body(), replacement, second).unwrap();

        assert_eq!(doc.children(doc.body()), &[first, replacement, third]);
        assert_eq!(doc.parent(second), None);
    }

    #[test]
    fn query_selector_returns_first_match_in_document_order() {
        let mut doc = Document::new();
        let first = doc.create_element("div");
        let second = doc.create_element("div");
        doc.set_attribute(first, "class", "overlay").unwrap();
        doc.set_attribute(second, "id", "outside").unwrap();
        doc.set_attribute(second, "class", "overlay").unwrap();
        doc.append_child(doc.body(), first).unwrap();
        doc.append_child(doc.body(), second).unwrap();

        assert_eq!(doc.query_selector(".overlay"), Some(first));
        assert_eq!(doc.query_selector("#outside"), Some(second));
        assert_eq!(doc.query_selector("div#outside.overlay"), Some(second));
        assert_eq!(doc.query_selector("#missing"), None);
    }

    #[test]
    fn query_selector_skips_detached_nodes() {
        let mut doc = Document::new();
        let node = doc.create_element("div");
        doc.set_attribute(node, "id", "floating").unwrap();
        assert_eq!(doc.query_selector("#floating"), None);
    }

    #[test]
    fn text_nodes_reject_attributes() {
        let mut doc = Document::new();
        let text = doc.create_text("hi");
        let err = doc.set_attribute(text, "id", "x").unwrap_err();
        assert_eq!(err, DomError::NotAnElement(text));
    }
}
