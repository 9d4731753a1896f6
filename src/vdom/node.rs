use std::fmt;

use blake3::Hash;
use serde::{Deserialize, Serialize};

use crate::dom::NodeId;

/// Identity of a component instance in the logical tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentId(pub u64);

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "component#{}", self.0)
    }
}

/// What a descriptor stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VNodeKind {
    Text {
        text: String,
    },
    /// Empty marker left by conditionals that rendered nothing.
    Comment {
        text: String,
    },
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    /// Root element produced by a component's render.
    Component {
        id: ComponentId,
        tag: String,
        attrs: Vec<(String, String)>,
    },
}

/// Immutable-per-render node descriptor.
///
/// `elm` is the back-reference to the real node once the patcher has created
/// or adopted one; it never takes part in serialization or fingerprints.
#[derive(Debug, Clone, Serialize)]
pub struct VNode {
    pub kind: VNodeKind,
    pub children: Vec<VNode>,
    #[serde(skip)]
    pub elm: Option<NodeId>,
}

impl VNode {
    fn with_kind(kind: VNodeKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
            elm: None,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::with_kind(VNodeKind::Text { text: text.into() })
    }

    pub fn comment(text: impl Into<String>) -> Self {
        Self::with_kind(VNodeKind::Comment { text: text.into() })
    }

    pub fn element(tag: impl Into<String>) -> Self {
        Self::with_kind(VNodeKind::Element {
            tag: tag.into(),
            attrs: Vec::new(),
        })
    }

    pub fn component(id: ComponentId, tag: impl Into<String>) -> Self {
        Self::with_kind(VNodeKind::Component {
            id,
            tag: tag.into(),
            attrs: Vec::new(),
        })
    }

    /// Set an attribute. Ignored on text and comment descriptors.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let VNodeKind::Element { attrs, .. } | VNodeKind::Component { attrs, .. } =
            &mut self.kind
        {
            let name = name.into();
            let value = value.into();
            match attrs.iter_mut().find(|(key, _)| *key == name) {
                Some(entry) => entry.1 = value,
                None => attrs.push((name, value)),
            }
        }
        self
    }

    pub fn child(mut self, child: VNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = VNode>) -> Self {
        self.children.extend(children);
        self
    }

    /// Element and component descriptors qualify for relocation; text and
    /// comments never do.
    pub fn is_qualifying(&self) -> bool {
        matches!(
            self.kind,
            VNodeKind::Element { .. } | VNodeKind::Component { .. }
        )
    }

    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            VNodeKind::Element { tag, .. } | VNodeKind::Component { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn attrs(&self) -> &[(String, String)] {
        match &self.kind {
            VNodeKind::Element { attrs, .. } | VNodeKind::Component { attrs, .. } => attrs,
            _ => &[],
        }
    }

    pub fn component_id(&self) -> Option<ComponentId> {
        match self.kind {
            VNodeKind::Component { id, .. } => Some(id),
            _ => None,
        }
    }

    /// Whether `other` can be patched into this node's real element.
    pub fn same_shape(&self, other: &VNode) -> bool {
        match (&self.kind, &other.kind) {
            (VNodeKind::Text { .. }, VNodeKind::Text { .. }) => true,
            (VNodeKind::Comment { .. }, VNodeKind::Comment { .. }) => true,
            (VNodeKind::Element { tag: a, .. }, VNodeKind::Element { tag: b, .. }) => a == b,
            (
                VNodeKind::Component { id: a, tag: ta, .. },
                VNodeKind::Component { id: b, tag: tb, .. },
            ) => a == b && ta == tb,
            _ => false,
        }
    }

    /// Content hash over the serialized descriptor.
    pub fn fingerprint(&self) -> Hash {
        match serde_json::to_vec(self) {
            Ok(bytes) => blake3::hash(&bytes),
            Err(_) => blake3::hash(format!("{self:?}").as_bytes()),
        }
    }

    /// Components in this subtree, children before parents.
    pub fn components(&self) -> Vec<(ComponentId, Option<NodeId>)> {
        let mut out = Vec::new();
        self.collect_components(&mut out);
        out
    }

    fn collect_components(&self, out: &mut Vec<(ComponentId, Option<NodeId>)>) {
        for child in &self.children {
            child.collect_components(out);
        }
        if let Some(id) = self.component_id() {
            out.push((id, self.elm));
        }
    }

    /// Copy real-node back-references from `source` onto this descriptor,
    /// pairing children by index.
    pub fn adopt_elms(&mut self, source: &VNode) {
        self.elm = source.elm;
        for (child, source_child) in self.children.iter_mut().zip(&source.children) {
            child.adopt_elms(source_child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_elements_and_components_qualify() {
        assert!(VNode::element("div").is_qualifying());
        assert!(VNode::component(ComponentId(1), "section").is_qualifying());
        assert!(!VNode::text("hello").is_qualifying());
        assert!(!VNode::comment("").is_qualifying());
    }

    #[test]
    fn fingerprint_ignores_back_references() {
        let a = VNode::element("div").attr("class", "modal").child(VNode::text("hi"));
        let mut b = a.clone();
        b.elm = Some(crate::dom::Document::new().body());
        assert_eq!(a.fingerprint(), b.fingerprint());

        let c = a.clone().attr("class", "modal open");
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn components_are_listed_children_first() {
        let tree = VNode::component(ComponentId(1), "div")
            .child(VNode::component(ComponentId(2), "p").child(VNode::component(ComponentId(3), "b")))
            .child(VNode::component(ComponentId(4), "p"));

        let order: Vec<_> = tree.components().into_iter().map(|(id, _)| id.0).collect();
        assert_eq!(order, vec![3, 2, 4, 1]);
    }

    #[test]
    fn attr_replaces_existing_value() {
        let node = VNode::element("div").attr("id", "a").attr("id", "b");
        assert_eq!(node.attrs(), &[("id".to_string(), "b".to_string())]);
        let text = VNode::text("x").attr("id", "ignored");
        assert!(text.attrs().is_empty());
    }
}
