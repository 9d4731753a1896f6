use crate::dom::{Document, NodeId};
use crate::error::Result;

use super::node::{VNode, VNodeKind};

/// Diff/patch engine seam.
pub trait Patcher {
    /// Build a detached real subtree for `vnode`, filling in every `elm`.
    fn create(&mut self, doc: &mut Document, vnode: &mut VNode) -> Result<NodeId>;

    /// Reconcile `new` against the real subtree recorded in `old` and return
    /// the real root now backing `new`. When the root has to be rebuilt the
    /// replacement takes the old root's place in its parent.
    fn patch(&mut self, doc: &mut Document, old: &VNode, new: &mut VNode) -> Result<NodeId>;
}

/// Counters describing the work a [`TreePatcher`] has done.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PatchStats {
    pub created: u64,
    pub updated: u64,
    pub replaced: u64,
    pub unchanged: u64,
}

/// Index-keyed reconciler.
#[derive(Debug, Default)]
pub struct TreePatcher {
    stats: PatchStats,
}

impl TreePatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> PatchStats {
        self.stats
    }

    fn update_in_place(
        &mut self,
        doc: &mut Document,
        elm: NodeId,
        old: &VNode,
        new: &mut VNode,
    ) -> Result<()> {
        match (&old.kind, &new.kind) {
            (VNodeKind::Text { text: before }, VNodeKind::Text { text: after })
            | (VNodeKind::Comment { text: before }, VNodeKind::Comment { text: after }) => {
                if before != after {
                    doc.set_text(elm, after.clone())?;
                }
            }
            _ => {
                for (name, _) in old.attrs() {
                    if !new.attrs().iter().any(|(key, _)| key == name) {
                        doc.remove_attribute(elm, name)?;
                    }
                }
                for (name, value) in new.attrs() {
                    if doc.attribute(elm, name) != Some(value.as_str()) {
                        doc.set_attribute(elm, name.clone(), value.clone())?;
                    }
                }
            }
        }

        let shared = old.children.len().min(new.children.len());
        for (old_child, new_child) in old.children.iter().zip(new.children.iter_mut()) {
            self.patch(doc, old_child, new_child)?;
        }
        for new_child in new.children.iter_mut().skip(shared) {
            let child = self.create(doc, new_child)?;
            doc.append_child(elm, child)?;
        }
        for old_child in old.children.iter().skip(shared) {
            if let Some(stale) = old_child.elm {
                doc.detach(stale)?;
            }
        }

        new.elm = Some(elm);
        self.stats.updated += 1;
        Ok(())
    }
}

impl Patcher for TreePatcher {
    fn create(&mut self, doc: &mut Document, vnode: &mut VNode) -> Result<NodeId> {
        let id = match &vnode.kind {
            VNodeKind::Text { text } => doc.create_text(text.clone()),
            VNodeKind::Comment { text } => doc.create_comment(text.clone()),
            VNodeKind::Element { tag, attrs } | VNodeKind::Component { tag, attrs, .. } => {
                let id = doc.create_element(tag.clone());
                for (name, value) in attrs {
                    doc.set_attribute(id, name.clone(), value.clone())?;
                }
                id
            }
        };

        for child in vnode.children.iter_mut() {
            let child_id = self.create(doc, child)?;
            doc.append_child(id, child_id)?;
        }

        vnode.elm = Some(id);
        self.stats.created += 1;
        Ok(id)
    }

    fn patch(&mut self, doc: &mut Document, old: &VNode, new: &mut VNode) -> Result<NodeId> {
        let Some(elm) = old.elm else {
            return self.create(doc, new);
        };

        if old.fingerprint() == new.fingerprint() {
            new.adopt_elms(old);
            self.stats.unchanged += 1;
            return Ok(elm);
        }

        if !old.same_shape(new) {
            let replacement = self.create(doc, new)?;
            if let Some(parent) = doc.parent(elm) {
                doc.replace_child(parent, replacement, elm)?;
            }
            self.stats.replaced += 1;
            return Ok(replacement);
        }

        self.update_in_place(doc, elm, old, new)?;
        Ok(elm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vdom::ComponentId;

    fn mount(doc: &mut Document, patcher: &mut TreePatcher, vnode: &mut VNode) -> NodeId {
        let id = patcher.create(doc, vnode).unwrap();
        doc.append_child(doc.body(), id).unwrap();
        id
    }

    #[test]
    fn create_builds_detached_tree_with_back_references() {
        let mut doc = Document::new();
        let mut patcher = TreePatcher::new();
        let mut vnode = VNode::element("ul")
            .attr("class", "menu")
            .child(VNode::element("li").child(VNode::text("one")));

        let id = patcher.create(&mut doc, &mut vnode).unwrap();

        assert_eq!(vnode.elm, Some(id));
        assert!(!doc.is_connected(id));
        assert_eq!(doc.attribute(id, "class"), Some("menu"));
        let li = vnode.children[0].elm.unwrap();
        assert_eq!(doc.parent(li), Some(id));
        assert_eq!(patcher.stats().created, 3);
    }

    #[test]
    fn identical_descriptor_is_a_no_op() {
        let mut doc = Document::new();
        let mut patcher = TreePatcher::new();
        let mut old = VNode::element("div").child(VNode::text("same"));
        let id = mount(&mut doc, &mut patcher, &mut old);

        let mut new = VNode::element("div").child(VNode::text("same"));
        let patched = patcher.patch(&mut doc, &old, &mut new).unwrap();
        let mut again = VNode::element("div").child(VNode::text("same"));
        let patched_again = patcher.patch(&mut doc, &new, &mut again).unwrap();

        assert_eq!(patched, id);
        assert_eq!(patched_again, id);
        assert_eq!(again.children[0].elm, old.children[0].elm);
        assert_eq!(patcher.stats().unchanged, 2);
    }

    #[test]
    fn updates_attributes_text_and_children_in_place() {
        let mut doc = Document::new();
        let mut patcher = TreePatcher::new();
        let mut old = VNode::element("div")
            .attr("class", "a")
            .attr("title", "gone")
            .child(VNode::text("before"))
            .child(VNode::element("b"))
            .child(VNode::element("i"));
        let id = mount(&mut doc, &mut patcher, &mut old);
        let stale = old.children[2].elm.unwrap();

        let mut new = VNode::element("div")
            .attr("class", "b")
            .child(VNode::text("after"))
            .child(VNode::element("b"));
        let patched = patcher.patch(&mut doc, &old, &mut new).unwrap();

        assert_eq!(patched, id);
        assert_eq!(doc.attribute(id, "class"), Some("b"));
        assert_eq!(doc.attribute(id, "title"), None);
        let text = new.children[0].elm.unwrap();
        assert_eq!(doc.data(text).unwrap(), &crate::dom::NodeData::Text("after".into()));
        assert_eq!(doc.children(id).len(), 2);
        assert_eq!(doc.parent(stale), None);
    }

    #[test]
    fn shape_change_swaps_root_in_parent() {
        let mut doc = Document::new();
        let mut patcher = TreePatcher::new();
        let mut old = VNode::component(ComponentId(1), "div");
        let id = mount(&mut doc, &mut patcher, &mut old);

        let mut new = VNode::component(ComponentId(2), "div");
        let patched = patcher.patch(&mut doc, &old, &mut new).unwrap();

        assert_ne!(patched, id);
        assert_eq!(doc.children(doc.body()), &[patched]);
        assert_eq!(doc.parent(id), None);
        assert_eq!(patcher.stats().replaced, 1);
    }
}
