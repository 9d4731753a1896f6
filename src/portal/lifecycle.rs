use crate::dom::{Document, NodeId};
use crate::vdom::ComponentId;

/// Component-base hooks the portal calls back into.
pub trait Lifecycle {
    /// `component`'s real root is attached to a document-connected target.
    fn descendant_mounted(&mut self, component: ComponentId, element: Option<NodeId>, doc: &Document);

    /// `component` left the relocated subtree.
    fn descendant_destroyed(&mut self, component: ComponentId, doc: &Document);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullLifecycle;

impl Lifecycle for NullLifecycle {
    fn descendant_mounted(&mut self, _component: ComponentId, _element: Option<NodeId>, _doc: &Document) {}

    fn descendant_destroyed(&mut self, _component: ComponentId, _doc: &Document) {}
}
