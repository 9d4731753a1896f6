use crate::dom::{Document, NodeId};

/// Document lookup used to find a portal's external target.
pub trait TargetResolver {
    fn resolve(&self, doc: &Document, selector: &str) -> Option<NodeId>;
}

/// Resolves against the whole document with [`Document::query_selector`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentResolver;

impl TargetResolver for DocumentResolver {
    fn resolve(&self, doc: &Document, selector: &str) -> Option<NodeId> {
        doc.query_selector(selector)
    }
}

impl<F> TargetResolver for F
where
    F: Fn(&Document, &str) -> Option<NodeId>,
{
    fn resolve(&self, doc: &Document, selector: &str) -> Option<NodeId> {
        self(doc, selector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_can_stand_in_for_the_document() {
        let mut doc = Document::new();
        let fixed = doc.create_element("aside");
        let resolver = move |_doc: &Document, selector: &str| (selector == "modal-root").then_some(fixed);

        assert_eq!(resolver.resolve(&doc, "modal-root"), Some(fixed));
        assert_eq!(resolver.resolve(&doc, "#other"), None);
        assert_eq!(DocumentResolver.resolve(&doc, "body"), Some(doc.body()));
    }
}
