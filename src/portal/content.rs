use crate::error::{PortalError, Result};
use crate::vdom::VNode;

/// Tag of the empty element a portal leaves in its logical position.
pub const PLACEHOLDER_TAG: &str = "portal-host";

/// Result of pulling the relocated subtree out of a portal's render slot.
#[derive(Debug, Clone)]
pub struct SlotSplit {
    /// Descriptor for the logical position: the placeholder, no children.
    pub host: VNode,
    /// The single qualifying descriptor, to be rendered into the target.
    pub subtree: VNode,
}

/// Number of slot entries that count toward the one-root rule.
pub fn qualifying_count(slot: &[VNode]) -> usize {
    slot.iter().filter(|node| node.is_qualifying()).count()
}

/// Arity check plus extract-and-detach.
///
/// Text and comment entries are dropped; exactly one element or component
/// entry must remain.
pub fn split_slot(slot: Vec<VNode>) -> Result<SlotSplit> {
    let count = qualifying_count(&slot);
    if count != 1 {
        return Err(PortalError::InvalidContentArity { count });
    }

    let subtree = slot
        .into_iter()
        .find(VNode::is_qualifying)
        .ok_or(PortalError::InvalidContentArity { count: 0 })?;

    Ok(SlotSplit {
        host: VNode::element(PLACEHOLDER_TAG),
        subtree,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vdom::ComponentId;

    #[test]
    fn single_element_among_text_is_extracted() {
        let split = split_slot(vec![
            VNode::text("\n  "),
            VNode::element("div").attr("class", "modal"),
            VNode::comment(""),
        ])
        .unwrap();

        assert_eq!(split.subtree.tag(), Some("div"));
        assert_eq!(split.host.tag(), Some(PLACEHOLDER_TAG));
        assert!(split.host.children.is_empty());
    }

    #[test]
    fn component_output_qualifies() {
        let split = split_slot(vec![VNode::component(ComponentId(7), "dialog")]).unwrap();
        assert_eq!(split.subtree.component_id(), Some(ComponentId(7)));
    }

    #[test]
    fn empty_and_text_only_slots_report_zero() {
        for slot in [vec![], vec![VNode::text("only text"), VNode::comment("")]] {
            let err = split_slot(slot).unwrap_err();
            assert!(matches!(err, PortalError::InvalidContentArity { count: 0 }));
        }
    }

    #[test]
    fn multiple_roots_report_observed_count() {
        let err = split_slot(vec![
            VNode::element("div"),
            VNode::text("between"),
            VNode::element("span"),
            VNode::component(ComponentId(1), "p"),
        ])
        .unwrap_err();
        assert!(matches!(err, PortalError::InvalidContentArity { count: 3 }));
    }
}
