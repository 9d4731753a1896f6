use std::rc::Rc;

use crate::dom::{DispatchContext, Document, DomEvent, EventFlow, EventListener, ListenerId, NodeId};
use crate::error::Result;
use crate::registry::HandledEventRegistry;

/// Native listener installed on a relocated root.
///
/// Holds the placeholder it re-emits from as explicit state. Custom events
/// stop at the relocated root and continue from the placeholder; native
/// events are left alone.
#[derive(Debug, Clone, Copy)]
pub struct TunnelListener {
    placeholder: NodeId,
}

impl TunnelListener {
    pub fn new(placeholder: NodeId) -> Self {
        Self { placeholder }
    }
}

impl EventListener for TunnelListener {
    fn handle_event(&self, ctx: &mut DispatchContext<'_>, event: &DomEvent) -> EventFlow {
        if !event.is_custom() {
            return EventFlow::Continue;
        }
        ctx.dispatch_from(self.placeholder, event.clone());
        EventFlow::Consumed
    }
}

#[derive(Debug)]
struct TunnelBinding {
    root: NodeId,
    placeholder: NodeId,
    listeners: Vec<(String, ListenerId)>,
}

/// Lazily registered event tunnel for one portal.
///
/// Types are recorded in the registry as soon as they are observed. While
/// the tunnel is bound to a relocated root every recorded type has exactly
/// one listener on that root.
#[derive(Debug, Default)]
pub struct EventTunnel {
    registry: HandledEventRegistry,
    binding: Option<TunnelBinding>,
}

impl EventTunnel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &HandledEventRegistry {
        &self.registry
    }

    pub fn root(&self) -> Option<NodeId> {
        self.binding.as_ref().map(|binding| binding.root)
    }

    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    /// Record interest in `event_type`, attaching a listener if bound.
    /// Returns `false` when the type was already handled.
    pub fn observe(&mut self, doc: &mut Document, event_type: &str) -> Result<bool> {
        if !self.registry.insert(event_type) {
            return Ok(false);
        }
        if let Some(binding) = self.binding.as_mut() {
            attach(doc, binding, event_type)?;
        }
        Ok(true)
    }

    /// Start tunneling from `root` to `placeholder` for every handled type.
    /// Returns the types that received a listener.
    pub fn bind(
        &mut self,
        doc: &mut Document,
        root: NodeId,
        placeholder: NodeId,
    ) -> Result<Vec<String>> {
        self.unbind(doc)?;
        let mut binding = TunnelBinding {
            root,
            placeholder,
            listeners: Vec::new(),
        };
        for event_type in self.registry.iter() {
            attach(doc, &mut binding, event_type)?;
        }
        let attached = binding
            .listeners
            .iter()
            .map(|(event_type, _)| event_type.clone())
            .collect();
        self.binding = Some(binding);
        Ok(attached)
    }

    /// Move every listener to a rebuilt relocated root.
    pub fn rebind(&mut self, doc: &mut Document, root: NodeId) -> Result<Vec<String>> {
        match self.binding.as_ref() {
            Some(binding) if binding.root != root => {
                let placeholder = binding.placeholder;
                self.bind(doc, root, placeholder)
            }
            _ => Ok(Vec::new()),
        }
    }

    /// Remove every listener. Returns how many were removed.
    pub fn unbind(&mut self, doc: &mut Document) -> Result<usize> {
        let Some(binding) = self.binding.take() else {
            return Ok(0);
        };
        let mut removed = 0;
        for (_, listener) in binding.listeners {
            if doc.remove_event_listener(binding.root, listener)? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

fn attach(doc: &mut Document, binding: &mut TunnelBinding, event_type: &str) -> Result<()> {
    let listener: Rc<dyn EventListener> = Rc::new(TunnelListener::new(binding.placeholder));
    let id = doc.add_event_listener(binding.root, event_type, listener)?;
    binding.listeners.push((event_type.to_string(), id));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;

    struct Fixture {
        doc: Document,
        placeholder: NodeId,
        root: NodeId,
        leaf: NodeId,
        target: NodeId,
    }

    fn fixture() -> Fixture {
        let mut doc = Document::new();
        let logical = doc.create_element("form");
        let placeholder = doc.create_element("portal-host");
        let target = doc.create_element("div");
        let root = doc.create_element("div");
        let leaf = doc.create_element("button");
        doc.append_child(doc.body(), logical).unwrap();
        doc.append_child(logical, placeholder).unwrap();
        doc.append_child(doc.body(), target).unwrap();
        doc.append_child(target, root).unwrap();
        doc.append_child(root, leaf).unwrap();
        Fixture {
            doc,
            placeholder,
            root,
            leaf,
            target,
        }
    }

    #[test]
    fn observe_is_idempotent_per_type() {
        let mut fx = fixture();
        let mut tunnel = EventTunnel::new();
        tunnel.bind(&mut fx.doc, fx.root, fx.placeholder).unwrap();

        assert!(tunnel.observe(&mut fx.doc, "saved").unwrap());
        assert!(!tunnel.observe(&mut fx.doc, "saved").unwrap());

        assert_eq!(fx.doc.listener_count(fx.root, "saved"), 1);
        assert_eq!(tunnel.registry().len(), 1);
    }

    #[test]
    fn types_observed_before_binding_attach_on_bind() {
        let mut fx = fixture();
        let mut tunnel = EventTunnel::new();
        tunnel.observe(&mut fx.doc, "saved").unwrap();
        assert_eq!(fx.doc.listener_count(fx.root, "saved"), 0);

        let attached = tunnel.bind(&mut fx.doc, fx.root, fx.placeholder).unwrap();

        assert_eq!(attached, vec!["saved".to_string()]);
        assert_eq!(fx.doc.listener_count(fx.root, "saved"), 1);
    }

    #[test]
    fn custom_events_continue_from_placeholder() {
        let mut fx = fixture();
        let mut tunnel = EventTunnel::new();
        tunnel.bind(&mut fx.doc, fx.root, fx.placeholder).unwrap();
        tunnel.observe(&mut fx.doc, "saved").unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let on_target: Rc<dyn EventListener> =
            Rc::new(move |_ctx: &mut DispatchContext<'_>, event: &DomEvent| {
                sink.borrow_mut().push(event.detail.clone());
                EventFlow::Continue
            });
        fx.doc.add_event_listener(fx.target, "saved", on_target).unwrap();

        let report = fx
            .doc
            .dispatch_event(fx.leaf, DomEvent::custom("saved", json!({"id": 3})))
            .unwrap();

        assert!(report.stopped);
        assert!(!report.visited.contains(&fx.target));
        assert_eq!(report.redispatched.len(), 1);
        assert_eq!(report.redispatched[0].visited[0], fx.placeholder);
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn native_events_pass_through() {
        let mut fx = fixture();
        let mut tunnel = EventTunnel::new();
        tunnel.observe(&mut fx.doc, "click").unwrap();
        tunnel.bind(&mut fx.doc, fx.root, fx.placeholder).unwrap();

        let report = fx.doc.dispatch_event(fx.leaf, DomEvent::native("click")).unwrap();

        assert!(!report.stopped);
        assert!(report.visited.contains(&fx.target));
        assert!(report.redispatched.is_empty());
        assert!(!report.reached(fx.placeholder));
    }

    #[test]
    fn rebind_moves_listeners_and_unbind_clears_them() {
        let mut fx = fixture();
        let mut tunnel = EventTunnel::new();
        tunnel.observe(&mut fx.doc, "saved").unwrap();
        tunnel.observe(&mut fx.doc, "closed").unwrap();
        tunnel.bind(&mut fx.doc, fx.root, fx.placeholder).unwrap();

        let rebuilt = fx.doc.create_element("section");
        let moved = tunnel.rebind(&mut fx.doc, rebuilt).unwrap();

        assert_eq!(moved.len(), 2);
        assert_eq!(fx.doc.listener_count(fx.root, "saved"), 0);
        assert_eq!(fx.doc.listener_count(rebuilt, "saved"), 1);
        assert_eq!(tunnel.root(), Some(rebuilt));

        assert_eq!(tunnel.unbind(&mut fx.doc).unwrap(), 2);
        assert_eq!(fx.doc.listener_count(rebuilt, "closed"), 0);
        assert!(!tunnel.is_bound());
        assert_eq!(tunnel.registry().len(), 2);
    }
}
