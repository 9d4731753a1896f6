use serde::Serialize;
use serde_json::Value;

use super::core::{Document, DomError, NodeId};
use crate::vdom::ComponentId;

/// Nested re-dispatches deeper than this are rejected.
pub const MAX_DISPATCH_DEPTH: usize = 32;

/// Control the propagation of an event along its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFlow {
    Continue,
    Consumed,
}

/// Handle returned by [`Document::add_event_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Event travelling through the document.
///
/// `custom` separates component-level events from native ones (pointer,
/// keyboard, ...). Only custom events carry an originating component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomEvent {
    pub event_type: String,
    pub detail: Value,
    pub origin: Option<ComponentId>,
    pub custom: bool,
}

impl DomEvent {
    pub fn native(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            detail: Value::Null,
            origin: None,
            custom: false,
        }
    }

    pub fn custom(event_type: impl Into<String>, detail: Value) -> Self {
        Self {
            event_type: event_type.into(),
            detail,
            origin: None,
            custom: true,
        }
    }

    pub fn from_component(mut self, component: ComponentId) -> Self {
        self.origin = Some(component);
        self
    }

    pub fn is_custom(&self) -> bool {
        self.custom
    }
}

/// Behaviour attached to a node for one event type.
pub trait EventListener {
    fn handle_event(&self, ctx: &mut DispatchContext<'_>, event: &DomEvent) -> EventFlow;
}

impl<F> EventListener for F
where
    F: Fn(&mut DispatchContext<'_>, &DomEvent) -> EventFlow,
{
    fn handle_event(&self, ctx: &mut DispatchContext<'_>, event: &DomEvent) -> EventFlow {
        self(ctx, event)
    }
}

/// Context handed to a listener while it runs.
pub struct DispatchContext<'a> {
    target: NodeId,
    current: NodeId,
    stopped: bool,
    queued: &'a mut Vec<(NodeId, DomEvent)>,
}

impl<'a> DispatchContext<'a> {
    fn new(target: NodeId, current: NodeId, queued: &'a mut Vec<(NodeId, DomEvent)>) -> Self {
        Self {
            target,
            current,
            stopped: false,
            queued,
        }
    }

    /// Node the event was originally dispatched at.
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// Node whose listeners are currently running.
    pub fn current_target(&self) -> NodeId {
        self.current
    }

    /// Finish the listeners on the current node, then stop.
    pub fn stop_propagation(&mut self) {
        self.stopped = true;
    }

    /// Queue `event` for dispatch at `node`. It runs once every listener on
    /// the current node has returned, before propagation continues.
    pub fn dispatch_from(&mut self, node: NodeId, event: DomEvent) {
        self.queued.push((node, event));
    }
}

/// What happened during one dispatch.
#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    /// Nodes the event reached, in propagation order.
    pub visited: Vec<NodeId>,
    pub stopped: bool,
    /// Reports for dispatches queued by listeners, in the order they ran.
    pub redispatched: Vec<DispatchReport>,
}

impl DispatchReport {
    /// Whether the event, or any re-dispatch it caused, reached `node`.
    pub fn reached(&self, node: NodeId) -> bool {
        self.visited.contains(&node) || self.redispatched.iter().any(|r| r.reached(node))
    }
}

impl Document {
    /// Dispatch `event` at `target` and bubble it along the physical parent
    /// chain. The path is fixed before the first listener runs.
    pub fn dispatch_event(
        &mut self,
        target: NodeId,
        event: DomEvent,
    ) -> Result<DispatchReport, DomError> {
        self.dispatch_at_depth(target, event, 0)
    }

    fn dispatch_at_depth(
        &mut self,
        target: NodeId,
        event: DomEvent,
        depth: usize,
    ) -> Result<DispatchReport, DomError> {
        if depth >= MAX_DISPATCH_DEPTH {
            return Err(DomError::DispatchDepthExceeded(MAX_DISPATCH_DEPTH));
        }
        self.data(target)?;

        let mut report = DispatchReport::default();
        for node in self.propagation_path(target) {
            report.visited.push(node);
            let mut stop = false;
            let mut queued = Vec::new();

            for listener in self.listeners_for(node, &event.event_type) {
                let mut ctx = DispatchContext::new(target, node, &mut queued);
                let flow = listener.handle_event(&mut ctx, &event);
                stop |= ctx.stopped || flow == EventFlow::Consumed;
            }

            // Every listener on `node` has run before anything it queued.
            for (from, queued_event) in queued {
                let nested = self.dispatch_at_depth(from, queued_event, depth + 1)?;
                report.redispatched.push(nested);
            }

            if stop {
                report.stopped = true;
                break;
            }
        }
        Ok(report)
    }
}
