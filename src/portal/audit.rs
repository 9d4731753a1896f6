//! Portal lifecycle audit trail.
//!
//! Each checkpoint a portal passes through is recorded as a stage plus
//! structured details. Sinks can buffer, log or assert on the sequence; the
//! ordering between `SubtreeAttached` and `DescendantMounted` is the
//! observable form of the mount-after-attach guarantee.

use std::sync::Mutex;
use std::time::SystemTime;

use serde_json::Value;

/// Distinct checkpoints emitted by a [`Portal`](super::Portal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortalAuditStage {
    /// The selector resolved to an element.
    TargetResolved,
    /// The placeholder host was created and mounted at the anchor.
    PlaceholderCreated,
    /// The relocated root was appended to the target.
    SubtreeAttached,
    /// A component inside the relocated subtree was told it is mounted.
    DescendantMounted,
    /// A later render was patched into the relocated subtree.
    SubtreePatched,
    /// A tunnel listener was registered on the relocated root.
    ListenerAttached,
    /// Tunnel listeners moved to a rebuilt relocated root.
    ListenersMigrated,
    /// The relocated root was removed from the target.
    SubtreeDetached,
    /// A component inside the relocated subtree was torn down.
    DescendantDestroyed,
    /// The portal finished tearing down.
    PortalDestroyed,
}

/// Structured audit entry.
#[derive(Debug, Clone)]
pub struct PortalAuditEvent {
    pub timestamp: SystemTime,
    pub stage: PortalAuditStage,
    pub details: Vec<(String, Value)>,
}

impl PortalAuditEvent {
    fn new(stage: PortalAuditStage) -> Self {
        Self {
            timestamp: SystemTime::now(),
            stage,
            details: Vec::new(),
        }
    }

    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }
}

/// Builder helper to append fields ergonomically.
pub struct PortalAuditEventBuilder {
    event: PortalAuditEvent,
}

impl PortalAuditEventBuilder {
    pub fn new(stage: PortalAuditStage) -> Self {
        Self {
            event: PortalAuditEvent::new(stage),
        }
    }

    pub fn detail(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.event.details.push((key.into(), value));
        self
    }

    pub fn finish(self) -> PortalAuditEvent {
        self.event
    }
}

/// Implemented by any audit sink.
pub trait PortalAudit: Send + Sync {
    fn record(&self, event: PortalAuditEvent);
}

/// Default no-op sink used when auditing is disabled.
#[derive(Debug, Default)]
pub struct NullPortalAudit;

impl PortalAudit for NullPortalAudit {
    fn record(&self, _event: PortalAuditEvent) {}
}

/// Keeps every recorded event in order.
#[derive(Debug, Default)]
pub struct BufferedPortalAudit {
    events: Mutex<Vec<PortalAuditEvent>>,
}

impl BufferedPortalAudit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PortalAuditEvent> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn stages(&self) -> Vec<PortalAuditStage> {
        self.events().into_iter().map(|event| event.stage).collect()
    }
}

impl PortalAudit for BufferedPortalAudit {
    fn record(&self, event: PortalAuditEvent) {
        if let Ok(mut guard) = self.events.lock() {
            guard.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn buffered_audit_keeps_order_and_details() {
        let audit = BufferedPortalAudit::new();
        let mut builder = PortalAuditEventBuilder::new(PortalAuditStage::TargetResolved);
        builder.detail("selector", json!("#outside"));
        audit.record(builder.finish());
        audit.record(PortalAuditEventBuilder::new(PortalAuditStage::SubtreeAttached).finish());

        assert_eq!(
            audit.stages(),
            vec![PortalAuditStage::TargetResolved, PortalAuditStage::SubtreeAttached]
        );
        assert_eq!(audit.events()[0].detail("selector"), Some(&json!("#outside")));
    }
}
