use crate::logging::{LogEvent, LogFields, LogLevel};
use serde_json::json;

/// Counters accumulated across the life of one or more portals.
#[derive(Debug, Default, Clone)]
pub struct PortalMetrics {
    deploys: u64,
    updates: u64,
    teardowns: u64,
    rejected_renders: u64,
    listeners_attached: u64,
}

impl PortalMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_deploy(&mut self) {
        self.deploys = self.deploys.saturating_add(1);
    }

    pub fn record_update(&mut self) {
        self.updates = self.updates.saturating_add(1);
    }

    pub fn record_teardown(&mut self) {
        self.teardowns = self.teardowns.saturating_add(1);
    }

    pub fn record_rejected_render(&mut self) {
        self.rejected_renders = self.rejected_renders.saturating_add(1);
    }

    pub fn record_listeners(&mut self, count: usize) {
        if count > 0 {
            self.listeners_attached = self.listeners_attached.saturating_add(count as u64);
        }
    }

    pub fn snapshot(&self) -> MetricSnapshot {
        MetricSnapshot {
            deploys: self.deploys,
            updates: self.updates,
            teardowns: self.teardowns,
            rejected_renders: self.rejected_renders,
            listeners_attached: self.listeners_attached,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSnapshot {
    pub deploys: u64,
    pub updates: u64,
    pub teardowns: u64,
    pub rejected_renders: u64,
    pub listeners_attached: u64,
}

impl MetricSnapshot {
    pub fn as_fields(&self) -> LogFields {
        let mut map = LogFields::new();
        map.insert("deploys".to_string(), json!(self.deploys));
        map.insert("updates".to_string(), json!(self.updates));
        map.insert("teardowns".to_string(), json!(self.teardowns));
        map.insert("rejected_renders".to_string(), json!(self.rejected_renders));
        map.insert("listeners_attached".to_string(), json!(self.listeners_attached));
        map
    }

    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(LogLevel::Info, target, "portal_metrics", self.as_fields())
    }
}
