use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::logging::{LogLevel, Logger, event_with_fields};
use crate::metrics::PortalMetrics;

use super::audit::{NullPortalAudit, PortalAudit, PortalAuditEventBuilder, PortalAuditStage};

/// Log target used for every event a portal emits.
pub const PORTAL_LOG_TARGET: &str = "room::portal";

/// Author-facing configuration for one portal.
#[derive(Clone)]
pub struct PortalConfig {
    /// Selector naming the external target. Resolved once, at the first
    /// successful render, against the whole document.
    pub selector: &'static str,
    /// Optional structured logger used by the portal.
    pub logger: Option<Logger>,
    /// Shared counters; `None` disables metrics.
    pub metrics: Option<Arc<Mutex<PortalMetrics>>>,
    /// Lifecycle audit sink.
    pub audit: Arc<dyn PortalAudit>,
}

impl PortalConfig {
    pub fn new(selector: &'static str) -> Self {
        Self {
            selector,
            logger: None,
            metrics: None,
            audit: Arc::new(NullPortalAudit),
        }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_audit(mut self, audit: Arc<dyn PortalAudit>) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Mutex<PortalMetrics>>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Enable metrics collection if it has not already been configured.
    pub fn enable_metrics(&mut self) {
        if self.metrics.is_none() {
            self.metrics = Some(Arc::new(Mutex::new(PortalMetrics::new())));
        }
    }

    pub fn disable_metrics(&mut self) {
        self.metrics = None;
    }

    pub fn metrics_handle(&self) -> Option<Arc<Mutex<PortalMetrics>>> {
        self.metrics.as_ref().map(Arc::clone)
    }

    pub(crate) fn log<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        if let Some(logger) = self.logger.as_ref() {
            let event = event_with_fields(level, PORTAL_LOG_TARGET, message, fields);
            let _ = logger.log_event(event);
        }
    }

    pub(crate) fn audit<I>(&self, stage: PortalAuditStage, details: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let mut builder = PortalAuditEventBuilder::new(stage);
        for (key, value) in details {
            builder.detail(key, value);
        }
        self.audit.record(builder.finish());
    }

    pub(crate) fn record_metrics(&self, update: impl FnOnce(&mut PortalMetrics)) {
        if let Some(metrics) = self.metrics.as_ref() {
            if let Ok(mut guard) = metrics.lock() {
                update(&mut guard);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_toggle() {
        let mut config = PortalConfig::new("#outside");
        assert!(config.metrics_handle().is_none());
        config.enable_metrics();
        let handle = config.metrics_handle().unwrap();
        config.enable_metrics();
        assert!(Arc::ptr_eq(&handle, &config.metrics_handle().unwrap()));
        config.disable_metrics();
        assert!(config.metrics_handle().is_none());
    }
}
